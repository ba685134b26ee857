//! The reference solver: a naive, left-to-right, single-pass-per-iteration
//! propagator, not a SAT search. It exists to answer one question for the
//! static analyses and the CLI: starting from some assignment, does
//! repeatedly applying every path reach a fixed point, and if not, why?
use crate::flag::FlagArena;
use crate::flatten::Path;
use std::collections::HashMap;

/// Hard cap on propagation rounds; a constraint that has not converged by
/// then is treated as non-convergent rather than looped forever.
pub const MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Reached a fixed point; the final assignment is attached.
    Solved(HashMap<String, bool>),
    /// Two paths fired in the same round and disagreed on one flag.
    Conflict { flag: String },
    /// Hit the iteration cap, or returned to an assignment already seen
    /// (a propagation loop), without ever reaching a fixed point.
    DidNotConverge,
}

fn satisfies(arena: &FlagArena, conditions: &[crate::flag::FlagId], flags: &HashMap<String, bool>) -> bool {
    conditions.iter().all(|c| {
        let f = arena.get(*c);
        flags.get(&f.name).map(|&v| v == f.polarity).unwrap_or(false)
    })
}

/// Run the propagator from `initial` until it stabilizes, conflicts, or
/// fails to converge within [`MAX_ITERATIONS`].
///
/// `first_write` records, for the whole run (not just one round), the
/// first polarity any firing path assigns to a flag; a later firing that
/// disagrees is a convergence error. This also means a flag settles at
/// most once — between that and the finite flag universe, the seen-state
/// check below is a defensive backstop more than a load-bearing path, but
/// it is kept rather than assumed away.
pub fn solve(arena: &FlagArena, paths: &[Path], initial: &HashMap<String, bool>) -> SolveOutcome {
    let mut flags = initial.clone();
    let mut first_write: HashMap<String, bool> = HashMap::new();
    let mut seen = vec![flags.clone()];

    for _ in 0..MAX_ITERATIONS {
        let mut next = flags.clone();
        for p in paths {
            if !satisfies(arena, &p.conditions, &flags) {
                continue;
            }
            let eff = arena.get(p.effect);
            match first_write.get(&eff.name) {
                Some(&fixed) if fixed != eff.polarity => {
                    return SolveOutcome::Conflict {
                        flag: eff.name.clone(),
                    };
                }
                None => {
                    first_write.insert(eff.name.clone(), eff.polarity);
                }
                _ => {}
            }
            next.insert(eff.name.clone(), eff.polarity);
        }
        if next == flags {
            return SolveOutcome::Solved(flags);
        }
        if seen.contains(&next) {
            return SolveOutcome::DidNotConverge;
        }
        seen.push(next.clone());
        flags = next;
    }
    SolveOutcome::DidNotConverge
}

/// Every distinct flag name referenced anywhere in the path list, useful
/// for enumerating the full assignment space.
pub fn referenced_flags(arena: &FlagArena, paths: &[Path]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for p in paths {
        for c in &p.conditions {
            let name = arena.get(*c).name.clone();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let name = arena.get(p.effect).name.clone();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::parser::parse;

    fn paths_for(src: &str) -> (FlagArena, Vec<Path>) {
        let p = parse(src).unwrap();
        let mut arena = p.arena;
        let paths = flatten(&mut arena, &p.exprs);
        (arena, paths)
    }

    #[test]
    fn converges_on_independent_chain() {
        let (arena, paths) = paths_for("a? ( b ) b? ( c )");
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), true);
        initial.insert("b".to_string(), false);
        initial.insert("c".to_string(), false);
        match solve(&arena, &paths, &initial) {
            SolveOutcome::Solved(flags) => {
                assert_eq!(flags["b"], true);
                assert_eq!(flags["c"], true);
            }
            other => panic!("expected solved, got {other:?}"),
        }
    }

    #[test]
    fn detects_conflict() {
        let (arena, paths) = paths_for("a? ( b ) c? ( !b )");
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), true);
        initial.insert("c".to_string(), true);
        initial.insert("b".to_string(), false);
        assert!(matches!(
            solve(&arena, &paths, &initial),
            SolveOutcome::Conflict { .. }
        ));
    }

    #[test]
    fn oscillating_pair_surfaces_as_a_convergence_conflict() {
        // a and b each try to force the other false; once one direction has
        // settled b's polarity, the opposite-direction rule firing later
        // disagrees with that first write.
        let (arena, paths) = paths_for("a? ( !b ) !a? ( b ) b? ( !a ) !b? ( a )");
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), true);
        initial.insert("b".to_string(), true);
        assert!(matches!(
            solve(&arena, &paths, &initial),
            SolveOutcome::Conflict { .. }
        ));
    }
}
