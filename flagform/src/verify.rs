//! Static analyses over a flattened path list.
//!
//! Four checks, run in a fixed order so the first one to fire is reported
//! (no partial results): self-conflict, immutability, mutual conflict,
//! back-alteration. Each is independently callable for finer-grained
//! testing; [`verify_all`] is the façade the classifier and CLI use.
use crate::error::FlagformError;
use crate::flag::{FlagArena, FlagId};
use crate::flatten::Path;
use std::collections::HashMap;

/// Split two condition lists at their longest common *physical* prefix.
///
/// `FlagId` equality is identity (the same arena slot), not value — two
/// conditions parsed from two different occurrences of `a` never compare
/// equal here even though their `Flag` values match. That's intentional:
/// a shared prefix only exists when both paths passed through the same
/// `Implication` node while flattening.
pub fn split_common_prefix(c1: &[FlagId], c2: &[FlagId]) -> (Vec<FlagId>, Vec<FlagId>) {
    let n = c1.iter().zip(c2.iter()).take_while(|(a, b)| a == b).count();
    (c1[n..].to_vec(), c2[n..].to_vec())
}

/// After stripping the common prefix, do the remaining conditions avoid
/// requiring a flag to be both enabled and disabled at once?
pub fn conditions_can_coexist(arena: &FlagArena, c1: &[FlagId], c2: &[FlagId]) -> bool {
    let (r1, r2) = split_common_prefix(c1, c2);
    for a in &r1 {
        let fa = arena.get(*a);
        for b in &r2 {
            let fb = arena.get(*b);
            if fa.name == fb.name && fa.polarity != fb.polarity {
                return false;
            }
        }
    }
    true
}

/// Does `conditions` hold under `flags`? Flags absent from the map fall
/// back to `unspecified`: `None` means an absent flag can never satisfy a
/// condition (the conservative reading used by the static analyses);
/// solver callers pass a concrete default instead.
pub fn test_condition(
    arena: &FlagArena,
    conditions: &[FlagId],
    flags: &HashMap<String, bool>,
    unspecified: Option<bool>,
) -> bool {
    conditions.iter().all(|c| {
        let f = arena.get(*c);
        match flags.get(&f.name) {
            Some(&v) => v == f.polarity,
            None => unspecified.map(|v| v == f.polarity).unwrap_or(false),
        }
    })
}

/// Can `condition` ever become true? Top-level flags are free for the user
/// to set, so a condition is reachable by default; it is only ruled out
/// when it is self-contradictory, or when some *unconditional* earlier
/// path (one with no conditions of its own, so it always fires) already
/// forces one of its literals to the opposite polarity. A cache of
/// literals already settled by an unconditional path avoids rechecking the
/// same producer for every literal in `condition`.
pub fn condition_can_occur(arena: &FlagArena, condition: &[FlagId], prior_paths: &[Path]) -> bool {
    for i in 0..condition.len() {
        let a = arena.get(condition[i]);
        for other in &condition[i + 1..] {
            let b = arena.get(*other);
            if a.name == b.name && a.polarity != b.polarity {
                return false;
            }
        }
    }

    let mut forced: HashMap<String, bool> = HashMap::new();
    for p in prior_paths {
        if p.conditions.is_empty() {
            let eff = arena.get(p.effect);
            forced.insert(eff.name.clone(), eff.polarity);
        }
    }

    condition.iter().all(|c| {
        let f = arena.get(*c);
        forced.get(&f.name).map(|&v| v == f.polarity).unwrap_or(true)
    })
}

/// A path whose condition list contains both a literal and its negation
/// can never fire and is dead code. Per §4.6/§7 this checks `conditions`
/// only: an effect that contradicts one of its own conditions (e.g.
/// `a? ( !a )`) is not a self-conflict, just an ordinary rule that forces
/// a flag false -- the solver resolves it like any other path.
pub fn verify_self_conflicting(arena: &FlagArena, paths: &[Path]) -> Result<(), FlagformError> {
    for p in paths {
        for i in 0..p.conditions.len() {
            let a = arena.get(p.conditions[i]);
            for cond in &p.conditions[i + 1..] {
                let b = arena.get(*cond);
                if a.name == b.name && a.polarity != b.polarity {
                    return Err(FlagformError::SelfConflict {
                        path: p.display(arena),
                        literal: a.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Does any path try to set a flag the caller has fixed to the opposite
/// value? Conditions that can never hold (because they require an
/// immutable flag to be something it isn't) make the whole path vacuous,
/// not an error — only a live path with a contradicted effect is.
pub fn verify_immutability(
    arena: &FlagArena,
    paths: &[Path],
    immutable: &HashMap<String, bool>,
) -> Result<(), FlagformError> {
    'paths: for p in paths {
        for cond in &p.conditions {
            let c = arena.get(*cond);
            if let Some(&fixed) = immutable.get(&c.name) {
                if fixed != c.polarity {
                    continue 'paths;
                }
            }
        }
        let eff = arena.get(p.effect);
        if let Some(&fixed) = immutable.get(&eff.name) {
            if fixed != eff.polarity {
                return Err(FlagformError::Immutability {
                    path: p.display(arena),
                    flag: eff.name.clone(),
                    expected: fixed,
                });
            }
        }
    }
    Ok(())
}

/// Two paths conflict when they can both fire (coexisting, reachable
/// conditions) but disagree on the same flag's value.
pub fn verify_conflicts(arena: &FlagArena, paths: &[Path]) -> Result<(), FlagformError> {
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let (pi, pj) = (&paths[i], &paths[j]);
            let ei = arena.get(pi.effect);
            let ej = arena.get(pj.effect);
            if ei.name == ej.name
                && ei.polarity != ej.polarity
                && conditions_can_coexist(arena, &pi.conditions, &pj.conditions)
                && condition_can_occur(arena, &pi.conditions, &paths[..i])
                && condition_can_occur(arena, &pj.conditions, &paths[..j])
            {
                return Err(FlagformError::Conflict {
                    p1: pi.display(arena),
                    p2: pj.display(arena),
                    effect: ei.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Does any condition in `conditions` reference the same flag `literal`
/// does, regardless of polarity? Membership here is deliberately
/// polarity-blind: a later effect that pins a flag to either value
/// forces a re-examination of an earlier rule that already named that
/// flag in its condition, whether the two agree or disagree.
fn touches(arena: &FlagArena, conditions: &[FlagId], literal: &crate::flag::Flag) -> bool {
    conditions.iter().any(|c| arena.get(*c).name == literal.name)
}

/// Does `producer` have to run before `consumer` to avoid a second pass?
///
/// True when, after splitting off their common prefix, `producer`'s effect
/// names a flag that appears in `consumer`'s remaining conditions, the two
/// suffixes can still coexist, and the relationship isn't the mutual
/// (circular) shape where `consumer`'s effect *also* names a flag in
/// `producer`'s suffix. That mutual shape is excepted: whichever of the two
/// fires first, the other's condition was already naming the same flag the
/// first rule touches, so the pair is self-consistent by construction
/// rather than order-sensitive (§8 scenarios 1 and 2). A plain forward
/// reference — `producer` earlier in source order, `consumer` later,
/// consumer depending on what producer already set — isn't an ordering
/// hazard at all and is excluded by the caller only examining backward
/// pairs where it matters (see [`verify_back_alteration`]); [`crate::graph`]
/// calls this for every ordered pair to build the full precedence graph.
///
/// The exception matches on flag name only, not polarity: a pair like
/// `a? ( !b ) b? ( a )` is excepted even though the two suffixes name `b`
/// with opposite polarity. That's a known, deliberately kept lenient
/// reading, not an oversight — see scenario 2 in the integration tests.
pub fn must_precede(arena: &FlagArena, producer: &Path, consumer: &Path) -> bool {
    let (consumer_suffix, producer_suffix) =
        split_common_prefix(&consumer.conditions, &producer.conditions);
    let producer_effect = arena.get(producer.effect).clone();
    let consumer_effect = arena.get(consumer.effect).clone();
    touches(arena, &consumer_suffix, &producer_effect)
        && conditions_can_coexist(arena, &consumer_suffix, &producer_suffix)
        && !touches(arena, &producer_suffix, &consumer_effect)
}

/// A later path can "back-alter" an earlier one when its effect names a
/// flag the earlier path's own (non-shared) conditions already reference —
/// i.e. applying `pj` after `pi` may flip a literal `pi` depends on,
/// requiring a second pass over `pi` — and the two can still coexist
/// otherwise. See [`must_precede`] for the shared definition and its
/// circular exception.
pub fn verify_back_alteration(arena: &FlagArena, paths: &[Path]) -> Result<(), FlagformError> {
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let (pi, pj) = (&paths[i], &paths[j]);
            if must_precede(arena, pj, pi) {
                return Err(FlagformError::BackAlteration {
                    pj: pj.display(arena),
                    ej: arena.get(pj.effect).name.clone(),
                    pi: pi.display(arena),
                    ei: arena.get(pi.effect).name.clone(),
                });
            }
        }
    }
    Ok(())
}

pub fn verify_all(
    arena: &FlagArena,
    paths: &[Path],
    immutable: &HashMap<String, bool>,
) -> Result<(), FlagformError> {
    log::debug!("verify: self-conflict over {} paths", paths.len());
    verify_self_conflicting(arena, paths)?;
    log::debug!("verify: immutability");
    verify_immutability(arena, paths, immutable)?;
    log::debug!("verify: mutual conflict");
    verify_conflicts(arena, paths)?;
    log::debug!("verify: back-alteration");
    verify_back_alteration(arena, paths)?;
    Ok(())
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
    fn detects_self_conflict() {
        // nested implications accumulate into one path's condition list;
        // here it ends up holding both `a` and `!a`.
        let (arena, paths) = paths_for("a? ( !a? ( x ) )");
        assert!(matches!(
            verify_self_conflicting(&arena, &paths),
            Err(FlagformError::SelfConflict { .. })
        ));
    }

    #[test]
    fn effect_contradicting_its_own_condition_is_not_a_self_conflict() {
        // a? ( !a ) forces `a` false whenever `a` holds -- a legitimate
        // rule the solver resolves, not a structural error (§4.6/§7 define
        // self-conflict over the condition list only, not the effect).
        let (arena, paths) = paths_for("a? ( !a )");
        assert!(verify_self_conflicting(&arena, &paths).is_ok());
    }

    #[test]
    fn detects_immutability_violation() {
        let (arena, paths) = paths_for("a? ( b )");
        let mut immutable = HashMap::new();
        immutable.insert("b".to_string(), false);
        assert!(matches!(
            verify_immutability(&arena, &paths, &immutable),
            Err(FlagformError::Immutability { .. })
        ));
    }

    #[test]
    fn vacuous_path_under_immutability_is_not_an_error() {
        let (arena, paths) = paths_for("a? ( b )");
        let mut immutable = HashMap::new();
        immutable.insert("a".to_string(), false);
        assert!(verify_immutability(&arena, &paths, &immutable).is_ok());
    }

    #[test]
    fn detects_direct_conflict() {
        let (arena, paths) = paths_for("a? ( b ) c? ( !b )");
        assert!(matches!(
            verify_conflicts(&arena, &paths),
            Err(FlagformError::Conflict { .. })
        ));
    }

    #[test]
    fn independent_branches_do_not_conflict() {
        let (arena, paths) = paths_for("a? ( b ) !a? ( !b )");
        assert!(verify_conflicts(&arena, &paths).is_ok());
    }
}
