//! Algebraic normal form used to cross-check `flatten` (§4.5).
//!
//! Where `flatten` lowers the AST directly into single-effect paths,
//! this pipeline first rewrites it into boolean algebra
//! (`AllOf`/`AnyOf`/`Flag`/`Implication`), merges nested implications,
//! substitutes immutable-fixed literals with their constant truth value,
//! and only then lowers to a list of implications -- negating `||`
//! alternatives (De Morgan) and distributing the resulting disjunction
//! across separate implications rather than encoding it positionally the
//! way `flatten` does. Both pipelines must still agree on solver
//! behavior (§8's normalizer-equivalence property); they reach that
//! agreement by different routes rather than by one reusing the other.
use crate::expr::{Expr, NaryKind};
use crate::flag::{FlagArena, FlagId};
use std::collections::HashMap;

/// A fully-lowered implication: `conditions` all hold, therefore every
/// literal in `effects` holds. Unlike `flatten::Path`, `effects` may
/// carry more than one literal -- `?? ( a b c )` is one implication per
/// producer (`a -> [!b, !c]`, `b -> [!c]`), not one path per excluded
/// pair.
#[derive(Debug, Clone)]
pub struct Implication {
    pub conditions: Vec<FlagId>,
    pub effects: Vec<FlagId>,
}

/// Intermediate boolean-algebra form (§4.5 steps 1-4).
#[derive(Debug, Clone)]
enum NExpr {
    Flag(FlagId),
    AllOf(Vec<NExpr>),
    AnyOf(Vec<NExpr>),
    Implication { conditions: Vec<FlagId>, body: Vec<NExpr> },
    /// A fully-collapsed boolean constant, produced only by [`simplify`].
    Bool(bool),
}

fn flag_id_of(e: &Expr) -> FlagId {
    e.flag_id()
        .expect("validated AST guarantees n-ary children are flags")
}

/// §4.5 step 1: fold `a? ( b? ( x ) )` into one `Implication` with
/// condition `[a, b]` rather than one nested inside another, repeating
/// while the body keeps reducing to a single nested implication.
fn merge_implication(mut conditions: Vec<FlagId>, body: Vec<NExpr>) -> NExpr {
    if body.len() == 1 {
        if let NExpr::Implication {
            conditions: inner_conditions,
            body: inner_body,
        } = &body[0]
        {
            conditions.extend(inner_conditions.clone());
            return merge_implication(conditions, inner_body.clone());
        }
    }
    NExpr::Implication { conditions, body }
}

/// §4.5 step 2: a bare implication surviving as an n-ary child --
/// `validate` forbids this on real input, but this module's own internal
/// form is built before that restriction would apply -- is lifted into a
/// conjunction of its guard and consequence: `|| ( a? ( b ) c )` becomes
/// `|| ( AllOf(a, b) c )`, matching `examples/original_source/to_impl.py`'s
/// worked case for `|| ( a b c? ( d ) )`.
fn lift_child(arena: &mut FlagArena, expr: &Expr) -> NExpr {
    match to_algebraic_one(arena, expr) {
        NExpr::Implication { conditions, body } => {
            let mut all: Vec<NExpr> = conditions.into_iter().map(NExpr::Flag).collect();
            all.extend(body);
            NExpr::AllOf(all)
        }
        other => other,
    }
}

/// §4.5 step 3 (the `??`/`^^` half): group consequences per producer, the
/// same grouping `examples/original_source/replace_nary.py`'s
/// `??`/`^^` branch performs -- `?? ( a b c )` becomes `a -> [!b, !c]`,
/// `b -> [!c]`, not one implication per excluded pair.
fn rewrite_at_most_one(arena: &mut FlagArena, children: &[Expr]) -> NExpr {
    let mut flags: Vec<FlagId> = children.iter().map(flag_id_of).collect();
    let mut out = Vec::new();
    while flags.len() > 1 {
        let head = flags.remove(0);
        let body: Vec<NExpr> = flags.iter().map(|&f| NExpr::Flag(arena.negate(f))).collect();
        out.push(NExpr::Implication {
            conditions: vec![head],
            body,
        });
    }
    NExpr::AllOf(out)
}

fn to_algebraic_one(arena: &mut FlagArena, expr: &Expr) -> NExpr {
    match expr {
        Expr::Flag(id) => NExpr::Flag(*id),
        Expr::Implication { condition, body } => {
            let body_n: Vec<NExpr> = body.iter().map(|b| to_algebraic_one(arena, b)).collect();
            merge_implication(vec![*condition], body_n)
        }
        Expr::NaryOp {
            kind: NaryKind::AllOf,
            children,
            ..
        } => NExpr::AllOf(children.iter().map(|c| to_algebraic_one(arena, c)).collect()),
        Expr::NaryOp {
            kind: NaryKind::AnyOf,
            children,
            ..
        } => NExpr::AnyOf(children.iter().map(|c| lift_child(arena, c)).collect()),
        Expr::NaryOp {
            kind: NaryKind::AtMostOneOf,
            children,
            ..
        } => rewrite_at_most_one(arena, children),
        Expr::NaryOp {
            kind: NaryKind::ExactlyOneOf,
            children,
            ..
        } => NExpr::AllOf(vec![
            NExpr::AnyOf(children.iter().map(|c| lift_child(arena, c)).collect()),
            rewrite_at_most_one(arena, children),
        ]),
    }
}

/// §4.5 step 4: substitute every literal by its forced truth value under
/// `immutable`; `AllOf` with any false child collapses to false, `AnyOf`
/// with any true child collapses to true, and an implication whose
/// conditions are all forced true drops them (folding into its body),
/// while any condition forced false makes the whole implication vacuously
/// true. Re-merging (step 5) falls out of calling [`merge_implication`]
/// again on the simplified body, since substitution can expose a fresh
/// single-nested-implication shape the same way step 1 did.
fn simplify(arena: &FlagArena, immutable: &HashMap<String, bool>, expr: NExpr) -> NExpr {
    match expr {
        NExpr::Bool(b) => NExpr::Bool(b),
        NExpr::Flag(id) => {
            let f = arena.get(id);
            match immutable.get(&f.name) {
                Some(&required) => NExpr::Bool(required == f.polarity),
                None => NExpr::Flag(id),
            }
        }
        NExpr::AllOf(children) => {
            let mut kept = Vec::with_capacity(children.len());
            for c in children {
                match simplify(arena, immutable, c) {
                    NExpr::Bool(false) => return NExpr::Bool(false),
                    NExpr::Bool(true) => {}
                    other => kept.push(other),
                }
            }
            match kept.len() {
                0 => NExpr::Bool(true),
                1 => kept.into_iter().next().unwrap(),
                _ => NExpr::AllOf(kept),
            }
        }
        NExpr::AnyOf(children) => {
            let mut kept = Vec::with_capacity(children.len());
            for c in children {
                match simplify(arena, immutable, c) {
                    NExpr::Bool(true) => return NExpr::Bool(true),
                    NExpr::Bool(false) => {}
                    other => kept.push(other),
                }
            }
            match kept.len() {
                0 => NExpr::Bool(false),
                1 => kept.into_iter().next().unwrap(),
                _ => NExpr::AnyOf(kept),
            }
        }
        NExpr::Implication { conditions, body } => {
            let mut remaining = Vec::with_capacity(conditions.len());
            for c in conditions {
                let f = arena.get(c);
                match immutable.get(&f.name) {
                    Some(&required) if required == f.polarity => {} // forced true: drop
                    Some(_) => return NExpr::Bool(true),             // forced false: vacuous
                    None => remaining.push(c),
                }
            }
            let body: Vec<NExpr> = body.into_iter().map(|b| simplify(arena, immutable, b)).collect();
            merge_implication(remaining, body)
        }
    }
}

/// §4.5's De Morgan negation: flip a literal, swap `AllOf`/`AnyOf`, and
/// negate an implication as "conditions hold and the body doesn't" --
/// `examples/original_source/replace_nary.py` and `to_impl.py`'s `negate`
/// this module's name comes from. In practice an `Implication` is never
/// passed here: [`lift_child`] already rewrote any nested implication
/// into a bare `AllOf` before this point, so this arm exists only for
/// completeness.
fn negate(arena: &mut FlagArena, expr: &NExpr) -> NExpr {
    match expr {
        NExpr::Bool(b) => NExpr::Bool(!b),
        NExpr::Flag(id) => NExpr::Flag(arena.negate(*id)),
        NExpr::AllOf(children) => NExpr::AnyOf(children.iter().map(|c| negate(arena, c)).collect()),
        NExpr::AnyOf(children) => NExpr::AllOf(children.iter().map(|c| negate(arena, c)).collect()),
        NExpr::Implication { conditions, body } => {
            let mut all: Vec<NExpr> = conditions.iter().map(|c| NExpr::Flag(*c)).collect();
            let negated_body: Vec<NExpr> = body.iter().map(|b| negate(arena, b)).collect();
            all.push(match negated_body.len() {
                1 => negated_body.into_iter().next().unwrap(),
                _ => NExpr::AnyOf(negated_body),
            });
            NExpr::AllOf(all)
        }
    }
}

/// `examples/original_source/to_impl.py::merge`: fold a (possibly
/// disjunctive or conjunctive) condition expression onto an
/// already-lowered list of implications. An `AnyOf` condition distributes
/// into one copy of `cons` per disjunct -- `(P or Q) -> X` becomes
/// `(P -> X) and (Q -> X)` -- which is exactly the CNF distribution §4.5
/// names; an `AllOf` condition folds right, peeling one conjunct at a
/// time so a disjunctive conjunct still distributes correctly.
fn merge(arena: &mut FlagArena, cond: &NExpr, cons: &[Implication]) -> Vec<Implication> {
    match cond {
        NExpr::Flag(id) => cons
            .iter()
            .map(|c| {
                let mut conditions = vec![*id];
                conditions.extend(c.conditions.clone());
                Implication {
                    conditions,
                    effects: c.effects.clone(),
                }
            })
            .collect(),
        NExpr::AnyOf(children) => children.iter().flat_map(|c| merge(arena, c, cons)).collect(),
        NExpr::AllOf(children) => {
            if children.is_empty() {
                cons.to_vec()
            } else {
                let rest = NExpr::AllOf(children[1..].to_vec());
                let inner = merge(arena, &rest, cons);
                merge(arena, &children[0], &inner)
            }
        }
        // Never produced past `simplify`/`lift_child`; fold through as a
        // vacuous (always-true) condition rather than panic.
        NExpr::Implication { .. } | NExpr::Bool(_) => cons.to_vec(),
    }
}

/// `examples/original_source/to_impl.py::to_implication`.
fn lower(arena: &mut FlagArena, expr: &NExpr) -> Vec<Implication> {
    match expr {
        NExpr::Bool(_) => Vec::new(),
        NExpr::Flag(id) => vec![Implication {
            conditions: Vec::new(),
            effects: vec![*id],
        }],
        NExpr::Implication { conditions, body } => body
            .iter()
            .flat_map(|b| lower(arena, b))
            .map(|c| {
                let mut cs = conditions.clone();
                cs.extend(c.conditions);
                Implication {
                    conditions: cs,
                    effects: c.effects,
                }
            })
            .collect(),
        NExpr::AllOf(children) => children.iter().flat_map(|c| lower(arena, c)).collect(),
        NExpr::AnyOf(children) => {
            if children.is_empty() {
                return Vec::new();
            }
            let head = &children[0];
            let rest = &children[1..];
            if rest.is_empty() {
                lower(arena, head)
            } else {
                let negated_rest = negate(arena, &NExpr::AnyOf(rest.to_vec()));
                merge(arena, &negated_rest, &lower(arena, head))
            }
        }
    }
}

/// Lower `exprs` straight to implications, with no immutables to
/// simplify against.
pub fn to_implications(arena: &mut FlagArena, exprs: &[Expr]) -> Vec<Implication> {
    to_implications_with_immutables(arena, exprs, &HashMap::new())
}

/// The full §4.5 pipeline: rewrite to algebraic form, simplify against
/// `immutable`, then lower to implications.
pub fn to_implications_with_immutables(
    arena: &mut FlagArena,
    exprs: &[Expr],
    immutable: &HashMap<String, bool>,
) -> Vec<Implication> {
    exprs
        .iter()
        .map(|e| to_algebraic_one(arena, e))
        .map(|e| simplify(arena, immutable, e))
        .flat_map(|e| lower(arena, &e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn names(arena: &FlagArena, ids: &[FlagId]) -> Vec<String> {
        ids.iter().map(|id| arena.get(*id).to_string()).collect()
    }

    #[test]
    fn any_of_becomes_single_implication() {
        let p = parse("|| ( a b )").unwrap();
        let mut arena = p.arena;
        let impls = to_implications(&mut arena, &p.exprs);
        assert_eq!(impls.len(), 1);
        assert_eq!(names(&arena, &impls[0].conditions), vec!["!b"]);
        assert_eq!(names(&arena, &impls[0].effects), vec!["a"]);
    }

    #[test]
    fn at_most_one_of_groups_effects_per_producer() {
        let p = parse("?? ( a b c )").unwrap();
        let mut arena = p.arena;
        let impls = to_implications(&mut arena, &p.exprs);
        assert_eq!(impls.len(), 2);
        assert_eq!(names(&arena, &impls[0].conditions), vec!["a"]);
        assert_eq!(names(&arena, &impls[0].effects), vec!["!b", "!c"]);
        assert_eq!(names(&arena, &impls[1].conditions), vec!["b"]);
        assert_eq!(names(&arena, &impls[1].effects), vec!["!c"]);
    }

    #[test]
    fn exactly_one_of_produces_two_implications() {
        let p = parse("^^ ( a b )").unwrap();
        let mut arena = p.arena;
        let impls = to_implications(&mut arena, &p.exprs);
        assert_eq!(impls.len(), 2);
        assert_eq!(names(&arena, &impls[0].conditions), vec!["!b"]);
        assert_eq!(names(&arena, &impls[0].effects), vec!["a"]);
        assert_eq!(names(&arena, &impls[1].conditions), vec!["a"]);
        assert_eq!(names(&arena, &impls[1].effects), vec!["!b"]);
    }

    #[test]
    fn any_of_with_nested_implication_alternative_distributes_over_or() {
        // examples/original_source/to_impl.py::selftest's worked case:
        // || ( a b c?(d) ), forcing `a`, distributes the negation of the
        // other two alternatives into two separate implications rather
        // than one implication with a three-literal condition.
        let p = parse("|| ( a b c? ( d ) )").unwrap();
        let mut arena = p.arena;
        let impls = to_implications(&mut arena, &p.exprs);
        assert_eq!(impls.len(), 2);
        assert_eq!(names(&arena, &impls[0].conditions), vec!["!b", "!c"]);
        assert_eq!(names(&arena, &impls[0].effects), vec!["a"]);
        assert_eq!(names(&arena, &impls[1].conditions), vec!["!b", "!d"]);
        assert_eq!(names(&arena, &impls[1].effects), vec!["a"]);
    }

    #[test]
    fn immutable_simplification_drops_a_forced_true_condition() {
        let p = parse("a? ( b )").unwrap();
        let mut arena = p.arena;
        let mut immutable = HashMap::new();
        immutable.insert("a".to_string(), true);
        let impls = to_implications_with_immutables(&mut arena, &p.exprs, &immutable);
        assert_eq!(impls.len(), 1);
        assert!(impls[0].conditions.is_empty());
        assert_eq!(names(&arena, &impls[0].effects), vec!["b"]);
    }

    #[test]
    fn immutable_simplification_erases_a_vacuous_rule() {
        let p = parse("a? ( b )").unwrap();
        let mut arena = p.arena;
        let mut immutable = HashMap::new();
        immutable.insert("a".to_string(), false);
        let impls = to_implications_with_immutables(&mut arena, &p.exprs, &immutable);
        assert!(impls.is_empty());
    }

    #[test]
    fn immutable_simplification_resolves_an_any_of_alternative() {
        // || ( a b ) with `a` fixed true needs nothing further from `b`.
        let p = parse("|| ( a b )").unwrap();
        let mut arena = p.arena;
        let mut immutable = HashMap::new();
        immutable.insert("a".to_string(), true);
        let impls = to_implications_with_immutables(&mut arena, &p.exprs, &immutable);
        assert!(impls.is_empty());
    }

    #[test]
    fn nested_implications_merge_before_lowering() {
        let p = parse("a? ( b? ( x ) )").unwrap();
        let mut arena = p.arena;
        let impls = to_implications(&mut arena, &p.exprs);
        assert_eq!(impls.len(), 1);
        assert_eq!(names(&arena, &impls[0].conditions), vec!["a", "b"]);
        assert_eq!(names(&arena, &impls[0].effects), vec!["x"]);
    }
}
