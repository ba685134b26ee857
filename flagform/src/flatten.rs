//! Flattening: AST forest to a flat list of `(conditions, effect)` paths.
//!
//! This is the third version of the flattening algorithm from the original
//! prototype, kept deliberately trivial: every path has exactly one
//! effect literal. The prototype's `?? ( a b c )` branch produced a path
//! with a *list* of effects, which every downstream consumer (conflict
//! detection, back-alteration, the solver) then has to special-case — here
//! `?? ( a b c )` instead emits one path per excluded literal
//! (`a? ( !b )`, `a? ( !c )`, `b? ( !c )`), so every `Path` downstream of
//! this module carries a single effect, no exceptions.
use crate::expr::{Expr, NaryKind};
use crate::flag::{FlagArena, FlagId};

/// One flattened implication: `conditions` all hold, therefore `effect`.
#[derive(Debug, Clone)]
pub struct Path {
    pub conditions: Vec<FlagId>,
    pub effect: FlagId,
}

impl Path {
    pub fn display(&self, arena: &FlagArena) -> String {
        let conds: Vec<String> = self
            .conditions
            .iter()
            .map(|c| arena.get(*c).to_string())
            .collect();
        format!("{} -> {}", conds.join(" "), arena.get(self.effect))
    }
}

fn flag_id_of(e: &Expr) -> FlagId {
    e.flag_id()
        .expect("validated AST guarantees n-ary children are flags")
}

pub fn flatten(arena: &mut FlagArena, exprs: &[Expr]) -> Vec<Path> {
    let mut out = Vec::new();
    flatten_into(arena, exprs, &[], &mut out);
    out
}

fn flatten_into(arena: &mut FlagArena, exprs: &[Expr], conditions: &[FlagId], out: &mut Vec<Path>) {
    for expr in exprs {
        match expr {
            Expr::Flag(id) => out.push(Path {
                conditions: conditions.to_vec(),
                effect: *id,
            }),
            Expr::Implication { condition, body } => {
                let mut conds = conditions.to_vec();
                conds.push(*condition);
                flatten_into(arena, body, &conds, out);
            }
            Expr::NaryOp {
                kind: NaryKind::AllOf,
                children,
                ..
            } => flatten_into(arena, children, conditions, out),
            Expr::NaryOp {
                kind: NaryKind::AnyOf,
                children,
                ..
            } => {
                // || ( a b c ) -> [!b !c]? ( a )
                let mut conds = conditions.to_vec();
                for tail in &children[1..] {
                    let negated = arena.negate(flag_id_of(tail));
                    conds.push(negated);
                }
                out.push(Path {
                    conditions: conds,
                    effect: flag_id_of(&children[0]),
                });
            }
            Expr::NaryOp {
                kind: NaryKind::AtMostOneOf,
                children,
                ..
            } => {
                // ?? ( a b c ) -> a? ( !b ) a? ( !c ) b? ( !c )
                for i in 0..children.len() {
                    let head = flag_id_of(&children[i]);
                    for excluded in &children[i + 1..] {
                        let negated = arena.negate(flag_id_of(excluded));
                        let mut conds = conditions.to_vec();
                        conds.push(head);
                        out.push(Path {
                            conditions: conds,
                            effect: negated,
                        });
                    }
                }
            }
            Expr::NaryOp {
                kind: NaryKind::ExactlyOneOf,
                children,
                ..
            } => {
                let any_of = Expr::NaryOp {
                    kind: NaryKind::AnyOf,
                    polarity: true,
                    children: children.clone(),
                };
                let at_most_one = Expr::NaryOp {
                    kind: NaryKind::AtMostOneOf,
                    polarity: true,
                    children: children.clone(),
                };
                flatten_into(arena, std::slice::from_ref(&any_of), conditions, out);
                flatten_into(arena, std::slice::from_ref(&at_most_one), conditions, out);
            }
        }
    }
}
