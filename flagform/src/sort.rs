//! Stable sort of n-ary children, biased toward immutable flags first and
//! masked ones last.
//!
//! Running a forced-true-under-immutables branch of an `||`/`^^`/`??`
//! group first gives the reference solver the best chance of converging
//! in one pass: an immutable literal's truth value can never change, so
//! evaluating it first never needs revisiting. A *masked* literal -- one
//! whose polarity is the opposite of what immutables require -- can never
//! fire, so §4.3 sorts it last: flattening always treats the first `||`
//! child as the preferred alternative, and a masked literal must never be
//! that preferred choice. `AllOf` groups are passed through unsorted
//! (their children are an unordered bag already) but still recursed into.
use crate::expr::{Expr, NaryKind};
use crate::flag::{Flag, FlagArena};
use std::collections::HashMap;

/// Sort key: `(rank, name)`. `rank` is `0` for a literal forced true by
/// immutables, `1` for an ordinary (unconstrained) literal, `2` for a
/// literal masked by immutables (its polarity is the one immutables rule
/// out). Ties break on name for determinism.
fn key(flag: &Flag, immutable: &HashMap<String, bool>) -> (u8, String) {
    let rank = match immutable.get(&flag.name) {
        Some(&required) if required == flag.polarity => 0,
        Some(_) => 2,
        None => 1,
    };
    (rank, flag.name.clone())
}

pub fn sort_exprs(arena: &FlagArena, exprs: &mut [Expr], immutable: &HashMap<String, bool>) {
    for e in exprs.iter_mut() {
        sort_expr(arena, e, immutable);
    }
}

fn sort_expr(arena: &FlagArena, expr: &mut Expr, immutable: &HashMap<String, bool>) {
    match expr {
        Expr::Flag(_) => {}
        Expr::Implication { body, .. } => sort_exprs(arena, body, immutable),
        Expr::NaryOp {
            kind: NaryKind::AllOf,
            children,
            ..
        } => sort_exprs(arena, children, immutable),
        Expr::NaryOp { children, .. } => {
            sort_exprs(arena, children, immutable);
            children.sort_by_key(|c| match c {
                Expr::Flag(id) => key(arena.get(*id), immutable),
                _ => unreachable!("validated AST: n-ary children are flags"),
            });
        }
    }
}
