//! Targeted tests for the verification primitives, one case per concern
//! named in the original prototype's test suite: common-prefix splitting,
//! coexistence, conflict detection, and the two back-alteration shapes
//! (a genuine ordering violation vs. the circular exception).
use flagform::flag::{Flag, FlagArena};
use flagform::flatten::flatten;
use flagform::parser::parse;
use flagform::verify::*;
use std::collections::HashMap;

#[test]
fn split_common_prefix_matches_only_physically_shared_conditions() {
    let mut arena = FlagArena::new();
    let a = arena.intern(Flag::new("a", true));
    let b = arena.intern(Flag::new("b", true));
    let c = arena.intern(Flag::new("c", true));
    let d = arena.intern(Flag::new("d", true));

    let (r1, r2) = split_common_prefix(&[a, b, c], &[a, b, d]);
    assert_eq!(r1, vec![c]);
    assert_eq!(r2, vec![d]);
}

#[test]
fn split_common_prefix_value_equal_but_distinct_occurrences_do_not_merge() {
    let mut arena = FlagArena::new();
    // Two separately-interned occurrences of the same value: same Flag,
    // different FlagId, so they must NOT be treated as a shared prefix.
    let a1 = arena.intern(Flag::new("a", true));
    let a2 = arena.intern(Flag::new("a", true));
    assert_ne!(a1, a2);
    let (r1, r2) = split_common_prefix(&[a1], &[a2]);
    assert_eq!(r1, vec![a1]);
    assert_eq!(r2, vec![a2]);
}

#[test]
fn conditions_can_coexist_true_when_disjoint() {
    let p = parse("a? ( x )").unwrap();
    let q = parse("b? ( y )").unwrap();
    let mut arena = p.arena;
    let a = arena.intern(Flag::new("a", true));
    let b = arena.intern(Flag::new("b", true));
    let _ = q;
    assert!(conditions_can_coexist(&arena, &[a], &[b]));
}

#[test]
fn conditions_can_coexist_false_on_direct_negation() {
    let mut arena = FlagArena::new();
    let a_true = arena.intern(Flag::new("a", true));
    let a_false = arena.intern(Flag::new("a", false));
    assert!(!conditions_can_coexist(&arena, &[a_true], &[a_false]));
}

#[test]
fn test_condition_respects_explicit_assignment_and_fallback() {
    let mut arena = FlagArena::new();
    let a = arena.intern(Flag::new("a", true));
    let mut flags = HashMap::new();
    flags.insert("a".to_string(), true);
    assert!(test_condition(&arena, &[a], &flags, None));

    let b = arena.intern(Flag::new("b", true));
    assert!(!test_condition(&arena, &[b], &flags, None));
    assert!(test_condition(&arena, &[b], &flags, Some(true)));
}

#[test]
fn condition_can_occur_is_false_when_self_contradictory() {
    let mut arena = FlagArena::new();
    let a_true = arena.intern(Flag::new("a", true));
    let a_false = arena.intern(Flag::new("a", false));
    assert!(!condition_can_occur(&arena, &[a_true, a_false], &[]));
}

#[test]
fn back_alteration_fires_when_a_later_path_can_break_an_earlier_one() {
    // b? ( c ) a? ( !b ) -- the second path's effect (!b) contradicts a
    // condition the first path depends on, and both can coexist.
    let p = parse("b? ( c ) a? ( !b )").unwrap();
    let mut arena = p.arena;
    let paths = flatten(&mut arena, &p.exprs);
    assert!(matches!(
        verify_back_alteration(&arena, &paths),
        Err(flagform::error::FlagformError::BackAlteration { .. })
    ));
}

#[test]
fn back_alteration_circular_case_is_excepted_not_reported() {
    // ^^ ( a b ) expands to a pair of paths that are each other's
    // back-alteration counterpart by construction; that mutual case is a
    // deliberate exception, left for the topological-sort cycle check.
    let p = parse("^^ ( a b )").unwrap();
    let mut arena = p.arena;
    let paths = flatten(&mut arena, &p.exprs);
    assert!(verify_back_alteration(&arena, &paths).is_ok());
}
