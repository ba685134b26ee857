//! Analysis and normalization engine for conditional USE-constraint
//! expressions: the `flag? ( body )` / `|| ( ... )` / `^^ ( ... )` /
//! `?? ( ... )` algebra used to express build-option interdependencies.
//!
//! Role
//! - Parse a constraint string into an [`expr::Expr`] forest.
//! - Flatten it into a canonical `conditions -> effect` [`flatten::Path`]
//!   list.
//! - Run the static analyses in [`verify`] over that list: self-conflict,
//!   immutability, mutual conflict, back-alteration.
//! - Build the back-alteration ordering graph in [`graph`] and classify
//!   the whole constraint via [`classify`].
//! - Run the left-to-right reference propagator in [`solve`].
//!
//! This crate has no opinion on how a caller gets a constraint string or
//! what it does with a verdict; [`classify::classify`] and the rest of the
//! public API are pure functions over the path list. The CLI binary in the
//! companion `flagform-cli` crate is the out-of-scope presentation layer.
pub mod classify;
pub mod error;
pub mod expr;
pub mod flag;
pub mod flatten;
pub mod graph;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod solve;
pub mod sort;
pub mod validate;
pub mod verify;

pub mod prelude {
    pub use crate::classify::{classify, Verdict};
    pub use crate::error::{FlagformError, FlagformResult, ParseErrorKind};
    pub use crate::expr::{Expr, NaryKind};
    pub use crate::flag::{Flag, FlagArena, FlagId};
    pub use crate::flatten::{flatten, Path};
    pub use crate::parser::{parse, Parsed};
    pub use crate::solve::{solve, SolveOutcome};
    pub use crate::verify::verify_all;
}
