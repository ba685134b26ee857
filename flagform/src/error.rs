//! Error taxonomy for every pass of the pipeline.
//!
//! One variant per failure kind, following the shape of a typical
//! `thiserror`-derived domain error: callers match on the variant rather
//! than parsing message text.

use thiserror::Error;

/// The four distinct parse failures the grammar can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected '(' after conditional flag '{flag}'")]
    MissingOpenParen { flag: String },

    #[error("unexpected ')' with no matching '('")]
    StrayCloseParen,

    #[error("unterminated group: missing ')'")]
    UnterminatedGroup,

    #[error("invalid flag name '{0}'")]
    InvalidName(String),

    #[error("empty group body")]
    EmptyGroup,
}

/// Errors surfaced by any pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseErrorKind),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("self-conflicting path {path}: '{literal}' appears with both polarities")]
    SelfConflict { path: String, literal: String },

    #[error("path {path} would set immutable flag '{flag}' to {expected}")]
    Immutability {
        path: String,
        flag: String,
        expected: bool,
    },

    #[error("paths {p1} and {p2} can both fire and disagree on '{effect}'")]
    Conflict {
        p1: String,
        p2: String,
        effect: String,
    },

    #[error("path {pj} (via '{ej}') can be broken by path {pi} (via '{ei}')")]
    BackAlteration {
        pj: String,
        ej: String,
        pi: String,
        ei: String,
    },

    #[error("cyclic dependency among back-alteration edges")]
    Cyclic,

    #[error("reference solver did not converge")]
    InfiniteLoop,
}

pub type FlagformResult<T> = Result<T, FlagformError>;
