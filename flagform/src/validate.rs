//! The restricted-grammar check run once, right after parsing.
//!
//! A full [`Expr`] tree is more permissive than the shape every later pass
//! assumes: `AllOf` nodes (bare `( ... )` groups) and nested operators
//! inside n-ary bodies are syntactically parseable but semantically
//! forbidden. This pass is the single place that draws that line.
use crate::error::FlagformError;
use crate::expr::{Expr, NaryKind};

pub fn validate(exprs: &[Expr]) -> Result<(), FlagformError> {
    for e in exprs {
        validate_expr(e)?;
    }
    Ok(())
}

fn validate_expr(expr: &Expr) -> Result<(), FlagformError> {
    match expr {
        Expr::Flag(_) => Ok(()),
        Expr::Implication { body, .. } => validate(body),
        Expr::NaryOp {
            kind: NaryKind::AllOf,
            ..
        } => Err(FlagformError::Validation(
            "all-of operator (bare parentheses) forbidden at this position".into(),
        )),
        Expr::NaryOp { children, .. } => {
            for child in children {
                match child {
                    Expr::Flag(_) => {}
                    _ => {
                        return Err(FlagformError::Validation(
                            "n-ary operator children must be plain literals".into(),
                        ));
                    }
                }
            }
            Ok(())
        }
    }
}
