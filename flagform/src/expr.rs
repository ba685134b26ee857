//! The AST for a parsed constraint: a small tagged sum type.
//!
//! This is deliberately not the zero-copy, trait-dispatched `Expr` shape
//! used elsewhere in the workspace for the general term language — this
//! grammar has exactly three node kinds and no binders, so a plain enum
//! with exhaustive matching is the right tool.
use crate::flag::FlagId;
use strum::EnumIs;

/// The four n-ary operators the grammar supports. `AllOf` never appears in
/// source text directly (there is no `&&` header) — it is the internal
/// node produced for a bare `( ... )` group, and the restricted grammar
/// forbids it from surviving past [`crate::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum NaryKind {
    AnyOf,
    ExactlyOneOf,
    AtMostOneOf,
    AllOf,
}

impl NaryKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            NaryKind::AnyOf => "||",
            NaryKind::ExactlyOneOf => "^^",
            NaryKind::AtMostOneOf => "??",
            NaryKind::AllOf => "",
        }
    }
}

/// A single node of the constraint expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A bare literal, e.g. `foo` or `!foo`.
    Flag(FlagId),
    /// `flag? ( body )`. The condition is always a single literal.
    Implication { condition: FlagId, body: Vec<Expr> },
    /// `|| ( ... )`, `^^ ( ... )`, `?? ( ... )`, or a bare `( ... )`.
    ///
    /// `polarity` is `true` for every node the parser produces. It exists
    /// to mirror the original prototype's negatable `AllOfOperator`
    /// (`negated()` flips an `enabled` bit rather than rebuilding the
    /// node); [`crate::validate`]'s restricted grammar only ever lets a
    /// plain literal stand where a negated `AllOf` could otherwise
    /// appear, so [`crate::normalize`]'s De Morgan step negates children
    /// directly instead and this field stays `true` in practice.
    NaryOp {
        kind: NaryKind,
        polarity: bool,
        children: Vec<Expr>,
    },
}

impl Expr {
    pub fn flag_id(&self) -> Option<FlagId> {
        match self {
            Expr::Flag(id) => Some(*id),
            _ => None,
        }
    }
}
