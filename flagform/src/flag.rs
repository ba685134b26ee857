//! The literal atoms the whole algebra is built from.
//!
//! Role
//! - [`Flag`] is a plain `(name, polarity)` value.
//! - [`FlagArena`] interns every literal *occurrence* the parser creates and
//!   hands back a [`FlagId`]. Occurrences are never deduplicated by value:
//!   two syntactically identical literals parsed from two different spots
//!   in the source get distinct ids, so `FlagId` equality tracks physical
//!   identity (the same AST node reached twice) while `Flag` equality
//!   tracks value. Both downstream passes need: identity for common-prefix
//!   detection, value for everything else.
use std::fmt;

/// A single conditional literal: a name and the polarity it must hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flag {
    pub name: String,
    pub polarity: bool,
}

impl Flag {
    pub fn new(name: impl Into<String>, polarity: bool) -> Self {
        Flag {
            name: name.into(),
            polarity,
        }
    }

    pub fn negate(&self) -> Self {
        Flag::new(self.name.clone(), !self.polarity)
    }

    /// `^[A-Za-z0-9][A-Za-z0-9+_@-]*$`
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '@' | '-'))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.polarity {
            write!(f, "{}", self.name)
        } else {
            write!(f, "!{}", self.name)
        }
    }
}

/// Identity handle into a [`FlagArena`]. Equality is identity, not value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagId(pub usize);

/// Owns every [`Flag`] occurrence produced while parsing one constraint
/// string. Transformation passes reference flags through this arena rather
/// than cloning them, so identity survives every rewrite.
#[derive(Debug, Default, Clone)]
pub struct FlagArena {
    flags: Vec<Flag>,
}

impl FlagArena {
    pub fn new() -> Self {
        FlagArena { flags: Vec::new() }
    }

    /// Record a new occurrence and return its id. Never deduplicates.
    pub fn intern(&mut self, flag: Flag) -> FlagId {
        let id = FlagId(self.flags.len());
        self.flags.push(flag);
        id
    }

    pub fn get(&self, id: FlagId) -> &Flag {
        &self.flags[id.0]
    }

    /// Intern the negation of an existing flag as a fresh occurrence.
    pub fn negate(&mut self, id: FlagId) -> FlagId {
        let negated = self.get(id).negate();
        self.intern(negated)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
