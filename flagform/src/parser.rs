//! Recursive-descent parser: token slice to [`Expr`] forest.
//!
//! A cursor over the token slice, rather than the generator-over-a-mutated-
//! list style of the original prototype — idiomatic for a borrow-checked
//! language and just as easy to read top to bottom.
use crate::error::ParseErrorKind;
use crate::expr::{Expr, NaryKind};
use crate::flag::{Flag, FlagArena};
use crate::lexer::{self, Spanned, Token};

/// Everything a successful parse produces: the top-level forest and the
/// arena owning every literal occurrence referenced within it.
pub struct Parsed {
    pub exprs: Vec<Expr>,
    pub arena: FlagArena,
}

struct Cursor<'a> {
    tokens: &'a [Spanned<Token>],
    pos: usize,
    arena: FlagArena,
}

fn split_negation(word: &str) -> (&str, bool) {
    match word.strip_prefix('!') {
        Some(rest) => (rest, false),
        None => (word, true),
    }
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.value)
    }

    fn bump(&mut self) -> Option<&Spanned<Token>> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn expect_open(&mut self) -> Result<(), ParseErrorKind> {
        match self.peek() {
            Some(Token::Open) => {
                self.bump();
                Ok(())
            }
            _ => Err(ParseErrorKind::MissingOpenParen {
                flag: String::new(),
            }),
        }
    }

    fn expect_close(&mut self) -> Result<(), ParseErrorKind> {
        match self.peek() {
            Some(Token::Close) => {
                self.bump();
                Ok(())
            }
            _ => Err(ParseErrorKind::UnterminatedGroup),
        }
    }

    fn intern_literal(&mut self, raw: &str) -> Result<crate::flag::FlagId, ParseErrorKind> {
        let (name, polarity) = split_negation(raw);
        if !Flag::is_valid_name(name) {
            return Err(ParseErrorKind::InvalidName(name.to_string()));
        }
        Ok(self.arena.intern(Flag::new(name, polarity)))
    }

    /// Parse a sequence of terms. `nested` distinguishes a group body
    /// (terminated by `)`) from the top level (terminated by end of input).
    fn parse_sequence(&mut self, nested: bool) -> Result<Vec<Expr>, ParseErrorKind> {
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => {
                    if nested {
                        return Err(ParseErrorKind::UnterminatedGroup);
                    }
                    return Ok(out);
                }
                Some(Token::Close) => {
                    if nested {
                        return Ok(out);
                    }
                    return Err(ParseErrorKind::StrayCloseParen);
                }
                Some(Token::Open) => {
                    self.bump();
                    let children = self.parse_sequence(true)?;
                    self.expect_close()?;
                    out.push(Expr::NaryOp {
                        kind: NaryKind::AllOf,
                        polarity: true,
                        children,
                    });
                }
                Some(Token::AnyOf) | Some(Token::ExactlyOneOf) | Some(Token::AtMostOneOf) => {
                    let kind = match self.bump().unwrap().value {
                        Token::AnyOf => NaryKind::AnyOf,
                        Token::ExactlyOneOf => NaryKind::ExactlyOneOf,
                        Token::AtMostOneOf => NaryKind::AtMostOneOf,
                        _ => unreachable!(),
                    };
                    self.expect_open()?;
                    let children = self.parse_sequence(true)?;
                    self.expect_close()?;
                    if children.is_empty() {
                        return Err(ParseErrorKind::EmptyGroup);
                    }
                    out.push(Expr::NaryOp {
                        kind,
                        polarity: true,
                        children,
                    });
                }
                Some(Token::Conditional(_)) => {
                    let name = match &self.bump().unwrap().value {
                        Token::Conditional(n) => n.clone(),
                        _ => unreachable!(),
                    };
                    let condition = self.intern_literal(&name)?;
                    self.expect_open().map_err(|_| ParseErrorKind::MissingOpenParen {
                        flag: name.clone(),
                    })?;
                    let body = self.parse_sequence(true)?;
                    self.expect_close()?;
                    out.push(Expr::Implication { condition, body });
                }
                Some(Token::Literal(_)) => {
                    let name = match &self.bump().unwrap().value {
                        Token::Literal(n) => n.clone(),
                        _ => unreachable!(),
                    };
                    let id = self.intern_literal(&name)?;
                    out.push(Expr::Flag(id));
                }
            }
        }
    }
}

/// Parse a full constraint string into an AST forest.
pub fn parse(input: &str) -> Result<Parsed, ParseErrorKind> {
    let tokens = lexer::tokenize(input);
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
        arena: FlagArena::new(),
    };
    let exprs = cursor.parse_sequence(false)?;
    Ok(Parsed {
        exprs,
        arena: cursor.arena,
    })
}
