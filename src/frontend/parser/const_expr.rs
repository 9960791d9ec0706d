//! Integer constant expressions
//!
//! Array lengths and const initializers reach this parser as token runs
//! already cut out by the declaration parser. Anything outside the integer
//! subset (strings, floats, comparisons, calls other than conversions)
//! yields `None` and the caller keeps the source text instead.

use super::ast::{BinaryOp, ConstExpr, UnaryOp};
use crate::frontend::lexer::TokenKind;

/// Parse a complete token run as an integer constant expression
pub fn parse_const_expr(tokens: &[TokenKind]) -> Option<ConstExpr> {
    let mut parser = ConstParser { tokens, pos: 0 };
    let expr = parser.binary(1)?;
    (parser.pos == tokens.len()).then_some(expr)
}

/// Value of an integer literal: decimal, `0x`, `0o`, `0b`, legacy octal, `_` separators
pub fn parse_int_literal(text: &str) -> Option<i128> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    i128::from_str_radix(body, radix).ok()
}

struct ConstParser<'t> {
    tokens: &'t [TokenKind],
    pos: usize,
}

impl ConstParser<'_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos)
    }

    fn eat(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Precedence climbing; every supported operator is left-associative
    fn binary(
        &mut self,
        min_prec: u8,
    ) -> Option<ConstExpr> {
        let mut lhs = self.unary()?;
        while let Some((op, prec)) = self.peek().and_then(BinaryOp::from_token) {
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(prec + 1)?;
            lhs = ConstExpr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<ConstExpr> {
        let op = match self.peek()? {
            TokenKind::Operator(op) => match op.as_str() {
                "+" => Some(UnaryOp::Plus),
                "-" => Some(UnaryOp::Neg),
                "^" => Some(UnaryOp::Not),
                _ => return None,
            },
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                Some(ConstExpr::Unary(op, Box::new(self.unary()?)))
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Option<ConstExpr> {
        let token = self.peek()?.clone();
        self.pos += 1;
        match token {
            TokenKind::IntLiteral(text) => parse_int_literal(&text).map(ConstExpr::Int),
            TokenKind::LParen => {
                let inner = self.binary(1)?;
                self.eat(&TokenKind::RParen).then_some(inner)
            }
            TokenKind::Identifier(name) => {
                let (package, name) = if self.eat(&TokenKind::Dot) {
                    match self.peek()?.clone() {
                        TokenKind::Identifier(member) => {
                            self.pos += 1;
                            (Some(name), member)
                        }
                        _ => return None,
                    }
                } else {
                    (None, name)
                };

                if self.eat(&TokenKind::LParen) {
                    let arg = self.binary(1)?;
                    if !self.eat(&TokenKind::RParen) {
                        return None;
                    }
                    let ty = match package {
                        Some(package) => format!("{}.{}", package, name),
                        None => name,
                    };
                    return Some(ConstExpr::Conversion {
                        ty,
                        arg: Box::new(arg),
                    });
                }

                if package.is_none() && name == "iota" {
                    return Some(ConstExpr::Iota);
                }
                Some(ConstExpr::Name { package, name })
            }
            _ => None,
        }
    }
}
