//! Parser state and token stream management

use super::super::lexer::tokens::*;
use super::ParseError;
use crate::util::span::Span;

static EOF: TokenKind = TokenKind::Eof;

/// Saved parser position for backtracking
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    pos: usize,
    errors: usize,
    last_end: Span,
}

/// Parser state for tracking position and errors
#[derive(Debug)]
pub struct ParserState<'a> {
    /// Token stream, terminated by `Eof`
    tokens: &'a [Token],
    /// Current position in token stream
    pos: usize,
    /// Parsing errors
    errors: Vec<ParseError>,
    /// Span of the last consumed token
    last_end: Span,
}

impl<'a> ParserState<'a> {
    /// Create a new parser state
    #[inline]
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            last_end: Span::dummy(),
        }
    }

    /// Check if at end of token stream
    #[inline]
    pub fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    /// Get current token kind
    #[inline]
    pub fn kind(&self) -> &TokenKind {
        self.peek_kind(0)
    }

    /// Peek at the nth token kind ahead
    #[inline]
    pub fn peek_kind(
        &self,
        n: usize,
    ) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&EOF)
    }

    /// Check the current token kind
    #[inline]
    pub fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.kind() == kind
    }

    /// Whether the current token is an identifier
    #[inline]
    pub fn at_ident(&self) -> bool {
        matches!(self.kind(), TokenKind::Identifier(_))
    }

    /// Span of the current token
    #[inline]
    pub fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or(self.last_end)
    }

    /// Span from `start` to the end of the last consumed token
    #[inline]
    pub fn span_from(
        &self,
        start: Span,
    ) -> Span {
        start.to(self.last_end)
    }

    /// Advance to next token
    #[inline]
    pub fn bump(&mut self) {
        if !self.at_end() {
            self.last_end = self.span();
            self.pos += 1;
        }
    }

    /// Skip a specific token
    #[inline]
    pub fn skip(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expect a specific token, report error if not found
    pub fn expect(
        &mut self,
        kind: &TokenKind,
    ) -> Option<Span> {
        if self.at(kind) {
            let span = self.span();
            self.bump();
            Some(span)
        } else {
            self.error_expected(&kind.to_string());
            None
        }
    }

    /// Expect an identifier and return its name
    pub fn expect_ident(&mut self) -> Option<(String, Span)> {
        if let TokenKind::Identifier(name) = self.kind() {
            let name = name.clone();
            let span = self.span();
            self.bump();
            Some((name, span))
        } else {
            self.error_expected("identifier");
            None
        }
    }

    /// Record an "expected X, found Y" error at the current token
    pub fn error_expected(
        &mut self,
        expected: &str,
    ) {
        let error = ParseError::ExpectedToken {
            expected: expected.to_string(),
            found: self.kind().clone(),
            span: self.span(),
        };
        self.error(error);
    }

    /// Add a parse error
    #[inline]
    pub fn error(
        &mut self,
        error: ParseError,
    ) {
        self.errors.push(error);
    }

    /// Check if there are errors
    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get all errors
    #[inline]
    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Save the current position
    #[inline]
    pub fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            errors: self.errors.len(),
            last_end: self.last_end,
        }
    }

    /// Return to a saved position, dropping errors recorded since
    #[inline]
    pub fn reset(
        &mut self,
        mark: Mark,
    ) {
        self.pos = mark.pos;
        self.errors.truncate(mark.errors);
        self.last_end = mark.last_end;
    }

    /// Index of the token matching the bracket at `pos + offset`
    ///
    /// Returns the lookahead distance of the closing bracket.
    pub fn matching_close(
        &self,
        offset: usize,
    ) -> Option<usize> {
        let mut depth = 0usize;
        let mut n = offset;
        loop {
            match self.peek_kind(n) {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(n);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            n += 1;
        }
    }

    /// Skip a balanced `{ ... }` block
    pub fn skip_block(&mut self) -> bool {
        let start = self.span();
        match self.matching_close(0) {
            Some(n) => {
                for _ in 0..=n {
                    self.bump();
                }
                true
            }
            None => {
                self.error(ParseError::UnterminatedBlock { span: start });
                while !self.at_end() {
                    self.bump();
                }
                false
            }
        }
    }

    /// Skip an expression list up to `;` or an unmatched closer
    ///
    /// With `keep`, the tokens of each top-level comma-separated item are returned.
    pub fn skip_expr_list(
        &mut self,
        keep: bool,
    ) -> Vec<Vec<TokenKind>> {
        let mut items = Vec::new();
        let mut current = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace if depth == 0 => break,
                TokenKind::Comma if depth == 0 => {
                    if keep {
                        items.push(std::mem::take(&mut current));
                    }
                    self.bump();
                    continue;
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            if keep {
                current.push(self.kind().clone());
            }
            self.bump();
        }
        if keep {
            items.push(current);
        }
        items
    }

    /// Skip to the token after the next top-level `;`
    pub fn synchronize(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.bump();
                    return;
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.bump();
        }
    }
}
