//! Parser module
//!
//! Recursive-descent parser for the declaration level of Go source files.
//! Package clause, imports, type, func, var and const declarations are
//! parsed; function bodies are skipped by bracket balancing. Initializer
//! expressions are skipped too, except that const initializers and array
//! lengths keep an integer constant expression when they have one.

pub mod ast;
mod const_expr;
mod decl;
mod state;
mod type_parser;

pub use const_expr::{parse_const_expr, parse_int_literal};
pub use state::ParserState;

use crate::frontend::lexer::{tokenize, LexError, Token, TokenKind};
use crate::util::span::Span;
use ast::*;

/// Parse a source file from text
pub fn parse_file(source: &str) -> Result<SourceFile, ParseError> {
    let tokens = tokenize(source)?;
    parse(&tokens)
}

/// Parse tokens into a [`SourceFile`]
///
/// Returns the first error encountered.
pub fn parse(tokens: &[Token]) -> Result<SourceFile, ParseError> {
    let mut state = ParserState::new(tokens);

    let header = state.parse_package_clause();
    let (package, package_span) = match header {
        Some(header) => header,
        None => return Err(first_error(state)),
    };

    let mut imports = Vec::new();
    while state.at(&TokenKind::KwImport) {
        if state.parse_import_decl(&mut imports).is_none() {
            state.synchronize();
        }
    }

    let mut decls = Vec::new();
    while !state.at_end() {
        if state.skip(&TokenKind::Semicolon) {
            continue;
        }
        if state.parse_top_level_decl(&mut decls).is_none() {
            state.synchronize();
        }
    }

    if state.has_errors() {
        return Err(first_error(state));
    }

    Ok(SourceFile {
        package,
        package_span,
        imports,
        decls,
    })
}

/// Read only the package clause
///
/// Used to group files by package name without a full parse.
pub fn parse_package_name(source: &str) -> Result<String, ParseError> {
    let tokens = tokenize(source)?;
    let mut state = ParserState::new(&tokens);
    match state.parse_package_clause() {
        Some((name, _)) => Ok(name),
        None => Err(first_error(state)),
    }
}

fn first_error(state: ParserState<'_>) -> ParseError {
    let span = state.span();
    state
        .into_errors()
        .into_iter()
        .next()
        .unwrap_or(ParseError::MissingPackageClause { span })
}

/// Parse error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{span}: expected {expected}, found {found}")]
    ExpectedToken {
        expected: String,
        found: TokenKind,
        span: Span,
    },

    #[error("{span}: expected 'package' clause")]
    MissingPackageClause { span: Span },

    #[error("{span}: imports must appear before other declarations")]
    LateImport { span: Span },

    #[error("{span}: mixed named and unnamed parameters")]
    MixedParameters { span: Span },

    #[error("{span}: missing type constraint")]
    MissingConstraint { span: Span },

    #[error("{span}: block not terminated")]
    UnterminatedBlock { span: Span },
}

#[cfg(test)]
mod tests;
