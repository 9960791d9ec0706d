//! Go frontend
//!
//! Lexer, parser, package loading and the type checker that turns Go
//! sources into a shared type table.

pub mod lexer;
pub mod module;
pub mod parser;
pub mod typecheck;
