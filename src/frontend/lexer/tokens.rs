//! Token types

use std::fmt;

use crate::util::span::Span;

/// Token kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords (25 total)
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Identifiers
    Identifier(String),

    // Literals (source text, except strings which hold the decoded value)
    IntLiteral(String),
    FloatLiteral(String),
    ImagLiteral(String),
    RuneLiteral(String),
    StringLiteral(String),

    // Operators the declaration parser looks at individually
    Star,
    Assign,
    Define,
    Tilde,
    Pipe,
    Arrow,
    Inc,
    Dec,
    Ellipsis,
    /// Any other operator, kept as text
    Operator(String),

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,

    // Special
    Eof,
}

impl TokenKind {
    /// Whether a newline after this token inserts a semicolon
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
                | TokenKind::ImagLiteral(_)
                | TokenKind::RuneLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::KwBreak
                | TokenKind::KwContinue
                | TokenKind::KwFallthrough
                | TokenKind::KwReturn
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier {}", name),
            TokenKind::IntLiteral(text)
            | TokenKind::FloatLiteral(text)
            | TokenKind::ImagLiteral(text)
            | TokenKind::RuneLiteral(text) => write!(f, "literal {}", text),
            TokenKind::StringLiteral(value) => write!(f, "literal {:?}", value),
            TokenKind::Eof => write!(f, "EOF"),
            other => write!(f, "'{}'", other.text()),
        }
    }
}

impl TokenKind {
    /// Source text of the token; string literals are re-quoted
    pub fn text(&self) -> String {
        let text = match self {
            TokenKind::KwBreak => "break",
            TokenKind::KwCase => "case",
            TokenKind::KwChan => "chan",
            TokenKind::KwConst => "const",
            TokenKind::KwContinue => "continue",
            TokenKind::KwDefault => "default",
            TokenKind::KwDefer => "defer",
            TokenKind::KwElse => "else",
            TokenKind::KwFallthrough => "fallthrough",
            TokenKind::KwFor => "for",
            TokenKind::KwFunc => "func",
            TokenKind::KwGo => "go",
            TokenKind::KwGoto => "goto",
            TokenKind::KwIf => "if",
            TokenKind::KwImport => "import",
            TokenKind::KwInterface => "interface",
            TokenKind::KwMap => "map",
            TokenKind::KwPackage => "package",
            TokenKind::KwRange => "range",
            TokenKind::KwReturn => "return",
            TokenKind::KwSelect => "select",
            TokenKind::KwStruct => "struct",
            TokenKind::KwSwitch => "switch",
            TokenKind::KwType => "type",
            TokenKind::KwVar => "var",
            TokenKind::Identifier(name) => return name.clone(),
            TokenKind::IntLiteral(text)
            | TokenKind::FloatLiteral(text)
            | TokenKind::ImagLiteral(text)
            | TokenKind::RuneLiteral(text) => return text.clone(),
            TokenKind::StringLiteral(value) => return format!("{:?}", value),
            TokenKind::Star => "*",
            TokenKind::Assign => "=",
            TokenKind::Define => ":=",
            TokenKind::Tilde => "~",
            TokenKind::Pipe => "|",
            TokenKind::Arrow => "<-",
            TokenKind::Inc => "++",
            TokenKind::Dec => "--",
            TokenKind::Ellipsis => "...",
            TokenKind::Operator(op) => op.as_str(),
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Eof => "",
        };
        text.to_string()
    }
}

/// Token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl From<TokenKind> for Token {
    fn from(kind: TokenKind) -> Self {
        Token {
            kind,
            span: Span::dummy(),
        }
    }
}

/// Keyword lookup
pub fn keyword(s: &str) -> Option<TokenKind> {
    let kind = match s {
        "break" => TokenKind::KwBreak,
        "case" => TokenKind::KwCase,
        "chan" => TokenKind::KwChan,
        "const" => TokenKind::KwConst,
        "continue" => TokenKind::KwContinue,
        "default" => TokenKind::KwDefault,
        "defer" => TokenKind::KwDefer,
        "else" => TokenKind::KwElse,
        "fallthrough" => TokenKind::KwFallthrough,
        "for" => TokenKind::KwFor,
        "func" => TokenKind::KwFunc,
        "go" => TokenKind::KwGo,
        "goto" => TokenKind::KwGoto,
        "if" => TokenKind::KwIf,
        "import" => TokenKind::KwImport,
        "interface" => TokenKind::KwInterface,
        "map" => TokenKind::KwMap,
        "package" => TokenKind::KwPackage,
        "range" => TokenKind::KwRange,
        "return" => TokenKind::KwReturn,
        "select" => TokenKind::KwSelect,
        "struct" => TokenKind::KwStruct,
        "switch" => TokenKind::KwSwitch,
        "type" => TokenKind::KwType,
        "var" => TokenKind::KwVar,
        _ => return None,
    };
    Some(kind)
}
