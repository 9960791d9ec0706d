//! Lexer unit tests
//!
//! Tokenization of the Go subset used by declaration parsing.

use crate::frontend::lexer::{tokenize, LexError, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

#[cfg(test)]
mod lexer_basic_tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Eof));
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(kinds("   \t\n\r   "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("package main"),
            vec![
                TokenKind::KwPackage,
                ident("main"),
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(kinds("数据 x_1")[0], ident("数据"));
        assert_eq!(kinds("数据 x_1")[1], ident("x_1"));
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = tokenize("type\n  Foo").unwrap();
        assert_eq!(tokens[0].span.start.line, 1);
        assert_eq!(tokens[1].span.start.line, 2);
        assert_eq!(tokens[1].span.start.column, 3);
    }
}

#[cfg(test)]
mod semicolon_insertion_tests {
    use super::*;

    #[test]
    fn test_semicolon_after_identifier_line() {
        assert_eq!(
            kinds("a\nb"),
            vec![
                ident("a"),
                TokenKind::Semicolon,
                ident("b"),
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_open_brace() {
        assert_eq!(
            kinds("struct {\n}"),
            vec![
                TokenKind::KwStruct,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_semicolon_after_return_and_closing_paren() {
        let k = kinds("return\nf()\n");
        assert_eq!(k[1], TokenKind::Semicolon);
        assert_eq!(k[5], TokenKind::Semicolon);
    }

    #[test]
    fn test_line_comment_before_newline_still_inserts() {
        assert_eq!(
            kinds("x // trailing\ny"),
            vec![
                ident("x"),
                TokenKind::Semicolon,
                ident("y"),
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_multiline_block_comment_acts_as_newline() {
        let k = kinds("x /* a\nb */ y");
        assert_eq!(k[1], TokenKind::Semicolon);
        let k = kinds("x /* ab */ y");
        assert_eq!(k[1], ident("y"));
    }
}

#[cfg(test)]
mod lexer_literal_tests {
    use super::*;

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\tbé\x41""#)[0],
            TokenKind::StringLiteral("a\tbéA".to_string())
        );
    }

    #[test]
    fn test_raw_string_spans_lines() {
        let tokens = tokenize("`a\nb` x").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral("a\nb".to_string()));
        assert_eq!(tokens[1].span.start.line, 2);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::IntLiteral("42".to_string()));
        assert_eq!(kinds("0x_FF")[0], TokenKind::IntLiteral("0x_FF".to_string()));
        assert_eq!(kinds("1_000.5e-3")[0], TokenKind::FloatLiteral("1_000.5e-3".to_string()));
        assert_eq!(kinds(".5")[0], TokenKind::FloatLiteral(".5".to_string()));
        assert_eq!(kinds("0x1p-2")[0], TokenKind::FloatLiteral("0x1p-2".to_string()));
        assert_eq!(kinds("3i")[0], TokenKind::ImagLiteral("3i".to_string()));
    }

    #[test]
    fn test_rune_literals() {
        assert_eq!(kinds(r"'\n'")[0], TokenKind::RuneLiteral(r"'\n'".to_string()));
        assert_eq!(kinds("'x'")[0], TokenKind::RuneLiteral("'x'".to_string()));
    }

    #[test]
    fn test_invalid_number() {
        assert!(matches!(tokenize("0b102"), Err(LexError::InvalidNumber { .. })));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("\"abc\n\""),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_unterminated_comment() {
        assert!(matches!(
            tokenize("/* never closed"),
            Err(LexError::UnterminatedComment { .. })
        ));
    }
}

#[cfg(test)]
mod lexer_operator_tests {
    use super::*;

    #[test]
    fn test_declaration_punctuation() {
        assert_eq!(
            kinds("func (r *T) M(xs ...int) <-chan int"),
            vec![
                TokenKind::KwFunc,
                TokenKind::LParen,
                ident("r"),
                TokenKind::Star,
                ident("T"),
                TokenKind::RParen,
                ident("M"),
                TokenKind::LParen,
                ident("xs"),
                TokenKind::Ellipsis,
                ident("int"),
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::KwChan,
                ident("int"),
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_longest_operator_match() {
        assert_eq!(kinds("a &^= b")[1], TokenKind::Operator("&^=".to_string()));
        assert_eq!(kinds("a := b")[1], TokenKind::Define);
        assert_eq!(kinds("~int | ~string")[2], TokenKind::Pipe);
        assert_eq!(kinds("i++\n")[1], TokenKind::Inc);
        assert_eq!(kinds("i++\n")[2], TokenKind::Semicolon);
    }

    #[test]
    fn test_unexpected_character() {
        assert!(matches!(
            tokenize("a # b"),
            Err(LexError::UnexpectedChar { ch: '#', .. })
        ));
    }
}
