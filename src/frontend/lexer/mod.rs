//! Lexer module
//!
//! Tokenizes Go source text. Keywords, literals and the punctuation the
//! declaration parser inspects get their own kinds; every other operator is
//! carried as text. Semicolons are inserted at line ends following the Go rule.

pub mod tokens;

pub use tokens::*;
pub use tokenizer::tokenize;

use crate::util::span::Position;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("{position}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, position: Position },
    #[error("{position}: string literal not terminated")]
    UnterminatedString { position: Position },
    #[error("{position}: raw string literal not terminated")]
    UnterminatedRawString { position: Position },
    #[error("{position}: rune literal not terminated")]
    UnterminatedRune { position: Position },
    #[error("{position}: comment not terminated")]
    UnterminatedComment { position: Position },
    #[error("{position}: unknown escape sequence '\\{sequence}'")]
    InvalidEscape { sequence: String, position: Position },
    #[error("{position}: invalid number literal {text}")]
    InvalidNumber { text: String, position: Position },
}

/// Tokenize source code
mod tokenizer {
    use super::*;
    use crate::util::span::Span;
    use std::iter::Peekable;
    use std::str::Chars;

    /// Every Go operator and delimiter, matched longest first
    const OPERATORS: &[&str] = &[
        "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=",
        "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%",
        "&", "|", "^", "<", ">", "=", "!", "~", ":", ".", ",", ";", "(", ")", "[", "]", "{", "}",
    ];

    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();

        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }

        let end = lexer.position();
        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(end, end),
        });
        Ok(tokens)
    }

    struct Lexer<'a> {
        chars: Peekable<Chars<'a>>,
        offset: usize,
        line: usize,
        column: usize,
        start_offset: usize,
        start_line: usize,
        start_column: usize,
        /// Whether the previous token allows an automatic semicolon
        insert_semi: bool,
    }

    impl<'a> Lexer<'a> {
        fn new(source: &'a str) -> Self {
            Self {
                chars: source.chars().peekable(),
                offset: 0,
                line: 1,
                column: 1,
                start_offset: 0,
                start_line: 1,
                start_column: 1,
                insert_semi: false,
            }
        }

        fn position(&self) -> Position {
            Position::with_offset(self.line, self.column, self.offset)
        }

        fn start_position(&self) -> Position {
            Position::with_offset(self.start_line, self.start_column, self.start_offset)
        }

        fn mark_start(&mut self) {
            self.start_offset = self.offset;
            self.start_line = self.line;
            self.start_column = self.column;
        }

        fn span(&self) -> Span {
            Span::new(self.start_position(), self.position())
        }

        fn advance(&mut self) -> Option<char> {
            match self.chars.next() {
                Some('\n') => {
                    self.offset += 1;
                    self.line += 1;
                    self.column = 1;
                    Some('\n')
                }
                Some(c) => {
                    self.offset += c.len_utf8();
                    self.column += 1;
                    Some(c)
                }
                None => None,
            }
        }

        fn peek(&mut self) -> Option<&char> {
            self.chars.peek()
        }

        fn peek_next(&self) -> Option<char> {
            self.chars.clone().nth(1)
        }

        fn make_token(
            &self,
            kind: TokenKind,
        ) -> Token {
            Token {
                kind,
                span: self.span(),
            }
        }

        /// Emit an automatic semicolon if the previous token asked for one
        fn take_semicolon(&mut self) -> Option<Token> {
            if self.insert_semi {
                self.insert_semi = false;
                Some(self.make_token(TokenKind::Semicolon))
            } else {
                None
            }
        }

        fn next_token(&mut self) -> Result<Option<Token>, LexError> {
            loop {
                match self.peek().copied() {
                    None => {
                        self.mark_start();
                        return Ok(self.take_semicolon());
                    }
                    Some(' ' | '\t' | '\r') => {
                        self.advance();
                    }
                    Some('\n') => {
                        self.mark_start();
                        self.advance();
                        if let Some(semi) = self.take_semicolon() {
                            return Ok(Some(semi));
                        }
                    }
                    Some('/') if self.peek_next() == Some('/') => {
                        // Line comment; the newline is handled on the next turn
                        while let Some(&c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('/') if self.peek_next() == Some('*') => {
                        self.mark_start();
                        if self.skip_block_comment()? {
                            if let Some(semi) = self.take_semicolon() {
                                return Ok(Some(semi));
                            }
                        }
                    }
                    Some(_) => break,
                }
            }

            self.mark_start();
            let c = match self.advance() {
                Some(c) => c,
                None => return Ok(None),
            };

            let kind = match c {
                c if is_letter(c) => self.scan_identifier(c),
                c if c.is_ascii_digit() => self.scan_number(c)?,
                '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.scan_number('.')?,
                '"' => self.scan_string()?,
                '`' => self.scan_raw_string()?,
                '\'' => self.scan_rune()?,
                c => self.scan_operator(c)?,
            };

            self.insert_semi = kind.ends_statement();
            Ok(Some(self.make_token(kind)))
        }

        /// Skip a `/* ... */` comment, reporting whether it spanned a newline
        fn skip_block_comment(&mut self) -> Result<bool, LexError> {
            self.advance();
            self.advance();
            let mut had_newline = false;
            loop {
                match self.advance() {
                    Some('*') if self.peek() == Some(&'/') => {
                        self.advance();
                        return Ok(had_newline);
                    }
                    Some('\n') => had_newline = true,
                    Some(_) => {}
                    None => {
                        return Err(LexError::UnterminatedComment {
                            position: self.start_position(),
                        })
                    }
                }
            }
        }

        fn scan_identifier(
            &mut self,
            first_char: char,
        ) -> TokenKind {
            let mut value = String::new();
            value.push(first_char);

            while let Some(&c) = self.peek() {
                if is_letter_or_digit(c) {
                    value.push(c);
                    self.advance();
                } else {
                    break;
                }
            }

            keyword(&value).unwrap_or(TokenKind::Identifier(value))
        }

        fn scan_number(
            &mut self,
            first_char: char,
        ) -> Result<TokenKind, LexError> {
            let mut text = String::new();
            text.push(first_char);
            let hex = first_char == '0' && matches!(self.peek(), Some('x' | 'X'));

            loop {
                match self.peek().copied() {
                    Some('.') if self.peek_next() == Some('.') => break,
                    Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                        text.push(c);
                        self.advance();
                    }
                    Some(c @ ('+' | '-')) if is_exponent_marker(text.chars().last(), hex) => {
                        text.push(c);
                        self.advance();
                    }
                    _ => break,
                }
            }

            let digits: String = text.chars().filter(|&c| c != '_').collect();
            let invalid = || LexError::InvalidNumber {
                text: text.clone(),
                position: self.start_position(),
            };

            if let Some(mantissa) = digits.strip_suffix('i') {
                if mantissa.is_empty() {
                    return Err(invalid());
                }
                return Ok(TokenKind::ImagLiteral(text.clone()));
            }

            let is_float = if hex {
                digits.contains(|c| matches!(c, 'p' | 'P'))
            } else {
                digits.contains(|c| matches!(c, '.' | 'e' | 'E'))
            };

            if is_float {
                if !hex && digits.parse::<f64>().is_err() {
                    return Err(invalid());
                }
                return Ok(TokenKind::FloatLiteral(text.clone()));
            }

            if valid_integer(&digits) {
                Ok(TokenKind::IntLiteral(text.clone()))
            } else {
                Err(invalid())
            }
        }

        fn scan_string(&mut self) -> Result<TokenKind, LexError> {
            let mut value = String::new();

            loop {
                match self.peek().copied() {
                    Some('"') => {
                        self.advance();
                        return Ok(TokenKind::StringLiteral(value));
                    }
                    Some('\\') => {
                        self.advance();
                        value.push(self.scan_escape('"')?);
                    }
                    Some('\n') | None => {
                        return Err(LexError::UnterminatedString {
                            position: self.start_position(),
                        });
                    }
                    Some(c) => {
                        value.push(c);
                        self.advance();
                    }
                }
            }
        }

        fn scan_escape(
            &mut self,
            quote: char,
        ) -> Result<char, LexError> {
            let escaped = self.advance().ok_or(LexError::UnterminatedString {
                position: self.start_position(),
            })?;

            let decoded = match escaped {
                'a' => Some('\u{7}'),
                'b' => Some('\u{8}'),
                'f' => Some('\u{c}'),
                'n' => Some('\n'),
                'r' => Some('\r'),
                't' => Some('\t'),
                'v' => Some('\u{b}'),
                '\\' => Some('\\'),
                c if c == quote => Some(c),
                'x' => self.read_digits(2, 16).and_then(char::from_u32),
                'u' => self.read_digits(4, 16).and_then(char::from_u32),
                'U' => self.read_digits(8, 16).and_then(char::from_u32),
                c @ '0'..='7' => {
                    let rest = self.read_digits(2, 8);
                    rest.and_then(|r| char::from_u32((c as u32 - '0' as u32) * 64 + r))
                }
                _ => None,
            };

            decoded.ok_or_else(|| LexError::InvalidEscape {
                sequence: escaped.to_string(),
                position: self.start_position(),
            })
        }

        fn read_digits(
            &mut self,
            count: usize,
            radix: u32,
        ) -> Option<u32> {
            let mut value = 0u32;
            for _ in 0..count {
                let digit = self.peek()?.to_digit(radix)?;
                self.advance();
                value = value.checked_mul(radix)?.checked_add(digit)?;
            }
            Some(value)
        }

        fn scan_raw_string(&mut self) -> Result<TokenKind, LexError> {
            let mut value = String::new();
            loop {
                match self.advance() {
                    Some('`') => return Ok(TokenKind::StringLiteral(value)),
                    // Carriage returns are discarded from raw strings
                    Some('\r') => {}
                    Some(c) => value.push(c),
                    None => {
                        return Err(LexError::UnterminatedRawString {
                            position: self.start_position(),
                        })
                    }
                }
            }
        }

        fn scan_rune(&mut self) -> Result<TokenKind, LexError> {
            let mut text = String::new();
            loop {
                match self.advance() {
                    Some('\'') => return Ok(TokenKind::RuneLiteral(format!("'{}'", text))),
                    Some('\\') => {
                        text.push('\\');
                        match self.advance() {
                            Some('\n') | None => break,
                            Some(c) => text.push(c),
                        }
                    }
                    Some('\n') | None => break,
                    Some(c) => text.push(c),
                }
            }
            Err(LexError::UnterminatedRune {
                position: self.start_position(),
            })
        }

        fn scan_operator(
            &mut self,
            first: char,
        ) -> Result<TokenKind, LexError> {
            let lookahead: Vec<char> = self.chars.clone().take(2).collect();

            for extra in (0..=lookahead.len()).rev() {
                let mut text = String::new();
                text.push(first);
                text.extend(&lookahead[..extra]);
                if OPERATORS.contains(&text.as_str()) {
                    for _ in 0..extra {
                        self.advance();
                    }
                    return Ok(operator_kind(&text));
                }
            }

            Err(LexError::UnexpectedChar {
                ch: first,
                position: self.start_position(),
            })
        }
    }

    fn operator_kind(text: &str) -> TokenKind {
        match text {
            "(" => TokenKind::LParen,
            ")" => TokenKind::RParen,
            "[" => TokenKind::LBracket,
            "]" => TokenKind::RBracket,
            "{" => TokenKind::LBrace,
            "}" => TokenKind::RBrace,
            "," => TokenKind::Comma,
            ":" => TokenKind::Colon,
            ";" => TokenKind::Semicolon,
            "." => TokenKind::Dot,
            "*" => TokenKind::Star,
            "=" => TokenKind::Assign,
            ":=" => TokenKind::Define,
            "~" => TokenKind::Tilde,
            "|" => TokenKind::Pipe,
            "<-" => TokenKind::Arrow,
            "++" => TokenKind::Inc,
            "--" => TokenKind::Dec,
            "..." => TokenKind::Ellipsis,
            other => TokenKind::Operator(other.to_string()),
        }
    }

    fn is_exponent_marker(
        last: Option<char>,
        hex: bool,
    ) -> bool {
        match last {
            Some('p' | 'P') => hex,
            Some('e' | 'E') => !hex,
            _ => false,
        }
    }

    /// Check an integer literal's digits against its prefix
    fn valid_integer(digits: &str) -> bool {
        let lower = digits.to_ascii_lowercase();
        let (body, radix) = if let Some(rest) = lower.strip_prefix("0x") {
            (rest, 16)
        } else if let Some(rest) = lower.strip_prefix("0b") {
            (rest, 2)
        } else if let Some(rest) = lower.strip_prefix("0o") {
            (rest, 8)
        } else if lower.len() > 1 && lower.starts_with('0') {
            (&lower[1..], 8)
        } else {
            (lower.as_str(), 10)
        };
        !body.is_empty() && body.chars().all(|c| c.is_digit(radix))
    }

    fn is_letter(c: char) -> bool {
        c == '_' || unicode_ident::is_xid_start(c)
    }

    fn is_letter_or_digit(c: char) -> bool {
        c == '_' || unicode_ident::is_xid_continue(c)
    }
}

#[cfg(test)]
mod tests;
