//! Declaration parsing

use super::super::lexer::tokens::*;
use super::ast::*;
use super::const_expr::parse_const_expr;
use super::state::*;
use super::ParseError;

impl<'a> ParserState<'a> {
    /// `package name ;`
    pub fn parse_package_clause(&mut self) -> Option<(String, crate::util::span::Span)> {
        if !self.at(&TokenKind::KwPackage) {
            let span = self.span();
            self.error(ParseError::MissingPackageClause { span });
            return None;
        }
        self.bump();
        let name = self.expect_ident()?;
        self.expect_decl_end()?;
        Some(name)
    }

    /// `import spec` or `import ( spec; ... )`
    pub fn parse_import_decl(
        &mut self,
        out: &mut Vec<ImportSpec>,
    ) -> Option<()> {
        self.expect(&TokenKind::KwImport)?;
        if self.skip(&TokenKind::LParen) {
            while !self.at(&TokenKind::RParen) && !self.at_end() {
                out.push(self.parse_import_spec()?);
                if !self.skip(&TokenKind::Semicolon) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
        } else {
            out.push(self.parse_import_spec()?);
        }
        self.expect_decl_end()
    }

    fn parse_import_spec(&mut self) -> Option<ImportSpec> {
        let start = self.span();
        let name = match self.kind() {
            TokenKind::Dot => {
                self.bump();
                Some(".".to_string())
            }
            TokenKind::Identifier(_) => Some(self.expect_ident()?.0),
            _ => None,
        };
        let path = match self.kind() {
            TokenKind::StringLiteral(path) => path.clone(),
            _ => {
                self.error_expected("import path");
                return None;
            }
        };
        self.bump();
        Some(ImportSpec {
            name,
            path,
            span: self.span_from(start),
        })
    }

    /// Parse one top-level declaration, appending to `out`
    pub fn parse_top_level_decl(
        &mut self,
        out: &mut Vec<Decl>,
    ) -> Option<()> {
        match self.kind() {
            TokenKind::KwType => self.parse_type_decl(out)?,
            TokenKind::KwFunc => out.push(Decl::Func(self.parse_func_decl()?)),
            TokenKind::KwVar => self.parse_value_decl(ValueKind::Var, out)?,
            TokenKind::KwConst => self.parse_value_decl(ValueKind::Const, out)?,
            TokenKind::KwImport => {
                let span = self.span();
                self.error(ParseError::LateImport { span });
                return None;
            }
            _ => {
                self.error_expected("declaration");
                return None;
            }
        }
        self.expect_decl_end()
    }

    /// A declaration ends with `;` or the end of the file
    fn expect_decl_end(&mut self) -> Option<()> {
        if self.skip(&TokenKind::Semicolon) || self.at_end() {
            Some(())
        } else {
            self.error_expected("';'");
            None
        }
    }

    fn parse_type_decl(
        &mut self,
        out: &mut Vec<Decl>,
    ) -> Option<()> {
        self.expect(&TokenKind::KwType)?;
        if self.skip(&TokenKind::LParen) {
            while !self.at(&TokenKind::RParen) && !self.at_end() {
                out.push(Decl::Type(self.parse_type_spec()?));
                if !self.skip(&TokenKind::Semicolon) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
        } else {
            out.push(Decl::Type(self.parse_type_spec()?));
        }
        Some(())
    }

    fn parse_type_spec(&mut self) -> Option<TypeSpec> {
        let start = self.span();
        let (name, _) = self.expect_ident()?;

        let type_params = if self.at(&TokenKind::LBracket) && self.brackets_are_type_params() {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        let alias = self.skip(&TokenKind::Assign);
        let ty = self.parse_type()?;

        Some(TypeSpec {
            name,
            type_params,
            alias,
            ty,
            span: self.span_from(start),
        })
    }

    /// `type A[T any] ...` versus the array type `type A [N]int`
    fn brackets_are_type_params(&self) -> bool {
        if !matches!(self.peek_kind(1), TokenKind::Identifier(_)) {
            return false;
        }
        matches!(
            self.peek_kind(2),
            TokenKind::Identifier(_)
                | TokenKind::Comma
                | TokenKind::Star
                | TokenKind::Tilde
                | TokenKind::LBracket
                | TokenKind::KwInterface
                | TokenKind::KwFunc
                | TokenKind::KwMap
                | TokenKind::KwChan
                | TokenKind::KwStruct
        )
    }

    /// `[K, V any, T interface{ ... }]`; constraints are skipped
    fn parse_type_params(&mut self) -> Option<Vec<TypeParam>> {
        self.expect(&TokenKind::LBracket)?;
        let mut params = Vec::new();
        let mut pending = Vec::new();

        while !self.at(&TokenKind::RBracket) && !self.at_end() {
            let (name, span) = self.expect_ident()?;
            pending.push(TypeParam { name, span });
            if self.skip(&TokenKind::Comma) {
                continue;
            }
            self.skip_constraint();
            params.append(&mut pending);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;

        if !pending.is_empty() {
            let span = self.span();
            self.error(ParseError::MissingConstraint { span });
            return None;
        }
        Some(params)
    }

    fn skip_constraint(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Eof => return,
                TokenKind::Comma | TokenKind::RBracket if depth == 0 => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.bump();
        }
    }

    fn parse_func_decl(&mut self) -> Option<FuncDecl> {
        let start = self.span();
        self.expect(&TokenKind::KwFunc)?;

        let recv = if self.at(&TokenKind::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };

        let (name, _) = self.expect_ident()?;
        let type_params = if self.at(&TokenKind::LBracket) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let sig = self.parse_signature()?;
        let span = self.span_from(start);

        if self.at(&TokenKind::LBrace) && !self.skip_block() {
            return None;
        }

        Some(FuncDecl {
            recv,
            name,
            type_params,
            sig,
            span,
        })
    }

    /// `(r *T)`, `(T)`, `(l *List[K, V])`
    fn parse_receiver(&mut self) -> Option<Receiver> {
        let start = self.span();
        self.expect(&TokenKind::LParen)?;

        let name = if self.at_ident()
            && matches!(
                self.peek_kind(1),
                TokenKind::Identifier(_) | TokenKind::Star | TokenKind::LParen
            ) {
            Some(self.expect_ident()?.0)
        } else {
            None
        };

        let parens = self.skip(&TokenKind::LParen);
        let pointer = self.skip(&TokenKind::Star);
        let (base, _) = self.expect_ident()?;

        let mut type_params = Vec::new();
        if self.skip(&TokenKind::LBracket) {
            while !self.at(&TokenKind::RBracket) && !self.at_end() {
                type_params.push(self.expect_ident()?.0);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBracket)?;
        }
        if parens {
            self.expect(&TokenKind::RParen)?;
        }
        self.skip(&TokenKind::Comma);
        self.expect(&TokenKind::RParen)?;

        Some(Receiver {
            name,
            pointer,
            base,
            type_params,
            span: self.span_from(start),
        })
    }

    fn parse_value_decl(
        &mut self,
        kind: ValueKind,
        out: &mut Vec<Decl>,
    ) -> Option<()> {
        self.bump();
        if self.skip(&TokenKind::LParen) {
            let mut index = 0;
            while !self.at(&TokenKind::RParen) && !self.at_end() {
                out.push(Decl::Value(self.parse_value_spec(kind, Some(index))?));
                index += 1;
                if !self.skip(&TokenKind::Semicolon) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
        } else {
            out.push(Decl::Value(self.parse_value_spec(kind, None)?));
        }
        Some(())
    }

    fn parse_value_spec(
        &mut self,
        kind: ValueKind,
        group_index: Option<usize>,
    ) -> Option<ValueSpec> {
        let start = self.span();
        let mut names = vec![self.expect_ident()?.0];
        while self.skip(&TokenKind::Comma) {
            names.push(self.expect_ident()?.0);
        }

        let ty = if self.can_start_type() {
            Some(self.parse_type()?)
        } else {
            None
        };

        let has_values = self.skip(&TokenKind::Assign);
        let values = if has_values {
            self.skip_expr_list(kind == ValueKind::Const)
                .iter()
                .map(|tokens| parse_const_expr(tokens))
                .collect()
        } else {
            Vec::new()
        };

        Some(ValueSpec {
            kind,
            names,
            ty,
            has_values,
            values,
            group_index,
            span: self.span_from(start),
        })
    }
}
