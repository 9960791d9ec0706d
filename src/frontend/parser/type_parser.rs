//! Type expression parsing

use super::super::lexer::tokens::*;
use super::ast::*;
use super::const_expr::parse_const_expr;
use super::state::*;

/// One element of a parameter list before grouping is resolved
enum ParamItem {
    /// A type, or a lone identifier that may turn out to be a name
    Bare(TypeExpr),
    Named(String, TypeExpr),
}

impl<'a> ParserState<'a> {
    /// Whether the current token can begin a type
    pub fn can_start_type(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Identifier(_)
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::LParen
                | TokenKind::Arrow
                | TokenKind::KwMap
                | TokenKind::KwChan
                | TokenKind::KwFunc
                | TokenKind::KwStruct
                | TokenKind::KwInterface
        )
    }

    /// Parse a type
    pub fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.span();
        match self.kind() {
            TokenKind::Identifier(_) => self.parse_type_name(),
            TokenKind::Star => {
                self.bump();
                let elem = self.parse_type()?;
                Some(TypeExpr::Pointer(Box::new(elem), self.span_from(start)))
            }
            TokenKind::LBracket => self.parse_array_or_slice(),
            TokenKind::KwMap => {
                self.bump();
                self.expect(&TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                let value = self.parse_type()?;
                Some(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                    span: self.span_from(start),
                })
            }
            TokenKind::KwChan => {
                self.bump();
                let dir = if self.skip(&TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Some(TypeExpr::Chan {
                    dir,
                    elem: Box::new(elem),
                    span: self.span_from(start),
                })
            }
            TokenKind::Arrow => {
                self.bump();
                self.expect(&TokenKind::KwChan)?;
                let elem = self.parse_type()?;
                Some(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(elem),
                    span: self.span_from(start),
                })
            }
            TokenKind::KwFunc => {
                self.bump();
                let sig = self.parse_signature()?;
                Some(TypeExpr::Func(sig, self.span_from(start)))
            }
            TokenKind::KwStruct => self.parse_struct_type(),
            TokenKind::KwInterface => self.parse_interface_type(),
            TokenKind::LParen => {
                self.bump();
                let ty = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                Some(ty)
            }
            _ => {
                self.error_expected("type");
                None
            }
        }
    }

    /// `Name`, `pkg.Name`, optionally followed by type arguments
    fn parse_type_name(&mut self) -> Option<TypeExpr> {
        let start = self.span();
        let (first, _) = self.expect_ident()?;
        let (package, name) = if self.skip(&TokenKind::Dot) {
            let (name, _) = self.expect_ident()?;
            (Some(first), name)
        } else {
            (None, first)
        };

        let mut args = Vec::new();
        if self.at(&TokenKind::LBracket) {
            self.bump();
            while !self.at(&TokenKind::RBracket) {
                args.push(self.parse_type()?);
                if !self.skip(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBracket)?;
        }

        Some(TypeExpr::Name {
            package,
            name,
            args,
            span: self.span_from(start),
        })
    }

    fn parse_array_or_slice(&mut self) -> Option<TypeExpr> {
        let start = self.span();
        self.expect(&TokenKind::LBracket)?;

        if self.skip(&TokenKind::RBracket) {
            let elem = self.parse_type()?;
            return Some(TypeExpr::Slice(Box::new(elem), self.span_from(start)));
        }

        let len = self.parse_array_len()?;
        self.expect(&TokenKind::RBracket)?;
        let elem = self.parse_type()?;
        Some(TypeExpr::Array {
            len,
            elem: Box::new(elem),
            span: self.span_from(start),
        })
    }

    /// Array length: its token text, plus the expression when it is an integer constant
    fn parse_array_len(&mut self) -> Option<ArrayLen> {
        let mut text = String::new();
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::RBracket if depth == 0 => break,
                TokenKind::Eof => {
                    self.error_expected("']'");
                    return None;
                }
                TokenKind::RParen | TokenKind::RBrace if depth == 0 => {
                    self.error_expected("']'");
                    return None;
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            text.push_str(&self.kind().text());
            tokens.push(self.kind().clone());
            self.bump();
        }
        if text.is_empty() {
            self.error_expected("array length");
            return None;
        }
        let expr = parse_const_expr(&tokens);
        Some(ArrayLen { text, expr })
    }

    /// Parameters and optional result
    pub fn parse_signature(&mut self) -> Option<FuncType> {
        let (params, variadic) = self.parse_parameters()?;
        let results = if self.at(&TokenKind::LParen) {
            let (results, variadic) = self.parse_parameters()?;
            if variadic {
                self.error_expected("result type");
                return None;
            }
            results
        } else if self.can_start_type() {
            vec![Param {
                name: None,
                ty: self.parse_type()?,
            }]
        } else {
            Vec::new()
        };

        Some(FuncType {
            params,
            results,
            variadic,
        })
    }

    /// `( [ParameterList [","]] )`
    ///
    /// The variadic parameter carries its element type; the flag is returned
    /// alongside.
    fn parse_parameters(&mut self) -> Option<(Vec<Param>, bool)> {
        self.expect(&TokenKind::LParen)?;
        let mut items = Vec::new();
        let mut variadic = false;

        while !self.at(&TokenKind::RParen) {
            if variadic {
                self.error_expected("')' after variadic parameter");
                return None;
            }
            let (item, dots) = self.parse_param_item()?;
            variadic = dots;
            items.push(item);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        let params = self.group_params(items)?;
        Some((params, variadic))
    }

    fn parse_param_item(&mut self) -> Option<(ParamItem, bool)> {
        if self.at_ident() && self.ident_starts_named_param() {
            let (name, _) = self.expect_ident()?;
            let dots = self.skip(&TokenKind::Ellipsis);
            let ty = self.parse_type()?;
            return Some((ParamItem::Named(name, ty), dots));
        }
        let dots = self.skip(&TokenKind::Ellipsis);
        let ty = self.parse_type()?;
        Some((ParamItem::Bare(ty), dots))
    }

    /// Whether the identifier at the cursor is a parameter name
    fn ident_starts_named_param(&self) -> bool {
        match self.peek_kind(1) {
            TokenKind::Identifier(_)
            | TokenKind::Star
            | TokenKind::LParen
            | TokenKind::Arrow
            | TokenKind::Ellipsis
            | TokenKind::KwMap
            | TokenKind::KwChan
            | TokenKind::KwFunc
            | TokenKind::KwStruct
            | TokenKind::KwInterface => true,
            // `a []T`, `a [4]T` versus the instantiation `List[T]`
            TokenKind::LBracket => match self.matching_close(1) {
                Some(close) => {
                    matches!(self.peek_kind(2), TokenKind::RBracket)
                        || !matches!(
                            self.peek_kind(close + 1),
                            TokenKind::Comma | TokenKind::RParen
                        )
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Resolve `a, b int` grouping
    fn group_params(
        &mut self,
        items: Vec<ParamItem>,
    ) -> Option<Vec<Param>> {
        let named = items.iter().any(|i| matches!(i, ParamItem::Named(..)));
        if !named {
            return Some(
                items
                    .into_iter()
                    .map(|item| match item {
                        ParamItem::Bare(ty) | ParamItem::Named(_, ty) => Param { name: None, ty },
                    })
                    .collect(),
            );
        }

        let mut params = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for item in items {
            match item {
                ParamItem::Bare(ty) => match ty.as_plain_name() {
                    Some(name) => pending.push(name.to_string()),
                    None => {
                        self.error(super::ParseError::MixedParameters { span: ty.span() });
                        return None;
                    }
                },
                ParamItem::Named(name, ty) => {
                    for pending_name in pending.drain(..) {
                        params.push(Param {
                            name: Some(pending_name),
                            ty: ty.clone(),
                        });
                    }
                    params.push(Param {
                        name: Some(name),
                        ty,
                    });
                }
            }
        }
        if !pending.is_empty() {
            let span = self.span();
            self.error(super::ParseError::MixedParameters { span });
            return None;
        }
        Some(params)
    }

    fn parse_struct_type(&mut self) -> Option<TypeExpr> {
        let start = self.span();
        self.expect(&TokenKind::KwStruct)?;
        self.expect(&TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at_end() {
            fields.push(self.parse_field_decl()?);
            if !self.skip(&TokenKind::Semicolon) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(TypeExpr::Struct(fields, self.span_from(start)))
    }

    fn parse_field_decl(&mut self) -> Option<FieldDecl> {
        let start = self.span();
        let (names, ty, embedded) = if self.at_ident() && !self.ident_is_embedded_field() {
            let mut names = vec![self.expect_ident()?.0];
            while self.skip(&TokenKind::Comma) {
                names.push(self.expect_ident()?.0);
            }
            (names, self.parse_type()?, false)
        } else {
            let ty = match self.kind() {
                TokenKind::Star => {
                    self.bump();
                    let base = self.parse_type_name()?;
                    TypeExpr::Pointer(Box::new(base), self.span_from(start))
                }
                _ => self.parse_type_name()?,
            };
            (Vec::new(), ty, true)
        };

        let tag = match self.kind() {
            TokenKind::StringLiteral(value) => {
                let value = value.clone();
                self.bump();
                Some(value)
            }
            _ => None,
        };

        Some(FieldDecl {
            names,
            ty,
            embedded,
            tag,
            span: self.span_from(start),
        })
    }

    /// Whether the identifier at the cursor starts an embedded field
    fn ident_is_embedded_field(&self) -> bool {
        match self.peek_kind(1) {
            TokenKind::Semicolon
            | TokenKind::RBrace
            | TokenKind::Dot
            | TokenKind::StringLiteral(_) => true,
            // `List[T]` embedded versus `a [4]T` field
            TokenKind::LBracket => match self.matching_close(1) {
                Some(close) => {
                    !matches!(self.peek_kind(2), TokenKind::RBracket)
                        && matches!(
                            self.peek_kind(close + 1),
                            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::StringLiteral(_)
                        )
                }
                None => false,
            },
            _ => false,
        }
    }

    fn parse_interface_type(&mut self) -> Option<TypeExpr> {
        let start = self.span();
        self.expect(&TokenKind::KwInterface)?;
        self.expect(&TokenKind::LBrace)?;

        let mut elems = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at_end() {
            elems.push(self.parse_interface_elem()?);
            if !self.skip(&TokenKind::Semicolon) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(TypeExpr::Interface(elems, self.span_from(start)))
    }

    fn parse_interface_elem(&mut self) -> Option<InterfaceElem> {
        let start = self.span();
        if self.at_ident() && matches!(self.peek_kind(1), TokenKind::LParen) {
            let (name, _) = self.expect_ident()?;
            let sig = self.parse_signature()?;
            return Some(InterfaceElem::Method {
                name,
                sig,
                span: self.span_from(start),
            });
        }

        let mut terms = vec![self.parse_type_term()?];
        while self.skip(&TokenKind::Pipe) {
            terms.push(self.parse_type_term()?);
        }

        if terms.len() == 1 && !terms[0].tilde {
            let term = terms.remove(0);
            return Some(InterfaceElem::Embed(term.ty));
        }
        Some(InterfaceElem::Terms(terms, self.span_from(start)))
    }

    fn parse_type_term(&mut self) -> Option<TypeTerm> {
        let tilde = self.skip(&TokenKind::Tilde);
        let ty = self.parse_type()?;
        Some(TypeTerm { tilde, ty })
    }
}
