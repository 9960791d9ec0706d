//! Abstract Syntax Tree types
//!
//! Only declarations are represented. Function bodies never reach the
//! tree; initializers only as integer constant expressions.

use crate::frontend::lexer::TokenKind;
use crate::util::span::Span;

/// A parsed `.go` file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Name from the package clause
    pub package: String,
    pub package_span: Span,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

/// `import name "path"`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Explicit local name, including `.` and `_`
    pub name: Option<String>,
    pub path: String,
    pub span: Span,
}

/// Top-level declaration
#[derive(Debug, Clone)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncDecl),
    Value(ValueSpec),
}

/// `type Name[TParams] Type` or `type Name = Type`
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A type parameter; constraints are not evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub span: Span,
}

/// `func (recv) Name[TParams](params) results`
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub sig: FuncType,
    pub span: Span,
}

/// Method receiver
#[derive(Debug, Clone)]
pub struct Receiver {
    pub name: Option<String>,
    pub pointer: bool,
    /// Receiver base type name
    pub base: String,
    /// Type parameter names of a generic receiver, `(l *List[T])`
    pub type_params: Vec<String>,
    pub span: Span,
}

/// Value declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Const,
    Var,
}

/// One `var` or `const` spec
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub kind: ValueKind,
    pub names: Vec<String>,
    pub ty: Option<TypeExpr>,
    /// Whether an initializer follows `=`
    pub has_values: bool,
    /// Initializers as integer constant expressions, `None` where one is not
    pub values: Vec<Option<ConstExpr>>,
    /// Position inside a parenthesized group, for implicit repetition of consts
    pub group_index: Option<usize>,
    pub span: Span,
}

/// Type expression
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// `Name`, `pkg.Name`, `Name[Args]`
    Name {
        package: Option<String>,
        name: String,
        args: Vec<TypeExpr>,
        span: Span,
    },
    Pointer(Box<TypeExpr>, Span),
    Slice(Box<TypeExpr>, Span),
    Array {
        len: ArrayLen,
        elem: Box<TypeExpr>,
        span: Span,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
        span: Span,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
        span: Span,
    },
    Func(FuncType, Span),
    Struct(Vec<FieldDecl>, Span),
    Interface(Vec<InterfaceElem>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name { span, .. }
            | TypeExpr::Pointer(_, span)
            | TypeExpr::Slice(_, span)
            | TypeExpr::Array { span, .. }
            | TypeExpr::Map { span, .. }
            | TypeExpr::Chan { span, .. }
            | TypeExpr::Func(_, span)
            | TypeExpr::Struct(_, span)
            | TypeExpr::Interface(_, span) => *span,
        }
    }

    /// Simple unqualified name without type arguments
    pub fn as_plain_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Name {
                package: None,
                name,
                args,
                ..
            } if args.is_empty() => Some(name),
            _ => None,
        }
    }
}

/// Channel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Function signature
#[derive(Debug, Clone, Default)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// Last parameter is `...T`
    pub variadic: bool,
}

/// A single parameter; grouped names are expanded by the parser
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeExpr,
}

/// Struct field declaration
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Empty for embedded fields
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub embedded: bool,
    pub tag: Option<String>,
    pub span: Span,
}

/// Interface element
#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method {
        name: String,
        sig: FuncType,
        span: Span,
    },
    /// Embedded interface (or single non-tilde type term)
    Embed(TypeExpr),
    /// Union / tilde type terms, only valid in constraints
    Terms(Vec<TypeTerm>, Span),
}

/// `~T` or `T` inside a union
#[derive(Debug, Clone)]
pub struct TypeTerm {
    pub tilde: bool,
    pub ty: TypeExpr,
}

/// Array length: source text plus the expression when it is an integer
/// constant expression. `[...]T` has text `...` and no expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLen {
    pub text: String,
    pub expr: Option<ConstExpr>,
}

/// Integer constant expression
#[derive(Debug, Clone, PartialEq)]
pub enum ConstExpr {
    Int(i128),
    Iota,
    /// `Name` or `pkg.Name`
    Name {
        package: Option<String>,
        name: String,
    },
    /// `T(x)` where `T` may be a type name
    Conversion {
        ty: String,
        arg: Box<ConstExpr>,
    },
    Unary(UnaryOp, Box<ConstExpr>),
    Binary(BinaryOp, Box<ConstExpr>, Box<ConstExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    /// Binary operator for a token, with its Go precedence
    pub fn from_token(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
        let op = match kind {
            TokenKind::Star => (BinaryOp::Mul, 5),
            TokenKind::Pipe => (BinaryOp::Or, 4),
            TokenKind::Operator(op) => match op.as_str() {
                "+" => (BinaryOp::Add, 4),
                "-" => (BinaryOp::Sub, 4),
                "^" => (BinaryOp::Xor, 4),
                "/" => (BinaryOp::Div, 5),
                "%" => (BinaryOp::Rem, 5),
                "<<" => (BinaryOp::Shl, 5),
                ">>" => (BinaryOp::Shr, 5),
                "&" => (BinaryOp::And, 5),
                "&^" => (BinaryOp::AndNot, 5),
                _ => return None,
            },
            _ => return None,
        };
        Some(op)
    }
}
