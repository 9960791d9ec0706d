//! 错误收集和报告
//!
//! 定义声明级类型检查过程中的所有错误类型

use std::fmt;

use crate::util::span::Span;
use thiserror::Error;

/// 类型错误
///
/// 消息格式沿用 Go 编译器的写法
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    /// 未定义的标识符
    #[error("{span}: undefined: {name}")]
    Undefined { name: String, span: Span },

    /// 引用了其他包的未导出名称
    #[error("{span}: name {name} not exported by package {package}")]
    Unexported {
        package: String,
        name: String,
        span: Span,
    },

    /// 标识符不是类型
    #[error("{span}: {name} is not a type")]
    NotAType { name: String, span: Span },

    /// 重复声明
    #[error("{span}: {name} redeclared in this block")]
    Redeclared { name: String, span: Span },

    /// 非法递归类型
    #[error("{span}: invalid recursive type {name}")]
    RecursiveType { name: String, span: Span },

    /// 泛型类型未实例化
    #[error("{span}: cannot use generic type {name} without instantiation")]
    GenericWithoutInstantiation { name: String, span: Span },

    /// 对非泛型类型给出了类型实参
    #[error("{span}: {name} is not a generic type")]
    NotGeneric { name: String, span: Span },

    /// 非法接收者
    #[error("{span}: invalid receiver type {name} ({reason})")]
    InvalidReceiver {
        name: String,
        reason: String,
        span: Span,
    },

    /// 方法重复声明
    #[error("{span}: method {type_name}.{method} already declared")]
    DuplicateMethod {
        type_name: String,
        method: String,
        span: Span,
    },

    /// 字段与方法同名
    #[error("{span}: field and method with the same name {name}")]
    FieldMethodConflict { name: String, span: Span },

    /// 接口中同名方法签名冲突
    #[error("{span}: duplicate method {method}")]
    DuplicateInterfaceMethod { method: String, span: Span },

    /// 导入失败
    #[error("{span}: could not import {path} ({reason})")]
    ImportFailed {
        path: String,
        reason: String,
        span: Span,
    },
}

impl TypeError {
    /// 获取错误的位置
    pub fn span(&self) -> Span {
        match self {
            TypeError::Undefined { span, .. }
            | TypeError::Unexported { span, .. }
            | TypeError::NotAType { span, .. }
            | TypeError::Redeclared { span, .. }
            | TypeError::RecursiveType { span, .. }
            | TypeError::GenericWithoutInstantiation { span, .. }
            | TypeError::NotGeneric { span, .. }
            | TypeError::InvalidReceiver { span, .. }
            | TypeError::DuplicateMethod { span, .. }
            | TypeError::FieldMethodConflict { span, .. }
            | TypeError::DuplicateInterfaceMethod { span, .. }
            | TypeError::ImportFailed { span, .. } => *span,
        }
    }

    /// 创建未定义标识符错误
    pub fn undefined(
        name: impl Into<String>,
        span: Span,
    ) -> Self {
        TypeError::Undefined {
            name: name.into(),
            span,
        }
    }
}

/// 带文件名的诊断
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDiagnostic {
    pub file: String,
    pub error: TypeError,
}

impl fmt::Display for TypeDiagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.error)
    }
}

impl std::error::Error for TypeDiagnostic {}

/// 错误收集器
///
/// 收集多个类型错误，检查结束后批量报告
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<TypeDiagnostic>,
}

impl ErrorCollector {
    /// 创建新的错误收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加错误
    pub fn add_error(
        &mut self,
        file: &str,
        error: TypeError,
    ) {
        self.errors.push(TypeDiagnostic {
            file: file.to_string(),
            error,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<TypeDiagnostic> {
        self.errors
    }
}
