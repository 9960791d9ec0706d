//! 包解析系统
//!
//! 把导入路径解析为带完整类型信息的包描述符。
//!
//! # 模块结构
//!
//! - [`resolver`] - 在源码根目录中定位包
//! - [`constraint`] - 构建约束与文件筛选
//! - [`loader`] - 导入解析器（缓存、索引、源码检查）
//! - [`cache`] - 运行期导入缓存
//! - [`index`] - 导出数据索引
//! - [`pattern`] - 包模式展开
//!
//! # 设计目标
//!
//! 1. 同一导入路径在一次运行中只解析一次，返回同一个 `Arc<Package>`
//! 2. 失败的解析会被记录，不会重试
//! 3. 支持循环导入检测

pub mod cache;
pub mod constraint;
pub mod index;
pub mod loader;
pub mod pattern;
pub mod resolver;

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::frontend::parser::ParseError;
use crate::frontend::typecheck::{BasicKind, Signature, Type};

pub use constraint::BuildContext;
pub use index::IndexTrust;
pub use loader::{ImportResolver, PackageChoice, ResolverOptions};
pub use resolver::{PackageLocation, PackageLocator};

/// 包的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOrigin {
    /// 从源码解析并检查
    Source,
    /// 从导出数据索引加载
    Index,
}

/// 包作用域中的对象
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeObject {
    /// 类型声明或别名
    TypeName { ty: Type, alias: bool },
    /// 函数
    Func(Signature),
    /// 变量，类型未声明时为 `None`
    Var { ty: Option<Type> },
    /// 常量，无类型常量的 `ty` 为 `None`；`value` 仅记录可求值的整数常量
    Const { ty: Option<Type>, value: Option<i64> },
}

/// 包描述符
///
/// 由导入解析器的缓存持有，同一导入路径在一次运行中只有一个实例。
#[derive(Debug, Clone)]
pub struct Package {
    /// 导入路径
    pub path: String,
    /// package 子句中的名称
    pub name: String,
    /// 是否完整（源码检查或完整导出数据）
    pub complete: bool,
    /// 导入的路径（首次出现顺序）
    pub imports: Vec<String>,
    pub origin: PackageOrigin,
    /// 顶层作用域，保持声明顺序
    pub scope: IndexMap<String, ScopeObject>,
}

impl Package {
    /// 查找作用域对象
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&ScopeObject> {
        self.scope.get(name)
    }

    /// 内建的 `unsafe` 包
    pub fn unsafe_package() -> Arc<Package> {
        let mut scope = IndexMap::new();
        scope.insert(
            "Pointer".to_string(),
            ScopeObject::TypeName {
                ty: Type::Basic(BasicKind::UnsafePointer),
                alias: true,
            },
        );
        Arc::new(Package {
            path: "unsafe".to_string(),
            name: "unsafe".to_string(),
            complete: true,
            imports: Vec::new(),
            origin: PackageOrigin::Source,
            scope,
        })
    }
}

/// 包解析错误
///
/// 可克隆，以便缓存重放失败结果。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// 任何根目录下都找不到包
    #[error("cannot find package \"{path}\"{}", searched_suffix(.searched))]
    PackageNotFound {
        path: String,
        searched: Vec<PathBuf>,
    },

    /// 目录存在但没有可构建的源文件
    #[error("no buildable Go source files in {}", .dir.display())]
    NoSourceFiles { path: String, dir: PathBuf },

    /// 读取源文件失败
    #[error("reading {}: {message}", .file.display())]
    Io { file: PathBuf, message: String },

    /// 语法错误
    #[error("{}:{error}", .file.display())]
    Parse { file: PathBuf, error: ParseError },

    /// 同一目录下有多个包，且策略拒绝选择
    #[error("found packages {} in {}", .names.join(", "), .dir.display())]
    AmbiguousPackage { dir: PathBuf, names: Vec<String> },

    /// 循环导入
    #[error("import cycle not allowed: {}", .cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },

    /// 声明引用了无法解析的符号
    #[error("{first}{}", more_errors(.count))]
    TypeResolution {
        path: String,
        first: String,
        count: usize,
    },

    /// 导出数据无法使用
    #[error("export data for {path}: {reason}")]
    Index { path: String, reason: String },
}

fn searched_suffix(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return String::new();
    }
    let dirs: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
    format!(" (searched {})", dirs.join(", "))
}

fn more_errors(count: &usize) -> String {
    match *count {
        0 | 1 => String::new(),
        2 => " (and 1 more error)".to_string(),
        n => format!(" (and {} more errors)", n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ResolveError::PackageNotFound {
            path: "nope".to_string(),
            searched: vec![PathBuf::from("/go/src/nope")],
        };
        assert_eq!(
            err.to_string(),
            "cannot find package \"nope\" (searched /go/src/nope)"
        );
        let err = ResolveError::PackageNotFound {
            path: "nope".to_string(),
            searched: Vec::new(),
        };
        assert_eq!(err.to_string(), "cannot find package \"nope\"");
    }

    #[test]
    fn test_type_resolution_message() {
        let err = ResolveError::TypeResolution {
            path: "p".to_string(),
            first: "a.go:3:6: undefined: Foo".to_string(),
            count: 3,
        };
        assert_eq!(
            err.to_string(),
            "a.go:3:6: undefined: Foo (and 2 more errors)"
        );
    }

    #[test]
    fn test_unsafe_package() {
        let pkg = Package::unsafe_package();
        assert!(matches!(
            pkg.lookup("Pointer"),
            Some(ScopeObject::TypeName { alias: true, .. })
        ));
    }
}
