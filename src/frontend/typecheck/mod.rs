//! 类型检查器模块
//!
//! 声明级的 Go 类型检查：
//! - 全局类型表，保证命名类型的同一性
//! - 包作用域与文件作用域的名称解析
//! - 接收者方法与接口展平
//! - 完整的错误收集

use std::sync::Arc;

use crate::frontend::module::{Package, ResolveError};

// 导入检查模块
pub mod check;

// 导入错误处理
pub mod errors;

// 导入类型表示
pub mod types;

// 导入测试模块
#[cfg(test)]
mod tests;

pub use check::{check_package, ParsedFile};
pub use errors::*;
pub use types::*;

/// 导入能力
///
/// 检查器通过它递归解析依赖包。实现者必须保证同一路径
/// 总是返回同一个 `Arc<Package>`，并且所有包共用同一个类型表。
pub trait Importer {
    /// 解析导入路径
    fn import(
        &mut self,
        path: &str,
    ) -> Result<Arc<Package>, ResolveError>;

    /// 全局类型表
    fn table(&mut self) -> &mut TypeTable;
}
