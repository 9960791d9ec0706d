//! 结构化满足性分析
//!
//! 数据流：导入路径 → [`ImportResolver`] → [`universe::extract`] →
//! [`matcher`] → [`report::build`]。库内不做任何输出，
//! 错误与报告由调用方渲染。

pub mod matcher;
pub mod methodset;
pub mod report;
pub mod universe;

use std::fmt;

use indexmap::IndexMap;
use tracing::info;

use crate::frontend::module::{pattern, ImportResolver, PackageLocator, ResolveError};

pub use matcher::{check, missing_method, satisfies, MissingMethod, Satisfaction};
pub use methodset::MethodSet;
pub use report::{Direction, Report};
pub use universe::{extract, EntryKind, TypeEntry};

/// 一次查询：接口来源、待检查主体、方向
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub interfaces: Vec<String>,
    pub types: Vec<String>,
    pub direction: Direction,
}

impl Query {
    /// 由逗号分隔的包模式构造
    pub fn from_patterns(
        interfaces: &str,
        types: &str,
        direction: Direction,
        locator: &PackageLocator,
    ) -> Self {
        Self {
            interfaces: pattern::expand(interfaces, locator),
            types: pattern::expand(types, locator),
            direction,
        }
    }
}

/// 解析失败的包
#[derive(Debug, Clone, PartialEq)]
pub struct ImportFailure {
    pub path: String,
    pub error: ResolveError,
}

impl fmt::Display for ImportFailure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Couldn't import {}: {}", self.path, self.error)
    }
}

/// 分析结果：报告与按首次出现排序、去重后的失败
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub report: Report,
    pub failures: Vec<ImportFailure>,
    /// 参与判定的接口数
    pub interface_count: usize,
    /// 参与判定的主体数
    pub subject_count: usize,
}

/// 解析一组包并提取条目；失败记入 `failures`，处理继续
pub fn collect(
    resolver: &mut ImportResolver,
    paths: &[String],
    failures: &mut IndexMap<String, ResolveError>,
) -> Vec<TypeEntry> {
    let mut entries = Vec::new();
    for path in paths {
        match resolver.resolve(path) {
            Ok(package) => entries.extend(extract(&package, resolver.types())),
            Err(error) => {
                failures.entry(path.clone()).or_insert(error);
            }
        }
    }
    entries
}

/// 执行查询
pub fn analyze(
    resolver: &mut ImportResolver,
    query: &Query,
) -> Analysis {
    let mut failures = IndexMap::new();
    let universe = collect(resolver, &query.interfaces, &mut failures);
    let subjects = collect(resolver, &query.types, &mut failures);

    let interface_count = universe.iter().filter(|e| e.is_interface()).count();
    let report = report::build(&universe, &subjects, query.direction);
    info!(
        interfaces = interface_count,
        subjects = subjects.len(),
        relations = report.relation_count(),
        failures = failures.len(),
        "analysis finished"
    );
    resolver.log_summary();

    Analysis {
        report,
        failures: failures
            .into_iter()
            .map(|(path, error)| ImportFailure { path, error })
            .collect(),
        interface_count,
        subject_count: subjects.len(),
    }
}

#[cfg(test)]
mod tests;
