//! 导入解析器
//!
//! 把导入路径解析为完整类型化的包，管理运行期缓存，并检测循环导入。
//!
//! 解析顺序：
//! 0. 缓存命中（包括重放失败）
//! 1. 导出数据索引（信任策略允许且数据完整时）
//! 2. 源码：定位 → 筛选文件 → 解析 → 按包名分组选择 → 类型检查

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cache::{CacheSlot, CacheStats, ImportCache};
use super::constraint::BuildContext;
use super::index::{export_package, load_package, IndexError, IndexStore, IndexTrust};
use super::resolver::{PackageLocation, PackageLocator};
use super::{Package, PackageOrigin, ResolveError};
use crate::frontend::parser::parse_file;
use crate::frontend::typecheck::{check_package, Importer, ParsedFile, TypeTable};

/// 同一目录中出现多个包名时的选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageChoice {
    /// 唯一的包，否则第一个不叫 `main` 的包
    #[default]
    PreferNonMain,
    /// 第一个包
    First,
    /// 必须只有一个包
    Unique,
}

impl FromStr for PackageChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefer-non-main" => Ok(PackageChoice::PreferNonMain),
            "first" => Ok(PackageChoice::First),
            "unique" => Ok(PackageChoice::Unique),
            other => Err(format!(
                "unknown package choice '{}' (expected prefer-non-main, first or unique)",
                other
            )),
        }
    }
}

impl fmt::Display for PackageChoice {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            PackageChoice::PreferNonMain => "prefer-non-main",
            PackageChoice::First => "first",
            PackageChoice::Unique => "unique",
        };
        write!(f, "{}", name)
    }
}

/// 解析器选项
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    pub index_dir: Option<PathBuf>,
    pub index_trust: IndexTrust,
    pub package_choice: PackageChoice,
}

/// 导入解析器
///
/// 持有缓存与全局类型表；检查依赖时通过 [`Importer`] 递归调用自身。
#[derive(Debug)]
pub struct ImportResolver {
    locator: PackageLocator,
    cache: ImportCache,
    table: TypeTable,
    index: Option<IndexStore>,
    trust: IndexTrust,
    choice: PackageChoice,
    /// 当前解析栈（用于报告循环路径）
    load_stack: Vec<String>,
}

impl ImportResolver {
    /// 创建新的解析器
    pub fn new(
        locator: PackageLocator,
        options: ResolverOptions,
    ) -> Self {
        Self {
            locator,
            cache: ImportCache::new(),
            table: TypeTable::new(),
            index: options.index_dir.map(IndexStore::new),
            trust: options.index_trust,
            choice: options.package_choice,
            load_stack: Vec::new(),
        }
    }

    /// 解析导入路径
    ///
    /// 同一路径在一次运行中只解析一次；失败同样被缓存。
    pub fn resolve(
        &mut self,
        path: &str,
    ) -> Result<Arc<Package>, ResolveError> {
        match self.cache.get(path) {
            Some(CacheSlot::Resolved(package)) => {
                debug!(path, "cache hit");
                return Ok(Arc::clone(package));
            }
            Some(CacheSlot::Failed(err)) => {
                debug!(path, "cache hit (failed)");
                return Err(err.clone());
            }
            Some(CacheSlot::InProgress) => {
                return Err(ResolveError::ImportCycle {
                    cycle: self.format_cycle(path),
                });
            }
            None => debug!(path, "cache miss"),
        }

        self.cache.begin(path);
        self.load_stack.push(path.to_string());

        let result = self.resolve_uncached(path).map(Arc::new);

        self.load_stack.pop();
        self.cache.finish(path, &result);
        result
    }

    /// 全局类型表
    pub fn types(&self) -> &TypeTable {
        &self.table
    }

    pub fn locator(&self) -> &PackageLocator {
        &self.locator
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    /// 记录运行摘要
    pub fn log_summary(&self) {
        let stats = self.stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            index_loads = stats.index_loads,
            source_checks = stats.source_checks,
            failures = stats.failures,
            "import resolution finished"
        );
    }

    /// 为本次运行中从源码解析的每个包写出导出数据
    ///
    /// 未配置索引目录时不写任何文件。返回写出的文件。
    pub fn write_index(&self) -> Result<Vec<PathBuf>, IndexError> {
        let Some(store) = &self.index else {
            return Ok(Vec::new());
        };
        let mut written = Vec::new();
        for package in self.cache.packages() {
            if package.origin != PackageOrigin::Source || package.path == "unsafe" {
                continue;
            }
            let export = export_package(package, &self.table);
            written.push(store.write(&export)?);
        }
        info!(count = written.len(), dir = %store.dir().display(), "wrote export data");
        Ok(written)
    }

    /// 格式化循环路径，从首次出现 `path` 的位置开始
    fn format_cycle(
        &self,
        path: &str,
    ) -> Vec<String> {
        let start = self
            .load_stack
            .iter()
            .position(|p| p == path)
            .unwrap_or(0);
        let mut cycle = self.load_stack[start..].to_vec();
        cycle.push(path.to_string());
        cycle
    }

    fn resolve_uncached(
        &mut self,
        path: &str,
    ) -> Result<Package, ResolveError> {
        let location = self.locator.locate(path);

        match self.load_from_index(path, location.as_ref().ok()) {
            Ok(Some(package)) => return Ok(package),
            Ok(None) => {}
            Err(err) => {
                if location.is_err() {
                    return Err(ResolveError::Index {
                        path: path.to_string(),
                        reason: err.to_string(),
                    });
                }
                warn!(path, error = %err, "unusable export data, checking source");
            }
        }

        let location = location?;
        self.check_source(&location)
    }

    /// 信任策略是否允许对该包使用索引
    fn trusts_index(
        &self,
        store: &IndexStore,
        path: &str,
        location: Option<&PackageLocation>,
    ) -> bool {
        let in_std_or_nowhere = location.map_or(true, |loc| loc.in_std);
        match self.trust {
            IndexTrust::Never => false,
            IndexTrust::Std => in_std_or_nowhere,
            IndexTrust::Fresh => {
                in_std_or_nowhere
                    || location.is_some_and(|loc| index_is_fresh(store.modified(path), &loc.files))
            }
        }
    }

    fn load_from_index(
        &mut self,
        path: &str,
        location: Option<&PackageLocation>,
    ) -> Result<Option<Package>, IndexError> {
        let Some(store) = self.index.clone() else {
            return Ok(None);
        };
        if !self.trusts_index(&store, path, location) {
            return Ok(None);
        }
        let Some(export) = store.read(path)? else {
            return Ok(None);
        };
        let package = load_package(self, &export)?;
        debug!(path, "loaded from export data");
        Ok(Some(package))
    }

    fn check_source(
        &mut self,
        location: &PackageLocation,
    ) -> Result<Package, ResolveError> {
        let cgo = self.locator.context().cgo;
        let mut parsed = Vec::with_capacity(location.files.len());

        for file in &location.files {
            let source = fs::read_to_string(file).map_err(|err| ResolveError::Io {
                file: file.clone(),
                message: err.to_string(),
            })?;
            let ast = parse_file(&source).map_err(|error| ResolveError::Parse {
                file: file.clone(),
                error,
            })?;
            // 未启用 cgo 时忽略导入 "C" 的文件
            if !cgo && ast.imports.iter().any(|imp| imp.path == "C") {
                debug!(file = %file.display(), "skipping cgo file");
                continue;
            }
            parsed.push(ParsedFile {
                name: file_name(file),
                ast,
            });
        }

        let files = choose_package(&location.dir, &location.path, parsed, self.choice)?;
        debug!(path = %location.path, files = files.len(), "checking source");

        check_package(self, &location.path, &files).map_err(|errors| {
            ResolveError::TypeResolution {
                path: location.path.clone(),
                first: errors
                    .first()
                    .map(|e| e.to_string())
                    .unwrap_or_default(),
                count: errors.len(),
            }
        })
    }
}

impl Importer for ImportResolver {
    fn import(
        &mut self,
        path: &str,
    ) -> Result<Arc<Package>, ResolveError> {
        self.resolve(path)
    }

    fn table(&mut self) -> &mut TypeTable {
        &mut self.table
    }
}

/// 索引文件比所有源文件都新
fn index_is_fresh(
    index_time: Option<SystemTime>,
    files: &[PathBuf],
) -> bool {
    let Some(index_time) = index_time else {
        return false;
    };
    files.iter().all(|file| {
        fs::metadata(file)
            .and_then(|meta| meta.modified())
            .is_ok_and(|modified| modified < index_time)
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 按包名分组并按策略选择
///
/// 分组顺序为排序后文件中的首次出现顺序；`documentation` 组被丢弃。
pub fn choose_package(
    dir: &Path,
    path: &str,
    files: Vec<ParsedFile>,
    choice: PackageChoice,
) -> Result<Vec<ParsedFile>, ResolveError> {
    let mut groups: IndexMap<String, Vec<ParsedFile>> = IndexMap::new();
    for file in files {
        groups
            .entry(file.ast.package.clone())
            .or_default()
            .push(file);
    }
    groups.shift_remove("documentation");

    let no_files = || ResolveError::NoSourceFiles {
        path: path.to_string(),
        dir: dir.to_path_buf(),
    };

    let index = match choice {
        PackageChoice::First => 0,
        PackageChoice::PreferNonMain => {
            if groups.len() == 1 {
                0
            } else {
                groups.keys().position(|name| name != "main").unwrap_or(0)
            }
        }
        PackageChoice::Unique if groups.len() > 1 => {
            return Err(ResolveError::AmbiguousPackage {
                dir: dir.to_path_buf(),
                names: groups.keys().cloned().collect(),
            });
        }
        PackageChoice::Unique => 0,
    };

    groups
        .swap_remove_index(index)
        .map(|(_, files)| files)
        .ok_or_else(no_files)
}

/// 由构建上下文与根目录直接创建解析器
pub fn resolver_for(
    std_root: Option<PathBuf>,
    roots: Vec<PathBuf>,
    context: BuildContext,
    options: ResolverOptions,
) -> ImportResolver {
    ImportResolver::new(PackageLocator::new(std_root, roots, context), options)
}
