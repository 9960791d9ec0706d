//! 包定位器
//!
//! 将导入路径（如 "io"、"example.com/shapes"）解析为源码目录与参与构建的文件。
//!
//! # 搜索顺序
//!
//! 1. 标准库根目录（若已配置）
//! 2. 工作区根目录，按配置顺序
//!
//! 第一个含有可构建文件的目录胜出。`unsafe` 与 `C` 由检查器处理，不在此定位。

use std::path::{Path, PathBuf};

use tracing::debug;

use super::constraint::BuildContext;
use super::ResolveError;

/// 定位结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLocation {
    pub path: String,
    pub dir: PathBuf,
    /// 参与构建的文件，按文件名排序
    pub files: Vec<PathBuf>,
    /// 是否位于标准库根目录
    pub in_std: bool,
}

/// 包定位器
#[derive(Debug, Clone)]
pub struct PackageLocator {
    std_root: Option<PathBuf>,
    roots: Vec<PathBuf>,
    context: BuildContext,
}

impl PackageLocator {
    /// 创建新的定位器
    pub fn new(
        std_root: Option<PathBuf>,
        roots: Vec<PathBuf>,
        context: BuildContext,
    ) -> Self {
        Self {
            std_root,
            roots,
            context,
        }
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn std_root(&self) -> Option<&Path> {
        self.std_root.as_deref()
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// 所有搜索根，标准库在前；第二项表示是否为标准库
    pub fn search_roots(&self) -> impl Iterator<Item = (&Path, bool)> {
        self.std_root
            .iter()
            .map(|root| (root.as_path(), true))
            .chain(self.roots.iter().map(|root| (root.as_path(), false)))
    }

    /// 定位导入路径
    pub fn locate(
        &self,
        path: &str,
    ) -> Result<PackageLocation, ResolveError> {
        if !is_valid_import_path(path) {
            return Err(ResolveError::PackageNotFound {
                path: path.to_string(),
                searched: Vec::new(),
            });
        }

        let mut searched = Vec::new();
        let mut empty_dir = None;

        for (root, in_std) in self.search_roots() {
            let dir = root.join(path);
            searched.push(dir.clone());
            if !dir.is_dir() {
                continue;
            }

            let files = self
                .context
                .select_files(&dir)
                .map_err(|err| ResolveError::Io {
                    file: dir.clone(),
                    message: err.to_string(),
                })?;
            if files.is_empty() {
                empty_dir.get_or_insert(dir);
                continue;
            }

            debug!(path, dir = %dir.display(), files = files.len(), "located package");
            return Ok(PackageLocation {
                path: path.to_string(),
                dir,
                files,
                in_std,
            });
        }

        match empty_dir {
            Some(dir) => Err(ResolveError::NoSourceFiles {
                path: path.to_string(),
                dir,
            }),
            None => Err(ResolveError::PackageNotFound {
                path: path.to_string(),
                searched,
            }),
        }
    }
}

/// 导入路径是否合法：非空、相对、不含 `..` 段或反斜杠
pub fn is_valid_import_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && !path.contains(':')
        && path.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}
