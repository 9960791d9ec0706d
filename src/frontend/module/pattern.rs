//! 包模式展开
//!
//! 逗号分隔的模式列表展开为导入路径：
//! - `std`：标准库根目录下的所有包（不含 `cmd/`、`testdata` 以及 `.`/`_` 开头的目录）
//! - `all`：`std` 加上所有工作区根目录中的包
//! - 含 `...` 的模式：对所有已知包做正则匹配，`x/...` 同时匹配 `x`
//! - 其他：原样作为导入路径
//!
//! 结果按首次出现去重，目录遍历按名称排序。

use std::path::Path;

use indexmap::IndexSet;
use regex::Regex;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::constraint::BuildContext;
use super::resolver::PackageLocator;

/// 展开模式列表
pub fn expand(
    patterns: &str,
    locator: &PackageLocator,
) -> Vec<String> {
    let mut out = IndexSet::new();
    let mut known: Option<Vec<String>> = None;

    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match pattern {
            "std" => out.extend(std_packages(locator)),
            "all" => out.extend(all_packages(locator)),
            p if p.contains("...") => {
                let Some(re) = pattern_regex(p) else {
                    warn!(pattern = p, "invalid package pattern");
                    continue;
                };
                let known = known.get_or_insert_with(|| all_packages(locator));
                let before = out.len();
                out.extend(known.iter().filter(|path| re.is_match(path)).cloned());
                if out.len() == before {
                    debug!(pattern = p, "pattern matched no packages");
                }
            }
            p => {
                out.insert(p.to_string());
            }
        }
    }

    out.into_iter().collect()
}

/// 标准库中的所有包
pub fn std_packages(locator: &PackageLocator) -> Vec<String> {
    match locator.std_root() {
        Some(root) => list_packages(root, true, locator.context()),
        None => {
            warn!("no standard library root configured; `std` expands to nothing");
            Vec::new()
        }
    }
}

/// 标准库与工作区中的所有包
pub fn all_packages(locator: &PackageLocator) -> Vec<String> {
    let mut out = std_packages(locator);
    for root in locator.roots() {
        out.extend(list_packages(root, false, locator.context()));
    }
    out
}

/// `...` 匹配任意字符串；结尾的 `/...` 也匹配空
pub fn pattern_regex(pattern: &str) -> Option<Regex> {
    let (body, tail) = match pattern.strip_suffix("/...") {
        Some(body) => (body, "(/.*)?"),
        None => (pattern, ""),
    };
    let body = regex::escape(body).replace(r"\.\.\.", ".*");
    Regex::new(&format!("^{}{}$", body, tail)).ok()
}

/// 遍历根目录，返回含可构建文件的目录对应的导入路径
fn list_packages(
    root: &Path,
    is_std: bool,
    context: &BuildContext,
) -> Vec<String> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry, is_std));

    let mut out = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory");
                continue;
            }
        };
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            continue;
        }
        let has_files = context
            .select_files(entry.path())
            .is_ok_and(|files| !files.is_empty());
        if !has_files {
            continue;
        }
        if let Some(path) = import_path(root, entry.path()) {
            out.push(path);
        }
    }
    out
}

fn is_skipped_dir(
    entry: &DirEntry,
    is_std: bool,
) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || name.starts_with('_')
        || name == "testdata"
        || (is_std && entry.depth() == 1 && name == "cmd")
}

fn import_path(
    root: &Path,
    dir: &Path,
) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}
