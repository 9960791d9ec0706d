//! 导入缓存
//!
//! 一次运行中所有解析请求（包括检查依赖时的递归请求）共用的缓存：
//!
//! | 槽位 | 含义 |
//! |------|------|
//! | **InProgress** | 正在解析，用于循环导入检测 |
//! | **Resolved** | 已解析，返回同一个 `Arc<Package>` |
//! | **Failed** | 解析失败，后续请求直接重放该错误 |
//!
//! # 设计思路
//!
//! - 失败只发生一次，不重试
//! - 槽位保持首次请求顺序，写出索引时按此顺序遍历
//! - 单线程使用，不加锁

use std::sync::Arc;

use indexmap::IndexMap;

use super::{Package, PackageOrigin, ResolveError};

/// 缓存槽位
#[derive(Debug, Clone)]
pub enum CacheSlot {
    InProgress,
    Resolved(Arc<Package>),
    Failed(ResolveError),
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 缓存命中次数
    pub hits: usize,
    /// 缓存未命中次数
    pub misses: usize,
    /// 从索引加载的包数
    pub index_loads: usize,
    /// 从源码检查的包数
    pub source_checks: usize,
    /// 失败的包数
    pub failures: usize,
}

impl CacheStats {
    /// 命中率（百分比）
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// 导入缓存
#[derive(Debug, Default)]
pub struct ImportCache {
    slots: IndexMap<String, CacheSlot>,
    stats: CacheStats,
}

impl ImportCache {
    /// 创建新的缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询槽位，同时记录命中或未命中
    pub fn get(
        &mut self,
        path: &str,
    ) -> Option<&CacheSlot> {
        match self.slots.get(path) {
            Some(slot) => {
                self.stats.hits += 1;
                Some(slot)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// 标记为正在解析
    pub fn begin(
        &mut self,
        path: &str,
    ) {
        self.slots.insert(path.to_string(), CacheSlot::InProgress);
    }

    /// 记录解析结果
    pub fn finish(
        &mut self,
        path: &str,
        result: &Result<Arc<Package>, ResolveError>,
    ) {
        let slot = match result {
            Ok(package) => {
                match package.origin {
                    PackageOrigin::Source => self.stats.source_checks += 1,
                    PackageOrigin::Index => self.stats.index_loads += 1,
                }
                CacheSlot::Resolved(Arc::clone(package))
            }
            Err(err) => {
                self.stats.failures += 1;
                CacheSlot::Failed(err.clone())
            }
        };
        self.slots.insert(path.to_string(), slot);
    }

    /// 已解析的包，按首次请求顺序
    pub fn packages(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.slots.values().filter_map(|slot| match slot {
            CacheSlot::Resolved(package) => Some(package),
            _ => None,
        })
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
