//! 分析层端到端测试

mod scenarios;

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::analysis::{analyze, Analysis, Direction, Query};
use crate::frontend::module::{BuildContext, ImportResolver, PackageLocator, ResolverOptions};

/// 临时工作区，包路径 → 源文件
pub(super) struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn file(
        self,
        rel: &str,
        source: &str,
    ) -> Self {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn resolver(&self) -> ImportResolver {
        ImportResolver::new(
            PackageLocator::new(
                None,
                vec![self.root().to_path_buf()],
                BuildContext::default(),
            ),
            ResolverOptions::default(),
        )
    }

    pub fn run(
        &self,
        interfaces: &str,
        types: &str,
        direction: Direction,
    ) -> Analysis {
        let mut resolver = self.resolver();
        let query = Query::from_patterns(interfaces, types, direction, resolver.locator());
        analyze(&mut resolver, &query)
    }
}
