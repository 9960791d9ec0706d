//! 类型检查器测试模块

mod check;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::frontend::module::{Package, ResolveError, ScopeObject};
use crate::frontend::parser::parse_file;
use crate::frontend::typecheck::{
    check_package, Importer, NamedTypeId, ParsedFile, Type, TypeDiagnostic, TypeTable,
};

/// 内存中的导入器：路径 → 源文件
#[derive(Default)]
pub(super) struct MapImporter {
    sources: HashMap<String, Vec<(String, String)>>,
    packages: HashMap<String, Arc<Package>>,
    loading: HashSet<String>,
    table: TypeTable,
}

impl MapImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个源文件
    pub fn file(
        mut self,
        path: &str,
        name: &str,
        source: &str,
    ) -> Self {
        self.sources
            .entry(path.to_string())
            .or_default()
            .push((name.to_string(), source.to_string()));
        self
    }

    /// 单文件包
    pub fn package(
        self,
        path: &str,
        source: &str,
    ) -> Self {
        self.file(path, "x.go", source)
    }

    /// 直接检查，返回诊断
    pub fn check(
        &mut self,
        path: &str,
    ) -> Result<Package, Vec<TypeDiagnostic>> {
        let files = self.parsed(path);
        check_package(self, path, &files)
    }

    fn parsed(
        &self,
        path: &str,
    ) -> Vec<ParsedFile> {
        self.sources
            .get(path)
            .map(|files| {
                files
                    .iter()
                    .map(|(name, source)| ParsedFile {
                        name: name.clone(),
                        ast: parse_file(source).unwrap(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn table_ref(&self) -> &TypeTable {
        &self.table
    }
}

impl Importer for MapImporter {
    fn import(
        &mut self,
        path: &str,
    ) -> Result<Arc<Package>, ResolveError> {
        if let Some(package) = self.packages.get(path) {
            return Ok(package.clone());
        }
        if !self.sources.contains_key(path) {
            return Err(ResolveError::PackageNotFound {
                path: path.to_string(),
                searched: vec![PathBuf::from(path)],
            });
        }
        if !self.loading.insert(path.to_string()) {
            return Err(ResolveError::ImportCycle {
                cycle: vec![path.to_string(), path.to_string()],
            });
        }
        let files = self.parsed(path);
        let result = check_package(self, path, &files);
        self.loading.remove(path);
        let package = Arc::new(result.map_err(|errors| ResolveError::TypeResolution {
            path: path.to_string(),
            first: errors[0].to_string(),
            count: errors.len(),
        })?);
        self.packages.insert(path.to_string(), package.clone());
        Ok(package)
    }

    fn table(&mut self) -> &mut TypeTable {
        &mut self.table
    }
}

/// 作用域中类型名对应的 id
pub(super) fn type_id(
    package: &Package,
    name: &str,
) -> NamedTypeId {
    match package.lookup(name) {
        Some(ScopeObject::TypeName { ty: Type::Named(id), .. }) => *id,
        other => panic!("{} is not a named type: {:?}", name, other),
    }
}

/// 检查失败时的第一条错误消息
pub(super) fn first_error(result: Result<Package, Vec<TypeDiagnostic>>) -> String {
    match result {
        Ok(_) => panic!("expected type errors"),
        Err(errors) => errors[0].to_string(),
    }
}
