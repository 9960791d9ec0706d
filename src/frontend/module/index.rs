//! 导出数据索引
//!
//! 已检查包的声明以 JSON 保存在 `<index_dir>/<import path>.json`，
//! 作为解析的快速路径。命名类型引用写成 `(包路径, 名称)`，预声明类型的包路径为空串。
//!
//! 加载顺序：先通过同一个 [`Importer`] 解析导入，再声明本包的全部命名类型，
//! 最后填充底层类型与方法。

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{Package, PackageOrigin, ScopeObject};
use crate::frontend::typecheck::{
    ArrayLength, BasicKind, ChanDir, Field, Importer, InterfaceType, Method, MethodDecl, MethodKey,
    NamedTypeId, Signature, Type, TypeTable,
};

/// 索引信任策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexTrust {
    /// 从不使用索引
    Never,
    /// 标准库中的包，或任何根目录下都找不到的包
    #[default]
    Std,
    /// 同 `Std`，另加索引文件比所有源文件都新的包
    Fresh,
}

impl FromStr for IndexTrust {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(IndexTrust::Never),
            "std" => Ok(IndexTrust::Std),
            "fresh" => Ok(IndexTrust::Fresh),
            other => Err(format!(
                "unknown index trust '{}' (expected never, std or fresh)",
                other
            )),
        }
    }
}

impl fmt::Display for IndexTrust {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            IndexTrust::Never => "never",
            IndexTrust::Std => "std",
            IndexTrust::Fresh => "fresh",
        };
        write!(f, "{}", name)
    }
}

/// 索引错误
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("export data is incomplete")]
    Incomplete,

    #[error("export data describes {found}, expected {expected}")]
    PathMismatch { expected: String, found: String },

    #[error("could not import {path}: {reason}")]
    Import { path: String, reason: String },

    #[error("unknown type {package}.{name}")]
    UnknownType { package: String, name: String },
}

/// 导出的包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPackage {
    pub path: String,
    pub name: String,
    pub complete: bool,
    pub imports: Vec<String>,
    pub objects: Vec<ExportObject>,
}

/// 导出的作用域对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportObject {
    Type {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_params: Vec<String>,
        underlying: ExportType,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        methods: Vec<ExportMethod>,
    },
    Alias {
        name: String,
        target: ExportType,
    },
    Func {
        name: String,
        sig: ExportSignature,
    },
    Var {
        name: String,
        ty: Option<ExportType>,
    },
    Const {
        name: String,
        ty: Option<ExportType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<i64>,
    },
}

/// 命名类型上声明的方法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMethod {
    pub key: MethodKey,
    pub sig: ExportSignature,
    pub pointer_receiver: bool,
}

/// 接口方法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportInterfaceMethod {
    pub key: MethodKey,
    pub sig: ExportSignature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSignature {
    pub params: Vec<ExportType>,
    pub results: Vec<ExportType>,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkg: Option<String>,
    pub ty: ExportType,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// 导出的类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportType {
    Basic {
        name: BasicKind,
    },
    Named {
        package: String,
        name: String,
    },
    Instance {
        package: String,
        name: String,
        args: Vec<ExportType>,
    },
    TypeParam {
        name: String,
    },
    Pointer {
        elem: Box<ExportType>,
    },
    Slice {
        elem: Box<ExportType>,
    },
    Array {
        len: ArrayLength,
        elem: Box<ExportType>,
    },
    Map {
        key: Box<ExportType>,
        value: Box<ExportType>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<ExportType>,
    },
    Func {
        sig: ExportSignature,
    },
    Struct {
        fields: Vec<ExportField>,
    },
    Interface {
        methods: Vec<ExportInterfaceMethod>,
        #[serde(default)]
        constraint: bool,
    },
    Opaque {
        name: String,
    },
    Invalid,
}

// ============ 导出 ============

/// 把已检查的包转换为导出数据
pub fn export_package(
    package: &Package,
    table: &TypeTable,
) -> ExportPackage {
    let objects = package
        .scope
        .iter()
        .map(|(name, object)| export_object(name, object, package, table))
        .collect();

    ExportPackage {
        path: package.path.clone(),
        name: package.name.clone(),
        complete: package.complete,
        imports: package.imports.clone(),
        objects,
    }
}

fn export_object(
    name: &str,
    object: &ScopeObject,
    package: &Package,
    table: &TypeTable,
) -> ExportObject {
    match object {
        ScopeObject::TypeName { ty, alias } => {
            // 非别名的类型名一定是本包声明的命名类型
            match ty {
                Type::Named(id)
                    if !alias
                        && table.get(*id).package == package.path
                        && table.get(*id).name == name =>
                {
                    let named = table.get(*id);
                    ExportObject::Type {
                        name: name.to_string(),
                        type_params: named.type_params.clone(),
                        underlying: export_type(&named.underlying, table),
                        methods: named
                            .methods
                            .iter()
                            .map(|m| ExportMethod {
                                key: m.key.clone(),
                                sig: export_sig(&m.sig, table),
                                pointer_receiver: m.pointer_receiver,
                            })
                            .collect(),
                    }
                }
                _ => ExportObject::Alias {
                    name: name.to_string(),
                    target: export_type(ty, table),
                },
            }
        }
        ScopeObject::Func(sig) => ExportObject::Func {
            name: name.to_string(),
            sig: export_sig(sig, table),
        },
        ScopeObject::Var { ty } => ExportObject::Var {
            name: name.to_string(),
            ty: ty.as_ref().map(|t| export_type(t, table)),
        },
        ScopeObject::Const { ty, value } => ExportObject::Const {
            name: name.to_string(),
            ty: ty.as_ref().map(|t| export_type(t, table)),
            value: *value,
        },
    }
}

fn export_sig(
    sig: &Signature,
    table: &TypeTable,
) -> ExportSignature {
    ExportSignature {
        params: sig.params.iter().map(|t| export_type(t, table)).collect(),
        results: sig.results.iter().map(|t| export_type(t, table)).collect(),
        variadic: sig.variadic,
    }
}

/// 导出单个类型
pub fn export_type(
    ty: &Type,
    table: &TypeTable,
) -> ExportType {
    let boxed = |t: &Type| Box::new(export_type(t, table));
    match ty {
        Type::Basic(kind) => ExportType::Basic { name: *kind },
        Type::Named(id) => {
            let named = table.get(*id);
            ExportType::Named {
                package: named.package.clone(),
                name: named.name.clone(),
            }
        }
        Type::Instance { base, args } => {
            let named = table.get(*base);
            ExportType::Instance {
                package: named.package.clone(),
                name: named.name.clone(),
                args: args.iter().map(|t| export_type(t, table)).collect(),
            }
        }
        Type::TypeParam(name) => ExportType::TypeParam { name: name.clone() },
        Type::Pointer(elem) => ExportType::Pointer { elem: boxed(elem) },
        Type::Slice(elem) => ExportType::Slice { elem: boxed(elem) },
        Type::Array { len, elem } => ExportType::Array {
            len: len.clone(),
            elem: boxed(elem),
        },
        Type::Map { key, value } => ExportType::Map {
            key: boxed(key),
            value: boxed(value),
        },
        Type::Chan { dir, elem } => ExportType::Chan {
            dir: *dir,
            elem: boxed(elem),
        },
        Type::Func(sig) => ExportType::Func {
            sig: export_sig(sig, table),
        },
        Type::Struct(fields) => ExportType::Struct {
            fields: fields
                .iter()
                .map(|f| ExportField {
                    name: f.name.clone(),
                    pkg: f.pkg.clone(),
                    ty: export_type(&f.ty, table),
                    embedded: f.embedded,
                    tag: f.tag.clone(),
                })
                .collect(),
        },
        Type::Interface(iface) => ExportType::Interface {
            methods: iface
                .methods
                .iter()
                .map(|m| ExportInterfaceMethod {
                    key: m.key.clone(),
                    sig: export_sig(&m.sig, table),
                })
                .collect(),
            constraint: iface.constraint,
        },
        Type::Opaque(name) => ExportType::Opaque { name: name.clone() },
        Type::Invalid => ExportType::Invalid,
    }
}

// ============ 加载 ============

/// 从导出数据重建包
///
/// 本包的命名类型在类型表中分配新的 id；依赖包通过 `importer` 解析，
/// 因此同一依赖的命名类型与源码路径解析出的完全相同。
pub fn load_package(
    importer: &mut dyn Importer,
    export: &ExportPackage,
) -> Result<Package, IndexError> {
    if !export.complete {
        return Err(IndexError::Incomplete);
    }

    let mut loader = PackageLoader {
        importer,
        path: &export.path,
        locals: HashMap::new(),
        packages: HashMap::new(),
    };

    for import in &export.imports {
        loader.dependency(import)?;
    }

    let mut declared = Vec::new();
    for object in &export.objects {
        if let ExportObject::Type {
            name, type_params, ..
        } = object
        {
            let id = loader
                .importer
                .table()
                .alloc(&export.path, name, type_params.clone());
            loader.locals.insert(name.clone(), id);
            declared.push(id);
        }
    }

    let mut declared = declared.into_iter();
    let mut scope = IndexMap::new();
    for object in &export.objects {
        let (name, scope_object) = match object {
            ExportObject::Type {
                name,
                underlying,
                methods,
                ..
            } => {
                let id = declared.next().ok_or_else(|| IndexError::UnknownType {
                    package: export.path.clone(),
                    name: name.clone(),
                })?;
                let underlying = loader.ty(underlying)?;
                let mut decls = Vec::with_capacity(methods.len());
                for method in methods {
                    decls.push(MethodDecl {
                        key: method.key.clone(),
                        sig: loader.sig(&method.sig)?,
                        pointer_receiver: method.pointer_receiver,
                    });
                }
                let named = loader.importer.table().get_mut(id);
                named.underlying = underlying;
                named.methods = decls;
                (
                    name,
                    ScopeObject::TypeName {
                        ty: Type::Named(id),
                        alias: false,
                    },
                )
            }
            ExportObject::Alias { name, target } => (
                name,
                ScopeObject::TypeName {
                    ty: loader.ty(target)?,
                    alias: true,
                },
            ),
            ExportObject::Func { name, sig } => (name, ScopeObject::Func(loader.sig(sig)?)),
            ExportObject::Var { name, ty } => (
                name,
                ScopeObject::Var {
                    ty: ty.as_ref().map(|t| loader.ty(t)).transpose()?,
                },
            ),
            ExportObject::Const { name, ty, value } => (
                name,
                ScopeObject::Const {
                    ty: ty.as_ref().map(|t| loader.ty(t)).transpose()?,
                    value: *value,
                },
            ),
        };
        scope.insert(name.clone(), scope_object);
    }

    Ok(Package {
        path: export.path.clone(),
        name: export.name.clone(),
        complete: true,
        imports: export.imports.clone(),
        origin: PackageOrigin::Index,
        scope,
    })
}

struct PackageLoader<'a> {
    importer: &'a mut dyn Importer,
    path: &'a str,
    locals: HashMap<String, NamedTypeId>,
    packages: HashMap<String, Arc<Package>>,
}

impl PackageLoader<'_> {
    fn dependency(
        &mut self,
        path: &str,
    ) -> Result<Arc<Package>, IndexError> {
        if let Some(package) = self.packages.get(path) {
            return Ok(Arc::clone(package));
        }
        let package = self
            .importer
            .import(path)
            .map_err(|err| IndexError::Import {
                path: path.to_string(),
                reason: err.to_string(),
            })?;
        self.packages.insert(path.to_string(), Arc::clone(&package));
        Ok(package)
    }

    fn named(
        &mut self,
        package: &str,
        name: &str,
    ) -> Result<NamedTypeId, IndexError> {
        let unknown = || IndexError::UnknownType {
            package: package.to_string(),
            name: name.to_string(),
        };
        if package.is_empty() {
            return TypeTable::universe(name).ok_or_else(unknown);
        }
        if package == self.path {
            return self.locals.get(name).copied().ok_or_else(unknown);
        }
        // 间接引用的包也可能出现，例如底层类型来自依赖的依赖
        let dependency = self.dependency(package)?;
        match dependency.lookup(name) {
            Some(ScopeObject::TypeName { ty, .. }) => ty.named_id().ok_or_else(unknown),
            _ => Err(unknown()),
        }
    }

    fn ty(
        &mut self,
        ty: &ExportType,
    ) -> Result<Type, IndexError> {
        let ty = match ty {
            ExportType::Basic { name } => Type::Basic(*name),
            ExportType::Named { package, name } => Type::Named(self.named(package, name)?),
            ExportType::Instance {
                package,
                name,
                args,
            } => Type::Instance {
                base: self.named(package, name)?,
                args: self.types(args)?,
            },
            ExportType::TypeParam { name } => Type::TypeParam(name.clone()),
            ExportType::Pointer { elem } => Type::Pointer(Box::new(self.ty(elem)?)),
            ExportType::Slice { elem } => Type::Slice(Box::new(self.ty(elem)?)),
            ExportType::Array { len, elem } => Type::Array {
                len: len.clone(),
                elem: Box::new(self.ty(elem)?),
            },
            ExportType::Map { key, value } => Type::Map {
                key: Box::new(self.ty(key)?),
                value: Box::new(self.ty(value)?),
            },
            ExportType::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: Box::new(self.ty(elem)?),
            },
            ExportType::Func { sig } => Type::Func(self.sig(sig)?),
            ExportType::Struct { fields } => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    out.push(Field {
                        name: field.name.clone(),
                        pkg: field.pkg.clone(),
                        ty: self.ty(&field.ty)?,
                        embedded: field.embedded,
                        tag: field.tag.clone(),
                    });
                }
                Type::Struct(out)
            }
            ExportType::Interface {
                methods,
                constraint,
            } => {
                let mut out = Vec::with_capacity(methods.len());
                for method in methods {
                    out.push(Method {
                        key: method.key.clone(),
                        sig: self.sig(&method.sig)?,
                    });
                }
                Type::Interface(InterfaceType::new(out, *constraint))
            }
            ExportType::Opaque { name } => Type::Opaque(name.clone()),
            ExportType::Invalid => Type::Invalid,
        };
        Ok(ty)
    }

    fn types(
        &mut self,
        types: &[ExportType],
    ) -> Result<Vec<Type>, IndexError> {
        types.iter().map(|t| self.ty(t)).collect()
    }

    fn sig(
        &mut self,
        sig: &ExportSignature,
    ) -> Result<Signature, IndexError> {
        Ok(Signature {
            params: self.types(&sig.params)?,
            results: self.types(&sig.results)?,
            variadic: sig.variadic,
        })
    }
}

// ============ 存储 ============

/// 索引目录
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 导入路径对应的索引文件
    pub fn file_for(
        &self,
        path: &str,
    ) -> PathBuf {
        self.dir.join(format!("{}.json", path))
    }

    /// 索引文件的修改时间；不存在时为 `None`
    pub fn modified(
        &self,
        path: &str,
    ) -> Option<SystemTime> {
        fs::metadata(self.file_for(path))
            .and_then(|meta| meta.modified())
            .ok()
    }

    /// 读取导出数据；文件不存在时为 `Ok(None)`
    pub fn read(
        &self,
        path: &str,
    ) -> Result<Option<ExportPackage>, IndexError> {
        let file = self.file_for(path);
        let text = match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(IndexError::Io { path: file, source }),
        };
        let export: ExportPackage =
            serde_json::from_str(&text).map_err(|source| IndexError::Json {
                path: file.clone(),
                source,
            })?;
        if export.path != path {
            return Err(IndexError::PathMismatch {
                expected: path.to_string(),
                found: export.path,
            });
        }
        debug!(path, file = %file.display(), "read export data");
        Ok(Some(export))
    }

    /// 写出导出数据，返回写入的文件
    pub fn write(
        &self,
        export: &ExportPackage,
    ) -> Result<PathBuf, IndexError> {
        let file = self.file_for(&export.path);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|source| IndexError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(export).map_err(|source| IndexError::Json {
            path: file.clone(),
            source,
        })?;
        fs::write(&file, text).map_err(|source| IndexError::Io {
            path: file.clone(),
            source,
        })?;
        debug!(path = %export.path, file = %file.display(), "wrote export data");
        Ok(file)
    }
}
