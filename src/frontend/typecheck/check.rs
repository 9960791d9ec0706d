//! 声明级类型检查
//!
//! 把一个包的语法树转换为 [`Package`] 描述符：
//!
//! 1. 通过 [`Importer`] 解析每个文件的导入
//! 2. 为每个非别名类型声明分配 id
//! 3. 按需解析命名类型，并检测非法递归
//! 4. 按需解析别名
//! 5. 把方法挂到接收者类型上
//! 6. 解析函数签名与变量、常量类型
//!
//! 所有错误都会被收集，而不是在第一个错误处停止。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::errors::{ErrorCollector, TypeDiagnostic, TypeError};
use super::types::*;
use super::Importer;
use crate::frontend::module::{Package, PackageOrigin, ScopeObject};
use crate::frontend::parser::ast::*;
use crate::util::span::Span;

/// 已解析的源文件
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// 文件名（不含目录）
    pub name: String,
    pub ast: SourceFile,
}

/// 检查一个包
///
/// 包内所有文件必须具有相同的包名。
pub fn check_package(
    importer: &mut dyn Importer,
    path: &str,
    files: &[ParsedFile],
) -> Result<Package, Vec<TypeDiagnostic>> {
    let mut checker = Checker::new(importer, path, files);
    checker.run();
    checker.finish()
}

/// 包级对象声明
#[derive(Debug, Clone, Copy)]
enum Object<'a> {
    Type {
        file: usize,
        spec: &'a TypeSpec,
    },
    Func {
        file: usize,
        decl: &'a FuncDecl,
    },
    Value {
        file: usize,
        kind: ValueKind,
        /// 声明的类型，或常量组中继承的类型
        ty: Option<&'a TypeExpr>,
        /// 常量的初始化表达式（含组内隐式重复）
        value: Option<&'a ConstExpr>,
        iota: usize,
    },
}

/// 文件级作用域：导入的包
#[derive(Debug, Default)]
struct FileScope {
    packages: HashMap<String, Arc<Package>>,
    dot: Vec<Arc<Package>>,
    cgo: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum ResolveState {
    Resolving,
    Done,
}

#[derive(Debug, Clone, Copy)]
enum ConstState {
    Resolving,
    Done(Option<i128>),
}

#[derive(Debug, Clone)]
enum AliasState {
    Resolving,
    Done(Type),
}

/// 解析上下文
#[derive(Debug, Clone, Copy)]
struct Ctx<'c> {
    file: usize,
    type_params: &'c [String],
    /// 直接包含位置（不经过指针、切片、映射、通道或函数）
    direct: bool,
}

impl<'c> Ctx<'c> {
    fn indirect(self) -> Ctx<'c> {
        Ctx {
            direct: false,
            ..self
        }
    }
}

struct Checker<'a> {
    importer: &'a mut dyn Importer,
    path: String,
    files: &'a [ParsedFile],
    file_scopes: Vec<FileScope>,
    imports: Vec<String>,
    objects: IndexMap<String, Object<'a>>,
    methods: Vec<(usize, &'a FuncDecl)>,
    type_ids: HashMap<String, NamedTypeId>,
    local_types: HashMap<NamedTypeId, (usize, &'a TypeSpec)>,
    states: HashMap<NamedTypeId, ResolveState>,
    aliases: HashMap<String, AliasState>,
    consts: HashMap<String, ConstState>,
    cyclic: HashSet<String>,
    errors: ErrorCollector,
}

impl<'a> Checker<'a> {
    fn new(
        importer: &'a mut dyn Importer,
        path: &str,
        files: &'a [ParsedFile],
    ) -> Self {
        Self {
            importer,
            path: path.to_string(),
            files,
            file_scopes: Vec::new(),
            imports: Vec::new(),
            objects: IndexMap::new(),
            methods: Vec::new(),
            type_ids: HashMap::new(),
            local_types: HashMap::new(),
            states: HashMap::new(),
            aliases: HashMap::new(),
            consts: HashMap::new(),
            cyclic: HashSet::new(),
            errors: ErrorCollector::new(),
        }
    }

    fn error(
        &mut self,
        file: usize,
        error: TypeError,
    ) {
        let name = self.files.get(file).map(|f| f.name.as_str()).unwrap_or("");
        self.errors.add_error(name, error);
    }

    fn run(&mut self) {
        self.import_files();
        self.declare();

        let mut ids: Vec<NamedTypeId> = self.local_types.keys().copied().collect();
        ids.sort();
        for id in ids {
            self.resolve_named(id);
        }

        let alias_names: Vec<(String, usize, &'a TypeSpec)> = self
            .objects
            .iter()
            .filter_map(|(name, obj)| match obj {
                Object::Type { file, spec } if spec.alias => Some((name.clone(), *file, *spec)),
                _ => None,
            })
            .collect();
        for (name, file, spec) in alias_names {
            self.resolve_alias(&name, file, spec);
        }

        self.attach_methods();
    }

    // =========================================================================
    // 导入与声明
    // =========================================================================

    fn import_files(&mut self) {
        let files = self.files;
        for (index, file) in files.iter().enumerate() {
            let mut scope = FileScope::default();
            for spec in &file.ast.imports {
                if spec.path != "C" && !self.imports.contains(&spec.path) {
                    self.imports.push(spec.path.clone());
                }
                if spec.path == "C" {
                    scope.cgo = true;
                    continue;
                }

                let result = if spec.path == "unsafe" {
                    Ok(Package::unsafe_package())
                } else {
                    self.importer.import(&spec.path)
                };
                let package = match result {
                    Ok(package) => package,
                    Err(err) => {
                        self.error(
                            index,
                            TypeError::ImportFailed {
                                path: spec.path.clone(),
                                reason: err.to_string(),
                                span: spec.span,
                            },
                        );
                        continue;
                    }
                };

                match spec.name.as_deref() {
                    Some("_") => {}
                    Some(".") => scope.dot.push(package),
                    Some(local) => {
                        scope.packages.insert(local.to_string(), package);
                    }
                    None => {
                        scope.packages.insert(package.name.clone(), package);
                    }
                }
            }
            self.file_scopes.push(scope);
        }
    }

    fn declare(&mut self) {
        let files = self.files;
        for (index, file) in files.iter().enumerate() {
            let mut group_ty: Option<&'a TypeExpr> = None;
            let mut group_values: &'a [Option<ConstExpr>] = &[];
            for decl in &file.ast.decls {
                match decl {
                    Decl::Type(spec) => {
                        self.declare_object(
                            index,
                            &spec.name,
                            spec.span,
                            Object::Type { file: index, spec },
                        );
                    }
                    Decl::Func(func) => {
                        if func.recv.is_some() {
                            self.methods.push((index, func));
                        } else if func.name != "init" {
                            self.declare_object(
                                index,
                                &func.name,
                                func.span,
                                Object::Func {
                                    file: index,
                                    decl: func,
                                },
                            );
                        }
                    }
                    Decl::Value(spec) => {
                        let (ty, values) = match spec.kind {
                            ValueKind::Var => (spec.ty.as_ref(), &[][..]),
                            ValueKind::Const => {
                                if matches!(spec.group_index, None | Some(0)) {
                                    group_ty = None;
                                    group_values = &[];
                                }
                                if spec.has_values {
                                    group_ty = spec.ty.as_ref();
                                    group_values = &spec.values[..];
                                    (spec.ty.as_ref(), &spec.values[..])
                                } else {
                                    (spec.ty.as_ref().or(group_ty), group_values)
                                }
                            }
                        };
                        for (i, name) in spec.names.iter().enumerate() {
                            self.declare_object(
                                index,
                                name,
                                spec.span,
                                Object::Value {
                                    file: index,
                                    kind: spec.kind,
                                    ty,
                                    value: values.get(i).and_then(Option::as_ref),
                                    iota: spec.group_index.unwrap_or(0),
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    fn declare_object(
        &mut self,
        file: usize,
        name: &str,
        span: Span,
        object: Object<'a>,
    ) {
        if name == "_" {
            return;
        }
        if self.objects.contains_key(name) {
            self.error(
                file,
                TypeError::Redeclared {
                    name: name.to_string(),
                    span,
                },
            );
            return;
        }
        if let Object::Type { spec, .. } = object {
            if !spec.alias {
                let params = spec.type_params.iter().map(|p| p.name.clone()).collect();
                let id = self.importer.table().alloc(&self.path, name, params);
                self.type_ids.insert(name.to_string(), id);
                self.local_types.insert(id, (file, spec));
            }
        }
        self.objects.insert(name.to_string(), object);
    }

    // =========================================================================
    // 命名类型与别名
    // =========================================================================

    /// 若为本包类型则确保其已解析
    fn ensure_resolved(
        &mut self,
        id: NamedTypeId,
    ) {
        if self.local_types.contains_key(&id) {
            self.resolve_named(id);
        }
    }

    fn resolve_named(
        &mut self,
        id: NamedTypeId,
    ) {
        let Some(&(file, spec)) = self.local_types.get(&id) else {
            return;
        };
        match self.states.get(&id) {
            Some(ResolveState::Done) => return,
            Some(ResolveState::Resolving) => {
                self.report_cycle(file, spec);
                return;
            }
            None => {}
        }

        self.states.insert(id, ResolveState::Resolving);
        let params: Vec<String> = spec.type_params.iter().map(|p| p.name.clone()).collect();
        let ctx = Ctx {
            file,
            type_params: &params,
            direct: true,
        };
        let ty = self.resolve_type(&spec.ty, ctx);
        let underlying = match ty {
            Type::Named(base) | Type::Instance { base, .. } => {
                self.importer.table().get(base).underlying.clone()
            }
            Type::TypeParam(_) => {
                self.error(
                    file,
                    TypeError::NotAType {
                        name: spec.name.clone(),
                        span: spec.ty.span(),
                    },
                );
                Type::Invalid
            }
            other => other,
        };
        self.importer.table().get_mut(id).underlying = underlying;
        self.states.insert(id, ResolveState::Done);
        debug!(package = %self.path, name = %spec.name, "resolved type");
    }

    fn report_cycle(
        &mut self,
        file: usize,
        spec: &TypeSpec,
    ) {
        if self.cyclic.insert(spec.name.clone()) {
            self.error(
                file,
                TypeError::RecursiveType {
                    name: spec.name.clone(),
                    span: spec.span,
                },
            );
        }
    }

    fn resolve_alias(
        &mut self,
        name: &str,
        file: usize,
        spec: &'a TypeSpec,
    ) -> Type {
        match self.aliases.get(name) {
            Some(AliasState::Done(ty)) => return ty.clone(),
            Some(AliasState::Resolving) => {
                self.report_cycle(file, spec);
                return Type::Invalid;
            }
            None => {}
        }
        self.aliases
            .insert(name.to_string(), AliasState::Resolving);
        let ctx = Ctx {
            file,
            type_params: &[],
            direct: false,
        };
        let ty = self.resolve_type(&spec.ty, ctx);
        self.aliases
            .insert(name.to_string(), AliasState::Done(ty.clone()));
        ty
    }

    // =========================================================================
    // 类型表达式
    // =========================================================================

    fn resolve_type(
        &mut self,
        expr: &TypeExpr,
        ctx: Ctx<'_>,
    ) -> Type {
        match expr {
            TypeExpr::Name {
                package: None,
                name,
                args,
                span,
            } => self.resolve_ident(name, args, *span, ctx),
            TypeExpr::Name {
                package: Some(package),
                name,
                args,
                span,
            } => self.resolve_qualified(package, name, args, *span, ctx),
            TypeExpr::Pointer(elem, _) => Type::pointer(self.resolve_type(elem, ctx.indirect())),
            TypeExpr::Slice(elem, _) => {
                Type::Slice(Box::new(self.resolve_type(elem, ctx.indirect())))
            }
            TypeExpr::Array { len, elem, .. } => Type::Array {
                len: self.array_length(len, ctx.file),
                elem: Box::new(self.resolve_type(elem, ctx)),
            },
            TypeExpr::Map { key, value, .. } => Type::Map {
                key: Box::new(self.resolve_type(key, ctx.indirect())),
                value: Box::new(self.resolve_type(value, ctx.indirect())),
            },
            TypeExpr::Chan { dir, elem, .. } => Type::Chan {
                dir: *dir,
                elem: Box::new(self.resolve_type(elem, ctx.indirect())),
            },
            TypeExpr::Func(sig, _) => Type::Func(self.resolve_signature(sig, ctx.indirect())),
            TypeExpr::Struct(fields, _) => self.resolve_struct(fields, ctx),
            TypeExpr::Interface(elems, _) => self.resolve_interface(elems, ctx),
        }
    }

    fn resolve_args(
        &mut self,
        args: &[TypeExpr],
        ctx: Ctx<'_>,
    ) -> Vec<Type> {
        args.iter()
            .map(|arg| self.resolve_type(arg, ctx.indirect()))
            .collect()
    }

    /// 对命名类型应用类型实参
    fn instantiate(
        &mut self,
        ty: Type,
        name: &str,
        args: &[TypeExpr],
        span: Span,
        ctx: Ctx<'_>,
    ) -> Type {
        let Type::Named(id) = ty else {
            if !args.is_empty() {
                self.error(
                    ctx.file,
                    TypeError::NotGeneric {
                        name: name.to_string(),
                        span,
                    },
                );
                return Type::Invalid;
            }
            return ty;
        };

        let generic = self.importer.table().get(id).is_generic();
        match (generic, args.is_empty()) {
            (false, true) => Type::Named(id),
            (true, false) => Type::Instance {
                base: id,
                args: self.resolve_args(args, ctx),
            },
            (true, true) => {
                self.error(
                    ctx.file,
                    TypeError::GenericWithoutInstantiation {
                        name: name.to_string(),
                        span,
                    },
                );
                Type::Invalid
            }
            (false, false) => {
                self.error(
                    ctx.file,
                    TypeError::NotGeneric {
                        name: name.to_string(),
                        span,
                    },
                );
                Type::Invalid
            }
        }
    }

    /// 类型参数 → 包作用域 → 点导入 → 预声明
    fn resolve_ident(
        &mut self,
        name: &str,
        args: &[TypeExpr],
        span: Span,
        ctx: Ctx<'_>,
    ) -> Type {
        if ctx.type_params.iter().any(|p| p == name) {
            return Type::TypeParam(name.to_string());
        }

        if let Some(object) = self.objects.get(name).copied() {
            return match object {
                Object::Type { file, spec } if spec.alias => {
                    let ty = self.resolve_alias(name, file, spec);
                    if ctx.direct {
                        if let Some(id) = ty.named_id() {
                            self.ensure_resolved(id);
                        }
                    }
                    self.instantiate(ty, name, args, span, ctx)
                }
                Object::Type { .. } => match self.type_ids.get(name).copied() {
                    Some(id) => {
                        if ctx.direct {
                            self.ensure_resolved(id);
                        }
                        self.instantiate(Type::Named(id), name, args, span, ctx)
                    }
                    None => Type::Invalid,
                },
                _ => {
                    self.error(
                        ctx.file,
                        TypeError::NotAType {
                            name: name.to_string(),
                            span,
                        },
                    );
                    Type::Invalid
                }
            };
        }

        let dot_hit = self.file_scopes.get(ctx.file).and_then(|scope| {
            scope.dot.iter().find_map(|package| match package.lookup(name) {
                Some(ScopeObject::TypeName { ty, .. }) if is_exported(name) => Some(ty.clone()),
                _ => None,
            })
        });
        if let Some(ty) = dot_hit {
            return self.instantiate(ty, name, args, span, ctx);
        }

        let predeclared = match name {
            "any" => Some(Type::empty_interface()),
            _ => BasicKind::from_name(name)
                .map(Type::Basic)
                .or_else(|| TypeTable::universe(name).map(Type::Named)),
        };
        match predeclared {
            Some(ty) => self.instantiate(ty, name, args, span, ctx),
            None => {
                self.error(ctx.file, TypeError::undefined(name, span));
                Type::Invalid
            }
        }
    }

    fn resolve_qualified(
        &mut self,
        package: &str,
        name: &str,
        args: &[TypeExpr],
        span: Span,
        ctx: Ctx<'_>,
    ) -> Type {
        let qualified = format!("{}.{}", package, name);
        let Some(scope) = self.file_scopes.get(ctx.file) else {
            return Type::Invalid;
        };
        if package == "C" && scope.cgo {
            return Type::Opaque(name.to_string());
        }
        let Some(imported) = scope.packages.get(package).cloned() else {
            self.error(ctx.file, TypeError::undefined(package, span));
            return Type::Invalid;
        };

        if !is_exported(name) {
            self.error(
                ctx.file,
                TypeError::Unexported {
                    package: imported.path.clone(),
                    name: name.to_string(),
                    span,
                },
            );
            return Type::Invalid;
        }
        match imported.lookup(name) {
            Some(ScopeObject::TypeName { ty, .. }) => {
                let ty = ty.clone();
                self.instantiate(ty, &qualified, args, span, ctx)
            }
            Some(_) => {
                self.error(
                    ctx.file,
                    TypeError::NotAType {
                        name: qualified,
                        span,
                    },
                );
                Type::Invalid
            }
            None => {
                self.error(ctx.file, TypeError::undefined(qualified, span));
                Type::Invalid
            }
        }
    }

    fn resolve_signature(
        &mut self,
        sig: &FuncType,
        ctx: Ctx<'_>,
    ) -> Signature {
        let mut params: Vec<Type> = sig
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty, ctx))
            .collect();
        if sig.variadic {
            if let Some(last) = params.pop() {
                params.push(Type::Slice(Box::new(last)));
            }
        }
        let results = sig
            .results
            .iter()
            .map(|p| self.resolve_type(&p.ty, ctx))
            .collect();
        Signature {
            params,
            results,
            variadic: sig.variadic,
        }
    }

    fn resolve_struct(
        &mut self,
        decls: &[FieldDecl],
        ctx: Ctx<'_>,
    ) -> Type {
        let mut fields = Vec::new();
        for decl in decls {
            let ty = self.resolve_type(&decl.ty, ctx);
            if decl.embedded {
                let name = embedded_name(&decl.ty).unwrap_or_default();
                fields.push(Field {
                    pkg: self.field_pkg(&name),
                    name,
                    ty,
                    embedded: true,
                    tag: decl.tag.clone(),
                });
                continue;
            }
            for name in &decl.names {
                fields.push(Field {
                    pkg: self.field_pkg(name),
                    name: name.clone(),
                    ty: ty.clone(),
                    embedded: false,
                    tag: decl.tag.clone(),
                });
            }
        }
        Type::Struct(fields)
    }

    fn field_pkg(
        &self,
        name: &str,
    ) -> Option<String> {
        if is_exported(name) {
            None
        } else {
            Some(self.path.clone())
        }
    }

    /// 展平接口：合并嵌入接口的方法
    fn resolve_interface(
        &mut self,
        elems: &[InterfaceElem],
        ctx: Ctx<'_>,
    ) -> Type {
        let mut methods: IndexMap<MethodKey, Signature> = IndexMap::new();
        let mut constraint = false;

        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig, span } => {
                    let sig = self.resolve_signature(sig, ctx.indirect());
                    let key = MethodKey::new(name, &self.path);
                    self.merge_method(&mut methods, key, sig, *span, ctx.file);
                }
                InterfaceElem::Embed(expr) => {
                    let ty = self.resolve_type(expr, Ctx { direct: true, ..ctx });
                    let underlying = self.importer.table().underlying(&ty).clone();
                    match underlying {
                        Type::Interface(embedded) => {
                            constraint |= embedded.constraint;
                            for method in embedded.methods {
                                self.merge_method(
                                    &mut methods,
                                    method.key,
                                    method.sig,
                                    expr.span(),
                                    ctx.file,
                                );
                            }
                        }
                        // 非接口类型作为单一类型项
                        Type::Invalid => {}
                        _ => constraint = true,
                    }
                }
                InterfaceElem::Terms(terms, _) => {
                    for term in terms {
                        self.resolve_type(&term.ty, ctx.indirect());
                    }
                    constraint = true;
                }
            }
        }

        let methods = methods
            .into_iter()
            .map(|(key, sig)| Method { key, sig })
            .collect();
        Type::Interface(InterfaceType::new(methods, constraint))
    }

    fn merge_method(
        &mut self,
        methods: &mut IndexMap<MethodKey, Signature>,
        key: MethodKey,
        sig: Signature,
        span: Span,
        file: usize,
    ) {
        match methods.get(&key) {
            Some(existing) if *existing == sig => {}
            Some(_) => self.error(
                file,
                TypeError::DuplicateInterfaceMethod {
                    method: key.name.clone(),
                    span,
                },
            ),
            None => {
                methods.insert(key, sig);
            }
        }
    }

    // =========================================================================
    // 方法
    // =========================================================================

    fn attach_methods(&mut self) {
        let methods = std::mem::take(&mut self.methods);
        for (file, decl) in methods {
            let Some(recv) = decl.recv.as_ref() else {
                continue;
            };
            let Some(id) = self.receiver_base(file, recv) else {
                continue;
            };

            let underlying = self.importer.table().get(id).underlying.clone();
            let reason = match underlying {
                Type::Pointer(_) => Some("pointer or interface type"),
                Type::Interface(_) => Some("pointer or interface type"),
                _ => None,
            };
            if let Some(reason) = reason {
                self.error(
                    file,
                    TypeError::InvalidReceiver {
                        name: recv.base.clone(),
                        reason: reason.to_string(),
                        span: recv.span,
                    },
                );
                continue;
            }

            let mut params = recv.type_params.clone();
            params.extend(decl.type_params.iter().map(|p| p.name.clone()));
            let ctx = Ctx {
                file,
                type_params: &params,
                direct: false,
            };
            let sig = self.resolve_signature(&decl.sig, ctx);

            if decl.name == "_" {
                continue;
            }
            let key = MethodKey::new(&decl.name, &self.path);
            let (duplicate, field_clash, type_name) = {
                let named = self.importer.table().get(id);
                let field_clash = matches!(
                    &named.underlying,
                    Type::Struct(fields) if fields.iter().any(|f| f.name == decl.name)
                );
                (
                    named.methods.iter().any(|m| m.key == key),
                    field_clash,
                    named.name.clone(),
                )
            };
            if duplicate {
                self.error(
                    file,
                    TypeError::DuplicateMethod {
                        type_name,
                        method: decl.name.clone(),
                        span: decl.span,
                    },
                );
                continue;
            }
            if field_clash {
                self.error(
                    file,
                    TypeError::FieldMethodConflict {
                        name: decl.name.clone(),
                        span: decl.span,
                    },
                );
                continue;
            }
            self.importer.table().get_mut(id).methods.push(MethodDecl {
                key,
                sig,
                pointer_receiver: recv.pointer,
            });
        }
    }

    /// 接收者基类型必须是本包定义的类型
    fn receiver_base(
        &mut self,
        file: usize,
        recv: &Receiver,
    ) -> Option<NamedTypeId> {
        let object = match self.objects.get(&recv.base).copied() {
            Some(object) => object,
            None => {
                let error = if BasicKind::from_name(&recv.base).is_some()
                    || TypeTable::universe(&recv.base).is_some()
                {
                    TypeError::InvalidReceiver {
                        name: recv.base.clone(),
                        reason: "cannot define new methods on non-local type".to_string(),
                        span: recv.span,
                    }
                } else {
                    TypeError::undefined(recv.base.clone(), recv.span)
                };
                self.error(file, error);
                return None;
            }
        };

        let id = match object {
            Object::Type { spec, .. } if !spec.alias => self.type_ids.get(&recv.base).copied(),
            Object::Type { file: alias_file, spec } => {
                let ty = self.resolve_alias(&recv.base, alias_file, spec);
                ty.named_id().filter(|id| self.local_types.contains_key(id))
            }
            _ => {
                self.error(
                    file,
                    TypeError::NotAType {
                        name: recv.base.clone(),
                        span: recv.span,
                    },
                );
                return None;
            }
        };
        if id.is_none() {
            self.error(
                file,
                TypeError::InvalidReceiver {
                    name: recv.base.clone(),
                    reason: "cannot define new methods on non-local type".to_string(),
                    span: recv.span,
                },
            );
        }
        id
    }

    // =========================================================================
    // 常量表达式
    // =========================================================================

    /// 数组长度：可求值时为数值，否则保留源码文本
    fn array_length(
        &mut self,
        len: &ArrayLen,
        file: usize,
    ) -> ArrayLength {
        len.expr
            .as_ref()
            .and_then(|expr| self.eval_const(expr, file, None))
            .and_then(|n| u64::try_from(n).ok())
            .map(ArrayLength::Known)
            .unwrap_or_else(|| ArrayLength::Unknown(len.text.clone()))
    }

    /// 本包常量的整数值；循环引用或不可求值时为 `None`
    fn const_value(
        &mut self,
        name: &str,
    ) -> Option<i128> {
        match self.consts.get(name) {
            Some(ConstState::Done(value)) => return *value,
            Some(ConstState::Resolving) => return None,
            None => {}
        }
        let Some(Object::Value {
            file,
            kind: ValueKind::Const,
            value: Some(expr),
            iota,
            ..
        }) = self.objects.get(name).copied()
        else {
            return None;
        };
        self.consts.insert(name.to_string(), ConstState::Resolving);
        let value = self.eval_const(expr, file, Some(iota));
        self.consts.insert(name.to_string(), ConstState::Done(value));
        value
    }

    fn eval_const(
        &mut self,
        expr: &ConstExpr,
        file: usize,
        iota: Option<usize>,
    ) -> Option<i128> {
        match expr {
            ConstExpr::Int(n) => Some(*n),
            ConstExpr::Iota => iota.map(|i| i as i128),
            ConstExpr::Name {
                package: None,
                name,
            } => {
                if self.objects.contains_key(name.as_str()) {
                    return self.const_value(name);
                }
                let scope = self.file_scopes.get(file)?;
                scope
                    .dot
                    .iter()
                    .find_map(|package| imported_const(package, name))
            }
            ConstExpr::Name {
                package: Some(package),
                name,
            } => {
                let imported = self.file_scopes.get(file)?.packages.get(package)?;
                imported_const(imported, name)
            }
            ConstExpr::Conversion { ty, arg } => {
                if BUILTIN_FUNCS.contains(&ty.as_str()) || ty.starts_with("unsafe.") {
                    return None;
                }
                self.eval_const(arg, file, iota)
            }
            ConstExpr::Unary(op, operand) => {
                let v = self.eval_const(operand, file, iota)?;
                match op {
                    UnaryOp::Plus => Some(v),
                    UnaryOp::Neg => v.checked_neg(),
                    UnaryOp::Not => Some(!v),
                }
            }
            ConstExpr::Binary(op, lhs, rhs) => {
                let l = self.eval_const(lhs, file, iota)?;
                let r = self.eval_const(rhs, file, iota)?;
                eval_binary(*op, l, r)
            }
        }
    }

    // =========================================================================
    // 结果
    // =========================================================================

    fn finish(mut self) -> Result<Package, Vec<TypeDiagnostic>> {
        let objects: Vec<(String, Object<'a>)> = self
            .objects
            .iter()
            .map(|(name, obj)| (name.clone(), *obj))
            .collect();

        let mut scope = IndexMap::new();
        for (name, object) in objects {
            let value = match object {
                Object::Type { file, spec } if spec.alias => ScopeObject::TypeName {
                    ty: self.resolve_alias(&name, file, spec),
                    alias: true,
                },
                Object::Type { .. } => match self.type_ids.get(&name) {
                    Some(id) => ScopeObject::TypeName {
                        ty: Type::Named(*id),
                        alias: false,
                    },
                    None => continue,
                },
                Object::Func { file, decl } => {
                    let params: Vec<String> =
                        decl.type_params.iter().map(|p| p.name.clone()).collect();
                    let ctx = Ctx {
                        file,
                        type_params: &params,
                        direct: false,
                    };
                    ScopeObject::Func(self.resolve_signature(&decl.sig, ctx))
                }
                Object::Value { file, kind, ty, .. } => {
                    let ctx = Ctx {
                        file,
                        type_params: &[],
                        direct: false,
                    };
                    let ty = ty.map(|expr| self.resolve_type(expr, ctx));
                    match kind {
                        ValueKind::Var => ScopeObject::Var { ty },
                        ValueKind::Const => ScopeObject::Const {
                            ty,
                            value: self.const_value(&name).and_then(|v| i64::try_from(v).ok()),
                        },
                    }
                }
            };
            scope.insert(name, value);
        }

        if self.errors.has_errors() {
            return Err(self.errors.into_errors());
        }

        let name = self
            .files
            .first()
            .map(|f| f.ast.package.clone())
            .unwrap_or_default();
        Ok(Package {
            path: self.path,
            name,
            complete: true,
            imports: self.imports,
            origin: PackageOrigin::Source,
            scope,
        })
    }
}

/// 不是类型转换的内建函数
const BUILTIN_FUNCS: &[&str] = &[
    "len", "cap", "real", "imag", "complex", "min", "max", "new", "make", "append",
];

/// 导入包中导出常量的值
fn imported_const(
    package: &Package,
    name: &str,
) -> Option<i128> {
    if !is_exported(name) {
        return None;
    }
    match package.lookup(name) {
        Some(ScopeObject::Const { value, .. }) => value.map(i128::from),
        _ => None,
    }
}

fn eval_binary(
    op: BinaryOp,
    l: i128,
    r: i128,
) -> Option<i128> {
    match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Rem => l.checked_rem(r),
        BinaryOp::Shl => {
            let shift = u32::try_from(r).ok().filter(|s| *s < 127)?;
            l.checked_mul(1i128 << shift)
        }
        BinaryOp::Shr => {
            let shift = u32::try_from(r).ok()?;
            Some(l >> shift.min(127))
        }
        BinaryOp::And => Some(l & r),
        BinaryOp::Or => Some(l | r),
        BinaryOp::Xor => Some(l ^ r),
        BinaryOp::AndNot => Some(l & !r),
    }
}

/// 嵌入字段的字段名：`T`、`*T`、`pkg.T`、`T[int]` 均为 `T`
fn embedded_name(expr: &TypeExpr) -> Option<String> {
    match expr {
        TypeExpr::Name { name, .. } => Some(name.clone()),
        TypeExpr::Pointer(inner, _) => embedded_name(inner),
        _ => None,
    }
}
