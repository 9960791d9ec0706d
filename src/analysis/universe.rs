//! 类型全集提取
//!
//! 按声明顺序遍历包作用域，产出命名类型条目并一次性分类为接口或具体类型。

use crate::frontend::module::{Package, ScopeObject};
use crate::frontend::typecheck::{NamedTypeId, Type, TypeTable};

use super::methodset::{interface_method_set, method_set, MethodSet};

/// 条目分类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Interface,
    /// 具体类型，附带指针变体的方法集
    Concrete { pointer_methods: MethodSet },
}

/// 命名类型条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// 所属包路径
    pub package: String,
    /// 作用域中的名称；别名使用自己的名称
    pub name: String,
    pub id: NamedTypeId,
    /// 值变体的方法集；接口为展平后的方法
    pub methods: MethodSet,
    pub kind: EntryKind,
}

impl TypeEntry {
    /// `path.Name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, EntryKind::Interface)
    }

    /// 指针变体的方法集；接口没有指针变体
    pub fn pointer_methods(&self) -> Option<&MethodSet> {
        match &self.kind {
            EntryKind::Interface => None,
            EntryKind::Concrete { pointer_methods } => Some(pointer_methods),
        }
    }
}

/// 提取包中的命名类型
///
/// 跳过非类型对象、泛型类型、约束接口，以及未命名类型的别名。
pub fn extract(
    package: &Package,
    table: &TypeTable,
) -> Vec<TypeEntry> {
    package
        .scope
        .iter()
        .filter_map(|(name, object)| {
            let ScopeObject::TypeName { ty: Type::Named(id), .. } = object else {
                return None;
            };
            entry(package, name, *id, table)
        })
        .collect()
}

fn entry(
    package: &Package,
    name: &str,
    id: NamedTypeId,
    table: &TypeTable,
) -> Option<TypeEntry> {
    let named = table.get(id);
    if named.is_generic() {
        return None;
    }

    let (methods, kind) = match &named.underlying {
        Type::Interface(iface) if iface.constraint => return None,
        Type::Interface(iface) => (interface_method_set(iface), EntryKind::Interface),
        _ => (
            method_set(table, id, false),
            EntryKind::Concrete {
                pointer_methods: method_set(table, id, true),
            },
        ),
    };

    Some(TypeEntry {
        package: package.path.clone(),
        name: name.to_string(),
        id,
        methods,
        kind,
    })
}
