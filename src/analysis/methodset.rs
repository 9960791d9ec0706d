//! 方法集
//!
//! 命名类型的方法集按广度优先遍历自身及嵌入字段计算：
//! - 较浅深度出现过的名称会遮蔽更深的同名方法或字段
//! - 同一深度出现多次的名称有歧义，被排除
//! - 指针接收者方法只在可寻址路径上计入（指针变体，或经由嵌入的 `*T`）
//! - 嵌入的接口贡献其全部方法

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::frontend::typecheck::{InterfaceType, MethodKey, NamedTypeId, Signature, Type, TypeTable};

/// 方法集：方法键 → 签名
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet(BTreeMap<MethodKey, Signature>);

impl MethodSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: MethodKey,
        sig: Signature,
    ) {
        self.0.insert(key, sig);
    }

    pub fn get(
        &self,
        key: &MethodKey,
    ) -> Option<&Signature> {
        self.0.get(key)
    }

    pub fn contains(
        &self,
        key: &MethodKey,
    ) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按方法键排序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&MethodKey, &Signature)> {
        self.0.iter()
    }
}

impl FromIterator<(MethodKey, Signature)> for MethodSet {
    fn from_iter<I: IntoIterator<Item = (MethodKey, Signature)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 展平接口的方法集
pub fn interface_method_set(iface: &InterfaceType) -> MethodSet {
    iface
        .methods
        .iter()
        .map(|m| (m.key.clone(), m.sig.clone()))
        .collect()
}

/// 某一深度上待展开的嵌入类型
#[derive(Debug, Clone, Copy)]
struct Embedding {
    id: NamedTypeId,
    addressable: bool,
}

/// 同一深度上名称的出现
#[derive(Debug)]
enum Occurrence<'a> {
    /// 方法；`None` 表示存在但不在此路径的方法集中
    Method(Option<&'a Signature>),
    Field,
}

/// 命名类型（或其指针变体）的方法集
pub fn method_set(
    table: &TypeTable,
    id: NamedTypeId,
    pointer: bool,
) -> MethodSet {
    if let Type::Interface(iface) = &table.get(id).underlying {
        return interface_method_set(iface);
    }

    let mut result = MethodSet::new();
    // 已在较浅深度决定的名称
    let mut decided: HashSet<MethodKey> = HashSet::new();
    let mut seen: HashSet<NamedTypeId> = HashSet::new();
    let mut current = vec![Embedding {
        id,
        addressable: pointer,
    }];

    while !current.is_empty() {
        current.retain(|e| !seen.contains(&e.id));
        let mut found: HashMap<MethodKey, Vec<Occurrence<'_>>> = HashMap::new();
        let mut next = Vec::new();

        for embedding in &current {
            let named = table.get(embedding.id);

            if let Type::Interface(iface) = &named.underlying {
                for method in &iface.methods {
                    found
                        .entry(method.key.clone())
                        .or_default()
                        .push(Occurrence::Method(Some(&method.sig)));
                }
                continue;
            }

            for method in &named.methods {
                let usable = embedding.addressable || !method.pointer_receiver;
                found
                    .entry(method.key.clone())
                    .or_default()
                    .push(Occurrence::Method(usable.then_some(&method.sig)));
            }

            if let Type::Struct(fields) = &named.underlying {
                for field in fields {
                    let key = MethodKey {
                        name: field.name.clone(),
                        pkg: field.pkg.clone(),
                    };
                    found.entry(key).or_default().push(Occurrence::Field);
                    if field.embedded {
                        if let Some(next_embedding) = embedded_type(&field.ty, embedding.addressable) {
                            next.push(next_embedding);
                        }
                    }
                }
            }
        }

        for embedding in &current {
            seen.insert(embedding.id);
        }

        for (key, occurrences) in found {
            if !decided.insert(key.clone()) {
                continue;
            }
            if let [Occurrence::Method(Some(sig))] = occurrences.as_slice() {
                result.insert(key, (*sig).clone());
            }
        }

        current = next;
    }

    result
}

/// 嵌入字段的类型：`T` 继承可寻址性，`*T` 总是可寻址
fn embedded_type(
    ty: &Type,
    addressable: bool,
) -> Option<Embedding> {
    match ty {
        Type::Pointer(elem) => elem.named_id().map(|id| Embedding {
            id,
            addressable: true,
        }),
        other => other.named_id().map(|id| Embedding { id, addressable }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::typecheck::{BasicKind, Field, MethodDecl};

    fn sig(result: BasicKind) -> Signature {
        Signature {
            params: Vec::new(),
            results: vec![Type::Basic(result)],
            variadic: false,
        }
    }

    fn add_method(
        table: &mut TypeTable,
        id: NamedTypeId,
        name: &str,
        pointer_receiver: bool,
    ) {
        table.get_mut(id).methods.push(MethodDecl {
            key: MethodKey::new(name, "p"),
            sig: sig(BasicKind::Int),
            pointer_receiver,
        });
    }

    fn embed(ty: Type) -> Field {
        Field {
            name: match &ty {
                Type::Pointer(_) => "Ptr".to_string(),
                _ => "Val".to_string(),
            },
            pkg: None,
            ty,
            embedded: true,
            tag: None,
        }
    }

    fn names(set: &MethodSet) -> Vec<&str> {
        set.iter().map(|(k, _)| k.name.as_str()).collect()
    }

    #[test]
    fn test_value_and_pointer_receivers() {
        let mut table = TypeTable::new();
        let t = table.alloc("p", "T", Vec::new());
        table.get_mut(t).underlying = Type::Struct(Vec::new());
        add_method(&mut table, t, "Get", false);
        add_method(&mut table, t, "Set", true);

        assert_eq!(names(&method_set(&table, t, false)), vec!["Get"]);
        assert_eq!(names(&method_set(&table, t, true)), vec!["Get", "Set"]);
    }

    #[test]
    fn test_promoted_through_value_and_pointer_embedding() {
        let mut table = TypeTable::new();
        let inner = table.alloc("p", "Inner", Vec::new());
        table.get_mut(inner).underlying = Type::Struct(Vec::new());
        add_method(&mut table, inner, "Read", false);
        add_method(&mut table, inner, "Write", true);

        let by_value = table.alloc("p", "ByValue", Vec::new());
        table.get_mut(by_value).underlying = Type::Struct(vec![embed(Type::Named(inner))]);
        let by_ptr = table.alloc("p", "ByPtr", Vec::new());
        table.get_mut(by_ptr).underlying =
            Type::Struct(vec![embed(Type::pointer(Type::Named(inner)))]);

        assert_eq!(names(&method_set(&table, by_value, false)), vec!["Read"]);
        assert_eq!(names(&method_set(&table, by_value, true)), vec!["Read", "Write"]);
        assert_eq!(names(&method_set(&table, by_ptr, false)), vec!["Read", "Write"]);
    }

    #[test]
    fn test_shadowing_and_ambiguity() {
        let mut table = TypeTable::new();
        let a = table.alloc("p", "A", Vec::new());
        table.get_mut(a).underlying = Type::Struct(Vec::new());
        add_method(&mut table, a, "Close", false);
        add_method(&mut table, a, "Name", false);
        let b = table.alloc("p", "B", Vec::new());
        table.get_mut(b).underlying = Type::Struct(Vec::new());
        add_method(&mut table, b, "Close", false);

        let outer = table.alloc("p", "Outer", Vec::new());
        table.get_mut(outer).underlying = Type::Struct(vec![
            embed(Type::Named(a)),
            embed(Type::pointer(Type::Named(b))),
        ]);
        // Close 在深度 1 出现两次
        assert_eq!(names(&method_set(&table, outer, true)), vec!["Name"]);

        add_method(&mut table, outer, "Close", false);
        assert_eq!(names(&method_set(&table, outer, false)), vec!["Close", "Name"]);
    }

    #[test]
    fn test_field_shadows_promoted_method() {
        let mut table = TypeTable::new();
        let inner = table.alloc("p", "Inner", Vec::new());
        table.get_mut(inner).underlying = Type::Struct(Vec::new());
        add_method(&mut table, inner, "Len", false);

        let outer = table.alloc("p", "Outer", Vec::new());
        table.get_mut(outer).underlying = Type::Struct(vec![
            embed(Type::Named(inner)),
            Field {
                name: "Len".to_string(),
                pkg: None,
                ty: Type::Basic(BasicKind::Int),
                embedded: false,
                tag: None,
            },
        ]);
        assert!(method_set(&table, outer, true).is_empty());
    }

    #[test]
    fn test_embedded_interface_and_error() {
        let mut table = TypeTable::new();
        let wrapper = table.alloc("p", "Wrapper", Vec::new());
        table.get_mut(wrapper).underlying = Type::Struct(vec![Field {
            name: "error".to_string(),
            pkg: Some("p".to_string()),
            ty: Type::Named(NamedTypeId::ERROR),
            embedded: true,
            tag: None,
        }]);
        let set = method_set(&table, wrapper, false);
        assert_eq!(names(&set), vec!["Error"]);
        assert_eq!(
            set.get(&MethodKey::new("Error", "")),
            Some(&sig(BasicKind::String))
        );
    }

    #[test]
    fn test_recursive_embedding_terminates() {
        let mut table = TypeTable::new();
        let node = table.alloc("p", "Node", Vec::new());
        table.get_mut(node).underlying =
            Type::Struct(vec![embed(Type::pointer(Type::Named(node)))]);
        add_method(&mut table, node, "Next", true);
        // 深度 0 的指针方法遮蔽了经由 *Node 提升的同名方法
        assert!(method_set(&table, node, false).is_empty());
        assert_eq!(names(&method_set(&table, node, true)), vec!["Next"]);
    }
}
