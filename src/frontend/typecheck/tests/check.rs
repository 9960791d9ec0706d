//! 包检查测试：方法、接口、别名与常量

use super::*;
use crate::frontend::typecheck::{ArrayLength, BasicKind, InterfaceType, MethodKey};

fn interface_of(
    importer: &MapImporter,
    id: NamedTypeId,
) -> InterfaceType {
    match &importer.table_ref().get(id).underlying {
        Type::Interface(iface) => iface.clone(),
        other => panic!("not an interface: {:?}", other),
    }
}

#[test]
fn test_methods_attached_with_receiver_kind() {
    let mut importer = MapImporter::new().package(
        "shapes",
        r#"package shapes

type Circle struct{ r float64 }

func (c Circle) Area() float64 { return 3.14 * c.r * c.r }
func (c *Circle) Scale(f float64) { c.r *= f }
func (c *Circle) scale(xs ...int) {}
"#,
    );
    let package = importer.check("shapes").unwrap();
    let id = type_id(&package, "Circle");
    let named = importer.table_ref().get(id);
    assert_eq!(named.methods.len(), 3);
    assert!(!named.methods[0].pointer_receiver);
    assert!(named.methods[1].pointer_receiver);
    assert_eq!(named.methods[2].key, MethodKey::new("scale", "shapes"));
    assert!(named.methods[2].sig.variadic);
    assert!(matches!(named.methods[2].sig.params[0], Type::Slice(_)));
}

#[test]
fn test_interface_flattening_sorted() {
    let mut importer = MapImporter::new().package(
        "io",
        r#"package io

type Reader interface { Read(p []byte) (n int, err error) }
type Closer interface { Close() error }
type ReadCloser interface {
    Reader
    Closer
}
type Empty interface{}
"#,
    );
    let package = importer.check("io").unwrap();
    let rc = interface_of(&importer, type_id(&package, "ReadCloser"));
    let names: Vec<_> = rc.methods.iter().map(|m| m.key.name.as_str()).collect();
    assert_eq!(names, vec!["Close", "Read"]);
    assert!(!rc.constraint);
    assert!(interface_of(&importer, type_id(&package, "Empty")).is_empty());

    let read = &rc.methods[1].sig;
    assert_eq!(read.params, vec![Type::Slice(Box::new(Type::Basic(BasicKind::Uint8)))]);
    assert_eq!(read.results[1], Type::Named(NamedTypeId::ERROR));
}

#[test]
fn test_duplicate_embedded_methods_merge() {
    let mut importer = MapImporter::new().package(
        "p",
        r#"package p

type A interface { M(); N() int }
type B interface { M() }
type AB interface { A; B }
type Bad interface { A; N() string }
"#,
    );
    let message = first_error(importer.check("p"));
    assert!(message.contains("duplicate method N"), "{}", message);
}

#[test]
fn test_constraint_interfaces_marked() {
    let mut importer = MapImporter::new().package(
        "p",
        r#"package p

type Number interface { ~int | ~float64 }
type Key interface { comparable; Hash() uint64 }
type Plain interface { String() string }
"#,
    );
    let package = importer.check("p").unwrap();
    assert!(interface_of(&importer, type_id(&package, "Number")).constraint);
    assert!(interface_of(&importer, type_id(&package, "Key")).constraint);
    assert!(!interface_of(&importer, type_id(&package, "Plain")).constraint);
}

#[test]
fn test_defined_type_takes_underlying_not_methods() {
    let mut importer = MapImporter::new().package(
        "p",
        r#"package p

type Base struct{ n int }
func (Base) M() {}
type Derived Base
type MyErr error
"#,
    );
    let package = importer.check("p").unwrap();
    let table = importer.table_ref();
    let base = table.get(type_id(&package, "Base"));
    let derived = table.get(type_id(&package, "Derived"));
    assert_eq!(base.underlying, derived.underlying);
    assert!(derived.methods.is_empty());
    assert!(table.get(type_id(&package, "MyErr")).is_interface());
}

#[test]
fn test_aliases() {
    let mut importer = MapImporter::new().package(
        "p",
        r#"package p

type A = B
type B struct{}
type Bytes = []byte
"#,
    );
    let package = importer.check("p").unwrap();
    let b = type_id(&package, "B");
    assert_eq!(
        package.lookup("A"),
        Some(&ScopeObject::TypeName {
            ty: Type::Named(b),
            alias: true
        })
    );
    assert!(matches!(
        package.lookup("Bytes"),
        Some(ScopeObject::TypeName { ty: Type::Slice(_), alias: true })
    ));
}

#[test]
fn test_array_lengths_compare_by_value() {
    let mut importer = MapImporter::new()
        .package("a", "package a\n\nconst Size = 16\nconst hidden = 16\n")
        .package(
            "p",
            r#"package p

import "a"

const N = 1 << 4

const (
    K0 = iota * 4
    K1
)

type (
    Lit   [16]byte
    Hex   [0x10]uint8
    Local [N]byte
    Qual  [a.Size]byte
    Twice [a.Size * 2]byte
    Iota  [K1]byte
    Dyn   [cap(s)]byte
)
"#,
        );
    let package = importer.check("p").unwrap();
    let table = importer.table_ref();
    let underlying = |name: &str| table.get(type_id(&package, name)).underlying.clone();
    let array = |len: ArrayLength| Type::Array {
        len,
        elem: Box::new(Type::Basic(BasicKind::Uint8)),
    };

    for name in ["Lit", "Hex", "Local", "Qual"] {
        assert_eq!(underlying(name), array(ArrayLength::Known(16)), "{}", name);
    }
    assert_eq!(underlying("Twice"), array(ArrayLength::Known(32)));
    assert_eq!(underlying("Iota"), array(ArrayLength::Known(4)));
    assert_eq!(
        underlying("Dyn"),
        array(ArrayLength::Unknown("cap(s)".to_string()))
    );
    assert!(matches!(
        package.lookup("K1"),
        Some(ScopeObject::Const { value: Some(4), .. })
    ));
}

#[test]
fn test_scope_order_and_values() {
    let mut importer = MapImporter::new().package(
        "p",
        r#"package p

type Kind int

const (
    A Kind = iota
    B
)

const X = 1
var V, W []Kind

func New() *Kind { return nil }
func init() {}
"#,
    );
    let package = importer.check("p").unwrap();
    let names: Vec<_> = package.scope.keys().map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["Kind", "A", "B", "X", "V", "W", "New"]);
    let kind = type_id(&package, "Kind");
    assert_eq!(
        package.lookup("B"),
        Some(&ScopeObject::Const {
            ty: Some(Type::Named(kind)),
            value: Some(1),
        })
    );
    assert_eq!(
        package.lookup("X"),
        Some(&ScopeObject::Const {
            ty: None,
            value: Some(1)
        })
    );
    assert!(matches!(package.lookup("New"), Some(ScopeObject::Func(sig)) if sig.results.len() == 1));
}

#[test]
fn test_generic_types_declared() {
    let mut importer = MapImporter::new().package(
        "p",
        r#"package p

type List[T any] struct { head *node[T] }
type node[T any] struct { v T; next *node[T] }
func (l *List[T]) Push(v T) {}
"#,
    );
    let package = importer.check("p").unwrap();
    let list = importer.table_ref().get(type_id(&package, "List"));
    assert!(list.is_generic());
    assert_eq!(list.methods.len(), 1);
    assert_eq!(list.methods[0].sig.params, vec![Type::TypeParam("T".to_string())]);
}
