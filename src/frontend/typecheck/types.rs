//! 类型表示
//!
//! 全局类型表 [`TypeTable`] 以 arena 方式保存所有命名类型，
//! [`Type`] 的结构相等即 Go 的类型同一性。

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::frontend::parser::ast::ChanDir;

/// 命名类型在类型表中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedTypeId(pub u32);

impl NamedTypeId {
    /// 预声明的 `error` 接口
    pub const ERROR: NamedTypeId = NamedTypeId(0);
    /// 预声明的 `comparable` 约束
    pub const COMPARABLE: NamedTypeId = NamedTypeId(1);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 基本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    UnsafePointer,
}

impl BasicKind {
    /// 按预声明名称查找；`byte` 与 `rune` 归一化为 `uint8` 与 `int32`
    pub fn from_name(name: &str) -> Option<BasicKind> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "string" => BasicKind::String,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::UnsafePointer => "unsafe.Pointer",
        }
    }
}

/// 数组长度
///
/// 能求值的长度按数值比较，`[16]byte`、`[0x10]byte` 与 `[a.Size]byte` 相同；
/// 无法求值时退回源码文本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayLength {
    Known(u64),
    Unknown(String),
}

impl fmt::Display for ArrayLength {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ArrayLength::Known(n) => write!(f, "{}", n),
            ArrayLength::Unknown(text) => write!(f, "{}", text),
        }
    }
}

/// 类型
///
/// 派生的 `PartialEq` 即类型同一性：命名类型按 id 比较，
/// 其余类型按结构比较。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Basic(BasicKind),
    Named(NamedTypeId),
    /// 泛型类型的实例化；不做替换求值
    Instance {
        base: NamedTypeId,
        args: Vec<Type>,
    },
    TypeParam(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array {
        len: ArrayLength,
        elem: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<Type>,
    },
    Func(Signature),
    Struct(Vec<Field>),
    Interface(InterfaceType),
    /// cgo 引用 `C.name`，不可比较其结构
    Opaque(String),
    /// 解析失败的占位
    Invalid,
}

impl Type {
    /// 空接口 `interface{}` / `any`
    pub fn empty_interface() -> Type {
        Type::Interface(InterfaceType::default())
    }

    pub fn pointer(elem: Type) -> Type {
        Type::Pointer(Box::new(elem))
    }

    /// 若为命名类型（含实例化）返回其 id
    pub fn named_id(&self) -> Option<NamedTypeId> {
        match self {
            Type::Named(id) | Type::Instance { base: id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// 函数签名；参数名不参与同一性
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    /// 最后一个参数为 `...T`，以 `[]T` 保存
    pub variadic: bool,
}

/// 结构体字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// 未导出字段所属的包路径
    pub pkg: Option<String>,
    pub ty: Type,
    pub embedded: bool,
    pub tag: Option<String>,
}

/// 方法键
///
/// 导出方法只按名称比较；未导出方法附带所属包路径。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkg: Option<String>,
}

impl MethodKey {
    /// 根据名称是否导出构造方法键
    pub fn new(
        name: &str,
        package: &str,
    ) -> Self {
        let pkg = if is_exported(name) {
            None
        } else {
            Some(package.to_string())
        };
        Self {
            name: name.to_string(),
            pkg,
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 接口方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub key: MethodKey,
    pub sig: Signature,
}

/// 展平后的接口类型
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceType {
    /// 按方法键排序，嵌入接口的方法已合并
    pub methods: Vec<Method>,
    /// 含类型项（`~T`、联合）只能作为约束使用
    pub constraint: bool,
}

impl InterfaceType {
    /// 从未排序的方法列表构造
    pub fn new(
        mut methods: Vec<Method>,
        constraint: bool,
    ) -> Self {
        methods.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            methods,
            constraint,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// 命名类型上声明的方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub key: MethodKey,
    pub sig: Signature,
    pub pointer_receiver: bool,
}

/// 命名类型
#[derive(Debug, Clone)]
pub struct NamedType {
    /// 所属包路径；预声明类型为空串
    pub package: String,
    pub name: String,
    pub type_params: Vec<String>,
    /// 未解析前为 `Invalid`
    pub underlying: Type,
    /// 声明顺序
    pub methods: Vec<MethodDecl>,
}

impl NamedType {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.underlying, Type::Interface(_))
    }

    /// `path.Name`，预声明类型只有名称
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }
}

/// 全局类型表
///
/// 一次运行中每个命名类型只分配一次 id。
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<NamedType>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// 创建类型表并登记预声明的 `error` 与 `comparable`
    pub fn new() -> Self {
        let error_sig = Signature {
            params: Vec::new(),
            results: vec![Type::Basic(BasicKind::String)],
            variadic: false,
        };
        let error = NamedType {
            package: String::new(),
            name: "error".to_string(),
            type_params: Vec::new(),
            underlying: Type::Interface(InterfaceType::new(
                vec![Method {
                    key: MethodKey::new("Error", ""),
                    sig: error_sig,
                }],
                false,
            )),
            methods: Vec::new(),
        };
        let comparable = NamedType {
            package: String::new(),
            name: "comparable".to_string(),
            type_params: Vec::new(),
            underlying: Type::Interface(InterfaceType::new(Vec::new(), true)),
            methods: Vec::new(),
        };
        Self {
            types: vec![error, comparable],
        }
    }

    /// 分配新的命名类型
    pub fn alloc(
        &mut self,
        package: &str,
        name: &str,
        type_params: Vec<String>,
    ) -> NamedTypeId {
        let id = NamedTypeId(self.types.len() as u32);
        self.types.push(NamedType {
            package: package.to_string(),
            name: name.to_string(),
            type_params,
            underlying: Type::Invalid,
            methods: Vec::new(),
        });
        id
    }

    #[inline]
    pub fn get(
        &self,
        id: NamedTypeId,
    ) -> &NamedType {
        &self.types[id.index()]
    }

    #[inline]
    pub fn get_mut(
        &mut self,
        id: NamedTypeId,
    ) -> &mut NamedType {
        &mut self.types[id.index()]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// 预声明命名类型
    pub fn universe(name: &str) -> Option<NamedTypeId> {
        match name {
            "error" => Some(NamedTypeId::ERROR),
            "comparable" => Some(NamedTypeId::COMPARABLE),
            _ => None,
        }
    }

    /// 展开到底层类型（命名类型取其 underlying）
    pub fn underlying<'a>(
        &'a self,
        ty: &'a Type,
    ) -> &'a Type {
        match ty.named_id() {
            Some(id) => &self.get(id).underlying,
            None => ty,
        }
    }

    /// 用于诊断的类型显示
    pub fn display<'a>(
        &'a self,
        ty: &'a Type,
    ) -> TypeDisplay<'a> {
        TypeDisplay { table: self, ty }
    }

    /// 签名显示，形如 `func(int) error`
    pub fn display_sig(
        &self,
        sig: &Signature,
    ) -> String {
        let ty = Type::Func(sig.clone());
        self.display(&ty).to_string()
    }
}

/// Go 风格的类型文本
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    ty: &'a Type,
}

impl TypeDisplay<'_> {
    fn with<'b>(
        &'b self,
        ty: &'b Type,
    ) -> TypeDisplay<'b> {
        TypeDisplay {
            table: self.table,
            ty,
        }
    }

    fn write_list(
        &self,
        f: &mut fmt::Formatter<'_>,
        types: &[Type],
        variadic: bool,
    ) -> fmt::Result {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match ty {
                Type::Slice(elem) if variadic && i + 1 == types.len() => {
                    write!(f, "...{}", self.with(elem))?
                }
                _ => write!(f, "{}", self.with(ty))?,
            }
        }
        Ok(())
    }

    fn write_sig(
        &self,
        f: &mut fmt::Formatter<'_>,
        sig: &Signature,
    ) -> fmt::Result {
        write!(f, "(")?;
        self.write_list(f, &sig.params, sig.variadic)?;
        write!(f, ")")?;
        match sig.results.len() {
            0 => Ok(()),
            1 => write!(f, " {}", self.with(&sig.results[0])),
            _ => {
                write!(f, " (")?;
                self.write_list(f, &sig.results, false)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.ty {
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Named(id) => write!(f, "{}", self.table.get(*id).qualified_name()),
            Type::Instance { base, args } => {
                write!(f, "{}[", self.table.get(*base).qualified_name())?;
                self.write_list(f, args, false)?;
                write!(f, "]")
            }
            Type::TypeParam(name) => write!(f, "{}", name),
            Type::Pointer(elem) => write!(f, "*{}", self.with(elem)),
            Type::Slice(elem) => write!(f, "[]{}", self.with(elem)),
            Type::Array { len, elem } => write!(f, "[{}]{}", len, self.with(elem)),
            Type::Map { key, value } => write!(f, "map[{}]{}", self.with(key), self.with(value)),
            Type::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", self.with(elem)),
                ChanDir::Send => write!(f, "chan<- {}", self.with(elem)),
                ChanDir::Recv => write!(f, "<-chan {}", self.with(elem)),
            },
            Type::Func(sig) => {
                write!(f, "func")?;
                self.write_sig(f, sig)
            }
            Type::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    if field.embedded {
                        write!(f, " {}", self.with(&field.ty))?;
                    } else {
                        write!(f, " {} {}", field.name, self.with(&field.ty))?;
                    }
                }
                if fields.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            Type::Interface(iface) => {
                if iface.methods.is_empty() {
                    return write!(f, "interface{{}}");
                }
                write!(f, "interface{{")?;
                for (i, method) in iface.methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, " {}", method.key)?;
                    self.write_sig(f, &method.sig)?;
                }
                write!(f, " }}")
            }
            Type::Opaque(name) => write!(f, "C.{}", name),
            Type::Invalid => write!(f, "invalid type"),
        }
    }
}

/// Go 导出规则：首字母为大写
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_and_rune_are_aliases() {
        assert_eq!(BasicKind::from_name("byte"), Some(BasicKind::Uint8));
        assert_eq!(BasicKind::from_name("rune"), Some(BasicKind::Int32));
        assert_eq!(BasicKind::from_name("any"), None);
    }

    #[test]
    fn test_method_key_exported() {
        assert_eq!(MethodKey::new("Read", "io").pkg, None);
        assert_eq!(MethodKey::new("read", "io").pkg.as_deref(), Some("io"));
        assert_ne!(MethodKey::new("read", "io"), MethodKey::new("read", "os"));
    }

    #[test]
    fn test_interface_methods_sorted() {
        let m = |name: &str| Method {
            key: MethodKey::new(name, "p"),
            sig: Signature::default(),
        };
        let a = InterfaceType::new(vec![m("Write"), m("Close")], false);
        let b = InterfaceType::new(vec![m("Close"), m("Write")], false);
        assert_eq!(a, b);
        assert_eq!(a.methods[0].key.name, "Close");
    }

    #[test]
    fn test_display() {
        let mut table = TypeTable::new();
        let id = table.alloc("example.com/shapes", "Circle", Vec::new());
        let sig = Signature {
            params: vec![Type::Slice(Box::new(Type::Basic(BasicKind::Uint8)))],
            results: vec![Type::Basic(BasicKind::Int), Type::Named(NamedTypeId::ERROR)],
            variadic: false,
        };
        assert_eq!(table.display_sig(&sig), "func([]uint8) (int, error)");
        let ptr = Type::pointer(Type::Named(id));
        assert_eq!(table.display(&ptr).to_string(), "*example.com/shapes.Circle");
        let chan = Type::Chan {
            dir: ChanDir::Recv,
            elem: Box::new(Type::empty_interface()),
        };
        assert_eq!(table.display(&chan).to_string(), "<-chan interface{}");
    }

    #[test]
    fn test_universe_types() {
        let table = TypeTable::new();
        assert_eq!(table.get(NamedTypeId::ERROR).qualified_name(), "error");
        assert!(table.get(NamedTypeId::ERROR).is_interface());
        assert!(matches!(
            &table.get(NamedTypeId::COMPARABLE).underlying,
            Type::Interface(iface) if iface.constraint
        ));
    }
}
