//! 满足性判定
//!
//! 候选方法集包含接口要求的每个方法（方法键相同、签名一致）时满足该接口。

use crate::frontend::typecheck::MethodKey;

use super::methodset::MethodSet;
use super::universe::TypeEntry;

/// 第一个缺失或签名不一致的方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMethod {
    pub key: MethodKey,
    /// 方法存在但签名不一致
    pub wrong_type: bool,
}

/// 查找第一个未满足的方法；按方法键顺序，遇到即返回
pub fn missing_method(
    candidate: &MethodSet,
    required: &MethodSet,
) -> Option<MissingMethod> {
    required.iter().find_map(|(key, sig)| match candidate.get(key) {
        None => Some(MissingMethod {
            key: key.clone(),
            wrong_type: false,
        }),
        Some(found) if found != sig => Some(MissingMethod {
            key: key.clone(),
            wrong_type: true,
        }),
        Some(_) => None,
    })
}

pub fn satisfies(
    candidate: &MethodSet,
    required: &MethodSet,
) -> bool {
    missing_method(candidate, required).is_none()
}

/// 一对（主体, 接口）的判定结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Satisfaction {
    pub value: bool,
    pub pointer: bool,
}

impl Satisfaction {
    pub fn any(self) -> bool {
        self.value || self.pointer
    }
}

/// 排除规则：空接口不参与任何关系，主体不与同名（同限定名）接口配对
pub fn is_excluded(
    subject: &TypeEntry,
    iface: &TypeEntry,
) -> bool {
    iface.methods.is_empty()
        || (subject.package == iface.package && subject.name == iface.name)
}

/// 分别判定值变体与指针变体
///
/// `iface` 必须是接口条目；接口主体没有指针变体。
pub fn check(
    subject: &TypeEntry,
    iface: &TypeEntry,
) -> Satisfaction {
    if !iface.is_interface() || is_excluded(subject, iface) {
        return Satisfaction::default();
    }
    Satisfaction {
        value: satisfies(&subject.methods, &iface.methods),
        pointer: subject
            .pointer_methods()
            .is_some_and(|methods| satisfies(methods, &iface.methods)),
    }
}
