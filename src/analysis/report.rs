//! 关系报告
//!
//! 在（接口全集 × 主体集合）上运行判定，并按方向分组。
//! 报告本身是数据，文本渲染由 `Display` 完成。

use std::fmt;

use super::matcher::check;
use super::universe::TypeEntry;

/// 遍历方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// 每个主体实现了哪些接口
    #[default]
    Forward,
    /// 每个接口被哪些主体实现
    Reverse,
}

/// 一组结果：标题行加若干条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub heading: String,
    pub entries: Vec<String>,
}

/// 报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub groups: Vec<Group>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 条目总数
    pub fn relation_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    fn push(
        &mut self,
        heading: String,
        entries: Vec<String>,
    ) {
        if !entries.is_empty() {
            self.groups.push(Group { heading, entries });
        }
    }
}

impl fmt::Display for Report {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for group in &self.groups {
            writeln!(f, "{}", group.heading)?;
            for entry in &group.entries {
                writeln!(f, "\t{}", entry)?;
            }
        }
        Ok(())
    }
}

/// 构建报告；`interfaces` 中的非接口条目被忽略
pub fn build(
    interfaces: &[TypeEntry],
    subjects: &[TypeEntry],
    direction: Direction,
) -> Report {
    let interfaces: Vec<&TypeEntry> = interfaces.iter().filter(|e| e.is_interface()).collect();
    match direction {
        Direction::Forward => forward(&interfaces, subjects),
        Direction::Reverse => reverse(&interfaces, subjects),
    }
}

fn forward(
    interfaces: &[&TypeEntry],
    subjects: &[TypeEntry],
) -> Report {
    let mut report = Report::default();
    for subject in subjects {
        let mut by_value = Vec::new();
        let mut by_pointer = Vec::new();
        for iface in interfaces {
            let result = check(subject, iface);
            if result.value {
                by_value.push(iface.qualified_name());
            }
            if result.pointer {
                by_pointer.push(iface.qualified_name());
            }
        }
        let name = subject.qualified_name();
        report.push(format!("{} implements...", name), by_value);
        report.push(format!("*{} implements...", name), by_pointer);
    }
    report
}

fn reverse(
    interfaces: &[&TypeEntry],
    subjects: &[TypeEntry],
) -> Report {
    let mut report = Report::default();
    for iface in interfaces {
        let mut implementers = Vec::new();
        for subject in subjects {
            let result = check(subject, iface);
            if result.value {
                implementers.push(subject.qualified_name());
            }
            if result.pointer {
                implementers.push(format!("*{}", subject.qualified_name()));
            }
        }
        report.push(
            format!("{} is implemented by...", iface.qualified_name()),
            implementers,
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::methodset::MethodSet;
    use crate::analysis::universe::EntryKind;
    use crate::frontend::typecheck::{MethodKey, NamedTypeId, Signature};

    fn methods(names: &[&str]) -> MethodSet {
        names
            .iter()
            .map(|n| (MethodKey::new(n, "p"), Signature::default()))
            .collect()
    }

    fn iface(
        name: &str,
        required: &[&str],
    ) -> TypeEntry {
        TypeEntry {
            package: "example.com/p".to_string(),
            name: name.to_string(),
            id: NamedTypeId(10),
            methods: methods(required),
            kind: EntryKind::Interface,
        }
    }

    fn concrete(
        name: &str,
        value: &[&str],
        pointer: &[&str],
    ) -> TypeEntry {
        TypeEntry {
            package: "example.com/p".to_string(),
            name: name.to_string(),
            id: NamedTypeId(20),
            methods: methods(value),
            kind: EntryKind::Concrete {
                pointer_methods: methods(pointer),
            },
        }
    }

    fn fixture() -> (Vec<TypeEntry>, Vec<TypeEntry>) {
        let interfaces = vec![iface("Fooer", &["Foo"]), iface("Empty", &[])];
        let subjects = vec![
            concrete("Bar", &["Foo"], &["Foo"]),
            concrete("Baz", &[], &["Foo"]),
            concrete("Qux", &[], &[]),
        ];
        (interfaces, subjects)
    }

    #[test]
    fn test_forward_rendering() {
        let (interfaces, subjects) = fixture();
        let report = build(&interfaces, &subjects, Direction::Forward);
        assert_eq!(
            report.to_string(),
            "example.com/p.Bar implements...\n\
             \texample.com/p.Fooer\n\
             *example.com/p.Bar implements...\n\
             \texample.com/p.Fooer\n\
             *example.com/p.Baz implements...\n\
             \texample.com/p.Fooer\n"
        );
        assert_eq!(report.relation_count(), 3);
    }

    #[test]
    fn test_reverse_rendering() {
        let (interfaces, subjects) = fixture();
        let report = build(&interfaces, &subjects, Direction::Reverse);
        assert_eq!(
            report.to_string(),
            "example.com/p.Fooer is implemented by...\n\
             \texample.com/p.Bar\n\
             \t*example.com/p.Bar\n\
             \t*example.com/p.Baz\n"
        );
    }

    #[test]
    fn test_concrete_entries_in_interface_list_ignored() {
        let (_, subjects) = fixture();
        let report = build(&subjects, &subjects, Direction::Forward);
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "");
    }
}
