use std::sync::Arc;

use super::Workspace;
use crate::analysis::{extract, Direction};
use crate::frontend::module::ResolveError;

const FOO: &str = r#"package foo

type Fooer interface {
	Foo()
}

type Empty interface{}

type Bar struct{}

func (Bar) Foo() {}

type Baz struct{ n int }

func (b *Baz) Foo() { b.n++ }
"#;

fn foo_workspace() -> Workspace {
    Workspace::new().file("example.com/foo/foo.go", FOO)
}

#[test]
fn test_value_receiver_implements_both_variants() {
    let analysis = foo_workspace().run("example.com/foo", "example.com/foo", Direction::Forward);
    let text = analysis.report.to_string();
    assert!(text.contains("example.com/foo.Bar implements...\n\texample.com/foo.Fooer\n"));
    assert!(text.contains("*example.com/foo.Bar implements...\n\texample.com/foo.Fooer\n"));
    assert!(analysis.failures.is_empty());
}

#[test]
fn test_pointer_receiver_implements_pointer_only() {
    let analysis = foo_workspace().run("example.com/foo", "example.com/foo", Direction::Forward);
    let text = analysis.report.to_string();
    assert!(text.contains("*example.com/foo.Baz implements...\n\texample.com/foo.Fooer\n"));
    assert!(!text.contains("\nexample.com/foo.Baz implements"));
}

#[test]
fn test_empty_and_self_never_listed() {
    let ws = foo_workspace();
    for direction in [Direction::Forward, Direction::Reverse] {
        let text = ws.run("example.com/foo", "example.com/foo", direction).report.to_string();
        assert!(!text.contains("Empty"), "{}", text);
        assert!(!text.contains("foo.Fooer implements"), "{}", text);
    }
}

#[test]
fn test_bad_subject_reports_one_failure() {
    let analysis = foo_workspace().run("example.com/foo", "example.com/missing", Direction::Forward);
    assert_eq!(analysis.failures.len(), 1);
    assert!(analysis.report.is_empty());
    assert_eq!(analysis.subject_count, 0);
    let line = analysis.failures[0].to_string();
    assert!(
        line.starts_with("Couldn't import example.com/missing: cannot find package"),
        "{}",
        line
    );
}

#[test]
fn test_failures_deduplicated_in_first_seen_order() {
    let analysis = foo_workspace().run(
        "example.com/zzz,example.com/foo",
        "example.com/aaa,example.com/zzz",
        Direction::Forward,
    );
    let paths: Vec<_> = analysis.failures.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["example.com/zzz", "example.com/aaa"]);
}

#[test]
fn test_reverse_lists_value_before_pointer() {
    let analysis = foo_workspace().run("example.com/foo", "example.com/foo", Direction::Reverse);
    assert_eq!(
        analysis.report.to_string(),
        "example.com/foo.Fooer is implemented by...\n\
         \texample.com/foo.Bar\n\
         \t*example.com/foo.Bar\n\
         \t*example.com/foo.Baz\n"
    );
}

#[test]
fn test_forward_and_reverse_agree() {
    let ws = foo_workspace().file(
        "example.com/rw/rw.go",
        r#"package rw

import "example.com/foo"

type Reader interface{ Read(p []byte) (n int, err error) }
type ReadFooer interface {
	Reader
	foo.Fooer
}

type File struct{ foo.Bar }

func (f *File) Read(p []byte) (int, error) { return 0, nil }
"#,
    );
    let forward = ws.run("example.com/...", "example.com/...", Direction::Forward);
    let reverse = ws.run("example.com/...", "example.com/...", Direction::Reverse);

    let mut pairs_forward = Vec::new();
    for group in &forward.report.groups {
        let subject = group.heading.trim_end_matches(" implements...");
        for iface in &group.entries {
            pairs_forward.push((subject.to_string(), iface.clone()));
        }
    }
    let mut pairs_reverse = Vec::new();
    for group in &reverse.report.groups {
        let iface = group.heading.trim_end_matches(" is implemented by...");
        for subject in &group.entries {
            pairs_reverse.push((subject.clone(), iface.to_string()));
        }
    }
    pairs_forward.sort();
    pairs_reverse.sort();
    assert_eq!(pairs_forward, pairs_reverse);
    assert!(pairs_forward.contains(&(
        "*example.com/rw.File".to_string(),
        "example.com/rw.ReadFooer".to_string()
    )));
    assert!(pairs_forward.contains(&(
        "example.com/rw.File".to_string(),
        "example.com/foo.Fooer".to_string()
    )));
}

#[test]
fn test_unexported_methods_do_not_cross_packages() {
    let ws = Workspace::new()
        .file(
            "a/a.go",
            "package a\n\ntype closer interface{ close() }\n\ntype Local struct{}\n\nfunc (Local) close() {}\n",
        )
        .file(
            "b/b.go",
            "package b\n\ntype Remote struct{}\n\nfunc (Remote) close() {}\n",
        );
    let text = ws.run("a", "a,b", Direction::Reverse).report.to_string();
    assert_eq!(text, "a.closer is implemented by...\n\ta.Local\n\t*a.Local\n");
}

#[test]
fn test_shared_identity_across_resolutions() {
    let ws = foo_workspace().file(
        "example.com/use/use.go",
        "package use\n\nimport \"example.com/foo\"\n\ntype Alias = foo.Bar\n",
    );
    let mut resolver = ws.resolver();
    let using = resolver.resolve("example.com/use").unwrap();
    let direct = resolver.resolve("example.com/foo").unwrap();
    let again = resolver.resolve("example.com/foo").unwrap();
    assert!(Arc::ptr_eq(&direct, &again));

    let foo_entries = extract(&direct, resolver.types());
    let use_entries = extract(&using, resolver.types());
    let bar = foo_entries.iter().find(|e| e.name == "Bar").unwrap();
    assert_eq!(use_entries[0].name, "Alias");
    assert_eq!(use_entries[0].id, bar.id);
}

#[test]
fn test_identical_runs_identical_output() {
    let ws = foo_workspace();
    let first = ws.run("example.com/foo", "example.com/foo", Direction::Forward);
    let second = ws.run("example.com/foo", "example.com/foo", Direction::Forward);
    assert_eq!(first.report.to_string(), second.report.to_string());
}

#[test]
fn test_type_errors_surface_as_failures() {
    let ws = Workspace::new().file(
        "broken/broken.go",
        "package broken\n\ntype T struct{ x Undefined }\n",
    );
    let analysis = ws.run("broken", "broken", Direction::Forward);
    assert_eq!(analysis.failures.len(), 1);
    assert!(matches!(
        analysis.failures[0].error,
        ResolveError::TypeResolution { .. }
    ));
}

#[test]
fn test_array_lengths_match_across_packages() {
    let ws = Workspace::new()
        .file(
            "a/a.go",
            "package a\n\nconst Size = 16\n\ntype Hasher interface{ Sum() [Size]byte }\n",
        )
        .file(
            "c/c.go",
            r#"package c

import "a"

type H struct{}

func (H) Sum() [a.Size]byte { return [a.Size]byte{} }

type G struct{}

func (*G) Sum() [16]byte { return [16]byte{} }

type Short struct{}

func (Short) Sum() [8]byte { return [8]byte{} }
"#,
        );
    let analysis = ws.run("a", "c", Direction::Forward);
    assert!(analysis.failures.is_empty(), "{:?}", analysis.failures);
    assert_eq!(
        analysis.report.to_string(),
        "c.H implements...\n\
         \ta.Hasher\n\
         *c.H implements...\n\
         \ta.Hasher\n\
         *c.G implements...\n\
         \ta.Hasher\n"
    );
}

#[test]
fn test_malformed_array_length_fails_one_package() {
    let ws = foo_workspace().file("p/p.go", "package p\n\ntype A [x)]int\n");
    let analysis = ws.run("example.com/foo", "p,example.com/foo", Direction::Forward);
    assert_eq!(analysis.failures.len(), 1);
    assert_eq!(analysis.failures[0].path, "p");
    assert!(matches!(
        analysis.failures[0].error,
        ResolveError::Parse { .. }
    ));
    assert!(analysis
        .report
        .to_string()
        .contains("*example.com/foo.Baz implements..."));
}
