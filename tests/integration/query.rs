//! End-to-end queries through the binary

use crate::support::{foo_tree, stderr, stdout};

#[test]
fn test_forward_report() {
    let tree = foo_tree();
    let output = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/foo",
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "example.com/foo.Bar implements...\n\
         \texample.com/foo.Fooer\n\
         *example.com/foo.Bar implements...\n\
         \texample.com/foo.Fooer\n\
         *example.com/foo.Baz implements...\n\
         \texample.com/foo.Fooer\n"
    );
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_reverse_report() {
    let tree = foo_tree();
    let output = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/foo",
        "--reverse",
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "example.com/foo.Fooer is implemented by...\n\
         \texample.com/foo.Bar\n\
         \t*example.com/foo.Bar\n\
         \t*example.com/foo.Baz\n"
    );
}

#[test]
fn test_unresolvable_subject_reported_on_stderr() {
    let tree = foo_tree();
    let output = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/missing",
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert_eq!(err.matches("Couldn't import example.com/missing").count(), 1, "{}", err);
}

#[test]
fn test_partial_failure_keeps_other_results() {
    let tree = foo_tree();
    let output = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/missing,example.com/foo",
    ]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("Couldn't import example.com/missing"));
    assert!(stdout(&output).contains("*example.com/foo.Baz implements..."));
}

#[test]
fn test_wildcard_patterns() {
    let tree = foo_tree();
    tree.file(
        "src/example.com/bar/bar.go",
        "package bar\n\ntype Thing struct{}\n\nfunc (*Thing) Foo() {}\n",
    );
    let output = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/...",
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("*example.com/bar.Thing implements...\n\texample.com/foo.Fooer\n"));
}

#[test]
fn test_repeated_runs_are_identical() {
    let tree = foo_tree();
    let args = [
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/foo",
        "--reverse",
    ];
    let first = tree.run(&args);
    let second = tree.run(&args);
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(first.stderr, second.stderr);
}

#[test]
fn test_build_tags_select_files() {
    let tree = foo_tree();
    tree.file(
        "src/example.com/tagged/impl.go",
        "//go:build special\n\npackage tagged\n\ntype T struct{}\n\nfunc (T) Foo() {}\n",
    );
    tree.file("src/example.com/tagged/doc.go", "package tagged\n");

    let without = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/tagged",
    ]);
    assert!(stdout(&without).is_empty());

    let with = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/tagged",
        "--tags",
        "special",
    ]);
    assert!(stdout(&with).contains("example.com/tagged.T implements..."));
}
