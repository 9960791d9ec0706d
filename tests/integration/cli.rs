//! Command-line surface: usage, exit codes, configuration files

use crate::support::{foo_tree, stderr, stdout, Tree};

#[test]
fn test_help_exits_zero() {
    let tree = Tree::new();
    let output = tree.command().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("--interfaces"));
    assert!(text.contains("--types"));
    assert!(text.contains("--reverse"));
}

#[test]
fn test_missing_types_prints_usage_and_fails() {
    let tree = Tree::new();
    let output = tree.command().arg("--interfaces").arg("io").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("Usage"), "{}", err);
    assert!(err.contains("--types"), "{}", err);
}

#[test]
fn test_blank_types_counts_as_missing() {
    let tree = foo_tree();
    for blank in ["", "  "] {
        let output = tree.run(&["--interfaces", "example.com/foo", "--types", blank]);
        assert_eq!(output.status.code(), Some(1), "{:?}", blank);
        assert!(stdout(&output).is_empty());
        assert!(stderr(&output).contains("--types is required"));
    }
}

#[test]
fn test_unknown_flag_is_rejected() {
    let tree = Tree::new();
    let output = tree.command().arg("--bogus").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_missing_explicit_config_fails() {
    let tree = foo_tree();
    let output = tree.run(&[
        "--config",
        "nope.toml",
        "--types",
        "example.com/foo",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nope.toml"));
}

#[test]
fn test_project_config_supplies_roots_and_default_interfaces() {
    let tree = foo_tree();
    tree.file(
        "implements.toml",
        "[source]\nroots = [\"src\"]\n\n[query]\ndefault_interfaces = \"example.com/foo\"\n",
    );
    let output = tree
        .command()
        .args(["--types", "example.com/foo"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("*example.com/foo.Baz implements...\n\texample.com/foo.Fooer\n"));
}

#[test]
fn test_malformed_config_fails() {
    let tree = foo_tree();
    tree.file("implements.toml", "[source\nroots = 1\n");
    let output = tree.run(&["--types", "example.com/foo"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("implements.toml"));
}

#[test]
fn test_write_index_without_dir_warns() {
    let tree = foo_tree();
    let output = tree.run(&[
        "--interfaces",
        "example.com/foo",
        "--types",
        "example.com/foo",
        "--write-index",
    ]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("index directory"));
    assert!(!stdout(&output).is_empty());
}
