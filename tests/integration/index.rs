//! Export data written by one run and read back by the next

use std::fs;

use crate::support::{stdout, Tree};

const IO: &str = r#"package io

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Writer interface {
	Write(p []byte) (n int, err error)
}

type ReadWriter interface {
	Reader
	Writer
}
"#;

const FILE: &str = r#"package f

type File struct{}

func (*File) Read(p []byte) (int, error) { return 0, nil }
"#;

fn std_tree() -> Tree {
    let tree = Tree::new();
    tree.file("goroot/src/io/io.go", IO);
    tree.file("src/example.com/f/f.go", FILE);
    tree
}

#[test]
fn test_std_export_data_replaces_source() {
    let tree = std_tree();
    let std_root = tree.path().join("goroot/src");
    let index_dir = tree.path().join("idx");
    let args = |extra: &[&'static str]| {
        let mut args = vec![
            "--std-root".to_string(),
            std_root.display().to_string(),
            "--index-dir".to_string(),
            index_dir.display().to_string(),
            "--interfaces".to_string(),
            "io".to_string(),
            "--types".to_string(),
            "example.com/f".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        args
    };

    let first_args = args(&["--write-index"]);
    let first = tree.run(&first_args.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(first.status.success());
    assert_eq!(stdout(&first), "*example.com/f.File implements...\n\tio.Reader\n");
    assert!(index_dir.join("io.json").is_file());
    assert!(index_dir.join("example.com/f.json").is_file());

    fs::remove_dir_all(std_root.join("io")).unwrap();

    let second_args = args(&[]);
    let second = tree.run(&second_args.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(second.status.success());
    assert_eq!(stdout(&second), stdout(&first));
}

#[test]
fn test_never_trust_ignores_export_data() {
    let tree = std_tree();
    let std_root = tree.path().join("goroot/src");
    let index_dir = tree.path().join("idx");
    let std_root = std_root.display().to_string();
    let index_dir = index_dir.display().to_string();

    let first = tree.run(&[
        "--std-root",
        &std_root,
        "--index-dir",
        &index_dir,
        "--interfaces",
        "io",
        "--types",
        "example.com/f",
        "--write-index",
    ]);
    assert!(first.status.success());

    fs::remove_dir_all(tree.path().join("goroot/src/io")).unwrap();

    let second = tree.run(&[
        "--std-root",
        &std_root,
        "--index-dir",
        &index_dir,
        "--index-trust",
        "never",
        "--interfaces",
        "io",
        "--types",
        "example.com/f",
    ]);
    assert!(second.status.success());
    assert!(stdout(&second).is_empty());
    assert!(String::from_utf8_lossy(&second.stderr).contains("Couldn't import io"));
}
