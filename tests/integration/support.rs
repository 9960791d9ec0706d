//! Shared helpers for driving the `implements` binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper function to get the path to the implements binary
pub fn implements_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test executable name
    path.pop(); // Remove "deps"
    path.push("implements");
    path
}

/// A scratch directory laid out as source roots
pub struct Tree {
    pub dir: TempDir,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the tree root
    pub fn file(
        &self,
        rel: &str,
        content: &str,
    ) -> &Self {
        let path = self.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    /// A command isolated from the user's environment and config files
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(implements_bin());
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("APPDATA")
            .env_remove("GOROOT")
            .env_remove("IMPLEMENTS_STD_ROOT")
            .env_remove("IMPLEMENTS_PATH")
            .env_remove("IMPLEMENTS_INDEX_DIR");
        cmd
    }

    /// Run with the tree's `src` directory as the only workspace root
    pub fn run(
        &self,
        args: &[&str],
    ) -> Output {
        self.command()
            .arg("--root")
            .arg(self.path().join("src"))
            .args(args)
            .output()
            .unwrap()
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub const FOO: &str = r#"package foo

type Fooer interface {
	Foo()
}

type Empty interface{}

type Bar struct{}

func (Bar) Foo() {}

type Baz struct{ n int }

func (b *Baz) Foo() { b.n++ }
"#;

/// Tree holding `example.com/foo`
pub fn foo_tree() -> Tree {
    let tree = Tree::new();
    tree.file("src/example.com/foo/foo.go", FOO);
    tree
}
