//! 构建约束
//!
//! 决定目录中的哪些 `.go` 文件属于当前构建上下文：
//! 文件名规则、GOOS/GOARCH 后缀，以及 `//go:build` 表达式。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// 已知的 GOOS
const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// 满足 `unix` 标签的 GOOS
const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// 已知的 GOARCH
const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// 满足的最高 `go1.N` 发布标签
const LATEST_GO_MINOR: u32 = 22;

/// 构建上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo: bool,
    /// 额外的用户标签
    pub tags: Vec<String>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            goos: "linux".to_string(),
            goarch: "amd64".to_string(),
            cgo: false,
            tags: Vec::new(),
        }
    }
}

impl BuildContext {
    /// 标签是否被满足
    pub fn has_tag(
        &self,
        tag: &str,
    ) -> bool {
        if tag == self.goos || tag == self.goarch || tag == "gc" {
            return true;
        }
        match tag {
            "unix" => return UNIX_OS.contains(&self.goos.as_str()),
            "cgo" => return self.cgo,
            "linux" if self.goos == "android" => return true,
            "solaris" if self.goos == "illumos" => return true,
            "darwin" if self.goos == "ios" => return true,
            _ => {}
        }
        if let Some(minor) = tag.strip_prefix("go1.") {
            return minor.parse::<u32>().is_ok_and(|m| m <= LATEST_GO_MINOR);
        }
        self.tags.iter().any(|t| t == tag)
    }

    /// 文件名规则：`.go` 后缀、非测试文件、非 `_`/`.` 开头，GOOS/GOARCH 后缀匹配
    pub fn matches_file_name(
        &self,
        name: &str,
    ) -> bool {
        let Some(stem) = name.strip_suffix(".go") else {
            return false;
        };
        if stem.ends_with("_test") || name.starts_with('_') || name.starts_with('.') {
            return false;
        }

        let parts: Vec<&str> = stem.split('_').collect();
        let n = parts.len();
        if n >= 3 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.has_tag(parts[n - 2]) && self.has_tag(parts[n - 1]);
        }
        if n >= 2 {
            let last = parts[n - 1];
            if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
                return self.has_tag(last);
            }
        }
        true
    }

    /// 文件头部的构建约束是否满足
    ///
    /// 优先使用 `//go:build`；没有时回退到旧式 `// +build` 行。
    pub fn matches_source(
        &self,
        source: &str,
    ) -> bool {
        let mut plus_lines = Vec::new();
        let mut in_block = false;

        for line in source.lines() {
            let line = line.trim();
            if in_block {
                if line.contains("*/") {
                    in_block = false;
                }
                continue;
            }
            if line.is_empty() {
                continue;
            }
            if line.starts_with("/*") {
                in_block = !line.contains("*/");
                continue;
            }
            let Some(comment) = line.strip_prefix("//") else {
                break;
            };
            if let Some(expr) = comment.strip_prefix("go:build") {
                return match parse_expr(expr) {
                    Some(expr) => expr.eval(&|tag| self.has_tag(tag)),
                    None => {
                        warn!(line, "malformed //go:build line");
                        false
                    }
                };
            }
            if let Some(rest) = comment.trim_start().strip_prefix("+build") {
                plus_lines.push(rest.to_string());
            }
        }

        plus_lines.iter().all(|line| self.eval_plus_build(line))
    }

    /// `// +build a,b !c` ：空格为或，逗号为与
    fn eval_plus_build(
        &self,
        line: &str,
    ) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.has_tag(tag),
                None => self.has_tag(term),
            })
        })
    }

    /// 选出目录中参与构建的文件，按文件名排序
    pub fn select_files(
        &self,
        dir: &Path,
    ) -> io::Result<Vec<PathBuf>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if self.matches_file_name(&name) {
                names.push(name);
            }
        }
        names.sort();

        let mut files = Vec::new();
        for name in names {
            let path = dir.join(&name);
            let source = fs::read_to_string(&path)?;
            if self.matches_source(&source) {
                files.push(path);
            } else {
                debug!(file = %path.display(), "excluded by build constraint");
            }
        }
        Ok(files)
    }
}

/// 构建约束表达式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildExpr {
    Tag(String),
    Not(Box<BuildExpr>),
    And(Box<BuildExpr>, Box<BuildExpr>),
    Or(Box<BuildExpr>, Box<BuildExpr>),
}

impl BuildExpr {
    pub fn eval(
        &self,
        has_tag: &dyn Fn(&str) -> bool,
    ) -> bool {
        match self {
            BuildExpr::Tag(tag) => has_tag(tag),
            BuildExpr::Not(inner) => !inner.eval(has_tag),
            BuildExpr::And(a, b) => a.eval(has_tag) && b.eval(has_tag),
            BuildExpr::Or(a, b) => a.eval(has_tag) || b.eval(has_tag),
        }
    }
}

/// 解析 `//go:build` 之后的表达式
///
/// 优先级：`!` > `&&` > `||`
pub fn parse_expr(text: &str) -> Option<BuildExpr> {
    if !text.is_empty() && !text.starts_with([' ', '\t']) {
        return None;
    }
    let tokens = lex_expr(text)?;
    let mut pos = 0;
    let expr = parse_or(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return None;
    }
    Some(expr)
}

fn lex_expr(text: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' | ')' | '!' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '&' | '|' => {
                chars.next();
                if chars.next() != Some(c) {
                    return None;
                }
                tokens.push(format!("{}{}", c, c));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        tag.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(tag);
            }
            _ => return None,
        }
    }
    Some(tokens)
}

fn parse_or(
    tokens: &[String],
    pos: &mut usize,
) -> Option<BuildExpr> {
    let mut left = parse_and(tokens, pos)?;
    while tokens.get(*pos).is_some_and(|t| t == "||") {
        *pos += 1;
        let right = parse_and(tokens, pos)?;
        left = BuildExpr::Or(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_and(
    tokens: &[String],
    pos: &mut usize,
) -> Option<BuildExpr> {
    let mut left = parse_not(tokens, pos)?;
    while tokens.get(*pos).is_some_and(|t| t == "&&") {
        *pos += 1;
        let right = parse_not(tokens, pos)?;
        left = BuildExpr::And(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_not(
    tokens: &[String],
    pos: &mut usize,
) -> Option<BuildExpr> {
    let token = tokens.get(*pos)?;
    *pos += 1;
    match token.as_str() {
        "!" => Some(BuildExpr::Not(Box::new(parse_not(tokens, pos)?))),
        "(" => {
            let inner = parse_or(tokens, pos)?;
            if tokens.get(*pos).map(|t| t.as_str()) != Some(")") {
                return None;
            }
            *pos += 1;
            Some(inner)
        }
        ")" | "&&" | "||" => None,
        tag => Some(BuildExpr::Tag(tag.to_string())),
    }
}
