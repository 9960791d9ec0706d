//! Configuration system
//!
//! Settings come from several layers, merged field by field.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high -> low):
//! 1. CLI arguments
//! 2. Environment variables (IMPLEMENTS_STD_ROOT or $GOROOT/src, IMPLEMENTS_PATH, IMPLEMENTS_INDEX_DIR)
//! 3. Project-level (implements.toml, or --config <file>)
//! 4. User-level (~/.config/implements/config.toml)
//! 5. Default values
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use implements::util::config::{Config, Overrides};
//!
//! let config = Config::load(&Overrides::default()).unwrap();
//! let resolver = config.resolver();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frontend::module::{
    BuildContext, ImportResolver, IndexTrust, PackageChoice, PackageLocator, ResolverOptions,
};

/// Project-level config file name
pub const PROJECT_CONFIG: &str = "implements.toml";

/// Contents of one TOML config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source: SourceSection,
    pub index: IndexSection,
    pub build: BuildSection,
    pub query: QuerySection,
}

/// `[source]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub std_root: Option<PathBuf>,
    pub roots: Option<Vec<PathBuf>>,
    pub package_choice: Option<PackageChoice>,
}

/// `[index]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexSection {
    pub dir: Option<PathBuf>,
    pub trust: Option<IndexTrust>,
}

/// `[build]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    pub goos: Option<String>,
    pub goarch: Option<String>,
    pub cgo: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// `[query]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuerySection {
    pub default_interfaces: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub std_root: Option<PathBuf>,
    pub roots: Vec<PathBuf>,
    pub index_dir: Option<PathBuf>,
    pub index_trust: Option<IndexTrust>,
    pub package_choice: Option<PackageChoice>,
    pub goos: Option<String>,
    pub goarch: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Effective configuration after merging all layers
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub std_root: Option<PathBuf>,
    pub roots: Vec<PathBuf>,
    pub package_choice: PackageChoice,
    pub index_dir: Option<PathBuf>,
    pub index_trust: IndexTrust,
    pub build: BuildContext,
    pub default_interfaces: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            std_root: None,
            roots: Vec::new(),
            package_choice: PackageChoice::default(),
            index_dir: None,
            index_trust: IndexTrust::default(),
            build: BuildContext::default(),
            default_interfaces: "std".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment and working directory
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Self::load_from(overrides, &cwd, &|key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit working directory and environment
    pub fn load_from(
        overrides: &Overrides,
        cwd: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = user_config_path(env) {
            if path.is_file() {
                config.apply_file(read_file(&path)?, &path);
            }
        }

        match &overrides.config_file {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound { path });
                }
                config.apply_file(read_file(&path)?, &path);
            }
            None => {
                let path = cwd.join(PROJECT_CONFIG);
                if path.is_file() {
                    config.apply_file(read_file(&path)?, &path);
                }
            }
        }

        config.apply_env(env);
        config.apply_overrides(overrides, cwd);
        Ok(config)
    }

    /// Apply one config file; relative paths are taken from the file's directory
    fn apply_file(
        &mut self,
        file: FileConfig,
        path: &Path,
    ) {
        let base = path.parent().unwrap_or(Path::new("."));

        if let Some(std_root) = file.source.std_root {
            self.std_root = Some(base.join(std_root));
        }
        if let Some(roots) = file.source.roots {
            self.roots = roots.into_iter().map(|r| base.join(r)).collect();
        }
        if let Some(choice) = file.source.package_choice {
            self.package_choice = choice;
        }
        if let Some(dir) = file.index.dir {
            self.index_dir = Some(base.join(dir));
        }
        if let Some(trust) = file.index.trust {
            self.index_trust = trust;
        }
        if let Some(goos) = file.build.goos {
            self.build.goos = goos;
        }
        if let Some(goarch) = file.build.goarch {
            self.build.goarch = goarch;
        }
        if let Some(cgo) = file.build.cgo {
            self.build.cgo = cgo;
        }
        if let Some(tags) = file.build.tags {
            self.build.tags = tags;
        }
        if let Some(interfaces) = file.query.default_interfaces {
            self.default_interfaces = interfaces;
        }
    }

    fn apply_env(
        &mut self,
        env: &dyn Fn(&str) -> Option<String>,
    ) {
        let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());

        if let Some(root) = non_empty("IMPLEMENTS_STD_ROOT") {
            self.std_root = Some(PathBuf::from(root));
        } else if let Some(goroot) = non_empty("GOROOT") {
            self.std_root = Some(PathBuf::from(goroot).join("src"));
        }
        if let Some(paths) = non_empty("IMPLEMENTS_PATH") {
            self.roots = std::env::split_paths(&paths).collect();
        }
        if let Some(dir) = non_empty("IMPLEMENTS_INDEX_DIR") {
            self.index_dir = Some(PathBuf::from(dir));
        }
    }

    fn apply_overrides(
        &mut self,
        overrides: &Overrides,
        cwd: &Path,
    ) {
        if let Some(std_root) = &overrides.std_root {
            self.std_root = Some(cwd.join(std_root));
        }
        if !overrides.roots.is_empty() {
            self.roots = overrides.roots.iter().map(|r| cwd.join(r)).collect();
        }
        if let Some(dir) = &overrides.index_dir {
            self.index_dir = Some(cwd.join(dir));
        }
        if let Some(trust) = overrides.index_trust {
            self.index_trust = trust;
        }
        if let Some(choice) = overrides.package_choice {
            self.package_choice = choice;
        }
        if let Some(goos) = &overrides.goos {
            self.build.goos = goos.clone();
        }
        if let Some(goarch) = &overrides.goarch {
            self.build.goarch = goarch.clone();
        }
        if let Some(tags) = &overrides.tags {
            self.build.tags = tags.clone();
        }
    }

    /// Package locator for this configuration
    pub fn locator(&self) -> PackageLocator {
        PackageLocator::new(self.std_root.clone(), self.roots.clone(), self.build.clone())
    }

    /// Import resolver for this configuration
    pub fn resolver(&self) -> ImportResolver {
        ImportResolver::new(
            self.locator(),
            ResolverOptions {
                index_dir: self.index_dir.clone(),
                index_trust: self.index_trust,
                package_choice: self.package_choice,
            },
        )
    }
}

/// Get the user config directory
pub fn config_dir(env: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(xdg_config) = env("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg_config).join("implements"));
    }

    if let Some(home) = env("HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(home).join(".config").join("implements"));
    }

    if let Some(appdata) = env("APPDATA").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(appdata).join("implements"));
    }

    None
}

/// Get the user config file path (~/.config/implements/config.toml)
pub fn user_config_path(env: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    config_dir(env).map(|dir| dir.join("config.toml"))
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config file not found: {}", .path.display())]
    NotFound { path: PathBuf },
}
