//! implements
//!
//! Answers structural-typing queries over Go source: which named types
//! satisfy which interfaces, judged purely by method sets.
//!
//! # Example
//!
//! ```no_run
//! use implements::{query, Direction, Result};
//! use implements::util::config::{Config, Overrides};
//!
//! fn main() -> Result<()> {
//!     let config = Config::load(&Overrides::default())?;
//!     let analysis = query(&config, "io", "os", Direction::Forward);
//!     print!("{}", analysis.report);
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]

// Public modules
pub mod analysis;
pub mod frontend;

// Utility modules
pub mod util;

// Re-exports
pub use analysis::{Analysis, Direction, Query, Report};
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use tracing::debug;

use crate::util::config::Config;

/// Tool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name
pub const NAME: &str = "implements";

/// Run one query with a fresh resolver built from `config`
///
/// Patterns are comma-separated package patterns (`std`, `all`, `x/...`, import paths).
pub fn query(
    config: &Config,
    interfaces: &str,
    types: &str,
    direction: Direction,
) -> Analysis {
    let mut resolver = config.resolver();
    let query = Query::from_patterns(interfaces, types, direction, resolver.locator());
    debug!(
        interfaces = query.interfaces.len(),
        types = query.types.len(),
        "expanded package patterns"
    );
    analysis::analyze(&mut resolver, &query)
}
