//! Collaborator implementations used by the CLI
//!
//! - [`JsonFileDashboardStore`]: dashboards from a JSON file
//! - [`StaticDataSourceDirectory`]: data sources from configuration
//! - [`CachedDirectory`]: caching wrapper for any directory
//! - [`HttpExecutionEngine`]: execution engine over HTTP

mod directory;
mod file_store;
mod http_engine;

pub use directory::{CachedDirectory, StaticDataSourceDirectory};
pub use file_store::JsonFileDashboardStore;
pub use http_engine::HttpExecutionEngine;
