//! Cancelable background directory listings for local paths and HTTP indexes
//!
//! `PathBrowser` is the entry point: navigate with `set_path`/`navigate`,
//! then collect entries with `get_listing`.

pub mod browser;
pub mod config;
pub mod errors;
pub mod filter;
pub mod fs;
pub mod location;
pub mod providers;
pub mod worker;

#[cfg(test)]
mod testing;

pub use browser::PathBrowser;
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use fs::Entry;
pub use location::Location;
pub use providers::{Enumerator, ListContext, ProviderError, ProviderResult};
