//! Listing providers for different backends
//!
//! Providers turn a `Location` into entries:
//! - Local filesystem directories
//! - Remote HTTP directory listings (plain text or auto-index HTML)

mod http;
mod local;

pub use http::{
    ACCEPT_LISTING, CONNECT_ATTEMPTS, CONNECT_TIMEOUT, HttpProvider, ListingFormat, REQUEST_TIMEOUT,
    parse_listing, quoted_strings,
};
pub use local::LocalProvider;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::fs::Entry;
use crate::location::Location;

use thiserror::Error;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
    #[error("Connection error: {0}")]
    Transport(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Listing canceled")]
    Canceled,
    #[error("Empty listing: {0}")]
    EmptyResult(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Per-call inputs shared by every provider
#[derive(Debug, Clone, Copy)]
pub struct ListContext<'a> {
    /// Sent as the User-Agent header by network providers
    pub user_agent: &'a str,
    /// Raised by the caller to abandon the listing early
    pub cancel: &'a AtomicBool,
}

impl ListContext<'_> {
    pub fn is_canceled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// `Err(Canceled)` once the cancel flag is up
    pub fn check_canceled(&self) -> ProviderResult<()> {
        if self.is_canceled() {
            Err(ProviderError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Trait for listing backends
///
/// Implementors list the direct children of a location synchronously.
/// They run on the background worker thread, never on the caller's.
pub trait Enumerator: Send {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// List directory contents (non-recursive)
    fn list_directory(
        &mut self,
        location: &Location,
        ctx: &ListContext<'_>,
    ) -> ProviderResult<Vec<Entry>>;
}
