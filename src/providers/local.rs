//! Local filesystem provider

use crate::fs::Entry;
use crate::location::Location;
use super::{Enumerator, ListContext, ProviderError, ProviderResult};

/// Provider for local directory listings
#[derive(Debug, Default)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Enumerator for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    // Cancellation isn't checked here; a single read_dir is assumed fast.
    fn list_directory(
        &mut self,
        location: &Location,
        _ctx: &ListContext<'_>,
    ) -> ProviderResult<Vec<Entry>> {
        let Some(path) = location.as_path() else {
            return Err(ProviderError::InvalidLocation(format!(
                "'{}' is not a local path",
                location
            )));
        };
        crate::fs::read_directory(path).map_err(ProviderError::from)
    }
}
