//! Path browser: navigation state on top of the listing worker
//!
//! `PathBrowser` tracks where the user is and asks the background worker
//! to list it. Navigation never blocks; `get_listing` waits for the
//! worker's result.
//!
//! The current location is written only through `&mut self`, so callers
//! that navigate from several threads must share the browser behind their
//! own lock. Readiness checks and listings only need `&self`.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::config::Config;
use crate::filter::NameFilter;
use crate::fs::Entry;
use crate::location::Location;
use crate::providers::{Enumerator, HttpProvider, LocalProvider};
use crate::worker::{ListingWorker, WorkerState};

pub struct PathBrowser {
    path: Location,
    worker: ListingWorker,
    /// (prefix, label) shown in place of a well-known root
    alias: Option<(String, String)>,
    home_dir: Option<String>,
    poll_interval: Duration,
}

impl Default for PathBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBrowser {
    /// Browser with default settings and the local/HTTP providers
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let remote = HttpProvider::with_limits(
            config.remote.connect_attempts,
            config.remote.connect_timeout(),
            config.remote.request_timeout(),
        );
        Self::with_enumerators(config, Box::new(LocalProvider::new()), Box::new(remote))
    }

    /// Browser with custom backends for local and remote locations
    pub fn with_enumerators(
        config: &Config,
        local: Box<dyn Enumerator>,
        remote: Box<dyn Enumerator>,
    ) -> Self {
        let worker = ListingWorker::new(local, remote);
        worker.set_user_agent(&config.browser.user_agent);
        Self {
            path: Location::Empty,
            worker,
            alias: config.display.alias(),
            home_dir: config.display.resolved_home_dir(),
            poll_interval: config.browser.poll_interval(),
        }
    }

    /// User-Agent for remote listings (applies from the next request on)
    pub fn set_user_agent(&mut self, user_agent: &str) {
        self.worker.set_user_agent(user_agent);
    }

    /// Show paths under `prefix` as `label` in `get_friendly_path`
    pub fn set_root_alias(&mut self, prefix: &str, label: &str) {
        self.alias = if prefix.is_empty() {
            None
        } else {
            Some((prefix.to_string(), label.to_string()))
        };
    }

    pub fn path(&self) -> &Location {
        &self.path
    }

    /// Jump to `location` and start listing it
    pub fn set_path(&mut self, location: Location) {
        self.path = location;
        self.handle_path();
    }

    /// Move relative to the current location.
    ///
    /// "." stays put, ".." goes up (and does nothing at the top), a drive
    /// spec like "D:" replaces a filesystem root outright, and anything else
    /// is appended as a child.
    pub fn navigate(&mut self, segment: &str) {
        match segment {
            "." => return,
            ".." => {
                if !self.can_navigate_up() {
                    return;
                }
                self.navigate_up();
            }
            _ if is_drive_spec(segment) && !self.path.is_remote() && self.path.is_root() => {
                self.path = Location::parse(segment);
            }
            _ => self.path = self.path.join(segment),
        }
        self.handle_path();
    }

    pub fn can_navigate_up(&self) -> bool {
        self.path.can_navigate_up()
    }

    /// Move to the parent without listing it; `navigate("..")` also lists
    pub fn navigate_up(&mut self) {
        self.path = self.path.navigate_up();
    }

    pub fn is_listing_ready(&self) -> bool {
        self.worker.is_ready()
    }

    /// Why the current location could not be listed, if it couldn't
    pub fn last_error(&self) -> Option<String> {
        self.worker.last_error()
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Entries of the current location whose names match `filter`.
    ///
    /// Blocks until the listing is ready, has failed, or `cancel` is raised.
    /// An empty result may therefore mean "canceled"; callers tell the
    /// cases apart by checking their own flag.
    pub fn get_listing(&self, filter: Option<&str>, cancel: Option<&AtomicBool>) -> Vec<Entry> {
        let filter = filter.map(NameFilter::parse).unwrap_or_default();
        self.worker
            .wait_listing(cancel, self.poll_interval, |entry| filter.matches(entry))
    }

    /// Drop the pending listing without starting another
    pub fn reset_pending(&self) {
        self.worker.cancel();
    }

    /// Display form of the current location, with the root alias or `~` applied
    pub fn get_friendly_path(&self) -> String {
        let display = self.path.to_visual_string();

        if let Some((prefix, label)) = &self.alias
            && let Some(rest) = display.strip_prefix(prefix.as_str())
        {
            return format!("{}{}", label, rest);
        }

        if let Some(home) = &self.home_dir
            && let Some(rest) = display.strip_prefix(home.as_str())
            && (rest.is_empty() || rest.starts_with(std::path::is_separator))
        {
            return format!("~{}", rest);
        }

        display
    }

    fn handle_path(&mut self) {
        if self.path.is_synthetic() {
            if self.worker.is_active() {
                self.worker.cancel();
            }
            self.worker.mark_synthetic();
            return;
        }

        tracing::debug!("requesting listing of {}", self.path);
        self.worker.request(self.path.clone());
        if let Err(e) = self.worker.start() {
            tracing::warn!("could not start listing worker: {}", e);
        }
    }
}

/// "X:"-style drive prefix
fn is_drive_spec(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
