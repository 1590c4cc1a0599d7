//! Background listing worker
//!
//! A single long-lived thread lists one location at a time. Requests are
//! not queued: a newer request replaces the pending one, and when a
//! superseded listing finishes its result is thrown away. The shared lock
//! is released while a provider runs, so callers can check readiness or
//! cancel during slow network I/O.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::fs::Entry;
use crate::location::Location;
use crate::providers::{Enumerator, ListContext, ProviderError, ProviderResult};

/// What the worker thread is doing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a new request
    #[default]
    Idle,
    /// Running a provider
    Running,
    /// Told to stop; the thread is exiting or gone
    Stopping,
}

/// State guarded by the shared lock
#[derive(Default)]
struct Inner {
    /// Location waiting to be (or being) listed
    pending: Option<Location>,
    /// Bumped on every request
    requested: u64,
    /// Last request generation the worker picked up
    taken: u64,
    stop: bool,
    /// Snapshot reflects the current request
    ready: bool,
    /// Current location is synthetic; listings are empty
    synthetic: bool,
    /// Last completed listing
    snapshot: Vec<Entry>,
    /// Why the current request produced no listing
    last_error: Option<String>,
    user_agent: String,
    state: WorkerState,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Worker waits here for requests
    wake: Condvar,
    /// Callers wait here for a request to settle
    settled: Condvar,
    /// Checked by providers between network phases
    cancel: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The backends a worker dispatches to, by location kind
struct Providers {
    local: Box<dyn Enumerator>,
    remote: Box<dyn Enumerator>,
}

impl Providers {
    fn enumerate(&mut self, location: &Location, ctx: &ListContext<'_>) -> ProviderResult<Vec<Entry>> {
        let provider = match location {
            Location::Empty => return Ok(Vec::new()),
            Location::Remote(_) => &mut self.remote,
            Location::Local(_) => &mut self.local,
        };
        tracing::debug!("listing {} via {}", location, provider.name());
        provider.list_directory(location, ctx)
    }
}

/// Owns the background listing thread and the state it publishes.
///
/// The thread is started lazily by `start()` and joined on `stop()` or drop.
pub struct ListingWorker {
    shared: Arc<Shared>,
    providers: Option<Providers>,
    handle: Option<JoinHandle<()>>,
}

impl ListingWorker {
    pub fn new(local: Box<dyn Enumerator>, remote: Box<dyn Enumerator>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                wake: Condvar::new(),
                settled: Condvar::new(),
                cancel: AtomicBool::new(false),
            }),
            providers: Some(Providers { local, remote }),
            handle: None,
        }
    }

    /// Spawn the worker thread (no-op once running)
    pub fn start(&mut self) -> io::Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let Some(providers) = self.providers.take() else {
            return Err(io::Error::other("listing worker already stopped"));
        };

        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("PathBrowser".to_string())
            .spawn(move || run(shared, providers))
        {
            Ok(handle) => {
                tracing::info!("listing worker started");
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                let mut inner = self.shared.lock();
                inner.pending = None;
                inner.last_error = Some(format!("could not start listing worker: {}", e));
                self.shared.settled.notify_all();
                Err(e)
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    /// Make `location` the one pending request, superseding any other
    pub fn request(&self, location: Location) {
        let mut inner = self.shared.lock();
        inner.ready = false;
        inner.synthetic = false;
        inner.last_error = None;
        inner.requested += 1;
        inner.pending = Some(location);
        self.shared.cancel.store(false, Ordering::Relaxed);
        self.shared.wake.notify_all();
    }

    /// Abandon the pending request without queuing another
    pub fn cancel(&self) {
        let mut inner = self.shared.lock();
        self.shared.cancel.store(true, Ordering::Relaxed);
        if inner.pending.take().is_some() {
            inner.last_error = Some(ProviderError::Canceled.to_string());
        }
        self.shared.wake.notify_all();
        self.shared.settled.notify_all();
    }

    /// Mark the current location as synthetic: ready, with nothing in it
    pub fn mark_synthetic(&self) {
        let mut inner = self.shared.lock();
        inner.ready = true;
        inner.synthetic = true;
        inner.last_error = None;
        self.shared.settled.notify_all();
    }

    /// Whether a request is pending or running
    pub fn is_active(&self) -> bool {
        self.shared.lock().pending.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.shared.lock().ready
    }

    pub fn state(&self) -> WorkerState {
        self.shared.lock().state
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error.clone()
    }

    pub fn set_user_agent(&self, user_agent: &str) {
        self.shared.lock().user_agent = user_agent.to_string();
    }

    /// Copy of the last published listing, whatever location it belongs to
    pub fn snapshot(&self) -> Vec<Entry> {
        self.shared.lock().snapshot.clone()
    }

    /// Block until the current request settles or `cancel` is raised.
    ///
    /// Returns the entries accepted by `keep` when the listing is ready,
    /// and nothing when it failed, was canceled, or the location is synthetic.
    /// `slice` bounds each wait so the caller's flag is re-checked.
    pub fn wait_listing<F>(&self, cancel: Option<&AtomicBool>, slice: Duration, keep: F) -> Vec<Entry>
    where
        F: Fn(&Entry) -> bool,
    {
        let raised = || cancel.is_some_and(|c| c.load(Ordering::Relaxed));

        let mut inner = self.shared.lock();
        while !inner.ready && inner.last_error.is_none() && !raised() {
            inner = self
                .shared
                .settled
                .wait_timeout(inner, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        if !inner.ready || inner.synthetic {
            return Vec::new();
        }
        inner.snapshot.iter().filter(|&e| keep(e)).cloned().collect()
    }

    /// Stop the thread and wait for it to exit
    pub fn stop(&mut self) {
        {
            let mut inner = self.shared.lock();
            inner.stop = true;
            inner.state = WorkerState::Stopping;
            self.shared.cancel.store(true, Ordering::Relaxed);
            self.shared.wake.notify_all();
            self.shared.settled.notify_all();
        }

        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("listing worker panicked");
        }
        self.providers = None;
    }
}

impl Drop for ListingWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker thread body
fn run(shared: Arc<Shared>, mut providers: Providers) {
    let mut inner = shared.lock();

    loop {
        while inner.requested == inner.taken && !inner.stop {
            inner.state = WorkerState::Idle;
            inner = shared.wake.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }
        if inner.stop {
            break;
        }

        let generation = inner.requested;
        inner.taken = generation;
        // Canceled before we got to it
        let Some(location) = inner.pending.clone() else {
            continue;
        };
        let user_agent = inner.user_agent.clone();
        inner.state = WorkerState::Running;
        drop(inner);

        let ctx = ListContext {
            user_agent: &user_agent,
            cancel: &shared.cancel,
        };
        let result = providers.enumerate(&location, &ctx);

        inner = shared.lock();
        if inner.requested != generation || inner.pending.as_ref() != Some(&location) {
            tracing::debug!("dropping superseded listing of {}", location);
            continue;
        }

        inner.pending = None;
        match result {
            Ok(_) if shared.cancel.load(Ordering::Relaxed) => {
                inner.last_error = Some(ProviderError::Canceled.to_string());
            }
            Ok(entries) => {
                tracing::debug!("published {} entries for {}", entries.len(), location);
                inner.snapshot = entries;
                inner.ready = true;
            }
            Err(e) => {
                tracing::warn!("listing {} failed: {}", location, e);
                inner.last_error = Some(e.to_string());
            }
        }
        shared.settled.notify_all();
    }

    inner.state = WorkerState::Stopping;
    tracing::info!("listing worker stopped");
}
