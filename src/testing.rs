//! Test doubles, local HTTP servers and helpers shared by the unit tests

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex, Once};
use std::thread;
use std::time::{Duration, Instant};

use crate::fs::Entry;
use crate::location::Location;
use crate::providers::{Enumerator, ListContext, ProviderError, ProviderResult};

static LOGGING_INIT: Once = Once::new();

/// Route tracing output to the test harness (filtered by RUST_LOG)
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Poll `cond` until it holds, failing the test after a few seconds
pub fn wait_until(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Counting latch: each gated listing consumes one permit before returning
pub struct Gate {
    permits: Mutex<usize>,
    cv: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            permits: Mutex::new(0),
            cv: Condvar::new(),
        })
    }

    pub fn release(&self, n: usize) {
        *self.permits.lock().unwrap() += n;
        self.cv.notify_all();
    }

    /// Take a permit; gives up (false) once `ctx` is canceled
    fn acquire(&self, ctx: &ListContext<'_>) -> bool {
        let mut permits = self.permits.lock().unwrap();
        loop {
            if *permits > 0 {
                *permits -= 1;
                return true;
            }
            if ctx.cancel.load(Ordering::Relaxed) {
                return false;
            }
            permits = self
                .cv
                .wait_timeout(permits, Duration::from_millis(2))
                .unwrap()
                .0;
        }
    }
}

/// Enumerator that lists `<name>.iso` and `<name>.txt` for any location,
/// where `<name>` is the location's last segment. Locations containing
/// "fail" produce an error.
pub struct ScriptedEnumerator {
    gate: Option<Arc<Gate>>,
    calls: Arc<Mutex<Vec<Location>>>,
}

impl ScriptedEnumerator {
    pub fn new() -> Self {
        Self {
            gate: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Block every listing on `gate`
    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Locations listed so far, in order
    pub fn calls(&self) -> Arc<Mutex<Vec<Location>>> {
        Arc::clone(&self.calls)
    }
}

impl Enumerator for ScriptedEnumerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn list_directory(
        &mut self,
        location: &Location,
        ctx: &ListContext<'_>,
    ) -> ProviderResult<Vec<Entry>> {
        self.calls.lock().unwrap().push(location.clone());

        if let Some(gate) = &self.gate
            && !gate.acquire(ctx)
        {
            return Err(ProviderError::Canceled);
        }

        let display = location.to_visual_string();
        if display.contains("fail") {
            return Err(ProviderError::InvalidLocation(display));
        }

        let stem = display
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(["iso", "txt"]
            .iter()
            .map(|ext| {
                let name = format!("{}.{}", stem, ext);
                Entry::remote(&name, location.join(&name))
            })
            .collect())
    }
}

/// Read one request head off `stream`
fn read_request(stream: &mut TcpStream) -> String {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
    }
    String::from_utf8_lossy(&request).into_owned()
}

/// Serve one canned response on a local port; the handle yields the raw request
pub fn serve_once(response: String) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });
    (format!("http://{}", addr), handle)
}

/// Accept one connection, send `head` (if any), then go quiet.
///
/// The connection stays open until the returned sender is dropped.
pub fn serve_stalled(head: Option<String>) -> (String, Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (release, released) = mpsc::channel::<()>();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        read_request(&mut stream);
        if let Some(head) = head {
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.flush();
        }
        let _ = released.recv();
    });
    (format!("http://{}", addr), release)
}

pub fn http_response(status: &str, content_type: Option<&str>, body: &str) -> String {
    let mut out = format!("HTTP/1.1 {}\r\n", status);
    if let Some(ct) = content_type {
        out.push_str(&format!("Content-Type: {}\r\n", ct));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    out
}
