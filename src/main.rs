//! pb - list a local directory or HTTP index from the command line
//!
//! Usage: pb [--config FILE] [--timeout SECS] <location> [filter]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use pathbrowser::{AppError, AppResult, Config, Entry, Location, PathBrowser};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "pb [--config FILE] [--timeout SECS] <location> [filter]";

/// Parsed command line
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    timeout: Option<Duration>,
    location: String,
    filter: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> AppResult<Args> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| AppError::Usage("--config needs a file".to_string()))?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--timeout" => {
                let secs = args
                    .next()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(|| AppError::Usage("--timeout needs a number of seconds".to_string()))?;
                parsed.timeout = Some(Duration::from_secs(secs));
            }
            "-h" | "--help" => return Err(AppError::Usage(USAGE.to_string())),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    parsed.location = positional
        .next()
        .ok_or_else(|| AppError::Usage(USAGE.to_string()))?;
    parsed.filter = positional.next();
    if positional.next().is_some() {
        return Err(AppError::Usage(USAGE.to_string()));
    }
    Ok(parsed)
}

fn format_entry(entry: &Entry) -> String {
    if entry.is_dir {
        format!("{}/", entry.bare_name())
    } else {
        format!("{:<40} {:>12}", entry.name, entry.size)
    }
}

fn run(args: Args) -> AppResult<bool> {
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load(),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    if let Some(timeout) = args.timeout {
        let cancel = Arc::clone(&cancel);
        thread::Builder::new()
            .name("pb-timeout".to_string())
            .spawn(move || {
                thread::sleep(timeout);
                cancel.store(true, Ordering::Relaxed);
            })?;
    }

    let mut browser = PathBrowser::with_config(&config);
    browser.set_path(Location::parse(&args.location));

    let entries = browser.get_listing(args.filter.as_deref(), Some(&cancel));
    println!("{}", browser.get_friendly_path());

    if !browser.is_listing_ready() {
        if cancel.load(Ordering::Relaxed) {
            eprintln!("pb: timed out");
            browser.reset_pending();
        } else if let Some(err) = browser.last_error() {
            eprintln!("pb: {}", err);
        }
        return Ok(false);
    }

    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(true)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = parse_args(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(AppError::Usage(msg)) => {
            eprintln!("usage: {}", msg);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("pb: {}", e);
            ExitCode::FAILURE
        }
    }
}
