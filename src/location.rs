//! Listable locations
//!
//! A `Location` says where a listing comes from:
//! - a local filesystem path
//! - a remote HTTP(S) URL serving a plain-text or auto-index listing
//! - nothing at all (`Empty`), used for virtual roots

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;

/// First character of a synthetic location. Such locations are never enumerated.
pub const SENTINEL: char = '!';

/// Where to list
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Location {
    /// Nothing to list yet
    #[default]
    Empty,
    /// Local filesystem path
    Local(PathBuf),
    /// HTTP or HTTPS URL, kept as written (validated when fetched)
    Remote(String),
}

impl Location {
    /// Classify a raw string: "" is `Empty`, http(s) URLs are `Remote`,
    /// anything else is a local path.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            Location::Empty
        } else if is_http_url(s) {
            Location::Remote(s.to_string())
        } else {
            Location::Local(PathBuf::from(s))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Location::Empty)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Remote(_))
    }

    /// True when the display form starts with the sentinel character
    pub fn is_synthetic(&self) -> bool {
        self.to_visual_string().starts_with(SENTINEL)
    }

    /// Parsed URL for remote locations
    pub fn url(&self) -> Option<Url> {
        match self {
            Location::Remote(raw) => Url::parse(raw).ok(),
            _ => None,
        }
    }

    /// Local path, if this is a local location
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Local(path) => Some(path),
            _ => None,
        }
    }

    /// Whether this is the top of its hierarchy
    pub fn is_root(&self) -> bool {
        match self {
            Location::Empty => true,
            Location::Local(path) => local_parent(path).is_none(),
            Location::Remote(raw) => Url::parse(raw)
                .map(|url| url.path() == "/")
                .unwrap_or(true),
        }
    }

    pub fn can_navigate_up(&self) -> bool {
        !self.is_empty() && !self.is_root()
    }

    /// The parent location, or a clone of `self` when already at the top
    pub fn navigate_up(&self) -> Location {
        if !self.can_navigate_up() {
            return self.clone();
        }

        match self {
            Location::Local(path) => match local_parent(path) {
                Some(parent) => Location::Local(parent.to_path_buf()),
                None => self.clone(),
            },
            Location::Remote(raw) => match Url::parse(raw) {
                Ok(mut url) => {
                    let trimmed = url.path().trim_end_matches('/');
                    let parent = match trimmed.rfind('/') {
                        Some(idx) => trimmed[..=idx].to_string(),
                        None => "/".to_string(),
                    };
                    url.set_path(&parent);
                    url.set_query(None);
                    url.set_fragment(None);
                    Location::Remote(url.to_string())
                }
                Err(_) => self.clone(),
            },
            Location::Empty => Location::Empty,
        }
    }

    /// Append a child segment
    pub fn join(&self, segment: &str) -> Location {
        match self {
            Location::Empty => Location::parse(segment),
            Location::Local(path) => Location::Local(path.join(segment)),
            Location::Remote(raw) => match Url::parse(raw) {
                Ok(mut url) => {
                    // Url::join replaces the last segment unless the base ends in '/'
                    if !url.path().ends_with('/') {
                        let dir = format!("{}/", url.path());
                        url.set_path(&dir);
                    }
                    // "C:" would otherwise parse as a URL with scheme "c"
                    let relative = if segment.split('/').next().is_some_and(|s| s.contains(':')) {
                        format!("./{}", segment)
                    } else {
                        segment.to_string()
                    };
                    url.join(&relative)
                        .map(|joined| Location::Remote(joined.to_string()))
                        .unwrap_or_else(|_| self.clone())
                }
                Err(_) => Location::Remote(format!("{}/{}", raw.trim_end_matches('/'), segment)),
            },
        }
    }

    /// Human-readable form used for display and prefix matching
    pub fn to_visual_string(&self) -> String {
        match self {
            Location::Empty => String::new(),
            Location::Local(path) => path.to_string_lossy().into_owned(),
            Location::Remote(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_visual_string())
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::Local(path)
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location::Local(path.to_path_buf())
    }
}

/// Parent of a local path, treating "" (parent of a bare relative name) as no parent
fn local_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn is_http_url(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(Location::parse(""), Location::Empty);
        assert!(Location::parse("http://example.com/").is_remote());
        assert!(Location::parse("HTTPS://example.com/iso/").is_remote());
        assert_eq!(
            Location::parse("/games"),
            Location::Local(PathBuf::from("/games"))
        );
    }

    #[test]
    fn test_synthetic() {
        assert!(Location::parse("!recent").is_synthetic());
        assert!(!Location::parse("/games/!weird").is_synthetic());
        assert!(!Location::Empty.is_synthetic());
    }

    #[cfg(unix)]
    #[test]
    fn test_local_navigation() {
        let loc = Location::parse("/games/psp");
        assert!(loc.can_navigate_up());
        assert_eq!(loc.navigate_up(), Location::parse("/games"));
        assert_eq!(loc.navigate_up().navigate_up(), Location::parse("/"));

        let root = Location::parse("/");
        assert!(root.is_root());
        assert!(!root.can_navigate_up());
        assert_eq!(root.navigate_up(), root);

        assert_eq!(loc.join("iso"), Location::parse("/games/psp/iso"));
    }

    #[test]
    fn test_relative_name_has_no_parent() {
        let loc = Location::parse("games");
        assert!(loc.is_root());
        assert_eq!(loc.navigate_up(), loc);
    }

    #[test]
    fn test_remote_navigation() {
        let loc = Location::parse("http://example.com/files/iso/");
        assert!(loc.can_navigate_up());
        assert_eq!(loc.navigate_up(), Location::parse("http://example.com/files/"));
        assert_eq!(
            loc.navigate_up().navigate_up(),
            Location::parse("http://example.com/")
        );

        let root = Location::parse("http://example.com/");
        assert!(root.is_root());
        assert_eq!(root.navigate_up(), root);
    }

    #[test]
    fn test_remote_join_keeps_directory() {
        let loc = Location::parse("http://example.com/files");
        assert_eq!(
            loc.join("sub/"),
            Location::parse("http://example.com/files/sub/")
        );
        assert_eq!(
            Location::parse("http://example.com/files/").join("a.iso"),
            Location::parse("http://example.com/files/a.iso")
        );
        assert_eq!(
            Location::parse("http://example.com/").join("C:"),
            Location::parse("http://example.com/C:")
        );
    }

    #[test]
    fn test_empty_join_parses_segment() {
        assert_eq!(Location::Empty.join("/games"), Location::parse("/games"));
        assert!(Location::Empty.is_root());
        assert!(!Location::Empty.can_navigate_up());
    }
}
