//! Listing entry representation

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::location::Location;

/// One row of a listing
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Display name (remote directories keep their trailing '/')
    pub name: String,
    /// Fully resolved location of the entry
    pub location: Location,
    /// Whether this is a directory
    pub is_dir: bool,
    /// Whether the entry exists
    pub exists: bool,
    /// File size in bytes (0 for directories and remote entries)
    pub size: u64,
    /// Whether the entry can be written (always false for remote entries)
    pub is_writable: bool,
    /// Last modification time, when known
    pub modified: Option<SystemTime>,
    /// Whether this is a hidden file (starts with '.' on Unix)
    pub is_hidden: bool,
}

impl Entry {
    /// Create an Entry from a local path
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        // Symlinks report their target's type and size
        let target_metadata = if metadata.is_symlink() {
            fs::metadata(path).ok()
        } else {
            Some(metadata.clone())
        };

        let is_dir = target_metadata.as_ref().is_some_and(|m| m.is_dir());
        let size = if is_dir {
            0
        } else {
            target_metadata.as_ref().map(|m| m.len()).unwrap_or(0)
        };
        let is_writable = target_metadata
            .as_ref()
            .is_some_and(|m| !m.permissions().readonly());

        #[cfg(windows)]
        let is_hidden = {
            use std::os::windows::fs::MetadataExt;
            const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
            metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
        };
        #[cfg(not(windows))]
        let is_hidden = name.starts_with('.');

        Ok(Self {
            name,
            location: Location::Local(path.to_path_buf()),
            is_dir,
            exists: true,
            size,
            is_writable,
            modified: metadata.modified().ok(),
            is_hidden,
        })
    }

    /// Create an entry harvested from a remote listing
    pub fn remote(name: &str, location: Location) -> Self {
        Self {
            name: name.to_string(),
            location,
            is_dir: name.ends_with('/'),
            exists: true,
            size: 0,
            is_writable: false,
            modified: None,
            is_hidden: name.starts_with('.'),
        }
    }

    /// Name without the trailing directory marker of remote listings
    pub fn bare_name(&self) -> &str {
        self.name.trim_end_matches('/')
    }
}
