//! Filesystem module

pub mod entry;
pub mod ops;

pub use entry::Entry;
pub use ops::read_directory;
