//! # Lister
//!
//! Identify an archive or compressed stream from its header bytes and list
//! the names of the entries inside it, lazily.
//!
//! Detection matches a 512-byte header window against an ordered
//! [`Registry`] of formats. The matched format's adapter produces an
//! [`Entries`] sequence that decodes nothing until asked for the next entry,
//! so listing the first few names of a large compressed tarball only
//! decompresses as far as those names.
//!
//! ## Supported Formats
//!
//! - TAR (POSIX and GNU)
//! - ZIP
//! - 7-Zip
//! - gzip, bzip2 and xz wrapping a TAR
//! - RAR is recognized but not supported
//!
//! ## Example
//!
//! ```rust,no_run
//! use lister::{list_path, Entry, ListOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Skip the first entry and print the next three
//! let options = ListOptions { skip: 1, limit: Some(3) };
//! let summary = list_path(Path::new("archive.tar.gz"), &options, &mut |entry: &Entry| {
//!     println!("{}", entry.name);
//!     true // keep going
//! })?;
//!
//! println!("{} entries listed from a {} archive", summary.listed, summary.format);
//! # Ok(())
//! # }
//! ```

mod adapters;
pub mod entries;
pub mod error;
pub mod list;
pub mod registry;
pub mod types;

// Re-export main types
pub use entries::{Entries, Source};
pub use error::ListError;
pub use list::{drive, list, list_path, list_with, Tally};
pub use registry::{registry, DecodeFn, Format, Registry, BUILTIN_FORMATS, HEADER_WINDOW};
pub use types::{Entry, ListOptions, ListSummary};

/// Type alias for entry callbacks.
///
/// The callback receives each surfaced entry in archive order and returns
/// `true` to continue listing, `false` to stop.
pub type EntryCallback<'c> = dyn FnMut(&Entry) -> bool + 'c;

/// Detect the format of `src` with the built-in registry.
///
/// At most [`HEADER_WINDOW`] bytes are peeked and the stream position is
/// restored before returning.
///
/// # Errors
///
/// Returns [`ListError::EmptyInput`] if the stream has no bytes left,
/// [`ListError::UnknownFormat`] if no signature matches, or an I/O error.
pub fn detect<R: std::io::Read + std::io::Seek + ?Sized>(
    src: &mut R,
) -> Result<&'static Format, ListError> {
    registry().detect(src)
}
