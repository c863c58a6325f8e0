//! Type definitions for archive listing.

use serde::Serialize;

/// Individual entry within an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Path of the entry within the archive, as stored
    pub name: String,
}

impl Entry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Options controlling which entries are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Number of leading entries to discard (default: 0)
    pub skip: usize,

    /// Maximum number of entries to surface after skipping, `None` for all
    /// (default: 10)
    pub limit: Option<usize>,
}

impl ListOptions {
    /// Build options from command-line style values, where a negative
    /// `limit` means unbounded.
    pub fn new(skip: usize, limit: i64) -> Self {
        Self {
            skip,
            limit: usize::try_from(limit).ok(),
        }
    }

    /// Surface every entry after `skip`.
    pub fn all() -> Self {
        Self {
            skip: 0,
            limit: None,
        }
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Some(10),
        }
    }
}

/// Outcome of a successful listing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSummary {
    /// Detected format name (e.g. "tar", "zip", "gzip")
    pub format: String,

    /// Whether listing cost is independent of archive size
    pub is_fast: bool,

    /// Number of entries discarded by `skip`
    pub skipped: u64,

    /// Number of entries handed to the caller
    pub listed: u64,

    /// Whether listing stopped because `limit` was reached or the caller
    /// asked to stop, rather than because the archive ended
    pub limit_reached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_limit_is_unbounded() {
        assert_eq!(ListOptions::new(3, -1).limit, None);
        assert_eq!(ListOptions::new(3, -42).limit, None);
        assert_eq!(ListOptions::new(3, 0).limit, Some(0));
        assert_eq!(ListOptions::new(3, 7), ListOptions { skip: 3, limit: Some(7) });
    }

    #[test]
    fn test_default_options() {
        let options = ListOptions::default();
        assert_eq!(options.skip, 0);
        assert_eq!(options.limit, Some(10));
    }
}
