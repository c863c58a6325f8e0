//! Listing controller: detect, decode and apply skip/limit.

use crate::error::ListError;
use crate::registry::{registry, Registry};
use crate::types::{Entry, ListOptions, ListSummary};
use crate::EntryCallback;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Counters produced by [`drive`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub skipped: u64,
    pub listed: u64,
    pub limit_reached: bool,
}

/// Pull outcomes from `entries`, discarding the first `options.skip` entries
/// and handing at most `options.limit` of the rest to `on_entry`.
///
/// The first error ends the session and is returned as is; entries already
/// handed out stay handed out. Once the limit is reached, or `on_entry`
/// returns `false`, `entries` is dropped without being pulled again.
pub fn drive<I>(
    entries: I,
    options: &ListOptions,
    on_entry: &mut EntryCallback<'_>,
) -> Result<Tally, ListError>
where
    I: IntoIterator<Item = Result<Entry, ListError>>,
{
    let mut tally = Tally::default();
    let mut entries = entries.into_iter();

    loop {
        if options.limit.is_some_and(|limit| tally.listed >= limit as u64) {
            tally.limit_reached = true;
            break;
        }

        let entry = match entries.next() {
            Some(outcome) => outcome?,
            None => break,
        };

        if tally.skipped < options.skip as u64 {
            tally.skipped += 1;
            continue;
        }

        tally.listed += 1;
        if !on_entry(&entry) {
            tally.limit_reached = true;
            break;
        }
    }

    if tally.limit_reached {
        debug!(listed = tally.listed, "stopping early");
    }
    Ok(tally)
}

/// List `src` using the built-in registry.
///
/// See [`list_with`].
pub fn list<S: Read + Seek>(
    src: &mut S,
    options: &ListOptions,
    on_entry: &mut EntryCallback<'_>,
) -> Result<ListSummary, ListError> {
    list_with(registry(), src, options, on_entry)
}

/// Detect the format of `src` from its current position, then list it.
///
/// The stream length is measured by seeking to the end, and the stream is
/// rewound to the detection start before the adapter runs.
pub fn list_with<S: Read + Seek>(
    registry: &Registry,
    src: &mut S,
    options: &ListOptions,
    on_entry: &mut EntryCallback<'_>,
) -> Result<ListSummary, ListError> {
    let start = src.stream_position()?;
    let format = registry.detect(src)?;
    let size = src.seek(SeekFrom::End(0))?;
    src.seek(SeekFrom::Start(start))?;

    debug!(
        format = format.name,
        size,
        skip = options.skip,
        limit = ?options.limit,
        "listing archive"
    );

    let tally = drive(format.decode(src, size), options, on_entry)?;

    Ok(ListSummary {
        format: format.name.to_string(),
        is_fast: format.is_fast,
        skipped: tally.skipped,
        listed: tally.listed,
        limit_reached: tally.limit_reached,
    })
}

/// Open the archive at `path` and list it.
///
/// # Errors
///
/// Returns [`ListError::NotFound`] if the path does not exist, and any
/// detection or decode error otherwise.
pub fn list_path(
    path: &Path,
    options: &ListOptions,
    on_entry: &mut EntryCallback<'_>,
) -> Result<ListSummary, ListError> {
    if !path.exists() {
        return Err(ListError::NotFound(path.to_path_buf()));
    }

    let mut file = File::open(path)?;
    list(&mut file, options, on_entry)
}
