//! The lazy entry sequence every decode adapter produces.
//!
//! An [`Entries`] value is a single-pass, pull-based sequence of
//! `Result<Entry, ListError>` outcomes. Nothing is decoded until `next()` is
//! called, and dropping the value (or calling [`Entries::close`]) stops the
//! sequence, releasing any nested decompressor with it.

use crate::error::ListError;
use crate::types::Entry;
use std::io::{Read, Seek};
use std::iter::FusedIterator;

/// A byte stream with random access, as required by the decode adapters.
pub trait Source: Read + Seek {}

impl<T: Read + Seek + ?Sized> Source for T {}

/// Lazy, short-circuitable sequence of entries from one archive.
///
/// Once an `Err` has been yielded the sequence is exhausted, whatever the
/// underlying adapter would do next.
pub struct Entries<'a> {
    inner: Box<dyn Iterator<Item = Result<Entry, ListError>> + 'a>,
    done: bool,
}

impl<'a> Entries<'a> {
    pub fn new<I>(inner: I) -> Self
    where
        I: Iterator<Item = Result<Entry, ListError>> + 'a,
    {
        Self {
            inner: Box::new(inner),
            done: false,
        }
    }

    /// A sequence with no entries.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// A sequence whose only outcome is `err`.
    pub fn failed(err: ListError) -> Self {
        Self::new(std::iter::once(Err(err)))
    }

    /// Stop the sequence, abandoning any decode work not yet done.
    pub fn close(self) {}
}

impl Iterator for Entries<'_> {
    type Item = Result<Entry, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.inner.next() {
            Some(Ok(entry)) => Some(Ok(entry)),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl FusedIterator for Entries<'_> {}

impl std::fmt::Debug for Entries<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entries").field("done", &self.done).finish()
    }
}
