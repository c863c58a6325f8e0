//! Single-stream compressors wrapping a tar archive.
//!
//! gzip, bzip2 and xz carry no entries of their own. Each adapter opens the
//! decompressor over the source on the first pull and hands the decompressed
//! bytes to the tar walker.

use super::tar::TarEntries;
use crate::entries::{Entries, Source};
use crate::error::ListError;
use crate::types::Entry;
use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use std::io::{BufRead, BufReader, Read};
use tracing::debug;
use xz2::read::XzDecoder;

type Opener = for<'a> fn(&'a mut dyn Source) -> Box<dyn Read + 'a>;

pub(crate) fn decode_gzip(src: &mut dyn Source, _size: u64) -> Entries<'_> {
    Entries::new(Decompressed::new(src, "gzip", open_gzip))
}

pub(crate) fn decode_bzip2(src: &mut dyn Source, _size: u64) -> Entries<'_> {
    Entries::new(Decompressed::new(src, "bzip2", open_bzip2))
}

pub(crate) fn decode_xz(src: &mut dyn Source, _size: u64) -> Entries<'_> {
    Entries::new(Decompressed::new(src, "xz", open_xz))
}

fn open_gzip(src: &mut dyn Source) -> Box<dyn Read + '_> {
    Box::new(MultiGzDecoder::new(src))
}

fn open_bzip2(src: &mut dyn Source) -> Box<dyn Read + '_> {
    Box::new(MultiBzDecoder::new(src))
}

fn open_xz(src: &mut dyn Source) -> Box<dyn Read + '_> {
    Box::new(XzDecoder::new_multi_decoder(src))
}

type Inner<'a> = TarEntries<BufReader<Box<dyn Read + 'a>>>;

enum State<'a> {
    Pending(&'a mut dyn Source),
    Streaming(Inner<'a>),
    Done,
}

/// A tar walker over a decompressed stream, opened lazily.
struct Decompressed<'a> {
    state: State<'a>,
    format: &'static str,
    open: Opener,
}

impl<'a> Decompressed<'a> {
    fn new(src: &'a mut dyn Source, format: &'static str, open: Opener) -> Self {
        Self {
            state: State::Pending(src),
            format,
            open,
        }
    }

    /// Open the decompressor and decode its stream header, so a bad header
    /// reports as an initialization failure rather than a bad tar entry.
    fn prime(&self, src: &'a mut dyn Source) -> Result<Inner<'a>, ListError> {
        let mut reader = BufReader::new((self.open)(src));
        reader
            .fill_buf()
            .map_err(|e| ListError::init(self.format, e))?;
        debug!(format = self.format, "decompressor ready");
        Ok(TarEntries::new(reader, self.format))
    }
}

impl Iterator for Decompressed<'_> {
    type Item = Result<Entry, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Pending(src) => match self.prime(src) {
                Ok(entries) => {
                    self.state = State::Streaming(entries);
                    self.next()
                }
                Err(e) => Some(Err(e)),
            },
            State::Streaming(mut entries) => {
                let next = entries.next();
                if matches!(next, Some(Ok(_))) {
                    self.state = State::Streaming(entries);
                }
                next
            }
            State::Done => None,
        }
    }
}
