//! Formats that keep a table of contents: zip and 7z.
//!
//! The catalog is read with random access on the first pull; after that each
//! pull is a lookup into the already-parsed table.

use crate::entries::{Entries, Source};
use crate::error::ListError;
use crate::types::Entry;
use sevenz_rust2::{Password, SevenZReader};
use tracing::debug;
use zip::ZipArchive;

pub(crate) fn decode_zip(src: &mut dyn Source, _size: u64) -> Entries<'_> {
    let mut src = Some(src);
    let mut archive: Option<ZipArchive<&mut dyn Source>> = None;
    let mut index = 0;

    Entries::new(std::iter::from_fn(move || {
        if let Some(src) = src.take() {
            match ZipArchive::new(src) {
                Ok(opened) => {
                    debug!(entries = opened.len(), "zip central directory read");
                    archive = Some(opened);
                }
                Err(e) => return Some(Err(ListError::init("zip", e))),
            }
        }

        let opened = archive.as_ref()?;
        if index >= opened.len() {
            return None;
        }
        let outcome = match opened.name_for_index(index) {
            Some(name) => Ok(Entry::new(name)),
            None => Err(ListError::malformed("zip", format!("no entry at index {index}"))),
        };
        index += 1;
        Some(outcome)
    }))
}

pub(crate) fn decode_7z(src: &mut dyn Source, size: u64) -> Entries<'_> {
    let mut src = Some(src);
    let mut reader: Option<SevenZReader<&mut dyn Source>> = None;
    let mut index = 0;

    Entries::new(std::iter::from_fn(move || {
        if let Some(src) = src.take() {
            match SevenZReader::new(src, size, Password::empty()) {
                Ok(opened) => {
                    debug!(entries = opened.archive().files.len(), "7z header read");
                    reader = Some(opened);
                }
                Err(e) => return Some(Err(ListError::init("7z", e))),
            }
        }

        let file = reader.as_ref()?.archive().files.get(index)?;
        index += 1;
        Some(Ok(Entry::new(file.name())))
    }))
}

pub(crate) fn decode_rar(_src: &mut dyn Source, _size: u64) -> Entries<'_> {
    Entries::failed(ListError::NotSupported("rar"))
}
