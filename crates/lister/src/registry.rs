//! Format registry and header-based detection.
//!
//! Formats are data: a name, the signatures that identify it, and the
//! adapter that lists it. Detection walks the registry in order and the first
//! descriptor with a matching signature wins, so registry order is the
//! tie-break between overlapping signatures.

use crate::adapters;
use crate::entries::{Entries, Source};
use crate::error::ListError;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::LazyLock;
use tracing::debug;

/// Number of leading bytes inspected during detection.
pub const HEADER_WINDOW: usize = 512;

/// Turns a positioned source and its total length into a lazy entry sequence.
pub type DecodeFn = for<'a> fn(&'a mut dyn Source, u64) -> Entries<'a>;

/// Describes one supported (or recognized) format.
#[derive(Clone, Copy)]
pub struct Format {
    /// Identifier reported to callers, e.g. `"gzip"`
    pub name: &'static str,

    /// Alternative byte patterns, tried in order
    pub signatures: &'static [&'static [u8]],

    /// Position in the header where every signature is matched
    pub offset: usize,

    /// Listing cost is independent of archive size
    pub is_fast: bool,

    /// Adapter producing the entries
    pub decode: DecodeFn,
}

impl Format {
    /// Whether any signature matches `header` at this format's offset.
    ///
    /// A header too short to hold a signature simply does not match it.
    pub fn matches(&self, header: &[u8]) -> bool {
        self.signatures.iter().any(|sig| {
            header
                .get(self.offset..self.offset + sig.len())
                .is_some_and(|window| window == *sig)
        })
    }

    /// Start listing `src`, which must be positioned at the archive start.
    pub fn decode<'a>(&self, src: &'a mut dyn Source, size: u64) -> Entries<'a> {
        (self.decode)(src, size)
    }
}

impl std::fmt::Debug for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("is_fast", &self.is_fast)
            .finish_non_exhaustive()
    }
}

/// Built-in formats, in detection order.
pub static BUILTIN_FORMATS: [Format; 7] = [
    Format {
        name: "tar",
        signatures: &[b"ustar\0", b"ustar  \0"],
        offset: 257,
        is_fast: false,
        decode: adapters::tar::decode,
    },
    Format {
        name: "zip",
        signatures: &[b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"],
        offset: 0,
        is_fast: true,
        decode: adapters::catalog::decode_zip,
    },
    Format {
        name: "rar",
        signatures: &[b"Rar!"],
        offset: 0,
        is_fast: true,
        decode: adapters::catalog::decode_rar,
    },
    Format {
        name: "bzip2",
        signatures: &[b"BZh"],
        offset: 0,
        is_fast: false,
        decode: adapters::compressed::decode_bzip2,
    },
    Format {
        name: "gzip",
        signatures: &[b"\x1f\x8b"],
        offset: 0,
        is_fast: false,
        decode: adapters::compressed::decode_gzip,
    },
    Format {
        name: "7z",
        signatures: &[b"7z\xBC\xAF\x27\x1C"],
        offset: 0,
        is_fast: true,
        decode: adapters::catalog::decode_7z,
    },
    Format {
        name: "xz",
        signatures: &[b"\xFD7zXZ\x00"],
        offset: 0,
        is_fast: false,
        decode: adapters::compressed::decode_xz,
    },
];

static BUILTIN: LazyLock<Registry> = LazyLock::new(Registry::builtin);

/// The process-wide registry of built-in formats.
pub fn registry() -> &'static Registry {
    &BUILTIN
}

/// Ordered collection of formats used for detection.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    formats: Vec<Format>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding [`BUILTIN_FORMATS`].
    pub fn builtin() -> Self {
        Self {
            formats: BUILTIN_FORMATS.to_vec(),
        }
    }

    /// Append `format`; it is tried after every format already registered.
    pub fn register(&mut self, format: Format) -> &mut Self {
        self.formats.push(format);
        self
    }

    pub fn formats(&self) -> &[Format] {
        &self.formats
    }

    pub fn get(&self, name: &str) -> Option<&Format> {
        self.formats.iter().find(|f| f.name == name)
    }

    /// Match a header window against the registry.
    pub fn detect_header(&self, header: &[u8]) -> Result<&Format, ListError> {
        if header.is_empty() {
            return Err(ListError::EmptyInput);
        }
        self.formats
            .iter()
            .find(|format| format.matches(header))
            .ok_or(ListError::UnknownFormat)
    }

    /// Peek at most [`HEADER_WINDOW`] bytes of `src` and match them.
    ///
    /// The stream is returned to its original position whatever the result.
    pub fn detect<R: Read + Seek + ?Sized>(&self, src: &mut R) -> Result<&Format, ListError> {
        let start = src.stream_position()?;
        let header = read_window(src);
        src.seek(SeekFrom::Start(start))?;

        let header = header?;
        let format = self.detect_header(&header)?;
        debug!(format = format.name, header_len = header.len(), "detected format");
        Ok(format)
    }
}

fn read_window<R: Read + ?Sized>(src: &mut R) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_WINDOW);
    src.take(HEADER_WINDOW as u64).read_to_end(&mut header)?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_with(offset: usize, sig: &[u8]) -> Vec<u8> {
        let mut header = vec![0xAAu8; offset];
        header.extend_from_slice(sig);
        header
    }

    #[test]
    fn test_builtin_order() {
        let names: Vec<_> = registry().formats().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["tar", "zip", "rar", "bzip2", "gzip", "7z", "xz"]);
    }

    #[test]
    fn test_every_signature_detected() {
        for format in registry().formats() {
            for sig in format.signatures {
                let header = header_with(format.offset, sig);
                let detected = registry().detect_header(&header).unwrap();
                assert_eq!(detected.name, format.name);
            }
        }
    }

    #[test]
    fn test_short_header_skips_signature() {
        // "ustar" alone cannot hold the terminating NUL of either tar signature
        let header = header_with(257, b"ustar");
        assert!(matches!(
            registry().detect_header(&header),
            Err(ListError::UnknownFormat)
        ));
        assert!(matches!(
            registry().detect_header(b"\x1f"),
            Err(ListError::UnknownFormat)
        ));
    }

    #[test]
    fn test_empty_header() {
        assert!(matches!(
            registry().detect_header(&[]),
            Err(ListError::EmptyInput)
        ));
    }

    #[test]
    fn test_order_breaks_ties() {
        // A tar header whose first bytes also look like gzip
        let mut header = header_with(257, b"ustar\0");
        header[0] = 0x1f;
        header[1] = 0x8b;
        assert_eq!(registry().detect_header(&header).unwrap().name, "tar");
    }

    #[test]
    fn test_detect_restores_position() {
        let mut data = b"junk".to_vec();
        data.extend_from_slice(b"BZh91AY&SY");
        data.resize(2048, 0);
        let mut src = Cursor::new(data);
        src.set_position(4);

        let format = registry().detect(&mut src).unwrap();
        assert_eq!(format.name, "bzip2");
        assert_eq!(src.position(), 4);

        // idempotent
        assert_eq!(registry().detect(&mut src).unwrap().name, "bzip2");
    }

    #[test]
    fn test_detect_failure_restores_position() {
        let mut src = Cursor::new(vec![b'x'; 600]);
        assert!(matches!(
            registry().detect(&mut src),
            Err(ListError::UnknownFormat)
        ));
        assert_eq!(src.position(), 0);
    }

    #[test]
    fn test_register_appends() {
        fn decode_none(_src: &mut dyn Source, _size: u64) -> Entries<'_> {
            Entries::empty()
        }

        let mut custom = Registry::builtin();
        custom.register(Format {
            name: "custom",
            signatures: &[b"CSTM"],
            offset: 0,
            is_fast: true,
            decode: decode_none,
        });

        assert_eq!(custom.formats().len(), 8);
        assert_eq!(custom.detect_header(b"CSTM....").unwrap().name, "custom");
        assert!(custom.get("custom").is_some());
        assert!(registry().get("custom").is_none());
        assert!(matches!(
            registry().detect_header(b"CSTM...."),
            Err(ListError::UnknownFormat)
        ));
    }
}
