//! Sequential tar header walker.
//!
//! Headers are decoded with the `tar` crate's [`Header`] type, but the walk
//! itself is done here so the iterator can own its reader: entry data is only
//! skipped when the following entry is requested.

use crate::entries::{Entries, Source};
use crate::error::ListError;
use crate::types::Entry;
use std::borrow::Cow;
use std::io::{self, BufReader, Read};
use tar::{Header, PaxExtensions};

const BLOCK_SIZE: u64 = 512;

/// Upper bound for GNU long-name and PAX records.
const MAX_META_SIZE: u64 = 1024 * 1024;

pub(crate) fn decode(src: &mut dyn Source, _size: u64) -> Entries<'_> {
    Entries::new(TarEntries::new(BufReader::new(src), "tar"))
}

/// Iterator over the entry names of a tar stream.
pub(crate) struct TarEntries<R> {
    reader: R,
    format: &'static str,
    /// Bytes of entry data (plus padding) still to skip before the next header.
    pending: u64,
    done: bool,
}

impl<R: Read> TarEntries<R> {
    /// `format` names the outermost format in error messages.
    pub(crate) fn new(reader: R, format: &'static str) -> Self {
        Self {
            reader,
            format,
            pending: 0,
            done: false,
        }
    }

    fn next_entry(&mut self) -> io::Result<Option<Entry>> {
        let mut long_name: Option<Vec<u8>> = None;
        let mut pax = PaxOverrides::default();
        let mut block = [0u8; BLOCK_SIZE as usize];

        loop {
            self.skip_pending()?;

            if !read_block(&mut self.reader, &mut block)? {
                return Ok(None);
            }
            if block.iter().all(|&b| b == 0) {
                return Ok(None);
            }

            let header = Header::from_byte_slice(&block);
            verify_checksum(header)?;
            let kind = header.entry_type();

            if kind.is_gnu_longname() {
                let mut data = self.read_meta(header.entry_size()?)?;
                while data.last() == Some(&0) {
                    data.pop();
                }
                long_name = Some(data);
                continue;
            }
            if kind.is_pax_local_extensions() {
                let data = self.read_meta(header.entry_size()?)?;
                pax = PaxOverrides::parse(&data)?;
                continue;
            }
            if kind.is_gnu_longlink() || kind.is_pax_global_extensions() {
                self.pending = padded(header.entry_size()?)?;
                continue;
            }

            // a pax size record replaces the header's size field
            let size = match pax.size.take() {
                Some(size) => size,
                None => header.entry_size()?,
            };
            let name = match pax.path.take().or(long_name.take()) {
                Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                None => lossy(header.path_bytes()),
            };
            self.pending = padded(size)?;
            return Ok(Some(Entry::new(name)));
        }
    }

    fn skip_pending(&mut self) -> io::Result<()> {
        if self.pending == 0 {
            return Ok(());
        }
        let want = std::mem::take(&mut self.pending);
        let skipped = io::copy(&mut (&mut self.reader).take(want), &mut io::sink())?;
        if skipped < want {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected end of archive in entry data",
            ));
        }
        Ok(())
    }

    fn read_meta(&mut self, size: u64) -> io::Result<Vec<u8>> {
        if size > MAX_META_SIZE {
            return Err(invalid("extended header record too large"));
        }
        let mut data = Vec::with_capacity(size as usize);
        (&mut self.reader).take(size).read_to_end(&mut data)?;
        if (data.len() as u64) < size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "unexpected end of archive in extended header",
            ));
        }
        self.pending = padded(size)? - size;
        Ok(data)
    }
}

/// Records of a pax local header that change how the next entry is read.
#[derive(Debug, Default, PartialEq, Eq)]
struct PaxOverrides {
    path: Option<Vec<u8>>,
    size: Option<u64>,
}

impl PaxOverrides {
    fn parse(data: &[u8]) -> io::Result<Self> {
        let mut overrides = Self::default();
        for extension in PaxExtensions::new(data) {
            let extension = extension?;
            match extension.key_bytes() {
                b"path" => overrides.path = Some(extension.value_bytes().to_vec()),
                b"size" => {
                    let size = extension
                        .value()
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .ok_or_else(|| invalid("invalid pax size record"))?;
                    overrides.size = Some(size);
                }
                _ => {}
            }
        }
        Ok(overrides)
    }
}

impl<R: Read> Iterator for TarEntries<R> {
    type Item = Result<Entry, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(ListError::malformed(self.format, e)))
            }
        }
    }
}

/// Fill `block` completely. Returns `false` on a clean EOF before any byte.
fn read_block<R: Read>(reader: &mut R, block: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(false),
        n if n == block.len() => Ok(true),
        _ => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "unexpected end of archive in header",
        )),
    }
}

fn verify_checksum(header: &Header) -> io::Result<()> {
    let expected = header.cksum()?;
    let actual: u32 = header
        .as_bytes()
        .iter()
        .enumerate()
        .map(|(i, &b)| if (148..156).contains(&i) { u32::from(b' ') } else { u32::from(b) })
        .sum();
    if expected != actual {
        return Err(invalid("header checksum mismatch"));
    }
    Ok(())
}

/// Round `size` up to a whole number of blocks.
fn padded(size: u64) -> io::Result<u64> {
    size.checked_add(BLOCK_SIZE - 1)
        .map(|s| s / BLOCK_SIZE * BLOCK_SIZE)
        .ok_or_else(|| invalid("entry size overflow"))
}

fn lossy(bytes: Cow<'_, [u8]>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn names(data: Vec<u8>) -> Vec<Result<String, String>> {
        TarEntries::new(Cursor::new(data), "tar")
            .map(|r| r.map(|e| e.name).map_err(|e| e.to_string()))
            .collect()
    }

    #[test]
    fn test_lists_in_order() {
        let data = build_tar(&[("a.txt", b"aaa"), ("dir/b.txt", b""), ("c.txt", &[7u8; 700])]);
        let listed = names(data);
        assert_eq!(
            listed,
            vec![
                Ok("a.txt".to_string()),
                Ok("dir/b.txt".to_string()),
                Ok("c.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_gnu_long_name() {
        let long = format!("{}/file.txt", "deep".repeat(40));
        let data = build_tar(&[(long.as_str(), b"x"), ("short", b"y")]);
        let listed = names(data);
        assert_eq!(listed, vec![Ok(long), Ok("short".to_string())]);
    }

    #[test]
    fn test_pax_path_overrides_header_name() {
        let mut builder = tar::Builder::new(Vec::new());
        builder
            .append_pax_extensions([("path", b"from/pax.txt".as_slice())])
            .unwrap();
        let mut header = tar::Header::new_ustar();
        header.set_size(1);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "truncated", &b"z"[..]).unwrap();
        let data = builder.into_inner().unwrap();

        assert_eq!(names(data), vec![Ok("from/pax.txt".to_string())]);
    }

    #[test]
    fn test_empty_archive() {
        let data = build_tar(&[]);
        assert!(names(data).is_empty());
        assert!(names(Vec::new()).is_empty());
    }

    #[test]
    fn test_bad_checksum_is_terminal() {
        let mut data = build_tar(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
        // second header starts after one header block and one data block
        data[1024] ^= 0xFF;

        let listed = names(data);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], Ok("a".to_string()));
        assert!(listed[1].as_ref().unwrap_err().contains("checksum"));
    }

    #[test]
    fn test_truncated_data() {
        let mut data = build_tar(&[("a", &[1u8; 2000]), ("b", b"2")]);
        data.truncate(1000);

        let listed = names(data);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], Ok("a".to_string()));
        assert!(listed[1].is_err());
    }

    #[test]
    fn test_truncated_header() {
        let mut data = build_tar(&[("a", b"1")]);
        data.truncate(300);

        let listed = names(data);
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_err());
    }

    #[test]
    fn test_pax_size_overrides_header_size() {
        let mut builder = tar::Builder::new(Vec::new());
        builder
            .append_pax_extensions([("size", b"5".as_slice())])
            .unwrap();
        // header claims no data, five bytes follow
        let mut header = tar::Header::new_ustar();
        header.set_size(0);
        header.set_mode(0o644);
        builder.append_data(&mut header, "big", &b"hello"[..]).unwrap();
        let mut header = tar::Header::new_ustar();
        header.set_size(1);
        header.set_mode(0o644);
        builder.append_data(&mut header, "next", &b"n"[..]).unwrap();
        let data = builder.into_inner().unwrap();

        assert_eq!(
            names(data),
            vec![Ok("big".to_string()), Ok("next".to_string())]
        );
    }

    #[test]
    fn test_long_link_and_global_header_skipped() {
        let mut builder = tar::Builder::new(Vec::new());

        let comment = b"18 comment=global\n";
        let mut global = tar::Header::new_ustar();
        global.set_entry_type(tar::EntryType::XGlobalHeader);
        global.set_path("pax_global_header").unwrap();
        global.set_size(comment.len() as u64);
        global.set_mode(0o644);
        global.set_cksum();
        builder.append(&global, &comment[..]).unwrap();

        let target = format!("{}/target", "far".repeat(50));
        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        builder.append_link(&mut link, "link", &target).unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_size(1);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "file", &b"f"[..]).unwrap();
        let data = builder.into_inner().unwrap();

        assert_eq!(
            names(data),
            vec![Ok("link".to_string()), Ok("file".to_string())]
        );
    }

    #[test]
    fn test_pax_overrides() {
        let data = b"19 path=some/where\n11 size=42\n11 mtime=1\n";
        let overrides = PaxOverrides::parse(data).unwrap();
        assert_eq!(overrides.path.as_deref(), Some(&b"some/where"[..]));
        assert_eq!(overrides.size, Some(42));

        assert!(PaxOverrides::parse(b"12 size=abc\n").is_err());
    }
}
