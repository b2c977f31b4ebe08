//! Test fixtures and utilities for reducing test setup duplication.
//!
//! Unit tests need two kinds of scratch material: small local bundle trees
//! and ZIP archives with exact control over every header field (data
//! descriptors, bad CRCs, encryption flags) that a general-purpose writer
//! would refuse to produce.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{ZipFixture, create_sample_bundle};
//!
//! let (temp, bundle) = create_sample_bundle();
//! let archive = ZipFixture::new()
//!     .directory("a/")
//!     .deflated("a/file.txt", b"contents")
//!     .build();
//! ```

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use tempfile::TempDir;

use crate::archive::header::{
    FLAG_DATA_DESCRIPTOR, LOCAL_HEADER_LEN, SIG_CENTRAL_DIRECTORY, SIG_DATA_DESCRIPTOR,
    SIG_END_OF_CENTRAL_DIRECTORY, SIG_LOCAL_FILE_HEADER, le_u16, le_u32,
};

/// 2020-06-15 12:30:44 in DOS format
pub const FIXTURE_DOS_DATE: u16 = (40 << 9) | (6 << 5) | 15;
pub const FIXTURE_DOS_TIME: u16 = (12 << 11) | (30 << 5) | 22;

const VERSION_NEEDED: u16 = 20;
const VERSION_MADE_BY: u16 = 0x031E;

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Create a bundle directory holding `a/b/file.txt`, `c/d/e/` and `file.txt`.
///
/// # Panics
///
/// Panics if the tree cannot be written.
#[must_use]
pub fn create_sample_bundle() -> (TempDir, PathBuf) {
    let temp = create_temp_dir();
    let bundle = temp.path().join("0xsample");
    fs::create_dir_all(bundle.join("a/b")).expect("Failed to create a/b");
    fs::create_dir_all(bundle.join("c/d/e")).expect("Failed to create c/d/e");
    fs::write(bundle.join("a/b/file.txt"), b"nested").expect("Failed to write a/b/file.txt");
    fs::write(bundle.join("file.txt"), b"top level").expect("Failed to write file.txt");
    (temp, bundle)
}

#[derive(Debug, Clone)]
struct FixtureEntry {
    name: String,
    body: Vec<u8>,
    method: u16,
    crc32: u32,
    size: u32,
    flags: u16,
    /// `Some(signed)` when CRC and sizes trail the body
    descriptor: Option<bool>,
}

impl FixtureEntry {
    fn compressed_size(&self) -> u32 {
        u32::try_from(self.body.len()).expect("fixture entry too large")
    }
}

/// Hand-assembled ZIP archive
#[derive(Debug, Clone, Default)]
pub struct ZipFixture {
    entries: Vec<FixtureEntry>,
    comment: Vec<u8>,
}

impl ZipFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, entry: FixtureEntry) -> Self {
        self.entries.push(entry);
        self
    }

    fn plain(name: &str, data: &[u8]) -> FixtureEntry {
        FixtureEntry {
            name: name.to_string(),
            body: data.to_vec(),
            method: 0,
            crc32: crc32fast::hash(data),
            size: u32::try_from(data.len()).expect("fixture entry too large"),
            flags: 0,
            descriptor: None,
        }
    }

    fn compressed(name: &str, data: &[u8]) -> FixtureEntry {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).expect("deflate fixture");
        FixtureEntry {
            body: encoder.finish().expect("deflate fixture"),
            method: 8,
            ..Self::plain(name, data)
        }
    }

    /// Explicit directory entry; `name` should end with `/`
    #[must_use]
    pub fn directory(self, name: &str) -> Self {
        self.push(Self::plain(name, b""))
    }

    #[must_use]
    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.push(Self::plain(name, data))
    }

    /// Stored entry whose headers declare `crc32` instead of the real checksum
    #[must_use]
    pub fn stored_with_crc(self, name: &str, data: &[u8], crc32: u32) -> Self {
        self.push(FixtureEntry {
            crc32,
            ..Self::plain(name, data)
        })
    }

    /// Stored entry with extra general purpose flag bits
    #[must_use]
    pub fn stored_with_flags(self, name: &str, data: &[u8], flags: u16) -> Self {
        self.push(FixtureEntry {
            flags,
            ..Self::plain(name, data)
        })
    }

    #[must_use]
    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.push(Self::compressed(name, data))
    }

    /// Deflated entry whose CRC and sizes follow the body
    #[must_use]
    pub fn deflated_with_descriptor(self, name: &str, data: &[u8], signed: bool) -> Self {
        self.push(FixtureEntry {
            flags: FLAG_DATA_DESCRIPTOR,
            descriptor: Some(signed),
            ..Self::compressed(name, data)
        })
    }

    #[must_use]
    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Local headers and bodies only, no central directory
    #[must_use]
    pub fn build_entries_only(&self) -> Vec<u8> {
        self.write_entries().0
    }

    /// Complete archive with central directory and end record
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let (mut out, offsets) = self.write_entries();
        let cd_start = out.len();

        for (entry, offset) in self.entries.iter().zip(offsets) {
            put_u32(&mut out, SIG_CENTRAL_DIRECTORY);
            put_u16(&mut out, VERSION_MADE_BY);
            put_u16(&mut out, VERSION_NEEDED);
            put_u16(&mut out, entry.flags);
            put_u16(&mut out, entry.method);
            put_u16(&mut out, FIXTURE_DOS_TIME);
            put_u16(&mut out, FIXTURE_DOS_DATE);
            put_u32(&mut out, entry.crc32);
            put_u32(&mut out, entry.compressed_size());
            put_u32(&mut out, entry.size);
            put_u16(&mut out, name_len(entry));
            put_u16(&mut out, 0); // extra
            put_u16(&mut out, 0); // comment
            put_u16(&mut out, 0); // disk
            put_u16(&mut out, 0); // internal attributes
            put_u32(&mut out, 0); // external attributes
            put_u32(&mut out, u32::try_from(offset).expect("fixture too large"));
            out.extend_from_slice(entry.name.as_bytes());
        }

        let cd_size = out.len() - cd_start;
        let count = u16::try_from(self.entries.len()).expect("too many fixture entries");
        put_u32(&mut out, SIG_END_OF_CENTRAL_DIRECTORY);
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u16(&mut out, count);
        put_u16(&mut out, count);
        put_u32(&mut out, u32::try_from(cd_size).expect("fixture too large"));
        put_u32(&mut out, u32::try_from(cd_start).expect("fixture too large"));
        put_u16(
            &mut out,
            u16::try_from(self.comment.len()).expect("comment too long"),
        );
        out.extend_from_slice(&self.comment);
        out
    }

    fn write_entries(&self) -> (Vec<u8>, Vec<usize>) {
        let mut out = Vec::new();
        let mut offsets = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            offsets.push(out.len());
            let deferred = entry.descriptor.is_some();
            put_u32(&mut out, SIG_LOCAL_FILE_HEADER);
            put_u16(&mut out, VERSION_NEEDED);
            put_u16(&mut out, entry.flags);
            put_u16(&mut out, entry.method);
            put_u16(&mut out, FIXTURE_DOS_TIME);
            put_u16(&mut out, FIXTURE_DOS_DATE);
            put_u32(&mut out, if deferred { 0 } else { entry.crc32 });
            put_u32(&mut out, if deferred { 0 } else { entry.compressed_size() });
            put_u32(&mut out, if deferred { 0 } else { entry.size });
            put_u16(&mut out, name_len(entry));
            put_u16(&mut out, 0);
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&entry.body);

            if let Some(signed) = entry.descriptor {
                if signed {
                    put_u32(&mut out, SIG_DATA_DESCRIPTOR);
                }
                put_u32(&mut out, entry.crc32);
                put_u32(&mut out, entry.compressed_size());
                put_u32(&mut out, entry.size);
            }
        }
        (out, offsets)
    }
}

/// `(body_start, body_end)` of the `index`-th entry, walking local headers.
///
/// Only valid for archives without data descriptors.
///
/// # Panics
///
/// Panics if the archive has fewer entries.
#[must_use]
pub fn stored_entry_offsets(archive: &[u8], index: usize) -> (usize, usize) {
    let mut offset = 0;
    for current in 0.. {
        let header = &archive[offset..offset + LOCAL_HEADER_LEN];
        assert_eq!(le_u32(header), SIG_LOCAL_FILE_HEADER, "not a local header");
        let compressed = le_u32(&header[18..22]) as usize;
        let names = le_u16(&header[26..28]) as usize + le_u16(&header[28..30]) as usize;
        let body_start = offset + LOCAL_HEADER_LEN + names;
        let body_end = body_start + compressed;
        if current == index {
            return (body_start, body_end);
        }
        offset = body_end;
    }
    unreachable!("entry index out of range")
}

fn name_len(entry: &FixtureEntry) -> u16 {
    u16::try_from(entry.name.len()).expect("fixture name too long")
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
