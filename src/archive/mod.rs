//! ZIP archive reading
//!
//! Two readers produce the same [`ZipEntryDescriptor`] values:
//!
//! - [`StreamingZipReader`] walks local headers front to back and works on
//!   any forward-only source, including one that is still being written.
//! - [`read_central_directory`] seeks to the end record and lists from the
//!   central directory, when the source supports it.
//!
//! Entry bodies are always decoded through the streaming reader.

pub mod central;
pub mod header;
pub mod streaming;

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

pub use central::read_central_directory;
pub use header::{CompressionMethod, DosDateTime, ZipEntryDescriptor};
pub use streaming::{EntryReader, OwnedEntryReader, StreamingZipReader};

use crate::error::Result;
use crate::error::archive::entry_not_found;
use crate::error::fs::io_context;
use crate::store::BlobSource;

/// Start parsing a forward-only ZIP stream.
pub fn open_archive_stream<R: Read>(source: R) -> StreamingZipReader<R> {
    StreamingZipReader::new(source)
}

/// List every entry of an opened blob, using the central directory when the
/// source is seekable.
pub fn list_entries(source: BlobSource) -> Result<Vec<ZipEntryDescriptor>> {
    match source {
        BlobSource::Seekable(source) => read_central_directory(source),
        BlobSource::Stream(source) => {
            let mut reader = StreamingZipReader::new(source);
            let mut entries = Vec::new();
            while let Some(entry) = reader.next_complete_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }
}

/// Open the body of entry `name` in an opened blob.
///
/// `blob` only names the archive in errors.
pub fn open_entry(source: BlobSource, blob: &str, name: &str) -> Result<OwnedEntryReader<BlobSource>> {
    let reader = match source {
        BlobSource::Seekable(mut seekable) => {
            let entries = read_central_directory(&mut seekable)?;
            let descriptor = entries
                .iter()
                .find(|entry| entry.filename == name)
                .ok_or_else(|| entry_not_found(blob, name))?;
            debug!(blob, entry = name, offset = descriptor.header_offset, "seeking to entry");
            seekable
                .seek(SeekFrom::Start(descriptor.header_offset))
                .map_err(|err| io_context("seek to local header", err))?;
            StreamingZipReader::at_offset(BlobSource::Seekable(seekable), descriptor.header_offset)
        }
        stream @ BlobSource::Stream(_) => StreamingZipReader::new(stream),
    };
    into_named_entry(reader, blob, name)
}

fn into_named_entry<R: Read>(
    mut reader: StreamingZipReader<R>,
    blob: &str,
    name: &str,
) -> Result<OwnedEntryReader<R>> {
    let descriptor = reader
        .find_entry(name)?
        .ok_or_else(|| entry_not_found(blob, name))?;
    reader.into_entry_reader(&descriptor)
}
