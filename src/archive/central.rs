//! Random-access listing through the central directory
//!
//! Used when the blob store can hand out a seekable source. Produces the
//! same [`ZipEntryDescriptor`] values the streaming reader derives from
//! local headers, for archives that do not use data descriptors.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use super::header::{
    CENTRAL_HEADER_LEN, END_OF_CENTRAL_DIRECTORY_LEN, HeaderFields, SIG_CENTRAL_DIRECTORY,
    SIG_END_OF_CENTRAL_DIRECTORY, ZipEntryDescriptor, le_u16, le_u32,
};
use crate::error::Result;
use crate::error::archive::{corrupt, unsupported};
use crate::error::fs::io_context;

/// 64 KiB maximum comment plus the fixed record
const EOCD_SEARCH_MAX: usize = 66 * 1024;

/// Parsed end-of-central-directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EndOfCentralDirectory {
    /// Absolute offset of the record itself
    position: u64,
    entries: u16,
    cd_size: u32,
    cd_offset: u32,
}

impl EndOfCentralDirectory {
    /// Bytes prepended before the archive proper (self-extractor stubs etc.).
    fn prefix_len(&self) -> Result<u64> {
        self.position
            .checked_sub(u64::from(self.cd_size))
            .and_then(|cd_start| cd_start.checked_sub(u64::from(self.cd_offset)))
            .ok_or_else(|| corrupt("central directory extends past its end record"))
    }
}

/// List every entry of a seekable archive from its central directory.
pub fn read_central_directory<R: Read + Seek>(mut source: R) -> Result<Vec<ZipEntryDescriptor>> {
    let eocd = find_end_of_central_directory(&mut source)?;
    let prefix = eocd.prefix_len()?;
    let cd_start = u64::from(eocd.cd_offset) + prefix;
    debug!(
        entries = eocd.entries,
        cd_start,
        cd_size = eocd.cd_size,
        "reading central directory"
    );

    let mut directory = vec![0u8; eocd.cd_size as usize];
    source
        .seek(SeekFrom::Start(cd_start))
        .map_err(|err| io_context("seek to central directory", err))?;
    source
        .read_exact(&mut directory)
        .map_err(|err| io_context("read central directory", err))?;

    let mut entries = Vec::with_capacity(usize::from(eocd.entries));
    let mut pos = 0usize;
    for index in 0..eocd.entries {
        let fixed = directory
            .get(pos..pos + CENTRAL_HEADER_LEN)
            .ok_or_else(|| corrupt(format!("central directory record {index} is truncated")))?;
        if le_u32(fixed) != SIG_CENTRAL_DIRECTORY {
            return Err(corrupt(format!(
                "bad central directory signature for record {index}"
            )));
        }
        let (fields, comment_len, local_offset) = HeaderFields::from_central(fixed);
        if local_offset == u32::MAX {
            return Err(unsupported("zip64 local header offsets"));
        }

        let name_start = pos + CENTRAL_HEADER_LEN;
        let name = directory
            .get(name_start..name_start + fields.name_len)
            .ok_or_else(|| corrupt(format!("central directory record {index} is truncated")))?;
        entries.push(fields.into_descriptor(name, u64::from(local_offset) + prefix)?);

        pos = name_start + fields.name_len + fields.extra_len + comment_len;
        if pos > directory.len() {
            return Err(corrupt(format!(
                "central directory record {index} overruns the directory"
            )));
        }
    }
    Ok(entries)
}

fn find_end_of_central_directory<R: Read + Seek>(source: &mut R) -> Result<EndOfCentralDirectory> {
    let len = source
        .seek(SeekFrom::End(0))
        .map_err(|err| io_context("seek to end of archive", err))?;
    if len < END_OF_CENTRAL_DIRECTORY_LEN as u64 {
        return Err(corrupt("too short to hold an end of central directory record"));
    }

    let window_len = usize::try_from(len).unwrap_or(usize::MAX).min(EOCD_SEARCH_MAX);
    let window_start = len - window_len as u64;
    let mut window = vec![0u8; window_len];
    source
        .seek(SeekFrom::Start(window_start))
        .map_err(|err| io_context("seek to archive tail", err))?;
    source
        .read_exact(&mut window)
        .map_err(|err| io_context("read archive tail", err))?;

    // Scan backward; a signature inside the comment is skipped when its own
    // comment length would run past the end of the window.
    let rel = (0..=window_len - END_OF_CENTRAL_DIRECTORY_LEN)
        .rev()
        .find(|&i| {
            le_u32(&window[i..]) == SIG_END_OF_CENTRAL_DIRECTORY
                && i + END_OF_CENTRAL_DIRECTORY_LEN + usize::from(le_u16(&window[i + 20..]))
                    <= window_len
        })
        .ok_or_else(|| corrupt("end of central directory record not found"))?;

    let record = &window[rel..];
    let disk = le_u16(&record[4..6]);
    let cd_disk = le_u16(&record[6..8]);
    let entries_on_disk = le_u16(&record[8..10]);
    let entries = le_u16(&record[10..12]);
    let cd_size = le_u32(&record[12..16]);
    let cd_offset = le_u32(&record[16..20]);

    if disk != 0 || cd_disk != 0 || entries_on_disk != entries {
        return Err(unsupported("multi-disk archives"));
    }
    if entries == u16::MAX || cd_size == u32::MAX || cd_offset == u32::MAX {
        return Err(unsupported("zip64 central directory"));
    }

    Ok(EndOfCentralDirectory {
        position: window_start + rel as u64,
        entries,
        cd_size,
        cd_offset,
    })
}
