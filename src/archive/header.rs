//! ZIP record layouts shared by the streaming and central-directory readers
//!
//! # Invariants
//! - Every fixed-size record is decoded from a slice whose length was checked
//!   by the caller; the helpers here never read past `N` bytes.
//! - Size and offset fields are returned verbatim; callers decide whether to
//!   trust them.
//!
//! Layouts (all little-endian):
//! - Local file header: 30 fixed bytes + name + extra field.
//! - Central directory header: 46 fixed bytes + name + extra + comment.
//! - End of central directory: 22 fixed bytes + comment.
//! - Data descriptor: optional signature + CRC-32 + compressed + uncompressed.

use serde::Serialize;

use crate::error::Result;
use crate::error::archive::unsupported;

/// Local file header:      PK 03 04
pub const SIG_LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
/// Central directory:      PK 01 02
pub const SIG_CENTRAL_DIRECTORY: u32 = 0x0201_4b50;
/// End of central dir:     PK 05 06
pub const SIG_END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
/// Zip64 end of central dir: PK 06 06
pub const SIG_ZIP64_END_OF_CENTRAL_DIRECTORY: u32 = 0x0606_4b50;
/// Digital signature:      PK 05 05
pub const SIG_DIGITAL_SIGNATURE: u32 = 0x0505_4b50;
/// Archive extra data:     PK 06 08
pub const SIG_ARCHIVE_EXTRA_DATA: u32 = 0x0806_4b50;
/// Data descriptor:        PK 07 08
pub const SIG_DATA_DESCRIPTOR: u32 = 0x0807_4b50;

pub const LOCAL_HEADER_LEN: usize = 30;
pub const CENTRAL_HEADER_LEN: usize = 46;
pub const END_OF_CENTRAL_DIRECTORY_LEN: usize = 22;

/// General purpose flag: entry is encrypted
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// General purpose flag: CRC and sizes follow the body in a data descriptor
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

const ZIP64_SENTINEL_U32: u32 = 0xFFFF_FFFF;

#[inline]
pub fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

#[inline]
pub fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Compression method of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompressionMethod {
    Stored,
    Deflated,
    Other(u16),
}

impl CompressionMethod {
    pub fn from_u16(raw: u16) -> Self {
        match raw {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflated,
            other => CompressionMethod::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflated => 8,
            CompressionMethod::Other(raw) => raw,
        }
    }
}

/// MS-DOS packed date and time, as stored in ZIP headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl DosDateTime {
    pub fn year(self) -> u16 {
        1980 + (self.date >> 9)
    }

    pub fn month(self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    pub fn day(self) -> u8 {
        (self.date & 0x1F) as u8
    }

    pub fn hour(self) -> u8 {
        (self.time >> 11) as u8
    }

    pub fn minute(self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    /// DOS stores seconds halved, so this is always even
    pub fn second(self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }

    /// `(year, month, day, hour, minute, second)`
    pub fn date_time(self) -> (u16, u8, u8, u8, u8, u8) {
        (
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second(),
        )
    }
}

/// Metadata for one archive entry
///
/// Directory entries are recognized by a trailing `/` in `filename`.
/// `extract_version` and `reserved` are the low and high bytes of the
/// "version needed to extract" field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZipEntryDescriptor {
    pub filename: String,
    pub is_directory: bool,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: CompressionMethod,
    pub crc32: u32,
    pub last_modified: DosDateTime,
    pub header_offset: u64,
    pub flag_bits: u16,
    pub extract_version: u8,
    pub reserved: u8,
}

impl ZipEntryDescriptor {
    pub fn is_encrypted(&self) -> bool {
        self.flag_bits & FLAG_ENCRYPTED != 0
    }

    pub fn uses_data_descriptor(&self) -> bool {
        self.flag_bits & FLAG_DATA_DESCRIPTOR != 0
    }
}

/// Fixed fields common to local and central headers, before the name is attached
#[derive(Debug, Clone, Copy)]
pub struct HeaderFields {
    pub extract_version: u8,
    pub reserved: u8,
    pub flag_bits: u16,
    pub method: u16,
    pub last_modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: usize,
    pub extra_len: usize,
}

impl HeaderFields {
    /// Decode the 30-byte local file header (signature already checked).
    pub fn from_local(fixed: &[u8; LOCAL_HEADER_LEN]) -> Self {
        Self {
            extract_version: fixed[4],
            reserved: fixed[5],
            flag_bits: le_u16(&fixed[6..8]),
            method: le_u16(&fixed[8..10]),
            last_modified: DosDateTime {
                time: le_u16(&fixed[10..12]),
                date: le_u16(&fixed[12..14]),
            },
            crc32: le_u32(&fixed[14..18]),
            compressed_size: le_u32(&fixed[18..22]),
            uncompressed_size: le_u32(&fixed[22..26]),
            name_len: le_u16(&fixed[26..28]) as usize,
            extra_len: le_u16(&fixed[28..30]) as usize,
        }
    }

    /// Decode the 46-byte central directory header (signature already checked).
    ///
    /// Returns the fields plus `(comment_len, local_header_offset)`.
    pub fn from_central(fixed: &[u8]) -> (Self, usize, u32) {
        let fields = Self {
            extract_version: fixed[6],
            reserved: fixed[7],
            flag_bits: le_u16(&fixed[8..10]),
            method: le_u16(&fixed[10..12]),
            last_modified: DosDateTime {
                time: le_u16(&fixed[12..14]),
                date: le_u16(&fixed[14..16]),
            },
            crc32: le_u32(&fixed[16..20]),
            compressed_size: le_u32(&fixed[20..24]),
            uncompressed_size: le_u32(&fixed[24..28]),
            name_len: le_u16(&fixed[28..30]) as usize,
            extra_len: le_u16(&fixed[30..32]) as usize,
        };
        let comment_len = le_u16(&fixed[32..34]) as usize;
        let local_offset = le_u32(&fixed[42..46]);
        (fields, comment_len, local_offset)
    }

    /// Attach the entry name and offset, rejecting Zip64 sentinel sizes.
    pub fn into_descriptor(self, name: &[u8], header_offset: u64) -> Result<ZipEntryDescriptor> {
        let filename = decode_name(name);
        if self.compressed_size == ZIP64_SENTINEL_U32 || self.uncompressed_size == ZIP64_SENTINEL_U32
        {
            return Err(unsupported(format!("zip64 sizes for entry '{filename}'")));
        }

        Ok(ZipEntryDescriptor {
            is_directory: filename.ends_with('/'),
            filename,
            compressed_size: u64::from(self.compressed_size),
            uncompressed_size: u64::from(self.uncompressed_size),
            compression_method: CompressionMethod::from_u16(self.method),
            crc32: self.crc32,
            last_modified: self.last_modified,
            header_offset,
            flag_bits: self.flag_bits,
            extract_version: self.extract_version,
            reserved: self.reserved,
        })
    }
}

/// CRC and sizes carried by a data descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// Length of the descriptor starting at `bytes`: 16 with signature, 12 without.
    pub fn encoded_len(first_four: &[u8]) -> usize {
        if le_u32(first_four) == SIG_DATA_DESCRIPTOR {
            16
        } else {
            12
        }
    }

    /// Decode a descriptor of `encoded_len` bytes.
    pub fn parse(bytes: &[u8]) -> Self {
        let body = if bytes.len() == 16 { &bytes[4..] } else { bytes };
        Self {
            crc32: le_u32(&body[0..4]),
            compressed_size: u64::from(le_u32(&body[4..8])),
            uncompressed_size: u64::from(le_u32(&body[8..12])),
        }
    }
}

/// Names are read as UTF-8 whatever the flags say; invalid bytes become U+FFFD.
fn decode_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}
