//! Forward-only ZIP reader over a non-seekable, possibly growing byte source
//!
//! The reader trusts local file headers only. For entries with a declared
//! compressed size it never pulls a byte past the end of the current record,
//! so the source may still be in the middle of being written.
//!
//! # State machine
//!
//! ```text
//! AwaitingHeader --local header--> ReadingBody --body done--> AwaitingHeader
//!                                       |                          ^
//!                                       +--bit 3--> ReadingDescriptor
//! AwaitingHeader --central dir / EOCD / EOF--> Finished
//! ```
//!
//! Every state may return [`BundleFsError::NotYetAvailable`] when the source
//! reports `WouldBlock`. Partially read records stay in the lookahead buffer,
//! so calling again after more bytes arrive resumes exactly where it stopped.

use std::io::{self, Read};

use flate2::{Decompress, FlushDecompress, Status};
use tracing::{debug, trace};

use super::header::{
    CompressionMethod, DataDescriptor, HeaderFields, LOCAL_HEADER_LEN, SIG_ARCHIVE_EXTRA_DATA,
    SIG_CENTRAL_DIRECTORY, SIG_DIGITAL_SIGNATURE, SIG_END_OF_CENTRAL_DIRECTORY,
    SIG_LOCAL_FILE_HEADER, SIG_ZIP64_END_OF_CENTRAL_DIRECTORY, ZipEntryDescriptor, le_u32,
};
use crate::error::archive::{corrupt, integrity, unsupported};
use crate::error::{BundleFsError, Result};

const READ_CHUNK: usize = 64 * 1024;
const SKIP_CHUNK: usize = 8 * 1024;

/// Bytes pulled from the source but not yet consumed by the parser
struct ByteFeed<R> {
    source: R,
    buf: Vec<u8>,
    start: usize,
    /// Stream offset of `buf[start]`
    offset: u64,
}

impl<R: Read> ByteFeed<R> {
    fn new(source: R, offset: u64) -> Self {
        Self {
            source,
            buf: Vec::new(),
            start: 0,
            offset,
        }
    }

    fn buffered(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.buffered().len());
        self.start += n;
        self.offset += n as u64;
        if self.start == self.buf.len() {
            self.buf.clear();
            self.start = 0;
        }
    }

    /// Read at most `max` more bytes from the source. `Ok(0)` is end of stream.
    fn pull(&mut self, max: usize) -> Result<usize> {
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }
        let old_len = self.buf.len();
        self.buf.resize(old_len + max, 0);
        loop {
            match self.source.read(&mut self.buf[old_len..]) {
                Ok(read) => {
                    self.buf.truncate(old_len + read);
                    return Ok(read);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.buf.truncate(old_len);
                    return Err(err.into());
                }
            }
        }
    }

    /// Buffer at least `n` bytes, reading no more than the shortfall.
    ///
    /// Returns `Ok(false)` when the stream ends first.
    fn fill_to(&mut self, n: usize) -> Result<bool> {
        while self.buffered().len() < n {
            let shortfall = n - self.buffered().len();
            if self.pull(shortfall)? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Result of one decoding step on an entry body
enum BodyStep {
    Data(usize),
    End,
}

/// Decoding progress through the current entry
struct EntryBody {
    descriptor: ZipEntryDescriptor,
    inflater: Option<Decompress>,
    crc: crc32fast::Hasher,
    compressed_read: u64,
    produced: u64,
    stream_ended: bool,
    verify_crc: bool,
}

impl EntryBody {
    fn new(descriptor: ZipEntryDescriptor) -> Self {
        Self {
            descriptor,
            inflater: None,
            crc: crc32fast::Hasher::new(),
            compressed_read: 0,
            produced: 0,
            stream_ended: false,
            verify_crc: true,
        }
    }

    fn has_known_size(&self) -> bool {
        !self.descriptor.uses_data_descriptor()
    }

    fn compressed_remaining(&self) -> u64 {
        self.descriptor
            .compressed_size
            .saturating_sub(self.compressed_read)
    }

    fn record(&mut self, output: &[u8]) {
        self.crc.update(output);
        self.produced += output.len() as u64;
    }

    fn truncated(&self) -> BundleFsError {
        corrupt(format!(
            "stream ended inside the body of '{}'",
            self.descriptor.filename
        ))
    }

    fn read<R: Read>(&mut self, feed: &mut ByteFeed<R>, out: &mut [u8]) -> Result<BodyStep> {
        if out.is_empty() {
            return Ok(BodyStep::Data(0));
        }
        match self.descriptor.compression_method {
            CompressionMethod::Stored => self.read_stored(feed, out),
            CompressionMethod::Deflated => self.read_deflated(feed, out),
            CompressionMethod::Other(method) => Err(unsupported(format!(
                "compression method {method} for entry '{}'",
                self.descriptor.filename
            ))),
        }
    }

    fn read_stored<R: Read>(&mut self, feed: &mut ByteFeed<R>, out: &mut [u8]) -> Result<BodyStep> {
        let remaining = self.compressed_remaining();
        if remaining == 0 {
            return Ok(BodyStep::End);
        }
        let limit = usize::try_from(remaining)
            .unwrap_or(usize::MAX)
            .min(out.len())
            .min(READ_CHUNK);
        if feed.buffered().is_empty() && feed.pull(limit)? == 0 {
            return Err(self.truncated());
        }

        let n = feed.buffered().len().min(limit);
        out[..n].copy_from_slice(&feed.buffered()[..n]);
        feed.consume(n);
        self.compressed_read += n as u64;
        self.record(&out[..n]);
        Ok(BodyStep::Data(n))
    }

    fn read_deflated<R: Read>(
        &mut self,
        feed: &mut ByteFeed<R>,
        out: &mut [u8],
    ) -> Result<BodyStep> {
        loop {
            if self.stream_ended {
                return Ok(BodyStep::End);
            }

            let known = self.has_known_size();
            let remaining = usize::try_from(self.compressed_remaining()).unwrap_or(usize::MAX);
            let available = feed.buffered().len();
            let offered = if known {
                available.min(remaining)
            } else {
                available
            };

            let inflater = self.inflater.get_or_insert_with(|| Decompress::new(false));
            let in_before = inflater.total_in();
            let out_before = inflater.total_out();
            let status = inflater
                .decompress(&feed.buffered()[..offered], out, FlushDecompress::None)
                .map_err(|err| {
                    corrupt(format!(
                        "invalid deflate data in '{}': {err}",
                        self.descriptor.filename
                    ))
                })?;
            let consumed = usize::try_from(inflater.total_in() - in_before).unwrap_or(offered);
            let produced = usize::try_from(inflater.total_out() - out_before).unwrap_or(out.len());

            feed.consume(consumed);
            self.compressed_read += consumed as u64;
            self.record(&out[..produced]);
            if status == Status::StreamEnd {
                self.stream_ended = true;
            }

            if produced > 0 {
                return Ok(BodyStep::Data(produced));
            }
            if self.stream_ended {
                return Ok(BodyStep::End);
            }
            if consumed > 0 {
                continue;
            }

            // No progress with what is buffered: fetch more compressed input.
            let want = if known {
                remaining.saturating_sub(offered)
            } else {
                READ_CHUNK
            };
            if want == 0 {
                return Err(corrupt(format!(
                    "deflate stream of '{}' does not end within its declared size",
                    self.descriptor.filename
                )));
            }
            if feed.pull(want.min(READ_CHUNK))? == 0 {
                return Err(self.truncated());
            }
        }
    }

    /// Discard the rest of a body whose compressed size is known.
    fn discard<R: Read>(&mut self, feed: &mut ByteFeed<R>) -> Result<()> {
        loop {
            let remaining = self.compressed_remaining();
            if remaining == 0 {
                return Ok(());
            }
            if feed.buffered().is_empty() {
                let want = usize::try_from(remaining)
                    .unwrap_or(usize::MAX)
                    .min(READ_CHUNK);
                if feed.pull(want)? == 0 {
                    return Err(self.truncated());
                }
            }
            let n = usize::try_from(remaining)
                .unwrap_or(usize::MAX)
                .min(feed.buffered().len());
            feed.consume(n);
            self.compressed_read += n as u64;
        }
    }

    /// Compare what was actually read against the declared trailer.
    fn verify(self, expected: DataDescriptor) -> Result<()> {
        let name = &self.descriptor.filename;
        if self.compressed_read != expected.compressed_size {
            return Err(corrupt(format!(
                "entry '{name}' has {} compressed bytes, header declares {}",
                self.compressed_read, expected.compressed_size
            )));
        }
        if self.produced != expected.uncompressed_size {
            return Err(corrupt(format!(
                "entry '{name}' decompressed to {} bytes, header declares {}",
                self.produced, expected.uncompressed_size
            )));
        }
        if self.verify_crc {
            let actual = self.crc.finalize();
            if actual != expected.crc32 {
                return Err(integrity(name.clone(), expected.crc32, actual));
            }
        }
        trace!(entry = %name, size = self.produced, "entry body verified");
        Ok(())
    }
}

enum ReaderState {
    AwaitingHeader,
    ReadingBody(EntryBody),
    ReadingDescriptor(EntryBody),
    Finished,
}

/// Entry-by-entry ZIP parser over any [`Read`] source
///
/// ```
/// use bundlefs::archive::StreamingZipReader;
///
/// # fn main() -> bundlefs::error::Result<()> {
/// let empty_archive = [0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
/// let mut reader = StreamingZipReader::new(&empty_archive[..]);
/// assert!(reader.next_entry()?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct StreamingZipReader<R> {
    feed: ByteFeed<R>,
    state: ReaderState,
    current: Option<ZipEntryDescriptor>,
}

impl<R: Read> StreamingZipReader<R> {
    pub fn new(source: R) -> Self {
        Self::at_offset(source, 0)
    }

    /// Reader whose source starts `offset` bytes into the archive.
    ///
    /// Used after seeking straight to a local header found through the
    /// central directory, so `header_offset` stays archive-relative.
    pub fn at_offset(source: R, offset: u64) -> Self {
        Self {
            feed: ByteFeed::new(source, offset),
            state: ReaderState::AwaitingHeader,
            current: None,
        }
    }

    /// Advance to the next entry, discarding any unread body of the current one.
    ///
    /// Returns `Ok(None)` once the central directory or the end of the stream
    /// is reached. [`BundleFsError::NotYetAvailable`] leaves the reader
    /// untouched; any other error ends iteration.
    pub fn next_entry(&mut self) -> Result<Option<ZipEntryDescriptor>> {
        match self.advance() {
            Err(err) if !err.is_retryable() => {
                self.finish();
                Err(err)
            }
            other => other,
        }
    }

    /// Advance to the next entry with its final CRC and sizes.
    ///
    /// For bit-3 entries the header carries zeros and the real values trail
    /// the body, so the body is skipped to reach them. The returned entry can
    /// no longer be opened.
    pub fn next_complete_entry(&mut self) -> Result<Option<ZipEntryDescriptor>> {
        if self.next_entry()?.is_none() {
            return Ok(None);
        }
        self.complete_entry()
    }

    /// Skip the rest of the current body and return the current entry with
    /// the values from its data descriptor, if it has one.
    ///
    /// After [`BundleFsError::NotYetAvailable`], call again to resume.
    pub fn complete_entry(&mut self) -> Result<Option<ZipEntryDescriptor>> {
        if let Err(err) = self.skip_current() {
            if !err.is_retryable() {
                self.finish();
            }
            return Err(err);
        }
        Ok(self.current.clone())
    }

    /// Scan forward to the entry named `name`.
    pub fn find_entry(&mut self, name: &str) -> Result<Option<ZipEntryDescriptor>> {
        while let Some(descriptor) = self.next_entry()? {
            if descriptor.filename == name {
                return Ok(Some(descriptor));
            }
        }
        Ok(None)
    }

    /// Open the body of the entry most recently returned by [`Self::next_entry`].
    ///
    /// # Panics
    ///
    /// Panics if `descriptor` is not the current entry.
    pub fn open_entry(&mut self, descriptor: &ZipEntryDescriptor) -> Result<EntryReader<'_, R>> {
        self.check_current(descriptor)?;
        Ok(EntryReader { reader: self })
    }

    /// Owning variant of [`Self::open_entry`].
    ///
    /// # Panics
    ///
    /// Panics if `descriptor` is not the current entry.
    pub fn into_entry_reader(
        self,
        descriptor: &ZipEntryDescriptor,
    ) -> Result<OwnedEntryReader<R>> {
        self.check_current(descriptor)?;
        Ok(OwnedEntryReader { reader: self })
    }

    fn check_current(&self, descriptor: &ZipEntryDescriptor) -> Result<()> {
        let is_current = self.current.as_ref().is_some_and(|current| {
            current.header_offset == descriptor.header_offset
                && current.filename == descriptor.filename
        });
        assert!(
            is_current,
            "entry '{}' is not the current entry of this reader",
            descriptor.filename
        );
        check_decodable(descriptor)
    }

    fn finish(&mut self) {
        self.state = ReaderState::Finished;
        self.current = None;
    }

    fn advance(&mut self) -> Result<Option<ZipEntryDescriptor>> {
        if matches!(self.state, ReaderState::Finished) {
            return Ok(None);
        }
        self.skip_current()?;

        let offset = self.feed.offset();
        if !self.feed.fill_to(4)? {
            if self.feed.buffered().is_empty() {
                trace!(offset, "end of stream at record boundary");
                self.finish();
                return Ok(None);
            }
            return Err(corrupt(format!("truncated record signature at offset {offset}")));
        }

        match le_u32(&self.feed.buffered()[..4]) {
            SIG_LOCAL_FILE_HEADER => {}
            SIG_CENTRAL_DIRECTORY
            | SIG_END_OF_CENTRAL_DIRECTORY
            | SIG_ZIP64_END_OF_CENTRAL_DIRECTORY
            | SIG_DIGITAL_SIGNATURE
            | SIG_ARCHIVE_EXTRA_DATA => {
                trace!(offset, "reached central directory");
                self.finish();
                return Ok(None);
            }
            other => {
                return Err(corrupt(format!(
                    "unexpected signature {other:#010x} at offset {offset}"
                )));
            }
        }

        if !self.feed.fill_to(LOCAL_HEADER_LEN)? {
            return Err(corrupt(format!("truncated local file header at offset {offset}")));
        }
        let mut fixed = [0u8; LOCAL_HEADER_LEN];
        fixed.copy_from_slice(&self.feed.buffered()[..LOCAL_HEADER_LEN]);
        let fields = HeaderFields::from_local(&fixed);

        let name_end = LOCAL_HEADER_LEN + fields.name_len;
        let record_len = name_end + fields.extra_len;
        if !self.feed.fill_to(record_len)? {
            return Err(corrupt(format!("truncated local file header at offset {offset}")));
        }
        let descriptor =
            fields.into_descriptor(&self.feed.buffered()[LOCAL_HEADER_LEN..name_end], offset)?;
        self.feed.consume(record_len);

        debug!(
            entry = %descriptor.filename,
            offset,
            compressed = descriptor.compressed_size,
            "parsed local file header"
        );
        self.state = ReaderState::ReadingBody(EntryBody::new(descriptor.clone()));
        self.current = Some(descriptor.clone());
        Ok(Some(descriptor))
    }

    fn skip_current(&mut self) -> Result<()> {
        if let ReaderState::ReadingBody(body) = &mut self.state {
            if body.has_known_size() {
                body.discard(&mut self.feed)?;
                self.state = ReaderState::AwaitingHeader;
                return Ok(());
            }
            // The end of a bit-3 body is only found by inflating it.
            check_decodable(&body.descriptor)?;
            body.verify_crc = false;
        }

        let mut scratch = vec![0u8; SKIP_CHUNK];
        while matches!(
            self.state,
            ReaderState::ReadingBody(_) | ReaderState::ReadingDescriptor(_)
        ) {
            self.read_body(&mut scratch)?;
        }
        Ok(())
    }

    fn read_body(&mut self, out: &mut [u8]) -> Result<usize> {
        loop {
            match &mut self.state {
                ReaderState::AwaitingHeader | ReaderState::Finished => return Ok(0),
                ReaderState::ReadingBody(body) => match body.read(&mut self.feed, out)? {
                    BodyStep::Data(n) => return Ok(n),
                    BodyStep::End => self.complete_body()?,
                },
                ReaderState::ReadingDescriptor(_) => self.read_data_descriptor()?,
            }
        }
    }

    fn complete_body(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, ReaderState::AwaitingHeader) {
            ReaderState::ReadingBody(body) if body.descriptor.uses_data_descriptor() => {
                self.state = ReaderState::ReadingDescriptor(body);
                Ok(())
            }
            ReaderState::ReadingBody(body) => {
                let declared = DataDescriptor {
                    crc32: body.descriptor.crc32,
                    compressed_size: body.descriptor.compressed_size,
                    uncompressed_size: body.descriptor.uncompressed_size,
                };
                body.verify(declared)
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    fn read_data_descriptor(&mut self) -> Result<()> {
        let truncated = || corrupt("truncated data descriptor");
        if !self.feed.fill_to(4)? {
            return Err(truncated());
        }
        let len = DataDescriptor::encoded_len(&self.feed.buffered()[..4]);
        if !self.feed.fill_to(len)? {
            return Err(truncated());
        }
        let trailer = DataDescriptor::parse(&self.feed.buffered()[..len]);
        self.feed.consume(len);
        if let Some(current) = &mut self.current {
            current.crc32 = trailer.crc32;
            current.compressed_size = trailer.compressed_size;
            current.uncompressed_size = trailer.uncompressed_size;
        }

        match std::mem::replace(&mut self.state, ReaderState::AwaitingHeader) {
            ReaderState::ReadingDescriptor(body) => body.verify(trailer),
            other => {
                self.state = other;
                Ok(())
            }
        }
    }
}

impl<R: Read> Iterator for StreamingZipReader<R> {
    type Item = Result<ZipEntryDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// Reject entries whose body this reader cannot decode.
fn check_decodable(descriptor: &ZipEntryDescriptor) -> Result<()> {
    let name = &descriptor.filename;
    if descriptor.is_encrypted() {
        return Err(unsupported(format!("entry '{name}' is encrypted")));
    }
    match descriptor.compression_method {
        CompressionMethod::Deflated => Ok(()),
        CompressionMethod::Stored if descriptor.uses_data_descriptor() => Err(unsupported(format!(
            "stored entry '{name}' has no declared size"
        ))),
        CompressionMethod::Stored => Ok(()),
        CompressionMethod::Other(method) => Err(unsupported(format!(
            "compression method {method} for entry '{name}'"
        ))),
    }
}

/// Decompressing view of the current entry body
///
/// Archive errors travel through [`io::Error`] and convert back with `?`
/// into [`BundleFsError`]. Starvation surfaces as `ErrorKind::WouldBlock`.
pub struct EntryReader<'a, R> {
    reader: &'a mut StreamingZipReader<R>,
}

impl<R: Read> EntryReader<'_, R> {
    /// Read the remaining body into memory, verifying it.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        self.read_to_end(&mut contents)?;
        Ok(contents)
    }
}

impl<R: Read> Read for EntryReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read_body(buf).map_err(io::Error::from)
    }
}

/// [`EntryReader`] that owns its archive reader
pub struct OwnedEntryReader<R> {
    reader: StreamingZipReader<R>,
}

impl<R: Read> Read for OwnedEntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read_body(buf).map_err(io::Error::from)
    }
}
