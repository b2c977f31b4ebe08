//! Shared append-only byte buffer
//!
//! One producer appends; any number of consumers read from their own
//! position. Consumers come in two flavours:
//!
//! - [`AppendReader`] polls: it returns `ErrorKind::WouldBlock` when it has
//!   caught up with the producer, and `Ok(0)` once the buffer is closed.
//! - [`BlockingAppendReader`] waits on a condition variable until bytes or
//!   close arrive.
//!
//! Closing is sticky; appending after close is ignored.

use std::io::{self, Read, Write};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct BufferState {
    bytes: Vec<u8>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<BufferState>,
    grew: Condvar,
}

/// Handle to a shared append-only buffer
#[derive(Debug, Clone, Default)]
pub struct AppendBuffer {
    shared: Arc<Shared>,
}

impl AppendBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer handle. Dropping it closes the buffer.
    pub fn writer(&self) -> AppendWriter {
        AppendWriter {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Polling consumer starting at offset 0
    pub fn reader(&self) -> AppendReader {
        AppendReader {
            shared: Arc::clone(&self.shared),
            position: 0,
        }
    }

    /// Blocking consumer starting at offset 0
    pub fn blocking_reader(&self) -> BlockingAppendReader {
        BlockingAppendReader {
            shared: Arc::clone(&self.shared),
            position: 0,
        }
    }

    /// Bytes appended so far
    pub fn len(&self) -> usize {
        self.shared.state.lock().bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }
}

/// Producer side of an [`AppendBuffer`]
#[derive(Debug)]
pub struct AppendWriter {
    shared: Arc<Shared>,
}

impl AppendWriter {
    pub fn append(&mut self, bytes: &[u8]) {
        let mut state = self.shared.state.lock();
        if state.closed || bytes.is_empty() {
            return;
        }
        state.bytes.extend_from_slice(bytes);
        drop(state);
        self.shared.grew.notify_all();
    }

    /// Mark the end of the data; consumers see end-of-stream once caught up.
    pub fn close(&mut self) {
        self.shared.state.lock().closed = true;
        self.shared.grew.notify_all();
    }
}

impl Write for AppendWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.shared.state.lock().closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "append buffer is closed",
            ));
        }
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for AppendWriter {
    fn drop(&mut self) {
        self.close();
    }
}

fn copy_out(state: &BufferState, position: &mut usize, buf: &mut [u8]) -> usize {
    let available = &state.bytes[*position..];
    let n = available.len().min(buf.len());
    buf[..n].copy_from_slice(&available[..n]);
    *position += n;
    n
}

/// Non-blocking consumer of an [`AppendBuffer`]
#[derive(Debug)]
pub struct AppendReader {
    shared: Arc<Shared>,
    position: usize,
}

impl AppendReader {
    /// Offset of the next byte this reader will return
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Read for AppendReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let state = self.shared.state.lock();
        if self.position < state.bytes.len() {
            return Ok(copy_out(&state, &mut self.position, buf));
        }
        if state.closed {
            Ok(0)
        } else {
            Err(io::ErrorKind::WouldBlock.into())
        }
    }
}

/// Blocking consumer of an [`AppendBuffer`]
#[derive(Debug)]
pub struct BlockingAppendReader {
    shared: Arc<Shared>,
    position: usize,
}

impl Read for BlockingAppendReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock();
        while self.position >= state.bytes.len() && !state.closed {
            self.shared.grew.wait(&mut state);
        }
        Ok(copy_out(&state, &mut self.position, buf))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_polling_reader_reports_starvation() {
        let buffer = AppendBuffer::new();
        let mut writer = buffer.writer();
        let mut reader = buffer.reader();
        let mut out = [0u8; 8];

        let err = reader.read(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        writer.append(b"abc");
        assert_eq!(reader.read(&mut out).unwrap(), 3);
        assert_eq!(&out[..3], b"abc");
        assert_eq!(
            reader.read(&mut out).unwrap_err().kind(),
            io::ErrorKind::WouldBlock
        );

        writer.close();
        assert_eq!(reader.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_readers_have_independent_positions() {
        let buffer = AppendBuffer::new();
        let mut writer = buffer.writer();
        writer.append(b"hello");
        writer.close();

        let mut first = String::new();
        let mut second = String::new();
        buffer.reader().read_to_string(&mut first).unwrap();
        buffer.reader().read_to_string(&mut second).unwrap();
        assert_eq!(first, "hello");
        assert_eq!(second, "hello");
    }

    #[test]
    fn test_write_after_close_fails() {
        let buffer = AppendBuffer::new();
        let mut writer = buffer.writer();
        writer.close();
        assert!(writer.write(b"late").is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_dropping_writer_closes() {
        let buffer = AppendBuffer::new();
        drop(buffer.writer());
        assert!(buffer.is_closed());
    }

    #[test]
    fn test_blocking_reader_across_threads() {
        let buffer = AppendBuffer::new();
        let mut reader = buffer.blocking_reader();
        let mut writer = buffer.writer();

        let producer = thread::spawn(move || {
            for chunk in [b"one ".as_slice(), b"two ", b"three"] {
                writer.write_all(chunk).unwrap();
            }
        });

        let mut received = String::new();
        reader.read_to_string(&mut received).unwrap();
        producer.join().unwrap();
        assert_eq!(received, "one two three");
    }
}
