//! Byte sources that grow while they are read

pub mod append_buffer;

pub use append_buffer::{AppendBuffer, AppendReader, AppendWriter, BlockingAppendReader};
