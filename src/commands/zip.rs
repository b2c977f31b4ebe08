//! Zip command implementation
//!
//! Reads archives front to back, so `-` (stdin) works even when the bytes
//! are still arriving through a pipe.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use console::Style;
use tracing::debug;

use crate::cli::zip::{ZipCatArgs, ZipListArgs};
use bundlefs::archive::{CompressionMethod, StreamingZipReader, ZipEntryDescriptor};
use bundlefs::error::Result;
use bundlefs::error::archive::entry_not_found;
use bundlefs::error::fs::io_context;

fn open_source(path: &Path) -> Result<Box<dyn Read>> {
    if path == Path::new("-") {
        debug!("reading archive from stdin");
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path)
        .map_err(|err| io_context(&format!("open {}", path.display()), err))?;
    Ok(Box::new(file))
}

/// List entries in archive order
pub fn list(args: ZipListArgs) -> Result<()> {
    let mut reader = StreamingZipReader::new(open_source(&args.archive)?);
    let mut stdout = io::stdout().lock();
    while let Some(entry) = reader.next_complete_entry()? {
        if args.json {
            writeln!(stdout, "{}", serde_json::to_string(&entry)?)?;
        } else {
            writeln!(stdout, "{}", format_entry(&entry))?;
        }
    }
    Ok(())
}

/// Write one entry's bytes to stdout
pub fn cat(args: ZipCatArgs) -> Result<()> {
    let blob = args.archive.display().to_string();
    let mut reader = StreamingZipReader::new(open_source(&args.archive)?);
    let descriptor = reader
        .find_entry(&args.entry)?
        .ok_or_else(|| entry_not_found(&blob, &args.entry))?;

    let mut body = reader.open_entry(&descriptor)?;
    let mut stdout = io::stdout().lock();
    io::copy(&mut body, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn format_entry(entry: &ZipEntryDescriptor) -> String {
    let method = match entry.compression_method {
        CompressionMethod::Stored => "stored".to_string(),
        CompressionMethod::Deflated => "deflate".to_string(),
        CompressionMethod::Other(code) => format!("method-{code}"),
    };
    let (year, month, day, hour, minute, _) = entry.last_modified.date_time();
    let name = if entry.is_directory {
        Style::new().bold().blue().apply_to(&entry.filename)
    } else {
        Style::new().apply_to(&entry.filename)
    };
    format!(
        "{:>10}  {method:<8} {:08x}  {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}  {name}",
        entry.uncompressed_size, entry.crc32
    )
}
