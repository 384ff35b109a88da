//! Split a large CSV into `part_N.csv` files of bounded size, header repeated in each.

use crate::error::{Error, Result};
use crate::sources::sniff_delimiter;
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const SNIFF_BYTES: u64 = 64 * 1024;

/// Rows are copied byte-for-byte. Returns the written parts in order.
///
/// Record boundaries come from the CSV reader, so quoted cells spanning several
/// lines stay in one piece. A part always receives at least one row, so a single
/// oversized row still lands somewhere.
pub fn split_by_size(input: &Path, out_dir: &Path, max_bytes: u64) -> Result<Vec<PathBuf>> {
    let mut head = Vec::new();
    File::open(input)?.take(SNIFF_BYTES).read_to_end(&mut head)?;
    let mut records = ReaderBuilder::new()
        .delimiter(sniff_delimiter(&head))
        .flexible(true)
        .has_headers(true)
        .from_reader(BufReader::new(File::open(input)?));
    records.byte_headers()?;
    let header_len = records.position().byte();
    if header_len == 0 {
        return Err(Error::EmptyDataset(input.to_path_buf()));
    }

    // second handle over the same bytes, advanced in step with the record offsets
    let mut raw = BufReader::new(File::open(input)?);
    let mut header = Vec::with_capacity(header_len as usize);
    (&mut raw).take(header_len).read_to_end(&mut header)?;
    std::fs::create_dir_all(out_dir)?;

    let mut parts = Vec::new();
    let mut current: Option<(BufWriter<File>, u64, u64)> = None;
    let mut record = ByteRecord::new();
    let mut offset = header_len;
    while records.read_byte_record(&mut record)? {
        let end = records.position().byte();
        let len = end - offset;
        offset = end;
        let full = matches!(&current, Some((_, size, rows)) if *rows > 0 && size + len > max_bytes);
        if current.is_none() || full {
            if let Some((mut w, _, _)) = current.take() {
                w.flush()?;
            }
            let path = out_dir.join(format!("part_{}.csv", parts.len() + 1));
            let mut w = BufWriter::new(File::create(&path)?);
            w.write_all(&header)?;
            parts.push(path);
            current = Some((w, header.len() as u64, 0));
        }
        if let Some((w, size, rows)) = current.as_mut() {
            io::copy(&mut (&mut raw).take(len), w)?;
            *size += len;
            *rows += 1;
        }
    }
    if let Some((mut w, _, _)) = current.take() {
        w.flush()?;
    }
    info!(input = %input.display(), parts = parts.len(), "table split");
    Ok(parts)
}
