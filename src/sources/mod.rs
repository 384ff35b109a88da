//! Log sources: directory scan, format classification and per-format parsers.
//! Parsers hand raw records to a sink; malformed rows are counted, never raised.

mod lines;
mod origin;
mod record;
mod scanner;
mod tabular;

pub use lines::{parse_line, LineParser};
pub use origin::Origin;
pub use record::{RawRecord, RawValue, Scalar};
pub use scanner::{classify, scan, Scan, SourceFile, SourceFormat};
pub use tabular::{sniff_delimiter, TabularParser};

use crate::error::Result;
use crate::pipeline::StopSignal;
use flate2::read::MultiGzDecoder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::ControlFlow;
use std::path::Path;

/// Receives records in file order. `Break` stops the current file.
pub type RecordSink<'a> = dyn FnMut(RawRecord) -> ControlFlow<()> + 'a;

/// Per-file parse counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub records: u64,
    pub skipped: u64,
}

/// Limits and the stop flag shared by all parsers of a run.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub chunk_rows: usize,
    pub sniff_bytes: usize,
    pub stop: &'a StopSignal,
}

/// A reader for one classified file.
pub trait RecordParser {
    fn parse(&self, file: &SourceFile, ctx: &ParseContext<'_>, sink: &mut RecordSink<'_>) -> Result<ParseStats>;
}

/// Dispatch on the classified format.
pub fn parse_file(file: &SourceFile, ctx: &ParseContext<'_>, sink: &mut RecordSink<'_>) -> Result<ParseStats> {
    match file.format {
        SourceFormat::Tabular => TabularParser.parse(file, ctx, sink),
        SourceFormat::Lines => LineParser.parse(file, ctx, sink),
    }
}

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Buffered reader, transparently gunzipping `.gz` files.
pub(crate) fn open_reader(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// First `n` bytes of the (decompressed) content.
pub(crate) fn read_head(path: &Path, n: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(n.min(1 << 20));
    open_reader(path)?.take(n as u64).read_to_end(&mut buf)?;
    Ok(buf)
}
