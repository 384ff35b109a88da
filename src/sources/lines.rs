//! Line-oriented JSON reader with envelope unwrapping and a whole-document fallback.

use super::{open_reader, ParseContext, ParseStats, RawRecord, RecordParser, RecordSink, SourceFile};
use crate::error::Result;
use std::io::{BufRead, Read};
use tracing::debug;

/// Parse one line as a JSON object. Lines carrying a text prefix before the
/// object (syslog-forwarded JSON) are retried from the first `{`.
pub fn parse_line(line: &str) -> Option<RawRecord> {
    let line = line.trim();
    if let Some(rec) = serde_json::from_str(line).ok().and_then(RawRecord::from_json) {
        return Some(rec.unwrap_envelope());
    }
    let idx = line.find('{').filter(|i| *i > 0)?;
    serde_json::from_str(&line[idx..])
        .ok()
        .and_then(RawRecord::from_json)
        .map(RawRecord::unwrap_envelope)
}

pub struct LineParser;

impl LineParser {
    /// Whole file as one object or a list of objects.
    fn parse_document(&self, file: &SourceFile, sink: &mut RecordSink<'_>) -> Result<Option<ParseStats>> {
        let mut bytes = Vec::new();
        open_reader(&file.path)?.read_to_end(&mut bytes)?;
        let text = String::from_utf8_lossy(&bytes);
        let Ok(doc) = serde_json::from_str::<serde_json::Value>(text.trim()) else {
            return Ok(None);
        };
        let items = match doc {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        let mut stats = ParseStats::default();
        for item in items {
            match RawRecord::from_json(item) {
                Some(rec) => {
                    stats.records += 1;
                    if sink(rec.unwrap_envelope()).is_break() {
                        break;
                    }
                }
                None => stats.skipped += 1,
            }
        }
        Ok(Some(stats))
    }
}

impl RecordParser for LineParser {
    fn parse(&self, file: &SourceFile, ctx: &ParseContext<'_>, sink: &mut RecordSink<'_>) -> Result<ParseStats> {
        let mut reader = open_reader(&file.path)?;
        let mut stats = ParseStats::default();
        let mut buf = Vec::new();
        let mut non_blank = 0usize;
        let check_every = ctx.chunk_rows.max(1);

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if line.trim().is_empty() {
                continue;
            }
            non_blank += 1;
            match parse_line(&line) {
                Some(rec) => {
                    stats.records += 1;
                    if sink(rec).is_break() {
                        return Ok(stats);
                    }
                }
                None => stats.skipped += 1,
            }
            if non_blank % check_every == 0 && ctx.stop.is_set() {
                return Ok(stats);
            }
        }

        if stats.records == 0 && non_blank > 0 {
            if let Some(doc_stats) = self.parse_document(file, sink)? {
                debug!(path = %file.path.display(), records = doc_stats.records, "parsed as whole document");
                return Ok(doc_stats);
            }
        }
        Ok(stats)
    }
}
