//! Delimited-tabular reader: delimiter sniffing, chunked reads, alias-resolved columns.

use super::{open_reader, read_head, ParseContext, ParseStats, RawRecord, RawValue, RecordParser, RecordSink, SourceFile};
use crate::error::Result;
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use tracing::debug;

const CANDIDATE_DELIMITERS: &[u8] = b",;\t|";
const DEFAULT_DELIMITER: u8 = b',';
const SNIFF_LINES: usize = 20;

/// Logical column: record key it produces, raw header aliases, integer coercion.
struct LogicalColumn {
    key: &'static str,
    aliases: &'static [&'static str],
    integer: bool,
}

const fn col(key: &'static str, aliases: &'static [&'static str], integer: bool) -> LogicalColumn {
    LogicalColumn { key, aliases, integer }
}

/// Header aliases. Matching ignores case, spaces, `-`, `_` and `.`.
const COLUMNS: &[LogicalColumn] = &[
    col("timestamp", &["timestamp", "time", "@timestamp", "date", "event_time", "eventtime", "ts"], false),
    col(
        "src_ip",
        &[
            "src_ip", "source_ip", "client_ip", "ip_src", "ipsrc", "src", "source", "srcip",
            "network.src_ip", "ip.src", "flow.src_ip", "srcaddr",
        ],
        false,
    ),
    col(
        "dest_ip",
        &[
            "dest_ip", "dst_ip", "destination_ip", "server_ip", "ip_dst", "ipdst", "dst", "destination",
            "dstip", "network.dst_ip", "ip.dst", "flow.dst_ip", "dstaddr",
        ],
        false,
    ),
    col(
        "src_port",
        &["src_port", "sport", "source_port", "tcp_srcport", "udp_srcport", "l4_sport", "flow.src_port"],
        true,
    ),
    col(
        "dest_port",
        &["dest_port", "dport", "destination_port", "tcp_dstport", "udp_dstport", "l4_dport", "flow.dst_port"],
        true,
    ),
    col("protocol", &["protocol", "proto", "l4_proto", "transport", "ipprotocol", "network.transport"], false),
    col("event_type", &["event_type", "event", "alert", "signature", "category", "msg", "message"], false),
    col("service", &["service", "sensor", "app", "application", "service_name", "honeypot", "hp"], false),
    col("username", &["username", "user", "login", "account"], false),
    col("password", &["password", "passwd", "pass"], false),
    col("input", &["command", "cmd", "input", "payload_cmd", "request", "query"], false),
    col("file", &["file", "filename", "path", "filepath", "uri", "url", "resource"], false),
    col("payload", &["payload", "payload_hash", "sha256", "md5", "sha1", "sample_hash"], false),
    col("host", &["host", "hostname", "http.host", "server_host", "dst_host"], false),
    col("http_method", &["method", "http_method", "request_method"], false),
    col("url", &["url", "uri", "request_uri", "http.url"], false),
    col("user_agent", &["user_agent", "ua", "http_user_agent", "agent"], false),
    col("status", &["status", "status_code", "code", "http_status"], true),
];

fn fold_name(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Column index per logical key; first alias present in the header wins.
fn resolve_columns(headers: &StringRecord) -> Vec<(&'static LogicalColumn, usize)> {
    let folded: Vec<String> = headers.iter().map(fold_name).collect();
    COLUMNS
        .iter()
        .filter_map(|lc| {
            lc.aliases
                .iter()
                .find_map(|a| {
                    let a = fold_name(a);
                    folded.iter().position(|h| *h == a)
                })
                .map(|idx| (lc, idx))
        })
        .collect()
}

/// Pick the candidate delimiter with a consistent, non-zero count per line;
/// comma when nothing qualifies.
pub fn sniff_delimiter(sample: &[u8]) -> u8 {
    let text = String::from_utf8_lossy(sample);
    let mut lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    // the last line of a truncated sample may be partial
    if lines.len() > 1 && !text.ends_with('\n') {
        lines.pop();
    }
    lines.truncate(SNIFF_LINES);
    if lines.is_empty() {
        return DEFAULT_DELIMITER;
    }

    let mut best: Option<(u8, usize)> = None;
    for &d in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines.iter().map(|l| count_unquoted(l, d as char)).collect();
        let first = counts[0];
        if first == 0 || counts.iter().any(|c| *c != first) {
            continue;
        }
        if best.map_or(true, |(_, n)| first > n) {
            best = Some((d, first));
        }
    }
    best.map(|(d, _)| d).unwrap_or(DEFAULT_DELIMITER)
}

fn count_unquoted(line: &str, delim: char) -> usize {
    let mut quoted = false;
    let mut n = 0;
    for c in line.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if c == delim && !quoted {
            n += 1;
        }
    }
    n
}

fn integer_cell(s: &str) -> Option<i64> {
    s.trim().split('.').next()?.trim().parse().ok()
}

fn row_to_record(row: &ByteRecord, columns: &[(&'static LogicalColumn, usize)]) -> RawRecord {
    let mut rec = RawRecord::new();
    for (lc, idx) in columns {
        let Some(cell) = row.get(*idx) else { continue };
        let cell = String::from_utf8_lossy(cell);
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let value = if lc.integer {
            match integer_cell(cell) {
                Some(i) => RawValue::int(i),
                None => continue,
            }
        } else {
            RawValue::text(cell)
        };
        rec.insert(lc.key, value);
    }
    rec
}

pub struct TabularParser;

impl RecordParser for TabularParser {
    fn parse(&self, file: &SourceFile, ctx: &ParseContext<'_>, sink: &mut RecordSink<'_>) -> Result<ParseStats> {
        let head = read_head(&file.path, ctx.sniff_bytes)?;
        let delimiter = sniff_delimiter(&head);
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(open_reader(&file.path)?);

        let headers = reader.byte_headers()?.clone();
        let headers = StringRecord::from_byte_record_lossy(headers);
        let columns = resolve_columns(&headers);
        debug!(
            path = %file.path.display(),
            delimiter = %(delimiter as char).escape_default(),
            resolved = columns.len(),
            "tabular header"
        );

        let mut stats = ParseStats::default();
        let chunk_rows = ctx.chunk_rows.max(1);
        let mut chunk: Vec<ByteRecord> = Vec::with_capacity(chunk_rows.min(4096));
        let mut rows = reader.into_byte_records();
        loop {
            chunk.clear();
            while chunk.len() < chunk_rows {
                match rows.next() {
                    Some(Ok(row)) if row.len() > headers.len() => stats.skipped += 1,
                    Some(Ok(row)) => chunk.push(row),
                    Some(Err(e)) if e.is_io_error() => return Err(e.into()),
                    Some(Err(_)) => stats.skipped += 1,
                    None => break,
                }
            }
            if chunk.is_empty() {
                break;
            }
            let last_chunk = chunk.len() < chunk_rows;
            for row in &chunk {
                stats.records += 1;
                if sink(row_to_record(row, &columns)).is_break() {
                    return Ok(stats);
                }
            }
            if last_chunk || ctx.stop.is_set() {
                break;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StopSignal;
    use crate::sources::SourceFormat;
    use std::ops::ControlFlow;

    /// Parse `body` as a tabular file; the stop flag is raised once `stop_after` records were seen.
    fn parse_body(body: &str, chunk_rows: usize, stop_after: Option<usize>) -> (ParseStats, Vec<RawRecord>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, body).unwrap();
        let file = SourceFile {
            path,
            format: SourceFormat::Tabular,
            origin: None,
        };
        let stop = StopSignal::new();
        let ctx = ParseContext {
            chunk_rows,
            sniff_bytes: 64 * 1024,
            stop: &stop,
        };
        let mut seen = Vec::new();
        let stats = TabularParser
            .parse(&file, &ctx, &mut |rec| {
                seen.push(rec);
                if Some(seen.len()) == stop_after {
                    stop.stop();
                }
                ControlFlow::Continue(())
            })
            .unwrap();
        (stats, seen)
    }

    fn rows(n: usize) -> String {
        let mut body = String::from("src_ip,dest_port\n");
        for i in 1..=n {
            body.push_str(&format!("10.0.0.{},{}\n", i, i));
        }
        body
    }

    #[test]
    fn exact_multiple_of_chunk_reads_every_row() {
        let (stats, seen) = parse_body(&rows(20), 10, None);
        assert_eq!(stats, ParseStats { records: 20, skipped: 0 });
        assert_eq!(seen.last().unwrap().get("dest_port"), Some(&RawValue::int(20)));
    }

    #[test]
    fn one_row_past_a_chunk_is_not_lost() {
        let (stats, seen) = parse_body(&rows(11), 10, None);
        assert_eq!(stats.records, 11);
        assert_eq!(seen[10].get("src_ip"), Some(&RawValue::text("10.0.0.11")));
    }

    #[test]
    fn wide_rows_are_skipped_and_counted() {
        let body = "src_ip,dest_port\n10.0.0.1,22\n10.0.0.2,23,extra\n10.0.0.3,24\n";
        let (stats, seen) = parse_body(body, 10, None);
        assert_eq!(stats, ParseStats { records: 2, skipped: 1 });
        assert_eq!(seen[1].get("src_ip"), Some(&RawValue::text("10.0.0.3")));
    }

    #[test]
    fn stop_takes_effect_at_the_chunk_boundary() {
        // raised during the first chunk: that chunk completes, the rest is not read
        let (stats, seen) = parse_body(&rows(35), 10, Some(3));
        assert_eq!(stats.records, 10);
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2;3\n4;5;6\n"), b';');
        assert_eq!(sniff_delimiter(b"a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter(b"a|b|c\n1|2|3\n"), b'|');
        assert_eq!(sniff_delimiter(b"a,b\n1,2\n"), b',');
    }

    #[test]
    fn quoted_delimiters_are_ignored() {
        assert_eq!(sniff_delimiter(b"msg;n\n\"a,b,c\";1\n\"d,e,f\";2\n"), b';');
    }

    #[test]
    fn sniff_falls_back_to_comma() {
        assert_eq!(sniff_delimiter(b""), b',');
        assert_eq!(sniff_delimiter(b"single\ncolumn\n"), b',');
    }

    #[test]
    fn header_aliases_are_case_and_punctuation_insensitive() {
        let headers = StringRecord::from(vec!["Source IP", "DST-IP", "Dest.Port", "HTTP_Status", "other"]);
        let resolved: Vec<_> = resolve_columns(&headers).into_iter().map(|(lc, i)| (lc.key, i)).collect();
        assert!(resolved.contains(&("src_ip", 0)));
        assert!(resolved.contains(&("dest_ip", 1)));
        assert!(resolved.contains(&("dest_port", 2)));
        assert!(resolved.contains(&("status", 3)));
    }

    #[test]
    fn first_alias_wins_per_key() {
        let headers = StringRecord::from(vec!["source", "src_ip"]);
        let resolved: Vec<_> = resolve_columns(&headers).into_iter().map(|(lc, i)| (lc.key, i)).collect();
        assert!(resolved.contains(&("src_ip", 1)));
    }

    #[test]
    fn integer_cells_tolerate_fractions() {
        assert_eq!(integer_cell("8080.0"), Some(8080));
        assert_eq!(integer_cell(" 22 "), Some(22));
        assert_eq!(integer_cell("ssh"), None);
    }
}
