//! Integration test: scan, parse, normalize and write a mixed log tree; then
//! prepare training and inference features from the canonical table.

use flate2::write::GzEncoder;
use flate2::Compression;
use honeyfeat::{
    config::{IngestConfig, PipelineConfig},
    features::{prepare_inference, prepare_training},
    normalize::Field,
    output::split_by_size,
    Error, IngestPipeline, ProgressInfo, StopSignal,
};
use std::fs;
use std::io::Write;
use std::path::Path;

fn ingest_config(input: &Path, output: &Path) -> IngestConfig {
    IngestConfig {
        input_dir: input.to_path_buf(),
        output_file: output.to_path_buf(),
        batch_size: 4,
        ..IngestConfig::default()
    }
}

fn write_gz(path: &Path, body: &str) {
    let mut enc = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
    enc.write_all(body.as_bytes()).unwrap();
    enc.finish().unwrap();
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<csv::StringRecord>) {
    let mut r = csv::Reader::from_path(path).unwrap();
    let header = r.headers().unwrap().iter().map(str::to_string).collect();
    let rows = r.records().map(|r| r.unwrap()).collect();
    (header, rows)
}

fn column(header: &[String], field: Field) -> usize {
    header.iter().position(|h| h == field.name()).unwrap()
}

/// One file per origin style, plus a corrupt archive.
fn mixed_tree(root: &Path) -> u64 {
    let cowrie = root.join("cowrie").join("log");
    let suricata = root.join("suricata").join("log");
    let dionaea = root.join("dionaea");
    let misc = root.join("misc");
    for d in [&cowrie, &suricata, &dionaea, &misc] {
        fs::create_dir_all(d).unwrap();
    }

    fs::write(
        cowrie.join("cowrie.json"),
        concat!(
            r#"{"eventid":"cowrie.login.failed","src_ip":"10.0.0.1","src_port":50000,"dst_port":22,"username":"root","password":"123456","timestamp":"2024-03-01T10:00:00.123456Z"}"#,
            "\n",
            r#"{"eventid":"cowrie.command.input","src_ip":"10.0.0.1","input":"uname -a","timestamp":"2024-03-01T10:00:01Z"}"#,
            "\n",
            "garbage line\n",
        ),
    )
    .unwrap();
    write_gz(
        &suricata.join("eve.json.1.gz"),
        concat!(
            r#"{"event_type":"alert","src_ip":"10.0.0.2","dest_ip":"172.16.0.5","dest_port":445,"proto":"TCP","alert":{"signature":"ET SCAN"},"timestamp":"2024-03-01T10:00:02.000000+0000"}"#,
            "\n",
            r#"{"event_type":"dns","src_ip":"10.0.0.3","dns":{"rrname":"example.com","rrtype":"A"},"timestamp":"2024-03-01T10:00:03+0000"}"#,
            "\n",
        ),
    );
    fs::write(
        dionaea.join("connections.csv"),
        "Timestamp;Src IP;Dest Port;Protocol\n2024-03-01 10:00:04;10.0.0.4;445;smb\n2024-03-01 10:00:05;10.0.0.5;not-a-port;mssql\n",
    )
    .unwrap();
    fs::write(
        misc.join("export.json"),
        r#"[
  {
    "@timestamp": "2024-03-01T10:00:06Z",
    "src_ip": "10.0.0.6"
  },
  {
    "_source": {
      "src_ip": "10.0.0.7"
    }
  }
]
"#,
    )
    .unwrap();
    fs::write(misc.join("bad.json.gz"), b"definitely not gzip").unwrap();
    fs::write(misc.join("notes.txt"), "unrecognized").unwrap();
    // cowrie 2 + suricata 2 + dionaea 2 + export 2
    8
}

#[test]
fn mixed_tree_is_normalized_and_bad_file_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data");
    let expected = mixed_tree(&input);
    let out = dir.path().join("out").join("events.csv");

    let report = IngestPipeline::new(ingest_config(&input, &out)).run().unwrap();
    assert_eq!(report.rows_written, expected);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.records_skipped, 1);
    assert!(!report.cancelled);

    let (header, rows) = read_rows(&out);
    assert_eq!(header.len(), honeyfeat::normalize::FIELD_COUNT);
    assert_eq!(rows.len() as u64, expected);

    let hp = column(&header, Field::Hp);
    let user = column(&header, Field::User);
    let ts = column(&header, Field::Timestamp);
    let dns = column(&header, Field::DnsQname);
    let dst_port = column(&header, Field::DstPort);

    let login = rows.iter().find(|r| &r[user] == "root").unwrap();
    assert_eq!(&login[hp], "cowrie");
    assert_eq!(&login[ts], "2024-03-01T10:00:00.123456Z");

    let dns_row = rows.iter().find(|r| &r[dns] == "example.com").unwrap();
    assert_eq!(&dns_row[hp], "suricata");

    let smb = rows.iter().find(|r| &r[dst_port] == "445" && &r[hp] == "dionaea").unwrap();
    assert_eq!(&smb[ts], "2024-03-01T10:00:04Z");
    // unparseable port stays empty rather than failing the row
    assert!(rows.iter().any(|r| &r[hp] == "dionaea" && r[dst_port].is_empty()));
}

#[test]
fn nine_valid_files_survive_one_corrupt_archive() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data").join("tanner");
    fs::create_dir_all(&input).unwrap();
    for i in 0..9 {
        let line = format!(
            r#"{{"timestamp":"2024-03-01T10:00:0{}Z","peer":{{"ip":"10.1.0.{}"}},"path":"/login","method":"POST"}}"#,
            i, i
        );
        write_gz(&input.join(format!("tanner_report.json.{}.gz", i)), &format!("{}\n{}\n", line, line));
    }
    fs::write(input.join("tanner_report.json.9.gz"), b"\x1f\x8b truncated").unwrap();
    let out = dir.path().join("events.csv");

    let report = IngestPipeline::new(ingest_config(&dir.path().join("data"), &out)).run().unwrap();
    assert_eq!(report.files_parsed, 9);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.rows_written, 18);

    let (header, rows) = read_rows(&out);
    let hp = column(&header, Field::Hp);
    assert!(rows.iter().all(|r| &r[hp] == "tanner"));
}

#[test]
fn second_run_appends_without_repeating_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data");
    let expected = mixed_tree(&input);
    let out = dir.path().join("events.csv");
    let pipeline = IngestPipeline::new(ingest_config(&input, &out));
    pipeline.run().unwrap();
    pipeline.run().unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("timestamp,")).count(), 1);
    let (_, rows) = read_rows(&out);
    assert_eq!(rows.len() as u64, expected * 2);
}

#[test]
fn parallel_run_writes_same_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data");
    let expected = mixed_tree(&input);
    let out = dir.path().join("events.csv");
    let config = IngestConfig {
        parallel: true,
        ..ingest_config(&input, &out)
    };
    let report = IngestPipeline::new(config).run().unwrap();
    assert_eq!(report.rows_written, expected);
    assert_eq!(report.files_failed, 1);
}

#[test]
fn stopped_run_reports_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data");
    mixed_tree(&input);
    let out = dir.path().join("events.csv");
    let stop = StopSignal::new();
    stop.stop();
    let report = IngestPipeline::new(ingest_config(&input, &out))
        .with_stop_signal(stop)
        .run()
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.rows_written, 0);
}

#[test]
fn stop_mid_file_flushes_what_was_already_buffered() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data").join("dionaea");
    fs::create_dir_all(&input).unwrap();
    let body: String = std::iter::once("Src IP,Dest Port\n".to_string())
        .chain((1..=100).map(|i| format!("10.0.1.{},{}\n", i, 1000 + i)))
        .collect();
    fs::write(input.join("connections.csv"), body).unwrap();
    let out = dir.path().join("events.csv");

    let stop = StopSignal::new();
    let on_progress = {
        let stop = stop.clone();
        move |info: &ProgressInfo<'_>| {
            if info.file_records >= 10 {
                stop.stop();
            }
        }
    };
    let mut cfg = ingest_config(&dir.path().join("data"), &out);
    cfg.csv_chunk_rows = 10;
    let report = IngestPipeline::new(cfg)
        .with_stop_signal(stop)
        .with_progress_callback(on_progress)
        .run()
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.records_parsed, 10);
    assert_eq!(report.rows_written, 10);
    let (header, rows) = read_rows(&out);
    assert_eq!(rows.len(), 10);
    let port = column(&header, Field::DstPort);
    assert_eq!(&rows[9][port], "1010");
}

#[test]
fn undecodable_file_is_counted_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("broken.json"), "not json\nstill not json\n").unwrap();
    fs::write(input.join("ok.json"), "{\"src_ip\": \"10.0.0.9\"}\n").unwrap();
    let out = dir.path().join("events.csv");

    let report = IngestPipeline::new(ingest_config(&input, &out)).run().unwrap();
    assert_eq!(report.files_parsed, 2);
    assert_eq!(report.files_empty, 1);
    assert_eq!(report.records_skipped, 2);
    assert_eq!(report.rows_written, 1);
}

#[test]
fn missing_input_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = IngestPipeline::new(ingest_config(&dir.path().join("absent"), &dir.path().join("o.csv")))
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::InputDirMissing(_)));
}

#[test]
fn canonical_table_feeds_training_and_inference() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data");
    mixed_tree(&input);
    let table = dir.path().join("events.csv");
    IngestPipeline::new(ingest_config(&input, &table)).run().unwrap();

    let mut cfg = PipelineConfig::default();
    cfg.artifacts.schema_path = dir.path().join("schema.json");
    cfg.artifacts.scaler_path = dir.path().join("models").join("scaler.json");

    let set = prepare_training(&table, &cfg).unwrap();
    assert!(!set.schema.is_empty());
    assert!(set.schema.columns().iter().any(|c| c == "raw_hash"));
    assert!(set.matrix.values().iter().all(|x| (0.0..=1.0).contains(x)));

    let m = prepare_inference(&table, &cfg).unwrap();
    assert_eq!(m.columns(), set.schema.columns());
    assert!(m.is_finite());
}

#[test]
fn split_parts_train_as_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("table.csv");
    let mut body = String::from("dst_port,proto,bytes\n");
    for i in 0..200 {
        body.push_str(&format!("{},{},{}\n", 20 + i % 7, if i % 2 == 0 { "tcp" } else { "udp" }, i * 3));
    }
    fs::write(&table, body).unwrap();

    let parts_dir = dir.path().join("parts");
    let parts = split_by_size(&table, &parts_dir, 1024).unwrap();
    assert!(parts.len() > 1);

    let mut cfg = PipelineConfig::default();
    cfg.artifacts.schema_path = dir.path().join("schema.json");
    cfg.artifacts.scaler_path = dir.path().join("scaler.json");
    let set = prepare_training(&parts_dir, &cfg).unwrap();
    assert_eq!(set.schema.columns(), &["dst_port", "proto", "bytes"]);
    assert_eq!(set.matrix.nrows(), 200);
}
