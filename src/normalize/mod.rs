//! Raw record + origin hint → canonical event.
//!
//! Order of passes: generic alias extraction, origin override (fill-only), raw
//! passthrough, numeric coercion. Nothing in here returns an error; unusable
//! values end up null.

mod aliases;
mod event;
mod overrides;
mod timestamp;

pub use event::{CanonicalEvent, Field, FieldValue, FIELD_COUNT};
pub use overrides::{enricher_for, Enrich};
pub use timestamp::{parse_timestamp, to_iso};

use crate::sources::{Origin, RawRecord, RawValue, Scalar};
use aliases::{FLOAT_FIELDS, GENERIC_ALIASES, INTEGER_FIELDS, RAW_ALIASES, TIMESTAMP_ALIASES};
use std::path::Path;

/// Normalizer bound to one source file; the enricher is selected once here.
pub struct Normalizer {
    origin: Option<Origin>,
    source_file: String,
    enricher: &'static dyn Enrich,
}

impl Normalizer {
    pub fn new(origin: Option<Origin>, source: &Path) -> Self {
        Self {
            origin,
            source_file: source.to_string_lossy().into_owned(),
            enricher: enricher_for(origin),
        }
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    pub fn normalize(&self, record: &RawRecord) -> CanonicalEvent {
        let mut ev = CanonicalEvent::blank(&self.source_file);
        ev.set(
            Field::Hp,
            self.origin.map(|o| FieldValue::Text(o.tag().to_string())),
        );

        ev.set(
            Field::Timestamp,
            record
                .first_of(TIMESTAMP_ALIASES)
                .and_then(parse_timestamp)
                .map(|t| FieldValue::Text(to_iso(&t))),
        );
        for (field, aliases) in GENERIC_ALIASES {
            ev.set(*field, record.first_of(aliases).and_then(value_to_field));
        }

        self.enricher.enrich(&mut ev, record);

        let raw = record
            .first_of(RAW_ALIASES)
            .and_then(value_to_field)
            .unwrap_or_else(|| FieldValue::Text(record.to_json_string()));
        ev.set(Field::Raw, Some(raw));

        coerce_numeric(&mut ev);
        ev
    }
}

/// Loose raw value to a cell value. Nested structures are kept as JSON text.
pub(crate) fn value_to_field(value: &RawValue) -> Option<FieldValue> {
    match value {
        RawValue::Null => None,
        RawValue::Scalar(Scalar::Text(s)) if s.trim().is_empty() => None,
        RawValue::Scalar(Scalar::Text(s)) => Some(FieldValue::Text(s.clone())),
        RawValue::Scalar(Scalar::Int(i)) => Some(FieldValue::Int(*i)),
        RawValue::Scalar(Scalar::Float(f)) if f.is_finite() => Some(FieldValue::Float(*f)),
        RawValue::Scalar(Scalar::Float(_)) => None,
        RawValue::Scalar(Scalar::Bool(b)) => Some(FieldValue::Text(b.to_string())),
        RawValue::Sequence(_) | RawValue::Mapping(_) => serde_json::to_string(value).ok().map(FieldValue::Text),
    }
}

fn coerce_numeric(ev: &mut CanonicalEvent) {
    for field in INTEGER_FIELDS {
        let v = ev.take(*field).and_then(|v| safe_int(&v)).map(FieldValue::Int);
        ev.set(*field, v);
    }
    for field in FLOAT_FIELDS {
        let v = ev.take(*field).and_then(|v| safe_float(&v)).map(FieldValue::Float);
        ev.set(*field, v);
    }
}

/// Integer part of a value; "80.0" and 80.7 both give 80.
pub fn safe_int(v: &FieldValue) -> Option<i64> {
    match v {
        FieldValue::Int(i) => Some(*i),
        FieldValue::Float(f) if f.is_finite() && f.abs() < 9.0e15 => Some(f.trunc() as i64),
        FieldValue::Float(_) => None,
        FieldValue::Text(s) => s.trim().split('.').next()?.parse().ok(),
    }
}

pub fn safe_float(v: &FieldValue) -> Option<f64> {
    match v {
        FieldValue::Int(i) => Some(*i as f64),
        FieldValue::Float(f) => Some(*f).filter(|f| f.is_finite()),
        FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(origin: Option<Origin>, v: serde_json::Value) -> CanonicalEvent {
        Normalizer::new(origin, Path::new("/data/test.json")).normalize(&RawRecord::from_json(v).unwrap())
    }

    #[test]
    fn generic_pass_uses_first_present_alias() {
        let ev = normalize(
            None,
            json!({"source_ip": "10.0.0.1", "client_ip": "10.0.0.2", "dport": "22", "username": "root"}),
        );
        assert_eq!(ev.text(Field::SrcIp), Some("10.0.0.1"));
        assert_eq!(ev.get(Field::DstPort), Some(&FieldValue::Int(22)));
        assert_eq!(ev.text(Field::User), Some("root"));
        assert_eq!(ev.text(Field::SourceFile), Some("/data/test.json"));
        assert!(ev.is_null(Field::Hp));
    }

    #[test]
    fn numeric_coercion_tolerates_fractions_and_garbage() {
        let ev = normalize(
            None,
            json!({"src_port": "80.0", "dest_port": 443.9, "status": "n/a", "bytes_toserver": "1024", "bytes_toclient": "lots"}),
        );
        assert_eq!(ev.get(Field::SrcPort), Some(&FieldValue::Int(80)));
        assert_eq!(ev.get(Field::DstPort), Some(&FieldValue::Int(443)));
        assert!(ev.is_null(Field::Status));
        assert_eq!(ev.get(Field::BytesToServer), Some(&FieldValue::Float(1024.0)));
        assert!(ev.is_null(Field::BytesToClient));
    }

    #[test]
    fn generic_value_beats_override() {
        let ev = normalize(
            Some(Origin::Suricata),
            json!({"host": "top-level", "http": {"hostname": "nested"}}),
        );
        assert_eq!(ev.text(Field::Host), Some("top-level"));
        assert_eq!(ev.text(Field::Hp), Some("suricata"));
    }

    #[test]
    fn override_fills_only_missing_values() {
        let ev = normalize(
            Some(Origin::Suricata),
            json!({"event_type": "http", "http": {"hostname": "nested.example", "status": "200"}}),
        );
        assert_eq!(ev.text(Field::Host), Some("nested.example"));
        assert_eq!(ev.get(Field::Status), Some(&FieldValue::Int(200)));
    }

    #[test]
    fn same_record_without_origin_leaves_nested_host_null() {
        let ev = normalize(None, json!({"http": {"hostname": "nested.example"}}));
        assert!(ev.is_null(Field::Host));
    }

    #[test]
    fn raw_is_explicit_text_or_serialized_record() {
        let ev = normalize(None, json!({"raw": "GET / HTTP/1.1"}));
        assert_eq!(ev.text(Field::Raw), Some("GET / HTTP/1.1"));

        let ev = normalize(None, json!({"b": 1, "a": "x"}));
        assert_eq!(ev.text(Field::Raw), Some(r#"{"a":"x","b":1}"#));
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let rec = RawRecord::from_json(json!({
            "timestamp": "2024-01-02T03:04:05.678Z", "src_ip": "1.2.3.4", "dest_port": "2222",
            "eventid": "cowrie.command.input", "input": "uname -a", "flow": {"bytes_toserver": 12.5}
        }))
        .unwrap();
        let n = Normalizer::new(Some(Origin::Cowrie), Path::new("cowrie.json"));
        assert_eq!(n.normalize(&rec), n.normalize(&rec));
        assert_eq!(n.normalize(&rec).to_record(), n.normalize(&rec).to_record());
    }

    #[test]
    fn every_origin_yields_the_full_field_set() {
        let rec = RawRecord::from_json(json!({"unexpected_key": 1, "another": {"nested": true}})).unwrap();
        let origins = [
            None,
            Some(Origin::Cowrie),
            Some(Origin::Dionaea),
            Some(Origin::Tanner),
            Some(Origin::H0neytr4p),
            Some(Origin::Mailoney),
            Some(Origin::Conpot),
            Some(Origin::CiscoAsa),
            Some(Origin::Suricata),
            Some(Origin::Elastic),
        ];
        for origin in origins {
            let ev = Normalizer::new(origin, Path::new("f.json")).normalize(&rec);
            let names: Vec<_> = ev.iter().map(|(f, _)| f.name()).collect();
            assert_eq!(names, Field::header());
            assert_eq!(ev.to_record().len(), FIELD_COUNT);
        }
    }

    #[test]
    fn unparsable_timestamp_stays_null() {
        let ev = normalize(None, json!({"timestamp": "not a time"}));
        assert!(ev.is_null(Field::Timestamp));
    }
}
