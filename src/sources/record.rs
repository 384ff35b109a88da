//! Loosely-typed records as produced by the parsers.

use serde::Serialize;
use std::collections::BTreeMap;

/// Leaf value of a raw record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Semi-structured value. Lookups never fail; a miss is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Scalar(Scalar),
    Sequence(Vec<RawValue>),
    Mapping(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn text(s: impl Into<String>) -> Self {
        RawValue::Scalar(Scalar::Text(s.into()))
    }

    pub fn int(v: i64) -> Self {
        RawValue::Scalar(Scalar::Int(v))
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, RawValue>> {
        match self {
            RawValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Null and empty/whitespace-only text count as absent.
    pub fn is_absent(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Scalar(Scalar::Text(s)) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Walk a dotted path ("tls.sni"). Only mappings are traversed.
    pub fn get_path(&self, path: &str) -> Option<&RawValue> {
        let mut cur = self;
        for part in path.split('.') {
            cur = cur.as_mapping()?.get(part)?;
        }
        Some(cur)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::int(i),
                None => RawValue::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => RawValue::text(s),
            Value::Array(items) => RawValue::Sequence(items.into_iter().map(RawValue::from).collect()),
            Value::Object(map) => {
                RawValue::Mapping(map.into_iter().map(|(k, v)| (k, RawValue::from(v))).collect())
            }
        }
    }
}

/// One parsed row or document, keyed by raw field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, RawValue>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: BTreeMap<String, RawValue>) -> Self {
        Self(map)
    }

    /// Only JSON objects become records.
    pub fn from_json(v: serde_json::Value) -> Option<Self> {
        match RawValue::from(v) {
            RawValue::Mapping(m) => Some(Self(m)),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level key first, then one dotted nested path. Absent values are a miss.
    pub fn lookup(&self, key: &str) -> Option<&RawValue> {
        let direct = self.0.get(key).filter(|v| !v.is_absent());
        if direct.is_some() || !key.contains('.') {
            return direct;
        }
        let (head, rest) = key.split_once('.')?;
        self.0.get(head)?.get_path(rest).filter(|v| !v.is_absent())
    }

    /// First alias holding a present value.
    pub fn first_of(&self, aliases: &[&str]) -> Option<&RawValue> {
        aliases.iter().find_map(|a| self.lookup(a))
    }

    /// Logstash/Elasticsearch exports wrap the event in `_source`.
    pub fn unwrap_envelope(self) -> Self {
        match self.0.get("_source") {
            Some(RawValue::Mapping(inner)) => Self(inner.clone()),
            _ => self,
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}
