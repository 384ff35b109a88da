//! Canonical event: a fixed, ordered set of independently nullable fields.

use serde::Serialize;

macro_rules! canonical_fields {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// One column of the canonical table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Field {
            $($variant),+
        }

        impl Field {
            /// Every field, in output column order.
            pub const ALL: &'static [Field] = &[$(Field::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Field::$variant => $name),+
                }
            }
        }
    };
}

canonical_fields! {
    // core
    Timestamp => "timestamp",
    SrcIp => "src_ip",
    DstIp => "dst_ip",
    SrcPort => "src_port",
    DstPort => "dst_port",
    Proto => "proto",
    Service => "service",
    EventType => "event_type",
    Sensor => "sensor",
    Hp => "hp",
    SessionId => "session_id",
    SourceFile => "source_file",
    // auth / commands
    User => "user",
    Password => "password",
    Command => "command",
    TtyLog => "tty_log",
    // files / payloads / http
    Filename => "filename",
    Url => "url",
    Host => "host",
    Method => "method",
    Status => "status",
    UserAgent => "user_agent",
    Referer => "referer",
    PayloadHash => "payload_hash",
    Md5 => "md5",
    Sha1 => "sha1",
    Sha256 => "sha256",
    Sha512 => "sha512",
    // tls / dns / flow
    Sni => "sni",
    TlsVersion => "tls_version",
    Ja3 => "ja3",
    Ja3s => "ja3s",
    DnsQname => "dns_qname",
    DnsQtype => "dns_qtype",
    DnsRcode => "dns_rcode",
    BytesToServer => "bytes_toserver",
    BytesToClient => "bytes_toclient",
    PktsToServer => "pkts_toserver",
    PktsToClient => "pkts_toclient",
    FlowId => "flow_id",
    AppProto => "app_proto",
    // smtp
    SmtpHelo => "smtp_helo",
    SmtpMailFrom => "smtp_mail_from",
    SmtpRcptTo => "smtp_rcpt_to",
    SmtpSubject => "smtp_subject",
    // ics / modbus
    IcsProto => "ics_proto",
    ModbusUnitId => "modbus_unit_id",
    ModbusFunction => "modbus_function",
    ModbusAddr => "modbus_addr",
    ModbusLen => "modbus_len",
    // syslog-ish
    Facility => "facility",
    Severity => "severity",
    MsgId => "msgid",
    Action => "action",
    // passthrough
    Raw => "raw",
}

pub const FIELD_COUNT: usize = Field::ALL.len();

impl Field {
    fn index(self) -> usize {
        self as usize
    }

    pub fn header() -> Vec<&'static str> {
        Field::ALL.iter().map(|f| f.name()).collect()
    }
}

/// Typed cell value. Text until the numeric coercion pass says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Cell rendering for the canonical table.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    values: [Option<FieldValue>; FIELD_COUNT],
}

impl CanonicalEvent {
    /// All fields null except `source_file`.
    pub fn blank(source_file: &str) -> Self {
        let mut ev = Self {
            values: std::array::from_fn(|_| None),
        };
        ev.set(Field::SourceFile, Some(FieldValue::Text(source_file.to_string())));
        ev
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values[field.index()].as_ref()
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn is_null(&self, field: Field) -> bool {
        self.values[field.index()].is_none()
    }

    pub fn set(&mut self, field: Field, value: Option<FieldValue>) {
        self.values[field.index()] = value;
    }

    /// Set only if the field is still null. Returns whether it was filled.
    pub fn fill(&mut self, field: Field, value: Option<FieldValue>) -> bool {
        let slot = &mut self.values[field.index()];
        if slot.is_none() && value.is_some() {
            *slot = value;
            return true;
        }
        false
    }

    pub fn take(&mut self, field: Field) -> Option<FieldValue> {
        self.values[field.index()].take()
    }

    /// (field, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, Option<&FieldValue>)> + '_ {
        Field::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    /// One output row; null renders as an empty cell.
    pub fn to_record(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| v.as_ref().map(FieldValue::to_cell).unwrap_or_default())
            .collect()
    }
}
