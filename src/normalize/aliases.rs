//! Static alias tables for the generic extraction pass: logical field to raw keys,
//! walked in priority order. Dotted keys address one nested group.

use super::event::Field;

pub const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "@timestamp", "time", "event_time"];

pub const RAW_ALIASES: &[&str] = &["raw"];

pub const GENERIC_ALIASES: &[(Field, &[&str])] = &[
    (Field::SrcIp, &["src_ip", "source_ip", "client_ip"]),
    (Field::DstIp, &["dest_ip", "dst_ip", "server_ip"]),
    (Field::SrcPort, &["src_port", "sport"]),
    (Field::DstPort, &["dest_port", "dport"]),
    (Field::Proto, &["protocol", "proto", "transport"]),
    (Field::Service, &["service", "sensor", "app", "application"]),
    (Field::EventType, &["event_type", "event", "category", "signature"]),
    (Field::Sensor, &["sensor"]),
    (Field::SessionId, &["session", "sid", "sessionid", "conn", "connection"]),
    (Field::User, &["username", "user", "login", "account"]),
    (Field::Password, &["password", "passwd"]),
    (Field::Command, &["input", "command", "cmd"]),
    (Field::TtyLog, &["ttylog", "tty_log"]),
    (Field::Filename, &["file", "filename", "path", "filepath"]),
    (Field::Url, &["url", "uri", "request_uri"]),
    (Field::Host, &["host", "http.host"]),
    (Field::Method, &["http_method", "method", "http.http_method"]),
    (Field::Status, &["status", "http.status"]),
    (Field::UserAgent, &["user_agent", "http.http_user_agent", "http.user_agent"]),
    (Field::Referer, &["referer", "http.http_refer"]),
    (Field::PayloadHash, &["payload", "payload_hash"]),
    (Field::Md5, &["md5"]),
    (Field::Sha1, &["sha1"]),
    (Field::Sha256, &["sha256"]),
    (Field::Sha512, &["sha512"]),
    (Field::Sni, &["sni", "tls.sni", "tls.server_name"]),
    (Field::TlsVersion, &["tls_version", "tls.version"]),
    (Field::Ja3, &["ja3", "tls.ja3"]),
    (Field::Ja3s, &["ja3s", "tls.ja3s"]),
    (Field::DnsQname, &["dns_qname", "dns.rrname", "dns.query.rrname"]),
    (Field::DnsQtype, &["dns_qtype", "dns.rrtype", "dns.query.rrtype"]),
    (Field::DnsRcode, &["dns_rcode", "dns.rcode"]),
    (Field::BytesToServer, &["bytes_toserver", "flow.bytes_toserver"]),
    (Field::BytesToClient, &["bytes_toclient", "flow.bytes_toclient"]),
    (Field::PktsToServer, &["pkts_toserver", "flow.pkts_toserver"]),
    (Field::PktsToClient, &["pkts_toclient", "flow.pkts_toclient"]),
    (Field::FlowId, &["flow_id", "flow.id"]),
    (Field::AppProto, &["app_proto"]),
    (Field::SmtpHelo, &["helo", "smtp_helo"]),
    (Field::SmtpMailFrom, &["mail_from", "smtp_mail_from", "smtp.mail_from"]),
    (Field::SmtpRcptTo, &["rcpt_to", "smtp_rcpt_to", "smtp.rcpt_to"]),
    (Field::SmtpSubject, &["subject", "smtp.subject"]),
    (Field::IcsProto, &["ics_proto"]),
    (Field::ModbusUnitId, &["unit_id", "modbus.unit_id"]),
    (Field::ModbusFunction, &["function_code", "modbus.function_code"]),
    (Field::ModbusAddr, &["address", "modbus.address"]),
    (Field::ModbusLen, &["length", "modbus.length"]),
    (Field::Facility, &["facility"]),
    (Field::Severity, &["severity", "level"]),
    (Field::MsgId, &["msgid", "message_id"]),
    (Field::Action, &["action", "acl_action"]),
];

/// Parsed as integers, tolerating a trailing fraction ("80.0" -> 80).
pub const INTEGER_FIELDS: &[Field] = &[
    Field::SrcPort,
    Field::DstPort,
    Field::Status,
    Field::PktsToServer,
    Field::PktsToClient,
    Field::ModbusUnitId,
    Field::ModbusAddr,
    Field::ModbusLen,
];

pub const FLOAT_FIELDS: &[Field] = &[Field::BytesToServer, Field::BytesToClient];
