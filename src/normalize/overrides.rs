//! Origin-specific enrichment. Runs after the generic pass and only fills fields
//! that are still null.

use super::event::{CanonicalEvent, Field};
use super::value_to_field;
use crate::sources::{Origin, RawRecord, RawValue};

/// Fills gaps in a partially normalized event from an origin's own sub-structures.
pub trait Enrich: Send + Sync {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord);
}

/// Picked once per file from its origin hint.
pub fn enricher_for(origin: Option<Origin>) -> &'static dyn Enrich {
    match origin {
        Some(Origin::Suricata) => &Suricata,
        Some(Origin::Cowrie) => &Cowrie,
        Some(Origin::Dionaea) => &Dionaea,
        Some(Origin::Tanner) | Some(Origin::H0neytr4p) => &HttpHoneypot,
        Some(Origin::Mailoney) => &Mailoney,
        Some(Origin::Conpot) => &Conpot,
        Some(Origin::CiscoAsa) => &CiscoAsa,
        Some(Origin::Elastic) | None => &Passthrough,
    }
}

fn fill_from(event: &mut CanonicalEvent, field: Field, record: &RawRecord, aliases: &[&str]) {
    if event.is_null(field) {
        event.fill(field, record.first_of(aliases).and_then(value_to_field));
    }
}

fn fill_from_group(event: &mut CanonicalEvent, field: Field, group: &RawValue, keys: &[&str]) {
    if event.is_null(field) {
        let value = keys
            .iter()
            .filter_map(|k| group.get_path(k))
            .find(|v| !v.is_absent());
        event.fill(field, value.and_then(value_to_field));
    }
}

fn group<'a>(record: &'a RawRecord, name: &str) -> Option<&'a RawValue> {
    record.get(name).filter(|v| v.as_mapping().is_some())
}

pub struct Passthrough;

impl Enrich for Passthrough {
    fn enrich(&self, _event: &mut CanonicalEvent, _record: &RawRecord) {}
}

/// Network IDS eve records: alert/http/dns/tls/flow groups.
pub struct Suricata;

impl Enrich for Suricata {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord) {
        if let Some(alert) = group(record, "alert") {
            fill_from_group(event, Field::EventType, alert, &["signature"]);
        }
        if let Some(http) = group(record, "http") {
            fill_from_group(event, Field::Method, http, &["http_method"]);
            fill_from_group(event, Field::Url, http, &["url", "hostname", "uri"]);
            fill_from_group(event, Field::Host, http, &["hostname"]);
            fill_from_group(event, Field::Status, http, &["status"]);
            fill_from_group(event, Field::UserAgent, http, &["http_user_agent"]);
            fill_from_group(event, Field::Referer, http, &["http_refer"]);
        }
        if let Some(dns) = group(record, "dns") {
            fill_from_group(event, Field::DnsQname, dns, &["rrname"]);
            fill_from_group(event, Field::DnsQtype, dns, &["rrtype"]);
            fill_from_group(event, Field::DnsRcode, dns, &["rcode"]);
        }
        if let Some(tls) = group(record, "tls") {
            fill_from_group(event, Field::Sni, tls, &["sni", "server_name"]);
            fill_from_group(event, Field::TlsVersion, tls, &["version"]);
            fill_from_group(event, Field::Ja3, tls, &["ja3.hash", "ja3"]);
            fill_from_group(event, Field::Ja3s, tls, &["ja3s.hash", "ja3s"]);
        }
        if let Some(flow) = group(record, "flow") {
            fill_from_group(event, Field::BytesToServer, flow, &["bytes_toserver"]);
            fill_from_group(event, Field::BytesToClient, flow, &["bytes_toclient"]);
            fill_from_group(event, Field::PktsToServer, flow, &["pkts_toserver"]);
            fill_from_group(event, Field::PktsToClient, flow, &["pkts_toclient"]);
            fill_from_group(event, Field::AppProto, flow, &["app_proto"]);
        }
    }
}

/// SSH/telnet honeypot: eventid naming, shasum on downloads.
pub struct Cowrie;

impl Enrich for Cowrie {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord) {
        fill_from(event, Field::EventType, record, &["eventid", "event", "message"]);
        fill_from(event, Field::SrcIp, record, &["src_ip", "src"]);
        fill_from(event, Field::DstIp, record, &["dst_ip", "dest_ip"]);
        fill_from(event, Field::Proto, record, &["protocol"]);
        event.fill(Field::Proto, Some(super::FieldValue::Text("tcp".to_string())));
        fill_from(event, Field::Sha256, record, &["sha256", "shasum"]);
        fill_from(event, Field::Sha1, record, &["sha1"]);
        fill_from(event, Field::Md5, record, &["md5"]);
    }
}

/// Multi-protocol honeypot: remote/local host and port naming.
pub struct Dionaea;

impl Enrich for Dionaea {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord) {
        fill_from(event, Field::SrcIp, record, &["remote_host", "connection.remote_ip", "src_ip"]);
        fill_from(event, Field::SrcPort, record, &["remote_port", "connection.remote_port"]);
        fill_from(event, Field::DstIp, record, &["local_host", "connection.local_ip"]);
        fill_from(event, Field::DstPort, record, &["local_port", "connection.local_port"]);
        fill_from(event, Field::Proto, record, &["connection.transport", "connection.protocol"]);
        fill_from(event, Field::Url, record, &["url"]);
        for (field, key) in [
            (Field::Sha256, "sha256"),
            (Field::Sha1, "sha1"),
            (Field::Md5, "md5"),
            (Field::Sha512, "sha512"),
        ] {
            fill_from(event, field, record, &[key]);
        }
    }
}

/// Web honeypots (tanner, h0neytr4p): request/response/headers groups.
pub struct HttpHoneypot;

impl Enrich for HttpHoneypot {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord) {
        fill_from(event, Field::Method, record, &["method", "request.method"]);
        fill_from(event, Field::Url, record, &["url", "request.url", "uri", "path"]);
        fill_from(event, Field::Host, record, &["host", "request.host", "headers.host", "headers.Host"]);
        fill_from(
            event,
            Field::UserAgent,
            record,
            &["user_agent", "headers.User-Agent", "headers.user-agent"],
        );
        fill_from(event, Field::Status, record, &["status", "response.status"]);
    }
}

pub struct Mailoney;

impl Enrich for Mailoney {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord) {
        fill_from(event, Field::SmtpHelo, record, &["helo"]);
        fill_from(event, Field::SmtpMailFrom, record, &["mail_from"]);
        fill_from(event, Field::SmtpRcptTo, record, &["rcpt_to"]);
        fill_from(event, Field::SmtpSubject, record, &["subject"]);
    }
}

/// ICS honeypot: the protocol key names the industrial protocol.
pub struct Conpot;

impl Enrich for Conpot {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord) {
        fill_from(event, Field::IcsProto, record, &["protocol", "data_type"]);
        fill_from(event, Field::ModbusUnitId, record, &["unit_id"]);
        fill_from(event, Field::ModbusFunction, record, &["function_code"]);
        fill_from(event, Field::ModbusAddr, record, &["address"]);
        fill_from(event, Field::ModbusLen, record, &["length"]);
    }
}

/// Firewall syslog rendered as JSON.
pub struct CiscoAsa;

impl Enrich for CiscoAsa {
    fn enrich(&self, event: &mut CanonicalEvent, record: &RawRecord) {
        fill_from(event, Field::Facility, record, &["facility"]);
        fill_from(event, Field::Severity, record, &["severity"]);
        fill_from(event, Field::MsgId, record, &["message_id", "msgid"]);
        fill_from(event, Field::SrcIp, record, &["src", "src_ip"]);
        fill_from(event, Field::DstIp, record, &["dst", "dest_ip"]);
        fill_from(event, Field::Action, record, &["action"]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> RawRecord {
        RawRecord::from_json(v).unwrap()
    }

    #[test]
    fn suricata_fills_nested_groups() {
        let rec = record(json!({
            "http": {"hostname": "victim.local", "http_method": "GET", "status": 404},
            "tls": {"ja3": {"hash": "abc", "string": "771,..."}},
        }));
        let mut ev = CanonicalEvent::blank("eve.json");
        Suricata.enrich(&mut ev, &rec);
        assert_eq!(ev.text(Field::Host), Some("victim.local"));
        assert_eq!(ev.text(Field::Url), Some("victim.local"));
        assert_eq!(ev.text(Field::Method), Some("GET"));
        assert_eq!(ev.text(Field::Ja3), Some("abc"));
    }

    #[test]
    fn cowrie_defaults_proto_but_keeps_existing() {
        let mut ev = CanonicalEvent::blank("cowrie.json");
        Cowrie.enrich(&mut ev, &record(json!({"eventid": "cowrie.login.failed"})));
        assert_eq!(ev.text(Field::Proto), Some("tcp"));
        assert_eq!(ev.text(Field::EventType), Some("cowrie.login.failed"));

        let mut ev = CanonicalEvent::blank("cowrie.json");
        ev.set(Field::Proto, Some(super::super::FieldValue::Text("ssh".into())));
        Cowrie.enrich(&mut ev, &record(json!({})));
        assert_eq!(ev.text(Field::Proto), Some("ssh"));
    }

    #[test]
    fn passthrough_is_a_no_op() {
        let mut ev = CanonicalEvent::blank("x.json");
        let before = ev.clone();
        enricher_for(None).enrich(&mut ev, &record(json!({"remote_host": "1.1.1.1"})));
        assert_eq!(ev, before);
    }
}
