//! Origin hints: which sensor or honeypot produced a file, derived from its path.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Cowrie,
    Dionaea,
    Tanner,
    H0neytr4p,
    Mailoney,
    Conpot,
    CiscoAsa,
    Suricata,
    Elastic,
}

/// Path tokens checked in order; the first hit wins.
const SEGMENT_TOKENS: &[(&str, Origin)] = &[
    ("cowrie", Origin::Cowrie),
    ("dionaea", Origin::Dionaea),
    ("tanner", Origin::Tanner),
    ("h0neytr4p", Origin::H0neytr4p),
    ("mailoney", Origin::Mailoney),
    ("conpot", Origin::Conpot),
    ("ciscoasa", Origin::CiscoAsa),
    ("asa", Origin::CiscoAsa),
    ("suricata", Origin::Suricata),
    ("eve.json", Origin::Suricata),
    ("elk", Origin::Elastic),
    ("elastic", Origin::Elastic),
];

impl Origin {
    pub fn tag(self) -> &'static str {
        match self {
            Origin::Cowrie => "cowrie",
            Origin::Dionaea => "dionaea",
            Origin::Tanner => "tanner",
            Origin::H0neytr4p => "h0neytr4p",
            Origin::Mailoney => "mailoney",
            Origin::Conpot => "conpot",
            Origin::CiscoAsa => "ciscoasa",
            Origin::Suricata => "suricata",
            Origin::Elastic => "elastic",
        }
    }

    /// Well-known sensor log file names (`eve.json`, `cowrie.json`, and their rotations).
    pub fn from_file_name(name: &str) -> Option<Origin> {
        let name = name.to_ascii_lowercase();
        if name.starts_with("eve.json") || name.ends_with("eve.json") {
            return Some(Origin::Suricata);
        }
        if name.starts_with("cowrie") && name.contains(".json") {
            return Some(Origin::Cowrie);
        }
        None
    }

    /// Match path segments against known origin names. A segment matches when it
    /// equals the token or starts with it followed by a separator (`cowrie.json.1`,
    /// `suricata-logs`).
    pub fn from_segments(path: &Path) -> Option<Origin> {
        let segments: Vec<String> = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .map(str::to_ascii_lowercase)
            .collect();
        SEGMENT_TOKENS.iter().find_map(|(token, origin)| {
            segments
                .iter()
                .any(|seg| segment_matches(seg, token))
                .then_some(*origin)
        })
    }

    /// Exact file name first, then path segments.
    pub fn detect(path: &Path) -> Option<Origin> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Origin::from_file_name)
            .or_else(|| Origin::from_segments(path))
    }
}

fn segment_matches(segment: &str, token: &str) -> bool {
    match segment.strip_prefix(token) {
        Some("") => true,
        Some(rest) => rest.starts_with(|c: char| !c.is_ascii_alphanumeric()),
        None => false,
    }
}
