use serde::Serialize;

use crate::atom::{Children, Payload};

/// A JSON-serializable summary of one atom in a decoded tree.
///
/// Suitable for CLI `--json` output or UIs; payload bytes themselves are
/// not included, only their length.
#[derive(Debug, Serialize)]
pub struct AtomSummary {
    /// Four-character identifier, lossy-printed
    pub typ: String,
    /// Occurrence index among same-identifier siblings
    pub index: usize,
    /// Total encoded size including the 8-byte header
    pub size: u64,
    /// "leaf" or "container"
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<AtomSummary>>,
}

/// Summarize a decoded container level in stored order.
pub fn summarize(children: &Children) -> Vec<AtomSummary> {
    children
        .iter()
        .map(|(key, atom)| {
            let (kind, payload_len, kids) = match &atom.payload {
                Payload::Leaf(data) => ("leaf", Some(data.len()), None),
                Payload::Container(c) => ("container", None, Some(summarize(c))),
            };
            AtomSummary {
                typ: atom.fourcc.to_string(),
                index: key.index,
                size: atom.encoded_size(),
                kind: kind.to_string(),
                payload_len,
                children: kids,
            }
        })
        .collect()
}
