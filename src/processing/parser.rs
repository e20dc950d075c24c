//! Line decoder for ranging reports arriving over the serial link
//!
//! Two wire formats are understood:
//!
//! - `AT+RANGE=tid:1,mask:80,seq:65,range:(0,0,107,..),ancid:(-1,-1,7,..)`:
//!   unused slots (range `0`, anchor `-1`) are stripped from each array at
//!   parse time, after which both arrays must line up one-to-one.
//! - `{"id":1,"range":[120,0,85],"aid":[0,1,2]}`: arrays stay index aligned,
//!   a zero range only marks that slot as unseen.

use crate::core::{
    AnchorId, RangeReport, RangeSlot, TagId, WireFormat, AT_RANGE_PREFIX, MAX_RANGE_CM,
    MIN_ANCHORS,
};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// Reasons a line does not produce a range report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The line is not a ranging line of any enabled format
    #[error("not a ranging record")]
    NotARecord,
    /// A required field is absent or unreadable
    #[error("missing or malformed field '{field}'")]
    MalformedField { field: &'static str },
    /// `AT+RANGE` arrays do not pair up into enough valid slots
    #[error("tag {tag_id}: {ranges} valid ranges against {anchors} valid anchor ids")]
    InsufficientPairs {
        tag_id: TagId,
        ranges: usize,
        anchors: usize,
    },
}

/// Decoder turning trimmed text lines into [`RangeReport`]s
#[derive(Debug, Clone)]
pub struct LineDecoder {
    formats: Vec<WireFormat>,
}

impl LineDecoder {
    /// Create a decoder accepting every supported format
    pub fn new() -> Self {
        Self {
            formats: vec![WireFormat::AtRange, WireFormat::Json],
        }
    }

    /// Create a decoder restricted to the given formats
    pub fn with_formats(formats: Vec<WireFormat>) -> Self {
        Self { formats }
    }

    pub fn supports(&self, format: WireFormat) -> bool {
        self.formats.contains(&format)
    }

    /// Decode one line. Surrounding whitespace is ignored.
    pub fn decode(&self, line: &str) -> Result<RangeReport, DecodeError> {
        let line = line.trim();

        if line.starts_with(AT_RANGE_PREFIX) && self.supports(WireFormat::AtRange) {
            return self.decode_at_range(line);
        }
        if line.starts_with('{') && self.supports(WireFormat::Json) {
            return self.decode_json(line);
        }

        Err(DecodeError::NotARecord)
    }

    fn decode_at_range(&self, line: &str) -> Result<RangeReport, DecodeError> {
        let tag_id = labeled_uint(line, "tid:").ok_or(DecodeError::MalformedField { field: "tid" })?;

        let ranges: Vec<f64> = labeled_list(line, "range:")
            .map(|tokens| tokens.iter().map(|t| parse_range(t)).filter(|r| *r > 0.0).collect())
            .unwrap_or_default();

        let anchors: Vec<AnchorId> = labeled_list(line, "ancid:")
            .map(|tokens| tokens.iter().filter_map(|t| parse_anchor_id(t)).collect())
            .unwrap_or_default();

        trace!(tag_id, ?ranges, ?anchors, "decoded AT+RANGE arrays");

        if ranges.len() != anchors.len() || anchors.len() < MIN_ANCHORS {
            return Err(DecodeError::InsufficientPairs {
                tag_id,
                ranges: ranges.len(),
                anchors: anchors.len(),
            });
        }

        let slots = anchors
            .into_iter()
            .zip(ranges)
            .map(|(anchor_id, range)| RangeSlot::new(Some(anchor_id), range))
            .collect();

        Ok(RangeReport {
            tag_id,
            format: WireFormat::AtRange,
            slots,
        })
    }

    fn decode_json(&self, line: &str) -> Result<RangeReport, DecodeError> {
        let value: Value = serde_json::from_str(line).map_err(|_| DecodeError::NotARecord)?;
        let object = value.as_object().ok_or(DecodeError::NotARecord)?;

        let tag_id = object
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| TagId::try_from(id).ok())
            .ok_or(DecodeError::MalformedField { field: "id" })?;

        let ranges: Vec<f64> = json_array(object.get("range"))
            .iter()
            .map(|v| v.as_f64().map(usable_range).unwrap_or(0.0))
            .collect();

        let anchors: Vec<Option<AnchorId>> = json_array(object.get("aid"))
            .iter()
            .map(|v| v.as_i64().and_then(|id| AnchorId::try_from(id).ok()))
            .collect();

        let slots = ranges
            .iter()
            .enumerate()
            .map(|(i, range)| RangeSlot::new(anchors.get(i).copied().flatten(), *range))
            .collect();

        Ok(RangeReport {
            tag_id,
            format: WireFormat::Json,
            slots,
        })
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsigned integer following `label`, e.g. `tid:12`
fn labeled_uint(line: &str, label: &str) -> Option<u32> {
    let start = line.find(label)? + label.len();
    let rest = &line[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Comma separated tokens inside `label(...)`
fn labeled_list<'a>(line: &'a str, label: &str) -> Option<Vec<&'a str>> {
    let start = line.find(label)? + label.len();
    let rest = line[start..].strip_prefix('(')?;
    let end = rest.find(')')?;
    let content = &rest[..end];
    if content.is_empty() {
        return None;
    }
    Some(content.split(',').map(str::trim).collect())
}

/// Range token; unreadable values collapse to the "unused" value 0
fn parse_range(token: &str) -> f64 {
    token.parse::<f64>().map(usable_range).unwrap_or(0.0)
}

/// Non-finite, negative or out-of-scale ranges are unused
fn usable_range(range: f64) -> f64 {
    if range.is_finite() && range > 0.0 && range <= MAX_RANGE_CM {
        range
    } else {
        0.0
    }
}

/// Anchor id token; negative or unreadable values mark an unused slot
fn parse_anchor_id(token: &str) -> Option<AnchorId> {
    let id = token.parse::<i64>().unwrap_or(-1);
    AnchorId::try_from(id).ok()
}

fn json_array(value: Option<&Value>) -> &[Value] {
    value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}
