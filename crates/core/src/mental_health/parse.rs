//! Interpretation of raw upstream payloads.
//!
//! Upstream bodies arrive as untyped JSON. Each parser either yields a typed
//! value or a reason the payload could not be used; it never fails the
//! pipeline. Substituting defaults for malformed payloads happens in
//! [`fallback`](super::fallback), not here.

use serde_json::Value;

/// Result of interpreting an upstream payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Malformed(String),
}

impl<T> ParseOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            ParseOutcome::Parsed(value) => Some(value),
            ParseOutcome::Malformed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }
}

/// A single time-stamped observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Period label as reported upstream.
    pub time: String,
    pub value: f64,
}

impl Observation {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }
}

/// A parsed series plus the entries that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSeries {
    /// Usable observations, in upstream order.
    pub observations: Vec<Observation>,
    /// One message per skipped entry.
    pub skipped: Vec<String>,
}

impl ParsedSeries {
    /// Value of the most recent observation.
    pub fn latest(&self) -> Option<f64> {
        self.observations.last().map(|o| o.value)
    }
}

/// Read a number that may be encoded as a JSON number or a numeric string.
fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn time_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a Statistics Canada series payload.
///
/// Expected shape: `{ "observations": [ { "observations": [ { "time", "v" } ] } ] }`.
/// Only the first series is read. Entries without a usable time or value are
/// skipped and reported; a payload with no usable entry is malformed.
pub fn parse_series(payload: &Value) -> ParseOutcome<ParsedSeries> {
    let entries = match payload
        .get("observations")
        .and_then(Value::as_array)
        .and_then(|series| series.first())
        .and_then(|first| first.get("observations"))
        .and_then(Value::as_array)
    {
        Some(entries) => entries,
        None => {
            return ParseOutcome::Malformed("Missing observations array".to_string());
        }
    };

    let mut parsed = ParsedSeries::default();
    for (index, entry) in entries.iter().enumerate() {
        let time = entry.get("time").and_then(time_label);
        let value = entry.get("v").and_then(numeric);
        match (time, value) {
            (Some(time), Some(value)) => parsed.observations.push(Observation { time, value }),
            (Some(time), None) => parsed
                .skipped
                .push(format!("Skipped observation {}: non-numeric value", time)),
            (None, _) => parsed
                .skipped
                .push(format!("Skipped observation #{}: missing time", index)),
        }
    }

    if parsed.observations.is_empty() {
        return ParseOutcome::Malformed(format!(
            "No numeric observations ({} entries)",
            entries.len()
        ));
    }

    ParseOutcome::Parsed(parsed)
}

/// Parse the first value of a WHO GHO indicator payload.
///
/// Expected shape: `{ "value": [ { "Value": ... } ] }`.
pub fn parse_indicator(payload: &Value) -> ParseOutcome<f64> {
    let first = match payload
        .get("value")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        Some(first) => first,
        None => return ParseOutcome::Malformed("Missing indicator values".to_string()),
    };

    match first.get("Value").and_then(numeric) {
        Some(value) => ParseOutcome::Parsed(value),
        None => ParseOutcome::Malformed("Indicator value is not numeric".to_string()),
    }
}
