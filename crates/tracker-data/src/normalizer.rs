//! Normalization of raw usage exports.
//!
//! Two document shapes are accepted:
//!
//! * keyed by user: `{"a@x.com": [record, ...], ...}`
//! * flat: `[record, ...]`, each record carrying its own `user`
//!
//! Both produce the same [`UsageRecord`]s. Bad records are dropped with one
//! [`Diagnostic`] each and processing always continues.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use tracker_core::error::{Diagnostic, RecordError, RecordLocation};
use tracker_core::models::{
    period_from_timestamp, UsageRecord, DEFAULT_RECORD_TYPE, TIMESTAMP_FORMAT,
};

/// Keys every record must carry, checked in this order after `timestamp`.
const REQUIRED_FIELDS: [&str; 4] = ["model", "total_cost", "input_tokens", "output_tokens"];

/// Maximum number of fractional-second digits accepted in a timestamp.
const MAX_FRACTION_DIGITS: usize = 6;

// ── Output ────────────────────────────────────────────────────────────────────

/// Records that survived validation plus every diagnostic raised on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Valid records in input traversal order.
    pub records: Vec<UsageRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, result: Result<UsageRecord, RecordError>, location: RecordLocation) {
        match result {
            Ok(record) => self.records.push(record),
            Err(error) => self.reject(&error, location),
        }
    }

    fn reject(&mut self, error: &RecordError, location: RecordLocation) {
        warn!(%location, "{}", error);
        self.diagnostics
            .push(Diagnostic::from_record_error(error, location));
    }
}

// ── InputShape ────────────────────────────────────────────────────────────────

/// Top-level layout of a usage export.
#[derive(Debug, Clone, Copy)]
pub enum InputShape<'a> {
    /// User e-mail → list of records.
    KeyedByUser(&'a Map<String, Value>),
    /// List of records with a `user` field each.
    FlatList(&'a [Value]),
    /// Anything else.
    Unsupported(&'a Value),
}

impl<'a> InputShape<'a> {
    pub fn detect(document: &'a Value) -> Self {
        match document {
            Value::Object(map) => InputShape::KeyedByUser(map),
            Value::Array(items) => InputShape::FlatList(items),
            other => InputShape::Unsupported(other),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize a parsed usage export.
///
/// Never fails: record-level problems become diagnostics, and an export with
/// no surviving records yields an empty sequence plus a
/// [`DiagnosticKind::NoValidData`](tracker_core::error::DiagnosticKind::NoValidData)
/// diagnostic.
pub fn normalize(document: &Value) -> Normalized {
    let mut out = Normalized::default();

    match InputShape::detect(document) {
        InputShape::KeyedByUser(map) => {
            for (user, value) in map {
                let Some(records) = value.as_array() else {
                    out.reject(
                        &RecordError::UnexpectedShape {
                            expected: "a list of records",
                            found: json_type_name(value),
                        },
                        RecordLocation::KeyedEntry { user: user.clone() },
                    );
                    continue;
                };
                for (index, raw) in records.iter().enumerate() {
                    out.push(
                        normalize_record(raw, Some(user)),
                        RecordLocation::Keyed {
                            user: user.clone(),
                            index,
                        },
                    );
                }
            }
        }
        InputShape::FlatList(items) => {
            for (index, raw) in items.iter().enumerate() {
                out.push(normalize_record(raw, None), RecordLocation::Flat { index });
            }
        }
        InputShape::Unsupported(value) => {
            out.reject(
                &RecordError::UnexpectedShape {
                    expected: "an object keyed by user or a list of records",
                    found: json_type_name(value),
                },
                RecordLocation::Document,
            );
        }
    }

    if out.records.is_empty() {
        warn!("No valid data found to process.");
        out.diagnostics.push(Diagnostic::no_valid_data());
    }

    debug!(
        "Normalized {} records, {} diagnostics",
        out.records.len(),
        out.diagnostics.len()
    );

    out
}

/// Validate one raw record.
///
/// `user_key` is the enclosing key in the keyed shape; `None` means the user
/// is read from the record's own `user` field.
pub fn normalize_record(raw: &Value, user_key: Option<&str>) -> Result<UsageRecord, RecordError> {
    let record = raw.as_object().ok_or(RecordError::MalformedRecord {
        found: json_type_name(raw),
    })?;

    let user = match user_key {
        Some(user) => user.to_string(),
        None => scalar_text(required(record, "user")?),
    };

    let timestamp = parse_timestamp(required(record, "timestamp")?)?;
    let period = period_from_timestamp(&timestamp);

    for field in REQUIRED_FIELDS {
        required(record, field)?;
    }

    let model = scalar_text(required(record, "model")?);
    let cost = coerce_cost(required(record, "total_cost")?)?;
    let input_tokens = integer(required(record, "input_tokens")?, "input_tokens")?;
    let output_tokens = integer(required(record, "output_tokens")?, "output_tokens")?;
    let total_tokens =
        input_tokens
            .checked_add(output_tokens)
            .ok_or_else(|| RecordError::InvalidNumeric {
                field: "total_tokens",
                value: format!("{} + {}", input_tokens, output_tokens),
            })?;

    let image_count = match optional(record, "image_count") {
        Some(value) => integer(value, "image_count")?,
        None => 0,
    };
    let record_type = optional(record, "type")
        .map(scalar_text)
        .unwrap_or_else(|| DEFAULT_RECORD_TYPE.to_string());

    Ok(UsageRecord {
        period,
        model,
        cost,
        user,
        total_tokens,
        image_count,
        record_type,
    })
}

/// Parse a `YYYY-MM-DDTHH:MM:SS.ffffff` timestamp (1–6 fraction digits).
pub fn parse_timestamp(value: &Value) -> Result<NaiveDateTime, RecordError> {
    let invalid = || RecordError::InvalidTimestamp {
        value: scalar_text(value),
    };

    let text = value.as_str().ok_or_else(invalid)?;

    let has_fraction = text.rsplit_once('.').is_some_and(|(_, fraction)| {
        (1..=MAX_FRACTION_DIGITS).contains(&fraction.len())
            && fraction.bytes().all(|b| b.is_ascii_digit())
    });
    if !has_fraction {
        return Err(invalid());
    }

    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|_| invalid())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Present and not `null`.
fn required<'a>(
    record: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, RecordError> {
    optional(record, field).ok_or(RecordError::MissingField { field })
}

fn optional<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

/// Numbers pass through; text is parsed as a float. Non-finite results are
/// rejected.
fn coerce_cost(value: &Value) -> Result<f64, RecordError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).ok_or_else(|| RecordError::InvalidNumeric {
        field: "total_cost",
        value: value.to_string(),
    })
}

/// JSON integers, or floats with no fractional part.
fn integer(value: &Value, field: &'static str) -> Result<i64, RecordError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    };
    parsed.ok_or_else(|| RecordError::InvalidNumeric {
        field,
        value: value.to_string(),
    })
}

/// Strings verbatim, other values in their JSON rendering.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
