//! Storage record mapping primitives.
//!
//! # Responsibility
//! - Define the per-entity mapping contract between domain structs and the
//!   flat `<field>_c` records held by the record store.
//! - Provide lenient value readers for store-returned JSON records.
//!
//! # Invariants
//! - Every stored record carries an integer `Id`; a record without one is
//!   rejected instead of being mapped with a placeholder id.
//! - Missing or `null` text fields map to empty strings, missing optional
//!   fields map to `None`.

use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned record identifier.
pub type RecordId = i64;

/// Flat storage record as exchanged with the record store.
pub type StorageRecord = Map<String, Value>;

/// Storage key of the store-assigned identifier.
pub const ID_FIELD: &str = "Id";

/// Error raised when a store record cannot be mapped into a domain object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Payload is not a JSON object.
    NotAnObject,
    /// Required field is absent or null.
    MissingField(&'static str),
    /// Field holds a value of an unexpected shape.
    InvalidField { field: &'static str, value: String },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "store record is not an object"),
            Self::MissingField(field) => write!(f, "store record is missing `{field}`"),
            Self::InvalidField { field, value } => {
                write!(f, "store record field `{field}` has invalid value `{value}`")
            }
        }
    }
}

impl Error for MappingError {}

/// Mapping table between one domain entity and its storage records.
///
/// Implemented once per entity; the generic access helper uses it to build
/// field selections, search predicates and to normalize results.
pub trait StorageMapping: Sized {
    /// Entity-type name addressed in the record store.
    const ENTITY: &'static str;
    /// Human-readable singular label used in logs and notices.
    const LABEL: &'static str;
    /// Storage fields selected on every read, excluding `Id`.
    const FIELDS: &'static [&'static str];
    /// Storage text fields combined with OR-contains for search.
    const SEARCH_FIELDS: &'static [&'static str];
    /// Whether writes stamp `updatedAt_c`.
    const TRACKS_UPDATED_AT: bool = false;

    /// Maps one store record into the domain object.
    fn from_record(record: &StorageRecord) -> Result<Self, MappingError>;
}

/// Converts a store payload into a record map.
pub fn as_record(value: &Value) -> Result<&StorageRecord, MappingError> {
    value.as_object().ok_or(MappingError::NotAnObject)
}

/// Reads the mandatory record id.
pub fn read_id(record: &StorageRecord) -> Result<RecordId, MappingError> {
    read_ref(record, ID_FIELD)?.ok_or(MappingError::MissingField(ID_FIELD))
}

/// Reads a text field; absent and null map to an empty string.
pub fn read_text(record: &StorageRecord, field: &'static str) -> String {
    read_opt_text(record, field).unwrap_or_default()
}

/// Reads an optional text field. Numbers and booleans are rendered as text.
pub fn read_opt_text(record: &StorageRecord, field: &'static str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

/// Reads a reference field holding another record's id.
///
/// Accepts plain integers, numeric strings and lookup objects of the form
/// `{"Id": 7, "Name": "..."}`.
pub fn read_ref(
    record: &StorageRecord,
    field: &'static str,
) -> Result<Option<RecordId>, MappingError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => ref_from_value(value)
            .map(Some)
            .ok_or_else(|| MappingError::InvalidField {
                field,
                value: value.to_string(),
            }),
    }
}

fn ref_from_value(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => text.trim().parse().ok(),
        Value::Object(lookup) => lookup.get(ID_FIELD).and_then(ref_from_value),
        _ => None,
    }
}

/// Reads a numeric field; absent and null map to `0.0`.
pub fn read_number(record: &StorageRecord, field: &'static str) -> Result<f64, MappingError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| invalid(field, record)),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(0.0),
        Some(Value::String(text)) => text.trim().parse().map_err(|_| invalid(field, record)),
        Some(_) => Err(invalid(field, record)),
    }
}

/// Reads an integer field; fractional numbers are truncated.
pub fn read_integer(record: &StorageRecord, field: &'static str) -> Result<i64, MappingError> {
    read_number(record, field).map(|value| value.trunc() as i64)
}

/// Reads a boolean field. Absent and null read as `false`.
pub fn read_flag(record: &StorageRecord, field: &'static str) -> Result<bool, MappingError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::Number(number)) => Ok(number.as_i64().unwrap_or(0) != 0),
        Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            _ => Err(invalid(field, record)),
        },
        Some(_) => Err(invalid(field, record)),
    }
}

fn invalid(field: &'static str, record: &StorageRecord) -> MappingError {
    MappingError::InvalidField {
        field,
        value: record
            .get(field)
            .map(Value::to_string)
            .unwrap_or_default(),
    }
}

/// Writes an optional reference, emitting `null` when absent.
pub fn ref_value(id: Option<RecordId>) -> Value {
    id.map_or(Value::Null, Value::from)
}

/// Writes an optional text value, emitting `null` when absent.
pub fn opt_text_value(text: Option<&str>) -> Value {
    text.map_or(Value::Null, Value::from)
}

#[cfg(test)]
mod tests {
    use super::{read_flag, read_id, read_number, read_ref, read_text, MappingError};
    use serde_json::json;

    fn record(value: serde_json::Value) -> super::StorageRecord {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn read_ref_accepts_numbers_strings_and_lookups() {
        let rec = record(json!({"a": 4, "b": "12", "c": {"Id": 9, "Name": "Acme"}, "d": null}));
        assert_eq!(read_ref(&rec, "a").unwrap(), Some(4));
        assert_eq!(read_ref(&rec, "b").unwrap(), Some(12));
        assert_eq!(read_ref(&rec, "c").unwrap(), Some(9));
        assert_eq!(read_ref(&rec, "d").unwrap(), None);
        assert_eq!(read_ref(&rec, "missing").unwrap(), None);
    }

    #[test]
    fn read_ref_rejects_non_numeric_text() {
        let rec = record(json!({"a": "abc"}));
        assert!(matches!(
            read_ref(&rec, "a"),
            Err(MappingError::InvalidField { field: "a", .. })
        ));
    }

    #[test]
    fn read_id_requires_presence() {
        let rec = record(json!({"name_c": "x"}));
        assert_eq!(read_id(&rec), Err(MappingError::MissingField("Id")));
    }

    #[test]
    fn scalar_readers_coerce_loosely_typed_values() {
        let rec = record(json!({"v": "12.5", "t": null, "f": "true", "n": 0}));
        assert_eq!(read_number(&rec, "v").unwrap(), 12.5);
        assert_eq!(read_text(&rec, "t"), "");
        assert!(read_flag(&rec, "f").unwrap());
        assert!(!read_flag(&rec, "n").unwrap());
    }
}
