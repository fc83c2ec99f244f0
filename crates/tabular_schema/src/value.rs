//! Per-cell validation and canonicalization.
//!
//! Every column type owns a literal grammar and a canonical string form.
//! Validation is a pure function of the raw value, the column definition and
//! the configured limits; a valid value comes back in canonical form, so
//! validating a canonical value again returns it unchanged.
//!
//! # Null handling
//!
//! A missing value, or an empty/whitespace-only value for a non string-like
//! type, is replaced by the column default before validation. STRING, LINK and
//! LARGETEXT keep the empty string as a legitimate value.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tabular_protocol::defaults::MAX_ENUM_VALUES_IN_MESSAGE;
use tabular_protocol::{ColumnModel, ColumnType, TableLimits};

use crate::error::{Result, ValidationError};

/// Date-time literals accepted by DATE columns, tried in order. `%.f` also
/// matches a missing fractional part.
pub const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Date-only literal accepted by DATE columns (midnight UTC).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate one cell at `[row_index, column_index]`.
///
/// Returns the canonical value, or `None` when the cell holds no value.
pub fn validate_row_value(
    value: Option<&str>,
    column: &ColumnModel,
    row_index: usize,
    column_index: usize,
    limits: &TableLimits,
) -> Result<Option<String>> {
    validate_value(value, column, limits).map_err(|reason| ValidationError::InvalidValue {
        row: row_index,
        column: column_index,
        column_type: column.column_type,
        reason,
    })
}

/// Validate a value against a column, returning the failure reason on error.
pub fn validate_value(
    value: Option<&str>,
    column: &ColumnModel,
    limits: &TableLimits,
) -> std::result::Result<Option<String>, String> {
    let column_type = column.column_type;
    let value = match value {
        Some(v) if column_type.is_string_like() || !v.trim().is_empty() => Some(v),
        _ => column.default_value.as_deref(),
    };
    let value = match value {
        Some(v) if column_type.is_string_like() || !v.trim().is_empty() => v,
        _ => return Ok(None),
    };

    match column_type.element_type() {
        Some(element) => validate_list(value, element, column, limits),
        None => validate_scalar(value, column_type, column, limits).map(Some),
    }
}

/// Validate a single scalar literal as `scalar_type`, using the size and enum
/// constraints of `column`.
pub fn validate_scalar(
    value: &str,
    scalar_type: ColumnType,
    column: &ColumnModel,
    limits: &TableLimits,
) -> std::result::Result<String, String> {
    let canonical = match scalar_type {
        ColumnType::Boolean => parse_boolean(value)?.to_string(),
        ColumnType::Integer
        | ColumnType::FileHandleId
        | ColumnType::UserId
        | ColumnType::SubmissionId
        | ColumnType::EvaluationId => parse_integer(value)?.to_string(),
        ColumnType::Double => format_double(parse_double(value)?),
        ColumnType::Date => parse_date(value)?.to_string(),
        ColumnType::EntityId => EntityId::parse(value)?.to_string(),
        ColumnType::String | ColumnType::Link => {
            check_string_size(value, scalar_type, column.maximum_size, limits)?;
            value.to_string()
        }
        ColumnType::LargeText => {
            if char_len(value) > limits.max_large_text_characters {
                return Err(format!(
                    "Exceeds the maximum number of characters: {}",
                    limits.max_large_text_characters
                ));
            }
            value.to_string()
        }
        ColumnType::StringList
        | ColumnType::IntegerList
        | ColumnType::BooleanList
        | ColumnType::DateList
        | ColumnType::EntityIdList
        | ColumnType::UserIdList => {
            return Err(format!("{} is not a scalar type", scalar_type));
        }
    };

    check_enum(&canonical, column.enum_values.as_deref())?;
    Ok(canonical)
}

// ============================================================================
// Scalar grammars
// ============================================================================

pub fn parse_boolean(value: &str) -> std::result::Result<bool, String> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!(
            "A value in a boolean column must be null, 'true' or 'false', but was '{}'",
            value
        ))
    }
}

pub fn parse_integer(value: &str) -> std::result::Result<i64, String> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("Cannot parse '{}' as an integer: {}", value, e))
}

/// Parse a double, accepting `nan`, `inf`, `infinity` and `∞` in any case
/// with an optional sign.
pub fn parse_double(value: &str) -> std::result::Result<f64, String> {
    let trimmed = value.trim();
    if let Some(special) = parse_double_alias(trimmed) {
        return Ok(special);
    }
    trimmed
        .parse::<f64>()
        .map_err(|e| format!("Cannot parse '{}' as a double: {}", value, e))
}

fn parse_double_alias(value: &str) -> Option<f64> {
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let magnitude = match body.to_lowercase().as_str() {
        "nan" => return Some(f64::NAN),
        "inf" | "infinity" | "∞" => f64::INFINITY,
        _ => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Canonical double literal: `NaN`, `Infinity`, `-Infinity`, otherwise the
/// shortest round-tripping decimal (exponent form for very large or small
/// magnitudes).
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{:?}", value)
    }
}

/// Parse a DATE literal into epoch milliseconds (UTC).
pub fn parse_date(value: &str) -> std::result::Result<i64, String> {
    let trimmed = value.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Ok(millis);
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&date_time).timestamp_millis());
        }
    }
    if let Some(date_time) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&date_time).timestamp_millis());
    }
    Err(format!("Invalid format: \"{}\"", value))
}

/// A parsed entity reference. The canonical form drops the `syn` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub id: u64,
    pub version: Option<u64>,
}

impl EntityId {
    /// Parse `syn123`, `syn123.4`, `123` or `123.4` (prefix is case-insensitive).
    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        let malformed = || {
            format!(
                "Malformed entity ID (should be syn123 or syn 123.4): {}",
                value
            )
        };
        let trimmed = value.trim();
        let body = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("syn") => &trimmed[3..],
            _ => trimmed,
        };
        let (id, version) = match body.split_once('.') {
            Some((id, version)) => (id, Some(version)),
            None => (body, None),
        };
        let id = parse_digits(id).ok_or_else(malformed)?;
        let version = match version {
            Some(v) => Some(parse_digits(v).ok_or_else(malformed)?),
            None => None,
        };
        Ok(Self { id, version })
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}.{}", self.id, version),
            None => write!(f, "{}", self.id),
        }
    }
}

fn parse_digits(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn check_string_size(
    value: &str,
    column_type: ColumnType,
    maximum_size: Option<u64>,
    limits: &TableLimits,
) -> std::result::Result<(), String> {
    let maximum_size =
        maximum_size.ok_or_else(|| "String columns must have a maximum size".to_string())?;
    let label = if column_type == ColumnType::Link {
        "Link"
    } else {
        "String"
    };
    let len = char_len(value);
    if len > maximum_size {
        let mut message = format!(
            "{} '{}' exceeds the maximum length of {} characters.",
            label, value, maximum_size
        );
        if column_type == ColumnType::String {
            message.push_str(" Consider using a FileHandle to store large strings.");
        }
        return Err(message);
    }
    if len > limits.max_allowed_string_size {
        return Err(format!(
            "{} '{}' exceeds the maximum allowed length of {} characters.",
            label, value, limits.max_allowed_string_size
        ));
    }
    Ok(())
}

fn check_enum(value: &str, enum_values: Option<&[String]>) -> std::result::Result<(), String> {
    let Some(enum_values) = enum_values else {
        return Ok(());
    };
    if enum_values.is_empty() || enum_values.iter().any(|allowed| allowed == value) {
        return Ok(());
    }
    if enum_values.len() > MAX_ENUM_VALUES_IN_MESSAGE {
        Err(format!(
            "'{}' is not a valid value for this column. See column definition for valid values.",
            value
        ))
    } else {
        Err(format!(
            "'{}' is not a valid value for this column. Valid values are: {}.",
            value,
            enum_values.join(", ")
        ))
    }
}

fn char_len(value: &str) -> u64 {
    value.chars().count() as u64
}

// ============================================================================
// Lists
// ============================================================================

fn validate_list(
    value: &str,
    element_type: ColumnType,
    column: &ColumnModel,
    limits: &TableLimits,
) -> std::result::Result<Option<String>, String> {
    let items = match serde_json::from_str::<Value>(value) {
        Ok(Value::Array(items)) => items,
        _ => return Err(format!("Not a JSON Array: {}", value)),
    };
    if items.is_empty() {
        return Ok(None);
    }

    let maximum_list_length = column
        .maximum_list_length
        .unwrap_or(limits.max_allowed_list_length)
        .min(limits.max_allowed_list_length);
    if items.len() as u64 > maximum_list_length {
        return Err(format!(
            "Exceeds the maximum number of list elements defined in the ColumnModel ({}): \"{}\"",
            maximum_list_length, value
        ));
    }

    let mut canonical = Vec::with_capacity(items.len());
    for item in items {
        let raw = match item {
            Value::Null => return Err("null value is not allowed".to_string()),
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => return Err(format!("Not a valid list element: {}", other)),
        };
        let element = validate_scalar(&raw, element_type, column, limits)?;
        canonical.push(list_element_json(element_type, element)?);
    }

    serde_json::to_string(&canonical)
        .map(Some)
        .map_err(|e| e.to_string())
}

fn list_element_json(element_type: ColumnType, canonical: String) -> std::result::Result<Value, String> {
    if element_type.is_integral() || element_type == ColumnType::Date {
        return canonical
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| e.to_string());
    }
    if element_type == ColumnType::Boolean {
        return parse_boolean(&canonical).map(Value::Bool);
    }
    Ok(Value::String(canonical))
}

/// Values read back from the relational store encode booleans as `0`/`1`.
pub fn translate_row_value_from_query(value: Option<&str>, column_type: ColumnType) -> Option<String> {
    let value = value?;
    if column_type == ColumnType::Boolean {
        match value {
            "0" => return Some("false".to_string()),
            "1" => return Some("true".to_string()),
            _ => {}
        }
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> TableLimits {
        TableLimits::default()
    }

    fn column(column_type: ColumnType) -> ColumnModel {
        ColumnModel::new("1", "col", column_type)
    }

    fn valid(value: &str, column: &ColumnModel) -> Option<String> {
        validate_value(Some(value), column, &limits()).unwrap()
    }

    fn reason(value: &str, column: &ColumnModel) -> String {
        validate_value(Some(value), column, &limits()).unwrap_err()
    }

    #[test]
    fn test_boolean() {
        let cm = column(ColumnType::Boolean);
        assert_eq!(valid("FalSE", &cm), Some("false".to_string()));
        assert_eq!(valid("TRUE", &cm), Some("true".to_string()));
        assert_eq!(valid(" true\t", &cm), Some("true".to_string()));
        assert_eq!(
            reason("1", &cm),
            "A value in a boolean column must be null, 'true' or 'false', but was '1'"
        );
    }

    #[test]
    fn test_integer_family() {
        for column_type in [
            ColumnType::Integer,
            ColumnType::FileHandleId,
            ColumnType::UserId,
            ColumnType::SubmissionId,
            ColumnType::EvaluationId,
        ] {
            let cm = column(column_type);
            assert_eq!(valid("123", &cm), Some("123".to_string()));
            assert_eq!(valid("-9223372036854775808", &cm), Some(i64::MIN.to_string()));
            assert_eq!(valid(" 12 ", &cm), Some("12".to_string()));
            let message = reason("true", &cm);
            assert!(message.starts_with("Cannot parse 'true' as an integer: "), "{}", message);
        }
    }

    #[test]
    fn test_double_canonical_forms() {
        let cm = column(ColumnType::Double);
        assert_eq!(valid("123.1", &cm), Some("123.1".to_string()));
        assert_eq!(valid("1", &cm), Some("1.0".to_string()));
        assert_eq!(valid("-1.3e16", &cm), Some("-1.3e16".to_string()));
        assert!(reason("abc", &cm).starts_with("Cannot parse 'abc' as a double"));
    }

    #[test]
    fn test_double_aliases() {
        let cm = column(ColumnType::Double);
        for alias in ["nan", "NaN", "NAN", "-nan"] {
            assert_eq!(valid(alias, &cm), Some("NaN".to_string()), "{}", alias);
        }
        for alias in ["inf", "+Inf", "infinity", "+INFINITY", "∞", "+∞"] {
            assert_eq!(valid(alias, &cm), Some("Infinity".to_string()), "{}", alias);
        }
        for alias in ["-inf", "-Infinity", "-∞"] {
            assert_eq!(valid(alias, &cm), Some("-Infinity".to_string()), "{}", alias);
        }
    }

    #[test]
    fn test_date() {
        let cm = column(ColumnType::Date);
        assert_eq!(valid("1401467342999", &cm), Some("1401467342999".to_string()));
        assert_eq!(
            valid("2014-05-30 16:29:02.999", &cm),
            Some("1401467342999".to_string())
        );
        assert_eq!(valid("2014-05-30T16:29:02", &cm), Some("1401467342000".to_string()));
        assert_eq!(valid("1970-01-01", &cm), Some("0".to_string()));
        assert_eq!(valid("1970-01-01 00:01", &cm), Some("60000".to_string()));
        assert_eq!(reason("true", &cm), "Invalid format: \"true\"");
    }

    #[test]
    fn test_entity_id() {
        let cm = column(ColumnType::EntityId);
        assert_eq!(valid("syn123", &cm), Some("123".to_string()));
        assert_eq!(valid("syn123.33", &cm), Some("123.33".to_string()));
        assert_eq!(valid("SYN9", &cm), Some("9".to_string()));
        assert_eq!(valid("456.1", &cm), Some("456.1".to_string()));
        for bad in ["syn", "syn123.", "synabc", "syn1.2.3", "foo123", "syn-1"] {
            assert_eq!(
                reason(bad, &cm),
                format!("Malformed entity ID (should be syn123 or syn 123.4): {}", bad)
            );
        }
    }

    #[test]
    fn test_string_size() {
        let cm = column(ColumnType::String).with_maximum_size(5);
        assert_eq!(valid("", &cm), Some(String::new()));
        assert_eq!(valid("abcde", &cm), Some("abcde".to_string()));
        assert_eq!(
            reason("abcdef", &cm),
            "String 'abcdef' exceeds the maximum length of 5 characters. Consider using a FileHandle to store large strings."
        );
        assert_eq!(
            reason("x", &column(ColumnType::String)),
            "String columns must have a maximum size"
        );
    }

    #[test]
    fn test_string_global_ceiling() {
        let limits = TableLimits {
            max_allowed_string_size: 3,
            ..TableLimits::default()
        };
        let cm = column(ColumnType::String).with_maximum_size(10);
        let err = validate_value(Some("abcd"), &cm, &limits).unwrap_err();
        assert_eq!(
            err,
            "String 'abcd' exceeds the maximum allowed length of 3 characters."
        );
    }

    #[test]
    fn test_link_size() {
        let cm = column(ColumnType::Link).with_maximum_size(3);
        assert_eq!(
            reason("http://x", &cm),
            "Link 'http://x' exceeds the maximum length of 3 characters."
        );
    }

    #[test]
    fn test_string_counts_characters() {
        let cm = column(ColumnType::String).with_maximum_size(2);
        assert_eq!(valid("∞∞", &cm), Some("∞∞".to_string()));
    }

    #[test]
    fn test_enum_values() {
        let cm = column(ColumnType::String)
            .with_maximum_size(10)
            .with_enum_values(["aa", "bb", "cc"]);
        assert_eq!(valid("bb", &cm), Some("bb".to_string()));
        let err = validate_row_value(Some("dd"), &cm, 1, 4, &limits()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Value at [1,4] was not a valid STRING. 'dd' is not a valid value for this column. Valid values are: aa, bb, cc."
        );
    }

    #[test]
    fn test_enum_values_too_many_to_list() {
        let values: Vec<String> = (0..11).map(|i| format!("v{}", i)).collect();
        let cm = column(ColumnType::String)
            .with_maximum_size(10)
            .with_enum_values(values);
        assert_eq!(
            reason("zz", &cm),
            "'zz' is not a valid value for this column. See column definition for valid values."
        );
    }

    #[test]
    fn test_enum_on_integer_uses_canonical_value() {
        let cm = column(ColumnType::Integer).with_enum_values(["1", "2"]);
        assert_eq!(valid("+2", &cm), Some("2".to_string()));
        assert!(reason("3", &cm).contains("Valid values are: 1, 2."));
    }

    #[test]
    fn test_large_text() {
        let limits = TableLimits {
            max_large_text_characters: 4,
            ..TableLimits::default()
        };
        let cm = column(ColumnType::LargeText);
        assert_eq!(
            validate_value(Some("abcd"), &cm, &limits).unwrap(),
            Some("abcd".to_string())
        );
        assert_eq!(
            validate_value(Some("abcde"), &cm, &limits).unwrap_err(),
            "Exceeds the maximum number of characters: 4"
        );
    }

    #[test]
    fn test_null_and_default_substitution() {
        let cm = column(ColumnType::Integer).with_default_value("42");
        assert_eq!(validate_value(None, &cm, &limits()).unwrap(), Some("42".to_string()));
        assert_eq!(valid("", &cm), Some("42".to_string()));
        assert_eq!(valid("   ", &cm), Some("42".to_string()));
        assert_eq!(validate_value(None, &column(ColumnType::Integer), &limits()).unwrap(), None);
        assert_eq!(valid("", &column(ColumnType::Boolean)), None);
    }

    #[test]
    fn test_empty_string_is_not_replaced_for_strings() {
        let cm = column(ColumnType::String)
            .with_maximum_size(10)
            .with_default_value("fallback");
        assert_eq!(valid("", &cm), Some(String::new()));
        assert_eq!(
            validate_value(None, &cm, &limits()).unwrap(),
            Some("fallback".to_string())
        );
    }

    #[test]
    fn test_default_is_validated() {
        let cm = column(ColumnType::Double).with_default_value("-89.3e12");
        assert_eq!(
            validate_value(None, &cm, &limits()).unwrap(),
            Some("-89300000000000.0".to_string())
        );
    }

    #[test]
    fn test_row_value_error_coordinates() {
        let cm = column(ColumnType::Boolean);
        let err = validate_row_value(Some("yes"), &cm, 3, 7, &limits()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidValue {
                row: 3,
                column: 7,
                column_type: ColumnType::Boolean,
                reason: "A value in a boolean column must be null, 'true' or 'false', but was 'yes'"
                    .to_string(),
            }
        );
    }

    #[test]
    fn test_lists_canonical_json() {
        let ints = column(ColumnType::IntegerList).with_maximum_list_length(3);
        assert_eq!(valid("[1, \"2\", -3]", &ints), Some("[1,2,-3]".to_string()));

        let bools = column(ColumnType::BooleanList).with_maximum_list_length(3);
        assert_eq!(valid("[\"TRUE\", false]", &bools), Some("[true,false]".to_string()));

        let strings = column(ColumnType::StringList)
            .with_maximum_size(3)
            .with_maximum_list_length(3);
        assert_eq!(valid("[\"a\", \"bc\"]", &strings), Some("[\"a\",\"bc\"]".to_string()));

        let entities = column(ColumnType::EntityIdList).with_maximum_list_length(2);
        assert_eq!(valid("[\"syn1\", \"syn2.3\"]", &entities), Some("[\"1\",\"2.3\"]".to_string()));

        let dates = column(ColumnType::DateList).with_maximum_list_length(2);
        assert_eq!(valid("[\"1970-01-01\", 5]", &dates), Some("[0,5]".to_string()));
    }

    #[test]
    fn test_empty_list_is_no_value() {
        for column_type in ColumnType::all().into_iter().filter(|t| t.is_list()) {
            let cm = column(column_type)
                .with_maximum_size(10)
                .with_maximum_list_length(2);
            assert_eq!(valid("[]", &cm), None, "{}", column_type);
        }
    }

    #[test]
    fn test_list_errors() {
        let cm = column(ColumnType::IntegerList).with_maximum_list_length(2);
        assert_eq!(reason("nonArray]", &cm), "Not a JSON Array: nonArray]");
        assert_eq!(
            reason("[1,2,3]", &cm),
            "Exceeds the maximum number of list elements defined in the ColumnModel (2): \"[1,2,3]\""
        );
        assert_eq!(reason("[1,null]", &cm), "null value is not allowed");
        assert!(reason("[1.5]", &cm).starts_with("Cannot parse '1.5' as an integer"));
    }

    #[test]
    fn test_list_element_string_size() {
        let cm = column(ColumnType::StringList)
            .with_maximum_size(2)
            .with_maximum_list_length(5);
        assert!(reason("[\"abc\"]", &cm).starts_with("String 'abc' exceeds the maximum length of 2"));
    }

    #[test]
    fn test_translate_row_value_from_query() {
        assert_eq!(
            translate_row_value_from_query(Some("0"), ColumnType::Boolean),
            Some("false".to_string())
        );
        assert_eq!(
            translate_row_value_from_query(Some("1"), ColumnType::Boolean),
            Some("true".to_string())
        );
        assert_eq!(
            translate_row_value_from_query(Some("1"), ColumnType::Integer),
            Some("1".to_string())
        );
        assert_eq!(translate_row_value_from_query(None, ColumnType::Boolean), None);
    }
}
