//! Column definition normalization.
//!
//! Applied before a schema is accepted so that validation and sizing can rely
//! on list lengths, string sizes and enum values being present and coherent.

use tabular_protocol::defaults::{DEFAULT_STRING_SIZE, MIN_ALLOWED_LIST_LENGTH};
use tabular_protocol::{ColumnModel, ColumnType, TableLimits};
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::value::{validate_scalar, validate_value};

/// Return a normalized copy of `model`, or the first definition problem found.
pub fn normalize_column_model(model: &ColumnModel, limits: &TableLimits) -> Result<ColumnModel> {
    let mut normalized = model.clone();
    let column_type = model.column_type;
    let element_type = column_type.element_type().unwrap_or(column_type);

    if matches!(element_type, ColumnType::String | ColumnType::Link) {
        let maximum_size = model.maximum_size.unwrap_or(DEFAULT_STRING_SIZE);
        if maximum_size == 0 {
            return Err(invalid("ColumnModel.maxSize for a STRING must be greater than 0"));
        }
        if maximum_size > limits.max_allowed_string_size {
            return Err(invalid(format!(
                "ColumnModel.maxSize for a STRING cannot exceed: {}",
                limits.max_allowed_string_size
            )));
        }
        normalized.maximum_size = Some(maximum_size);
    }

    if column_type.is_list() {
        normalized.maximum_list_length = Some(normalize_list_length(
            model.maximum_list_length,
            limits,
        )?);
    }

    normalized.enum_values = normalize_enum_values(&normalized, element_type, limits)?;
    normalized.default_value = normalize_default_value(&normalized, limits)?;

    debug!(column_id = %model.id, column_type = %column_type, "normalized column model");
    Ok(normalized)
}

/// Validate a list length, defaulting a missing one to the global maximum.
pub fn normalize_list_length(maximum_list_length: Option<u64>, limits: &TableLimits) -> Result<u64> {
    let Some(length) = maximum_list_length else {
        return Ok(limits.max_allowed_list_length);
    };
    if length > limits.max_allowed_list_length {
        return Err(invalid(format!(
            "ColumnModel.maximumListLength for a LIST column cannot exceed: {}",
            limits.max_allowed_list_length
        )));
    }
    if length < MIN_ALLOWED_LIST_LENGTH {
        return Err(invalid(format!(
            "ColumnModel.maximumListLength for a LIST column must be at least {}",
            MIN_ALLOWED_LIST_LENGTH
        )));
    }
    Ok(length)
}

fn normalize_enum_values(
    model: &ColumnModel,
    element_type: ColumnType,
    limits: &TableLimits,
) -> Result<Option<Vec<String>>> {
    let Some(values) = model.enum_values.as_ref() else {
        return Ok(None);
    };
    if values.is_empty() {
        return Ok(None);
    }
    if values.len() > limits.max_enum_values {
        return Err(invalid(format!(
            "Maximum number of enum values is {}",
            limits.max_enum_values
        )));
    }

    let unrestricted = ColumnModel {
        enum_values: None,
        default_value: None,
        ..model.clone()
    };
    let mut canonical = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        let normalized = validate_scalar(trimmed, element_type, &unrestricted, limits)
            .map_err(|reason| {
                invalid(format!(
                    "'{}' is not a valid value for a {} column: {}",
                    trimmed, model.column_type, reason
                ))
            })?;
        if !canonical.contains(&normalized) {
            canonical.push(normalized);
        }
    }
    Ok(Some(canonical))
}

fn normalize_default_value(model: &ColumnModel, limits: &TableLimits) -> Result<Option<String>> {
    let Some(default_value) = model.default_value.as_deref() else {
        return Ok(None);
    };
    let column_type = model.column_type;
    let blank = default_value.trim().is_empty();
    let disallowed = matches!(
        column_type,
        ColumnType::EntityIdList | ColumnType::UserIdList | ColumnType::LargeText
    );
    if disallowed {
        let empty_list = column_type.is_list() && default_value.trim() == "[]";
        if blank || empty_list {
            return Ok(None);
        }
        return Err(invalid(format!(
            "Columns of type {} cannot have default values.",
            column_type
        )));
    }
    if blank && !column_type.is_string_like() {
        return Ok(None);
    }

    let without_default = ColumnModel {
        default_value: None,
        ..model.clone()
    };
    validate_value(Some(default_value), &without_default, limits)
        .map_err(|reason| invalid(format!("Invalid default value '{}': {}", default_value, reason)))
}

fn invalid(message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidColumn(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> TableLimits {
        TableLimits::default()
    }

    fn err(model: &ColumnModel) -> String {
        normalize_column_model(model, &limits()).unwrap_err().to_string()
    }

    #[test]
    fn test_string_size_defaults_and_bounds() {
        let cm = ColumnModel::new("1", "s", ColumnType::String);
        let normalized = normalize_column_model(&cm, &limits()).unwrap();
        assert_eq!(normalized.maximum_size, Some(50));

        assert_eq!(
            err(&cm.clone().with_maximum_size(0)),
            "ColumnModel.maxSize for a STRING must be greater than 0"
        );
        assert_eq!(
            err(&cm.clone().with_maximum_size(1001)),
            "ColumnModel.maxSize for a STRING cannot exceed: 1000"
        );
        assert!(normalize_column_model(&cm.with_maximum_size(1000), &limits()).is_ok());
    }

    #[test]
    fn test_string_list_size() {
        let cm = ColumnModel::new("1", "s", ColumnType::StringList).with_maximum_list_length(3);
        let normalized = normalize_column_model(&cm, &limits()).unwrap();
        assert_eq!(normalized.maximum_size, Some(50));
        assert_eq!(normalized.maximum_list_length, Some(3));
    }

    #[test]
    fn test_list_length_bounds() {
        let cm = ColumnModel::new("1", "i", ColumnType::IntegerList);
        let normalized = normalize_column_model(&cm, &limits()).unwrap();
        assert_eq!(normalized.maximum_list_length, Some(100));

        assert_eq!(
            err(&cm.clone().with_maximum_list_length(101)),
            "ColumnModel.maximumListLength for a LIST column cannot exceed: 100"
        );
        assert_eq!(
            err(&cm.with_maximum_list_length(1)),
            "ColumnModel.maximumListLength for a LIST column must be at least 2"
        );
    }

    #[test]
    fn test_enum_trimmed_and_canonical() {
        let cm = ColumnModel::new("1", "d", ColumnType::Double).with_enum_values([" 1 ", "2.5", "1.0"]);
        let normalized = normalize_column_model(&cm, &limits()).unwrap();
        assert_eq!(
            normalized.enum_values,
            Some(vec!["1.0".to_string(), "2.5".to_string()])
        );
    }

    #[test]
    fn test_empty_enum_is_none() {
        let cm = ColumnModel::new("1", "s", ColumnType::String).with_enum_values(Vec::<String>::new());
        assert_eq!(normalize_column_model(&cm, &limits()).unwrap().enum_values, None);
    }

    #[test]
    fn test_incompatible_enum() {
        let cm = ColumnModel::new("1", "i", ColumnType::Integer).with_enum_values(["1", "two"]);
        assert!(err(&cm).starts_with("'two' is not a valid value for a INTEGER column"));
    }

    #[test]
    fn test_too_many_enums() {
        let values: Vec<String> = (0..101).map(|i| i.to_string()).collect();
        let cm = ColumnModel::new("1", "i", ColumnType::Integer).with_enum_values(values);
        assert_eq!(err(&cm), "Maximum number of enum values is 100");
    }

    #[test]
    fn test_disallowed_default_values() {
        for column_type in [ColumnType::EntityIdList, ColumnType::UserIdList] {
            let cm = ColumnModel::new("1", "l", column_type).with_default_value("[\"1\"]");
            assert_eq!(
                err(&cm),
                format!("Columns of type {} cannot have default values.", column_type)
            );
            let empty = ColumnModel::new("1", "l", column_type).with_default_value("[]");
            assert_eq!(normalize_column_model(&empty, &limits()).unwrap().default_value, None);
        }
        let cm = ColumnModel::new("1", "t", ColumnType::LargeText).with_default_value("x");
        assert_eq!(err(&cm), "Columns of type LARGETEXT cannot have default values.");
    }

    #[test]
    fn test_default_value_canonicalized() {
        let cm = ColumnModel::new("1", "b", ColumnType::Boolean).with_default_value("TRUE");
        assert_eq!(
            normalize_column_model(&cm, &limits()).unwrap().default_value,
            Some("true".to_string())
        );

        let bad = ColumnModel::new("1", "b", ColumnType::Boolean).with_default_value("maybe");
        assert!(err(&bad).starts_with("Invalid default value 'maybe'"));
    }

    #[test]
    fn test_string_list_default_must_be_array() {
        let cm = ColumnModel::new("1", "l", ColumnType::StringList)
            .with_maximum_list_length(2)
            .with_default_value("nonArray]");
        assert_eq!(
            err(&cm),
            "Invalid default value 'nonArray]': Not a JSON Array: nonArray]"
        );
    }
}
