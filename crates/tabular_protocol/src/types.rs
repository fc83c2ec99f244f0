//! Wire and data-model types shared by every tabular crate.
//!
//! All records use camelCase field names on the wire. Optional identifiers are
//! modelled as `Option` so that missing values surface as structural errors in
//! the validation layer instead of failing deserialization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Column Types
// ============================================================================

/// The domain of a table column.
///
/// Scalar types each have at most one `_LIST` counterpart. The wire name is the
/// upper-case form returned by [`ColumnType::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "INTEGER")]
    Integer,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "LINK")]
    Link,
    /// Epoch milliseconds, UTC.
    #[serde(rename = "DATE")]
    Date,
    /// `syn<digits>[.<version>]`
    #[serde(rename = "ENTITYID")]
    EntityId,
    #[serde(rename = "FILEHANDLEID")]
    FileHandleId,
    #[serde(rename = "USERID")]
    UserId,
    #[serde(rename = "SUBMISSIONID")]
    SubmissionId,
    #[serde(rename = "EVALUATIONID")]
    EvaluationId,
    #[serde(rename = "LARGETEXT")]
    LargeText,
    #[serde(rename = "STRING_LIST")]
    StringList,
    #[serde(rename = "INTEGER_LIST")]
    IntegerList,
    #[serde(rename = "BOOLEAN_LIST")]
    BooleanList,
    #[serde(rename = "DATE_LIST")]
    DateList,
    #[serde(rename = "ENTITYID_LIST")]
    EntityIdList,
    #[serde(rename = "USERID_LIST")]
    UserIdList,
}

impl ColumnType {
    /// Every column type, scalars first.
    pub fn all() -> [ColumnType; 18] {
        [
            ColumnType::Boolean,
            ColumnType::Integer,
            ColumnType::Double,
            ColumnType::String,
            ColumnType::Link,
            ColumnType::Date,
            ColumnType::EntityId,
            ColumnType::FileHandleId,
            ColumnType::UserId,
            ColumnType::SubmissionId,
            ColumnType::EvaluationId,
            ColumnType::LargeText,
            ColumnType::StringList,
            ColumnType::IntegerList,
            ColumnType::BooleanList,
            ColumnType::DateList,
            ColumnType::EntityIdList,
            ColumnType::UserIdList,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Double => "DOUBLE",
            ColumnType::String => "STRING",
            ColumnType::Link => "LINK",
            ColumnType::Date => "DATE",
            ColumnType::EntityId => "ENTITYID",
            ColumnType::FileHandleId => "FILEHANDLEID",
            ColumnType::UserId => "USERID",
            ColumnType::SubmissionId => "SUBMISSIONID",
            ColumnType::EvaluationId => "EVALUATIONID",
            ColumnType::LargeText => "LARGETEXT",
            ColumnType::StringList => "STRING_LIST",
            ColumnType::IntegerList => "INTEGER_LIST",
            ColumnType::BooleanList => "BOOLEAN_LIST",
            ColumnType::DateList => "DATE_LIST",
            ColumnType::EntityIdList => "ENTITYID_LIST",
            ColumnType::UserIdList => "USERID_LIST",
        }
    }

    pub fn is_list(&self) -> bool {
        self.element_type().is_some()
    }

    /// Scalar element type of a list type, `None` for scalars.
    pub fn element_type(&self) -> Option<ColumnType> {
        match self {
            ColumnType::StringList => Some(ColumnType::String),
            ColumnType::IntegerList => Some(ColumnType::Integer),
            ColumnType::BooleanList => Some(ColumnType::Boolean),
            ColumnType::DateList => Some(ColumnType::Date),
            ColumnType::EntityIdList => Some(ColumnType::EntityId),
            ColumnType::UserIdList => Some(ColumnType::UserId),
            _ => None,
        }
    }

    /// List counterpart of a scalar type, if one exists.
    pub fn list_of(scalar: ColumnType) -> Option<ColumnType> {
        match scalar {
            ColumnType::String => Some(ColumnType::StringList),
            ColumnType::Integer => Some(ColumnType::IntegerList),
            ColumnType::Boolean => Some(ColumnType::BooleanList),
            ColumnType::Date => Some(ColumnType::DateList),
            ColumnType::EntityId => Some(ColumnType::EntityIdList),
            ColumnType::UserId => Some(ColumnType::UserIdList),
            _ => None,
        }
    }

    /// Types for which an empty string is a legitimate value rather than "no value".
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            ColumnType::String | ColumnType::Link | ColumnType::LargeText
        )
    }

    /// Types whose literal is a signed 64-bit integer.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer
                | ColumnType::FileHandleId
                | ColumnType::UserId
                | ColumnType::SubmissionId
                | ColumnType::EvaluationId
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ColumnType::all()
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| format!("Invalid column type: '{}'", s))
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Definition of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModel {
    pub id: String,
    pub name: String,
    pub column_type: ColumnType,
    /// Characters, for STRING/LINK and STRING_LIST elements.
    #[serde(default)]
    pub maximum_size: Option<u64>,
    /// Element count, required for list types.
    #[serde(default)]
    pub maximum_list_length: Option<u64>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub enum_values: Option<Vec<String>>,
}

impl ColumnModel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type,
            maximum_size: None,
            maximum_list_length: None,
            default_value: None,
            enum_values: None,
        }
    }

    pub fn with_maximum_size(mut self, maximum_size: u64) -> Self {
        self.maximum_size = Some(maximum_size);
        self
    }

    pub fn with_maximum_list_length(mut self, maximum_list_length: u64) -> Self {
        self.maximum_list_length = Some(maximum_list_length);
        self
    }

    pub fn with_default_value(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// A header entry of a row set: which column a positional value belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectColumn {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub column_type: Option<ColumnType>,
}

impl From<&ColumnModel> for SelectColumn {
    fn from(model: &ColumnModel) -> Self {
        Self {
            id: Some(model.id.clone()),
            name: model.name.clone(),
            column_type: Some(model.column_type),
        }
    }
}

// ============================================================================
// Row Sets
// ============================================================================

/// A full row aligned positionally to the headers of its [`RowSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(default)]
    pub row_id: Option<i64>,
    #[serde(default)]
    pub version_number: Option<i64>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<Option<String>>>,
}

impl Row {
    pub fn new<I, S>(row_id: Option<i64>, version_number: Option<i64>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            row_id,
            version_number,
            etag: None,
            values: Some(values.into_iter().map(|v| Some(v.into())).collect()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSet {
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    /// `None` entries mark positions to ignore.
    #[serde(default)]
    pub headers: Vec<Option<SelectColumn>>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// An update naming only the cells it changes, keyed by column id.
///
/// `values == None` deletes the row; a key mapped to `None` clears that cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRow {
    #[serde(default)]
    pub row_id: Option<i64>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub values: Option<BTreeMap<String, Option<String>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRowSet {
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub rows: Vec<PartialRow>,
}

/// The most recent change applied to a table, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowChange {
    pub table_id: String,
    pub row_version: i64,
    #[serde(default)]
    pub etag: Option<String>,
}

/// A block of row ids and a version number allocated by the store for one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRange {
    /// First id of the block; `None` when no ids were requested.
    #[serde(default)]
    pub minimum_id: Option<i64>,
    #[serde(default)]
    pub maximum_id: Option<i64>,
    pub version_number: i64,
    #[serde(default)]
    pub etag: Option<String>,
}

// ============================================================================
// Sparse Change Sets (persisted form)
// ============================================================================

/// One row of a persisted change set. `values == None` is a row delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseRowDto {
    #[serde(default)]
    pub row_id: Option<i64>,
    #[serde(default)]
    pub version_number: Option<i64>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub values: Option<BTreeMap<String, Option<String>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseChangeSetDto {
    pub table_id: String,
    #[serde(default)]
    pub etag: Option<String>,
    /// Column ids of the schema the rows were validated against, in schema order.
    #[serde(default)]
    pub column_ids: Vec<String>,
    #[serde(default)]
    pub rows: Vec<SparseRowDto>,
}

// ============================================================================
// Schema Changes
// ============================================================================

/// One column-level change between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChange {
    pub old_column_id: Option<String>,
    pub new_column_id: Option<String>,
}

impl ColumnChange {
    pub fn add(new_column_id: impl Into<String>) -> Self {
        Self {
            old_column_id: None,
            new_column_id: Some(new_column_id.into()),
        }
    }

    pub fn remove(old_column_id: impl Into<String>) -> Self {
        Self {
            old_column_id: Some(old_column_id.into()),
            new_column_id: None,
        }
    }

    pub fn update(old_column_id: impl Into<String>, new_column_id: impl Into<String>) -> Self {
        Self {
            old_column_id: Some(old_column_id.into()),
            new_column_id: Some(new_column_id.into()),
        }
    }
}

// ============================================================================
// CSV Upload
// ============================================================================

/// CSV dialect as supplied by a client. Unset fields take the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvTableDescriptor {
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub quote_character: Option<String>,
    #[serde(default)]
    pub escape_character: Option<String>,
    #[serde(default)]
    pub is_first_line_header: Option<bool>,
    #[serde(default)]
    pub line_end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvUploadOptions {
    #[serde(default)]
    pub descriptor: CsvTableDescriptor,
    #[serde(default)]
    pub lines_to_skip: Option<u64>,
    #[serde(default)]
    pub do_full_file_scan: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_wire_names() {
        for column_type in ColumnType::all() {
            let json = serde_json::to_string(&column_type).unwrap();
            assert_eq!(json, format!("\"{}\"", column_type.as_str()));
            assert_eq!(column_type.as_str().parse::<ColumnType>().unwrap(), column_type);
        }
        assert_eq!("entityid_list".parse::<ColumnType>().unwrap(), ColumnType::EntityIdList);
        assert!("MEDIUMTEXT".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_list_element_types() {
        for column_type in ColumnType::all() {
            if let Some(element) = column_type.element_type() {
                assert!(!element.is_list());
                assert_eq!(ColumnType::list_of(element), Some(column_type));
            }
        }
        assert!(ColumnType::DateList.is_list());
        assert!(!ColumnType::LargeText.is_list());
        assert_eq!(ColumnType::list_of(ColumnType::Double), None);
    }

    #[test]
    fn test_column_model_camel_case() {
        let model = ColumnModel::new("3", "name", ColumnType::String)
            .with_maximum_size(20)
            .with_enum_values(["a", "b"]);
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["columnType"], "STRING");
        assert_eq!(json["maximumSize"], 20);
        assert_eq!(json["enumValues"][1], "b");

        let back: ColumnModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_row_set_null_headers() {
        let json = r#"{
            "tableId": "syn123",
            "etag": "e1",
            "headers": [{"id": "1", "name": "a"}, null],
            "rows": [{"rowId": 5, "versionNumber": 2, "values": ["x", null]}]
        }"#;
        let row_set: RowSet = serde_json::from_str(json).unwrap();
        assert_eq!(row_set.headers.len(), 2);
        assert!(row_set.headers[1].is_none());
        assert_eq!(
            row_set.rows[0].values,
            Some(vec![Some("x".to_string()), None])
        );
    }

    #[test]
    fn test_partial_row_delete_vs_clear() {
        let json = r#"{"tableId": "syn1", "rows": [
            {"rowId": 1, "values": null},
            {"rowId": 2, "values": {"7": null}}
        ]}"#;
        let set: PartialRowSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.rows[0].values, None);
        let cleared = set.rows[1].values.as_ref().unwrap();
        assert_eq!(cleared.get("7"), Some(&None));
    }
}
