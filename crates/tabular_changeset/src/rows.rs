//! Row identity bookkeeping on full row sets.

use std::collections::{BTreeMap, BTreeSet};

use tabular_protocol::{ColumnModel, IdRange, RowSet};
use tracing::debug;

use crate::error::{ChangeSetError, Result};

fn valid_row_id(row_id: Option<i64>) -> Option<i64> {
    row_id.filter(|id| *id >= 0)
}

/// Ids of rows that already exist. Fails on the first id seen twice.
pub fn distinct_valid_row_ids(row_set: &RowSet) -> Result<BTreeSet<i64>> {
    let mut ids = BTreeSet::new();
    for id in row_set.rows.iter().filter_map(|r| valid_row_id(r.row_id)) {
        if !ids.insert(id) {
            return Err(ChangeSetError::DuplicateRowId(id));
        }
    }
    Ok(ids)
}

/// Rows that will need a freshly allocated id.
pub fn count_empty_or_invalid_row_ids(row_set: &RowSet) -> usize {
    row_set
        .rows
        .iter()
        .filter(|r| valid_row_id(r.row_id).is_none())
        .count()
}

/// Every row that names an existing id must say which version it was read at.
pub fn validate_row_versions(row_set: &RowSet) -> Result<()> {
    for row in &row_set.rows {
        if let Some(id) = valid_row_id(row.row_id) {
            if row.version_number.is_none() {
                return Err(ChangeSetError::MissingVersionNumber(id));
            }
        }
    }
    Ok(())
}

/// Give new rows ids from `id_range` and stamp every row with the range's version.
pub fn assign_row_ids_and_versions(mut row_set: RowSet, id_range: &IdRange) -> Result<RowSet> {
    let needed = count_empty_or_invalid_row_ids(&row_set);
    let mut ids = match (id_range.minimum_id, id_range.maximum_id) {
        (Some(min), Some(max)) if max >= min => min..=max,
        _ => 1..=0,
    };
    let available = if ids.is_empty() {
        0
    } else {
        ids.end().abs_diff(*ids.start()).saturating_add(1)
    };
    if needed as u64 > available {
        return Err(ChangeSetError::IdRangeTooSmall { needed, available });
    }

    for row in &mut row_set.rows {
        if valid_row_id(row.row_id).is_none() {
            row.row_id = ids.next();
        }
        row.version_number = Some(id_range.version_number);
    }
    if let Some(etag) = &id_range.etag {
        row_set.etag = Some(etag.clone());
    }

    debug!(
        assigned = needed,
        version_number = id_range.version_number,
        "assigned row ids"
    );
    Ok(row_set)
}

/// Positional values in schema order. Columns missing from `values_by_column`
/// take the column's default value.
pub fn convert_to_schema_and_merge(
    values_by_column: &BTreeMap<String, Option<String>>,
    schema: &[ColumnModel],
) -> Vec<Option<String>> {
    schema
        .iter()
        .map(|column| match values_by_column.get(&column.id) {
            Some(value) => value.clone(),
            None => column.default_value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabular_protocol::{ColumnType, Row};

    fn row(row_id: Option<i64>, version: Option<i64>) -> Row {
        Row::new(row_id, version, ["x"])
    }

    fn row_set(rows: Vec<Row>) -> RowSet {
        RowSet {
            table_id: Some("syn1".to_string()),
            rows,
            ..RowSet::default()
        }
    }

    #[test]
    fn test_distinct_valid_row_ids() {
        let set = row_set(vec![row(Some(3), Some(1)), row(None, None), row(Some(-1), None)]);
        assert_eq!(distinct_valid_row_ids(&set).unwrap().into_iter().collect::<Vec<_>>(), [3]);
        assert_eq!(count_empty_or_invalid_row_ids(&set), 2);

        let dup = row_set(vec![row(Some(3), Some(1)), row(Some(3), Some(1))]);
        assert_eq!(
            distinct_valid_row_ids(&dup).unwrap_err().to_string(),
            "The row id 3 is included more than once in the rowset"
        );
    }

    #[test]
    fn test_validate_row_versions() {
        assert!(validate_row_versions(&row_set(vec![row(None, None), row(Some(1), Some(0))])).is_ok());
        assert!(matches!(
            validate_row_versions(&row_set(vec![row(Some(9), None)])),
            Err(ChangeSetError::MissingVersionNumber(9))
        ));
    }

    #[test]
    fn test_assign_row_ids_and_versions() {
        let range = IdRange {
            minimum_id: Some(100),
            maximum_id: Some(101),
            version_number: 7,
            etag: Some("new-etag".to_string()),
        };
        let set = row_set(vec![row(None, None), row(Some(5), Some(2)), row(Some(-4), None)]);
        let set = assign_row_ids_and_versions(set, &range).unwrap();
        let ids: Vec<Option<i64>> = set.rows.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, [Some(100), Some(5), Some(101)]);
        assert!(set.rows.iter().all(|r| r.version_number == Some(7)));
        assert_eq!(set.etag.as_deref(), Some("new-etag"));
    }

    #[test]
    fn test_assign_row_ids_range_too_small() {
        let range = IdRange {
            minimum_id: None,
            maximum_id: None,
            version_number: 1,
            etag: None,
        };
        let err = assign_row_ids_and_versions(row_set(vec![row(None, None)]), &range).unwrap_err();
        assert!(matches!(
            err,
            ChangeSetError::IdRangeTooSmall {
                needed: 1,
                available: 0
            }
        ));
        assert!(assign_row_ids_and_versions(row_set(vec![row(Some(1), Some(1))]), &range).is_ok());
    }

    #[test]
    fn test_assign_row_ids_full_width_range() {
        let range = IdRange {
            minimum_id: Some(i64::MIN),
            maximum_id: Some(i64::MAX),
            version_number: 2,
            etag: None,
        };
        let set = assign_row_ids_and_versions(row_set(vec![row(None, None), row(None, None)]), &range)
            .unwrap();
        let ids: Vec<Option<i64>> = set.rows.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, [Some(i64::MIN), Some(i64::MIN + 1)]);

        let range = IdRange {
            minimum_id: Some(i64::MAX),
            maximum_id: Some(i64::MAX),
            version_number: 2,
            etag: None,
        };
        let set = assign_row_ids_and_versions(row_set(vec![row(None, None)]), &range).unwrap();
        assert_eq!(set.rows[0].row_id, Some(i64::MAX));
        let err = assign_row_ids_and_versions(row_set(vec![row(None, None), row(None, None)]), &range)
            .unwrap_err();
        assert!(matches!(
            err,
            ChangeSetError::IdRangeTooSmall {
                needed: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn test_convert_to_schema_and_merge() {
        let schema = vec![
            ColumnModel::new("1", "a", ColumnType::String).with_default_value("none"),
            ColumnModel::new("2", "b", ColumnType::Integer),
            ColumnModel::new("3", "c", ColumnType::Boolean).with_default_value("false"),
        ];
        let values = BTreeMap::from([
            ("2".to_string(), Some("5".to_string())),
            ("3".to_string(), None),
        ]);
        assert_eq!(
            convert_to_schema_and_merge(&values, &schema),
            [Some("none".to_string()), Some("5".to_string()), None]
        );
    }
}
