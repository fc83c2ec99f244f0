//! The validated, schema-aligned sparse change set.
//!
//! A change set is built by value: each [`SparseChangeSet::with_row`] call
//! validates the row against the schema and returns the extended set. Cells
//! that are not present mean "no change requested"; a row with no cells at
//! all is a row delete.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tabular_protocol::{ColumnModel, ColumnType, SparseChangeSetDto, SparseRowDto, TableLimits};
use tabular_schema::validate_row_value;

use crate::error::{ChangeSetError, Result};

/// What an inbound row asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowMutation {
    /// Nothing to do; the row is left out of the change set.
    Unchanged,
    /// Remove the row.
    Delete,
    /// Set the listed cells (column id to raw value, `None` clears).
    Set(Vec<(String, Option<String>)>),
}

impl RowMutation {
    /// `Set` with no cells carries no change.
    pub fn set(cells: Vec<(String, Option<String>)>) -> Self {
        if cells.is_empty() {
            RowMutation::Unchanged
        } else {
            RowMutation::Set(cells)
        }
    }
}

/// One inbound row before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDraft {
    /// Position of the row in the inbound request, used in error coordinates.
    pub row_index: usize,
    pub row_id: Option<i64>,
    pub version_number: Option<i64>,
    pub etag: Option<String>,
    pub mutation: RowMutation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseRow {
    row_index: usize,
    row_id: Option<i64>,
    version_number: Option<i64>,
    etag: Option<String>,
    cells: BTreeMap<String, Option<String>>,
}

impl SparseRow {
    /// Position of this row in the inbound request.
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    pub fn row_id(&self) -> Option<i64> {
        self.row_id
    }

    pub fn version_number(&self) -> Option<i64> {
        self.version_number
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// True when the column was set, even if set to no value.
    pub fn has_cell_value(&self, column_id: &str) -> bool {
        self.cells.contains_key(column_id)
    }

    /// Canonical value of a set cell.
    pub fn cell_value(&self, column_id: &str) -> Result<Option<&str>> {
        self.cells
            .get(column_id)
            .map(|v| v.as_deref())
            .ok_or_else(|| ChangeSetError::CellNotSet {
                row_index: self.row_index,
                column_id: column_id.to_string(),
            })
    }

    pub fn is_delete(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &BTreeMap<String, Option<String>> {
        &self.cells
    }

    fn to_dto(&self) -> SparseRowDto {
        SparseRowDto {
            row_id: self.row_id,
            version_number: self.version_number,
            etag: self.etag.clone(),
            values: (!self.is_delete()).then(|| self.cells.clone()),
        }
    }
}

/// Rows that set exactly the same columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseRowGroup<'a> {
    /// Column ids in schema order. Empty for the delete group.
    pub column_ids: Vec<&'a str>,
    pub rows: Vec<&'a SparseRow>,
}

/// Rows touching one list column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListColumnChanges<'a> {
    pub column: &'a ColumnModel,
    pub row_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseChangeSet {
    table_id: String,
    etag: Option<String>,
    schema: Vec<ColumnModel>,
    column_index: HashMap<String, usize>,
    rows: Vec<SparseRow>,
}

impl SparseChangeSet {
    /// Empty change set against the table's current schema.
    pub fn new(table_id: impl Into<String>, schema: Vec<ColumnModel>) -> Self {
        let column_index = schema
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self {
            table_id: table_id.into(),
            etag: None,
            schema,
            column_index,
            rows: Vec::new(),
        }
    }

    pub fn with_etag(mut self, etag: Option<String>) -> Self {
        self.etag = etag;
        self
    }

    /// Validate `draft` and append it. `Unchanged` drafts are dropped.
    pub fn with_row(mut self, draft: RowDraft, limits: &TableLimits) -> Result<Self> {
        let row_index = draft.row_index;
        let cells = match draft.mutation {
            RowMutation::Unchanged => return Ok(self),
            RowMutation::Delete => BTreeMap::new(),
            RowMutation::Set(cells) => {
                let mut validated = BTreeMap::new();
                for (column_id, value) in cells {
                    let column_index = self.column_index(&column_id)?;
                    let column = &self.schema[column_index];
                    let value = validate_row_value(
                        value.as_deref(),
                        column,
                        row_index,
                        column_index,
                        limits,
                    )?;
                    validated.insert(column_id, value);
                }
                validated
            }
        };

        self.rows.push(SparseRow {
            row_index,
            row_id: draft.row_id,
            version_number: draft.version_number,
            etag: draft.etag,
            cells,
        });
        Ok(self)
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn schema(&self) -> &[ColumnModel] {
        &self.schema
    }

    /// Deletes count as rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &SparseRow> + '_ {
        self.rows.iter()
    }

    /// The `position`-th row kept in the change set.
    pub fn row(&self, position: usize) -> Option<&SparseRow> {
        self.rows.get(position)
    }

    /// Schema position of a column id.
    pub fn column_index(&self, column_id: &str) -> Result<usize> {
        self.column_index
            .get(column_id)
            .copied()
            .ok_or_else(|| ChangeSetError::ColumnNotFound(column_id.to_string()))
    }

    pub fn column_model(&self, column_id: &str) -> Result<&ColumnModel> {
        let index = self.column_index(column_id)?;
        Ok(&self.schema[index])
    }

    /// Group rows by the exact set of columns they set, in order of first appearance.
    pub fn group_by_valid_values(&self) -> Vec<SparseRowGroup<'_>> {
        let mut groups: Vec<SparseRowGroup<'_>> = Vec::new();
        for row in &self.rows {
            let mut column_ids: Vec<&str> = row.cells.keys().map(String::as_str).collect();
            column_ids.sort_by_key(|id| self.column_index.get(*id).copied());
            match groups.iter_mut().find(|g| g.column_ids == column_ids) {
                Some(group) => group.rows.push(row),
                None => groups.push(SparseRowGroup {
                    column_ids,
                    rows: vec![row],
                }),
            }
        }
        groups
    }

    /// For each list column with changes, the ids of the rows that set it.
    pub fn group_list_column_changes(&self) -> Vec<ListColumnChanges<'_>> {
        self.schema
            .iter()
            .filter(|c| c.column_type.is_list())
            .filter_map(|column| {
                let row_ids: BTreeSet<i64> = self
                    .rows
                    .iter()
                    .filter(|r| r.has_cell_value(&column.id))
                    .filter_map(|r| r.row_id)
                    .collect();
                (!row_ids.is_empty()).then_some(ListColumnChanges { column, row_ids })
            })
            .collect()
    }

    /// Every file handle id referenced by a FILEHANDLEID cell.
    pub fn file_handle_ids(&self) -> Result<BTreeSet<i64>> {
        let mut ids = BTreeSet::new();
        for column in self
            .schema
            .iter()
            .filter(|c| c.column_type == ColumnType::FileHandleId)
        {
            for row in &self.rows {
                if let Some(Some(value)) = row.cells.get(&column.id) {
                    let id = value
                        .parse::<i64>()
                        .map_err(|_| ChangeSetError::InvalidFileHandleId(value.clone()))?;
                    ids.insert(id);
                }
            }
        }
        Ok(ids)
    }

    pub fn to_dto(&self) -> SparseChangeSetDto {
        SparseChangeSetDto {
            table_id: self.table_id.clone(),
            etag: self.etag.clone(),
            column_ids: self.schema.iter().map(|c| c.id.clone()).collect(),
            rows: self.rows.iter().map(SparseRow::to_dto).collect(),
        }
    }

    /// Rebuild and revalidate a change set against `schema`.
    ///
    /// Rows with no values, either `None` or an empty map, are deletes.
    pub fn from_dto(
        dto: &SparseChangeSetDto,
        schema: Vec<ColumnModel>,
        limits: &TableLimits,
    ) -> Result<Self> {
        let mut change_set = SparseChangeSet::new(dto.table_id.clone(), schema)
            .with_etag(dto.etag.clone());
        for (row_index, row) in dto.rows.iter().enumerate() {
            let mutation = match &row.values {
                None => RowMutation::Delete,
                Some(values) if values.is_empty() => RowMutation::Delete,
                Some(values) => RowMutation::Set(
                    values
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
            };
            change_set = change_set.with_row(
                RowDraft {
                    row_index,
                    row_id: row.row_id,
                    version_number: row.version_number,
                    etag: row.etag.clone(),
                    mutation,
                },
                limits,
            )?;
        }
        Ok(change_set)
    }
}
