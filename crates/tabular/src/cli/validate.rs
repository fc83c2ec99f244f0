//! `tabular validate`: rows in, validated change set out.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabular_changeset::{prepare_partial_row_change, prepare_row_set_change, SparseChangeSet};
use tabular_protocol::{ColumnModel, PartialRowSet, RowSet, TableLimits, TableRowChange};
use tabular_schema::normalize_column_model;
use tracing::info;

use super::output::{print_json, read_json, write_json};

#[derive(Debug)]
pub struct ValidateArgs {
    pub schema: PathBuf,
    pub rows: PathBuf,
    pub partial: bool,
    pub last_change: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateSummary {
    table_id: String,
    row_count: usize,
    delete_count: usize,
    file_handle_ids: Vec<i64>,
    out: PathBuf,
}

/// Read a schema file and complete every column definition.
pub fn load_schema(path: &Path, limits: &TableLimits) -> Result<Vec<ColumnModel>> {
    let columns: Vec<ColumnModel> = read_json(path, "a JSON array of column models")?;
    columns
        .iter()
        .map(|column| {
            normalize_column_model(column, limits)
                .with_context(|| format!("Invalid column '{}' ({})", column.name, column.id))
        })
        .collect()
}

pub fn run(args: ValidateArgs, limits: &TableLimits) -> Result<()> {
    let schema = load_schema(&args.schema, limits)?;

    let change_set = if args.partial {
        let partial: PartialRowSet = read_json(&args.rows, "a partial row set")?;
        let last_change: Option<TableRowChange> = args
            .last_change
            .as_ref()
            .map(|path| read_json(path, "a table row change"))
            .transpose()?;
        prepare_partial_row_change(&partial, last_change.as_ref(), &schema, limits)?
    } else {
        let row_set: RowSet = read_json(&args.rows, "a row set")?;
        prepare_row_set_change(&row_set, &schema, limits)?
    };

    info!(
        table_id = change_set.table_id(),
        rows = change_set.row_count(),
        "change set validated"
    );

    match args.out {
        Some(out) => {
            write_json(&out, &change_set.to_dto())?;
            print_json(&summarize(&change_set, out)?)
        }
        None => print_json(&change_set.to_dto()),
    }
}

fn summarize(change_set: &SparseChangeSet, out: PathBuf) -> Result<ValidateSummary> {
    Ok(ValidateSummary {
        table_id: change_set.table_id().to_string(),
        row_count: change_set.row_count(),
        delete_count: change_set.rows().filter(|r| r.is_delete()).count(),
        file_handle_ids: change_set.file_handle_ids()?.into_iter().collect(),
        out,
    })
}
