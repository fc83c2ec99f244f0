//! `tabular diff`: column changes between two schemas.

use anyhow::Result;
use serde::Serialize;
use tabular_protocol::ColumnChange;
use tabular_schema::{create_changes_from_old_schema_to_new, is_temporary_table_needed};

use super::output::print_json;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiffOutput {
    changes: Vec<ColumnChange>,
    temporary_table_needed: bool,
}

pub fn run(old: Option<Vec<String>>, new: Option<Vec<String>>) -> Result<()> {
    let changes = create_changes_from_old_schema_to_new(old.as_deref(), new.as_deref());
    print_json(&DiffOutput {
        temporary_table_needed: is_temporary_table_needed(&changes),
        changes,
    })
}
