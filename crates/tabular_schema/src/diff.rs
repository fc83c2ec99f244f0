//! Column add/remove bookkeeping between two schema orderings.

use std::collections::HashSet;

use tabular_protocol::ColumnChange;

/// Changes needed to go from `old` column ids to `new` column ids.
///
/// `None` means "no schema". Removals come first in old order, followed by
/// additions in new order. Columns present in both are not reported.
pub fn create_changes_from_old_schema_to_new(
    old: Option<&[String]>,
    new: Option<&[String]>,
) -> Vec<ColumnChange> {
    match (old, new) {
        (None, None) => Vec::new(),
        (None, Some(new)) => new.iter().map(ColumnChange::add).collect(),
        (Some(old), None) => old.iter().map(ColumnChange::remove).collect(),
        (Some(old), Some(new)) => {
            let old_set: HashSet<&str> = old.iter().map(String::as_str).collect();
            let new_set: HashSet<&str> = new.iter().map(String::as_str).collect();

            let removed = old
                .iter()
                .filter(|id| !new_set.contains(id.as_str()))
                .map(ColumnChange::remove);
            let added = new
                .iter()
                .filter(|id| !old_set.contains(id.as_str()))
                .map(ColumnChange::add);
            removed.chain(added).collect()
        }
    }
}

/// A change that swaps one column for another requires rebuilding the table.
pub fn is_temporary_table_needed(changes: &[ColumnChange]) -> bool {
    changes.iter().any(|change| {
        matches!(
            (&change.old_column_id, &change.new_column_id),
            (Some(old), Some(new)) if old != new
        )
    })
}
