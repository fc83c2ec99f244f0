//! Column type inference by widening.
//!
//! Each column keeps a running guess that only ever widens as values are
//! seen. The lattice, narrow to wide:
//!
//! ```text
//! BOOLEAN -> INTEGER -> DOUBLE --+
//!                      DATE -----+--> STRING -> LARGETEXT
//!                      ENTITYID -+
//! ```
//!
//! DATE and ENTITYID are leaves: they are only chosen for a column's first
//! value and never widen to or from the numeric chain. STRING becomes
//! LARGETEXT once the longest value exceeds the global string ceiling.

use serde::{Deserialize, Serialize};
use tabular_protocol::defaults::DEFAULT_STRING_SIZE;
use tabular_protocol::{ColumnModel, ColumnType, TableLimits};
use tabular_schema::validate_scalar;

use crate::error::{CsvError, Result};

/// Types tried, in order, for the first non-blank value of a column.
const INITIAL_CANDIDATES: [ColumnType; 5] = [
    ColumnType::Boolean,
    ColumnType::Integer,
    ColumnType::Double,
    ColumnType::Date,
    ColumnType::EntityId,
];

/// The running guess for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnGuess {
    pub column_type: ColumnType,
    /// Longest value seen so far, in characters. Never shrinks.
    pub maximum_size: u64,
}

impl ColumnGuess {
    /// Types this guess may still widen through before falling back to text.
    fn candidates(&self) -> &'static [ColumnType] {
        match self.column_type {
            ColumnType::Boolean => &[ColumnType::Boolean, ColumnType::Integer, ColumnType::Double],
            ColumnType::Integer => &[ColumnType::Integer, ColumnType::Double],
            ColumnType::Double => &[ColumnType::Double],
            ColumnType::Date => &[ColumnType::Date],
            ColumnType::EntityId => &[ColumnType::EntityId],
            _ => &[],
        }
    }
}

/// Widen `current` so that it also admits `value`.
///
/// Null and blank values leave the guess unchanged.
pub fn check_type(
    value: Option<&str>,
    current: Option<ColumnGuess>,
    limits: &TableLimits,
) -> Result<Option<ColumnGuess>> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(current),
    };

    let len = value.chars().count() as u64;
    if len > limits.max_large_text_characters {
        return Err(CsvError::CellTooLarge {
            max: limits.max_large_text_characters,
        });
    }
    let maximum_size = current.map_or(len, |g| g.maximum_size.max(len));

    let candidates: &[ColumnType] = match &current {
        None => &INITIAL_CANDIDATES,
        Some(guess) => guess.candidates(),
    };
    let column_type = candidates
        .iter()
        .copied()
        .find(|t| accepts(*t, value, limits))
        .unwrap_or_else(|| text_type(maximum_size, limits));

    Ok(Some(ColumnGuess {
        column_type,
        maximum_size,
    }))
}

fn accepts(column_type: ColumnType, value: &str, limits: &TableLimits) -> bool {
    // Bare numbers are valid entity ids but are never guessed as one.
    if column_type == ColumnType::EntityId && !has_entity_prefix(value) {
        return false;
    }
    let unconstrained = ColumnModel::new("", "", column_type);
    validate_scalar(value, column_type, &unconstrained, limits).is_ok()
}

fn has_entity_prefix(value: &str) -> bool {
    value
        .trim()
        .get(..3)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("syn"))
}

fn text_type(maximum_size: u64, limits: &TableLimits) -> ColumnType {
    if maximum_size > limits.max_allowed_string_size {
        ColumnType::LargeText
    } else {
        ColumnType::String
    }
}

/// A column suggested for a CSV file, not yet assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub maximum_size: Option<u64>,
}

impl InferredColumn {
    /// Columns that only ever held blanks are suggested as STRING.
    pub fn from_guess(name: impl Into<String>, guess: Option<ColumnGuess>) -> Self {
        let (column_type, maximum_size) = match guess {
            None => (ColumnType::String, Some(DEFAULT_STRING_SIZE)),
            Some(guess) if guess.column_type == ColumnType::String => {
                (ColumnType::String, Some(guess.maximum_size))
            }
            Some(guess) => (guess.column_type, None),
        };
        Self {
            name: name.into(),
            column_type,
            maximum_size,
        }
    }

    pub fn into_column_model(self, id: impl Into<String>) -> ColumnModel {
        ColumnModel {
            maximum_size: self.maximum_size,
            ..ColumnModel::new(id, self.name, self.column_type)
        }
    }
}

/// Per-column inference over whole rows.
#[derive(Debug, Clone)]
pub struct RowTypeInference<'a> {
    limits: &'a TableLimits,
    guesses: Vec<Option<ColumnGuess>>,
    rows_seen: u64,
}

impl<'a> RowTypeInference<'a> {
    pub fn new(limits: &'a TableLimits) -> Self {
        Self {
            limits,
            guesses: Vec::new(),
            rows_seen: 0,
        }
    }

    /// Feed one row. Rows longer than any seen so far add columns.
    pub fn add_row<'v, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'v str>,
    {
        for (index, value) in values.into_iter().enumerate() {
            if index >= self.guesses.len() {
                self.guesses.resize(index + 1, None);
            }
            self.guesses[index] = check_type(Some(value), self.guesses[index], self.limits)?;
        }
        self.rows_seen += 1;
        Ok(())
    }

    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub fn guesses(&self) -> &[Option<ColumnGuess>] {
        &self.guesses
    }

    /// Suggested columns, named by `name_for(index)`.
    pub fn columns<F>(&self, column_count: usize, name_for: F) -> Vec<InferredColumn>
    where
        F: Fn(usize) -> String,
    {
        (0..column_count.max(self.guesses.len()))
            .map(|i| InferredColumn::from_guess(name_for(i), self.guesses.get(i).copied().flatten()))
            .collect()
    }
}
