//! Reading inputs and printing results.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::error::HelpfulError;

/// Read and deserialize a JSON file, naming `expected` on failure.
pub fn read_json<T: DeserializeOwned>(path: &Path, expected: &str) -> Result<T> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path).into());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|err| HelpfulError::invalid_json(path, expected, &err.to_string()).into())
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
