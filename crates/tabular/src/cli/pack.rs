//! `tabular pack` / `tabular unpack`: the persisted change-set frame.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tabular_protocol::{decode_change_set, encode_change_set_with, Codec, SparseChangeSetDto};
use tracing::info;

use super::error::HelpfulError;
use super::output::{print_json, read_json};

pub fn run_pack(input: &Path, output: &Path, raw: bool) -> Result<()> {
    let dto: SparseChangeSetDto = read_json(input, "a sparse change set")?;
    let codec = if raw { Codec::Json } else { Codec::ZstdJson };
    let frame = encode_change_set_with(&dto, codec).context("Failed to encode change set")?;
    fs::write(output, &frame).with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        table_id = %dto.table_id,
        rows = dto.rows.len(),
        bytes = frame.len(),
        ?codec,
        "change set packed"
    );
    Ok(())
}

pub fn run_unpack(input: &Path) -> Result<()> {
    if !input.is_file() {
        return Err(HelpfulError::file_not_found(input).into());
    }
    let frame = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let dto = decode_change_set(&frame)
        .with_context(|| format!("Corrupt change set frame: {}", input.display()))?;
    print_json(&dto)
}
