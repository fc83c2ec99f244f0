//! `tabular infer`: suggested schema for a CSV file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use tabular_csv::{guess_content_type, guess_extension, preview_csv, CsvPreview};
use tabular_protocol::{CsvTableDescriptor, CsvUploadOptions, TableLimits};
use tracing::info;

use super::error::HelpfulError;
use super::output::print_json;

#[derive(Debug)]
pub struct InferArgs {
    pub file: PathBuf,
    pub separator: Option<String>,
    pub quote: Option<String>,
    pub escape: Option<String>,
    pub no_header: bool,
    pub skip_lines: Option<u64>,
    pub full_scan: bool,
}

impl InferArgs {
    fn upload_options(&self) -> CsvUploadOptions {
        CsvUploadOptions {
            descriptor: CsvTableDescriptor {
                separator: self.separator.clone(),
                quote_character: self.quote.clone(),
                escape_character: self.escape.clone(),
                is_first_line_header: Some(!self.no_header),
                line_end: None,
            },
            lines_to_skip: self.skip_lines,
            do_full_file_scan: Some(self.full_scan),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferOutput {
    file: PathBuf,
    extension: &'static str,
    content_type: &'static str,
    #[serde(flatten)]
    preview: CsvPreview,
}

pub fn run(args: InferArgs, limits: &TableLimits) -> Result<()> {
    if !args.file.is_file() {
        return Err(HelpfulError::file_not_found(&args.file).into());
    }

    let options = args.upload_options();
    let source = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let preview = preview_csv(source, &options, limits)
        .with_context(|| format!("Failed to scan {}", args.file.display()))?;

    info!(
        file = %args.file.display(),
        columns = preview.suggested_columns.len(),
        rows_scanned = preview.rows_scanned,
        "inferred CSV schema"
    );

    let separator = options.descriptor.separator.as_deref();
    print_json(&InferOutput {
        extension: guess_extension(separator),
        content_type: guess_content_type(separator),
        file: args.file,
        preview,
    })
}
