//! CSV dialect resolution and reader/writer construction.

use std::io::{self, BufRead, BufReader, Read, Write};

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tabular_protocol::{CsvTableDescriptor, CsvUploadOptions};

use crate::error::{CsvError, Result};

pub const DEFAULT_SEPARATOR: u8 = b',';
pub const DEFAULT_QUOTE: u8 = b'"';
pub const DEFAULT_ESCAPE: u8 = b'\\';
pub const DEFAULT_LINE_END: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    CrLf,
    Byte(u8),
}

impl LineEnd {
    fn parse(value: &str) -> Result<Self> {
        if value == "\r\n" {
            return Ok(LineEnd::CrLf);
        }
        match value.as_bytes() {
            [b] if b.is_ascii() => Ok(LineEnd::Byte(*b)),
            _ => Err(CsvError::InvalidLineEnd(value.to_string())),
        }
    }

    fn terminator(self) -> Terminator {
        match self {
            LineEnd::CrLf => Terminator::CRLF,
            LineEnd::Byte(b) => Terminator::Any(b),
        }
    }
}

/// A fully resolved CSV dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    pub separator: u8,
    pub quote: u8,
    pub escape: u8,
    pub first_line_header: bool,
    pub lines_to_skip: u64,
    pub line_end: LineEnd,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            quote: DEFAULT_QUOTE,
            escape: DEFAULT_ESCAPE,
            first_line_header: true,
            lines_to_skip: 0,
            line_end: LineEnd::Byte(b'\n'),
        }
    }
}

impl CsvDialect {
    /// Resolve a client descriptor, applying defaults to unset fields.
    pub fn from_descriptor(descriptor: &CsvTableDescriptor, lines_to_skip: Option<u64>) -> Result<Self> {
        Ok(Self {
            separator: single_byte(descriptor.separator.as_deref(), DEFAULT_SEPARATOR, "separator")?,
            quote: single_byte(
                descriptor.quote_character.as_deref(),
                DEFAULT_QUOTE,
                "quoteCharacter",
            )?,
            escape: single_byte(
                descriptor.escape_character.as_deref(),
                DEFAULT_ESCAPE,
                "escapeCharacter",
            )?,
            first_line_header: is_first_line_header(Some(descriptor)),
            lines_to_skip: lines_to_skip.unwrap_or(0),
            line_end: LineEnd::parse(descriptor.line_end.as_deref().unwrap_or(DEFAULT_LINE_END))?,
        })
    }

    pub fn from_options(options: &CsvUploadOptions) -> Result<Self> {
        Self::from_descriptor(&options.descriptor, options.lines_to_skip)
    }

    /// Reader for raw records. Headers are handled by the caller, and rows
    /// may have differing lengths.
    pub fn reader<R: Read>(&self, source: R) -> csv::Reader<R> {
        ReaderBuilder::new()
            .delimiter(self.separator)
            .quote(self.quote)
            .escape(Some(self.escape))
            .has_headers(false)
            .flexible(true)
            .from_reader(source)
    }

    /// Records after the skipped leading lines.
    ///
    /// `lines_to_skip` counts physical lines, so a skipped preamble may hold
    /// unbalanced quotes. Record positions are relative to the first line kept.
    pub fn records<R: Read>(&self, source: R) -> impl Iterator<Item = Result<StringRecord>> {
        self.reader(SkipLines::new(source, self.lines_to_skip))
            .into_records()
            .map(|record| record.map_err(CsvError::from))
    }

    pub fn writer<W: Write>(&self, sink: W) -> csv::Writer<W> {
        WriterBuilder::new()
            .delimiter(self.separator)
            .quote(self.quote)
            .escape(self.escape)
            .terminator(self.line_end.terminator())
            .from_writer(sink)
    }
}

/// Discards the first `remaining` newline-terminated lines of `inner`.
struct SkipLines<R> {
    inner: BufReader<R>,
    remaining: u64,
}

impl<R: Read> SkipLines<R> {
    fn new(inner: R, lines: u64) -> Self {
        Self {
            inner: BufReader::new(inner),
            remaining: lines,
        }
    }

    /// Consume through the next `\n`. Returns false at end of input.
    fn skip_line(&mut self) -> io::Result<bool> {
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok(false);
            }
            match buf.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.inner.consume(end + 1);
                    return Ok(true);
                }
                None => {
                    let len = buf.len();
                    self.inner.consume(len);
                }
            }
        }
    }
}

impl<R: Read> Read for SkipLines<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.remaining > 0 {
            if !self.skip_line()? {
                self.remaining = 0;
                break;
            }
            self.remaining -= 1;
        }
        self.inner.read(buf)
    }
}

fn single_byte(value: Option<&str>, default: u8, field: &'static str) -> Result<u8> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(CsvError::InvalidDialectCharacter { field }),
    }
}

pub fn is_first_line_header(descriptor: Option<&CsvTableDescriptor>) -> bool {
    descriptor
        .and_then(|d| d.is_first_line_header)
        .unwrap_or(true)
}

pub fn do_full_file_scan(options: Option<&CsvUploadOptions>) -> bool {
    options.and_then(|o| o.do_full_file_scan).unwrap_or(false)
}

pub fn guess_extension(separator: Option<&str>) -> &'static str {
    if separator == Some("\t") {
        "tsv"
    } else {
        "csv"
    }
}

pub fn guess_content_type(separator: Option<&str>) -> &'static str {
    if separator == Some("\t") {
        "text/tsv"
    } else {
        "text/csv"
    }
}
