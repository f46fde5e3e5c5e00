//! CSV Storage Module
//!
//! Reads the input relations named by a problem spec and writes witness
//! relations back out. Cells are typed by the declared global schema, not
//! inferred from content; a cell that fails to parse as its column's type
//! is a boundary error, caught before the engine runs.
//!
//! ## Format
//!
//! - First row is the header with column names.
//! - Fields may be quoted; a doubled quote inside a quoted field escapes it.
//! - Every data row must have exactly as many fields as the header.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::relation::Table;
use crate::schema::Schema;

/// CSV reading/writing errors.
#[derive(Debug, Error)]
pub enum CsvError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file without a header row
    #[error("{file}: missing header row")]
    MissingHeader { file: String },

    /// A data row with the wrong number of fields
    #[error("{file}: row {line} has {found} fields, expected {expected}")]
    Ragged {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Options for CSV parsing
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: char,
    /// Quote character for strings (default: '"')
    pub quote_char: char,
    /// Whether to trim whitespace from fields (default: true)
    pub trim_whitespace: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: ',',
            quote_char: '"',
            trim_whitespace: true,
        }
    }
}

/// Read a CSV file into its header and raw text records.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<(Vec<String>, Vec<Vec<String>>), CsvError> {
    read_csv_with_options(path, &CsvOptions::default())
}

/// Read a CSV file with custom options.
pub fn read_csv_with_options<P: AsRef<Path>>(
    path: P,
    options: &CsvOptions,
) -> Result<(Vec<String>, Vec<Vec<String>>), CsvError> {
    let path = path.as_ref();
    let file_name = path.display().to_string();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => parse_csv_line(&line?, options),
        None => return Err(CsvError::MissingHeader { file: file_name }),
    };

    let mut records = Vec::new();
    let mut line_no = 2;
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            line_no += 1;
            continue;
        }
        let fields = parse_csv_line(&line, options);
        if fields.len() != header.len() {
            return Err(CsvError::Ragged {
                file: file_name,
                line: line_no,
                expected: header.len(),
                found: fields.len(),
            });
        }
        records.push(fields);
        line_no += 1;
    }
    Ok((header, records))
}

/// Write a witness relation as CSV, columns named by the schema in bit
/// order, rows in table iteration order.
pub fn save_table<P: AsRef<Path>>(
    path: P,
    schema: &Schema,
    table: &Table,
) -> Result<(), CsvError> {
    save_table_with_options(path, schema, table, &CsvOptions::default())
}

/// Write a witness relation with custom options.
pub fn save_table_with_options<P: AsRef<Path>>(
    path: P,
    schema: &Schema,
    table: &Table,
    options: &CsvOptions,
) -> Result<(), CsvError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let bits: Vec<usize> = table.attrs().bits().collect();
    let header = bits
        .iter()
        .map(|&b| escape_csv_field(schema.attr_name(b), options))
        .collect::<Vec<_>>()
        .join(&options.delimiter.to_string());
    writeln!(writer, "{header}")?;

    for row in table.iter() {
        let line = bits
            .iter()
            .map(|&b| match row.get(b) {
                Some(value) => escape_csv_field(&value.to_string(), options),
                None => String::new(),
            })
            .collect::<Vec<_>>()
            .join(&options.delimiter.to_string());
        writeln!(writer, "{line}")?;
    }

    writer.flush()?;
    Ok(())
}

/// Parse a CSV line into fields.
fn parse_csv_line(line: &str, options: &CsvOptions) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == options.quote_char {
            if in_quotes && chars.peek() == Some(&options.quote_char) {
                // Escaped quote
                current.push(c);
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == options.delimiter && !in_quotes {
            fields.push(finish_field(&mut current, options));
        } else {
            current.push(c);
        }
    }
    fields.push(finish_field(&mut current, options));
    fields
}

fn finish_field(current: &mut String, options: &CsvOptions) -> String {
    let field = if options.trim_whitespace {
        current.trim().to_string()
    } else {
        current.clone()
    };
    current.clear();
    field
}

/// Escape a CSV field if it contains special characters.
fn escape_csv_field(s: &str, options: &CsvOptions) -> String {
    let needs_quoting = s.contains(options.delimiter)
        || s.contains(options.quote_char)
        || s.contains('\n')
        || s.contains('\r');

    if needs_quoting {
        let quote = options.quote_char.to_string();
        let escaped = s.replace(options.quote_char, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    } else {
        s.to_string()
    }
}
