//! CSV parsing of text blocks into rows of string fields.

use crate::error::Result;
use csv::ReaderBuilder;

/// Dialect used to split text into fields.
///
/// No row is ever treated as a header here and there is no index column:
/// header skipping is done by the tail reader before text reaches the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    /// Field delimiter (default: b',').
    pub delimiter: u8,
    /// Quote character (default: b'"').
    pub quote: u8,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Parses a block of text into rows. Rows may differ in width.
///
/// A blank line yields a row holding one empty field, so every complete line
/// outside a quoted field produces exactly one row.
///
/// Fails as a whole if any record is malformed; callers drop the block.
pub fn parse_rows(text: &str, format: &CsvFormat) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut segment_start = 0;
    for blank in blank_lines(text.as_bytes(), format) {
        read_records(&text[segment_start..blank.start], format, &mut rows)?;
        rows.push(vec![String::new()]);
        segment_start = blank.end;
    }
    read_records(&text[segment_start..], format, &mut rows)?;
    Ok(rows)
}

fn read_records(text: &str, format: &CsvFormat, rows: &mut Vec<Vec<String>>) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(format.delimiter)
        .quote(format.quote)
        .from_reader(text.as_bytes());

    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Start,
    Unquoted,
    Quoted,
    /// A quote seen inside a quoted field: either the closing quote or the
    /// first half of an escaped `""`.
    QuoteInQuoted,
}

/// Byte ranges (including the terminator) of the empty lines in `bytes` that
/// lie outside quoted fields. A lone `\r` before the `\n` still counts as
/// empty.
fn blank_lines(bytes: &[u8], format: &CsvFormat) -> Vec<std::ops::Range<usize>> {
    let mut blanks = Vec::new();
    let mut state = Field::Start;
    let mut line_start = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        state = match state {
            Field::Quoted if byte == format.quote => Field::QuoteInQuoted,
            Field::Quoted => Field::Quoted,
            Field::QuoteInQuoted if byte == format.quote => Field::Quoted,
            Field::Start if byte == format.quote => Field::Quoted,
            _ if byte == b'\n' => {
                let line = &bytes[line_start..i];
                if line.is_empty() || line == b"\r" {
                    blanks.push(line_start..i + 1);
                }
                line_start = i + 1;
                Field::Start
            }
            _ if byte == format.delimiter => Field::Start,
            Field::Start if byte == b'\r' => Field::Start,
            _ => Field::Unquoted,
        };
    }
    blanks
}
