use crate::common::schema::infer_kind;
use crate::domain::{FeatureTable, PsdError, PsdResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const MEASUREMENT_HEADER: &str = "Measurement";

/// `%g`-style rendering with `digits` significant digits. Missing values
/// render as an empty string.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = usize::try_from(digits as i32 - 1 - exponent).unwrap_or_default();
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

#[derive(Debug, thiserror::Error)]
pub enum TableFormatError {
    #[error("failed to read table '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("table has no header row")]
    MissingHeader,
    #[error("row {row} has {found} cells but the header has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}, column '{column}': '{cell}' is not a number")]
    InvalidCell {
        row: usize,
        column: String,
        cell: String,
    },
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),
}

impl From<TableFormatError> for PsdError {
    fn from(error: TableFormatError) -> Self {
        match &error {
            TableFormatError::Read { .. } => PsdError::io_system("IO.TABLE_READ", error.to_string()),
            _ => PsdError::input_validation("INPUT.TABLE_FORMAT", error.to_string()),
        }
    }
}

pub fn render_table_csv(table: &FeatureTable, digits: usize) -> Result<String, TableFormatError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header = vec![MEASUREMENT_HEADER.to_string()];
    header.extend(table.column_names().map(str::to_string));
    writer.write_record(&header)?;

    for (row, measurement) in table.measurements().iter().enumerate() {
        let mut record = vec![measurement.clone()];
        record.extend(
            table
                .columns()
                .iter()
                .map(|column| format_significant(column.values[row], digits)),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| TableFormatError::Csv(csv::Error::from(error.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads a table written by [`render_table_csv`]. The first column holds the
/// measurement names; empty cells are missing values.
pub fn parse_table_csv(source: &str) -> Result<FeatureTable, TableFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source.as_bytes());
    let mut records = reader.records();

    let header = records.next().ok_or(TableFormatError::MissingHeader)??;
    let column_names: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
    for (index, name) in column_names.iter().enumerate() {
        if column_names[..index].contains(name) {
            return Err(TableFormatError::DuplicateColumn(name.clone()));
        }
    }

    let mut measurements = Vec::new();
    let mut columns = vec![Vec::new(); column_names.len()];
    for (offset, record) in records.enumerate() {
        let record = record?;
        let row = offset + 2;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != header.len() {
            return Err(TableFormatError::RowWidth {
                row,
                expected: header.len(),
                found: record.len(),
            });
        }

        measurements.push(record.get(0).unwrap_or_default().to_string());
        for ((cell, values), name) in record.iter().skip(1).zip(&mut columns).zip(&column_names) {
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>()
                    .map_err(|_| TableFormatError::InvalidCell {
                        row,
                        column: name.clone(),
                        cell: cell.to_string(),
                    })?
            };
            values.push(value);
        }
    }

    let mut table = FeatureTable::new(infer_kind(&measurements), measurements);
    for (name, values) in column_names.into_iter().zip(columns) {
        table
            .push_column(name.clone(), values)
            .map_err(|_| TableFormatError::DuplicateColumn(name))?;
    }
    Ok(table)
}

pub fn load_table_csv(path: &Path) -> Result<FeatureTable, TableFormatError> {
    let source = fs::read_to_string(path).map_err(|source| TableFormatError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table_csv(&source)
}

pub fn write_table_csv(path: &Path, table: &FeatureTable, digits: usize) -> PsdResult<()> {
    let rendered = render_table_csv(table, digits).map_err(|error| {
        PsdError::internal(
            "SYS.TABLE_RENDER",
            format!("failed to render table for '{}': {error}", path.display()),
        )
    })?;
    write_text_artifact(path, &rendered).map_err(|source| {
        PsdError::io_system(
            "IO.OUTPUT_WRITE",
            format!("failed to write '{}': {source}", path.display()),
        )
    })
}
