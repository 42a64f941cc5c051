use crate::domain::{FeatureTable, PsdResult, PsdWarning};
use serde::Serialize;

pub const DEFAULT_ZERO_TOLERANCE: f64 = 1.0e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct DeltaOutcome {
    pub table: FeatureTable,
    pub warnings: Vec<PsdWarning>,
}

fn delta_cell(current: f64, baseline: f64, deadband: f64) -> f64 {
    if current.is_nan() && baseline.is_nan() {
        return f64::NAN;
    }

    let zero_if_missing = |value: f64| if value.is_nan() { 0.0 } else { value };
    let delta = zero_if_missing(baseline) - zero_if_missing(current);
    if delta.abs() < deadband { 0.0 } else { delta }
}

/// `baseline - current` per cell over the rows both tables share.
///
/// Columns missing from the baseline keep their current values; columns only
/// in the baseline are dropped.
pub fn compute_delta(
    current: &FeatureTable,
    baseline: &FeatureTable,
    deadband: f64,
) -> PsdResult<DeltaOutcome> {
    let mut warnings = Vec::new();
    let shared_rows: Vec<(usize, usize)> = current
        .measurements()
        .iter()
        .enumerate()
        .filter_map(|(current_row, name)| {
            baseline
                .row_index(name)
                .map(|baseline_row| (current_row, baseline_row))
        })
        .collect();

    let rows_match = current.measurements() == baseline.measurements();
    if !rows_match {
        warnings.push(PsdWarning::SchemaMismatch {
            kind: current.kind().or(baseline.kind()),
            current_rows: current.measurements().len(),
            baseline_rows: baseline.measurements().len(),
            shared_rows: shared_rows.len(),
        });
    }

    let measurements = shared_rows
        .iter()
        .map(|(current_row, _)| current.measurements()[*current_row].clone())
        .collect();
    let mut table = FeatureTable::new(current.kind().or(baseline.kind()), measurements);

    for column in current.columns() {
        let values = match baseline.column(&column.name) {
            Some(reference) => shared_rows
                .iter()
                .map(|&(current_row, baseline_row)| {
                    delta_cell(
                        column.values[current_row],
                        reference.values[baseline_row],
                        deadband,
                    )
                })
                .collect(),
            None => {
                warnings.push(PsdWarning::MissingBaselineColumn {
                    column: column.name.clone(),
                });
                shared_rows
                    .iter()
                    .map(|&(current_row, _)| column.values[current_row])
                    .collect()
            }
        };
        table.push_column(column.name.clone(), values)?;
    }

    Ok(DeltaOutcome { table, warnings })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnZeroCheck {
    pub column: String,
    /// Largest absolute value among present cells; `0` for an all-missing column.
    pub max_abs: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroCheckReport {
    pub tolerance: f64,
    pub columns: Vec<ColumnZeroCheck>,
}

impl ZeroCheckReport {
    pub fn passed(&self) -> bool {
        self.columns.iter().all(|column| column.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ColumnZeroCheck> {
        self.columns.iter().filter(|column| !column.passed)
    }
}

/// Checks that a delta table is zero within `tolerance`, ignoring missing cells.
pub fn verify_zero(table: &FeatureTable, tolerance: f64) -> ZeroCheckReport {
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let max_abs = column
                .values
                .iter()
                .filter(|value| !value.is_nan())
                .fold(0.0_f64, |max, value| max.max(value.abs()));
            ColumnZeroCheck {
                column: column.name.clone(),
                max_abs,
                passed: max_abs <= tolerance,
            }
        })
        .collect();

    ZeroCheckReport { tolerance, columns }
}
