use super::{PsdError, PsdResult, ResponseKind};

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    /// One value per measurement row; `NaN` marks a missing cell.
    pub values: Vec<f64>,
}

/// Measurement rows by node columns. Row order is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    kind: Option<ResponseKind>,
    measurements: Vec<String>,
    columns: Vec<TableColumn>,
}

impl FeatureTable {
    pub fn new(kind: Option<ResponseKind>, measurements: Vec<String>) -> Self {
        Self {
            kind,
            measurements,
            columns: Vec::new(),
        }
    }

    pub fn kind(&self) -> Option<ResponseKind> {
        self.kind
    }

    pub fn measurements(&self) -> &[String] {
        &self.measurements
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn row_index(&self, measurement: &str) -> Option<usize> {
        self.measurements
            .iter()
            .position(|candidate| candidate == measurement)
    }

    /// `Some(NaN)` is a present-but-missing cell; `None` means no such row or column.
    pub fn cell(&self, measurement: &str, column: &str) -> Option<f64> {
        let row = self.row_index(measurement)?;
        self.column(column)?.values.get(row).copied()
    }

    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> PsdResult<()> {
        let name = name.into();
        if values.len() != self.measurements.len() {
            return Err(PsdError::internal(
                "SYS.TABLE_SHAPE",
                format!(
                    "column '{}' has {} values but the table has {} rows",
                    name,
                    values.len(),
                    self.measurements.len()
                ),
            ));
        }
        if self.column(&name).is_some() {
            return Err(PsdError::input_validation(
                "INPUT.TABLE_DUPLICATE_COLUMN",
                format!("column '{name}' appears more than once"),
            ));
        }

        self.columns.push(TableColumn { name, values });
        Ok(())
    }
}
