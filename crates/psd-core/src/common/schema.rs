//! Fixed measurement schema shared by every feature table.
//!
//! The two name lists below are the published output contract. Row lookups in
//! both directions go through [`FeatureRow::index`] and [`FeatureRow::at`], so
//! the table layout is never derived from the order channels appear in a file.

use crate::domain::{Dof, ResponseKind};
use std::fmt::{Display, Formatter};

pub const METRICS_PER_DOF: usize = 7;
pub const ROWS_PER_KIND: usize = METRICS_PER_DOF * Dof::SCHEMA.len();

pub const ACCELERATION_MEASUREMENTS: [&str; ROWS_PER_KIND] = [
    "ACCE_T1_Area",
    "ACCE_T1_Frequency_1",
    "ACCE_T1_PSD_1",
    "ACCE_T1_Frequency_2",
    "ACCE_T1_PSD_2",
    "ACCE_T1_Frequency_3",
    "ACCE_T1_PSD_3",
    "ACCE_T2_Area",
    "ACCE_T2_Frequency_1",
    "ACCE_T2_PSD_1",
    "ACCE_T2_Frequency_2",
    "ACCE_T2_PSD_2",
    "ACCE_T2_Frequency_3",
    "ACCE_T2_PSD_3",
    "ACCE_T3_Area",
    "ACCE_T3_Frequency_1",
    "ACCE_T3_PSD_1",
    "ACCE_T3_Frequency_2",
    "ACCE_T3_PSD_2",
    "ACCE_T3_Frequency_3",
    "ACCE_T3_PSD_3",
    "ACCE_R1_Area",
    "ACCE_R1_Frequency_1",
    "ACCE_R1_PSD_1",
    "ACCE_R1_Frequency_2",
    "ACCE_R1_PSD_2",
    "ACCE_R1_Frequency_3",
    "ACCE_R1_PSD_3",
    "ACCE_R2_Area",
    "ACCE_R2_Frequency_1",
    "ACCE_R2_PSD_1",
    "ACCE_R2_Frequency_2",
    "ACCE_R2_PSD_2",
    "ACCE_R2_Frequency_3",
    "ACCE_R2_PSD_3",
    "ACCE_R3_Area",
    "ACCE_R3_Frequency_1",
    "ACCE_R3_PSD_1",
    "ACCE_R3_Frequency_2",
    "ACCE_R3_PSD_2",
    "ACCE_R3_Frequency_3",
    "ACCE_R3_PSD_3",
];

pub const DISPLACEMENT_MEASUREMENTS: [&str; ROWS_PER_KIND] = [
    "DISP_T1_Area",
    "DISP_T1_Frequency_1",
    "DISP_T1_DISP_1",
    "DISP_T1_Frequency_2",
    "DISP_T1_DISP_2",
    "DISP_T1_Frequency_3",
    "DISP_T1_DISP_3",
    "DISP_T2_Area",
    "DISP_T2_Frequency_1",
    "DISP_T2_DISP_1",
    "DISP_T2_Frequency_2",
    "DISP_T2_DISP_2",
    "DISP_T2_Frequency_3",
    "DISP_T2_DISP_3",
    "DISP_T3_Area",
    "DISP_T3_Frequency_1",
    "DISP_T3_DISP_1",
    "DISP_T3_Frequency_2",
    "DISP_T3_DISP_2",
    "DISP_T3_Frequency_3",
    "DISP_T3_DISP_3",
    "DISP_R1_Area",
    "DISP_R1_Frequency_1",
    "DISP_R1_DISP_1",
    "DISP_R1_Frequency_2",
    "DISP_R1_DISP_2",
    "DISP_R1_Frequency_3",
    "DISP_R1_DISP_3",
    "DISP_R2_Area",
    "DISP_R2_Frequency_1",
    "DISP_R2_DISP_1",
    "DISP_R2_Frequency_2",
    "DISP_R2_DISP_2",
    "DISP_R2_Frequency_3",
    "DISP_R2_DISP_3",
    "DISP_R3_Area",
    "DISP_R3_Frequency_1",
    "DISP_R3_DISP_1",
    "DISP_R3_Frequency_2",
    "DISP_R3_DISP_2",
    "DISP_R3_Frequency_3",
    "DISP_R3_DISP_3",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureMetric {
    Area,
    /// Frequency of the peak with the given 1-based rank.
    Frequency(u8),
    /// Magnitude of the peak with the given 1-based rank.
    Magnitude(u8),
}

impl FeatureMetric {
    pub const ORDER: [FeatureMetric; METRICS_PER_DOF] = [
        Self::Area,
        Self::Frequency(1),
        Self::Magnitude(1),
        Self::Frequency(2),
        Self::Magnitude(2),
        Self::Frequency(3),
        Self::Magnitude(3),
    ];

    pub const fn position(self) -> Option<usize> {
        match self {
            Self::Area => Some(0),
            Self::Frequency(rank @ 1..=3) => Some(rank as usize * 2 - 1),
            Self::Magnitude(rank @ 1..=3) => Some(rank as usize * 2),
            _ => None,
        }
    }

    fn label(self, kind: ResponseKind) -> String {
        match self {
            Self::Area => "Area".to_string(),
            Self::Frequency(rank) => format!("Frequency_{rank}"),
            Self::Magnitude(rank) => format!("{}_{rank}", kind.magnitude_label()),
        }
    }

    fn parse(label: &str, kind: ResponseKind) -> Option<Self> {
        if label == "Area" {
            return Some(Self::Area);
        }
        let (prefix, rank) = label.rsplit_once('_')?;
        let rank = rank.parse::<u8>().ok().filter(|rank| (1..=3).contains(rank))?;
        if prefix == "Frequency" {
            Some(Self::Frequency(rank))
        } else if prefix == kind.magnitude_label() {
            Some(Self::Magnitude(rank))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureRow {
    pub kind: ResponseKind,
    pub dof: Dof,
    pub metric: FeatureMetric,
}

impl FeatureRow {
    pub const fn new(kind: ResponseKind, dof: Dof, metric: FeatureMetric) -> Self {
        Self { kind, dof, metric }
    }

    pub const fn index(&self) -> Option<usize> {
        match (self.dof.schema_index(), self.metric.position()) {
            (Some(dof), Some(metric)) => Some(dof * METRICS_PER_DOF + metric),
            _ => None,
        }
    }

    pub fn at(kind: ResponseKind, index: usize) -> Option<Self> {
        let dof = *Dof::SCHEMA.get(index / METRICS_PER_DOF)?;
        let metric = FeatureMetric::ORDER[index % METRICS_PER_DOF];
        Some(Self::new(kind, dof, metric))
    }

    pub fn name(&self) -> String {
        format!("{}_{}_{}", self.kind.label(), self.dof, self.metric.label(self.kind))
    }

    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.splitn(3, '_');
        let kind = match parts.next()? {
            "ACCE" => ResponseKind::Acceleration,
            "DISP" => ResponseKind::Displacement,
            _ => return None,
        };
        let dof = Dof::from_label(parts.next()?)?;
        let metric = FeatureMetric::parse(parts.next()?, kind)?;
        Some(Self::new(kind, dof, metric))
    }
}

impl Display for FeatureRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

pub fn measurement_names(kind: ResponseKind) -> &'static [&'static str; ROWS_PER_KIND] {
    match kind {
        ResponseKind::Acceleration => &ACCELERATION_MEASUREMENTS,
        ResponseKind::Displacement => &DISPLACEMENT_MEASUREMENTS,
    }
}

/// Guesses the response kind of a table from its first measurement name.
pub fn infer_kind(measurements: &[String]) -> Option<ResponseKind> {
    measurements
        .first()
        .and_then(|name| FeatureRow::parse(name))
        .map(|row| row.kind)
}

#[cfg(test)]
mod tests {
    use super::{
        FeatureMetric, FeatureRow, ROWS_PER_KIND, infer_kind, measurement_names,
    };
    use crate::domain::{Dof, ResponseKind};

    #[test]
    fn published_names_match_row_indices_in_both_directions() {
        for kind in ResponseKind::ALL {
            let names = measurement_names(kind);
            assert_eq!(names.len(), ROWS_PER_KIND);
            for (index, name) in names.iter().enumerate() {
                let row = FeatureRow::at(kind, index).expect("index inside schema");
                assert_eq!(row.name(), *name);
                assert_eq!(FeatureRow::parse(name), Some(row));
                assert_eq!(row.index(), Some(index));
            }
        }
        assert_eq!(FeatureRow::at(ResponseKind::Acceleration, ROWS_PER_KIND), None);
    }

    #[test]
    fn magnitude_suffix_depends_on_response_kind() {
        let acce = FeatureRow::new(ResponseKind::Acceleration, Dof::T1, FeatureMetric::Magnitude(2));
        let disp = FeatureRow::new(ResponseKind::Displacement, Dof::T1, FeatureMetric::Magnitude(2));
        assert_eq!(acce.name(), "ACCE_T1_PSD_2");
        assert_eq!(disp.name(), "DISP_T1_DISP_2");
        assert_eq!(FeatureRow::parse("DISP_T1_PSD_2"), None);
    }

    #[test]
    fn rows_outside_the_schema_have_no_index() {
        let unknown = FeatureRow::new(ResponseKind::Acceleration, Dof::Unknown(9), FeatureMetric::Area);
        assert_eq!(unknown.index(), None);
        let bad_rank = FeatureRow::new(ResponseKind::Acceleration, Dof::T1, FeatureMetric::Frequency(4));
        assert_eq!(bad_rank.index(), None);
        assert_eq!(FeatureRow::parse("ACCE_T1_Frequency_4"), None);
        assert_eq!(FeatureRow::parse("Measurement"), None);
    }

    #[test]
    fn kind_is_inferred_from_leading_measurement() {
        let rows = vec!["DISP_T1_Area".to_string()];
        assert_eq!(infer_kind(&rows), Some(ResponseKind::Displacement));
        assert_eq!(infer_kind(&["custom".to_string()]), None);
        assert_eq!(infer_kind(&[]), None);
    }
}
