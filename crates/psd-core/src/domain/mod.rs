pub mod errors;
pub mod table;

pub use errors::{PsdError, PsdErrorCategory, PsdResult, PsdWarning};
pub use table::{FeatureTable, TableColumn};

use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResponseKind {
    Acceleration,
    Displacement,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 2] = [Self::Acceleration, Self::Displacement];

    pub const fn marker(self) -> &'static str {
        match self {
            Self::Acceleration => "$ACCE",
            Self::Displacement => "$DISP",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Acceleration => "ACCE",
            Self::Displacement => "DISP",
        }
    }

    /// Suffix used for the peak-magnitude rows of this response kind.
    pub const fn magnitude_label(self) -> &'static str {
        match self {
            Self::Acceleration => "PSD",
            Self::Displacement => "DISP",
        }
    }

    pub fn from_marker(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.marker() == token)
    }
}

impl Display for ResponseKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).label())
    }
}

/// Degree of freedom at a node. Solver codes 3..=8 map to T1..R3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dof {
    T1,
    T2,
    T3,
    R1,
    R2,
    R3,
    Unknown(i64),
}

impl Dof {
    pub const SCHEMA: [Dof; 6] = [Self::T1, Self::T2, Self::T3, Self::R1, Self::R2, Self::R3];

    pub const fn from_code(code: i64) -> Self {
        match code {
            3 => Self::T1,
            4 => Self::T2,
            5 => Self::T3,
            6 => Self::R1,
            7 => Self::R2,
            8 => Self::R3,
            other => Self::Unknown(other),
        }
    }

    pub const fn is_rotational(self) -> bool {
        matches!(self, Self::R1 | Self::R2 | Self::R3)
    }

    pub const fn schema_index(self) -> Option<usize> {
        match self {
            Self::T1 => Some(0),
            Self::T2 => Some(1),
            Self::T3 => Some(2),
            Self::R1 => Some(3),
            Self::R2 => Some(4),
            Self::R3 => Some(5),
            Self::Unknown(_) => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::SCHEMA
            .into_iter()
            .find(|dof| dof.to_string() == label)
    }
}

impl Display for Dof {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::T1 => f.write_str("T1"),
            Self::T2 => f.write_str("T2"),
            Self::T3 => f.write_str("T3"),
            Self::R1 => f.write_str("R1"),
            Self::R2 => f.write_str("R2"),
            Self::R3 => f.write_str("R3"),
            Self::Unknown(code) => write!(f, "UNKNOWN-{code}"),
        }
    }
}

/// Structural node identifier. Numeric ids order before textual labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    Numeric(u64),
    Label(String),
}

impl NodeId {
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        match trimmed.parse::<u64>() {
            Ok(id) => Self::Numeric(id),
            Err(_) => Self::Label(trimmed.to_string()),
        }
    }

    pub fn column_name(&self) -> String {
        format!("Node_{self}")
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey {
    pub kind: ResponseKind,
    pub node: NodeId,
    pub dof: Dof,
}

impl ChannelKey {
    pub fn new(kind: ResponseKind, node: NodeId, dof: Dof) -> Self {
        Self { kind, node, dof }
    }
}

impl Display for ChannelKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.kind, self.node, self.dof)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub frequency: f64,
    pub value: f64,
}

/// One channel's samples in file-encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    key: ChannelKey,
    samples: Vec<Sample>,
}

impl ChannelSeries {
    pub fn new(key: ChannelKey) -> Self {
        Self {
            key,
            samples: Vec::new(),
        }
    }

    pub fn with_samples(key: ChannelKey, samples: Vec<Sample>) -> Self {
        Self { key, samples }
    }

    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub(crate) fn push(&mut self, frequency: f64, value: f64) {
        self.samples.push(Sample { frequency, value });
    }
}

/// Ascending, duplicate-free frequency grid shared by every channel of one input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrequencyAxis {
    values: Vec<f64>,
}

impl FrequencyAxis {
    pub fn from_candidates(mut candidates: Vec<f64>) -> Self {
        candidates.sort_by(f64::total_cmp);
        candidates.dedup_by(|next, previous| *next == *previous);
        debug_assert!(crate::numerics::is_strictly_increasing(&candidates));
        Self { values: candidates }
    }

    pub fn from_channels<'a>(channels: impl IntoIterator<Item = &'a ChannelSeries>) -> Self {
        let candidates = channels
            .into_iter()
            .flat_map(|channel| channel.samples().iter().map(|sample| sample.frequency))
            .collect();
        Self::from_candidates(candidates)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub frequency: f64,
    pub value: f64,
}

/// Exactly three peak slots in ascending frequency; `None` marks a missing slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakSet {
    slots: [Option<Peak>; 3],
}

impl PeakSet {
    pub fn from_peaks(mut peaks: Vec<Peak>) -> Self {
        peaks.truncate(3);
        peaks.sort_by(|lhs, rhs| lhs.frequency.total_cmp(&rhs.frequency));
        let mut slots = [None; 3];
        for (slot, peak) in slots.iter_mut().zip(peaks) {
            *slot = Some(peak);
        }
        Self { slots }
    }

    /// Rank is 1-based, matching the `Frequency_n` row names.
    pub fn rank(&self, rank: usize) -> Option<Peak> {
        rank.checked_sub(1)
            .and_then(|index| self.slots.get(index))
            .copied()
            .flatten()
    }

    pub fn slots(&self) -> &[Option<Peak>; 3] {
        &self.slots
    }

    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub relative_path: PathBuf,
}

impl OutputArtifact {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ChannelKey, ChannelSeries, Dof, FrequencyAxis, NodeId, Peak, PeakSet, ResponseKind,
    };

    #[test]
    fn dof_codes_map_to_named_axes() {
        let mapped: Vec<String> = (3..=8).map(|code| Dof::from_code(code).to_string()).collect();
        assert_eq!(mapped, ["T1", "T2", "T3", "R1", "R2", "R3"]);
        assert_eq!(Dof::from_code(9), Dof::Unknown(9));
        assert_eq!(Dof::from_code(1).to_string(), "UNKNOWN-1");
        assert!(Dof::R2.is_rotational());
        assert!(!Dof::T3.is_rotational());
        assert_eq!(Dof::from_label("R3"), Some(Dof::R3));
    }

    #[test]
    fn response_markers_round_trip() {
        for kind in ResponseKind::ALL {
            assert_eq!(ResponseKind::from_marker(kind.marker()), Some(kind));
        }
        assert_eq!(ResponseKind::from_marker("$VELO"), None);
    }

    #[test]
    fn node_ids_sort_numerically_before_labels() {
        let mut nodes = vec![
            NodeId::parse("1000"),
            NodeId::parse("abc"),
            NodeId::parse("222"),
            NodeId::parse("30"),
        ];
        nodes.sort();
        let rendered: Vec<String> = nodes.iter().map(NodeId::column_name).collect();
        assert_eq!(rendered, ["Node_30", "Node_222", "Node_1000", "Node_abc"]);
    }

    #[test]
    fn channel_key_renders_compact_label() {
        let key = ChannelKey::new(ResponseKind::Acceleration, NodeId::Numeric(222), Dof::T1);
        assert_eq!(key.to_string(), "ACCE-222-T1");
    }

    #[test]
    fn frequency_axis_merges_channels_exactly() {
        let first = ChannelSeries::with_samples(
            ChannelKey::new(ResponseKind::Acceleration, NodeId::Numeric(1), Dof::T1),
            [1.0, 2.0, 2.0, 3.0]
                .into_iter()
                .map(|frequency| super::Sample {
                    frequency,
                    value: 0.0,
                })
                .collect(),
        );
        let second = ChannelSeries::with_samples(
            ChannelKey::new(ResponseKind::Displacement, NodeId::Numeric(1), Dof::T1),
            [2.0, 3.0, 4.0]
                .into_iter()
                .map(|frequency| super::Sample {
                    frequency,
                    value: 0.0,
                })
                .collect(),
        );

        let axis = FrequencyAxis::from_channels([&first, &second]);
        assert_eq!(axis.values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn frequency_axis_does_not_merge_nearby_values() {
        let axis = FrequencyAxis::from_candidates(vec![1.0, 1.0 + 1.0e-12, 1.0]);
        assert_eq!(axis.len(), 2);
        assert!(FrequencyAxis::from_candidates(Vec::new()).is_empty());
    }

    #[test]
    fn peak_set_orders_by_frequency_and_marks_missing_slots() {
        let peaks = PeakSet::from_peaks(vec![
            Peak {
                frequency: 30.0,
                value: 4.0,
            },
            Peak {
                frequency: 10.0,
                value: 1.0,
            },
        ]);

        assert_eq!(peaks.populated(), 2);
        assert_eq!(peaks.rank(1).map(|peak| peak.frequency), Some(10.0));
        assert_eq!(peaks.rank(2).map(|peak| peak.frequency), Some(30.0));
        assert_eq!(peaks.rank(3), None);
        assert_eq!(peaks.rank(0), None);
    }
}
