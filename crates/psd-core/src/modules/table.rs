use super::features::{ChannelFeatures, align_to_axis};
use crate::common::{AxisPolicy, FeatureMetric, FeatureRow, ROWS_PER_KIND, measurement_names};
use crate::domain::{
    ChannelKey, Dof, FeatureTable, NodeId, PsdError, PsdResult, PsdWarning, ResponseKind,
};
use crate::parser::ParsedResponses;
use tracing::debug;

/// Cell value for an absent channel. Rotational acceleration is mechanically
/// zero in the solver output; every other gap is unmeasured data.
pub fn missing_channel_fill(kind: ResponseKind, dof: Dof) -> f64 {
    if kind == ResponseKind::Acceleration && dof.is_rotational() {
        0.0
    } else {
        f64::NAN
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTable {
    pub table: FeatureTable,
    pub warnings: Vec<PsdWarning>,
}

/// Builds the fixed-schema table of one response kind from a parsed input.
#[derive(Debug, Clone, Copy)]
pub struct TableAssembler<'a> {
    parsed: &'a ParsedResponses,
    axis_policy: AxisPolicy,
}

impl<'a> TableAssembler<'a> {
    pub fn new(parsed: &'a ParsedResponses, axis_policy: AxisPolicy) -> Self {
        Self {
            parsed,
            axis_policy,
        }
    }

    pub fn assemble(&self, kind: ResponseKind) -> PsdResult<AssembledTable> {
        let measurements = measurement_names(kind)
            .iter()
            .map(|name| (*name).to_string())
            .collect();
        let mut table = FeatureTable::new(Some(kind), measurements);
        let mut warnings = Vec::new();

        for key in self.parsed.channels.keys() {
            if key.kind == kind && matches!(key.dof, Dof::Unknown(_)) {
                debug!(channel = %key, "ignoring channel with unknown DOF code");
            }
        }

        for node in &self.parsed.nodes {
            let column = self.node_column(kind, node, &mut warnings)?;
            table.push_column(node.column_name(), column)?;
        }

        Ok(AssembledTable { table, warnings })
    }

    fn node_column(
        &self,
        kind: ResponseKind,
        node: &NodeId,
        warnings: &mut Vec<PsdWarning>,
    ) -> PsdResult<Vec<f64>> {
        let mut column = vec![f64::NAN; ROWS_PER_KIND];
        for dof in Dof::SCHEMA {
            let key = ChannelKey::new(kind, node.clone(), dof);
            let features = self.channel_features(&key, warnings)?;
            for metric in FeatureMetric::ORDER {
                let Some(row) = FeatureRow::new(kind, dof, metric).index() else {
                    continue;
                };
                column[row] = match &features {
                    Some(features) => features.metric(metric),
                    None => missing_channel_fill(kind, dof),
                };
            }
        }
        Ok(column)
    }

    fn channel_features(
        &self,
        key: &ChannelKey,
        warnings: &mut Vec<PsdWarning>,
    ) -> PsdResult<Option<ChannelFeatures>> {
        let Some(series) = self.parsed.channel(key) else {
            if missing_channel_fill(key.kind, key.dof).is_nan() {
                warnings.push(PsdWarning::MissingChannel { key: key.clone() });
            } else {
                debug!(channel = %key, "rotational acceleration absent; filling zeros");
            }
            return Ok(None);
        };
        if series.is_empty() {
            return Ok(None);
        }

        match align_to_axis(series, &self.parsed.axis) {
            Some(samples) => Ok(Some(ChannelFeatures::from_sorted_samples(&samples))),
            None => match self.axis_policy {
                AxisPolicy::Strict => Err(PsdError::computation(
                    "RUN.AXIS_COVERAGE",
                    format!(
                        "channel {} reports {} samples that do not cover the {}-point frequency axis",
                        key,
                        series.len(),
                        self.parsed.axis.len()
                    ),
                )),
                AxisPolicy::SkipChannel => {
                    warnings.push(PsdWarning::AxisMismatch {
                        key: key.clone(),
                        samples: series.len(),
                        axis_len: self.parsed.axis.len(),
                    });
                    Ok(None)
                }
            },
        }
    }
}
