use crate::common::FeatureMetric;
use crate::domain::{ChannelSeries, FrequencyAxis, Peak, PeakSet, Sample};
use crate::numerics::{deterministic_argsort, moving_average_same, trapezoid};

const SMOOTHING_MAX_WINDOW: usize = 5;
const PEAK_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelFeatures {
    pub area: f64,
    pub peaks: PeakSet,
}

impl ChannelFeatures {
    /// `samples` must already be in ascending frequency order.
    pub fn from_sorted_samples(samples: &[Sample]) -> Self {
        Self {
            area: channel_area(samples),
            peaks: detect_peaks(samples),
        }
    }

    /// Value of one schema metric; missing peak slots are `NaN`.
    pub fn metric(&self, metric: FeatureMetric) -> f64 {
        let peak = |rank: u8| self.peaks.rank(usize::from(rank));
        match metric {
            FeatureMetric::Area => self.area,
            FeatureMetric::Frequency(rank) => peak(rank).map_or(f64::NAN, |peak| peak.frequency),
            FeatureMetric::Magnitude(rank) => peak(rank).map_or(f64::NAN, |peak| peak.value),
        }
    }
}

/// Sorts the channel by frequency and checks that it reports exactly the
/// shared axis. Returns `None` when any axis point is missing or repeated.
pub fn align_to_axis(series: &ChannelSeries, axis: &FrequencyAxis) -> Option<Vec<Sample>> {
    if series.len() != axis.len() {
        return None;
    }

    let mut samples = series.samples().to_vec();
    samples.sort_by(|lhs, rhs| lhs.frequency.total_cmp(&rhs.frequency));
    samples
        .iter()
        .zip(axis.values())
        .all(|(sample, frequency)| sample.frequency == *frequency)
        .then_some(samples)
}

pub fn channel_area(samples: &[Sample]) -> f64 {
    let (frequencies, values): (Vec<f64>, Vec<f64>) = samples
        .iter()
        .map(|sample| (sample.frequency, sample.value))
        .unzip();
    trapezoid(&frequencies, &values).unwrap_or_default()
}

fn smoothing_window(len: usize) -> usize {
    SMOOTHING_MAX_WINDOW.min(len / 10 + 1)
}

/// Top three peaks of a frequency-sorted series.
///
/// Local maxima are found on a lightly smoothed copy. A series without any
/// falls back to its three largest raw values; fewer than three maxima are
/// topped up with the largest remaining raw values.
pub fn detect_peaks(samples: &[Sample]) -> PeakSet {
    let values: Vec<f64> = samples.iter().map(|sample| sample.value).collect();
    let len = values.len();
    let window = smoothing_window(len);
    let smoothed = if window > 1 && len > window {
        moving_average_same(&values, window)
    } else {
        values.clone()
    };

    let mut is_candidate = vec![false; len];
    for index in 1..len.saturating_sub(1) {
        if smoothed[index] > smoothed[index - 1] && smoothed[index] > smoothed[index + 1] {
            is_candidate[index] = true;
        }
    }

    let ascending = deterministic_argsort(&values);
    if !is_candidate.contains(&true) {
        for &index in ascending.iter().rev().take(PEAK_COUNT) {
            is_candidate[index] = true;
        }
    }

    let mut candidates: Vec<usize> = (0..len).filter(|index| is_candidate[*index]).collect();
    for &index in ascending.iter().rev() {
        if candidates.len() >= PEAK_COUNT {
            break;
        }
        if !is_candidate[index] {
            candidates.push(index);
        }
    }

    candidates.sort_by(|lhs, rhs| values[*rhs].total_cmp(&values[*lhs]));
    candidates.truncate(PEAK_COUNT);
    PeakSet::from_peaks(
        candidates
            .into_iter()
            .map(|index| Peak {
                frequency: samples[index].frequency,
                value: samples[index].value,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{ChannelFeatures, align_to_axis, channel_area, detect_peaks};
    use crate::common::FeatureMetric;
    use crate::domain::{
        ChannelKey, ChannelSeries, Dof, FrequencyAxis, NodeId, ResponseKind, Sample,
    };

    fn samples(points: &[(f64, f64)]) -> Vec<Sample> {
        points
            .iter()
            .map(|&(frequency, value)| Sample { frequency, value })
            .collect()
    }

    fn frequencies(set: &crate::domain::PeakSet) -> Vec<Option<f64>> {
        set.slots()
            .iter()
            .map(|slot| slot.map(|peak| peak.frequency))
            .collect()
    }

    #[test]
    fn triangle_area_is_exact() {
        let area = channel_area(&samples(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]));
        assert!((area - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn single_bump_reports_its_maximum_and_next_highest_points() {
        let peaks = detect_peaks(&samples(&[
            (1.0, 1.0),
            (2.0, 2.0),
            (3.0, 5.0),
            (4.0, 2.0),
            (5.0, 1.0),
        ]));

        assert_eq!(peaks.populated(), 3);
        assert_eq!(frequencies(&peaks), [Some(2.0), Some(3.0), Some(4.0)]);
        let highest = peaks
            .slots()
            .iter()
            .flatten()
            .max_by(|lhs, rhs| lhs.value.total_cmp(&rhs.value))
            .expect("peak");
        assert_eq!(highest.frequency, 3.0);
    }

    #[test]
    fn flat_series_falls_back_to_three_points() {
        let points: Vec<(f64, f64)> = (0..12).map(|index| (index as f64, 4.0)).collect();
        let peaks = detect_peaks(&samples(&points));
        assert_eq!(peaks.populated(), 3);
        assert_eq!(frequencies(&peaks), [Some(9.0), Some(10.0), Some(11.0)]);
    }

    #[test]
    fn monotonic_series_uses_global_maxima() {
        let peaks = detect_peaks(&samples(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]));
        assert_eq!(frequencies(&peaks), [Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn short_series_leave_missing_slots() {
        let peaks = detect_peaks(&samples(&[(1.0, 1.0), (2.0, 3.0)]));
        assert_eq!(frequencies(&peaks), [Some(1.0), Some(2.0), None]);

        let features = ChannelFeatures::from_sorted_samples(&samples(&[(5.0, 2.0)]));
        assert_eq!(features.area, 0.0);
        assert_eq!(features.metric(FeatureMetric::Frequency(1)), 5.0);
        assert!(features.metric(FeatureMetric::Magnitude(2)).is_nan());
        assert!(features.metric(FeatureMetric::Frequency(3)).is_nan());
    }

    #[test]
    fn smoothed_plateaus_fall_back_to_raw_maxima() {
        // Window 3 spreads each spike into a flat top, so no strict maximum survives.
        let mut points: Vec<(f64, f64)> = (0..20).map(|index| (index as f64, 1.0)).collect();
        points[10].1 = 10.0;
        points[3].1 = 1.5;
        let peaks = detect_peaks(&samples(&points));

        assert_eq!(frequencies(&peaks), [Some(3.0), Some(10.0), Some(19.0)]);
    }

    #[test]
    fn smoothed_maxima_report_raw_values() {
        let values = [
            0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(index, value)| (index as f64, *value))
            .collect();
        let peaks = detect_peaks(&samples(&points));

        assert_eq!(peaks.rank(1).map(|peak| peak.frequency), Some(5.0));
        assert_eq!(peaks.rank(2).map(|peak| peak.frequency), Some(6.0));
        assert_eq!(peaks.rank(3).map(|peak| (peak.frequency, peak.value)), Some((12.0, 2.0)));
    }

    #[test]
    fn alignment_requires_exact_axis_coverage() {
        let key = ChannelKey::new(ResponseKind::Acceleration, NodeId::Numeric(1), Dof::T1);
        let axis = FrequencyAxis::from_candidates(vec![1.0, 2.0, 3.0]);

        let shuffled =
            ChannelSeries::with_samples(key.clone(), samples(&[(3.0, 0.3), (1.0, 0.1), (2.0, 0.2)]));
        let aligned = align_to_axis(&shuffled, &axis).expect("full coverage should align");
        assert_eq!(aligned[0].value, 0.1);
        assert_eq!(aligned[2].value, 0.3);

        let partial = ChannelSeries::with_samples(key.clone(), samples(&[(1.0, 0.1), (3.0, 0.3)]));
        assert_eq!(align_to_axis(&partial, &axis), None);

        let repeated =
            ChannelSeries::with_samples(key, samples(&[(1.0, 0.1), (1.0, 0.1), (3.0, 0.3)]));
        assert_eq!(align_to_axis(&repeated, &axis), None);
    }
}
