pub mod literal;

pub use literal::{MalformedNumberError, format_solver_literal, parse_solver_literal};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

/// Ascending by value, ties broken by index. NaN sorts last.
pub fn deterministic_argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_unstable_by(|lhs, rhs| {
        values[*lhs]
            .total_cmp(&values[*rhs])
            .then_with(|| lhs.cmp(rhs))
    });
    indices
}

/// Trapezoidal integral of `y` over `x`. Returns `None` on mismatched lengths;
/// fewer than two points integrate to zero.
pub fn trapezoid(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }

    let mut sum = 0.0;
    let mut correction = 0.0;
    for (xs, ys) in x.windows(2).zip(y.windows(2)) {
        kahan_add(&mut sum, &mut correction, 0.5 * (xs[1] - xs[0]) * (ys[0] + ys[1]));
    }

    Some(sum)
}

/// Moving average with a box of width `window`, centred like a same-length
/// convolution. Edge windows are clipped but still divided by `window`.
pub fn moving_average_same(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }

    let before = window / 2;
    let after = (window - 1) / 2;
    let width = window as f64;
    (0..values.len())
        .map(|index| {
            let start = index.saturating_sub(before);
            let end = (index + after).min(values.len() - 1);
            stable_sum(&values[start..=end]) / width
        })
        .collect()
}

pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|window| window[0] < window[1])
}

#[cfg(test)]
mod tests {
    use super::{
        deterministic_argsort, is_strictly_increasing, moving_average_same, stable_sum, trapezoid,
    };

    #[test]
    fn stable_sum_reduces_order_loss_for_large_and_small_values() {
        let input = [1.0e16, 1.0, -1.0e16];
        assert_eq!(stable_sum(&input), 0.0);
    }

    #[test]
    fn deterministic_argsort_orders_by_value_then_index() {
        let values = [2.0, 1.0, f64::NAN, 1.0, -0.0, 0.0];
        let order = deterministic_argsort(&values);
        assert_eq!(order, vec![4, 5, 1, 3, 0, 2]);
    }

    #[test]
    fn trapezoid_is_exact_on_a_triangle() {
        let area = trapezoid(&[0.0, 1.0, 2.0], &[0.0, 2.0, 0.0]).expect("area");
        assert!((area - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn trapezoid_handles_uneven_spacing_and_short_series() {
        let area = trapezoid(&[1.0, 2.0, 4.0], &[1.0, 1.0, 3.0]).expect("area");
        assert!((area - 5.0).abs() < 1.0e-12);
        assert_eq!(trapezoid(&[1.0], &[3.0]), Some(0.0));
        assert_eq!(trapezoid(&[1.0, 2.0], &[3.0]), None);
    }

    #[test]
    fn moving_average_zero_pads_edges() {
        let smoothed = moving_average_same(&[5.0, 5.0, 5.0, 5.0, 5.0, 5.0], 5);
        let expected = [3.0, 4.0, 5.0, 5.0, 4.0, 3.0];
        for (actual, expected) in smoothed.iter().zip(expected) {
            assert!((actual - expected).abs() < 1.0e-12);
        }
    }

    #[test]
    fn moving_average_even_window_leans_left() {
        let smoothed = moving_average_same(&[0.0, 4.0, 0.0, 0.0, 0.0], 4);
        let expected = [1.0, 1.0, 1.0, 1.0, 0.0];
        for (actual, expected) in smoothed.iter().zip(expected) {
            assert!((actual - expected).abs() < 1.0e-12);
        }
        assert_eq!(moving_average_same(&[1.0, 2.0], 1), vec![1.0, 2.0]);
    }

    #[test]
    fn strictly_increasing_rejects_duplicates() {
        assert!(is_strictly_increasing(&[1.0, 2.0, 3.0]));
        assert!(!is_strictly_increasing(&[1.0, 2.0, 2.0]));
        assert!(is_strictly_increasing(&[]));
    }
}
