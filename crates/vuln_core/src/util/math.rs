/// Quantile by linear interpolation between order statistics, the
/// same definition numpy uses by default. `q` is a fraction in [0, 1].
///
/// Returns `None` for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let h = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn interpolates_between_order_statistics() {
        let values = [1.0, 2.0, 3.0, 4.0];

        // numpy: np.quantile([1,2,3,4], 0.9) == 3.7
        assert_abs_diff_eq!(quantile(&values, 0.9).unwrap(), 3.7);
        assert_abs_diff_eq!(quantile(&values, 0.5).unwrap(), 2.5);
        assert_eq!(quantile(&values, 0.0).unwrap(), 1.0);
        assert_eq!(quantile(&values, 1.0).unwrap(), 4.0);
    }

    #[test]
    fn unsorted_input_is_handled() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_abs_diff_eq!(quantile(&values, 0.9).unwrap(), 3.7);
    }

    #[test]
    fn single_value() {
        assert_eq!(quantile(&[5.0], 0.9).unwrap(), 5.0);
    }

    #[test]
    fn empty_is_none() {
        assert_eq!(quantile(&[], 0.9), None);
    }
}
