fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

/// Root-mean-square deviation between two equally long series.
pub fn rmse(reference: &[f64], predicted: &[f64]) -> Option<f64> {
    if reference.len() != predicted.len() || reference.is_empty() {
        return None;
    }

    let squared = stable_sum(
        reference
            .iter()
            .zip(predicted)
            .map(|(lhs, rhs)| (lhs - rhs) * (lhs - rhs)),
    );
    Some((squared / reference.len() as f64).sqrt())
}

pub fn mae(reference: &[f64], predicted: &[f64]) -> Option<f64> {
    if reference.len() != predicted.len() || reference.is_empty() {
        return None;
    }

    let absolute = stable_sum(
        reference
            .iter()
            .zip(predicted)
            .map(|(lhs, rhs)| (lhs - rhs).abs()),
    );
    Some(absolute / reference.len() as f64)
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

/// Sorted, de-duplicated copy of `values` (exact comparison).
pub fn unique_sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_unstable_by(|lhs, rhs| lhs.total_cmp(rhs));
    values.dedup_by(|lhs, rhs| lhs.total_cmp(rhs).is_eq());
    values
}

/// Renders a float the way the trainer's reference frontend wrote header
/// values: shortest round-trip digits, a trailing `.0` on integral values and
/// two-digit exponents outside `[1e-4, 1e16)`.
pub fn format_trainer_float(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1.0e-4..1.0e16).contains(&magnitude) {
        let rendered = format!("{value:e}");
        let (mantissa, exponent) = rendered
            .split_once('e')
            .unwrap_or((rendered.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }

    let rendered = format!("{value}");
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_trainer_float, mae, rmse, round_to, stable_sum, unique_sorted};

    #[test]
    fn stable_sum_compensates_rounding() {
        let values = [0.1; 10];
        assert_eq!(stable_sum(values), 1.0);
    }

    #[test]
    fn error_metrics_require_matching_lengths() {
        assert_eq!(rmse(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(mae(&[], &[]), None);

        let reference = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.0, 2.0, 3.0, 6.0];
        assert_eq!(rmse(&reference, &predicted), Some(1.0));
        assert_eq!(mae(&reference, &predicted), Some(0.5));
    }

    #[test]
    fn trainer_float_rendering_matches_reference_frontend() {
        assert_eq!(format_trainer_float(10.0), "10.0");
        assert_eq!(format_trainer_float(0.02315), "0.02315");
        assert_eq!(format_trainer_float(-1.0), "-1.0");
        assert_eq!(format_trainer_float(1.0e-6), "1e-06");
        assert_eq!(format_trainer_float(2.5e-5), "2.5e-05");
        assert_eq!(format_trainer_float(0.0), "0.0");
        assert_eq!(format_trainer_float(1.0e20), "1e+20");
    }

    #[test]
    fn rounding_and_unique_helpers_are_deterministic() {
        assert_eq!(round_to(4.999_999_9, 1), 5.0);
        assert_eq!(round_to(0.549_999, 1), 0.5);
        assert_eq!(unique_sorted([0.3, 0.1, 0.3, 0.2]), vec![0.1, 0.2, 0.3]);
    }
}
