//! Float helpers shared by unit, price and currency arithmetic.

/// Round `value` to the nearest multiple of `step`, halves away from zero.
///
/// The normalized value is nudged by one ULP-sized epsilon before rounding so
/// that binary representation error (`2.675 / 0.01 == 267.4999…`) does not
/// flip a half towards zero. A non-positive `step` leaves the value untouched.
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 || !step.is_finite() {
        return value;
    }
    let normalized = value / step;
    if normalized == 0.0 || !normalized.is_finite() {
        return value;
    }
    let epsilon = 2f64.powf(normalized.abs().log2() - 52.0);
    let rounded = (normalized + normalized.signum() * epsilon).round();
    rounded * step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert!(approx(round_to_step(2.5, 1.0), 3.0));
        assert!(approx(round_to_step(-2.5, 1.0), -3.0));
        assert!(approx(round_to_step(2.675, 0.01), 2.68));
    }

    #[test]
    fn snaps_to_step_multiples() {
        assert!(approx(round_to_step(23.0, 10.0), 20.0));
        assert!(approx(round_to_step(0.126, 0.05), 0.15));
        assert!(approx(round_to_step(90.0, 1.0), 90.0));
    }

    #[test]
    fn non_positive_step_is_identity() {
        assert_eq!(round_to_step(1.234, 0.0), 1.234);
        assert_eq!(round_to_step(1.234, -1.0), 1.234);
        assert_eq!(round_to_step(0.0, 0.01), 0.0);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: rounding is idempotent.
            #[test]
            fn rounding_is_idempotent(value in -1.0e6f64..1.0e6, step in prop::sample::select(vec![0.01, 0.05, 0.5, 1.0, 10.0])) {
                let once = round_to_step(value, step);
                let twice = round_to_step(once, step);
                prop_assert!((once - twice).abs() < 1e-6);
            }

            /// Property: the rounded value is never more than half a step away.
            #[test]
            fn rounding_stays_within_half_step(value in -1.0e6f64..1.0e6, step in prop::sample::select(vec![0.01, 0.5, 1.0, 10.0])) {
                let rounded = round_to_step(value, step);
                prop_assert!((rounded - value).abs() <= step / 2.0 + 1e-6);
            }
        }
    }
}
