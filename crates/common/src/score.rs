//! Wilson score lower bound.
//!
//! Ranks voteables by the lower bound of the Wilson score interval for the
//! share of positive votes, which stays conservative for small samples.
//! See <http://evanmiller.org/how-not-to-sort-by-average-rating.html>.

/// Confidence used when none is given.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Coefficients of the polynomial approximation of the inverse normal CDF.
const QUANTILE_COEFFICIENTS: [f64; 11] = [
    1.570_796_288,
    0.037_069_879_06,
    -0.836_435_358_9e-3,
    -0.225_094_717_6e-3,
    0.684_121_829_9e-5,
    0.582_423_851_5e-5,
    -0.104_527_497e-5,
    0.836_093_701_7e-7,
    -0.323_108_127_7e-8,
    0.365_776_303_6e-10,
    0.693_623_398_2e-12,
];

/// Inverse of the standard normal CDF: the `x` with `P(X <= x) = qn`.
///
/// Inputs outside `[0, 1]` yield `0.0`.
#[must_use]
pub fn normal_quantile(qn: f64) -> f64 {
    if !(0.0..=1.0).contains(&qn) {
        tracing::warn!(qn, "Normal quantile requested outside [0, 1]");
        return 0.0;
    }
    if qn == 0.5 {
        return 0.0;
    }

    let w = if qn > 0.5 { 1.0 - qn } else { qn };
    let w3 = -(4.0 * w * (1.0 - w)).ln();
    let mut w1 = QUANTILE_COEFFICIENTS[0];
    for (i, b) in QUANTILE_COEFFICIENTS.iter().enumerate().skip(1) {
        w1 += b * w3.powf(i as f64);
    }

    if qn > 0.5 {
        (w1 * w3).sqrt()
    } else {
        -(w1 * w3).sqrt()
    }
}

/// Lower bound of the Wilson score interval for `positive` successes out
/// of `total` trials at the given two-sided `confidence`.
///
/// Zero trials score `0.0`.
#[must_use]
pub fn wilson_lower_bound(positive: u64, total: u64, confidence: f64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let n = total as f64;
    let z = normal_quantile(1.0 - (1.0 - confidence) / 2.0);
    let phat = positive as f64 / n;

    (phat + z * z / (2.0 * n) - z * ((phat * (1.0 - phat) + z * z / (4.0 * n)) / n).sqrt())
        / (1.0 + z * z / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_at_95_percent() {
        let z = normal_quantile(0.975);
        assert!((z - 1.959_964).abs() < 1e-4, "z = {z}");
    }

    #[test]
    fn test_quantile_symmetry() {
        let upper = normal_quantile(0.9);
        let lower = normal_quantile(0.1);
        assert!(upper > 0.0);
        assert!((upper + lower).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_median_and_out_of_range() {
        assert!(normal_quantile(0.5).abs() < f64::EPSILON);
        assert!(normal_quantile(1.5).abs() < f64::EPSILON);
        assert!(normal_quantile(-0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_votes_scores_zero() {
        assert!(
            wilson_lower_bound(0, 0, DEFAULT_CONFIDENCE).abs() < f64::EPSILON
        );
    }

    #[test]
    fn test_matches_closed_form() {
        let (positive, total) = (3_u64, 4_u64);
        let n = 4.0_f64;
        let z = normal_quantile(0.975);
        let phat = 0.75_f64;
        let expected = (phat + z * z / (2.0 * n)
            - z * ((phat * (1.0 - phat) + z * z / (4.0 * n)) / n).sqrt())
            / (1.0 + z * z / n);

        let score = wilson_lower_bound(positive, total, DEFAULT_CONFIDENCE);
        assert_eq!(score.to_bits(), expected.to_bits());
        assert!(score > 0.29 && score < 0.32, "score = {score}");
    }

    #[test]
    fn test_bounded_and_monotonic() {
        for total in 1..=40_u64 {
            let mut previous = -1.0;
            for positive in 0..=total {
                let score = wilson_lower_bound(positive, total, DEFAULT_CONFIDENCE);
                // zero positives land on 0.0 up to rounding
                assert!(
                    score > -1e-12 && score <= 1.0,
                    "{positive}/{total} -> {score}"
                );
                assert!(score >= previous, "{positive}/{total} decreased");
                previous = score;
            }
        }
    }

    #[test]
    fn test_more_samples_raise_the_bound() {
        let small = wilson_lower_bound(1, 1, DEFAULT_CONFIDENCE);
        let large = wilson_lower_bound(100, 100, DEFAULT_CONFIDENCE);
        assert!(large > small);
    }

    #[test]
    fn test_higher_confidence_lowers_the_bound() {
        let loose = wilson_lower_bound(8, 10, 0.80);
        let strict = wilson_lower_bound(8, 10, 0.99);
        assert!(strict < loose);
    }
}
