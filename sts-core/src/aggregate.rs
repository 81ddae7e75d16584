//! The SP 800-22 §4.2 aggregation pass.
//!
//! After the last bitstream, each configuration is judged on two axes: the
//! collected probability values must be uniformly distributed over [0, 1]
//! (a second-order chi-squared test over a 10-bin histogram), and the
//! fraction of passing bitstreams must fall inside a three-standard-
//! deviation binomial interval around 1 - α.

use crate::math::igamc;
use crate::report::{ConfigurationMetrics, Criterion, Evaluation};

/// The acceptable pass-count range, in tests, at three standard deviations
/// of the binomial under the null hypothesis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProportionBounds {
    pub minimum: u64,
    pub maximum: u64,
}

/// The smallest number of tests, at least 55, at which the proportion
/// interval stays non-degenerate (its lower bound keeps a positive pass
/// proportion).
pub fn minimum_tests_for_significance(alpha: f64) -> u64 {
    let expected_proportion = 1.0 - alpha;
    let mut candidate = 55_u64;

    while expected_proportion - 3.0 * f64::sqrt(expected_proportion * alpha / candidate as f64)
        <= 0.0
    {
        candidate += 1;
    }

    candidate
}

/// The proportion confidence interval for `tested` bitstreams: the rounded
/// pass counts at (1 - α) ∓ 3·sqrt((1 - α)·α / M), clamped to [0, M].
pub fn proportion_bounds(alpha: f64, tested: u64) -> ProportionBounds {
    if tested == 0 {
        return ProportionBounds {
            minimum: 0,
            maximum: 0,
        };
    }

    let m = tested as f64;
    let expected_proportion = 1.0 - alpha;
    let delta = 3.0 * f64::sqrt(expected_proportion * alpha / m);

    let minimum = ((expected_proportion - delta) * m).round().max(0.0) as u64;
    let maximum = (((expected_proportion + delta) * m).round() as u64).min(tested);

    ProportionBounds { minimum, maximum }
}

/// Bin the probability values into 10 equal-width bins and compute the
/// uniformity probability value igamc(9/2, χ²/2). With no values at all the
/// uniformity is reported as 0.0; the count of considered values travels
/// with it so consumers can tell the two cases apart.
pub fn uniformity(p_values: impl Iterator<Item = f64>) -> ([u64; 10], f64, u64) {
    let mut histogram = [0_u64; 10];
    let mut considered = 0_u64;

    for p in p_values {
        // p == 1.0 belongs to the last bin
        let bin = ((p * 10.0) as usize).min(9);
        histogram[bin] += 1;
        considered += 1;
    }

    if considered == 0 {
        return (histogram, 0.0, 0);
    }

    let expected = considered as f64 / 10.0;
    let chi = histogram
        .iter()
        .map(|&count| f64::powi(count as f64 - expected, 2) / expected)
        .sum::<f64>();

    let uniformity = igamc(9.0 / 2.0, chi / 2.0).unwrap_or(0.0);

    (histogram, uniformity, considered)
}

/// The aggregate verdict for one configuration.
pub(crate) struct ConfigurationOutcome {
    pub metrics: ConfigurationMetrics,
    pub criteria: Vec<Criterion>,
    pub evaluation: Evaluation,
}

/// Judge one configuration: metrics, the seven aggregate criteria and the
/// pass/fail verdict. `skip_zero` excludes zero probability values from the
/// uniformity histogram (random excursions semantics).
pub(crate) fn evaluate_configuration(
    alpha: f64,
    tested: u64,
    passed: u64,
    accumulated_ones: u64,
    accumulated_zeros: u64,
    p_values: &[f64],
    skip_zero: bool,
) -> ConfigurationOutcome {
    let considered_values = p_values
        .iter()
        .copied()
        .filter(|&p| !skip_zero || p > 0.0);
    let (histogram, uniformity_value, considered) = uniformity(considered_values);

    let minimum_required = minimum_tests_for_significance(alpha);
    let bounds = proportion_bounds(alpha, tested);

    let metrics = ConfigurationMetrics {
        bitstreams_tested: tested,
        accumulated_ones,
        accumulated_zeros,
        minimum_tests_required: minimum_required,
        expected_passed: (1.0 - alpha) * tested as f64,
        expected_failed: alpha * tested as f64,
        proportion_lower: bounds.minimum,
        proportion_upper: bounds.maximum,
        histogram,
        uniformity: uniformity_value,
        considered,
    };

    let criteria = vec![
        Criterion {
            text: format!("tests executed {tested} >= minimum required for significance {minimum_required}"),
            passed: tested >= minimum_required,
        },
        Criterion {
            text: format!("tests executed {tested} >= 55"),
            passed: tested >= 55,
        },
        Criterion {
            text: format!("probability value uniformity {uniformity_value:.6} > 0"),
            passed: uniformity_value > 0.0,
        },
        Criterion {
            text: format!("probability value uniformity {uniformity_value:.6} > 0.0001"),
            passed: uniformity_value > 0.0001,
        },
        Criterion {
            text: format!("tests executed {tested} > 0"),
            passed: tested > 0,
        },
        Criterion {
            text: format!(
                "tests passed {passed} <= proportion upper bound {}",
                bounds.maximum
            ),
            passed: passed <= bounds.maximum,
        },
        Criterion {
            text: format!(
                "tests passed {passed} >= proportion lower bound {}",
                bounds.minimum
            ),
            passed: passed >= bounds.minimum,
        },
    ];

    let evaluation = if criteria.iter().all(|criterion| criterion.passed) {
        Evaluation::Pass
    } else {
        Evaluation::Fail
    };

    ConfigurationOutcome {
        metrics,
        criteria,
        evaluation,
    }
}
