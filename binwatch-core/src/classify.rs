//! Fill level classification of a bin into a display tier and an alert flag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BinwatchError;
use crate::model::BinReading;

/// Overall fill at or above which a bin is critical.
pub const CRITICAL_THRESHOLD: f64 = 80.0;
/// Overall fill at or above which a bin is a warning.
pub const WARNING_THRESHOLD: f64 = 60.0;
/// Overall fill at or above which the bin needs emptying.
pub const ALERT_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Coarse severity label used for dashboard coloring.
pub enum Tier {
    /// Below the warning threshold.
    Normal,
    /// Filling up.
    Warning,
    /// Needs emptying soon.
    Critical,
}

impl Tier {
    /// Tier for an overall fill percentage.
    #[must_use]
    pub fn for_fill(overall_fill: f64) -> Self {
        if overall_fill >= CRITICAL_THRESHOLD {
            Tier::Critical
        } else if overall_fill >= WARNING_THRESHOLD {
            Tier::Warning
        } else {
            Tier::Normal
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Normal => "normal",
            Tier::Warning => "warning",
            Tier::Critical => "critical",
        };
        formatter.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Derived status of a bin reading.
pub struct ClassificationResult {
    /// Mean of the three levels, rounded to one decimal.
    pub overall_fill: f64,
    /// Severity tier of `overall_fill`.
    pub tier: Tier,
    /// Whether `overall_fill` reached the alert threshold.
    pub alert_triggered: bool,
}

/// Classify three raw fill levels.
///
/// # Errors
///
/// Returns [`BinwatchError::OutOfRange`] when any level is outside `0..=100`.
pub fn classify(
    organic_level: f64,
    non_recyclable_level: f64,
    hazardous_level: f64,
) -> Result<ClassificationResult, BinwatchError> {
    let reading = BinReading::new(organic_level, non_recyclable_level, hazardous_level)?;
    Ok(classify_reading(&reading))
}

/// Classify an already validated reading.
#[must_use]
pub fn classify_reading(reading: &BinReading) -> ClassificationResult {
    let sum = reading.organic_level() + reading.non_recyclable_level() + reading.hazardous_level();
    let overall_fill = round_one_decimal(sum / 3.0);

    ClassificationResult {
        overall_fill,
        tier: Tier::for_fill(overall_fill),
        alert_triggered: overall_fill >= ALERT_THRESHOLD,
    }
}

// Inputs are non-negative, so rounding half away from zero is round-half-up.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_single_section_is_normal() {
        let result = classify(90.0, 0.0, 0.0).expect("valid levels");
        assert!((result.overall_fill - 30.0).abs() < f64::EPSILON);
        assert_eq!(result.tier, Tier::Normal);
        assert!(!result.alert_triggered);
    }

    #[test]
    fn full_bin_is_critical_and_alerts() {
        let result = classify(100.0, 100.0, 100.0).expect("valid levels");
        assert!((result.overall_fill - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.tier, Tier::Critical);
        assert!(result.alert_triggered);
    }

    #[test]
    fn warning_below_alert_threshold() {
        let result = classify(80.0, 80.0, 60.0).expect("valid levels");
        assert!((result.overall_fill - 73.3).abs() < 1e-9);
        assert_eq!(result.tier, Tier::Warning);
        assert!(!result.alert_triggered);
    }

    #[test]
    fn alert_fires_before_critical() {
        let result = classify(75.0, 75.0, 75.0).expect("valid levels");
        assert_eq!(result.tier, Tier::Warning);
        assert!(result.alert_triggered);
    }

    #[test]
    fn out_of_range_levels_are_rejected() {
        assert!(matches!(
            classify(-1.0, 0.0, 0.0),
            Err(BinwatchError::OutOfRange { value, .. }) if (value + 1.0).abs() < f64::EPSILON
        ));
        assert!(matches!(
            classify(50.0, 101.0, 0.0),
            Err(BinwatchError::OutOfRange { .. })
        ));
        assert!(matches!(
            classify(f64::NAN, 0.0, 0.0),
            Err(BinwatchError::OutOfRange { .. })
        ));
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(classify(0.0, 0.0, 0.0).is_ok(), "zero is a valid level");
        assert!(classify(100.0, 0.0, 100.0).is_ok(), "100 is a valid level");
        assert_eq!(Tier::for_fill(80.0), Tier::Critical);
        assert_eq!(Tier::for_fill(79.9), Tier::Warning);
        assert_eq!(Tier::for_fill(60.0), Tier::Warning);
        assert_eq!(Tier::for_fill(59.9), Tier::Normal);
    }

    #[test]
    fn overall_fill_matches_rounded_mean_and_is_monotonic() {
        let steps = [0.0, 12.5, 33.3, 49.95, 50.0, 66.7, 74.9, 80.0, 99.99, 100.0];
        for &organic in &steps {
            for &non_recyclable in &steps {
                for &hazardous in &steps {
                    let result =
                        classify(organic, non_recyclable, hazardous).expect("valid levels");
                    let expected =
                        ((organic + non_recyclable + hazardous) / 3.0 * 10.0).round() / 10.0;
                    assert!((result.overall_fill - expected).abs() < 1e-9);
                    assert_eq!(result.alert_triggered, result.overall_fill >= 75.0);
                    assert_eq!(
                        result.tier == Tier::Critical,
                        result.overall_fill >= 80.0
                    );

                    let bumped = classify((organic + 10.0).min(100.0), non_recyclable, hazardous)
                        .expect("valid levels");
                    assert!(bumped.overall_fill >= result.overall_fill);
                }
            }
        }
    }

    #[test]
    fn serializes_with_camel_case_and_lowercase_tier() {
        let result = classify(100.0, 100.0, 100.0).expect("valid levels");
        let json = serde_json::to_value(result).expect("serializable");
        assert_eq!(json["overallFill"], 100.0);
        assert_eq!(json["tier"], "critical");
        assert_eq!(json["alertTriggered"], true);
    }
}
