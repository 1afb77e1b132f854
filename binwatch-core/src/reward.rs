//! Reward points for waste separation.
//!
//! Points are step functions of the organic and non-recyclable levels. Plastic found by the
//! detector is handled by an explicit [`PlasticPolicy`]; the default policy awards nothing for
//! it, so totals equal the plain sum of the two fractions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BinwatchError;
use crate::model::{BinReading, PlasticSignal, UserId};

const ORGANIC_STEPS: [(f64, u32); 3] = [(90.0, 15), (70.0, 10), (50.0, 5)];
const NON_RECYCLABLE_STEPS: [(f64, u32); 3] = [(90.0, 8), (70.0, 5), (50.0, 2)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How the plastic penalty enters the total.
pub enum PenaltyMode {
    /// Added to the total, as the stored column has always been summed.
    #[default]
    Add,
    /// Taken off the total.
    Subtract,
}

impl FromStr for PenaltyMode {
    type Err = BinwatchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(PenaltyMode::Add),
            "subtract" => Ok(PenaltyMode::Subtract),
            other => Err(BinwatchError::Invalid(format!(
                "unknown plastic penalty mode {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Policy applied when the detector reports plastic.
pub struct PlasticPolicy {
    /// Penalty magnitude for a detection.
    pub penalty_points: u32,
    /// Detections below this confidence are ignored.
    pub min_confidence: f64,
    /// Sign of the penalty in the total.
    pub mode: PenaltyMode,
}

impl PlasticPolicy {
    /// Penalty for a detector signal.
    #[must_use]
    pub fn penalty_for(&self, signal: PlasticSignal) -> u32 {
        if signal.detected && signal.confidence >= self.min_confidence {
            self.penalty_points
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Points derived from a single bin reading.
pub struct RewardBreakdown {
    /// Points for the organic section.
    pub organic_points: u32,
    /// Points for the non-recyclable section.
    pub non_recyclable_points: u32,
    /// Plastic penalty magnitude.
    pub plastic_penalty: u32,
    /// Combined points.
    pub total_points: i64,
}

impl RewardBreakdown {
    /// Combine the parts under a penalty mode.
    #[must_use]
    pub fn new(
        organic_points: u32,
        non_recyclable_points: u32,
        plastic_penalty: u32,
        mode: PenaltyMode,
    ) -> Self {
        let earned = i64::from(organic_points) + i64::from(non_recyclable_points);
        let penalty = i64::from(plastic_penalty);
        let total_points = match mode {
            PenaltyMode::Add => earned + penalty,
            PenaltyMode::Subtract => earned - penalty,
        };
        Self {
            organic_points,
            non_recyclable_points,
            plastic_penalty,
            total_points,
        }
    }
}

/// Replace a previous breakdown with a new one. Breakdowns never accumulate.
#[must_use]
pub fn merge(_previous: Option<RewardBreakdown>, next: RewardBreakdown) -> RewardBreakdown {
    next
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Latest breakdown stored for a resident.
pub struct RewardSnapshot {
    /// Resident the points belong to.
    #[serde(rename = "userId")]
    pub owner: UserId,
    /// Point breakdown.
    #[serde(flatten)]
    pub breakdown: RewardBreakdown,
    /// When the breakdown was computed.
    pub last_calculated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
/// Scores bin readings under a plastic policy.
pub struct RewardScorer {
    policy: PlasticPolicy,
}

impl RewardScorer {
    /// Create a scorer with the given plastic policy.
    #[must_use]
    pub fn new(policy: PlasticPolicy) -> Self {
        Self { policy }
    }

    /// Policy in effect.
    #[must_use]
    pub fn policy(&self) -> &PlasticPolicy {
        &self.policy
    }

    /// Compute the breakdown for a reading and detector signal.
    #[must_use]
    pub fn score(&self, reading: &BinReading, plastic: PlasticSignal) -> RewardBreakdown {
        RewardBreakdown::new(
            step_points(&ORGANIC_STEPS, reading.organic_level()),
            step_points(&NON_RECYCLABLE_STEPS, reading.non_recyclable_level()),
            self.policy.penalty_for(plastic),
            self.policy.mode,
        )
    }

    /// Score and stamp a snapshot for `owner`, replacing `previous`.
    #[must_use]
    pub fn snapshot(
        &self,
        owner: UserId,
        previous: Option<&RewardSnapshot>,
        reading: &BinReading,
        plastic: PlasticSignal,
        now: DateTime<Utc>,
    ) -> RewardSnapshot {
        let breakdown = merge(
            previous.map(|snapshot| snapshot.breakdown),
            self.score(reading, plastic),
        );
        RewardSnapshot {
            owner,
            breakdown,
            last_calculated: now,
        }
    }
}

fn step_points(steps: &[(f64, u32)], level: f64) -> u32 {
    steps
        .iter()
        .find(|(threshold, _)| level >= *threshold)
        .map_or(0, |(_, points)| *points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(organic: f64, non_recyclable: f64) -> BinReading {
        BinReading::new(organic, non_recyclable, 0.0).expect("valid levels")
    }

    #[test]
    fn full_sections_earn_top_steps() {
        let breakdown = RewardScorer::default().score(&reading(95.0, 95.0), PlasticSignal::default());
        assert_eq!(
            breakdown,
            RewardBreakdown {
                organic_points: 15,
                non_recyclable_points: 8,
                plastic_penalty: 0,
                total_points: 23,
            }
        );
    }

    #[test]
    fn half_full_organic_only() {
        let breakdown = RewardScorer::default().score(&reading(55.0, 10.0), PlasticSignal::default());
        assert_eq!(
            breakdown,
            RewardBreakdown {
                organic_points: 5,
                non_recyclable_points: 0,
                plastic_penalty: 0,
                total_points: 5,
            }
        );
    }

    #[test]
    fn step_boundaries_are_inclusive() {
        let scorer = RewardScorer::default();
        let none = PlasticSignal::default();
        assert_eq!(scorer.score(&reading(90.0, 90.0), none).total_points, 23);
        assert_eq!(scorer.score(&reading(89.9, 89.9), none).total_points, 15);
        assert_eq!(scorer.score(&reading(70.0, 70.0), none).total_points, 15);
        assert_eq!(scorer.score(&reading(50.0, 50.0), none).total_points, 7);
        assert_eq!(scorer.score(&reading(49.9, 49.9), none).total_points, 0);
    }

    #[test]
    fn default_policy_ignores_plastic() {
        let detected = PlasticSignal {
            detected: true,
            confidence: 0.99,
        };
        let breakdown = RewardScorer::default().score(&reading(95.0, 95.0), detected);
        assert_eq!(breakdown.plastic_penalty, 0);
        assert_eq!(breakdown.total_points, 23);
    }

    #[test]
    fn configured_penalty_respects_confidence_and_mode() {
        let detected = PlasticSignal {
            detected: true,
            confidence: 0.8,
        };
        let subtracting = RewardScorer::new(PlasticPolicy {
            penalty_points: 4,
            min_confidence: 0.5,
            mode: PenaltyMode::Subtract,
        });
        let breakdown = subtracting.score(&reading(95.0, 95.0), detected);
        assert_eq!(breakdown.plastic_penalty, 4);
        assert_eq!(breakdown.total_points, 19);

        let adding = RewardScorer::new(PlasticPolicy {
            penalty_points: 4,
            min_confidence: 0.9,
            mode: PenaltyMode::Add,
        });
        assert_eq!(adding.score(&reading(95.0, 95.0), detected).plastic_penalty, 0);
        let confident = PlasticSignal {
            detected: true,
            confidence: 0.95,
        };
        assert_eq!(adding.score(&reading(95.0, 95.0), confident).total_points, 27);
    }

    #[test]
    fn merge_overwrites_instead_of_accumulating() {
        let scorer = RewardScorer::default();
        let first = scorer.score(&reading(95.0, 95.0), PlasticSignal::default());
        let second = scorer.score(&reading(95.0, 95.0), PlasticSignal::default());
        assert_eq!(first, second);
        assert_eq!(merge(Some(first), second), second);
        assert_eq!(merge(None, second), second);

        let lower = scorer.score(&reading(55.0, 10.0), PlasticSignal::default());
        assert_eq!(merge(Some(first), lower).total_points, 5);
    }

    #[test]
    fn snapshot_serializes_flat() {
        let now = Utc::now();
        let snapshot = RewardScorer::default().snapshot(
            UserId(7),
            None,
            &reading(95.0, 95.0),
            PlasticSignal::default(),
            now,
        );
        let json = serde_json::to_value(snapshot).expect("serializable");
        assert_eq!(json["userId"], 7);
        assert_eq!(json["organicPoints"], 15);
        assert_eq!(json["nonRecyclablePoints"], 8);
        assert_eq!(json["plasticPenalty"], 0);
        assert_eq!(json["totalPoints"], 23);
        assert!(json["lastCalculated"].is_string());
    }

    #[test]
    fn penalty_mode_parses_case_insensitively() {
        assert_eq!("Subtract".parse::<PenaltyMode>().ok(), Some(PenaltyMode::Subtract));
        assert_eq!("add".parse::<PenaltyMode>().ok(), Some(PenaltyMode::Add));
        assert!("multiply".parse::<PenaltyMode>().is_err());
    }
}
