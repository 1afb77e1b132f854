//! Aggregated view over the bins of all residents assigned to an authority.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{ClassificationResult, Tier, classify_reading};
use crate::model::{BinReading, House, HouseId, UserId, WasteBin};
use crate::reward::{RewardBreakdown, RewardSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One house row on the authority dashboard.
pub struct HouseStatus {
    /// House identifier.
    pub house_id: HouseId,
    /// Resident owning the house.
    pub user_id: UserId,
    /// Postal address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Current levels; an empty reading when the house has no bin yet.
    #[serde(flatten)]
    pub reading: BinReading,
    /// Highest section level.
    pub max_level: f64,
    /// Classification of the reading.
    pub status: ClassificationResult,
    /// Last report time, if the house has a bin.
    pub last_updated: Option<DateTime<Utc>>,
    /// Whether the last photo showed plastic.
    pub plastic_detected: bool,
    /// Latest reward breakdown of the resident.
    pub reward: Option<RewardBreakdown>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Headline numbers of the dashboard.
pub struct OverviewStats {
    /// Houses of assigned residents.
    pub total_houses: usize,
    /// Houses whose bin is in the critical tier.
    pub critical_bins: usize,
    /// Mean organic level, rounded.
    pub avg_organic_level: u32,
    /// Mean non-recyclable level, rounded.
    pub avg_non_recyclable_level: u32,
    /// Mean hazardous level, rounded.
    pub avg_hazardous_level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Share of each fraction in the summed levels, in whole percent.
pub struct WasteDistribution {
    /// Organic share.
    pub organic: u32,
    /// Non-recyclable share.
    pub non_recyclable: u32,
    /// Hazardous share.
    pub hazardous: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Authority dashboard payload.
pub struct AuthorityOverview {
    /// Headline numbers.
    pub stats: OverviewStats,
    /// Every house, in storage order.
    pub houses: Vec<HouseStatus>,
    /// Critical houses, fullest first.
    pub critical_bins: Vec<HouseStatus>,
    /// Fraction shares.
    pub waste_distribution: WasteDistribution,
}

/// Build the dashboard from houses, their bins, and the residents' reward snapshots.
#[must_use]
pub fn build_overview(
    houses: Vec<(House, Option<WasteBin>)>,
    rewards: &[RewardSnapshot],
) -> AuthorityOverview {
    let rewards_by_owner: HashMap<UserId, RewardBreakdown> = rewards
        .iter()
        .map(|snapshot| (snapshot.owner, snapshot.breakdown))
        .collect();

    let mut totals = [0.0_f64; 3];
    let houses: Vec<HouseStatus> = houses
        .into_iter()
        .map(|(house, bin)| {
            let reading = bin.as_ref().map_or_else(BinReading::empty, |bin| bin.reading);
            totals[0] += reading.organic_level();
            totals[1] += reading.non_recyclable_level();
            totals[2] += reading.hazardous_level();
            HouseStatus {
                house_id: house.id,
                user_id: house.owner,
                address: house.address,
                latitude: house.latitude,
                longitude: house.longitude,
                max_level: reading.max_level(),
                status: classify_reading(&reading),
                reading,
                last_updated: bin.as_ref().map(|bin| bin.last_updated),
                plastic_detected: bin.as_ref().is_some_and(|bin| bin.plastic_detected),
                reward: rewards_by_owner.get(&house.owner).copied(),
            }
        })
        .collect();

    let [organic, non_recyclable, hazardous] = totals;
    #[expect(
        clippy::cast_precision_loss,
        reason = "house counts stay far below 2^52"
    )]
    let count = houses.len() as f64;
    let average = |total: f64| if houses.is_empty() { 0 } else { rounded(total / count) };

    let mut critical_bins: Vec<HouseStatus> = houses
        .iter()
        .filter(|house| house.status.tier == Tier::Critical)
        .cloned()
        .collect();
    critical_bins.sort_by(|left, right| {
        right
            .status
            .overall_fill
            .total_cmp(&left.status.overall_fill)
    });

    let stats = OverviewStats {
        total_houses: houses.len(),
        critical_bins: critical_bins.len(),
        avg_organic_level: average(organic),
        avg_non_recyclable_level: average(non_recyclable),
        avg_hazardous_level: average(hazardous),
    };

    AuthorityOverview {
        stats,
        houses,
        critical_bins,
        waste_distribution: distribution(organic, non_recyclable, hazardous),
    }
}

fn distribution(organic: f64, non_recyclable: f64, hazardous: f64) -> WasteDistribution {
    let total = organic + non_recyclable + hazardous;
    if total <= 0.0 {
        return WasteDistribution::default();
    }
    let share = |part: f64| rounded(part / total * 100.0);
    WasteDistribution {
        organic: share(organic),
        non_recyclable: share(non_recyclable),
        hazardous: share(hazardous),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "values are percentages in 0..=100"
)]
fn rounded(value: f64) -> u32 {
    value.round() as u32
}
