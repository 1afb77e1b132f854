//! Latest reward snapshot per resident.

use async_trait::async_trait;
use binwatch_core::{PortError, RewardBreakdown, RewardPort, RewardSnapshot, UserId};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::{SqliteStore, owner_params, placeholders};

const REWARD_COLUMNS: &str =
    "owner_id, organic_points, non_recyclable_points, plastic_penalty, total_points, last_calculated";

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<RewardSnapshot> {
    Ok(RewardSnapshot {
        owner: UserId(row.get(0)?),
        breakdown: RewardBreakdown {
            organic_points: row.get(1)?,
            non_recyclable_points: row.get(2)?,
            plastic_penalty: row.get(3)?,
            total_points: row.get(4)?,
        },
        last_calculated: row.get(5)?,
    })
}

#[async_trait]
impl RewardPort for SqliteStore {
    async fn latest(&self, owner: UserId) -> Result<Option<RewardSnapshot>, PortError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE owner_id = ?1"),
                [owner.0],
                snapshot_from_row,
            )
            .optional()
        })
        .await
    }

    async fn upsert(&self, snapshot: &RewardSnapshot) -> Result<(), PortError> {
        let snapshot = *snapshot;
        self.with_conn(move |conn| {
            let breakdown = snapshot.breakdown;
            conn.execute(
                "INSERT INTO rewards
                    (owner_id, organic_points, non_recyclable_points, plastic_penalty, total_points, last_calculated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(owner_id) DO UPDATE SET
                    organic_points = excluded.organic_points,
                    non_recyclable_points = excluded.non_recyclable_points,
                    plastic_penalty = excluded.plastic_penalty,
                    total_points = excluded.total_points,
                    last_calculated = excluded.last_calculated",
                params![
                    snapshot.owner.0,
                    breakdown.organic_points,
                    breakdown.non_recyclable_points,
                    breakdown.plastic_penalty,
                    breakdown.total_points,
                    snapshot.last_calculated,
                ],
            )
            .map(drop)
        })
        .await
    }

    async fn for_owners(&self, owners: &[UserId]) -> Result<Vec<RewardSnapshot>, PortError> {
        if owners.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE owner_id IN ({}) ORDER BY owner_id",
            placeholders(owners)
        );
        let params: Vec<i64> = owner_params(owners).collect();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params), snapshot_from_row)?;
            rows.collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use binwatch_core::{AccountPort, NewUser, PenaltyMode, Role};
    use chrono::{TimeZone, Utc};

    use super::*;

    async fn resident(store: &SqliteStore, email: &str) -> UserId {
        store
            .create_user(NewUser {
                name: "Resident".to_owned(),
                email: email.to_owned(),
                password_hash: "digest".to_owned(),
                role: Role::User,
            })
            .await
            .expect("created")
            .id
    }

    fn snapshot(owner: UserId, organic: u32, minute: u32) -> RewardSnapshot {
        RewardSnapshot {
            owner,
            breakdown: RewardBreakdown::new(organic, 2, 3, PenaltyMode::Subtract),
            last_calculated: Utc
                .with_ymd_and_hms(2024, 3, 1, 12, minute, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_previous_snapshot() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;

        store.upsert(&snapshot(owner, 15, 0)).await.expect("first");
        store.upsert(&snapshot(owner, 5, 1)).await.expect("second");

        let latest = store.latest(owner).await.expect("query").expect("stored");
        assert_eq!(latest, snapshot(owner, 5, 1));
        assert_eq!(latest.breakdown.total_points, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_upserts_keep_one_whole_snapshot() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;

        let writers: Vec<_> = (0..8_u32)
            .map(|minute| {
                let store = store.clone();
                let written = snapshot(owner, 10 + minute, minute);
                tokio::spawn(async move { store.upsert(&written).await })
            })
            .collect();
        for writer in writers {
            writer.await.expect("writer finished").expect("upsert");
        }

        let stored = store.for_owners(&[owner]).await.expect("query");
        assert_eq!(stored.len(), 1);
        let latest = stored.first().copied().expect("stored");
        let minute = latest.breakdown.organic_points - 10;
        assert_eq!(latest, snapshot(owner, 10 + minute, minute));
    }

    #[tokio::test]
    async fn negative_totals_survive_storage() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;
        store.upsert(&snapshot(owner, 0, 0)).await.expect("stored");

        let latest = store.latest(owner).await.expect("query").expect("stored");
        assert_eq!(latest.breakdown.total_points, -1);
    }

    #[tokio::test]
    async fn for_owners_skips_residents_without_snapshot() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let scored = resident(&store, "ada@example.org").await;
        let unscored = resident(&store, "bob@example.org").await;
        store.upsert(&snapshot(scored, 10, 0)).await.expect("stored");

        let found = store
            .for_owners(&[scored, unscored])
            .await
            .expect("query");
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|snapshot| snapshot.owner), Some(scored));
        assert!(store.latest(unscored).await.expect("query").is_none());
    }
}
