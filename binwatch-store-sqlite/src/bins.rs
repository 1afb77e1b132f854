//! Houses, bins and the waste log.

use async_trait::async_trait;
use binwatch_core::{
    BinId, BinPort, BinReading, House, HouseId, NewHouse, NewWasteEntry, PlasticSignal, PortError,
    UserId, WasteBin, WasteEntry, WasteKind, WasteTotals,
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::{SqliteStore, conversion_error, owner_params, placeholders};

const HOUSE_COLUMNS: &str = "id, owner_id, address, latitude, longitude";
const BIN_COLUMNS: &str = "id, house_id, owner_id, organic_level, non_recyclable_level, \
     hazardous_level, plastic_detected, plastic_confidence, last_updated, last_image_processed";

pub(crate) fn house_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<House> {
    Ok(House {
        id: HouseId(row.get(offset)?),
        owner: UserId(row.get(offset + 1)?),
        address: row.get(offset + 2)?,
        latitude: row.get(offset + 3)?,
        longitude: row.get(offset + 4)?,
    })
}

fn bin_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<WasteBin> {
    let reading = BinReading::new(
        row.get(offset + 3)?,
        row.get(offset + 4)?,
        row.get(offset + 5)?,
    )
    .map_err(|err| conversion_error(offset + 3, err))?;
    Ok(WasteBin {
        id: BinId(row.get(offset)?),
        house_id: HouseId(row.get(offset + 1)?),
        owner: UserId(row.get(offset + 2)?),
        reading,
        plastic_detected: row.get(offset + 6)?,
        plastic_confidence: row.get(offset + 7)?,
        last_updated: row.get(offset + 8)?,
        last_image_processed: row.get(offset + 9)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<WasteEntry> {
    let kind: String = row.get(2)?;
    Ok(WasteEntry {
        id: row.get(0)?,
        owner: UserId(row.get(1)?),
        kind: kind
            .parse::<WasteKind>()
            .map_err(|err| conversion_error(2, err))?,
        quantity: row.get(3)?,
        location: row.get(4)?,
        collected_at: row.get(5)?,
    })
}

#[async_trait]
impl BinPort for SqliteStore {
    async fn upsert_house(&self, owner: UserId, house: NewHouse) -> Result<House, PortError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO houses (owner_id, address, latitude, longitude)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(owner_id) DO UPDATE SET
                        address = excluded.address,
                        latitude = excluded.latitude,
                        longitude = excluded.longitude
                     RETURNING {HOUSE_COLUMNS}"
                ),
                params![owner.0, house.address, house.latitude, house.longitude],
                |row| house_from_row(row, 0),
            )
        })
        .await
    }

    async fn house_of(&self, owner: UserId) -> Result<Option<House>, PortError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {HOUSE_COLUMNS} FROM houses WHERE owner_id = ?1"),
                [owner.0],
                |row| house_from_row(row, 0),
            )
            .optional()
        })
        .await
    }

    async fn houses_with_bins(
        &self,
        owners: &[UserId],
    ) -> Result<Vec<(House, Option<WasteBin>)>, PortError> {
        if owners.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT h.id, h.owner_id, h.address, h.latitude, h.longitude,
                    b.id, b.house_id, b.owner_id, b.organic_level, b.non_recyclable_level,
                    b.hazardous_level, b.plastic_detected, b.plastic_confidence,
                    b.last_updated, b.last_image_processed
             FROM houses h
             LEFT JOIN waste_bins b ON b.house_id = h.id
             WHERE h.owner_id IN ({})
             ORDER BY h.id",
            placeholders(owners)
        );
        let params: Vec<i64> = owner_params(owners).collect();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params), |row| {
                let house = house_from_row(row, 0)?;
                let bin = match row.get::<_, Option<i64>>(5)? {
                    Some(_) => Some(bin_from_row(row, 5)?),
                    None => None,
                };
                Ok((house, bin))
            })?;
            rows.collect()
        })
        .await
    }

    async fn bin_of(&self, owner: UserId) -> Result<Option<WasteBin>, PortError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {BIN_COLUMNS} FROM waste_bins WHERE owner_id = ?1 ORDER BY id LIMIT 1"),
                [owner.0],
                |row| bin_from_row(row, 0),
            )
            .optional()
        })
        .await
    }

    async fn save_levels(
        &self,
        house: &House,
        reading: BinReading,
        at: DateTime<Utc>,
    ) -> Result<WasteBin, PortError> {
        let (house_id, owner) = (house.id, house.owner);
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO waste_bins
                        (house_id, owner_id, organic_level, non_recyclable_level, hazardous_level, last_updated)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(house_id) DO UPDATE SET
                        owner_id = excluded.owner_id,
                        organic_level = excluded.organic_level,
                        non_recyclable_level = excluded.non_recyclable_level,
                        hazardous_level = excluded.hazardous_level,
                        last_updated = excluded.last_updated
                     RETURNING {BIN_COLUMNS}"
                ),
                params![
                    house_id.0,
                    owner.0,
                    reading.organic_level(),
                    reading.non_recyclable_level(),
                    reading.hazardous_level(),
                    at,
                ],
                |row| bin_from_row(row, 0),
            )
        })
        .await
    }

    async fn record_plastic(
        &self,
        owner: UserId,
        bin: BinId,
        signal: PlasticSignal,
        at: DateTime<Utc>,
    ) -> Result<Option<WasteBin>, PortError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE waste_bins SET
                        plastic_detected = ?1,
                        plastic_confidence = ?2,
                        last_image_processed = ?3
                     WHERE id = ?4 AND owner_id = ?5
                     RETURNING {BIN_COLUMNS}"
                ),
                params![signal.detected, signal.confidence, at, bin.0, owner.0],
                |row| bin_from_row(row, 0),
            )
            .optional()
        })
        .await
    }

    async fn add_waste_entry(
        &self,
        owner: UserId,
        entry: NewWasteEntry,
    ) -> Result<WasteEntry, PortError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO waste_entries (owner_id, kind, quantity, location, collected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    owner.0,
                    entry.kind.as_str(),
                    entry.quantity,
                    entry.location,
                    entry.collected_at,
                ],
            )?;
            Ok(WasteEntry {
                id: conn.last_insert_rowid(),
                owner,
                kind: entry.kind,
                quantity: entry.quantity,
                location: entry.location,
                collected_at: entry.collected_at,
            })
        })
        .await
    }

    async fn waste_totals(&self, owner: UserId) -> Result<WasteTotals, PortError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT kind, SUM(quantity) FROM waste_entries WHERE owner_id = ?1 GROUP BY kind",
            )?;
            let mut rows = stmt.query([owner.0])?;
            let mut totals = WasteTotals::default();
            while let Some(row) = rows.next()? {
                let kind: String = row.get(0)?;
                let kind = kind
                    .parse::<WasteKind>()
                    .map_err(|err| conversion_error(0, err))?;
                totals.add(kind, row.get(1)?);
            }
            Ok(totals)
        })
        .await
    }

    async fn waste_history(
        &self,
        owner: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<WasteEntry>, PortError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, kind, quantity, location, collected_at
                 FROM waste_entries
                 WHERE owner_id = ?1 AND collected_at >= ?2
                 ORDER BY collected_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![owner.0, since], entry_from_row)?;
            rows.collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use binwatch_core::{AccountPort, NewUser, Role};
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

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

    fn main_street() -> NewHouse {
        NewHouse {
            address: "1 Main Street".to_owned(),
            latitude: 50.9,
            longitude: 6.9,
        }
    }

    #[tokio::test]
    async fn house_upsert_keeps_one_row_per_owner() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;

        let first = store.upsert_house(owner, main_street()).await.expect("insert");
        let moved = store
            .upsert_house(
                owner,
                NewHouse {
                    address: "2 Side Road".to_owned(),
                    ..main_street()
                },
            )
            .await
            .expect("update");

        assert_eq!(first.id, moved.id);
        assert_eq!(moved.address, "2 Side Road");
        let stored = store.house_of(owner).await.expect("query").expect("house");
        assert_eq!(stored, moved);
    }

    #[tokio::test]
    async fn levels_create_then_update_the_bin() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;
        let house = store.upsert_house(owner, main_street()).await.expect("house");

        assert!(store.bin_of(owner).await.expect("query").is_none());

        let reading = BinReading::new(50.0, 60.0, 70.0).expect("valid");
        let created = store.save_levels(&house, reading, at(8)).await.expect("created");
        let updated = store
            .save_levels(&house, BinReading::new(10.0, 20.0, 30.0).expect("valid"), at(9))
            .await
            .expect("updated");

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.reading.organic_level(), 10.0);
        assert_eq!(updated.last_updated, at(9));
        assert!(!updated.plastic_detected);

        let bin = store.bin_of(owner).await.expect("query").expect("bin");
        assert_eq!(bin.reading, updated.reading);
    }

    #[tokio::test]
    async fn plastic_is_recorded_only_on_own_bin() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;
        let stranger = resident(&store, "eve@example.org").await;
        let house = store.upsert_house(owner, main_street()).await.expect("house");
        let bin = store
            .save_levels(&house, BinReading::empty(), at(8))
            .await
            .expect("bin");
        let signal = PlasticSignal {
            detected: true,
            confidence: 0.8,
        };

        let foreign = store
            .record_plastic(stranger, bin.id, signal, at(9))
            .await
            .expect("query");
        assert!(foreign.is_none());

        let updated = store
            .record_plastic(owner, bin.id, signal, at(9))
            .await
            .expect("query")
            .expect("own bin");
        assert_eq!(updated.plastic_signal(), signal);
        assert_eq!(updated.last_image_processed, Some(at(9)));
    }

    #[tokio::test]
    async fn houses_without_bins_are_listed() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let with_bin = resident(&store, "ada@example.org").await;
        let without_bin = resident(&store, "bob@example.org").await;
        let house = store.upsert_house(with_bin, main_street()).await.expect("house");
        store
            .save_levels(&house, BinReading::new(90.0, 0.0, 0.0).expect("valid"), at(8))
            .await
            .expect("bin");
        store
            .upsert_house(without_bin, main_street())
            .await
            .expect("house");

        let listed = store
            .houses_with_bins(&[with_bin, without_bin])
            .await
            .expect("query");
        assert_eq!(listed.len(), 2);
        let bins: Vec<bool> = listed.iter().map(|(_, bin)| bin.is_some()).collect();
        assert_eq!(bins, [true, false]);

        assert!(store.houses_with_bins(&[]).await.expect("query").is_empty());
    }

    #[tokio::test]
    async fn waste_log_totals_and_history() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;
        let entries = [
            (WasteKind::Organic, 2.0, at(8) - Duration::days(10)),
            (WasteKind::Organic, 1.5, at(8)),
            (WasteKind::Hazardous, 0.5, at(10)),
        ];
        for (kind, quantity, collected_at) in entries {
            store
                .add_waste_entry(
                    owner,
                    NewWasteEntry {
                        kind,
                        quantity,
                        location: "Depot".to_owned(),
                        collected_at,
                    },
                )
                .await
                .expect("logged");
        }

        let totals = store.waste_totals(owner).await.expect("totals");
        assert_eq!(totals.organic, 3.5);
        assert_eq!(totals.non_recyclable, 0.0);
        assert_eq!(totals.hazardous, 0.5);

        let history = store
            .waste_history(owner, at(10) - Duration::days(7))
            .await
            .expect("history");
        let kinds: Vec<WasteKind> = history.iter().map(|entry| entry.kind).collect();
        assert_eq!(kinds, [WasteKind::Hazardous, WasteKind::Organic]);
    }
}
