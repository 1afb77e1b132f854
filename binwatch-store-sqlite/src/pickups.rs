//! Pickup requests.

use async_trait::async_trait;
use binwatch_core::{
    NewPickupRequest, PickupPort, PickupRequest, PickupRequestId, PickupRequestView, PickupStatus,
    PortError, UserId,
};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use serde_json::Value;

use crate::bins::house_from_row;
use crate::{SqliteStore, conversion_error, owner_params, placeholders};

const REQUEST_COLUMNS: &str = "p.id, p.owner_id, p.address, p.description, p.bin_details, \
     p.status, p.created_at";

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<PickupRequest> {
    let status: String = row.get(5)?;
    Ok(PickupRequest {
        id: PickupRequestId(row.get(0)?),
        owner: UserId(row.get(1)?),
        address: row.get(2)?,
        description: row.get(3)?,
        bin_details: row.get::<_, Option<Value>>(4)?,
        status: status
            .parse::<PickupStatus>()
            .map_err(|err| conversion_error(5, err))?,
        created_at: row.get(6)?,
    })
}

fn view_from_row(row: &Row<'_>) -> rusqlite::Result<PickupRequestView> {
    let house = match row.get::<_, Option<i64>>(9)? {
        Some(_) => Some(house_from_row(row, 9)?),
        None => None,
    };
    Ok(PickupRequestView {
        request: request_from_row(row)?,
        requester_name: row.get(7)?,
        requester_email: row.get(8)?,
        house,
    })
}

#[async_trait]
impl PickupPort for SqliteStore {
    async fn create(&self, request: NewPickupRequest) -> Result<PickupRequest, PortError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO pickup_requests (owner_id, address, description, bin_details, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    request.owner.0,
                    request.address,
                    request.description,
                    request.bin_details,
                    PickupStatus::Pending.as_str(),
                    request.created_at,
                ],
            )?;
            Ok(PickupRequest {
                id: PickupRequestId(conn.last_insert_rowid()),
                owner: request.owner,
                address: request.address,
                description: request.description,
                bin_details: request.bin_details,
                status: PickupStatus::Pending,
                created_at: request.created_at,
            })
        })
        .await
    }

    async fn get(&self, id: PickupRequestId) -> Result<Option<PickupRequest>, PortError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {REQUEST_COLUMNS} FROM pickup_requests p WHERE p.id = ?1"),
                [id.0],
                request_from_row,
            )
            .optional()
        })
        .await
    }

    async fn for_owners(&self, owners: &[UserId]) -> Result<Vec<PickupRequestView>, PortError> {
        if owners.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {REQUEST_COLUMNS}, u.name, u.email,
                    h.id, h.owner_id, h.address, h.latitude, h.longitude
             FROM pickup_requests p
             JOIN users u ON u.id = p.owner_id
             LEFT JOIN houses h ON h.owner_id = p.owner_id
             WHERE p.owner_id IN ({})
             ORDER BY p.created_at DESC, p.id DESC",
            placeholders(owners)
        );
        let params: Vec<i64> = owner_params(owners).collect();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params), view_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn set_status(&self, id: PickupRequestId, status: PickupStatus) -> Result<(), PortError> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE pickup_requests SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id.0],
            )
            .map(drop)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use binwatch_core::{AccountPort, BinPort, NewHouse, NewUser, Role};
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    async fn resident(store: &SqliteStore, email: &str) -> UserId {
        store
            .create_user(NewUser {
                name: email.to_owned(),
                email: email.to_owned(),
                password_hash: "digest".to_owned(),
                role: Role::User,
            })
            .await
            .expect("created")
            .id
    }

    fn request(owner: UserId, minute: u32) -> NewPickupRequest {
        NewPickupRequest {
            owner,
            address: "1 Main Street".to_owned(),
            description: Some("Bulky cardboard".to_owned()),
            bin_details: Some(json!({ "organicLevel": 90 })),
            created_at: at(minute),
        }
    }

    #[tokio::test]
    async fn create_get_and_accept() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let owner = resident(&store, "ada@example.org").await;

        let created = store.create(request(owner, 0)).await.expect("created");
        assert_eq!(created.status, PickupStatus::Pending);

        store
            .set_status(created.id, PickupStatus::Accepted)
            .await
            .expect("accepted");
        let stored = store.get(created.id).await.expect("query").expect("found");
        assert_eq!(stored.status, PickupStatus::Accepted);
        assert_eq!(stored.bin_details, Some(json!({ "organicLevel": 90 })));
        assert!(store.get(PickupRequestId(42)).await.expect("query").is_none());
    }

    #[tokio::test]
    async fn listing_joins_requester_and_house_newest_first() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let housed = resident(&store, "ada@example.org").await;
        let homeless = resident(&store, "bob@example.org").await;
        let outsider = resident(&store, "eve@example.org").await;
        store
            .upsert_house(
                housed,
                NewHouse {
                    address: "1 Main Street".to_owned(),
                    latitude: 50.9,
                    longitude: 6.9,
                },
            )
            .await
            .expect("house");

        store.create(request(housed, 0)).await.expect("created");
        store.create(request(homeless, 5)).await.expect("created");
        store.create(request(outsider, 9)).await.expect("created");

        let listed = store
            .for_owners(&[housed, homeless])
            .await
            .expect("query");
        let owners: Vec<UserId> = listed.iter().map(|view| view.request.owner).collect();
        assert_eq!(owners, [homeless, housed]);

        let first = listed.first().expect("newest");
        assert_eq!(first.requester_email, "bob@example.org");
        assert!(first.house.is_none());
        let last = listed.last().expect("oldest");
        assert_eq!(
            last.house.as_ref().map(|house| house.owner),
            Some(housed)
        );
    }
}
