//! Account storage.

use async_trait::async_trait;
use binwatch_core::{AccountPort, NewUser, PortError, Role, User, UserId};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use crate::{SqliteStore, conversion_error};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, authority_id";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: role.parse::<Role>().map_err(|err| conversion_error(4, err))?,
        authority_id: row.get::<_, Option<i64>>(5)?.map(UserId),
    })
}

impl SqliteStore {
    async fn users_where(
        &self,
        clause: &'static str,
        arg: Option<i64>,
    ) -> Result<Vec<User>, PortError> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE {clause} ORDER BY id"
            ))?;
            let rows = stmt.query_map(params_from_iter(arg), user_from_row)?;
            rows.collect()
        })
        .await
    }
}

#[async_trait]
impl AccountPort for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User, PortError> {
        let created = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO users (name, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
                    params![user.name, user.email, user.password_hash, user.role.as_str()],
                )?;
                let id = conn.last_insert_rowid();
                Ok(User {
                    id: UserId(id),
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    role: user.role,
                    authority_id: None,
                })
            })
            .await;
        match created {
            Err(PortError::Duplicate(_)) => Err(PortError::Duplicate("email")),
            other => other,
        }
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, PortError> {
        let email = email.to_owned();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                [email],
                user_from_row,
            )
            .optional()
        })
        .await
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, PortError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id.0],
                user_from_row,
            )
            .optional()
        })
        .await
    }

    async fn residents_of(&self, authority: UserId) -> Result<Vec<User>, PortError> {
        self.users_where("role = 'user' AND authority_id = ?1", Some(authority.0))
            .await
    }

    async fn authorities(&self) -> Result<Vec<User>, PortError> {
        self.users_where("role = 'authority'", None).await
    }

    async fn unassigned_residents(&self) -> Result<Vec<User>, PortError> {
        self.users_where("role = 'user' AND authority_id IS NULL", None)
            .await
    }

    async fn assign(&self, resident: UserId, authority: UserId) -> Result<(), PortError> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE users SET authority_id = ?1 WHERE id = ?2",
                [authority.0, resident.0],
            )
            .map(drop)
        })
        .await
    }
}
