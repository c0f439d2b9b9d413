/// User records
///
/// Registration and authentication belong to the identity layer outside
/// this crate; the store here covers what the core consumes: lookup by
/// id for the welcome pipeline and counting for stats.
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// User record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Typed access to the users table
#[derive(Clone)]
pub struct UserStore {
    db: SqlitePool,
}

impl UserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a user. Called by the identity layer on registration.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(id.to_string())
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.db)
        .await?;

        Ok(User {
            id,
            email: email.to_string(),
            created_at,
        })
    }

    /// Find a user by identity. A malformed id yields `None`, same as a
    /// miss.
    pub async fn find_by_id(&self, raw_id: &str) -> Result<Option<User>> {
        let Ok(id) = Uuid::parse_str(raw_id) else {
            return Ok(None);
        };

        let row = sqlx::query(
            r#"
            SELECT id, email, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => {
                let id: String = row.try_get("id")?;
                Ok(Some(User {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| crate::error::Error::Internal(format!("Bad user id: {}", e)))?,
                    email: row.try_get("email")?,
                    created_at: row.try_get("created_at")?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Number of registered users
    pub async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.db)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }
}
