/// CRUD access to file hierarchy records
use crate::error::Result;
use crate::files::model::{FileBody, FileId, FileRecord, UserId};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fixed listing window
pub const PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct FileStore {
    db: SqlitePool,
}

fn row_to_record(row: &SqliteRow) -> Result<FileRecord> {
    let id: String = row.try_get("id")?;
    let owner_id: String = row.try_get("owner_id")?;
    let parent_id: Option<String> = row.try_get("parent_id")?;
    let kind: String = row.try_get("kind")?;
    let local_path: Option<String> = row.try_get("local_path")?;

    let parse = |s: &str| {
        Uuid::parse_str(s)
            .map_err(|e| crate::error::Error::Internal(format!("Corrupt file row id: {}", e)))
    };

    Ok(FileRecord {
        id: parse(&id)?,
        owner_id: parse(&owner_id)?,
        name: row.try_get("name")?,
        parent_id: parent_id.as_deref().map(parse).transpose()?,
        is_public: row.try_get("is_public")?,
        body: FileBody::from_columns(&kind, local_path)?,
        created_at: row.try_get("created_at")?,
    })
}

const SELECT_COLUMNS: &str =
    "id, owner_id, name, kind, parent_id, is_public, local_path, created_at";

impl FileStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Persist a record and return it with its generated identity.
    /// Callers go through the validated create path; this does not
    /// re-check hierarchy integrity.
    pub async fn insert(
        &self,
        owner_id: UserId,
        name: &str,
        parent_id: Option<FileId>,
        is_public: bool,
        body: FileBody,
    ) -> Result<FileRecord> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO files (id, owner_id, name, kind, parent_id, is_public, local_path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .bind(name)
        .bind(body.kind().as_str())
        .bind(parent_id.map(|p| p.to_string()))
        .bind(is_public)
        .bind(body.local_path().map(|p| p.to_string_lossy().into_owned()))
        .bind(created_at)
        .execute(&self.db)
        .await?;

        Ok(FileRecord {
            id,
            owner_id,
            name: name.to_string(),
            parent_id,
            is_public,
            body,
            created_at,
        })
    }

    /// Raw lookup by identity, no ownership filter
    pub async fn find_by_id(&self, id: FileId) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM files WHERE id = ?1",
            SELECT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Owner-scoped lookup. Fails closed: a malformed id and a record
    /// owned by someone else both yield `None`, with no distinction.
    pub async fn find_user_file_by_id(
        &self,
        owner_id: UserId,
        raw_id: &str,
    ) -> Result<Option<FileRecord>> {
        let Ok(id) = Uuid::parse_str(raw_id) else {
            return Ok(None);
        };

        let row = sqlx::query(&format!(
            "SELECT {} FROM files WHERE id = ?1 AND owner_id = ?2",
            SELECT_COLUMNS
        ))
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// One listing window of an owner's children under `parent_id`
    /// (`None` lists the root level).
    ///
    /// Ordering is creation order with the record id as tie-break, so
    /// pagination over a fixed record set is stable and duplicate-free.
    pub async fn list_by_parent(
        &self,
        owner_id: UserId,
        parent_id: Option<FileId>,
        page: u32,
    ) -> Result<Vec<FileRecord>> {
        let offset = i64::from(page) * i64::from(PAGE_SIZE);

        let rows = match parent_id {
            Some(parent) => {
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM files
                    WHERE owner_id = ?1 AND parent_id = ?2
                    ORDER BY created_at ASC, id ASC
                    LIMIT ?3 OFFSET ?4
                    "#,
                    SELECT_COLUMNS
                ))
                .bind(owner_id.to_string())
                .bind(parent.to_string())
                .bind(i64::from(PAGE_SIZE))
                .bind(offset)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    SELECT {} FROM files
                    WHERE owner_id = ?1 AND parent_id IS NULL
                    ORDER BY created_at ASC, id ASC
                    LIMIT ?2 OFFSET ?3
                    "#,
                    SELECT_COLUMNS
                ))
                .bind(owner_id.to_string())
                .bind(i64::from(PAGE_SIZE))
                .bind(offset)
                .fetch_all(&self.db)
                .await?
            }
        };

        rows.iter().map(row_to_record).collect()
    }

    /// Atomically set the visibility flag on a record matching both id
    /// and owner. Zero rows matched yields `None`, covering both "does
    /// not exist" and "not owned by caller".
    pub async fn update_publication(
        &self,
        owner_id: UserId,
        raw_id: &str,
        is_public: bool,
    ) -> Result<Option<FileRecord>> {
        let Ok(id) = Uuid::parse_str(raw_id) else {
            return Ok(None);
        };

        let result = sqlx::query(
            r#"
            UPDATE files SET is_public = ?1
            WHERE id = ?2 AND owner_id = ?3
            "#,
        )
        .bind(is_public)
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    /// Number of file records
    pub async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM files")
            .fetch_one(&self.db)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }
}
