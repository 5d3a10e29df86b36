use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{NewResource, ParentResource, ResourceStatus},
    security::EncryptedData,
    traits::StoreError,
};

#[derive(Debug, Clone, FromRow)]
struct ResourceRow {
    internal_id: String,
    encrypted_id: String,
    service_type: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for ParentResource {
    type Error = StoreError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            service_type: row.service_type.parse().map_err(|e| StoreError::CorruptRecord(format!("{e}")))?,
            status: row.status.parse().map_err(|e| StoreError::CorruptRecord(format!("{e}")))?,
            internal_id: row.internal_id,
            encrypted_id: row.encrypted_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn insert(resource: NewResource, conn: &mut SqliteConnection) -> Result<ParentResource, StoreError> {
    let now = Utc::now();
    let internal_id = resource.internal_id.clone();
    let row: ResourceRow = sqlx::query_as(
        r#"
            INSERT INTO resources (internal_id, encrypted_id, service_type, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(resource.internal_id)
    .bind(resource.encrypted_id)
    .bind(resource.service_type.to_string())
    .bind(ResourceStatus::Received.to_string())
    .bind(now)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => StoreError::ResourceAlreadyExists(internal_id),
        _ => StoreError::from(e),
    })?;
    row.try_into()
}

pub async fn fetch(internal_id: &str, conn: &mut SqliteConnection) -> Result<Option<ParentResource>, StoreError> {
    let row: Option<ResourceRow> = sqlx::query_as("SELECT * FROM resources WHERE internal_id = ?")
        .bind(internal_id)
        .fetch_optional(conn)
        .await?;
    row.map(ParentResource::try_from).transpose()
}

pub async fn fetch_by_encrypted_id(
    encrypted_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ParentResource>, StoreError> {
    let row: Option<ResourceRow> = sqlx::query_as("SELECT * FROM resources WHERE encrypted_id = ?")
        .bind(encrypted_id)
        .fetch_optional(conn)
        .await?;
    row.map(ParentResource::try_from).transpose()
}

pub async fn update_status(
    internal_id: &str,
    status: ResourceStatus,
    conn: &mut SqliteConnection,
) -> Result<ParentResource, StoreError> {
    let row: Option<ResourceRow> =
        sqlx::query_as("UPDATE resources SET status = $1, updated_at = $2 WHERE internal_id = $3 RETURNING *")
            .bind(status.to_string())
            .bind(Utc::now())
            .bind(internal_id)
            .fetch_optional(conn)
            .await?;
    row.ok_or_else(|| StoreError::ResourceNotFound(internal_id.to_string()))?.try_into()
}

pub async fn fetch_session_data(
    encrypted_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<EncryptedData>, StoreError> {
    let data: Option<Vec<u8>> = sqlx::query_scalar("SELECT data FROM session_data WHERE encrypted_id = ?")
        .bind(encrypted_id)
        .fetch_optional(conn)
        .await?;
    Ok(data.map(EncryptedData::from_bytes))
}

pub async fn upsert_session_data(
    encrypted_id: &str,
    data: EncryptedData,
    conn: &mut SqliteConnection,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
            INSERT INTO session_data (encrypted_id, data, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT (encrypted_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at;
        "#,
    )
    .bind(encrypted_id)
    .bind(data.into_bytes())
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}
