use chrono::{DateTime, Utc};
use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{Authorisation, NewAuthorisation, ScaStatus},
    traits::{AuthorisationTransition, StoreError},
};

#[derive(Debug, Clone, FromRow)]
struct AuthorisationRow {
    authorisation_id: String,
    parent_id: String,
    authorisation_kind: String,
    sca_status: String,
    sca_approach: String,
    psu: String,
    chosen_sca_method: Option<String>,
    available_sca_methods: String,
    error_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<AuthorisationRow> for Authorisation {
    type Error = StoreError;

    fn try_from(row: AuthorisationRow) -> Result<Self, Self::Error> {
        let sca_status =
            row.sca_status.parse::<ScaStatus>().map_err(|_| StoreError::UnknownScaStatus(row.sca_status.clone()))?;
        let corrupt = |e: crate::db_types::ConversionError| StoreError::CorruptRecord(e.to_string());
        Ok(Self {
            authorisation_kind: row.authorisation_kind.parse().map_err(corrupt)?,
            sca_approach: row.sca_approach.parse().map_err(corrupt)?,
            error_code: row.error_code.as_deref().map(str::parse).transpose().map_err(corrupt)?,
            psu: serde_json::from_str(&row.psu)?,
            chosen_sca_method: row.chosen_sca_method.as_deref().map(serde_json::from_str).transpose()?,
            available_sca_methods: serde_json::from_str(&row.available_sca_methods)?,
            sca_status,
            authorisation_id: row.authorisation_id,
            parent_id: row.parent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            version: row.version,
        })
    }
}

pub async fn insert(authorisation: NewAuthorisation, conn: &mut SqliteConnection) -> Result<Authorisation, StoreError> {
    let now = Utc::now();
    let id = authorisation.authorisation_id.clone();
    let row: AuthorisationRow = sqlx::query_as(
        r#"
            INSERT INTO authorisations (
                authorisation_id, parent_id, authorisation_kind, sca_status, sca_approach, psu,
                created_at, updated_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(authorisation.authorisation_id.as_str())
    .bind(authorisation.parent_id.as_str())
    .bind(authorisation.authorisation_kind.to_string())
    .bind(authorisation.initial_status().to_string())
    .bind(authorisation.sca_approach.to_string())
    .bind(serde_json::to_string(&authorisation.psu)?)
    .bind(now)
    .bind(authorisation.expires_at)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => StoreError::AuthorisationAlreadyExists(id),
        sqlx::Error::Database(err) if err.is_foreign_key_violation() => {
            StoreError::ResourceNotFound(authorisation.parent_id.clone())
        },
        _ => StoreError::from(e),
    })?;
    row.try_into()
}

pub async fn fetch(authorisation_id: &str, conn: &mut SqliteConnection) -> Result<Option<Authorisation>, StoreError> {
    let row: Option<AuthorisationRow> = sqlx::query_as("SELECT * FROM authorisations WHERE authorisation_id = ?")
        .bind(authorisation_id)
        .fetch_optional(conn)
        .await?;
    row.map(Authorisation::try_from).transpose()
}

pub async fn fetch_for_resource(parent_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Authorisation>, StoreError> {
    let rows: Vec<AuthorisationRow> =
        sqlx::query_as("SELECT * FROM authorisations WHERE parent_id = ? ORDER BY created_at ASC, rowid ASC")
            .bind(parent_id)
            .fetch_all(conn)
            .await?;
    rows.into_iter().map(Authorisation::try_from).collect()
}

/// Writes the authorisation fields of the transition, if and only if the stored version is the expected one.
pub async fn update_with_version(
    transition: &AuthorisationTransition,
    conn: &mut SqliteConnection,
) -> Result<Authorisation, StoreError> {
    let chosen = transition.chosen_sca_method.as_ref().map(serde_json::to_string).transpose()?;
    let row: Option<AuthorisationRow> = sqlx::query_as(
        r#"
            UPDATE authorisations SET
                sca_status = $1,
                sca_approach = $2,
                psu = $3,
                chosen_sca_method = $4,
                available_sca_methods = $5,
                error_code = $6,
                updated_at = $7,
                version = version + 1
            WHERE authorisation_id = $8 AND version = $9
            RETURNING *;
        "#,
    )
    .bind(transition.sca_status.to_string())
    .bind(transition.sca_approach.to_string())
    .bind(serde_json::to_string(&transition.psu)?)
    .bind(chosen)
    .bind(serde_json::to_string(&transition.available_sca_methods)?)
    .bind(transition.error_code.map(|c| c.to_string()))
    .bind(Utc::now())
    .bind(transition.authorisation_id.as_str())
    .bind(transition.expected_version)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => row.try_into(),
        None => {
            let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM authorisations WHERE authorisation_id = ?")
                .bind(transition.authorisation_id.as_str())
                .fetch_optional(conn)
                .await?;
            match exists {
                None => Err(StoreError::AuthorisationNotFound(transition.authorisation_id.clone())),
                Some(version) => {
                    warn!(
                        "🗃️ Authorisation {} is at version {version}, but version {} was expected",
                        transition.authorisation_id, transition.expected_version
                    );
                    Err(StoreError::VersionConflict {
                        authorisation_id: transition.authorisation_id.clone(),
                        expected_version: transition.expected_version,
                    })
                },
            }
        },
    }
}
