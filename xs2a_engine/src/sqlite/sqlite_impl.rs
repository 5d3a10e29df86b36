//! `SqliteDatabase` is a concrete implementation of an XS2A engine storage backend.
//!
//! It uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{authorisations, db_url, new_pool, resources};
use crate::{
    db_types::{Authorisation, NewAuthorisation, NewResource, ParentResource},
    security::EncryptedData,
    traits::{
        AuthorisationManagement,
        AuthorisationTransition,
        ConsentManagementDatabase,
        ResourceManagement,
        StoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl ConsentManagementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AuthorisationManagement for SqliteDatabase {
    async fn fetch_authorisation(&self, authorisation_id: &str) -> Result<Option<Authorisation>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        authorisations::fetch(authorisation_id, &mut conn).await
    }

    async fn insert_authorisation(&self, authorisation: NewAuthorisation) -> Result<Authorisation, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = authorisations::insert(authorisation, &mut conn).await?;
        debug!("🗃️ Authorisation {} has been saved with status {}", result.authorisation_id, result.sca_status);
        Ok(result)
    }

    async fn fetch_authorisations_for_resource(&self, parent_id: &str) -> Result<Vec<Authorisation>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        authorisations::fetch_for_resource(parent_id, &mut conn).await
    }

    /// Takes the outcome of an SCA step, and in a single atomic transaction,
    /// * updates the authorisation, provided nobody else has committed a newer version,
    /// * updates the parent resource status, if it changed,
    /// * replaces the encrypted session data, if the step produced any.
    async fn commit_transition(&self, transition: AuthorisationTransition) -> Result<Authorisation, StoreError> {
        let mut tx = self.pool.begin().await?;
        let authorisation = authorisations::update_with_version(&transition, &mut tx).await?;
        if let Some(status) = transition.resource_status {
            let resource = resources::update_status(&authorisation.parent_id, status, &mut tx).await?;
            debug!("🗃️ Resource {} is now {}", resource.internal_id, resource.status);
        }
        if let Some(update) = transition.session_data {
            resources::upsert_session_data(&update.encrypted_id, update.data, &mut tx).await?;
            trace!("🗃️ Session data for authorisation {} replaced", authorisation.authorisation_id);
        }
        tx.commit().await?;
        Ok(authorisation)
    }
}

impl ResourceManagement for SqliteDatabase {
    async fn insert_resource(&self, resource: NewResource) -> Result<ParentResource, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = resources::insert(resource, &mut conn).await?;
        debug!("🗃️ {} resource {} has been saved", result.service_type, result.internal_id);
        Ok(result)
    }

    async fn fetch_resource(&self, internal_id: &str) -> Result<Option<ParentResource>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        resources::fetch(internal_id, &mut conn).await
    }

    async fn fetch_resource_by_encrypted_id(&self, encrypted_id: &str) -> Result<Option<ParentResource>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        resources::fetch_by_encrypted_id(encrypted_id, &mut conn).await
    }

    async fn fetch_session_data(&self, encrypted_id: &str) -> Result<Option<EncryptedData>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        resources::fetch_session_data(encrypted_id, &mut conn).await
    }

    async fn store_session_data(&self, encrypted_id: &str, data: EncryptedData) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        resources::upsert_session_data(encrypted_id, data, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
