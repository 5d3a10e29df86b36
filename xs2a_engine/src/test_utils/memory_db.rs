//! An in-memory store with the same semantics as the SQLite backend, including optimistic locking.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;

use crate::{
    db_types::{Authorisation, NewAuthorisation, NewResource, ParentResource, ResourceStatus},
    security::EncryptedData,
    traits::{
        AuthorisationManagement,
        AuthorisationTransition,
        ConsentManagementDatabase,
        ResourceManagement,
        StoreError,
    },
};

#[derive(Debug, Default)]
struct Tables {
    resources: HashMap<String, ParentResource>,
    session_data: HashMap<String, EncryptedData>,
    authorisations: Vec<Authorisation>,
    commits: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The number of transitions committed so far.
    pub fn commit_count(&self) -> usize {
        self.tables().commits
    }

    /// Simulates a write by another node, without changing anything but the version.
    pub fn bump_version(&self, authorisation_id: &str) {
        let mut tables = self.tables();
        if let Some(auth) = tables.authorisations.iter_mut().find(|a| a.authorisation_id == authorisation_id) {
            auth.version += 1;
        }
    }

    /// Moves the expiry time of an authorisation into the past.
    pub fn expire(&self, authorisation_id: &str) {
        let mut tables = self.tables();
        if let Some(auth) = tables.authorisations.iter_mut().find(|a| a.authorisation_id == authorisation_id) {
            auth.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    pub fn remove_resource(&self, internal_id: &str) {
        let mut tables = self.tables();
        if let Some(resource) = tables.resources.remove(internal_id) {
            tables.session_data.remove(&resource.encrypted_id);
        }
    }
}

impl ConsentManagementDatabase for MemoryDatabase {
    fn url(&self) -> &str {
        "memory://"
    }
}

impl AuthorisationManagement for MemoryDatabase {
    async fn fetch_authorisation(&self, authorisation_id: &str) -> Result<Option<Authorisation>, StoreError> {
        Ok(self.tables().authorisations.iter().find(|a| a.authorisation_id == authorisation_id).cloned())
    }

    async fn insert_authorisation(&self, authorisation: NewAuthorisation) -> Result<Authorisation, StoreError> {
        let mut tables = self.tables();
        if tables.authorisations.iter().any(|a| a.authorisation_id == authorisation.authorisation_id) {
            return Err(StoreError::AuthorisationAlreadyExists(authorisation.authorisation_id));
        }
        if !tables.resources.contains_key(&authorisation.parent_id) {
            return Err(StoreError::ResourceNotFound(authorisation.parent_id));
        }
        let now = Utc::now();
        let result = Authorisation {
            sca_status: authorisation.initial_status(),
            authorisation_id: authorisation.authorisation_id,
            parent_id: authorisation.parent_id,
            authorisation_kind: authorisation.authorisation_kind,
            sca_approach: authorisation.sca_approach,
            psu: authorisation.psu,
            chosen_sca_method: None,
            available_sca_methods: vec![],
            error_code: None,
            created_at: now,
            updated_at: now,
            expires_at: authorisation.expires_at,
            version: 0,
        };
        tables.authorisations.push(result.clone());
        Ok(result)
    }

    async fn fetch_authorisations_for_resource(&self, parent_id: &str) -> Result<Vec<Authorisation>, StoreError> {
        Ok(self.tables().authorisations.iter().filter(|a| a.parent_id == parent_id).cloned().collect())
    }

    async fn commit_transition(&self, transition: AuthorisationTransition) -> Result<Authorisation, StoreError> {
        let mut tables = self.tables();
        let index = tables
            .authorisations
            .iter()
            .position(|a| a.authorisation_id == transition.authorisation_id)
            .ok_or_else(|| StoreError::AuthorisationNotFound(transition.authorisation_id.clone()))?;
        if tables.authorisations[index].version != transition.expected_version {
            return Err(StoreError::VersionConflict {
                authorisation_id: transition.authorisation_id,
                expected_version: transition.expected_version,
            });
        }
        let now = Utc::now();
        let parent_id = tables.authorisations[index].parent_id.clone();
        if let Some(status) = transition.resource_status {
            let resource =
                tables.resources.get_mut(&parent_id).ok_or_else(|| StoreError::ResourceNotFound(parent_id.clone()))?;
            resource.status = status;
            resource.updated_at = now;
        }
        if let Some(update) = transition.session_data {
            tables.session_data.insert(update.encrypted_id, update.data);
        }
        let auth = &mut tables.authorisations[index];
        auth.sca_status = transition.sca_status;
        auth.sca_approach = transition.sca_approach;
        auth.psu = transition.psu;
        auth.chosen_sca_method = transition.chosen_sca_method;
        auth.available_sca_methods = transition.available_sca_methods;
        auth.error_code = transition.error_code;
        auth.updated_at = now;
        auth.version += 1;
        let result = auth.clone();
        tables.commits += 1;
        Ok(result)
    }
}

impl ResourceManagement for MemoryDatabase {
    async fn insert_resource(&self, resource: NewResource) -> Result<ParentResource, StoreError> {
        let mut tables = self.tables();
        if tables.resources.contains_key(&resource.internal_id) {
            return Err(StoreError::ResourceAlreadyExists(resource.internal_id));
        }
        let now = Utc::now();
        let result = ParentResource {
            internal_id: resource.internal_id.clone(),
            encrypted_id: resource.encrypted_id,
            service_type: resource.service_type,
            status: ResourceStatus::Received,
            created_at: now,
            updated_at: now,
        };
        tables.resources.insert(resource.internal_id, result.clone());
        Ok(result)
    }

    async fn fetch_resource(&self, internal_id: &str) -> Result<Option<ParentResource>, StoreError> {
        Ok(self.tables().resources.get(internal_id).cloned())
    }

    async fn fetch_resource_by_encrypted_id(&self, encrypted_id: &str) -> Result<Option<ParentResource>, StoreError> {
        Ok(self.tables().resources.values().find(|r| r.encrypted_id == encrypted_id).cloned())
    }

    async fn fetch_session_data(&self, encrypted_id: &str) -> Result<Option<EncryptedData>, StoreError> {
        Ok(self.tables().session_data.get(encrypted_id).cloned())
    }

    async fn store_session_data(&self, encrypted_id: &str, data: EncryptedData) -> Result<(), StoreError> {
        self.tables().session_data.insert(encrypted_id.to_string(), data);
        Ok(())
    }
}
