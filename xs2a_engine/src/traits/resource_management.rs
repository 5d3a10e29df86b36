use crate::{
    db_types::{NewResource, ParentResource},
    security::EncryptedData,
    traits::StoreError,
};

/// Storage of the consents and payments that authorisations belong to, and of their encrypted session data.
#[allow(async_fn_in_trait)]
pub trait ResourceManagement {
    /// Stores a new resource in the `RECEIVED` status. Fails with [`StoreError::ResourceAlreadyExists`] if the
    /// internal id is taken.
    async fn insert_resource(&self, resource: NewResource) -> Result<ParentResource, StoreError>;

    async fn fetch_resource(&self, internal_id: &str) -> Result<Option<ParentResource>, StoreError>;

    async fn fetch_resource_by_encrypted_id(&self, encrypted_id: &str) -> Result<Option<ParentResource>, StoreError>;

    /// Session data is addressed by the resource's encrypted identifier. The data is stored exactly as given.
    async fn fetch_session_data(&self, encrypted_id: &str) -> Result<Option<EncryptedData>, StoreError>;

    async fn store_session_data(&self, encrypted_id: &str, data: EncryptedData) -> Result<(), StoreError>;
}
