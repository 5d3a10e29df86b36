use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewResource, ParentResource, ServiceType},
    security::{ConsentDataCodec, EncryptedIdentifier},
    traits::ResourceManagement,
    xs2a_api::errors::ResourceApiError,
};

/// `ResourceApi` registers consents and payments with the engine and hands out their encrypted identifiers.
///
/// Internal ids are never exposed. Everything a TPP sees is the [`EncryptedIdentifier`] issued by
/// [`ResourceApi::register_resource`].
pub struct ResourceApi<B> {
    db: B,
    codec: ConsentDataCodec,
}

impl<B> Debug for ResourceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResourceApi")
    }
}

impl<B> ResourceApi<B> {
    pub fn new(db: B, codec: ConsentDataCodec) -> Self {
        Self { db, codec }
    }
}

impl<B> ResourceApi<B>
where B: ResourceManagement
{
    /// Issues a fresh encrypted identifier for the resource and stores it in the `RECEIVED` status.
    pub async fn register_resource(
        &self,
        internal_id: &str,
        service_type: ServiceType,
    ) -> Result<(EncryptedIdentifier, ParentResource), ResourceApiError> {
        let encrypted_id = self
            .codec
            .identifiers()
            .encrypt_identifier(internal_id)
            .ok_or_else(|| ResourceApiError::IdentifierEncryptionFailed(internal_id.to_string()))?;
        let resource = NewResource {
            internal_id: internal_id.to_string(),
            encrypted_id: encrypted_id.to_string(),
            service_type,
        };
        let resource = self.db.insert_resource(resource).await?;
        info!("🔄️ {service_type} resource {internal_id} registered");
        Ok((encrypted_id, resource))
    }

    /// Decrypts the identifier and loads the resource it points to.
    ///
    /// Both an undecryptable identifier and an unknown internal id are reported without saying which part failed.
    pub async fn resolve_resource(&self, encrypted_id: &str) -> Result<ParentResource, ResourceApiError> {
        let decrypted =
            self.codec.identifiers().decrypt_identifier(encrypted_id).ok_or(ResourceApiError::InvalidIdentifier)?;
        self.db.fetch_resource(&decrypted.internal_id).await?.ok_or(ResourceApiError::ResourceNotFound)
    }

    /// Encrypts the ASPSP session data handed over at resource creation and stores it against the identifier.
    pub async fn attach_session_data(&self, encrypted_id: &str, data: &[u8]) -> Result<(), ResourceApiError> {
        let resource = self.resolve_resource(encrypted_id).await?;
        let encrypted = self
            .codec
            .encrypt_session_data(&resource.encrypted_id, data)
            .ok_or(ResourceApiError::SessionDataEncryptionFailed)?;
        self.db.store_session_data(&resource.encrypted_id, encrypted).await?;
        debug!("🔄️ Session data attached to resource {}", resource.internal_id);
        Ok(())
    }
}
