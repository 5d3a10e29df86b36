use anyhow::{anyhow, Result};
use xs2a_engine::{security::EncryptedIdentifier, AuthorisationApi, EngineConfig, SqliteDatabase};

use crate::{formatting::format_authorisations, DecryptIdParams, EncryptIdParams};

pub fn encrypt_id(config: &EngineConfig, params: EncryptIdParams) -> Result<()> {
    let service = config.identifier_service()?;
    let id = service
        .encrypt_identifier(&params.internal_id)
        .ok_or_else(|| anyhow!("'{}' cannot be encrypted. Check the logs for details", params.internal_id))?;
    println!("{id}");
    Ok(())
}

pub fn decrypt_id(config: &EngineConfig, params: DecryptIdParams) -> Result<()> {
    let service = config.identifier_service()?;
    let decrypted = service
        .decrypt_identifier(&params.encrypted_id)
        .ok_or_else(|| anyhow!("The identifier could not be decrypted with the configured server keys"))?;
    let encrypted = EncryptedIdentifier::from(params.encrypted_id.as_str());
    println!("Internal id: {}", decrypted.internal_id);
    println!("Provider:    {}", encrypted.provider_id().unwrap_or_default());
    if params.reveal {
        println!("Payload key: {}", decrypted.payload_key.reveal());
    } else {
        println!("Payload key: {}", decrypted.payload_key);
    }
    Ok(())
}

pub async fn list_authorisations(config: &EngineConfig, params: DecryptIdParams) -> Result<()> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 1).await?;
    let api = AuthorisationApi::new(db, config.identifier_service()?);
    let authorisations = api.fetch_authorisations_for_resource(&params.encrypted_id).await?;
    println!("{}", format_authorisations(&authorisations));
    Ok(())
}
