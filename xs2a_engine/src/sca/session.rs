use log::*;

use crate::security::{ConsentDataCodec, DecryptedData, EncryptedData};

/// The session data could not be decrypted or re-encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDataUnavailable;

/// Gives the state handlers access to the plaintext session data of one resource, and collects what the ASPSP
/// returns.
///
/// The stored blob is only decrypted when a handler first asks for it, so terminal and pure handlers never touch the
/// crypto layer. Updated data is encrypted immediately and held until the dispatcher commits it.
pub struct SessionDataProvider<'a> {
    codec: &'a ConsentDataCodec,
    encrypted_id: &'a str,
    stored: Option<EncryptedData>,
    plaintext: Option<DecryptedData>,
    pending: Option<EncryptedData>,
}

impl<'a> SessionDataProvider<'a> {
    pub fn new(codec: &'a ConsentDataCodec, encrypted_id: &'a str, stored: Option<EncryptedData>) -> Self {
        Self { codec, encrypted_id, stored, plaintext: None, pending: None }
    }

    /// The current plaintext session data. Empty if the resource has none yet.
    pub fn current(&mut self) -> Result<DecryptedData, SessionDataUnavailable> {
        if let Some(plaintext) = &self.plaintext {
            return Ok(plaintext.clone());
        }
        let plaintext = match &self.stored {
            None => DecryptedData::new(vec![]),
            Some(stored) => self.codec.decrypt_session_data(self.encrypted_id, stored).ok_or_else(|| {
                warn!("🔐️ Stored session data could not be decrypted");
                SessionDataUnavailable
            })?,
        };
        self.plaintext = Some(plaintext.clone());
        Ok(plaintext)
    }

    /// Records session data returned by the ASPSP. `None` means the ASPSP did not change it.
    pub fn update(&mut self, data: Option<Vec<u8>>) -> Result<(), SessionDataUnavailable> {
        let Some(data) = data else {
            return Ok(());
        };
        let encrypted = self.codec.encrypt_session_data(self.encrypted_id, &data).ok_or_else(|| {
            warn!("🔐️ Session data returned by the ASPSP could not be encrypted");
            SessionDataUnavailable
        })?;
        self.plaintext = Some(DecryptedData::new(data));
        self.pending = Some(encrypted);
        Ok(())
    }

    /// The re-encrypted session data that still has to be persisted.
    pub fn take_pending(&mut self) -> Option<EncryptedData> {
        self.pending.take()
    }
}
