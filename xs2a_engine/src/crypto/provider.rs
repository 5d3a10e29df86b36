use thiserror::Error;

/// A named, versioned symmetric encryption algorithm.
///
/// Providers are stateless and may be shared between threads. The `key` argument is caller-supplied key material of
/// any length (the server secret, or a per-resource payload key); every provider derives its fixed-size cipher keys
/// from it deterministically, so the same key always decrypts what it encrypted.
///
/// Decrypting with the wrong key must return an error. It must never panic, and never hand back a plaintext.
pub trait CryptoProvider: Send + Sync {
    /// The stable version id of this provider. It travels with every identifier and session blob encrypted by it, so
    /// it must never change once data has been issued under it.
    fn id(&self) -> &str;

    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("The encryption key is too short. At least {0} bytes are required")]
    KeyTooShort(usize),
    #[error("Could not derive cipher keys: {0}")]
    KeyDerivation(String),
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("The ciphertext is malformed: {0}")]
    MalformedCiphertext(String),
    #[error("The ciphertext could not be authenticated. Either the key is wrong or the data was tampered with")]
    AuthenticationFailed,
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("No crypto provider is registered with id {0}")]
    UnknownProvider(String),
}
