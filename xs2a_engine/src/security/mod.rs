//! # Envelope encryption of identifiers and session data
//!
//! Internal consent and payment ids never leave the engine in the clear. [`IdentifierEncryptionService`] wraps each one,
//! together with a random payload key, under the server secret. [`ConsentDataCodec`] uses that payload key to protect
//! the ASPSP session data attached to the resource.
//!
//! Both services are fail-closed: every failure is reported as `None` and logged, never as a detailed error.
mod identifier;
mod session_data;

pub use identifier::{DecryptedIdentifier, EncryptedIdentifier, IdentifierEncryptionService, PAYLOAD_KEY_LEN, SEPARATOR};
pub use session_data::{ConsentDataCodec, DecryptedData, EncryptedData};
