//! # Crypto providers
//!
//! Every piece of data the engine encrypts goes through a [`CryptoProvider`]: a symmetric algorithm with a stable
//! version id. Providers are looked up by id in the [`CryptoProviderRegistry`], which also knows the current default
//! provider for identifiers and for session data.
//!
//! | Id                   | Provider                 | Notes                                              |
//! |----------------------|--------------------------|----------------------------------------------------|
//! | `aes-cbc-v1`         | [`AesCbcCryptoProvider`] | random IV, encrypt-then-MAC. Default for ids       |
//! | `aes-ecb-v1`         | [`AesEcbCryptoProvider`] | deterministic, legacy                              |
//! | `jwe-dir-a256gcm-v1` | [`JweCryptoProvider`]    | JWE compact, AES-256-GCM. Default for session data |
//!
//! All providers derive their cipher keys from the caller's key with HKDF-SHA256 (see [`key_derivation`]), and all of
//! them authenticate the ciphertext, so decrypting with the wrong key is an error rather than garbage output.
mod aes_cbc;
mod aes_ecb;
mod jwe;
pub mod key_derivation;
mod provider;
mod registry;
mod tag;

pub use aes_cbc::AesCbcCryptoProvider;
pub use aes_ecb::AesEcbCryptoProvider;
pub use jwe::JweCryptoProvider;
pub use provider::{CryptoError, CryptoProvider};
pub use registry::CryptoProviderRegistry;
