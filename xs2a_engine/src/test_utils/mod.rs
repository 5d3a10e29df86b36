//! Helpers for testing the engine and the code built on top of it.
mod memory_db;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
mod spi;

pub use memory_db::MemoryDatabase;
pub use spi::{ScriptedSpi, SpiCall, SpiMethod};
