use crate::traits::{AuthorisationManagement, ResourceManagement, StoreError};

/// The complete store contract required by the SCA engine.
#[allow(async_fn_in_trait)]
pub trait ConsentManagementDatabase: Clone + AuthorisationManagement + ResourceManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
