use crate::BoxError;

/// A physical connection handed out by a [`DataSource`].
pub trait Connection: Send + Sync {
    /// Switches the connection to `catalog` (schema, database).
    fn set_catalog(&self, catalog: &str) -> Result<(), BoxError>;
}

/// A physical connection pool.
pub trait DataSource: Send + Sync {
    type Connection: Connection;

    fn connection(&self) -> Result<Self::Connection, BoxError>;

    fn connection_with_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Self::Connection, BoxError>;

    /// Releases the pool. Called when the datasource is replaced, removed or
    /// the router is shut down.
    fn close(&self) {}
}
