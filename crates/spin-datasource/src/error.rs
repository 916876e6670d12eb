use crate::CurrentDatasourceInfo;

/// A boxed error from a collaborator: an interceptor, a pool or a connection.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `spin-datasource` can produce.
///
/// [`Error::SwitchRejected`] is recoverable: the stack mutation that caused it
/// has already been rolled back when the caller sees it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A datasource name was empty or blank.
    #[error("datasource name must not be empty")]
    EmptyDatasourceName,

    /// The registered interceptor vetoed (or failed on) a switch.
    #[error("current context does not support switching datasource from {from} to {to}")]
    SwitchRejected {
        from: CurrentDatasourceInfo,
        to: CurrentDatasourceInfo,
        #[source]
        reason: Option<BoxError>,
    },

    /// `poll` was called with nothing pushed on this thread.
    #[error("no datasource has been pushed on this thread")]
    EmptyStack,

    /// Strict routing was asked for an unregistered datasource.
    #[error("could not find a datasource named `{0}`")]
    DatasourceNotFound(String),

    /// Neither a datasource nor a group carries the primary name.
    #[error("could not find the primary datasource `{0}`")]
    PrimaryNotFound(String),

    /// The primary datasource cannot be removed.
    #[error("could not remove the primary datasource `{0}`")]
    RemovePrimary(String),

    /// The underlying pool failed to hand out a connection.
    #[error("failed to get a connection from datasource `{datasource}`")]
    Connection {
        datasource: String,
        #[source]
        source: BoxError,
    },

    /// The connection rejected the catalog switch.
    #[error("failed to use catalog `{catalog}` on datasource `{datasource}`")]
    Catalog {
        datasource: String,
        catalog: String,
        #[source]
        source: BoxError,
    },
}
