use std::path::PathBuf;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `spin-pk` can produce.
///
/// Every variant except [`Error::ClockMovedBackwards`] and
/// [`Error::TimeOverflow`] is a configuration error: it surfaces once at
/// startup and is never retried. A generator that
/// cannot resolve its machine id refuses to start rather than risk colliding
/// with another node.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The provider's init params did not follow its `key=value` grammar.
    #[error("{provider}: illegal init params `{params}`")]
    InvalidInitParams {
        provider: &'static str,
        params: String,
    },

    /// The provider was asked for a machine id before a successful `init`.
    #[error("{provider} has not been initialized")]
    Uninitialized { provider: &'static str },

    /// A machine id was found but is not a number in `[0, 1023]`.
    #[error("machine id from {source_name} must be a number in [0, 1023], got `{value}`")]
    InvalidMachineId { source_name: String, value: String },

    /// An explicitly named configuration file is missing or unreadable.
    #[error("configuration file {path:?} could not be read: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    /// The local IP has no entry in the configured IP table.
    #[error("local IP {ip} is not in the configured machine IP list {configured:?}")]
    UnknownHostIp { ip: String, configured: Vec<String> },

    /// The local host's IP address could not be determined.
    #[error("unable to determine the local IP address: {reason}")]
    LocalIpUnavailable { reason: String },

    /// The system clock returned a time unit earlier than the last one used.
    #[error("clock moved backwards, refusing to generate ids for {behind} {unit}(s)")]
    ClockMovedBackwards { behind: u64, unit: &'static str },

    /// The clock is past the last time unit the id layout can hold.
    #[error("time unit {time} exceeds the id time field (max {max} {unit}s since the epoch)")]
    TimeOverflow {
        time: u64,
        max: u64,
        unit: &'static str,
    },

    /// A provider name did not match any known [`crate::ProviderKind`].
    #[error("unknown machine id provider `{0}`")]
    UnknownProvider(String),

    /// A numeric enum value did not match any variant.
    #[error("unknown {kind} value {value}")]
    UnknownVariant { kind: &'static str, value: u64 },
}
