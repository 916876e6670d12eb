use core::time::Duration;

/// Epoch of every distributed id: 2015-01-01 00:00:00 UTC+8.
pub const SPIN_EPOCH: Duration = Duration::from_millis(1_420_041_600_000);

/// A source of wall-clock time.
///
/// Generators take their clock as a parameter so that tests can drive time
/// explicitly.
///
/// # Example
///
/// ```
/// use spin_pk::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_420_041_601_234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_420_041_601_234);
/// ```
pub trait TimeSource {
    /// Returns milliseconds since the UNIX epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
