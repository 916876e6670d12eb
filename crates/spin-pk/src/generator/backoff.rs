use core::time::Duration;

/// Backoff strategies for waiting out an exhausted sequence.
///
/// When every sequence value of the current time unit has been handed out,
/// [`crate::DistributedIdGenerator::next_id`] calls one of these strategies
/// before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Busy-waits in a tight loop.
    ///
    /// Offers maximum throughput at the cost of high CPU usage.
    Spin,

    /// Yields to the OS scheduler to allow other threads to run.
    #[default]
    Yield,

    /// Sleeps for the time remaining in the current time unit.
    ///
    /// Lowest CPU usage; second-granularity ids can sleep up to a second.
    Sleep,
}

impl Backoff {
    pub(crate) fn wait(self, yield_for: u64) {
        match self {
            Self::Spin => core::hint::spin_loop(),
            Self::Yield => std::thread::yield_now(),
            Self::Sleep => std::thread::sleep(Duration::from_millis(yield_for)),
        }
    }
}
