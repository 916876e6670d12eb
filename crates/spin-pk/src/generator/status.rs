/// Represents the result of attempting to generate a new distributed id.
///
/// - [`IdGenStatus::Ready`] indicates a new id was successfully generated.
/// - [`IdGenStatus::Pending`] means the sequence for the current time unit is
///   used up and no id can be produced until the clock reaches the next unit.
///
/// This allows non-blocking generation loops and caller-chosen backoff.
///
/// # Example
///
/// ```
/// use spin_pk::{DistributedIdGenerator, IdGenStatus, IdType, SystemClock};
///
/// let generator = DistributedIdGenerator::new(3, IdType::MaxPeak, SystemClock).unwrap();
/// match generator.try_next_id().unwrap() {
///     IdGenStatus::Ready { id } => println!("id: {id}"),
///     IdGenStatus::Pending { yield_for } => println!("back off for {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique id was generated and is ready to use.
    Ready {
        /// The packed distributed id.
        id: u64,
    },
    /// The sequence is exhausted for the current time unit.
    Pending {
        /// Milliseconds until the next time unit starts.
        yield_for: u64,
    },
}
