use time::OffsetDateTime;

/// Source of wall-clock time.
///
/// Readings are expected to be monotonically non-decreasing. The exchange reads
/// the clock at most once per operation.
pub trait Clock {
    /// The current time
    fn now(&self) -> OffsetDateTime;
}
