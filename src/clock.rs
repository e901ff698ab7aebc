use chrono::Utc;

/// Source of the current wall-clock time in milliseconds since the Unix
/// epoch. The generators are generic over this so tests can drive the state
/// machine with a deterministic clock.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
