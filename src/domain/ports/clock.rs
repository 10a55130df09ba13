//! Time and identity sources injected into the engine.

use chrono::Utc;

use crate::domain::models::TaskId;

/// Supplies the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Supplies unique task identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> TaskId;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> TaskId {
        TaskId::new_v4()
    }
}
