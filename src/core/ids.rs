//! Synthetic, time-based ids for admin-created records.

use chrono::{DateTime, Utc};

/// Hands out millisecond-timestamp ids that never repeat within a process,
/// even when several records are created in the same millisecond.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.next_at(Utc::now())
    }

    pub fn next_at(&mut self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis().max(self.last + 1);
        self.last = millis;
        millis.to_string()
    }
}
