//! [`DocumentId`] generation from a millisecond clock.

use std::sync::atomic::{AtomicI64, Ordering};

use thiserror::Error;

use crate::models::DocumentId;

/// An existing id is already `i64::MAX`, so no larger one can be issued.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no document id above {last} is available")]
pub struct IdsExhausted {
    pub last: i64,
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Issues strictly increasing ids within one process.
///
/// Each id is `max(now_ms, last + 1)`, so two saves inside the same
/// millisecond (or after the clock steps backwards) still get distinct ids.
pub struct IdGenerator {
    last: AtomicI64,
    clock: Clock,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_clock(|| chrono::Utc::now().timestamp_millis())
    }

    pub fn with_clock(clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self {
            last: AtomicI64::new(0),
            clock: Box::new(clock),
        }
    }

    pub fn next_id(&self) -> Result<DocumentId, IdsExhausted> {
        let now = (self.clock)();
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let after = current
                .checked_add(1)
                .ok_or(IdsExhausted { last: current })?;
            let candidate = now.max(after);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(DocumentId::new(candidate.to_string())),
                Err(actual) => current = actual,
            }
        }
    }

    /// Never issue an id at or below one that already exists.
    ///
    /// Non-numeric ids are ignored.
    pub fn observe(&self, id: &DocumentId) {
        if let Some(millis) = id.millis() {
            self.last.fetch_max(millis, Ordering::AcqRel);
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_millisecond_yields_distinct_ids() {
        let ids = IdGenerator::with_clock(|| 1_000);
        let a = ids.next_id().unwrap();
        let b = ids.next_id().unwrap();
        assert_eq!(a.as_str(), "1000");
        assert_eq!(b.as_str(), "1001");
    }

    #[test]
    fn test_observe_skips_past_existing() {
        let ids = IdGenerator::with_clock(|| 500);
        ids.observe(&DocumentId::new("900"));
        ids.observe(&DocumentId::new("legacy-scan"));
        assert_eq!(ids.next_id().unwrap().as_str(), "901");
    }

    #[test]
    fn test_follows_clock_when_ahead() {
        let ids = IdGenerator::with_clock(|| 2_000);
        ids.observe(&DocumentId::new("10"));
        assert_eq!(ids.next_id().unwrap().as_str(), "2000");
    }

    #[test]
    fn test_largest_existing_id_exhausts_generator() {
        let ids = IdGenerator::with_clock(|| 1_000);
        ids.observe(&DocumentId::new(i64::MAX.to_string()));
        assert_eq!(ids.next_id(), Err(IdsExhausted { last: i64::MAX }));
        // Still exhausted, not wrapped around.
        assert!(ids.next_id().is_err());
    }

    #[test]
    fn test_one_below_max_is_the_last_id() {
        let ids = IdGenerator::with_clock(|| 0);
        ids.observe(&DocumentId::new((i64::MAX - 1).to_string()));
        assert_eq!(ids.next_id().unwrap().as_str(), i64::MAX.to_string());
        assert!(ids.next_id().is_err());
    }
}
