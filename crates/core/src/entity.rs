//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Records that are hidden rather than removed.
pub trait SoftDeletes {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn is_trashed(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Audit timestamps carried by every persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`. Clock skew never moves it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn touch_never_moves_backwards() {
        let now = Utc::now();
        let mut ts = Timestamps::new(now);
        ts.touch(now - Duration::seconds(5));
        assert_eq!(ts.updated_at, now);

        let later = now + Duration::seconds(5);
        ts.touch(later);
        assert_eq!(ts.updated_at, later);
        assert_eq!(ts.created_at, now);
    }
}
