//! Explicit caller identity and clock for one operation.

use crate::model::identity::Identity;
use crate::model::record::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// Who is calling and what time the call observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Identity,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Identity, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Uses the system wall clock in epoch milliseconds.
    pub fn at_system_time(caller: Identity) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self { caller, now }
    }

    /// Same caller, later clock.
    pub fn at(self, now: Timestamp) -> Self {
        Self { now, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::CallContext;
    use crate::model::identity::Identity;

    #[test]
    fn system_time_is_positive_and_at_keeps_caller() {
        let caller = Identity::generate();
        let ctx = CallContext::at_system_time(caller);
        assert!(ctx.now > 0);

        let later = ctx.at(ctx.now + 5);
        assert_eq!(later.caller, caller);
        assert_eq!(later.now, ctx.now + 5);
    }
}
