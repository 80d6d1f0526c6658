//! Fixed-calendar trial window.

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use serde::{Deserialize, Serialize};

/// Period `[start, end)` during which every company is treated as entitled.
///
/// Loaded once from configuration and never changed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialWindow {
    start: Timestamp,
    end: Timestamp,
}

impl TrialWindow {
    /// Create a trial window.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if `end` is before `start`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, DomainError> {
        if end.is_before(&start) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Trial window end must not be before its start",
            )
            .with_detail("start", start.as_datetime().to_rfc3339())
            .with_detail("end", end.as_datetime().to_rfc3339()));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// True iff `start <= now < end`.
    pub fn is_on_trial(&self, now: Timestamp) -> bool {
        !now.is_before(&self.start) && now.is_before(&self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn window() -> TrialWindow {
        // 2024-01-01 .. 2024-04-01
        TrialWindow::new(
            Timestamp::from_unix_secs(1_704_067_200).unwrap(),
            Timestamp::from_unix_secs(1_711_929_600).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn start_is_inclusive() {
        let w = window();
        assert!(w.is_on_trial(w.start()));
    }

    #[test]
    fn end_is_exclusive() {
        let w = window();
        assert!(!w.is_on_trial(w.end()));
        assert!(w.is_on_trial(w.end().add_secs(-1)));
    }

    #[test]
    fn before_start_is_not_trial() {
        let w = window();
        assert!(!w.is_on_trial(w.start().add_secs(-1)));
    }

    #[test]
    fn empty_window_never_on_trial() {
        let ts = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        let w = TrialWindow::new(ts, ts).unwrap();
        assert!(!w.is_on_trial(ts));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let ts = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        let err = TrialWindow::new(ts, ts.add_days(-1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    proptest! {
        #[test]
        fn on_trial_matches_half_open_interval(
            start in 0i64..2_000_000_000,
            len in 0i64..100_000_000,
            probe in -100_000_000i64..2_200_000_000,
        ) {
            let start_ts = Timestamp::from_unix_secs(start).unwrap();
            let end_ts = Timestamp::from_unix_secs(start + len).unwrap();
            let w = TrialWindow::new(start_ts, end_ts).unwrap();
            let now = Timestamp::from_unix_secs(probe).unwrap();

            prop_assert_eq!(w.is_on_trial(now), start <= probe && probe < start + len);
        }
    }
}
