//! Trial window configuration

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entitlement::TrialWindow;
use crate::domain::foundation::Timestamp;

use super::error::ValidationError;

/// Trial window boundaries as RFC 3339 instants.
///
/// Both boundaries are required; there is no default trial.
#[derive(Debug, Clone, Deserialize)]
pub struct TrialConfig {
    /// First instant of the trial (inclusive)
    pub start: DateTime<Utc>,

    /// End of the trial (exclusive)
    pub end: DateTime<Utc>,
}

impl TrialConfig {
    /// Build the immutable trial window.
    pub fn window(&self) -> Result<TrialWindow, ValidationError> {
        TrialWindow::new(
            Timestamp::from_datetime(self.start),
            Timestamp::from_datetime(self.end),
        )
        .map_err(|_| ValidationError::InvalidTrialWindow)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.window().map(|_| ())
    }
}
