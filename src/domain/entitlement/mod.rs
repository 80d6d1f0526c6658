//! Entitlement domain module.
//!
//! Tracks each company's billing state and decides whether its content may
//! be shown publicly.
//!
//! # Module Structure
//!
//! - `record` - EntitlementRecord aggregate and the transitions billing events request
//! - `status` - Derived status for account management
//! - `trial` - Fixed-calendar trial window
//! - `errors` - Provisioning and query errors

mod errors;
mod record;
mod status;
mod trial;

pub use errors::EntitlementError;
pub use record::{ApplyOutcome, EntitlementRecord, SubscriptionTerm, TermTransition};
pub use status::EntitlementStatus;
pub use trial::TrialWindow;
