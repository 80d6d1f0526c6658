//! Entitlement Sync - Billing-driven content entitlement
//!
//! Keeps a per-company entitlement record in step with the billing provider's
//! subscription events and answers one question for content-serving code:
//! may this company's content be shown right now?
//!
//! # Layers
//!
//! - `domain` - Entitlement records, trial window, billing events and webhook verification
//! - `ports` - Repository, billing provider and checker contracts
//! - `application` - Webhook pipeline, gate, provisioning and queries
//! - `adapters` - PostgreSQL, in-memory, Stripe and HTTP implementations
//! - `config` - Environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
