//! Billing webhook signature verification.
//!
//! Verifies Stripe-format webhook signatures using HMAC-SHA256, with a
//! timestamp tolerance window to reject replays.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::billing_event::BillingEvent;
use super::webhook_errors::WebhookError;
use crate::domain::foundation::Timestamp;

/// Default maximum age of a signature (5 minutes).
pub const DEFAULT_MAX_EVENT_AGE_SECS: i64 = 300;

/// Default tolerance for signatures from the future (1 minute).
pub const DEFAULT_MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present. The provider sends several during secret rotation.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>][,v0=<legacy>]`
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::SignatureInvalid` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| malformed("invalid header format"))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| malformed("invalid timestamp"))?);
                }
                "v1" => {
                    v1_signatures
                        .push(hex::decode(value).map_err(|_| malformed("invalid v1 signature hex"))?);
                }
                _ => {
                    // v0 and unknown schemes are not trusted
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| malformed("missing timestamp"))?;
        if v1_signatures.is_empty() {
            return Err(malformed("missing v1 signature"));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

fn malformed(reason: &'static str) -> WebhookError {
    tracing::debug!(reason, "Rejecting malformed signature header");
    WebhookError::SignatureInvalid
}

/// Verifier for billing webhook signatures.
pub struct BillingWebhookVerifier {
    /// The webhook signing secret shared with the provider.
    secret: SecretString,
    max_event_age_secs: i64,
    max_clock_skew_secs: i64,
}

impl BillingWebhookVerifier {
    /// Creates a verifier with the default tolerance window.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            max_event_age_secs: DEFAULT_MAX_EVENT_AGE_SECS,
            max_clock_skew_secs: DEFAULT_MAX_CLOCK_SKEW_SECS,
        }
    }

    /// Overrides the timestamp tolerance window.
    pub fn with_tolerance(mut self, max_event_age_secs: i64, max_clock_skew_secs: i64) -> Self {
        self.max_event_age_secs = max_event_age_secs;
        self.max_clock_skew_secs = max_clock_skew_secs;
        self
    }

    /// Verifies the webhook signature against the current clock and parses the event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<BillingEvent, WebhookError> {
        self.verify_and_parse_at(payload, signature_header, Timestamp::now())
    }

    /// Verifies the webhook signature as of `now` and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Require and parse the signature header
    /// 2. Validate timestamp is within the tolerance window
    /// 3. Compute expected signature over `"<t>.<payload>"`
    /// 4. Compare against every v1 signature in constant time
    /// 5. Parse the JSON payload into a BillingEvent
    ///
    /// # Errors
    ///
    /// - `SignatureMissing` - No header, or an empty one
    /// - `SignatureInvalid` - Malformed header or no signature matched
    /// - `TimestampOutOfRange` - Signature too old or too far in the future
    /// - `MalformedPayload` - Payload is not a valid event
    pub fn verify_and_parse_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: Timestamp,
    ) -> Result<BillingEvent, WebhookError> {
        let raw = signature_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(WebhookError::SignatureMissing)?;

        let header = SignatureHeader::parse(raw)?;

        self.validate_timestamp(header.timestamp, now)?;

        let expected = self.compute_signature(header.timestamp, payload)?;

        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(WebhookError::SignatureInvalid);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
    }

    fn validate_timestamp(&self, timestamp: i64, now: Timestamp) -> Result<(), WebhookError> {
        let age = now.as_unix_secs().saturating_sub(timestamp);

        if age > self.max_event_age_secs || age < -self.max_clock_skew_secs {
            return Err(WebhookError::TimestampOutOfRange);
        }

        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::SignatureInvalid)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a hex HMAC-SHA256 signature for use in test fixtures.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(signed_payload.as_bytes());
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}
