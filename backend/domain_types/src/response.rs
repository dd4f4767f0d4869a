use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Any second-scale epoch is far below this; values above it are taken
/// to be milliseconds.
const MILLISECOND_EPOCH_THRESHOLD: i64 = 999_999_999_999;

/// A classified processor outcome. Declines are carried here as values
/// rather than errors; `status` is always present and upper-cased.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayResponse {
    pub status: String,
    pub txid: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub customer_message: Option<String>,
    pub redirect_url: Option<String>,
    /// Set when the processor demands a step-up redirect, or when it
    /// signalled "3DS required" without supplying a redirect URL yet.
    pub three_ds_required: bool,
    pub raw: HashMap<String, String>,
}

impl GatewayResponse {
    pub fn is_approved(&self) -> bool {
        self.status == "APPROVED"
    }

    pub fn is_error(&self) -> bool {
        self.status == "ERROR"
    }

    pub fn requires_three_ds_redirect(&self) -> bool {
        self.three_ds_required
    }

    pub fn three_ds_redirect_url(&self) -> Option<&str> {
        self.redirect_url.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreeDsStatus {
    Approved,
    Error,
    Cancelled,
    Pending,
}

/// Which of the three known callback path suffixes the processor
/// redirected the payer back through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Success,
    Error,
    Back,
}

impl CallbackKind {
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "back" => Some(Self::Back),
            _ => None,
        }
    }
}

/// Derived per callback invocation; never stored in the ledger. Status
/// comes from the path suffix alone since the redirect payload frequently
/// carries no status field.
#[derive(Debug, Clone, Serialize)]
pub struct ThreeDsCallbackResult {
    pub success: bool,
    pub status: ThreeDsStatus,
    pub txid: Option<String>,
    pub reference: Option<String>,
    pub raw: HashMap<String, String>,
}

/// Wallet-provider merchant session decoded from the processor's base64
/// session blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplePaySession {
    pub merchant_identifier: Option<String>,
    pub merchant_session_identifier: Option<String>,
    pub nonce: Option<String>,
    pub domain_name: Option<String>,
    pub display_name: Option<String>,
    pub signature: Option<String>,
    pub epoch_timestamp: Option<i64>,
    pub expires_at: Option<i64>,
    pub operational_analytics_identifier: Option<String>,
    pub retries: Option<i64>,
}

impl ApplePaySession {
    /// Some processor configurations hand the session timestamps back in
    /// milliseconds; bring those down to second epoch.
    pub fn normalize_timestamps(&mut self) {
        for field in [&mut self.epoch_timestamp, &mut self.expires_at] {
            if let Some(value) = field {
                if *value > MILLISECOND_EPOCH_THRESHOLD {
                    *value /= 1000;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millisecond_timestamps_are_scaled_to_seconds() {
        let mut session = ApplePaySession {
            merchant_identifier: Some("merchant.example".to_string()),
            merchant_session_identifier: None,
            nonce: None,
            domain_name: None,
            display_name: None,
            signature: None,
            epoch_timestamp: Some(1_700_000_000_000),
            expires_at: Some(1_700_003_600),
            operational_analytics_identifier: None,
            retries: None,
        };
        session.normalize_timestamps();
        assert_eq!(session.epoch_timestamp, Some(1_700_000_000));
        // Already second-scale values are left alone.
        assert_eq!(session.expires_at, Some(1_700_003_600));
    }

    #[test]
    fn callback_kind_only_matches_known_segments() {
        assert_eq!(
            CallbackKind::from_path_segment("success"),
            Some(CallbackKind::Success)
        );
        assert_eq!(
            CallbackKind::from_path_segment("back"),
            Some(CallbackKind::Back)
        );
        assert_eq!(CallbackKind::from_path_segment("redirect"), None);
    }

    #[test]
    fn three_ds_status_displays_upper_cased() {
        assert_eq!(ThreeDsStatus::Cancelled.to_string(), "CANCELLED");
    }
}
