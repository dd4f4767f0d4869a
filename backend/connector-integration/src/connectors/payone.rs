pub mod codec;
pub mod normalize;
pub mod transformers;

use base64::engine::general_purpose;

pub(crate) const BASE64_ENGINE: general_purpose::GeneralPurpose = general_purpose::STANDARD;

/// The processor signals "step-up authentication required" through this
/// error code, sometimes without supplying a redirect URL yet.
pub const THREE_DS_REQUIRED_ERROR_CODE: &str = "4219";

/// Gateway identifier attached to rewritten wallet tokens.
pub const WALLET_GATEWAY_ID: &str = "payone";

pub mod endpoints {
    pub const PAYMENT: &str = "https://api.pay1.de/post-gateway/";
    /// Session-init (genericpayment) sub-path of the same base.
    pub const SESSION_INIT: &str = "https://api.pay1.de/post-gateway/genericpayment/";
}
