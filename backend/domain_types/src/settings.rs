use hyperswitch_masking::{PeekInterface, Secret};
use serde::{Deserialize, Serialize};

use crate::errors::{CustomResult, GatewayError};

pub const DEFAULT_API_VERSION: &str = "3.11";
pub const PORTAL_KEY_MASK: &str = "********";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GatewayMode {
    #[default]
    Test,
    Live,
}

/// Merchant credentials and toggles for the processor account.
///
/// Exactly one record exists per deployment. It is created with empty
/// defaults on first activation and only ever replaced wholesale through
/// [`MerchantSettings::apply`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantSettings {
    /// Processor sub-account id ("aid" on the wire).
    pub account_id: String,
    pub portal_id: String,
    pub merchant_id: String,
    /// Shared secret for the integrity key. Never leaves the trust
    /// boundary unmasked.
    pub portal_key: Secret<String>,
    pub mode: GatewayMode,
    pub api_version: String,
    pub three_ds_enabled: bool,
    pub merchant_name: Option<String>,
    pub domain_name: Option<String>,
    pub apple_merchant_identifier: Option<String>,
}

impl Default for MerchantSettings {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            portal_id: String::new(),
            merchant_id: String::new(),
            portal_key: Secret::new(String::new()),
            mode: GatewayMode::Test,
            api_version: DEFAULT_API_VERSION.to_string(),
            three_ds_enabled: true,
            merchant_name: None,
            domain_name: None,
            apple_merchant_identifier: None,
        }
    }
}

impl MerchantSettings {
    /// An operation may proceed only if account id, portal id and portal
    /// key are all non-empty.
    pub fn validate(&self) -> CustomResult<(), GatewayError> {
        if self.account_id.trim().is_empty() {
            return Err(GatewayError::ConfigurationIncomplete {
                field: "account_id",
            }
            .into());
        }
        if self.portal_id.trim().is_empty() {
            return Err(GatewayError::ConfigurationIncomplete {
                field: "portal_id",
            }
            .into());
        }
        if self.portal_key.peek().trim().is_empty() {
            return Err(GatewayError::ConfigurationIncomplete {
                field: "portal_key",
            }
            .into());
        }
        Ok(())
    }

    /// Copy with the portal key redacted, safe to hand to the caller.
    pub fn masked(&self) -> Self {
        Self {
            portal_key: Secret::new(PORTAL_KEY_MASK.to_string()),
            ..self.clone()
        }
    }

    /// Merge an update over the stored record. Fields the caller left
    /// unset keep their current value.
    pub fn apply(&mut self, update: MerchantSettingsUpdate) {
        if let Some(account_id) = update.account_id {
            self.account_id = account_id;
        }
        if let Some(portal_id) = update.portal_id {
            self.portal_id = portal_id;
        }
        if let Some(merchant_id) = update.merchant_id {
            self.merchant_id = merchant_id;
        }
        if let Some(portal_key) = update.portal_key {
            self.portal_key = portal_key;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(api_version) = update.api_version {
            self.api_version = api_version;
        }
        if let Some(three_ds_enabled) = update.three_ds_enabled {
            self.three_ds_enabled = three_ds_enabled;
        }
        if let Some(merchant_name) = update.merchant_name {
            self.merchant_name = Some(merchant_name);
        }
        if let Some(domain_name) = update.domain_name {
            self.domain_name = Some(domain_name);
        }
        if let Some(apple_merchant_identifier) = update.apple_merchant_identifier {
            self.apple_merchant_identifier = Some(apple_merchant_identifier);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MerchantSettingsUpdate {
    pub account_id: Option<String>,
    pub portal_id: Option<String>,
    pub merchant_id: Option<String>,
    pub portal_key: Option<Secret<String>>,
    pub mode: Option<GatewayMode>,
    pub api_version: Option<String>,
    pub three_ds_enabled: Option<bool>,
    pub merchant_name: Option<String>,
    pub domain_name: Option<String>,
    pub apple_merchant_identifier: Option<String>,
}
