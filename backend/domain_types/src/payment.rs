use hyperswitch_masking::Secret;
use serde::{Deserialize, Serialize};

/// Logical payment method selected by the caller. The wire codes double
/// as the processor's clearing-type discriminator, with the two wallet
/// variants collapsing onto the generic wallet clearing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cc")]
    CreditCard,
    /// PayPal, the generic wallet method.
    #[serde(rename = "wlt")]
    Wallet,
    #[serde(rename = "gpp")]
    GooglePay,
    #[serde(rename = "apl")]
    ApplePay,
    /// Sofort and related bank redirects.
    #[serde(rename = "sb")]
    OnlineBankTransfer,
    /// SEPA direct debit.
    #[serde(rename = "elv")]
    DirectDebit,
}

impl PaymentMethod {
    pub fn clearing_type(self) -> ClearingType {
        match self {
            Self::CreditCard => ClearingType::CreditCard,
            Self::Wallet | Self::GooglePay | Self::ApplePay => ClearingType::Wallet,
            Self::OnlineBankTransfer => ClearingType::OnlineBankTransfer,
            Self::DirectDebit => ClearingType::DirectDebit,
        }
    }
}

/// Processor discriminator selecting the payment instrument family.
/// Exactly one instrument field group accompanies it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearingType {
    #[serde(rename = "cc")]
    CreditCard,
    #[serde(rename = "wlt")]
    Wallet,
    #[serde(rename = "sb")]
    OnlineBankTransfer,
    #[serde(rename = "elv")]
    DirectDebit,
}

/// Sub-code identifying the wallet protocol within the wallet clearing
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletType {
    #[serde(rename = "PPE")]
    Paypal,
    #[serde(rename = "GGP")]
    GooglePay,
    #[serde(rename = "APL")]
    ApplePay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankTransferKind {
    #[serde(rename = "PNT")]
    Sofort,
    #[serde(rename = "GPY")]
    Giropay,
    #[serde(rename = "IDL")]
    Ideal,
    #[serde(rename = "BCT")]
    Bancontact,
}

impl BankTransferKind {
    pub fn default_bank_country(self) -> &'static str {
        match self {
            Self::Sofort | Self::Giropay => "DE",
            Self::Ideal => "NL",
            Self::Bancontact => "BE",
        }
    }
}

/// Caller input for one outbound processor call. Every field is optional;
/// defaulting is always fill-if-unset so a caller-supplied value is never
/// overwritten.
#[derive(Debug, Clone, Default)]
pub struct PaymentParams {
    pub method: Option<PaymentMethod>,
    /// Amount in minor units.
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub reference: Option<String>,
    pub customer_id: Option<String>,
    pub txid: Option<String>,
    pub wallet_type: Option<WalletType>,
    pub ecommerce_mode: Option<String>,
    pub card: CardParams,
    pub bank: BankParams,
    pub wallet: WalletParams,
    pub customer: CustomerParams,
    pub redirect_urls: RedirectUrls,
    /// Wallet token rewritten into the processor's nested payment-data
    /// convention. Populated by the method resolver, never by callers.
    pub paydata: Option<TokenPaydata>,
}

#[derive(Debug, Clone, Default)]
pub struct CardParams {
    pub pan: Option<Secret<String>>,
    /// Expiry in YYMM.
    pub expiry: Option<Secret<String>>,
    pub cvc: Option<Secret<String>>,
    /// Single-letter network code ("V", "M", ...).
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BankParams {
    pub transfer_kind: Option<BankTransferKind>,
    pub country: Option<String>,
    pub iban: Option<Secret<String>>,
    pub bic: Option<Secret<String>>,
    pub account_holder: Option<String>,
}

/// The two caller-chosen slots an opaque wallet token may arrive under.
/// `token` wins when both are set.
#[derive(Debug, Clone, Default)]
pub struct WalletParams {
    pub token: Option<Secret<String>>,
    pub token_data: Option<Secret<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerParams {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub salutation: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub ip: Option<String>,
    pub language: Option<String>,
    pub customer_present: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct RedirectUrls {
    pub success: Option<String>,
    pub error: Option<String>,
    pub back: Option<String>,
}

/// A wallet token after rewriting into the processor's nested
/// "additional payment data" field convention.
#[derive(Debug, Clone)]
pub struct TokenPaydata {
    pub token_data: Secret<String>,
    pub payment_method: String,
    pub payment_method_type: String,
    pub gateway: String,
    pub gateway_merchant_id: Option<String>,
}
