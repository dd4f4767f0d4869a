pub mod errors;
pub mod payment;
pub mod response;
pub mod settings;
pub mod transaction;

pub use errors::{CustomResult, GatewayError};
pub use payment::{
    BankParams, BankTransferKind, CardParams, ClearingType, CustomerParams, PaymentMethod,
    PaymentParams, RedirectUrls, TokenPaydata, WalletParams, WalletType,
};
pub use response::{
    ApplePaySession, CallbackKind, GatewayResponse, ThreeDsCallbackResult, ThreeDsStatus,
};
pub use settings::{GatewayMode, MerchantSettings, MerchantSettingsUpdate};
pub use transaction::{RequestType, TransactionFilter, TransactionRecord};
