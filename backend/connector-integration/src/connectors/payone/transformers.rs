use std::collections::HashMap;

use base64::Engine;
use domain_types::{
    errors::{CustomResult, GatewayError},
    payment::{
        BankTransferKind, ClearingType, CustomerParams, PaymentMethod, PaymentParams,
        TokenPaydata, WalletType,
    },
    response::{ApplePaySession, GatewayResponse},
    settings::{GatewayMode, MerchantSettings},
    transaction::RequestType,
};
use error_stack::ResultExt;
use hyperswitch_masking::{PeekInterface, Secret};
use serde::Serialize;

use super::{
    codec::ResponseMap,
    normalize::{normalize_customer_id, normalize_reference},
    BASE64_ENGINE, THREE_DS_REQUIRED_ERROR_CODE, WALLET_GATEWAY_ID,
};
use crate::utils::missing_field_err;

// ===== WIRE CONSTANTS =====

const ENCODING: &str = "UTF-8";
const DEFAULT_ECOMMERCE_MODE: &str = "internet";
const REFERENCE_FALLBACK_PREFIX: &str = "REF";

const DEFAULT_SUCCESS_URL: &str = "https://example.com/payment/3ds/success";
const DEFAULT_ERROR_URL: &str = "https://example.com/payment/3ds/error";
const DEFAULT_BACK_URL: &str = "https://example.com/payment/3ds/back";

// Demo instrument defaults, applied only for fields the caller left unset.
pub const TEST_CARD_PAN: &str = "4111111111111111";
pub const TEST_CARD_BRAND: &str = "V";
pub const TEST_CARD_EXPIRY: &str = "2512";
pub const TEST_CARD_CVC: &str = "123";
pub const TEST_IBAN: &str = "DE89370400440532013000";
pub const TEST_BIC: &str = "COBADEFFXXX";
const DEFAULT_ACCOUNT_HOLDER: &str = "Test Person";

const DEFAULT_SALUTATION: &str = "Mr";
const DEFAULT_GENDER: &str = "m";
const DEFAULT_PHONE: &str = "+4900000000000";
const DEFAULT_IP: &str = "127.0.0.1";
const DEFAULT_LANGUAGE: &str = "en";

const APPLE_PAY_TOKEN_METHOD: &str = "APL";
const APPLE_PAY_TOKEN_METHOD_TYPE: &str = "APPLEPAY";
const APPLE_PAY_SESSION_ACTION: &str = "getapplepaysession";

const SESSION_BLOB_KEYS: [&str; 3] = ["add_paydata[session]", "add_paydata_session", "session"];
const REDIRECT_URL_KEYS: [&str; 4] = ["redirecturl", "redirect_url", "url", "redirect"];
const TRANSACTION_ID_KEYS: [&str; 6] =
    ["txid", "TxId", "tx_id", "transactionid", "transaction_id", "id"];
const SESSION_SUCCESS_STATUSES: [&str; 2] = ["OK", "APPROVED"];

const MASKED_VALUE: &str = "***";

// ===== OUTBOUND REQUEST =====

/// The final flat parameter set for one processor call, ready for form
/// encoding. Exactly one instrument field group is present, selected by
/// the clearing type.
#[derive(Debug, Serialize)]
pub struct PayoneRequest {
    pub request: RequestType,
    pub aid: String,
    pub mid: String,
    pub portalid: String,
    /// Integrity key, recomputed per request.
    pub key: String,
    pub mode: GatewayMode,
    pub api_version: String,
    pub encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customerid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clearingtype: Option<ClearingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallettype: Option<WalletType>,
    #[serde(flatten)]
    pub instrument: Option<InstrumentFields>,
    #[serde(flatten)]
    pub three_ds: Option<ThreeDsFields>,
    #[serde(flatten)]
    pub customer: CustomerFields,
    #[serde(flatten)]
    pub paydata: Option<PaydataFields>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InstrumentFields {
    Card(CardFields),
    BankRedirect(BankRedirectFields),
    DirectDebit(DirectDebitFields),
}

#[derive(Debug, Serialize)]
pub struct CardFields {
    pub cardpan: Secret<String>,
    pub cardtype: String,
    pub cardexpiredate: Secret<String>,
    pub cardcvc2: Secret<String>,
}

#[derive(Debug, Serialize)]
pub struct BankRedirectFields {
    pub onlinebanktransfertype: BankTransferKind,
    pub bankcountry: String,
}

#[derive(Debug, Serialize)]
pub struct DirectDebitFields {
    pub iban: Secret<String>,
    pub bic: Secret<String>,
    pub bankaccountholder: String,
}

#[derive(Debug, Serialize)]
pub struct ThreeDsFields {
    #[serde(rename = "3dsecure")]
    pub three_d_secure: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecommercemode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errorurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backurl: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CustomerFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "telephonenumber", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "customer_is_present", skip_serializing_if = "Option::is_none")]
    pub customer_present: Option<&'static str>,
}

#[derive(Debug, Default, Serialize)]
pub struct PaydataFields {
    #[serde(rename = "add_paydata[action]", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(
        rename = "add_paydata[paymentmethod_token_data]",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_data: Option<Secret<String>>,
    #[serde(
        rename = "add_paydata[paymentmethod]",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<String>,
    #[serde(
        rename = "add_paydata[paymentmethod_type]",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method_type: Option<String>,
    #[serde(rename = "add_paydata[gateway]", skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(
        rename = "add_paydata[gateway_merchant_id]",
        skip_serializing_if = "Option::is_none"
    )]
    pub gateway_merchant_id: Option<String>,
    #[serde(
        rename = "add_paydata[domain_name]",
        skip_serializing_if = "Option::is_none"
    )]
    pub domain_name: Option<String>,
    #[serde(
        rename = "add_paydata[merchant_name]",
        skip_serializing_if = "Option::is_none"
    )]
    pub merchant_name: Option<String>,
}

// ===== PAYMENT METHOD RESOLUTION =====

/// Merge the method-specific field set into the caller parameters.
/// Purely defensive defaulting: nothing here fails, and caller-supplied
/// values are never overwritten - truly invalid combinations are left for
/// the processor to reject.
pub fn resolve_payment_method(params: &mut PaymentParams, settings: &MerchantSettings) {
    // Wallet variants pin the sub-code before any generic wallet
    // defaulting can pick a different one.
    match params.method {
        Some(PaymentMethod::GooglePay) => {
            params.wallet_type.get_or_insert(WalletType::GooglePay);
        }
        Some(PaymentMethod::ApplePay) => {
            params.wallet_type.get_or_insert(WalletType::ApplePay);
        }
        _ => {}
    }

    match params.method {
        Some(PaymentMethod::CreditCard) => apply_card_defaults(params),
        Some(PaymentMethod::Wallet) => {
            params.wallet_type.get_or_insert(WalletType::Paypal);
        }
        Some(PaymentMethod::GooglePay) | Some(PaymentMethod::ApplePay) => {}
        Some(PaymentMethod::OnlineBankTransfer) => apply_bank_redirect_defaults(params),
        Some(PaymentMethod::DirectDebit) => apply_direct_debit_defaults(params),
        None => {}
    }

    rewrite_wallet_token(params, settings);

    let clearing_type = params.method.map(PaymentMethod::clearing_type);
    if clearing_type == Some(ClearingType::Wallet) {
        if params.wallet_type.is_none() {
            params.wallet_type = Some(wallet_type_from_hints(params));
        }
        // Card and wallet fields are never sent together.
        params.card.brand = None;
    }

    apply_common_defaults(&mut params.customer);
}

fn apply_card_defaults(params: &mut PaymentParams) {
    let card = &mut params.card;
    card.pan
        .get_or_insert_with(|| Secret::new(TEST_CARD_PAN.to_string()));
    card.expiry
        .get_or_insert_with(|| Secret::new(TEST_CARD_EXPIRY.to_string()));
    card.cvc
        .get_or_insert_with(|| Secret::new(TEST_CARD_CVC.to_string()));
    card.brand.get_or_insert_with(|| TEST_CARD_BRAND.to_string());
}

fn apply_bank_redirect_defaults(params: &mut PaymentParams) {
    let kind = *params
        .bank
        .transfer_kind
        .get_or_insert(BankTransferKind::Sofort);
    params
        .bank
        .country
        .get_or_insert_with(|| kind.default_bank_country().to_string());
}

fn apply_direct_debit_defaults(params: &mut PaymentParams) {
    let holder = match (&params.customer.first_name, &params.customer.last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.clone(),
        (None, Some(last)) => last.clone(),
        (None, None) => DEFAULT_ACCOUNT_HOLDER.to_string(),
    };
    let bank = &mut params.bank;
    bank.iban
        .get_or_insert_with(|| Secret::new(TEST_IBAN.to_string()));
    bank.bic
        .get_or_insert_with(|| Secret::new(TEST_BIC.to_string()));
    bank.account_holder.get_or_insert(holder);
}

/// Rewrite an opaque wallet token into the processor's nested payment
/// data convention and drop the original token slots.
fn rewrite_wallet_token(params: &mut PaymentParams, settings: &MerchantSettings) {
    let token = params
        .wallet
        .token
        .take()
        .or_else(|| params.wallet.token_data.take());
    if let Some(token) = token {
        let gateway_merchant_id = if settings.merchant_id.trim().is_empty() {
            None
        } else {
            Some(settings.merchant_id.clone())
        };
        params.paydata = Some(TokenPaydata {
            token_data: token,
            payment_method: APPLE_PAY_TOKEN_METHOD.to_string(),
            payment_method_type: APPLE_PAY_TOKEN_METHOD_TYPE.to_string(),
            gateway: WALLET_GATEWAY_ID.to_string(),
            gateway_merchant_id,
        });
    }
}

/// Resolver-level wallet sub-code fallback: inspect the declared method
/// and the rewritten payment-data hints, defaulting to PayPal.
fn wallet_type_from_hints(params: &PaymentParams) -> WalletType {
    match params.method {
        Some(PaymentMethod::GooglePay) => WalletType::GooglePay,
        Some(PaymentMethod::ApplePay) => WalletType::ApplePay,
        _ => match params.paydata.as_ref().map(|p| p.payment_method.as_str()) {
            Some(APPLE_PAY_TOKEN_METHOD) => WalletType::ApplePay,
            _ => WalletType::Paypal,
        },
    }
}

fn apply_common_defaults(customer: &mut CustomerParams) {
    customer
        .salutation
        .get_or_insert_with(|| DEFAULT_SALUTATION.to_string());
    customer
        .gender
        .get_or_insert_with(|| DEFAULT_GENDER.to_string());
    customer
        .phone
        .get_or_insert_with(|| DEFAULT_PHONE.to_string());
    customer.ip.get_or_insert_with(|| DEFAULT_IP.to_string());
    customer
        .language
        .get_or_insert_with(|| DEFAULT_LANGUAGE.to_string());
    customer.customer_present.get_or_insert(true);
}

// ===== REQUEST BUILDING =====

/// Assemble the final flat parameter set. No network I/O happens here.
pub fn build_payment_request(
    request_type: RequestType,
    settings: &MerchantSettings,
    mut params: PaymentParams,
) -> CustomResult<PayoneRequest, GatewayError> {
    let clearing_type = params.method.map(PaymentMethod::clearing_type);

    let three_ds = match (clearing_type, request_type) {
        (
            Some(ClearingType::CreditCard),
            RequestType::Preauthorization | RequestType::Authorization,
        ) => Some(build_three_ds_fields(settings, &params)),
        _ => None,
    };

    apply_common_defaults(&mut params.customer);

    if clearing_type == Some(ClearingType::Wallet) {
        // Defensive re-check; the resolver already strips this.
        params.card.brand = None;
        if params.wallet_type.is_none() {
            // Narrower fallback than the resolver's: keyed purely on the
            // presence of rewritten token data.
            params.wallet_type = Some(if params.paydata.is_some() {
                WalletType::GooglePay
            } else {
                WalletType::Paypal
            });
        }
    }

    let instrument = build_instrument(clearing_type, &params)?;

    Ok(PayoneRequest {
        request: request_type,
        aid: settings.account_id.clone(),
        mid: settings.merchant_id.clone(),
        portalid: settings.portal_id.clone(),
        key: integrity_key(settings),
        mode: settings.mode,
        api_version: settings.api_version.clone(),
        encoding: ENCODING,
        amount: params.amount,
        currency: params.currency.clone(),
        reference: params
            .reference
            .as_deref()
            .map(|reference| normalize_reference(reference, REFERENCE_FALLBACK_PREFIX)),
        customerid: Some(normalize_customer_id(params.customer_id.as_deref())),
        txid: params.txid.clone(),
        clearingtype: clearing_type,
        wallettype: params.wallet_type,
        instrument,
        three_ds,
        customer: customer_fields(&params.customer),
        paydata: params.paydata.as_ref().map(token_paydata_fields),
    })
}

/// Hex-encoded digest of the shared secret. Content-independent, so it
/// is recomputed per request rather than cached.
fn integrity_key(settings: &MerchantSettings) -> String {
    format!("{:x}", md5::compute(settings.portal_key.peek().as_bytes()))
}

fn build_three_ds_fields(settings: &MerchantSettings, params: &PaymentParams) -> ThreeDsFields {
    if settings.three_ds_enabled {
        ThreeDsFields {
            three_d_secure: "yes",
            ecommercemode: Some(
                params
                    .ecommerce_mode
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ECOMMERCE_MODE.to_string()),
            ),
            successurl: Some(
                params
                    .redirect_urls
                    .success
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SUCCESS_URL.to_string()),
            ),
            errorurl: Some(
                params
                    .redirect_urls
                    .error
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ERROR_URL.to_string()),
            ),
            backurl: Some(
                params
                    .redirect_urls
                    .back
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BACK_URL.to_string()),
            ),
        }
    } else {
        ThreeDsFields {
            three_d_secure: "no",
            ecommercemode: None,
            successurl: None,
            errorurl: None,
            backurl: None,
        }
    }
}

fn build_instrument(
    clearing_type: Option<ClearingType>,
    params: &PaymentParams,
) -> CustomResult<Option<InstrumentFields>, GatewayError> {
    let Some(clearing_type) = clearing_type else {
        return Ok(None);
    };
    let instrument = match clearing_type {
        ClearingType::CreditCard => InstrumentFields::Card(CardFields {
            cardpan: params
                .card
                .pan
                .clone()
                .ok_or_else(missing_field_err("cardpan"))?,
            cardtype: params
                .card
                .brand
                .clone()
                .ok_or_else(missing_field_err("cardtype"))?,
            cardexpiredate: params
                .card
                .expiry
                .clone()
                .ok_or_else(missing_field_err("cardexpiredate"))?,
            cardcvc2: params
                .card
                .cvc
                .clone()
                .ok_or_else(missing_field_err("cardcvc2"))?,
        }),
        // Wallet payments carry no instrument fields of their own; the
        // wallet type and payment data travel separately.
        ClearingType::Wallet => return Ok(None),
        ClearingType::OnlineBankTransfer => {
            let kind = params
                .bank
                .transfer_kind
                .unwrap_or(BankTransferKind::Sofort);
            InstrumentFields::BankRedirect(BankRedirectFields {
                onlinebanktransfertype: kind,
                bankcountry: params
                    .bank
                    .country
                    .clone()
                    .unwrap_or_else(|| kind.default_bank_country().to_string()),
            })
        }
        ClearingType::DirectDebit => InstrumentFields::DirectDebit(DirectDebitFields {
            iban: params
                .bank
                .iban
                .clone()
                .ok_or_else(missing_field_err("iban"))?,
            bic: params
                .bank
                .bic
                .clone()
                .ok_or_else(missing_field_err("bic"))?,
            bankaccountholder: params
                .bank
                .account_holder
                .clone()
                .ok_or_else(missing_field_err("bankaccountholder"))?,
        }),
    };
    Ok(Some(instrument))
}

fn customer_fields(customer: &CustomerParams) -> CustomerFields {
    CustomerFields {
        firstname: customer.first_name.clone(),
        lastname: customer.last_name.clone(),
        street: customer.street.clone(),
        zip: customer.zip.clone(),
        city: customer.city.clone(),
        country: customer.country.clone(),
        email: customer.email.clone(),
        salutation: customer.salutation.clone(),
        gender: customer.gender.clone(),
        phone: customer.phone.clone(),
        ip: customer.ip.clone(),
        language: customer.language.clone(),
        customer_present: customer
            .customer_present
            .map(|present| if present { "yes" } else { "no" }),
    }
}

fn token_paydata_fields(paydata: &TokenPaydata) -> PaydataFields {
    PaydataFields {
        token_data: Some(paydata.token_data.clone()),
        payment_method: Some(paydata.payment_method.clone()),
        payment_method_type: Some(paydata.payment_method_type.clone()),
        gateway: Some(paydata.gateway.clone()),
        gateway_merchant_id: paydata.gateway_merchant_id.clone(),
        ..PaydataFields::default()
    }
}

/// Session-init request for Apple Pay merchant validation. A reduced
/// `genericpayment` run of the same pipeline.
pub fn build_apple_pay_session_request(
    settings: &MerchantSettings,
    params: &PaymentParams,
) -> PayoneRequest {
    PayoneRequest {
        request: RequestType::Genericpayment,
        aid: settings.account_id.clone(),
        mid: settings.merchant_id.clone(),
        portalid: settings.portal_id.clone(),
        key: integrity_key(settings),
        mode: settings.mode,
        api_version: settings.api_version.clone(),
        encoding: ENCODING,
        amount: params.amount,
        currency: params.currency.clone(),
        reference: params
            .reference
            .as_deref()
            .map(|reference| normalize_reference(reference, REFERENCE_FALLBACK_PREFIX)),
        customerid: None,
        txid: None,
        clearingtype: Some(ClearingType::Wallet),
        wallettype: Some(WalletType::ApplePay),
        instrument: None,
        three_ds: None,
        customer: CustomerFields::default(),
        paydata: Some(PaydataFields {
            action: Some(APPLE_PAY_SESSION_ACTION.to_string()),
            domain_name: settings.domain_name.clone(),
            merchant_name: settings.merchant_name.clone(),
            ..PaydataFields::default()
        }),
    }
}

// ===== RESPONSE CLASSIFICATION =====

/// Classify a decoded processor payload. Status is always present and
/// upper-cased; the 4219 sentinel marks "3DS required" even when no
/// redirect URL was supplied - no URL is ever fabricated for it.
pub fn classify_response(map: &ResponseMap) -> GatewayResponse {
    let status = map
        .first_of(&["status", "Status"])
        .unwrap_or("unknown")
        .to_uppercase();
    let error_code = first_owned(map, &["errorcode", "ErrorCode", "error_code"]);
    let error_message = first_owned(map, &["errormessage", "ErrorMessage", "error_message"]);
    let customer_message = first_owned(
        map,
        &["customermessage", "CustomerMessage", "customer_message"],
    );
    let redirect_url = first_owned(map, &REDIRECT_URL_KEYS);
    let step_up_sentinel = error_code.as_deref() == Some(THREE_DS_REQUIRED_ERROR_CODE);
    let three_ds_required =
        (status == "REDIRECT" && redirect_url.is_some()) || step_up_sentinel;

    GatewayResponse {
        status,
        txid: extract_transaction_id(map),
        error_code,
        error_message,
        customer_message,
        redirect_url,
        three_ds_required,
        raw: map.to_map(),
    }
}

pub fn extract_transaction_id(map: &ResponseMap) -> Option<String> {
    first_owned(map, &TRANSACTION_ID_KEYS)
}

fn first_owned(map: &ResponseMap, keys: &[&str]) -> Option<String> {
    map.first_of(keys).map(str::to_string)
}

/// Decode the merchant session out of a `genericpayment` response.
/// `Ok(None)` when the outer call did not succeed with a non-empty blob;
/// a blob that decodes but lacks a usable merchant identifier is an
/// invalid session, not an absent one.
pub fn decode_apple_pay_session(
    map: &ResponseMap,
) -> CustomResult<Option<ApplePaySession>, GatewayError> {
    let status = map
        .first_of(&["status", "Status"])
        .unwrap_or("unknown")
        .to_uppercase();
    if !SESSION_SUCCESS_STATUSES.contains(&status.as_str()) {
        tracing::warn!(%status, "session init did not succeed");
        return Ok(None);
    }
    let Some(blob) = map.first_of(&SESSION_BLOB_KEYS).filter(|blob| !blob.is_empty()) else {
        tracing::warn!("session init response carries no session blob");
        return Ok(None);
    };
    let bytes = BASE64_ENGINE
        .decode(blob)
        .change_context(GatewayError::ResponseDeserializationFailed)?;
    let mut session: ApplePaySession =
        serde_json::from_slice(&bytes).change_context(GatewayError::ResponseDeserializationFailed)?;
    session.normalize_timestamps();
    let usable = session
        .merchant_identifier
        .as_deref()
        .map_or(false, |id| !id.trim().is_empty());
    if !usable {
        tracing::warn!("merchant session lacks a merchant identifier, rejecting");
        return Err(GatewayError::SessionInvalid {
            reason: "missing merchant identifier",
        }
        .into());
    }
    Ok(Some(session))
}

// ===== SNAPSHOTS =====

/// Decode an encoded request body back into a map with secrets redacted,
/// for the audit trail.
pub fn masked_request_snapshot(encoded_body: &str) -> HashMap<String, String> {
    ResponseMap::decode(encoded_body)
        .entries()
        .iter()
        .map(|(key, value)| {
            let lower = key.to_lowercase();
            let masked = match lower.as_str() {
                "cardpan" => mask_pan(value),
                "cardcvc2" | "key" | "iban" => MASKED_VALUE.to_string(),
                _ if lower.contains("token_data") => MASKED_VALUE.to_string(),
                _ => value.clone(),
            };
            (key.clone(), masked)
        })
        .collect()
}

fn mask_pan(pan: &str) -> String {
    let visible = pan.len().saturating_sub(4);
    pan.chars()
        .enumerate()
        .map(|(index, c)| if index < visible { '*' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use domain_types::payment::{RedirectUrls, WalletParams};

    use super::*;
    use crate::connectors::payone::codec::encode_form;

    fn settings() -> MerchantSettings {
        MerchantSettings {
            account_id: "1".to_string(),
            portal_id: "2".to_string(),
            merchant_id: "77".to_string(),
            portal_key: Secret::new("secret".to_string()),
            ..MerchantSettings::default()
        }
    }

    fn body_map(request: &PayoneRequest) -> ResponseMap {
        ResponseMap::decode(&encode_form(request).unwrap())
    }

    #[test]
    fn card_preauthorization_gets_test_defaults_and_three_ds() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::CreditCard),
            amount: Some(1000),
            currency: Some("EUR".to_string()),
            ..PaymentParams::default()
        };
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        let request =
            build_payment_request(RequestType::Preauthorization, &settings, params).unwrap();
        let map = body_map(&request);
        assert_eq!(map.get("cardpan"), Some(TEST_CARD_PAN));
        assert_eq!(map.get("cardtype"), Some("V"));
        assert_eq!(map.get("3dsecure"), Some("yes"));
        assert_eq!(map.get("ecommercemode"), Some("internet"));
        assert_eq!(map.get("successurl"), Some(DEFAULT_SUCCESS_URL));
        assert_eq!(map.get("errorurl"), Some(DEFAULT_ERROR_URL));
        assert_eq!(map.get("backurl"), Some(DEFAULT_BACK_URL));
        // md5 of "secret"
        assert_eq!(map.get("key"), Some("5ebe2294ecd0e0f08eab7690d2a6ee69"));
        assert_eq!(map.get("mode"), Some("test"));
        assert_eq!(map.get("encoding"), Some("UTF-8"));
    }

    #[test]
    fn caller_supplied_card_details_are_never_overwritten() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::CreditCard),
            ..PaymentParams::default()
        };
        params.card.pan = Some(Secret::new("5500000000000004".to_string()));
        params.card.brand = Some("M".to_string());
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        let request =
            build_payment_request(RequestType::Authorization, &settings, params).unwrap();
        let map = body_map(&request);
        assert_eq!(map.get("cardpan"), Some("5500000000000004"));
        assert_eq!(map.get("cardtype"), Some("M"));
    }

    #[test]
    fn caller_redirect_urls_win_over_placeholders() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::CreditCard),
            redirect_urls: RedirectUrls {
                success: Some("https://shop.example/ok".to_string()),
                error: None,
                back: None,
            },
            ..PaymentParams::default()
        };
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        let request =
            build_payment_request(RequestType::Preauthorization, &settings, params).unwrap();
        let map = body_map(&request);
        assert_eq!(map.get("successurl"), Some("https://shop.example/ok"));
        assert_eq!(map.get("errorurl"), Some(DEFAULT_ERROR_URL));
    }

    #[test]
    fn disabled_three_ds_sends_the_opt_out_flag() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::CreditCard),
            ..PaymentParams::default()
        };
        let mut settings = settings();
        settings.three_ds_enabled = false;
        resolve_payment_method(&mut params, &settings);
        let request =
            build_payment_request(RequestType::Preauthorization, &settings, params).unwrap();
        let map = body_map(&request);
        assert_eq!(map.get("3dsecure"), Some("no"));
        assert_eq!(map.get("successurl"), None);
    }

    #[test]
    fn wallet_requests_never_carry_a_card_brand() {
        for method in [
            PaymentMethod::Wallet,
            PaymentMethod::GooglePay,
            PaymentMethod::ApplePay,
        ] {
            let mut params = PaymentParams {
                method: Some(method),
                ..PaymentParams::default()
            };
            params.card.brand = Some("V".to_string());
            let settings = settings();
            resolve_payment_method(&mut params, &settings);
            let request =
                build_payment_request(RequestType::Authorization, &settings, params).unwrap();
            let map = body_map(&request);
            assert_eq!(map.get("cardtype"), None, "{method:?}");
            assert_eq!(map.get("clearingtype"), Some("wlt"), "{method:?}");
        }
    }

    #[test]
    fn wallet_variants_pin_their_sub_code() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::GooglePay),
            ..PaymentParams::default()
        };
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        assert_eq!(params.wallet_type, Some(WalletType::GooglePay));

        let mut params = PaymentParams {
            method: Some(PaymentMethod::Wallet),
            ..PaymentParams::default()
        };
        resolve_payment_method(&mut params, &settings);
        assert_eq!(params.wallet_type, Some(WalletType::Paypal));
    }

    #[test]
    fn wallet_token_is_rewritten_into_paydata() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::ApplePay),
            wallet: WalletParams {
                token: Some(Secret::new("opaque-token".to_string())),
                token_data: None,
            },
            ..PaymentParams::default()
        };
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        assert!(params.wallet.token.is_none());
        let request =
            build_payment_request(RequestType::Authorization, &settings, params).unwrap();
        let map = body_map(&request);
        assert_eq!(
            map.get("add_paydata[paymentmethod_token_data]"),
            Some("opaque-token")
        );
        assert_eq!(map.get("add_paydata[paymentmethod]"), Some("APL"));
        assert_eq!(map.get("add_paydata[paymentmethod_type]"), Some("APPLEPAY"));
        assert_eq!(map.get("add_paydata[gateway]"), Some(WALLET_GATEWAY_ID));
        assert_eq!(map.get("add_paydata[gateway_merchant_id]"), Some("77"));
        assert_eq!(map.get("wallettype"), Some("APL"));
    }

    #[test]
    fn builder_level_wallet_fallback_keys_on_token_presence() {
        // Token data present: Google Pay code.
        let mut params = PaymentParams {
            method: Some(PaymentMethod::Wallet),
            ..PaymentParams::default()
        };
        params.paydata = Some(TokenPaydata {
            token_data: Secret::new("tok".to_string()),
            payment_method: "APL".to_string(),
            payment_method_type: "APPLEPAY".to_string(),
            gateway: WALLET_GATEWAY_ID.to_string(),
            gateway_merchant_id: None,
        });
        let settings = settings();
        let request =
            build_payment_request(RequestType::Authorization, &settings, params).unwrap();
        assert_eq!(request.wallettype, Some(WalletType::GooglePay));

        // No token data: PayPal code.
        let params = PaymentParams {
            method: Some(PaymentMethod::Wallet),
            ..PaymentParams::default()
        };
        let request =
            build_payment_request(RequestType::Authorization, &settings, params).unwrap();
        assert_eq!(request.wallettype, Some(WalletType::Paypal));
    }

    #[test]
    fn bank_redirect_defaults_follow_the_scheme() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::OnlineBankTransfer),
            ..PaymentParams::default()
        };
        params.bank.transfer_kind = Some(BankTransferKind::Ideal);
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        let request =
            build_payment_request(RequestType::Authorization, &settings, params).unwrap();
        let map = body_map(&request);
        assert_eq!(map.get("onlinebanktransfertype"), Some("IDL"));
        assert_eq!(map.get("bankcountry"), Some("NL"));
    }

    #[test]
    fn direct_debit_holder_derives_from_caller_name() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::DirectDebit),
            ..PaymentParams::default()
        };
        params.customer.first_name = Some("Erika".to_string());
        params.customer.last_name = Some("Mustermann".to_string());
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        assert_eq!(
            params.bank.account_holder.as_deref(),
            Some("Erika Mustermann")
        );
    }

    #[test]
    fn overlong_reference_is_normalized_on_the_wire() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::CreditCard),
            reference: Some("order-2024/08/26-0000012345".to_string()),
            ..PaymentParams::default()
        };
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        let request =
            build_payment_request(RequestType::Authorization, &settings, params).unwrap();
        let reference = request.reference.unwrap();
        assert!(reference.len() <= 20);
        assert!(reference.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn redirect_status_with_url_is_classified_as_step_up() {
        let map = ResponseMap::decode(
            "status=REDIRECT&txid=42&redirecturl=https%3A%2F%2F3ds.example%2Fauth",
        );
        let response = classify_response(&map);
        assert!(response.requires_three_ds_redirect());
        assert_eq!(
            response.three_ds_redirect_url(),
            Some("https://3ds.example/auth")
        );
        assert_eq!(response.txid.as_deref(), Some("42"));
    }

    #[test]
    fn step_up_sentinel_without_url_reports_three_ds_without_fabricating() {
        let map = ResponseMap::decode("status=ERROR&errorcode=4219&errormessage=3DS+required");
        let response = classify_response(&map);
        assert!(response.three_ds_required);
        assert_eq!(response.redirect_url, None);
        assert_eq!(response.error_code.as_deref(), Some("4219"));
    }

    #[test]
    fn status_defaults_to_unknown_and_is_upper_cased() {
        let response = classify_response(&ResponseMap::decode("txid=1"));
        assert_eq!(response.status, "UNKNOWN");

        let response = classify_response(&ResponseMap::decode("status=approved"));
        assert_eq!(response.status, "APPROVED");
        assert!(response.is_approved());
    }

    #[test]
    fn transaction_id_fallback_chain_prefers_txid() {
        let map = ResponseMap::decode("txid=1&transactionid=2&id=3");
        assert_eq!(extract_transaction_id(&map).as_deref(), Some("1"));
        let map = ResponseMap::decode("transaction_id=2&id=3");
        assert_eq!(extract_transaction_id(&map).as_deref(), Some("2"));
    }

    #[test]
    fn nested_error_objects_feed_the_fallback_chain() {
        let map = ResponseMap::decode(
            r#"{"status": "ERROR", "error": {"code": "33", "message": "expired"}}"#,
        );
        let response = classify_response(&map);
        assert_eq!(response.error_code.as_deref(), Some("33"));
        assert_eq!(response.error_message.as_deref(), Some("expired"));
    }

    #[test]
    fn snapshot_masks_secrets_but_keeps_routing_fields() {
        let mut params = PaymentParams {
            method: Some(PaymentMethod::CreditCard),
            amount: Some(1000),
            currency: Some("EUR".to_string()),
            ..PaymentParams::default()
        };
        let settings = settings();
        resolve_payment_method(&mut params, &settings);
        let request =
            build_payment_request(RequestType::Preauthorization, &settings, params).unwrap();
        let body = encode_form(&request).unwrap();
        let snapshot = masked_request_snapshot(&body);
        assert_eq!(snapshot.get("cardpan").map(String::as_str), Some("************1111"));
        assert_eq!(snapshot.get("cardcvc2").map(String::as_str), Some(MASKED_VALUE));
        assert_eq!(snapshot.get("key").map(String::as_str), Some(MASKED_VALUE));
        assert_eq!(snapshot.get("amount").map(String::as_str), Some("1000"));
        assert_eq!(snapshot.get("currency").map(String::as_str), Some("EUR"));
    }

    #[test]
    fn apple_pay_session_request_is_a_generic_payment() {
        let settings = settings();
        let request = build_apple_pay_session_request(&settings, &PaymentParams::default());
        let map = body_map(&request);
        assert_eq!(map.get("request"), Some("genericpayment"));
        assert_eq!(map.get("clearingtype"), Some("wlt"));
        assert_eq!(map.get("wallettype"), Some("APL"));
        assert_eq!(map.get("add_paydata[action]"), Some("getapplepaysession"));
    }

    #[test]
    fn apple_pay_session_decodes_and_normalizes_timestamps() {
        let session_json = r#"{"merchantIdentifier":"merchant.example.shop","epochTimestamp":1700000000000,"expiresAt":1700003600000,"domainName":"shop.example"}"#;
        let blob = BASE64_ENGINE.encode(session_json);
        let mut body = url::form_urlencoded::Serializer::new(String::new());
        body.append_pair("status", "OK");
        body.append_pair("add_paydata[session]", &blob);
        let map = ResponseMap::decode(&body.finish());
        let session = decode_apple_pay_session(&map).unwrap().unwrap();
        assert_eq!(
            session.merchant_identifier.as_deref(),
            Some("merchant.example.shop")
        );
        assert_eq!(session.epoch_timestamp, Some(1_700_000_000));
        assert_eq!(session.expires_at, Some(1_700_003_600));
    }

    #[test]
    fn session_without_merchant_identifier_is_rejected() {
        let blob = BASE64_ENGINE.encode(r#"{"domainName":"shop.example"}"#);
        let mut body = url::form_urlencoded::Serializer::new(String::new());
        body.append_pair("status", "OK");
        body.append_pair("add_paydata[session]", &blob);
        let map = ResponseMap::decode(&body.finish());
        let error = decode_apple_pay_session(&map).unwrap_err();
        assert_eq!(
            error.current_context(),
            &GatewayError::SessionInvalid {
                reason: "missing merchant identifier"
            }
        );
    }

    #[test]
    fn failed_session_init_yields_none() {
        let map = ResponseMap::decode("status=ERROR&errorcode=1000");
        assert!(decode_apple_pay_session(&map).unwrap().is_none());
    }
}
