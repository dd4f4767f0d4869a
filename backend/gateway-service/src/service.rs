use std::collections::HashMap;

use connector_integration::payone::{
    self,
    codec::{encode_form, ResponseMap},
    transformers::{
        build_apple_pay_session_request, build_payment_request, classify_response,
        decode_apple_pay_session, masked_request_snapshot, resolve_payment_method, PayoneRequest,
    },
};
use domain_types::{
    errors::{CustomResult, GatewayError},
    payment::{PaymentMethod, PaymentParams},
    response::{ApplePaySession, CallbackKind, GatewayResponse, ThreeDsCallbackResult, ThreeDsStatus},
    settings::{MerchantSettings, MerchantSettingsUpdate},
    transaction::{RequestType, TransactionFilter, TransactionRecord},
};
use time::OffsetDateTime;

use crate::{
    ledger::TransactionLedger, settings::SettingsRepository, transport::ProcessorTransport,
};

pub const DEFAULT_AMOUNT_MINOR: i64 = 100;
pub const DEFAULT_CURRENCY: &str = "EUR";

const PLACEHOLDER_FIRST_NAME: &str = "Test";
const PLACEHOLDER_LAST_NAME: &str = "Person";
const PLACEHOLDER_STREET: &str = "Teststrasse 7";
const PLACEHOLDER_ZIP: &str = "12345";
const PLACEHOLDER_CITY: &str = "Berlin";
const PLACEHOLDER_COUNTRY: &str = "DE";
const PLACEHOLDER_EMAIL: &str = "test@example.com";

/// One payment service per merchant. Every processor call runs the same
/// pipeline: load and validate settings, resolve the payment method,
/// build and encode the request, dispatch, classify, log.
pub struct PaymentService<R, T> {
    settings: R,
    transport: T,
    ledger: TransactionLedger,
}

impl<R, T> PaymentService<R, T>
where
    R: SettingsRepository,
    T: ProcessorTransport,
{
    pub fn new(settings: R, transport: T) -> Self {
        Self {
            settings,
            transport,
            ledger: TransactionLedger::new(),
        }
    }

    /// Reserve an amount on a payment instrument. Missing parameters are
    /// filled with demo defaults so a bare request still forms a complete
    /// processor call.
    pub async fn preauthorization(
        &self,
        mut params: PaymentParams,
    ) -> CustomResult<GatewayResponse, GatewayError> {
        params.method.get_or_insert(PaymentMethod::CreditCard);
        params.amount.get_or_insert(DEFAULT_AMOUNT_MINOR);
        params
            .currency
            .get_or_insert_with(|| DEFAULT_CURRENCY.to_string());
        params
            .reference
            .get_or_insert_with(|| format!("PREAUTH-{}", epoch_millis()));
        fill_placeholder_identity(&mut params);
        self.execute(RequestType::Preauthorization, params).await
    }

    /// Authorize and collect in one step.
    pub async fn authorization(
        &self,
        mut params: PaymentParams,
    ) -> CustomResult<GatewayResponse, GatewayError> {
        params.method.get_or_insert(PaymentMethod::CreditCard);
        self.execute(RequestType::Authorization, params).await
    }

    /// Collect a previously reserved amount. Requires the processor
    /// transaction id; any caller reference is dropped since the capture
    /// is keyed by txid alone.
    pub async fn capture(
        &self,
        mut params: PaymentParams,
    ) -> CustomResult<GatewayResponse, GatewayError> {
        require_txid(&params)?;
        params.method = None;
        params.reference = None;
        params.amount.get_or_insert(DEFAULT_AMOUNT_MINOR);
        params
            .currency
            .get_or_insert_with(|| DEFAULT_CURRENCY.to_string());
        self.execute(RequestType::Capture, params).await
    }

    /// Return funds for a captured transaction. The refund amount is
    /// always sent negative regardless of the caller's sign.
    pub async fn refund(
        &self,
        mut params: PaymentParams,
    ) -> CustomResult<GatewayResponse, GatewayError> {
        require_txid(&params)?;
        params.method = None;
        let amount = params.amount.unwrap_or(DEFAULT_AMOUNT_MINOR);
        params.amount = Some(-amount.abs());
        params
            .currency
            .get_or_insert_with(|| DEFAULT_CURRENCY.to_string());
        params
            .reference
            .get_or_insert_with(|| format!("REFUND-{}", epoch_millis()));
        self.execute(RequestType::Refund, params).await
    }

    async fn execute(
        &self,
        request_type: RequestType,
        mut params: PaymentParams,
    ) -> CustomResult<GatewayResponse, GatewayError> {
        let settings = self.settings.load();
        settings.validate()?;
        resolve_payment_method(&mut params, &settings);
        let request = build_payment_request(request_type, &settings, params)?;
        let body = encode_form(&request)?;
        let request_snapshot = masked_request_snapshot(&body);
        tracing::info!(%request_type, reference = ?request.reference, "dispatching processor call");

        let text = self
            .transport
            .send_form(payone::endpoints::PAYMENT, body)
            .await?;
        let response = classify_response(&ResponseMap::decode(&text));
        tracing::info!(status = %response.status, txid = ?response.txid, "processor call classified");

        self.ledger
            .log(build_record(&request, &response, request_snapshot));
        Ok(response)
    }

    /// Interpret a payer redirect after the 3DS challenge. The outcome is
    /// keyed on which return path was hit; the payload only contributes
    /// identifiers. An unrecognized return path stays pending. Nothing is
    /// written to the ledger.
    pub fn handle_three_ds_callback(
        &self,
        kind: Option<CallbackKind>,
        raw: HashMap<String, String>,
    ) -> ThreeDsCallbackResult {
        let (success, status) = match kind {
            Some(CallbackKind::Success) => (true, ThreeDsStatus::Approved),
            Some(CallbackKind::Error) => (false, ThreeDsStatus::Error),
            Some(CallbackKind::Back) => (false, ThreeDsStatus::Cancelled),
            None => (false, ThreeDsStatus::Pending),
        };
        let txid = first_raw(&raw, &["txid", "transactionid", "transaction_id"]);
        let reference = first_raw(&raw, &["reference", "ref"]);
        ThreeDsCallbackResult {
            success,
            status,
            txid,
            reference,
            raw,
        }
    }

    /// Fetch a wallet-provider merchant session for Apple Pay merchant
    /// validation. `Ok(None)` means the processor answered but did not
    /// produce a usable session.
    pub async fn validate_apple_pay_merchant(
        &self,
        params: &PaymentParams,
    ) -> CustomResult<Option<ApplePaySession>, GatewayError> {
        let settings = self.settings.load();
        settings.validate()?;
        let request = build_apple_pay_session_request(&settings, params);
        let body = encode_form(&request)?;
        let text = self
            .transport
            .send_form(payone::endpoints::SESSION_INIT, body)
            .await?;
        decode_apple_pay_session(&ResponseMap::decode(&text))
    }

    pub fn transaction_history(&self, filter: &TransactionFilter) -> Vec<TransactionRecord> {
        self.ledger.query(filter)
    }

    pub fn get_settings(&self) -> MerchantSettings {
        self.settings.load().masked()
    }

    pub fn update_settings(&self, update: MerchantSettingsUpdate) -> MerchantSettings {
        self.settings.apply(update).masked()
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }
}

fn require_txid(params: &PaymentParams) -> CustomResult<(), GatewayError> {
    match params.txid.as_deref() {
        Some(txid) if !txid.trim().is_empty() => Ok(()),
        _ => Err(GatewayError::MissingRequiredField { field_name: "txid" }.into()),
    }
}

fn fill_placeholder_identity(params: &mut PaymentParams) {
    let customer = &mut params.customer;
    customer
        .first_name
        .get_or_insert_with(|| PLACEHOLDER_FIRST_NAME.to_string());
    customer
        .last_name
        .get_or_insert_with(|| PLACEHOLDER_LAST_NAME.to_string());
    customer
        .street
        .get_or_insert_with(|| PLACEHOLDER_STREET.to_string());
    customer
        .zip
        .get_or_insert_with(|| PLACEHOLDER_ZIP.to_string());
    customer
        .city
        .get_or_insert_with(|| PLACEHOLDER_CITY.to_string());
    customer
        .country
        .get_or_insert_with(|| PLACEHOLDER_COUNTRY.to_string());
    customer
        .email
        .get_or_insert_with(|| PLACEHOLDER_EMAIL.to_string());
}

fn build_record(
    request: &PayoneRequest,
    response: &GatewayResponse,
    request_snapshot: HashMap<String, String>,
) -> TransactionRecord {
    let now = OffsetDateTime::now_utc();
    TransactionRecord {
        id: epoch_millis(),
        timestamp: now,
        txid: response.txid.clone(),
        reference: request.reference.clone(),
        request_type: request.request,
        amount: request.amount,
        currency: request.currency.clone(),
        status: response.status.clone(),
        error_code: response.error_code.clone(),
        error_message: response.error_message.clone(),
        customer_message: response.customer_message.clone(),
        request_snapshot,
        response_snapshot: response.raw.clone(),
        created_at: now,
        updated_at: now,
    }
}

fn epoch_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn first_raw(raw: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| raw.get(*key).cloned())
}
