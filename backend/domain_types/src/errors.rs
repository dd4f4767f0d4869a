pub type CustomResult<T, E> = Result<T, error_stack::Report<E>>;

/// Failures that abort an operation before a classified outcome exists.
///
/// Processor-reported declines are not part of this taxonomy: a declined
/// payment is an expected business outcome and is returned as a classified
/// response so callers can inspect status and error fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Merchant configuration incomplete: {field} is not set")]
    ConfigurationIncomplete { field: &'static str },
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("Request encoding failed")]
    RequestEncodingFailed,
    #[error("Response deserialization failed")]
    ResponseDeserializationFailed,
    #[error("Failed to reach the processor: {reason}")]
    NetworkError { reason: String },
    #[error("Request to the processor timed out")]
    RequestTimeout,
    #[error("Apple Pay merchant session rejected: {reason}")]
    SessionInvalid { reason: &'static str },
}
