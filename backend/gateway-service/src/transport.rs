use std::time::Duration;

use domain_types::errors::{CustomResult, GatewayError};
use error_stack::Report;

pub const PROCESSOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire seam for processor calls. The payload is an already form-encoded
/// body; the response is the raw text, left for the codec to decode.
#[async_trait::async_trait]
pub trait ProcessorTransport: Send + Sync {
    async fn send_form(&self, url: &str, body: String) -> CustomResult<String, GatewayError>;
}

/// HTTPS transport with a fixed request timeout.
pub struct HttpProcessorTransport {
    client: reqwest::Client,
}

impl HttpProcessorTransport {
    pub fn new() -> CustomResult<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(PROCESSOR_TIMEOUT)
            .build()
            .map_err(|error| {
                Report::new(GatewayError::NetworkError {
                    reason: error.to_string(),
                })
            })?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ProcessorTransport for HttpProcessorTransport {
    async fn send_form(&self, url: &str, body: String) -> CustomResult<String, GatewayError> {
        let response = self
            .client
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(classify_transport_error)?;
        let status = response.status();
        tracing::debug!(%status, "processor responded");
        response.text().await.map_err(classify_transport_error)
    }
}

fn classify_transport_error(error: reqwest::Error) -> Report<GatewayError> {
    if error.is_timeout() {
        Report::new(GatewayError::RequestTimeout)
    } else {
        Report::new(GatewayError::NetworkError {
            reason: error.to_string(),
        })
    }
}
