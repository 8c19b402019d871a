use crate::config::CheckoutConfig;
use crate::domain::order::Order;
use crate::domain::payment::{PaymentIntentId, PaymentRequest, StatusReport};
use crate::domain::ports::{IntentStatusQuery, OrderLoader, PaymentSubmitter};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct CreatedPayment {
    id: PaymentIntentId,
}

/// Gateway adapter for the public checkout REST API.
///
/// - `GET  {base}/orders/{id}`
/// - `POST {base}/payments`
/// - `GET  {base}/payments/{id}`
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(config: &CheckoutConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| CheckoutError::Config(format!("invalid API base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::Config(format!(
                "API base URL '{}' cannot take a path",
                base_url
            )));
        }
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Pulls a human-readable message out of an error body. Understands both
/// `{"detail": "..."}` and `{"detail": {"error": {"description": "..."}}}`.
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    match detail {
        Value::String(message) => Some(message.clone()),
        other => other
            .pointer("/error/description")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

#[async_trait]
impl OrderLoader for HttpGateway {
    #[instrument(skip(self))]
    async fn load(&self, order_id: &str) -> Result<Order> {
        let not_found = |reason: String| CheckoutError::NotFound(format!("{} ({})", order_id, reason));

        let response = self
            .client
            .get(self.endpoint(&["orders", order_id]))
            .send()
            .await
            .map_err(|e| not_found(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CheckoutError::NotFound(order_id.to_string())),
            status if !status.is_success() => Err(not_found(format!("gateway returned {}", status))),
            _ => response
                .json::<Order>()
                .await
                .map_err(|e| not_found(format!("unreadable order: {}", e))),
        }
    }
}

#[async_trait]
impl PaymentSubmitter for HttpGateway {
    #[instrument(skip(self, request), fields(order_id = request.order_id(), method = request.method().name()))]
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentIntentId> {
        let response = self
            .client
            .post(self.endpoint(&["payments"]))
            .json(&request.body())
            .send()
            .await
            .map_err(|e| CheckoutError::SubmissionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match error_detail(&body) {
                Some(detail) => format!("gateway returned {}: {}", status, detail),
                None => format!("gateway returned {}", status),
            };
            return Err(CheckoutError::SubmissionError(message));
        }

        let created = response
            .json::<CreatedPayment>()
            .await
            .map_err(|e| CheckoutError::SubmissionError(format!("unreadable response: {}", e)))?;
        debug!(intent = %created.id, "payment intent created");
        Ok(created.id)
    }
}

#[async_trait]
impl IntentStatusQuery for HttpGateway {
    async fn status(&self, intent_id: &PaymentIntentId) -> Result<StatusReport> {
        let response = self
            .client
            .get(self.endpoint(&["payments", intent_id.as_str()]))
            .send()
            .await
            .map_err(|e| CheckoutError::PollError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutError::PollError(format!(
                "gateway returned {} for {}",
                status, intent_id
            )));
        }
        response
            .json::<StatusReport>()
            .await
            .map_err(|e| CheckoutError::PollError(format!("unreadable status: {}", e)))
    }
}
