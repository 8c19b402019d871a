use super::order::Order;
use super::payment::{PaymentIntentId, PaymentRequest, StatusReport};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait OrderLoader: Send + Sync {
    /// Fails with `NotFound` if the order is missing or the lookup errors.
    async fn load(&self, order_id: &str) -> Result<Order>;
}

#[async_trait]
pub trait PaymentSubmitter: Send + Sync {
    /// Creates a payment intent. Fails with `SubmissionError`.
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentIntentId>;
}

#[async_trait]
pub trait IntentStatusQuery: Send + Sync {
    /// Fetches the current status of an intent. Fails with `PollError`.
    async fn status(&self, intent_id: &PaymentIntentId) -> Result<StatusReport>;
}

pub type OrderLoaderRef = Arc<dyn OrderLoader>;
pub type PaymentSubmitterRef = Arc<dyn PaymentSubmitter>;
pub type IntentStatusQueryRef = Arc<dyn IntentStatusQuery>;
