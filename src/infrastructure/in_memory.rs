use crate::domain::order::Order;
use crate::domain::payment::{PaymentIntentId, PaymentRequest, PaymentStatus, StatusReport};
use crate::domain::ports::{IntentStatusQuery, OrderLoader, PaymentSubmitter};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct IntentScript {
    reports: VecDeque<StatusReport>,
    last: Option<StatusReport>,
    queries: usize,
    fail_after: Option<usize>,
}

#[derive(Default)]
struct GatewayState {
    orders: HashMap<String, Order>,
    submissions: Vec<PaymentRequest>,
    rejection: Option<String>,
    next_intent: u64,
    intents: HashMap<PaymentIntentId, IntentScript>,
}

/// An in-process payment gateway with scripted behaviour.
///
/// Orders are looked up in a table, submissions are recorded and receive
/// sequential intent ids (`pay_1`, `pay_2`, ...), and each intent replays a
/// scripted series of status reports. Once a script runs out the last report
/// repeats; an intent without a script stays pending.
///
/// Clones share state (`Arc<RwLock<..>>`), so a test can keep one handle while
/// the checkout holds another.
#[derive(Default, Clone)]
pub struct InMemoryGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new gateway with no orders.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_order(&self, order: Order) {
        let mut state = self.state.write().await;
        state.orders.insert(order.id.clone(), order);
    }

    /// Makes every following submission fail with `message`.
    pub async fn reject_submissions(&self, message: impl Into<String>) {
        self.state.write().await.rejection = Some(message.into());
    }

    pub async fn accept_submissions(&self) {
        self.state.write().await.rejection = None;
    }

    /// Every request accepted or rejected so far, in order.
    pub async fn submissions(&self) -> Vec<PaymentRequest> {
        self.state.read().await.submissions.clone()
    }

    pub async fn script_statuses(
        &self,
        intent_id: &str,
        statuses: impl IntoIterator<Item = PaymentStatus>,
    ) {
        self.script_reports(intent_id, statuses.into_iter().map(StatusReport::with_status))
            .await;
    }

    pub async fn script_reports(
        &self,
        intent_id: &str,
        reports: impl IntoIterator<Item = StatusReport>,
    ) {
        let mut state = self.state.write().await;
        let script = state.intents.entry(intent_id.into()).or_default();
        script.reports.extend(reports);
    }

    /// Makes status queries for `intent_id` fail once `successful` queries
    /// have been answered.
    pub async fn fail_status_after(&self, intent_id: &str, successful: usize) {
        let mut state = self.state.write().await;
        state.intents.entry(intent_id.into()).or_default().fail_after = Some(successful);
    }

    /// Number of status queries received for `intent_id`, failed ones included.
    pub async fn status_queries(&self, intent_id: &str) -> usize {
        let state = self.state.read().await;
        state
            .intents
            .get(&PaymentIntentId::from(intent_id))
            .map_or(0, |script| script.queries)
    }

    pub async fn total_status_queries(&self) -> usize {
        let state = self.state.read().await;
        state.intents.values().map(|script| script.queries).sum()
    }
}

#[async_trait]
impl OrderLoader for InMemoryGateway {
    async fn load(&self, order_id: &str) -> Result<Order> {
        let state = self.state.read().await;
        state
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| CheckoutError::NotFound(order_id.to_string()))
    }
}

#[async_trait]
impl PaymentSubmitter for InMemoryGateway {
    async fn submit(&self, request: &PaymentRequest) -> Result<PaymentIntentId> {
        let mut state = self.state.write().await;
        state.submissions.push(request.clone());

        if let Some(message) = &state.rejection {
            return Err(CheckoutError::SubmissionError(message.clone()));
        }
        if !state.orders.contains_key(request.order_id()) {
            return Err(CheckoutError::SubmissionError(format!(
                "order {} not found",
                request.order_id()
            )));
        }

        state.next_intent += 1;
        Ok(PaymentIntentId(format!("pay_{}", state.next_intent)))
    }
}

#[async_trait]
impl IntentStatusQuery for InMemoryGateway {
    async fn status(&self, intent_id: &PaymentIntentId) -> Result<StatusReport> {
        let mut state = self.state.write().await;
        let script = state.intents.entry(intent_id.clone()).or_default();
        script.queries += 1;

        if script.fail_after.is_some_and(|limit| script.queries > limit) {
            return Err(CheckoutError::PollError(format!(
                "status of {} unavailable",
                intent_id
            )));
        }

        let report = match script.reports.pop_front() {
            Some(report) => report,
            None => script.last.clone().unwrap_or_else(StatusReport::pending),
        };
        script.last = Some(report.clone());
        Ok(report)
    }
}
