use super::builder::PaymentRequestBuilder;
use super::poller::{PollEvent, PollHandle, PollOutcome, StatusPoller};
use crate::domain::form::{FormField, MethodKind, PaymentForm};
use crate::domain::order::Order;
use crate::domain::payment::{GatewayFailure, PaymentIntent, PaymentStatus};
use crate::domain::ports::{OrderLoader, PaymentSubmitter, PaymentSubmitterRef};
use crate::error::{CheckoutError, Result};
use std::fmt;
use tracing::{debug, info, warn};

/// Why a checkout attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The gateway refused the submission, or it never reached the gateway.
    SubmissionRejected(String),
    /// The intent resolved to `Failed`.
    Declined(Option<GatewayFailure>),
    /// The intent was still pending when the poll gave up.
    TimedOut,
    /// A status query failed, so the outcome is unknown.
    StatusUnavailable(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SubmissionRejected(message) => {
                write!(f, "payment could not be submitted: {}", message)
            }
            FailureReason::Declined(Some(GatewayFailure {
                description: Some(description),
                ..
            })) => write!(f, "payment declined: {}", description),
            FailureReason::Declined(_) => f.write_str("payment declined"),
            FailureReason::TimedOut => f.write_str("payment status did not resolve in time"),
            FailureReason::StatusUnavailable(message) => {
                write!(f, "payment status unavailable: {}", message)
            }
        }
    }
}

/// UI-facing checkout state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Initial,
    Processing,
    Success,
    Failed(FailureReason),
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::Initial => "initial",
            CheckoutState::Processing => "processing",
            CheckoutState::Success => "success",
            CheckoutState::Failed(_) => "failed",
        };
        f.write_str(name)
    }
}

/// Owns one checkout session and sequences load, submit and poll.
///
/// A state machine only exists once its order has loaded, so there is no
/// state before `Initial`. All transitions go through `&mut self`; the live
/// poll (at most one) is owned here and cancelled on retry, on reaching a
/// terminal state, and on teardown.
pub struct CheckoutStateMachine {
    order: Order,
    form: Option<PaymentForm>,
    state: CheckoutState,
    intent: Option<PaymentIntent>,
    submitter: PaymentSubmitterRef,
    poller: StatusPoller,
    poll: Option<PollHandle>,
}

impl CheckoutStateMachine {
    /// Loads the order and opens the session in `Initial`.
    ///
    /// A failed load returns `NotFound` and no session; there is no retry.
    pub async fn initialize(
        order_id: &str,
        orders: &dyn OrderLoader,
        submitter: PaymentSubmitterRef,
        poller: StatusPoller,
    ) -> Result<Self> {
        let order = orders.load(order_id).await.inspect_err(|e| {
            warn!(order_id, error = %e, "order lookup failed");
        })?;
        info!(order_id = %order.id, amount = order.amount, currency = %order.currency, "order loaded");

        Ok(Self {
            order,
            form: None,
            state: CheckoutState::Initial,
            intent: None,
            submitter,
            poller,
            poll: None,
        })
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn form(&self) -> Option<&PaymentForm> {
        self.form.as_ref()
    }

    /// The intent of the current attempt, if one was created.
    pub fn intent(&self) -> Option<&PaymentIntent> {
        self.intent.as_ref()
    }

    pub fn has_active_poll(&self) -> bool {
        self.poll.is_some()
    }

    /// Chooses a payment method. Re-selecting the current method keeps the
    /// entered fields; switching methods starts from an empty form.
    pub fn select_method(&mut self, kind: MethodKind) -> Result<()> {
        self.expect_state("select a payment method", |s| *s == CheckoutState::Initial)?;
        if self.form.as_ref().map(PaymentForm::kind) != Some(kind) {
            debug!(method = %kind, "payment method selected");
            self.form = Some(PaymentForm::empty(kind));
        }
        Ok(())
    }

    /// Fills one field of the selected method's form.
    pub fn enter(&mut self, field: FormField, value: impl Into<String>) -> Result<()> {
        self.expect_state("edit payment details", |s| *s == CheckoutState::Initial)?;
        self.form
            .as_mut()
            .ok_or_else(no_method_selected)?
            .set(field, value)
    }

    /// Builds and submits the payment, then starts polling its status.
    ///
    /// Validation failures are returned as errors and leave the session in
    /// `Initial`. A rejected submission is not an error here: it moves the
    /// session to `Failed` without polling.
    pub async fn submit(&mut self) -> Result<&CheckoutState> {
        self.expect_state("submit a payment", |s| *s == CheckoutState::Initial)?;
        let form = self.form.as_ref().ok_or_else(no_method_selected)?;
        let request = PaymentRequestBuilder::build(&self.order.id, form)?;

        self.stop_poll().await;
        self.intent = None;
        self.state = CheckoutState::Processing;
        info!(order_id = %self.order.id, method = request.method().name(), "submitting payment");

        match self.submitter.submit(&request).await {
            Ok(intent_id) => {
                info!(order_id = %self.order.id, intent = %intent_id, "payment submitted, polling status");
                self.intent = Some(PaymentIntent::new(intent_id.clone()));
                self.poll = Some(self.poller.start(intent_id));
            }
            Err(e) => {
                warn!(order_id = %self.order.id, error = %e, "payment submission rejected");
                let message = match e {
                    CheckoutError::SubmissionError(message) => message,
                    other => other.to_string(),
                };
                self.state = CheckoutState::Failed(FailureReason::SubmissionRejected(message));
            }
        }
        Ok(&self.state)
    }

    /// Waits for the next poll event and applies it.
    ///
    /// Returns `None` once there is no poll left to wait on.
    pub async fn next_update(&mut self) -> Option<&CheckoutState> {
        let event = self.poll.as_mut()?.next().await;
        match event {
            Some(PollEvent::Pending { intent, .. }) => {
                self.intent = Some(intent);
            }
            Some(PollEvent::Finished(outcome)) => {
                self.stop_poll().await;
                self.finish(outcome);
            }
            None => {
                self.stop_poll().await;
                if self.state != CheckoutState::Processing {
                    return None;
                }
                warn!(order_id = %self.order.id, "status poll stopped without an outcome");
                self.state = CheckoutState::Failed(FailureReason::StatusUnavailable(
                    "status poll stopped unexpectedly".to_string(),
                ));
            }
        }
        Some(&self.state)
    }

    /// Drives the live poll until it ends and returns the resulting state.
    pub async fn wait_for_outcome(&mut self) -> &CheckoutState {
        while self.next_update().await.is_some() {}
        &self.state
    }

    /// Leaves `Failed` for a fresh attempt. Clears the form and any intent;
    /// the order is kept as loaded.
    pub fn retry(&mut self) -> Result<()> {
        self.expect_state("retry", |s| matches!(s, CheckoutState::Failed(_)))?;
        debug_assert!(self.poll.is_none(), "failed session still owns a poll");
        self.form = None;
        self.intent = None;
        self.state = CheckoutState::Initial;
        debug!(order_id = %self.order.id, "checkout reset for retry");
        Ok(())
    }

    /// Tears the session down, waiting for any live poll to stop.
    pub async fn close(mut self) {
        self.stop_poll().await;
    }

    fn finish(&mut self, outcome: PollOutcome) {
        if self.state != CheckoutState::Processing {
            return;
        }
        self.state = match outcome {
            PollOutcome::Resolved(intent) => {
                let next = match intent.status {
                    PaymentStatus::Success => CheckoutState::Success,
                    _ => CheckoutState::Failed(FailureReason::Declined(intent.failure.clone())),
                };
                self.intent = Some(intent);
                next
            }
            PollOutcome::TimedOut { .. } => CheckoutState::Failed(FailureReason::TimedOut),
            PollOutcome::Abandoned { error, .. } => {
                CheckoutState::Failed(FailureReason::StatusUnavailable(error))
            }
        };
        info!(order_id = %self.order.id, state = %self.state, "checkout finished");
    }

    async fn stop_poll(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.shutdown().await;
        }
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: impl Fn(&CheckoutState) -> bool,
    ) -> Result<()> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                action,
                state: self.state.to_string(),
            })
        }
    }
}

fn no_method_selected() -> CheckoutError {
    CheckoutError::ValidationError("no payment method selected".to_string())
}
