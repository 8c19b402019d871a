use serde::{Deserialize, Serialize};
use std::fmt;

/// Card details as submitted to the gateway.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub holder_name: String,
}

impl CardDetails {
    /// The last four characters of the card number, or the whole number if shorter.
    pub fn last4(&self) -> &str {
        let start = self
            .number
            .char_indices()
            .rev()
            .nth(3)
            .map_or(0, |(idx, _)| idx);
        &self.number[start..]
    }
}

// Card numbers and CVVs must never reach the logs.
impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("****{}", self.last4()))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvv", &"***")
            .field("holder_name", &self.holder_name)
            .finish()
    }
}

/// A normalized payment instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    Upi { vpa: String },
    Card(CardDetails),
}

impl PaymentMethod {
    /// Wire name of the method (`"upi"` or `"card"`).
    pub fn name(&self) -> &'static str {
        match self {
            PaymentMethod::Upi { .. } => "upi",
            PaymentMethod::Card(_) => "card",
        }
    }
}

/// The normalized submission payload. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    order_id: String,
    method: PaymentMethod,
}

impl PaymentRequest {
    pub fn new(order_id: impl Into<String>, method: PaymentMethod) -> Self {
        Self {
            order_id: order_id.into(),
            method,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn method(&self) -> &PaymentMethod {
        &self.method
    }

    /// Borrowed JSON body for `POST /payments`.
    pub fn body(&self) -> CreatePaymentBody<'_> {
        let (vpa, card) = match &self.method {
            PaymentMethod::Upi { vpa } => (Some(vpa.as_str()), None),
            PaymentMethod::Card(card) => (None, Some(card)),
        };
        CreatePaymentBody {
            order_id: &self.order_id,
            method: self.method.name(),
            vpa,
            card,
        }
    }
}

/// Wire shape of a payment creation request.
#[derive(Debug, Serialize)]
pub struct CreatePaymentBody<'a> {
    pub order_id: &'a str,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpa: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<&'a CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentIntentId(pub String);

impl PaymentIntentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentIntentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The gateway reports in-flight payments as `processing`.
    #[serde(alias = "processing", alias = "created")]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }
}

/// Why the gateway declined a payment, when it says so.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GatewayFailure {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Body of `GET /payments/{id}`. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub status: PaymentStatus,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl StatusReport {
    pub fn pending() -> Self {
        Self::with_status(PaymentStatus::Pending)
    }

    pub fn with_status(status: PaymentStatus) -> Self {
        Self {
            status,
            error_code: None,
            error_description: None,
        }
    }

    fn failure(&self) -> Option<GatewayFailure> {
        if self.error_code.is_none() && self.error_description.is_none() {
            return None;
        }
        Some(GatewayFailure {
            code: self.error_code.clone(),
            description: self.error_description.clone(),
        })
    }
}

/// The gateway-side record of one payment attempt.
///
/// Status only moves forward: once `Success` or `Failed` is observed, later
/// reports are ignored. A new submission always produces a new intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub status: PaymentStatus,
    pub failure: Option<GatewayFailure>,
}

impl PaymentIntent {
    pub fn new(id: PaymentIntentId) -> Self {
        Self {
            id,
            status: PaymentStatus::Pending,
            failure: None,
        }
    }

    /// Folds a status report into the intent. Returns `true` if anything changed.
    pub fn observe(&mut self, report: &StatusReport) -> bool {
        if self.status.is_terminal() || report.status == self.status {
            return false;
        }
        self.status = report.status;
        if report.status == PaymentStatus::Failed {
            self.failure = report.failure();
        }
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
