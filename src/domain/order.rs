use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "INR".to_string()
}

/// A purchase awaiting payment.
///
/// `amount` is expressed in minor currency units (paise for INR). An order is
/// immutable once loaded; the checkout session owns it for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Gateway-side order status (e.g. `created`, `paid`), if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
}

impl Order {
    pub fn new(id: impl Into<String>, amount: i64) -> Self {
        Self {
            id: id.into(),
            amount,
            currency: default_currency(),
            status: None,
            merchant_name: None,
        }
    }

    /// The amount in major units, exact to two decimal places.
    pub fn major_amount(&self) -> Decimal {
        Decimal::new(self.amount, 2)
    }

    /// Formats the amount for display: minor units divided by 100, always
    /// rendered with exactly two decimals (`15000` -> `"150.00"`).
    pub fn display_amount(&self) -> String {
        format!("{:.2}", self.major_amount())
    }
}
