use crate::application::checkout::CheckoutState;
use crate::domain::order::Order;
use std::io::{self, Write};

/// Renders checkout screens as plain text lines.
pub struct CheckoutRenderer<W: Write> {
    out: W,
    last: Option<CheckoutState>,
}

impl<W: Write> CheckoutRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Header shown above every state: merchant (if known) and amount.
    pub fn render_order(&mut self, order: &Order) -> io::Result<()> {
        if let Some(merchant) = &order.merchant_name {
            writeln!(self.out, "Paying to {}", merchant)?;
        }
        writeln!(self.out, "Order {}", order.id)?;
        writeln!(
            self.out,
            "Amount: {}{}",
            currency_prefix(&order.currency),
            order.display_amount()
        )
    }

    /// Renders `state` unless it is the same screen as last time.
    pub fn render_state(&mut self, state: &CheckoutState) -> io::Result<()> {
        if self.last.as_ref() == Some(state) {
            return Ok(());
        }
        match state {
            CheckoutState::Initial => writeln!(self.out, "Select a payment method: upi | card")?,
            CheckoutState::Processing => writeln!(self.out, "Processing secure payment...")?,
            CheckoutState::Success => writeln!(self.out, "Payment successful")?,
            CheckoutState::Failed(reason) => writeln!(self.out, "Payment failed: {}", reason)?,
        }
        self.last = Some(state.clone());
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn currency_prefix(currency: &str) -> String {
    match currency {
        "INR" => "₹".to_string(),
        other => format!("{} ", other),
    }
}
