use crate::error::{CheckoutError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Upi,
    Card,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Upi => f.write_str("upi"),
            MethodKind::Card => f.write_str("card"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Vpa,
    CardNumber,
    Expiry,
    Cvv,
    HolderName,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormField::Vpa => "vpa",
            FormField::CardNumber => "number",
            FormField::Expiry => "expiry",
            FormField::Cvv => "cvv",
            FormField::HolderName => "name",
        };
        f.write_str(name)
    }
}

/// Raw card input as typed by the payer. `expiry` is expected as `MM/YY`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CardForm {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
    pub name: String,
}

impl fmt::Debug for CardForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardForm")
            .field("number", &format_args!("<{} chars>", self.number.len()))
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .field("name", &self.name)
            .finish()
    }
}

/// The selected payment method together with its raw field values.
///
/// Keeping both in one variant makes a UPI selection with card fields (or the
/// reverse) unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentForm {
    Upi { vpa: String },
    Card(CardForm),
}

impl PaymentForm {
    /// An empty form for the given method.
    pub fn empty(kind: MethodKind) -> Self {
        match kind {
            MethodKind::Upi => PaymentForm::Upi { vpa: String::new() },
            MethodKind::Card => PaymentForm::Card(CardForm::default()),
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            PaymentForm::Upi { .. } => MethodKind::Upi,
            PaymentForm::Card(_) => MethodKind::Card,
        }
    }

    /// Sets one field. Fails if the field does not belong to this method.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) -> Result<()> {
        let slot = match (self, field) {
            (PaymentForm::Upi { vpa }, FormField::Vpa) => vpa,
            (PaymentForm::Card(card), FormField::CardNumber) => &mut card.number,
            (PaymentForm::Card(card), FormField::Expiry) => &mut card.expiry,
            (PaymentForm::Card(card), FormField::Cvv) => &mut card.cvv,
            (PaymentForm::Card(card), FormField::HolderName) => &mut card.name,
            (form, field) => {
                return Err(CheckoutError::ValidationError(format!(
                    "field '{}' does not apply to {} payments",
                    field,
                    form.kind()
                )));
            }
        };
        *slot = value.into();
        Ok(())
    }
}
