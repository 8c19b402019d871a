use crate::domain::form::{CardForm, PaymentForm};
use crate::domain::payment::{CardDetails, PaymentMethod, PaymentRequest};
use crate::error::{CheckoutError, Result};

/// Turns raw form input into a normalized [`PaymentRequest`].
///
/// Only presence is checked, plus the shape of the card expiry. Instrument
/// validity (Luhn, VPA syntax, expiry in the past) is left to the gateway.
pub struct PaymentRequestBuilder;

impl PaymentRequestBuilder {
    pub fn build(order_id: &str, form: &PaymentForm) -> Result<PaymentRequest> {
        let method = match form {
            PaymentForm::Upi { vpa } => PaymentMethod::Upi {
                vpa: required("vpa", vpa)?.to_string(),
            },
            PaymentForm::Card(card) => PaymentMethod::Card(card_details(card)?),
        };
        Ok(PaymentRequest::new(order_id, method))
    }
}

fn card_details(card: &CardForm) -> Result<CardDetails> {
    let number = required("number", &card.number)?;
    let expiry = required("expiry", &card.expiry)?;
    let cvv = required("cvv", &card.cvv)?;
    let holder_name = required("name", &card.name)?;
    let (expiry_month, expiry_year) = split_expiry(expiry)?;

    Ok(CardDetails {
        number: number.to_string(),
        expiry_month: expiry_month.to_string(),
        expiry_year: expiry_year.to_string(),
        cvv: cvv.to_string(),
        holder_name: holder_name.to_string(),
    })
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(CheckoutError::ValidationError(format!(
            "{} is required",
            field
        )))
    } else {
        Ok(value)
    }
}

/// Splits `MM/YY` into its two parts. Both must be non-empty and numeric;
/// ranges are not checked.
fn split_expiry(expiry: &str) -> Result<(&str, &str)> {
    let malformed =
        || CheckoutError::ValidationError(format!("expiry '{}' is not in MM/YY format", expiry));

    let (month, year) = expiry.trim().split_once('/').ok_or_else(malformed)?;
    let numeric = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
    if numeric(month) && numeric(year) {
        Ok((month, year))
    } else {
        Err(malformed())
    }
}
