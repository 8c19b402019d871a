use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Payment submission failed: {0}")]
    SubmissionError(String),
    #[error("Status query failed: {0}")]
    PollError(String),
    #[error("Cannot {action} while checkout is {state}")]
    InvalidTransition { action: &'static str, state: String },
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = CheckoutError> = std::result::Result<T, E>;
