//! Application layer containing the checkout orchestration.
//!
//! `CheckoutStateMachine` is the entry point: it owns the session and drives
//! the request builder, the payment submitter and the status poller. Polls run
//! as `tokio` tasks that report back over channels and are cancelled through
//! an explicit token.

pub mod builder;
pub mod cancel;
pub mod checkout;
pub mod poller;
