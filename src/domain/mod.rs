//! Domain model of a checkout: orders, payment forms, requests and intents,
//! plus the ports the application layer talks to the gateway through.

pub mod form;
pub mod order;
pub mod payment;
pub mod ports;
