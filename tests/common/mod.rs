#![allow(dead_code)]

use checkout_flow::application::checkout::CheckoutStateMachine;
use checkout_flow::application::poller::StatusPoller;
use checkout_flow::domain::form::{FormField, MethodKind};
use checkout_flow::domain::order::Order;
use checkout_flow::infrastructure::in_memory::InMemoryGateway;
use std::sync::Arc;
use std::time::Duration;

pub const FAST_POLL: Duration = Duration::from_millis(5);

/// A gateway holding order `ord_1` for 150.00.
pub async fn gateway_with_order() -> InMemoryGateway {
    let gateway = InMemoryGateway::new();
    gateway.insert_order(Order::new("ord_1", 15000)).await;
    gateway
}

pub fn fast_poller(gateway: &InMemoryGateway) -> StatusPoller {
    StatusPoller::new(Arc::new(gateway.clone())).with_interval(FAST_POLL)
}

pub async fn open_checkout(gateway: &InMemoryGateway, poller: StatusPoller) -> CheckoutStateMachine {
    CheckoutStateMachine::initialize("ord_1", gateway, Arc::new(gateway.clone()), poller)
        .await
        .unwrap()
}

pub fn fill_upi(session: &mut CheckoutStateMachine, vpa: &str) {
    session.select_method(MethodKind::Upi).unwrap();
    session.enter(FormField::Vpa, vpa).unwrap();
}

pub fn fill_card(session: &mut CheckoutStateMachine, expiry: &str) {
    session.select_method(MethodKind::Card).unwrap();
    session
        .enter(FormField::CardNumber, "4111111111111111")
        .unwrap();
    session.enter(FormField::Expiry, expiry).unwrap();
    session.enter(FormField::Cvv, "123").unwrap();
    session.enter(FormField::HolderName, "Asha Rao").unwrap();
}
