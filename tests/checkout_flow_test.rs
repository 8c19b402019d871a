mod common;

use checkout_flow::application::checkout::{CheckoutState, FailureReason};
use checkout_flow::domain::form::{FormField, MethodKind};
use checkout_flow::domain::payment::{PaymentMethod, PaymentStatus};
use checkout_flow::error::CheckoutError;
use common::{fast_poller, fill_card, fill_upi, gateway_with_order, open_checkout};
use rust_decimal_macros::dec;
use std::time::Duration;

#[tokio::test]
async fn test_upi_checkout_succeeds_after_three_polls() {
    let gateway = gateway_with_order().await;
    gateway
        .script_statuses(
            "pay_1",
            [
                PaymentStatus::Pending,
                PaymentStatus::Pending,
                PaymentStatus::Success,
            ],
        )
        .await;
    let mut session = open_checkout(&gateway, fast_poller(&gateway)).await;

    assert_eq!(session.order().display_amount(), "150.00");
    assert_eq!(session.order().major_amount(), dec!(150));

    fill_upi(&mut session, "a@bank");
    assert_eq!(session.submit().await.unwrap(), &CheckoutState::Processing);

    let submissions = gateway.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].order_id(), "ord_1");
    assert_eq!(
        serde_json::to_value(submissions[0].body()).unwrap(),
        serde_json::json!({"order_id": "ord_1", "method": "upi", "vpa": "a@bank"})
    );

    assert_eq!(session.wait_for_outcome().await, &CheckoutState::Success);
    assert_eq!(gateway.status_queries("pay_1").await, 3);
    assert_eq!(
        session.intent().map(|intent| intent.status),
        Some(PaymentStatus::Success)
    );
}

#[tokio::test]
async fn test_card_checkout_splits_expiry() {
    let gateway = gateway_with_order().await;
    gateway
        .script_statuses("pay_1", [PaymentStatus::Success])
        .await;
    let mut session = open_checkout(&gateway, fast_poller(&gateway)).await;

    fill_card(&mut session, "09/27");
    session.submit().await.unwrap();

    let submissions = gateway.submissions().await;
    let PaymentMethod::Card(card) = submissions[0].method() else {
        panic!("expected a card submission");
    };
    assert_eq!(card.expiry_month, "09");
    assert_eq!(card.expiry_year, "27");

    let body = serde_json::to_value(submissions[0].body()).unwrap();
    assert_eq!(body["card"]["expiry_month"], "09");
    assert_eq!(body["card"]["expiry_year"], "27");
    assert!(body.get("vpa").is_none());

    assert_eq!(session.wait_for_outcome().await, &CheckoutState::Success);
}

#[tokio::test]
async fn test_rejected_submission_fails_without_polling() {
    let gateway = gateway_with_order().await;
    gateway.reject_submissions("gateway returned 500").await;
    let poller = fast_poller(&gateway);
    let mut session = open_checkout(&gateway, poller.clone()).await;

    fill_upi(&mut session, "a@bank");
    let state = session.submit().await.unwrap().clone();

    assert_eq!(
        state,
        CheckoutState::Failed(FailureReason::SubmissionRejected(
            "gateway returned 500".to_string()
        ))
    );
    assert!(!session.has_active_poll());
    assert_eq!(poller.live_polls(), 0);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(gateway.total_status_queries().await, 0);
}

#[tokio::test]
async fn test_success_is_final() {
    let gateway = gateway_with_order().await;
    gateway
        .script_statuses("pay_1", [PaymentStatus::Success])
        .await;
    let mut session = open_checkout(&gateway, fast_poller(&gateway)).await;
    fill_upi(&mut session, "a@bank");
    session.submit().await.unwrap();
    assert_eq!(session.wait_for_outcome().await, &CheckoutState::Success);

    assert!(matches!(
        session.select_method(MethodKind::Card),
        Err(CheckoutError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.enter(FormField::Vpa, "b@bank"),
        Err(CheckoutError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.submit().await,
        Err(CheckoutError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.retry(),
        Err(CheckoutError::InvalidTransition { .. })
    ));
    assert!(session.next_update().await.is_none());
    assert_eq!(session.state(), &CheckoutState::Success);
    assert_eq!(gateway.submissions().await.len(), 1);
}

#[tokio::test]
async fn test_retry_clears_form_and_keeps_order() {
    let gateway = gateway_with_order().await;
    gateway
        .script_statuses("pay_1", [PaymentStatus::Failed])
        .await;
    gateway
        .script_statuses("pay_2", [PaymentStatus::Success])
        .await;
    let mut session = open_checkout(&gateway, fast_poller(&gateway)).await;

    fill_upi(&mut session, "a@bank");
    session.submit().await.unwrap();
    assert!(matches!(
        session.wait_for_outcome().await,
        CheckoutState::Failed(FailureReason::Declined(_))
    ));

    session.retry().unwrap();
    assert_eq!(session.state(), &CheckoutState::Initial);
    assert!(session.form().is_none());
    assert!(session.intent().is_none());
    assert_eq!(session.order().id, "ord_1");

    // A fresh submission needs a fresh method selection.
    assert!(matches!(
        session.submit().await,
        Err(CheckoutError::ValidationError(_))
    ));

    fill_card(&mut session, "12/30");
    session.submit().await.unwrap();
    assert_eq!(session.wait_for_outcome().await, &CheckoutState::Success);
    assert_eq!(
        session.intent().map(|intent| intent.id.as_str().to_string()),
        Some("pay_2".to_string())
    );
}

#[tokio::test]
async fn test_at_most_one_live_poll_across_retries() {
    let gateway = gateway_with_order().await;
    let poller = fast_poller(&gateway).with_max_attempts(2);
    let mut session = open_checkout(&gateway, poller.clone()).await;

    for round in 1..=4 {
        if round == 3 {
            gateway.reject_submissions("gateway returned 503").await;
        } else {
            gateway.accept_submissions().await;
        }
        fill_upi(&mut session, "a@bank");
        session.submit().await.unwrap();
        assert!(poller.live_polls() <= 1);

        while session.next_update().await.is_some() {
            assert!(poller.live_polls() <= 1);
        }
        assert!(matches!(session.state(), CheckoutState::Failed(_)));
        assert_eq!(poller.live_polls(), 0);

        session.retry().unwrap();
        assert_eq!(poller.live_polls(), 0);
    }

    assert_eq!(gateway.submissions().await.len(), 4);
    session.close().await;
    assert_eq!(poller.live_polls(), 0);
}

#[tokio::test]
async fn test_pending_forever_times_out() {
    let gateway = gateway_with_order().await;
    let poller = fast_poller(&gateway).with_max_attempts(4);
    let mut session = open_checkout(&gateway, poller).await;

    fill_upi(&mut session, "a@bank");
    session.submit().await.unwrap();

    assert_eq!(
        session.wait_for_outcome().await,
        &CheckoutState::Failed(FailureReason::TimedOut)
    );
    assert_eq!(gateway.status_queries("pay_1").await, 4);
}

#[tokio::test]
async fn test_dropping_session_stops_polling() {
    let gateway = gateway_with_order().await;
    let poller = fast_poller(&gateway);
    let mut session = open_checkout(&gateway, poller.clone()).await;

    fill_upi(&mut session, "a@bank");
    session.submit().await.unwrap();
    assert_eq!(poller.live_polls(), 1);

    drop(session);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(poller.live_polls(), 0);

    let queries = gateway.status_queries("pay_1").await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(gateway.status_queries("pay_1").await, queries);
}

#[tokio::test]
async fn test_actions_while_processing_are_rejected() {
    let gateway = gateway_with_order().await;
    let poller = fast_poller(&gateway);
    let mut session = open_checkout(&gateway, poller.clone()).await;

    fill_upi(&mut session, "a@bank");
    assert_eq!(session.submit().await.unwrap(), &CheckoutState::Processing);

    let err = session.submit().await.unwrap_err();
    assert_eq!(
        err,
        CheckoutError::InvalidTransition {
            action: "submit a payment",
            state: "processing".to_string()
        }
    );
    assert!(matches!(
        session.select_method(MethodKind::Card),
        Err(CheckoutError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.enter(FormField::Vpa, "b@bank"),
        Err(CheckoutError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.retry(),
        Err(CheckoutError::InvalidTransition { action: "retry", .. })
    ));

    assert_eq!(session.state(), &CheckoutState::Processing);
    assert_eq!(gateway.submissions().await.len(), 1);
    assert!(session.has_active_poll());
    assert_eq!(poller.live_polls(), 1);

    session.close().await;
    assert_eq!(poller.live_polls(), 0);
}
