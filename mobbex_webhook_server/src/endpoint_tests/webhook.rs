use chrono::Utc;
use mobbex_payment_engine::{
    db_types::{DomainStatus, Order, OrderId},
    traits::{StoreError, TotalReconciliation},
};
use mwg_common::Money;

use super::{
    helpers::{configure_with, post_webhook, valid_token},
    mocks::MockGatewayStore,
};

fn stored_order(id: &str, total_cents: i64, status: DomainStatus) -> Order {
    Order {
        id: 1,
        order_id: OrderId(id.to_string()),
        status,
        status_message: None,
        total: Money::from_cents(total_cents),
        total_reconciled: false,
        payment_completed: false,
        payment_ref: None,
        payment_method: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn webhook_body(status_code: u32, parent: &str, total: f64) -> String {
    serde_json::json!({
        "data": {
            "payment_id": "MBBX-1",
            "status_code": status_code,
            "status_message": "status report",
            "total": total,
            "parent": parent,
            "source": {
                "name": "Visa",
                "type": "card",
                "number": "4242 **** **** 4242",
                "installment": { "description": "Ahora 3", "count": 3, "amount": total / 3.0 }
            }
        }
    })
    .to_string()
}

#[actix_web::test]
async fn invalid_token_leaves_no_trace() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    // A forged delivery must not even reach the audit trail.
    store.expect_append_transaction().times(0);
    store.expect_fetch_order().times(0);
    store.expect_add_note().times(0);

    let uri = "/webhook?mobbex_order_id=55&mobbex_token=forged";
    let response = post_webhook(uri, "application/json", webhook_body(200, "yes", 100.0), configure_with(store)).await;
    assert!(!response.result);
    assert!(response.platform.is_none());
}

#[actix_web::test]
async fn approved_parent_notification_succeeds() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().returning(|_| Ok(1));
    store.expect_fetch_order().returning(|_| Ok(Some(stored_order("55", 10_000, DomainStatus::Pending))));
    store.expect_annotate_order().times(1).returning(|_, _| Ok(stored_order("55", 10_000, DomainStatus::Pending)));
    store
        .expect_set_order_status()
        .withf(|_, status, _| *status == DomainStatus::Approved)
        .times(1)
        .returning(|_, _, _| Ok(stored_order("55", 10_000, DomainStatus::Approved)));
    store.expect_complete_payment().times(1).returning(|_, _| Ok(true));
    store.expect_reconcile_total().times(1).returning(|_, _| Ok(TotalReconciliation::Unchanged));

    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response = post_webhook(&uri, "application/json", webhook_body(200, "yes", 100.0), configure_with(store)).await;
    assert!(response.result);
    let platform = response.platform.expect("success responses carry the platform block");
    assert_eq!(platform.name, "mobbex-webhook-gateway");
}

#[actix_web::test]
async fn malformed_body_is_rejected_before_any_store_write() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().times(0);
    store.expect_fetch_order().times(0);

    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response =
        post_webhook(&uri, "application/json", "this is not json".to_string(), configure_with(store)).await;
    assert!(!response.result);
}

#[actix_web::test]
async fn missing_status_code_is_rejected_before_any_store_write() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().times(0);

    let body = serde_json::json!({ "data": { "payment_id": "MBBX-1", "total": 100.0, "parent": "yes" } }).to_string();
    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response = post_webhook(&uri, "application/json", body, configure_with(store)).await;
    assert!(!response.result);
}

#[actix_web::test]
async fn store_failure_fails_the_webhook_so_the_sender_redelivers() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store
        .expect_append_transaction()
        .times(1)
        .returning(|_| Err(StoreError::DatabaseError("disk is a lie".to_string())));
    // Reconciliation must not run without an audit record.
    store.expect_fetch_order().times(0);

    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response = post_webhook(&uri, "application/json", webhook_body(200, "yes", 100.0), configure_with(store)).await;
    assert!(!response.result);
}

#[actix_web::test]
async fn child_notification_only_adds_a_note() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().returning(|_| Ok(7));
    store.expect_fetch_order().returning(|_| Ok(Some(stored_order("55", 10_000, DomainStatus::Pending))));
    store.expect_add_note().times(1).returning(|_, _| Ok(1));
    store.expect_annotate_order().times(0);
    store.expect_set_order_status().times(0);
    store.expect_complete_payment().times(0);
    store.expect_reconcile_total().times(0);

    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response = post_webhook(&uri, "application/json", webhook_body(200, "no", 33.0), configure_with(store)).await;
    assert!(response.result);
}

#[actix_web::test]
async fn refund_failure_reports_failure() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().returning(|_| Ok(8));
    store
        .expect_create_refund()
        .times(1)
        .returning(|order_id, _| Err(StoreError::OrderNotFound(order_id.clone())));
    // Refunds pre-empt the standard path entirely.
    store.expect_fetch_order().times(0);
    store.expect_annotate_order().times(0);

    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response = post_webhook(&uri, "application/json", webhook_body(602, "yes", 100.0), configure_with(store)).await;
    assert!(!response.result);
}

#[actix_web::test]
async fn refund_code_triggers_refund_even_for_children() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().returning(|_| Ok(9));
    store
        .expect_create_refund()
        .withf(|order_id, amount| order_id.as_str() == "55" && *amount == Money::from_cents(10_000))
        .times(1)
        .returning(|_, _| Ok(3));
    store.expect_add_note().times(0);

    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response = post_webhook(&uri, "application/json", webhook_body(605, "no", 100.0), configure_with(store)).await;
    assert!(response.result);
}

#[actix_web::test]
async fn form_encoded_notifications_are_accepted() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().returning(|_| Ok(10));
    store.expect_fetch_order().returning(|_| Ok(Some(stored_order("55", 10_000, DomainStatus::Pending))));
    store.expect_add_note().times(1).returning(|_, _| Ok(1));

    let data = r#"{"payment_id":"MBBX-2","status_code":3,"status_message":"in review","total":50.0,"parent":"no"}"#;
    let body = serde_urlencoded::to_string([("data", data)]).unwrap();
    let uri = format!("/webhook?mobbex_order_id=55&mobbex_token={}", valid_token());
    let response = post_webhook(&uri, "application/x-www-form-urlencoded", body, configure_with(store)).await;
    assert!(response.result);
}

#[actix_web::test]
async fn missing_query_parameters_fail_closed() {
    let _ = env_logger::try_init().ok();
    let mut store = MockGatewayStore::new();
    store.expect_append_transaction().times(0);

    let response =
        post_webhook("/webhook", "application/json", webhook_body(200, "yes", 100.0), configure_with(store)).await;
    assert!(!response.result);
}
