//! Shared scaffolding for the engine integration tests.
//!
//! Each test gets its own in-memory SQLite database. The pool is capped at a single connection, since an in-memory
//! database lives and dies with its connection.
use mobbex_payment_engine::{
    db_types::{InstallmentPlan, NewOrder, NewTransaction, OrderId, PaymentSource},
    events::EventProducers,
    helpers::{derive_webhook_token, WebhookTokenValidator},
    ReconcileApi,
    SqliteDatabase,
    StatusResolver,
};
use mwg_common::{Money, Secret};

pub const API_KEY: &str = "test-api-key";
pub const ACCESS_TOKEN: &str = "test-access-token";
pub const COUPON_TEMPLATE: &str = "https://mobbex.com/console/{entity.uid}/operations/?oid={payment.id}";

pub async fn new_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Could not create in-memory database")
}

pub fn new_api(db: SqliteDatabase) -> ReconcileApi<SqliteDatabase> {
    new_api_with_producers(db, EventProducers::default())
}

pub fn new_api_with_producers(db: SqliteDatabase, producers: EventProducers) -> ReconcileApi<SqliteDatabase> {
    let validator = WebhookTokenValidator::new(API_KEY, &Secret::new(ACCESS_TOKEN.to_string()));
    ReconcileApi::new(db, validator, StatusResolver::default(), COUPON_TEMPLATE.to_string(), producers)
}

pub fn valid_token() -> String {
    derive_webhook_token(API_KEY, ACCESS_TOKEN)
}

pub fn seed_order(order_id: &str, total_cents: i64) -> NewOrder {
    NewOrder::new(OrderId(order_id.to_string()), Money::from_cents(total_cents))
}

/// A parent card payment notification against the given order.
pub fn parent_tx(order_id: &str, status_code: u32, total_cents: i64) -> NewTransaction {
    NewTransaction {
        order_id: OrderId(order_id.to_string()),
        payment_id: format!("MBBX-{order_id}"),
        status_code,
        status_message: "status report".into(),
        total: Money::from_cents(total_cents),
        is_parent: true,
        entity_uid: None,
        source: PaymentSource {
            name: "Visa".into(),
            kind: "card".into(),
            masked_number: Some("4242 **** **** 4242".into()),
            installment: Some(InstallmentPlan {
                description: "Ahora 3".into(),
                count: 3,
                amount: Money::from_cents(total_cents / 3),
            }),
        },
        risk_score: None,
        raw_payload: serde_json::json!({
            "payment": { "id": format!("MBBX-{order_id}"), "status": { "code": status_code } }
        }),
    }
}

pub fn child_tx(order_id: &str, status_code: u32, total_cents: i64) -> NewTransaction {
    let mut tx = parent_tx(order_id, status_code, total_cents);
    tx.is_parent = false;
    tx.payment_id = format!("MBBX-{order_id}-child");
    tx
}
