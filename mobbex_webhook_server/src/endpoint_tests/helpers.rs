use actix_web::{test, web, web::ServiceConfig, App};
use mobbex_payment_engine::{
    events::EventProducers,
    helpers::{derive_webhook_token, WebhookTokenValidator},
    ReconcileApi,
    StatusResolver,
};
use mwg_common::Secret;

use super::mocks::MockGatewayStore;
use crate::{data_objects::WebhookResponse, routes::WebhookRoute};

pub const API_KEY: &str = "endpoint-test-key";
pub const ACCESS_TOKEN: &str = "endpoint-test-token";
pub const COUPON_TEMPLATE: &str = "https://mobbex.com/console/{entity.uid}/operations/?oid={payment.id}";

pub fn valid_token() -> String {
    derive_webhook_token(API_KEY, ACCESS_TOKEN)
}

/// Registers the webhook route backed by the given mock store.
pub fn configure_with(store: MockGatewayStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let validator = WebhookTokenValidator::new(API_KEY, &Secret::new(ACCESS_TOKEN.to_string()));
        let api = ReconcileApi::new(
            store,
            validator,
            StatusResolver::default(),
            COUPON_TEMPLATE.to_string(),
            EventProducers::default(),
        );
        cfg.service(WebhookRoute::<MockGatewayStore>::new()).app_data(web::Data::new(api));
    }
}

/// Posts a webhook body and returns the decoded JSON response. The endpoint always answers 200.
pub async fn post_webhook<F>(uri: &str, content_type: &str, body: String, configure: F) -> WebhookResponse
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    let req = test::TestRequest::post()
        .uri(uri)
        .insert_header(("Content-Type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    test::read_body_json(resp).await
}
