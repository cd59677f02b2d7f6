use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use mobbex_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    helpers::WebhookTokenValidator,
    ReconcileApi,
    SqliteDatabase,
    StatusResolver,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{health, WebhookRoute},
};

pub const WEBHOOK_EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_default_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The default subscriber set for the webhook-processed signal.
///
/// The built-in subscriber only logs. Deployments that fan the signal out further (fulfilment jobs, analytics,
/// back-office sync) register their own hooks before calling [`create_server_instance`]; a failing subscriber never
/// affects the webhook's own outcome.
pub fn create_default_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_webhook_processed(|ev| {
        Box::pin(async move {
            info!("📬️ Order {} was reconciled from a webhook notification", ev.order_id);
        })
    });
    EventHandlers::new(WEBHOOK_EVENT_BUFFER_SIZE, hooks)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let validator = WebhookTokenValidator::new(&config.mobbex.api_key, &config.mobbex.access_token);
        let resolver = StatusResolver::new(config.mobbex.statuses.clone());
        let api = ReconcileApi::new(
            db.clone(),
            validator,
            resolver,
            config.mobbex.coupon_url_template.clone(),
            producers.clone(),
        );
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mwg::access_log"))
            .app_data(web::Data::new(api))
            .service(health)
            .service(WebhookRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
