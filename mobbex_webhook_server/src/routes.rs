//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate function. Keep this module neat and tidy 🙏
//!
//! The webhook handler never returns an HTTP error status: Mobbex decides whether to redeliver purely from the
//! `result` field of the JSON body, so an ambiguous 4xx/5xx would break its retry contract.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use mobbex_payment_engine::{
    traits::{OrderStore, TransactionStore},
    ReconcileApi,
    ReconcileError,
    ReconcileOutcome,
};
use serde::Deserialize;

use crate::{
    data_objects::WebhookResponse,
    mobbex_notification::{new_transaction_from_notification, parse_webhook_body},
};

// Actix cannot handle generics in handlers, so the registration plumbing is generated with the `route!` macro.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>); }
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhook  ----------------------------------------------------

/// Query parameters Mobbex appends to the configured webhook URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookParams {
    #[serde(default)]
    pub mobbex_order_id: String,
    #[serde(default)]
    pub mobbex_token: String,
}

route!(webhook => Post "/webhook" impl OrderStore, TransactionStore);
pub async fn webhook<B>(
    req: HttpRequest,
    params: web::Query<WebhookParams>,
    body: web::Bytes,
    api: web::Data<ReconcileApi<B>>,
) -> HttpResponse
where
    B: OrderStore + TransactionStore,
{
    trace!("🪝 Received webhook request: {}", req.uri());
    let result = handle_webhook(&req, &params, &body, api.get_ref()).await;
    HttpResponse::Ok().json(result)
}

async fn handle_webhook<B>(
    req: &HttpRequest,
    params: &WebhookParams,
    body: &[u8],
    api: &ReconcileApi<B>,
) -> WebhookResponse
where
    B: OrderStore + TransactionStore,
{
    // Authentication first: a forged delivery must leave no trace, not even an audit row.
    if !api.validator().validate(&params.mobbex_token) {
        warn!("🪝 Webhook for order '{}' failed token validation. Discarding", params.mobbex_order_id);
        return WebhookResponse::failure();
    }
    let content_type = req.headers().get("Content-Type").and_then(|v| v.to_str().ok());
    let (payload, raw) = match parse_webhook_body(content_type, body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("🪝 Could not parse webhook body for order '{}'. {e}", params.mobbex_order_id);
            return WebhookResponse::failure();
        },
    };
    let tx = match new_transaction_from_notification(&params.mobbex_order_id, payload, raw) {
        Ok(tx) => tx,
        Err(e) => {
            warn!("🪝 Malformed notification for order '{}'. {e}", params.mobbex_order_id);
            return WebhookResponse::failure();
        },
    };
    // Write-ahead discipline: the audit record must be durable before any effect is applied. A failed append means
    // a failed webhook, so the sender redelivers and nothing is lost.
    match api.record_transaction(&tx).await {
        Ok(id) => debug!("🪝 Delivery stored with id {id} for order {}", tx.order_id),
        Err(e) => {
            error!("🪝 Could not store the delivery for order {}. {e}. Reconciliation will not run", tx.order_id);
            return WebhookResponse::failure();
        },
    }
    match api.process_webhook(&params.mobbex_token, tx).await {
        Ok(ReconcileOutcome::Invalid(reason)) => {
            info!("🪝 Webhook rejected: {reason}");
            WebhookResponse::failure()
        },
        Ok(outcome) => {
            info!("🪝 Webhook processed successfully. {outcome:?}");
            WebhookResponse::success()
        },
        Err(ReconcileError::RefundFailed(order_id, e)) => {
            warn!("🪝 Refund for order {order_id} could not be created. {e}");
            WebhookResponse::failure()
        },
        Err(e) => {
            error!("🪝 Unexpected failure while processing webhook. {e}");
            WebhookResponse::failure()
        },
    }
}
