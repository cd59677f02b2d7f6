use std::{collections::HashSet, env};

use log::*;
use mobbex_payment_engine::StatusClassification;
use mwg_common::Secret;

const DEFAULT_MWG_HOST: &str = "127.0.0.1";
const DEFAULT_MWG_PORT: u16 = 8460;
/// Default template for the operation coupon URL. `{entity.uid}` and `{payment.id}` are substituted per payment.
const DEFAULT_COUPON_URL: &str = "https://mobbex.com/console/{entity.uid}/operations/?oid={payment.id}";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Mobbex installation credentials and gateway behaviour.
    pub mobbex: MobbexConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MWG_HOST.to_string(),
            port: DEFAULT_MWG_PORT,
            database_url: String::default(),
            mobbex: MobbexConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MWG_HOST").ok().unwrap_or_else(|| DEFAULT_MWG_HOST.into());
        let port = env::var("MWG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MWG_PORT. {e} Using the default, {DEFAULT_MWG_PORT}, instead."
                    );
                    DEFAULT_MWG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MWG_PORT);
        let database_url = env::var("MWG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MWG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let mobbex = MobbexConfig::from_env_or_default();
        Self { host, port, database_url, mobbex }
    }
}

//-----------------------------------------------  MobbexConfig  ------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct MobbexConfig {
    /// The installation's API key, as shown in the Mobbex console.
    pub api_key: String,
    /// The installation's access token. Together with the API key this derives the webhook security token.
    pub access_token: Secret<String>,
    /// URL template for operation coupons.
    pub coupon_url_template: String,
    /// Status-code classification sets. The code space belongs to the gateway, so every set can be overridden from
    /// the environment.
    pub statuses: StatusClassification,
}

impl MobbexConfig {
    pub fn from_env_or_default() -> Self {
        let api_key = env::var("MWG_MOBBEX_API_KEY").ok().unwrap_or_else(|| {
            error!(
                "🪛️ MWG_MOBBEX_API_KEY is not set. Webhook token validation will reject every delivery until it is."
            );
            String::default()
        });
        let access_token = env::var("MWG_MOBBEX_ACCESS_TOKEN").ok().unwrap_or_else(|| {
            error!(
                "🪛️ MWG_MOBBEX_ACCESS_TOKEN is not set. Webhook token validation will reject every delivery until \
                 it is."
            );
            String::default()
        });
        let coupon_url_template = env::var("MWG_COUPON_URL").ok().unwrap_or_else(|| {
            info!("🪛️ MWG_COUPON_URL is not set. Using the default coupon URL template.");
            DEFAULT_COUPON_URL.to_string()
        });
        let statuses = status_classification_from_env();
        Self { api_key, access_token: Secret::new(access_token), coupon_url_template, statuses }
    }
}

fn status_classification_from_env() -> StatusClassification {
    let defaults = StatusClassification::default();
    StatusClassification {
        approved: code_set("MWG_APPROVED_CODES", defaults.approved),
        rejected: code_set("MWG_REJECTED_CODES", defaults.rejected),
        refunded: code_set("MWG_REFUNDED_CODES", defaults.refunded),
        in_review: code_set("MWG_IN_REVIEW_CODES", defaults.in_review),
        pending: code_set("MWG_PENDING_CODES", defaults.pending),
        cancelled: code_set("MWG_CANCELLED_CODES", defaults.cancelled),
    }
}

/// Parses a comma-separated status code set from the environment, falling back to the given default set.
fn code_set(var: &str, default: HashSet<u32>) -> HashSet<u32> {
    match env::var(var) {
        Ok(value) => value
            .split(',')
            .filter_map(|code| {
                let code = code.trim();
                if code.is_empty() {
                    return None;
                }
                code.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Ignoring invalid status code ({code}) in {var}: {e}"))
                    .ok()
            })
            .collect(),
        Err(_) => default,
    }
}
