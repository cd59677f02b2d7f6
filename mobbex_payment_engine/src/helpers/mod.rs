mod webhook_token;

pub use webhook_token::{derive_webhook_token, WebhookTokenValidator};
