use serde::{Deserialize, Serialize};

/// The body of every webhook response.
///
/// The webhook endpoint always answers HTTP 200 with one of these, so the sender's redelivery decision is driven by
/// `result` alone and never conflated with transport-level failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub name: String,
    pub version: String,
}

impl WebhookResponse {
    pub fn success() -> Self {
        let platform =
            PlatformInfo { name: "mobbex-webhook-gateway".to_string(), version: env!("CARGO_PKG_VERSION").to_string() };
        Self { result: true, platform: Some(platform) }
    }

    pub fn failure() -> Self {
        Self { result: false, platform: None }
    }
}
