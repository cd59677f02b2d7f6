//! Wire format of the Mobbex webhook notification, and its conversion into engine types.
//!
//! Deliveries arrive as JSON, or form-encoded with the `data` object carried as a JSON-encoded string field. Either
//! way the payload is validated once, here at the boundary; everything downstream operates on the typed
//! [`NewTransaction`] and never on raw key lookups.
use log::trace;
use mobbex_payment_engine::db_types::{InstallmentPlan, NewTransaction, OrderId, PaymentSource};
use mwg_common::Money;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationConversionError {
    #[error("The notification body could not be parsed. {0}")]
    FormatError(String),
    #[error("The notification is missing the required field '{0}'")]
    MissingField(&'static str),
    #[error("The notification carries an unrepresentable amount. {0}")]
    InvalidTotal(String),
}

/// The envelope of a webhook delivery as posted by Mobbex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub data: TransactionData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub status_code: Option<u32>,
    #[serde(default)]
    pub status_message: String,
    #[serde(default)]
    pub total: f64,
    /// Mobbex reports this as the string "yes"/"no"; some transports send a plain bool.
    #[serde(default, deserialize_with = "de_yes_no")]
    pub parent: bool,
    #[serde(default)]
    pub entity_uid: Option<String>,
    #[serde(default)]
    pub source: SourceData,
    #[serde(default)]
    pub risk_analysis: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceData {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub installment: Option<InstallmentData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallmentData {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub amount: f64,
}

/// Form-encoded deliveries carry the `data` object as a JSON-encoded string field.
#[derive(Debug, Clone, Default, Deserialize)]
struct FormPayload {
    #[serde(default)]
    data: String,
}

fn de_yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where D: Deserializer<'de> {
    let value = Value::deserialize(deserializer)?;
    let flag = match value {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "yes" | "true" | "1"),
        _ => false,
    };
    Ok(flag)
}

/// Parses a webhook body into the typed payload, preserving the decoded body verbatim for the audit trail.
pub fn parse_webhook_body(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<(WebhookPayload, Value), NotificationConversionError> {
    let is_json = content_type.map(|ct| ct.contains("application/json")).unwrap_or(true);
    let raw: Value = if is_json {
        serde_json::from_slice(body).map_err(|e| NotificationConversionError::FormatError(e.to_string()))?
    } else {
        let form: FormPayload =
            serde_urlencoded::from_bytes(body).map_err(|e| NotificationConversionError::FormatError(e.to_string()))?;
        let data: Value = serde_json::from_str(&form.data)
            .map_err(|e| NotificationConversionError::FormatError(format!("form 'data' field: {e}")))?;
        serde_json::json!({ "data": data })
    };
    let payload: WebhookPayload =
        serde_json::from_value(raw.clone()).map_err(|e| NotificationConversionError::FormatError(e.to_string()))?;
    Ok((payload, raw))
}

/// Converts a parsed payload into the engine's [`NewTransaction`].
///
/// The checks here are the `MalformedNotification` boundary: a delivery without an order id or a status code is
/// rejected before anything is written anywhere.
pub fn new_transaction_from_notification(
    order_id: &str,
    payload: WebhookPayload,
    raw: Value,
) -> Result<NewTransaction, NotificationConversionError> {
    trace!("Converting webhook payload for order '{order_id}' into a transaction");
    if order_id.trim().is_empty() {
        return Err(NotificationConversionError::MissingField("mobbex_order_id"));
    }
    let data = payload.data;
    // Mobbex never reports code 0 for a live operation; treat it the same as an absent code.
    let status_code = data
        .status_code
        .filter(|code| *code != 0)
        .ok_or(NotificationConversionError::MissingField("status_code"))?;
    let total = Money::try_from(data.total).map_err(|e| NotificationConversionError::InvalidTotal(e.to_string()))?;
    let installment = data
        .source
        .installment
        .map(|plan| {
            let amount =
                Money::try_from(plan.amount).map_err(|e| NotificationConversionError::InvalidTotal(e.to_string()))?;
            Ok::<_, NotificationConversionError>(InstallmentPlan {
                description: plan.description,
                count: plan.count,
                amount,
            })
        })
        .transpose()?;
    let source = PaymentSource {
        name: data.source.name,
        kind: data.source.kind,
        masked_number: data.source.number,
        installment,
    };
    Ok(NewTransaction {
        order_id: OrderId(order_id.to_string()),
        payment_id: data.payment_id,
        status_code,
        status_message: data.status_message,
        total,
        is_parent: data.parent,
        entity_uid: data.entity_uid.filter(|uid| !uid.is_empty()),
        source,
        risk_score: data.risk_analysis,
        raw_payload: raw,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_json_notification() {
        let body = include_str!("./test_assets/webhook.json");
        let (payload, raw) = parse_webhook_body(Some("application/json"), body.as_bytes()).unwrap();
        assert_eq!(payload.data.payment_id, "MBBX-74230");
        assert_eq!(payload.data.status_code, Some(200));
        assert!(payload.data.parent);
        assert_eq!(payload.data.source.name, "Visa");

        let tx = new_transaction_from_notification("8187", payload, raw).unwrap();
        assert_eq!(tx.order_id.as_str(), "8187");
        assert_eq!(tx.total, Money::from_cents(105_000));
        assert_eq!(tx.entity_uid.as_deref(), Some("e-9f2b"));
        let plan = tx.source.installment.expect("card payment should carry an installment plan");
        assert_eq!(plan.count, 3);
        assert_eq!(plan.amount, Money::from_cents(35_000));
        assert_eq!(tx.raw_payload["data"]["payment_id"], "MBBX-74230");
    }

    #[test]
    fn form_encoded_data_field_is_json() {
        let data = r#"{"payment_id":"MBBX-9","status_code":3,"status_message":"in review","total":99.5,"parent":"no"}"#;
        let body = serde_urlencoded::to_string([("data", data)]).unwrap();
        let (payload, raw) =
            parse_webhook_body(Some("application/x-www-form-urlencoded"), body.as_bytes()).unwrap();
        assert_eq!(payload.data.status_code, Some(3));
        assert_eq!(payload.data.total, 99.5);
        assert!(!payload.data.parent);
        assert_eq!(raw["data"]["payment_id"], "MBBX-9");
    }

    #[test]
    fn missing_status_code_is_malformed() {
        let payload = WebhookPayload {
            data: TransactionData { payment_id: "MBBX-1".into(), total: 10.0, ..Default::default() },
        };
        let err = new_transaction_from_notification("1", payload, Value::Null).unwrap_err();
        assert!(matches!(err, NotificationConversionError::MissingField("status_code")));
    }

    #[test]
    fn status_code_zero_is_malformed() {
        let payload = WebhookPayload {
            data: TransactionData { status_code: Some(0), total: 10.0, ..Default::default() },
        };
        let err = new_transaction_from_notification("1", payload, Value::Null).unwrap_err();
        assert!(matches!(err, NotificationConversionError::MissingField("status_code")));
    }

    #[test]
    fn empty_order_id_is_malformed() {
        let payload = WebhookPayload {
            data: TransactionData { status_code: Some(200), total: 10.0, ..Default::default() },
        };
        let err = new_transaction_from_notification("  ", payload, Value::Null).unwrap_err();
        assert!(matches!(err, NotificationConversionError::MissingField("mobbex_order_id")));
    }

    #[test]
    fn unrepresentable_total_is_rejected() {
        let payload = WebhookPayload {
            data: TransactionData { status_code: Some(200), total: 1e17, ..Default::default() },
        };
        let err = new_transaction_from_notification("1", payload, Value::Null).unwrap_err();
        assert!(matches!(err, NotificationConversionError::InvalidTotal(_)));
    }
}
