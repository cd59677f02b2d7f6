use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use mwg_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        -------------------------------------------------------
/// A lightweight wrapper around the merchant-assigned order reference.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

//--------------------------------------     DomainStatus      -------------------------------------------------------
/// The gateway-code-independent classification of an order's payment state.
///
/// The mapping from the numeric Mobbex status codes onto these variants lives in
/// [`crate::StatusClassification`] and is configuration, not logic, since the code space belongs to the gateway and
/// may grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DomainStatus {
    /// Nothing conclusive has been reported yet. Also the safe fallback for unrecognised codes.
    Pending,
    /// The payment has been accredited in full.
    Approved,
    /// The gateway rejected the payment attempt.
    Rejected,
    /// The operation is held for manual or automated review.
    InReview,
    /// The operation was cancelled before completion.
    Cancelled,
    /// The funds were returned to the payer.
    Refunded,
}

impl Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainStatus::Pending => write!(f, "Pending"),
            DomainStatus::Approved => write!(f, "Approved"),
            DomainStatus::Rejected => write!(f, "Rejected"),
            DomainStatus::InReview => write!(f, "InReview"),
            DomainStatus::Cancelled => write!(f, "Cancelled"),
            DomainStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid domain status: {0}")]
pub struct ConversionError(String);

impl FromStr for DomainStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            "InReview" => Ok(Self::InReview),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid domain status: {s}"))),
        }
    }
}

impl From<String> for DomainStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid domain status: {value}. But this conversion cannot fail. Defaulting to Pending");
            DomainStatus::Pending
        })
    }
}

//--------------------------------------        Order       ----------------------------------------------------------
/// The order aggregate as seen by the reconciliation core.
///
/// Orders are created by the checkout flow; this engine only ever mutates them. The two one-way flags are the
/// idempotency guards: `total_reconciled` protects the fee/discount adjustment and `payment_completed` protects the
/// payment-completion side effect.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub status: DomainStatus,
    pub status_message: Option<String>,
    pub total: Money,
    pub total_reconciled: bool,
    pub payment_completed: bool,
    pub payment_ref: Option<String>,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder       --------------------------------------------------------
/// A brand-new order as submitted by the checkout flow.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    /// The order total at checkout time, before any gateway surcharge or discount.
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, total: Money) -> Self {
        Self { order_id, total, created_at: Utc::now() }
    }
}

//--------------------------------------     PaymentSource     -------------------------------------------------------
/// The payment-method descriptor attached to a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSource {
    /// Human-readable method name, e.g. "Visa" or "Rapipago".
    pub name: String,
    /// Method kind as reported by the gateway, e.g. "card".
    pub kind: String,
    /// Masked card number, card methods only.
    pub masked_number: Option<String>,
    pub installment: Option<InstallmentPlan>,
}

/// Installment plan details for card payments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub description: String,
    pub count: u32,
    pub amount: Money,
}

//--------------------------------------    NewTransaction     -------------------------------------------------------
/// A parsed, authenticated webhook notification, ready to be persisted and reconciled.
///
/// One of these exists per delivery. It is stored verbatim (including the raw payload) before any reconciliation
/// runs, and is never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub order_id: OrderId,
    /// The gateway's identifier for the payment operation. Distinct from the delivery id assigned on storage, so
    /// duplicate deliveries of the same logical payment each get their own audit row.
    pub payment_id: String,
    pub status_code: u32,
    pub status_message: String,
    pub total: Money,
    /// True for the primary payment operation; false for installment/split-payment legs.
    pub is_parent: bool,
    /// Gateway reference used to build the coupon URL, when present.
    pub entity_uid: Option<String>,
    pub source: PaymentSource,
    pub risk_score: Option<f64>,
    /// The decoded notification body, preserved for audit and for the outbound event.
    pub raw_payload: serde_json::Value,
}

//--------------------------------------  TransactionRecord    -------------------------------------------------------
/// A stored webhook delivery, as read back from the audit trail.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    /// The delivery identifier assigned by the store.
    pub id: i64,
    pub order_id: OrderId,
    pub payment_id: String,
    pub status_code: u32,
    pub status_message: String,
    pub total: Money,
    pub is_parent: bool,
    pub entity_uid: Option<String>,
    pub risk_score: Option<f64>,
    pub source_name: Option<String>,
    pub source_kind: Option<String>,
    pub source_number: Option<String>,
    pub installment_description: Option<String>,
    pub installment_count: Option<u32>,
    pub installment_amount: Option<Money>,
    pub raw_payload: String,
    pub received_at: DateTime<Utc>,
}

//--------------------------------------       LineItem        -------------------------------------------------------
/// A surcharge or discount adjustment recorded against an order during total reconciliation.
#[derive(Debug, Clone, FromRow)]
pub struct LineItem {
    pub id: i64,
    pub order_id: OrderId,
    pub label: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}
