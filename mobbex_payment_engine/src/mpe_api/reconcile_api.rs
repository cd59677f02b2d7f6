use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DomainStatus, NewTransaction, Order},
    events::{EventProducers, WebhookProcessedEvent},
    helpers::WebhookTokenValidator,
    mpe_api::{
        errors::ReconcileError,
        reconcile_objects::ReconcileOutcome,
        status_resolver::StatusResolver,
    },
    traits::{OrderAnnotation, OrderStore, StoreError, TotalReconciliation, TransactionStore},
};

// Metadata keys written onto the order aggregate during parent reconciliation.
pub const META_WEBHOOK: &str = "mobbex_webhook";
pub const META_PAYMENT_ID: &str = "mobbex_payment_id";
pub const META_COUPON_URL: &str = "mobbex_coupon_url";
pub const META_CARD_INFO: &str = "mobbex_card_info";
pub const META_CARD_PLAN: &str = "mobbex_plan";
pub const META_RISK_ANALYSIS: &str = "mobbex_risk_analysis";

/// `ReconcileApi` is the primary API for applying webhook notifications to orders.
///
/// It owns the whole decision tree for a delivery: token validation, refund pre-emption, child-transaction
/// annotation, and the full parent reconciliation flow (bookkeeping annotation, status transition, at-most-once
/// payment completion, idempotent total adjustment, outbound event).
///
/// Its configuration — the token validator, the status classification and the coupon URL template — is passed in at
/// construction; nothing is read from ambient process state.
pub struct ReconcileApi<B> {
    db: B,
    validator: WebhookTokenValidator,
    resolver: StatusResolver,
    coupon_url_template: String,
    producers: EventProducers,
}

impl<B> Debug for ReconcileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconcileApi")
    }
}

impl<B> ReconcileApi<B> {
    pub fn new(
        db: B,
        validator: WebhookTokenValidator,
        resolver: StatusResolver,
        coupon_url_template: String,
        producers: EventProducers,
    ) -> Self {
        Self { db, validator, resolver, coupon_url_template, producers }
    }

    pub fn validator(&self) -> &WebhookTokenValidator {
        &self.validator
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ReconcileApi<B>
where B: TransactionStore
{
    /// Durably appends the delivery to the audit trail. Must succeed before [`Self::process_webhook`] is called;
    /// a failed append means the webhook must report failure so the sender redelivers.
    pub async fn record_transaction(&self, tx: &NewTransaction) -> Result<i64, StoreError> {
        self.db.append_transaction(tx.clone()).await
    }
}

impl<B> ReconcileApi<B>
where B: OrderStore
{
    /// Applies a notification to its order.
    ///
    /// The checks run in a fixed order:
    /// 1. Validation: the security token must check out and the order id must be present, otherwise nothing is
    ///    touched and the outcome is [`ReconcileOutcome::Invalid`].
    /// 2. Refund pre-emption: a refund status code triggers a refund request regardless of the parent/child flag,
    ///    and nothing else runs. A failed refund surfaces as [`ReconcileError::RefundFailed`].
    /// 3. Child notifications are recorded as a single audit note and nothing else.
    /// 4. Parent notifications run the full reconciliation flow.
    ///
    /// The side effects of step 4 are applied as separate atomic store operations in a fixed order (annotation,
    /// status, completion, total), so a fault mid-way leaves the order in a well-defined, partially-annotated state
    /// that an idempotent redelivery can safely finish.
    pub async fn process_webhook(
        &self,
        token: &str,
        tx: NewTransaction,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if !self.validator.validate(token) {
            warn!("🔄️ Webhook for order {} presented an invalid security token", tx.order_id);
            return Ok(ReconcileOutcome::Invalid("invalid security token".into()));
        }
        if tx.order_id.is_empty() {
            warn!("🔄️ Webhook for payment [{}] did not carry an order id", tx.payment_id);
            return Ok(ReconcileOutcome::Invalid("missing order id".into()));
        }
        // Refunds pre-empt everything else, because they can arrive on parent and child legs alike.
        if self.resolver.is_refund_code(tx.status_code) {
            return self.initiate_refund(&tx).await;
        }
        let order = match self.db.fetch_order(&tx.order_id).await? {
            Some(order) => order,
            None => {
                info!("🔄️ Order {} from webhook does not exist in the order store", tx.order_id);
                return Ok(ReconcileOutcome::Invalid(format!("order {} not found", tx.order_id)));
            },
        };
        if !tx.is_parent {
            return self.annotate_child(&tx).await;
        }
        self.reconcile_parent(order, tx).await
    }

    async fn initiate_refund(&self, tx: &NewTransaction) -> Result<ReconcileOutcome, ReconcileError> {
        debug!(
            "💸️ Refund status code {} received for order {}. Requesting a refund of {}",
            tx.status_code, tx.order_id, tx.total
        );
        match self.db.create_refund(&tx.order_id, tx.total).await {
            Ok(id) => {
                info!("💸️ Refund #{id} of {} requested for order {}", tx.total, tx.order_id);
                Ok(ReconcileOutcome::Refunded { order_id: tx.order_id.clone(), amount: tx.total })
            },
            Err(e) => {
                warn!("💸️ Refund request for order {} failed. {e}", tx.order_id);
                Err(ReconcileError::RefundFailed(tx.order_id.clone(), e.to_string()))
            },
        }
    }

    /// Records a child (installment / split-payment leg) notification as a single audit note.
    ///
    /// Child notifications are informational: status, totals, flags and metadata stay untouched.
    async fn annotate_child(&self, tx: &NewTransaction) -> Result<ReconcileOutcome, ReconcileError> {
        let note = child_note(tx);
        self.db.add_note(&tx.order_id, &note).await?;
        debug!("🔄️ Child transaction [{}] noted against order {}", tx.payment_id, tx.order_id);
        Ok(ReconcileOutcome::ChildAnnotated(tx.order_id.clone()))
    }

    async fn reconcile_parent(&self, order: Order, tx: NewTransaction) -> Result<ReconcileOutcome, ReconcileError> {
        trace!("🔄️ Reconciling parent webhook for order {} (currently {})", tx.order_id, order.status);
        let annotation = build_annotation(&tx, &self.coupon_url_template);
        self.db.annotate_order(&tx.order_id, annotation).await?;

        let status = self.resolver.classify(tx.status_code);
        self.db.set_order_status(&tx.order_id, status, &tx.status_message).await?;
        if status == DomainStatus::Approved {
            // At most one delivery ever completes the payment, no matter how many approvals arrive.
            if self.db.complete_payment(&tx.order_id, &tx.payment_id).await? {
                info!("🔄️ Order {} payment completed by payment [{}]", tx.order_id, tx.payment_id);
            } else {
                debug!("🔄️ Order {} was already completed. Duplicate approval tolerated", tx.order_id);
            }
        }
        match self.db.reconcile_total(&tx.order_id, tx.total).await? {
            TotalReconciliation::Adjusted { delta } => {
                debug!("🔄️ Order {} total adjusted by {delta} to {}", tx.order_id, tx.total);
            },
            TotalReconciliation::Unchanged => {
                trace!("🔄️ Order {} total already reconciled", tx.order_id);
            },
        }
        self.call_webhook_processed_hook(&tx).await;
        debug!("🔄️ Order {} webhook processing complete. Status is now {status}", tx.order_id);
        Ok(ReconcileOutcome::Completed(tx.order_id))
    }

    async fn call_webhook_processed_hook(&self, tx: &NewTransaction) {
        for emitter in &self.producers.webhook_processed_producer {
            debug!("🔄️📬️ Notifying webhook-processed subscribers for order {}", tx.order_id);
            let event = WebhookProcessedEvent::new(tx.order_id.clone(), tx.raw_payload.clone());
            emitter.publish_event(event).await;
        }
    }
}

/// Builds the bookkeeping annotation a parent notification writes onto its order: metadata entries, the operation
/// audit note (with the card composite when the method is a card), the coupon URL and the risk evaluation.
fn build_annotation(tx: &NewTransaction, coupon_url_template: &str) -> OrderAnnotation {
    let mut annotation = OrderAnnotation::default()
        .with_metadata(META_WEBHOOK, tx.raw_payload.to_string())
        .with_metadata(META_PAYMENT_ID, tx.payment_id.clone());

    let source = &tx.source;
    let mut note = format!("Mobbex operation ID: {}. ", tx.payment_id);
    if source.kind == "card" {
        let card_info = format!("{} ( {} )", source.name, source.masked_number.as_deref().unwrap_or("****"));
        annotation = annotation.with_metadata(META_CARD_INFO, card_info.clone());
        note.push_str(&format!("Paid with {card_info}. "));
        if let Some(plan) = &source.installment {
            let card_plan = format!("{}. {} installment(s) of {}", plan.description, plan.count, plan.amount);
            annotation = annotation.with_metadata(META_CARD_PLAN, card_plan.clone());
            note.push_str(&format!("{card_plan}. "));
        }
    } else if !source.name.is_empty() {
        note.push_str(&format!("Paid with {}. ", source.name));
    }
    annotation = annotation.with_note(note);

    if let Some(entity_uid) = tx.entity_uid.as_deref().filter(|uid| !uid.is_empty()) {
        let coupon_url =
            coupon_url_template.replace("{entity.uid}", entity_uid).replace("{payment.id}", &tx.payment_id);
        annotation =
            annotation.with_metadata(META_COUPON_URL, coupon_url.clone()).with_note(format!("Coupon URL: {coupon_url}"));
    }

    if let Some(risk) = tx.risk_score.filter(|r| *r > 0.0) {
        annotation = annotation
            .with_note(format!("The operation risk was evaluated at: {risk}"))
            .with_metadata(META_RISK_ANALYSIS, risk.to_string());
    }

    if !source.name.is_empty() {
        annotation.payment_method = Some(format!("{} via Mobbex", source.name));
    }
    annotation
}

/// Formats the single audit note describing a child transaction.
fn child_note(tx: &NewTransaction) -> String {
    let source = &tx.source;
    let installment = source.installment.clone().unwrap_or_default();
    format!(
        "Child transaction processed: ID: {}. Status: {} ({}). Total: {}. Method: {} {} ({}x{}). Card: {}.",
        tx.payment_id,
        tx.status_code,
        tx.status_message,
        tx.total,
        source.name,
        installment.description,
        installment.count,
        installment.amount,
        source.masked_number.as_deref().unwrap_or("-"),
    )
}
