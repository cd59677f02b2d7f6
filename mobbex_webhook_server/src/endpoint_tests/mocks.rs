use mobbex_payment_engine::{
    db_types::{DomainStatus, LineItem, NewOrder, NewTransaction, Order, OrderId, TransactionRecord},
    traits::{OrderAnnotation, OrderStore, StoreError, TotalReconciliation, TransactionStore},
};
use mockall::mock;
use mwg_common::Money;

mock! {
    pub GatewayStore {}
    impl OrderStore for GatewayStore {
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), StoreError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn annotate_order(&self, order_id: &OrderId, annotation: OrderAnnotation) -> Result<Order, StoreError>;
        async fn set_order_status(&self, order_id: &OrderId, status: DomainStatus, message: &str) -> Result<Order, StoreError>;
        async fn complete_payment(&self, order_id: &OrderId, payment_ref: &str) -> Result<bool, StoreError>;
        async fn reconcile_total(&self, order_id: &OrderId, notified_total: Money) -> Result<TotalReconciliation, StoreError>;
        async fn add_note(&self, order_id: &OrderId, note: &str) -> Result<i64, StoreError>;
        async fn create_refund(&self, order_id: &OrderId, amount: Money) -> Result<i64, StoreError>;
        async fn fetch_notes(&self, order_id: &OrderId) -> Result<Vec<String>, StoreError>;
        async fn fetch_metadata(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, StoreError>;
        async fn fetch_line_items(&self, order_id: &OrderId) -> Result<Vec<LineItem>, StoreError>;
    }
    impl TransactionStore for GatewayStore {
        async fn append_transaction(&self, tx: NewTransaction) -> Result<i64, StoreError>;
        async fn fetch_transactions_for_order(&self, order_id: &OrderId) -> Result<Vec<TransactionRecord>, StoreError>;
    }
}
