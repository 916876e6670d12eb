/// Read-only view of the transaction manager.
pub trait TransactionProbe: Send + Sync {
    /// Whether the calling thread runs inside a physical database transaction.
    fn is_actual_transaction_active(&self) -> bool;

    /// The distributed (XA) transaction the calling thread participates in.
    fn current_xid(&self) -> Option<String>;
}

/// A probe for deployments without a transaction manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransaction;

impl TransactionProbe for NoTransaction {
    fn is_actual_transaction_active(&self) -> bool {
        false
    }

    fn current_xid(&self) -> Option<String> {
        None
    }
}
