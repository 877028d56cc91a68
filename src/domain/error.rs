use crate::audit::AuditEntry;
use crate::domain::CustomerId;

/// Pipeline-level failures. Per-record failures are [`RecordError`]s and
/// live in the audit log instead of aborting the batch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("ingestion failed: {0}")]
    Ingestion(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    /// Zero records committed across the batch. Carries the complete audit
    /// log so every rejection stays diagnosable.
    #[error("no records committed from batch; see audit log for per-record failures")]
    BatchEmpty(Vec<AuditEntry>),

    /// A customer reached scoring with no history. Backfill guarantees this
    /// cannot happen, so hitting it means the pipeline itself is broken.
    #[error("no transaction history for customer {0} after backfill")]
    NoHistory(CustomerId),
}

/// Why a single record was rejected. Always recoverable: the record is
/// logged and the batch moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Reference(String),

    #[error("{0}")]
    Conflict(String),

    #[error("insufficient balance for debit")]
    InsufficientFunds,

    #[error("{0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use super::RecordError;

    #[test]
    fn record_errors_render_their_message() {
        let e = RecordError::Validation("amount must be positive".into());
        assert_eq!(e.to_string(), "amount must be positive");
        assert_eq!(
            RecordError::InsufficientFunds.to_string(),
            "insufficient balance for debit"
        );
    }
}
