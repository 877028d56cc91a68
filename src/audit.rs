//! Per-record audit trail for import and backfill. Entries are a tagged
//! variant internally; serialization flattens them to the external JSON
//! shape (`record_index`, `verified`, `errors`, `attempted_*`,
//! `normalized_record`/`transaction`, `synthetic`).

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::domain::{Customer, CustomerId, LedgerEntry, RecordError};
use crate::ingestion::{RawCustomerRecord, RawTransactionRecord};

/// What an audit entry is keyed by: a 1-based batch record index, or the
/// customer a backfill-stage entry was generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditKey {
    Record(usize),
    Customer(CustomerId),
}

/// The normalized value a verified entry carries.
#[derive(Debug, Clone)]
pub enum CommittedRecord {
    Customer(Customer),
    Entry(LedgerEntry),
}

/// Original attempted values echoed back on rejection.
#[derive(Debug, Clone, Default)]
pub struct AttemptedRecord {
    pub name: Option<String>,
    pub account_no: Option<String>,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub amount: Option<Value>,
    pub transaction_type: Option<String>,
}

impl AttemptedRecord {
    pub fn customer(raw: &RawCustomerRecord) -> Self {
        Self {
            name: Some(raw.customer_name.clone()),
            account_no: raw.account_no.as_ref().map(stringify),
            ..Self::default()
        }
    }

    pub fn transaction(raw: &RawTransactionRecord) -> Self {
        Self {
            from_account: Some(raw.from_account.clone()),
            to_account: Some(raw.to_account.clone()),
            amount: raw.amount.clone(),
            transaction_type: Some(raw.transaction_type.clone()),
            ..Self::default()
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub enum AuditOutcome {
    Accepted(CommittedRecord),
    Rejected {
        errors: Vec<RecordError>,
        attempted: AttemptedRecord,
    },
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub key: AuditKey,
    pub synthetic: bool,
    pub outcome: AuditOutcome,
}

impl AuditEntry {
    pub fn verified(&self) -> bool {
        matches!(self.outcome, AuditOutcome::Accepted(_))
    }

    pub fn errors(&self) -> Vec<String> {
        match &self.outcome {
            AuditOutcome::Rejected { errors, .. } => errors.iter().map(|e| e.to_string()).collect(),
            AuditOutcome::Accepted(_) => Vec::new(),
        }
    }
}

impl Serialize for AuditEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match &self.key {
            AuditKey::Record(index) => map.serialize_entry("record_index", index)?,
            AuditKey::Customer(id) => map.serialize_entry("customer_id", id)?,
        }
        map.serialize_entry("verified", &self.verified())?;
        map.serialize_entry("errors", &self.errors())?;
        if self.synthetic {
            map.serialize_entry("synthetic", &true)?;
        }
        match &self.outcome {
            AuditOutcome::Accepted(CommittedRecord::Customer(customer)) => {
                map.serialize_entry("normalized_record", customer)?;
            }
            AuditOutcome::Accepted(CommittedRecord::Entry(entry)) => {
                map.serialize_entry("transaction", entry)?;
            }
            AuditOutcome::Rejected { attempted, .. } => {
                if let Some(v) = &attempted.name {
                    map.serialize_entry("attempted_name", v)?;
                }
                if let Some(v) = &attempted.account_no {
                    map.serialize_entry("attempted_account_no", v)?;
                }
                if let Some(v) = &attempted.from_account {
                    map.serialize_entry("attempted_from_account", v)?;
                }
                if let Some(v) = &attempted.to_account {
                    map.serialize_entry("attempted_to_account", v)?;
                }
                if let Some(v) = &attempted.amount {
                    map.serialize_entry("attempted_amount", v)?;
                }
                if let Some(v) = &attempted.transaction_type {
                    map.serialize_entry("attempted_transaction_type", v)?;
                }
            }
        }
        map.end()
    }
}

/// Accumulates audit entries across the import and backfill phases of one
/// pipeline invocation. Never persisted.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    persistence_failures: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted_customer(&mut self, index: usize, customer: Customer) {
        self.entries.push(AuditEntry {
            key: AuditKey::Record(index),
            synthetic: false,
            outcome: AuditOutcome::Accepted(CommittedRecord::Customer(customer)),
        });
    }

    pub fn accepted_entry(&mut self, index: usize, entry: LedgerEntry) {
        self.entries.push(AuditEntry {
            key: AuditKey::Record(index),
            synthetic: false,
            outcome: AuditOutcome::Accepted(CommittedRecord::Entry(entry)),
        });
    }

    pub fn accepted_synthetic(&mut self, customer: CustomerId, entry: LedgerEntry) {
        self.entries.push(AuditEntry {
            key: AuditKey::Customer(customer),
            synthetic: true,
            outcome: AuditOutcome::Accepted(CommittedRecord::Entry(entry)),
        });
    }

    pub fn rejected(&mut self, key: AuditKey, errors: Vec<RecordError>, attempted: AttemptedRecord) {
        if errors.iter().any(|e| matches!(e, RecordError::Persistence(_))) {
            self.persistence_failures += 1;
        }
        self.entries.push(AuditEntry {
            key,
            synthetic: false,
            outcome: AuditOutcome::Rejected { errors, attempted },
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Records rejected because a repository call failed; surfaced to the
    /// caller distinctly from validation failures.
    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountNo;
    use serde_json::json;

    #[test]
    fn accepted_customer_serializes_to_wire_shape() {
        let mut log = AuditLog::new();
        log.accepted_customer(3, Customer::new("Alice", AccountNo::new("1234")));
        let value = serde_json::to_value(&log.entries()[0]).unwrap();
        assert_eq!(value["record_index"], 3);
        assert_eq!(value["verified"], true);
        assert_eq!(value["errors"], json!([]));
        assert_eq!(value["normalized_record"]["customerName"], "Alice");
        assert!(value.get("synthetic").is_none());
        assert!(value.get("attempted_name").is_none());
    }

    #[test]
    fn rejection_echoes_attempted_values() {
        let mut log = AuditLog::new();
        log.rejected(
            AuditKey::Record(1),
            vec![
                RecordError::Validation("amount must be positive".into()),
                RecordError::Reference("no customer found for account 99".into()),
            ],
            AttemptedRecord {
                from_account: Some("99".into()),
                amount: Some(json!(-5)),
                ..AttemptedRecord::default()
            },
        );
        let value = serde_json::to_value(&log.entries()[0]).unwrap();
        assert_eq!(value["verified"], false);
        assert_eq!(
            value["errors"],
            json!(["amount must be positive", "no customer found for account 99"])
        );
        assert_eq!(value["attempted_from_account"], "99");
        assert_eq!(value["attempted_amount"], json!(-5));
        assert!(value.get("transaction").is_none());
    }

    #[test]
    fn backfill_entries_are_keyed_by_customer_and_flagged() {
        let mut log = AuditLog::new();
        let customer = Customer::new("Bob", AccountNo::new("5678"));
        log.accepted_synthetic(
            customer.customer_id.clone(),
            crate::scoring::tests_support::entry_for(&customer, 100, 0),
        );
        let value = serde_json::to_value(&log.entries()[0]).unwrap();
        assert_eq!(value["customer_id"], customer.customer_id.as_str());
        assert_eq!(value["synthetic"], true);
        assert!(value.get("record_index").is_none());
    }

    #[test]
    fn persistence_failures_are_counted_separately() {
        let mut log = AuditLog::new();
        log.rejected(
            AuditKey::Record(1),
            vec![RecordError::Validation("bad".into())],
            AttemptedRecord::default(),
        );
        log.rejected(
            AuditKey::Record(2),
            vec![RecordError::Persistence("store down".into())],
            AttemptedRecord::default(),
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.persistence_failures(), 1);
    }
}
