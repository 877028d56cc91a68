use futures::StreamExt;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{AttemptedRecord, AuditEntry, AuditKey, AuditLog};
use crate::backfill::BackfillGenerator;
use crate::balance;
use crate::domain::{
    Customer, CustomerId, CustomerRepository, Direction, EntryStatus, Error, LedgerEntry,
    LedgerRepository, Rating, RatingRepository, RecordError, short_id,
};
use crate::ingestion::{self, RawCustomerRecord, RawTransactionRecord, RecordSource};
use crate::scoring;

/// Outcome of one import phase: the committed records plus the audit trail
/// covering every input record.
#[derive(Debug, Serialize)]
pub struct ImportReport<T> {
    pub accepted: Vec<T>,
    pub logs: Vec<AuditEntry>,
}

/// Outcome of the full pipeline: import, backfill, scoring.
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub accepted: Vec<LedgerEntry>,
    pub ratings: Vec<Rating>,
    pub logs: Vec<AuditEntry>,
    /// Records skipped because a repository call failed; a systemic
    /// signal, surfaced separately from validation rejections.
    pub persistence_failures: usize,
}

/// The import/backfill/scoring engine, generic over its injected
/// repository collaborators.
#[derive(Debug)]
pub struct Engine<C, L, R> {
    customers: C,
    ledger: L,
    ratings: R,
}

impl<C, L, R> Engine<C, L, R>
where
    C: CustomerRepository,
    L: LedgerRepository,
    R: RatingRepository,
{
    pub fn new(customers: C, ledger: L, ratings: R) -> Self {
        Self {
            customers,
            ledger,
            ratings,
        }
    }

    pub fn into_parts(self) -> (C, L, R) {
        (self.customers, self.ledger, self.ratings)
    }

    /// Import a batch of customer records. Every record is validated
    /// independently; a failure rejects that record only. Fails with
    /// [`Error::BatchEmpty`] (carrying the full audit log) when nothing
    /// committed.
    pub async fn import_customers<S>(&mut self, mut source: S) -> Result<ImportReport<Customer>, Error>
    where
        S: RecordSource<RawCustomerRecord>,
    {
        let mut audit = AuditLog::new();
        let mut accepted = Vec::new();

        let mut records = source.stream();
        while let Some((index, record)) = records.next().await {
            let raw = match record {
                Ok(raw) => raw,
                Err(error) => {
                    audit.rejected(AuditKey::Record(index), vec![error], AttemptedRecord::default());
                    continue;
                }
            };
            match self.import_customer(&raw) {
                Ok(customer) => {
                    debug!(index, customer = %customer.customer_id, "customer record accepted");
                    audit.accepted_customer(index, customer.clone());
                    accepted.push(customer);
                }
                Err(errors) => {
                    debug!(index, ?errors, "customer record rejected");
                    audit.rejected(AuditKey::Record(index), errors, AttemptedRecord::customer(&raw));
                }
            }
        }

        info!(
            accepted = accepted.len(),
            rejected = audit.len() - accepted.len(),
            "customer import finished"
        );
        if accepted.is_empty() {
            return Err(Error::BatchEmpty(audit.into_entries()));
        }
        Ok(ImportReport {
            accepted,
            logs: audit.into_entries(),
        })
    }

    fn import_customer(&mut self, raw: &RawCustomerRecord) -> Result<Customer, Vec<RecordError>> {
        let draft = ingestion::validate_customer(raw)?;

        let source_match = self
            .customers
            .find_by_account_or_name(&draft.name, &draft.account_no)
            .map_err(persistence)?;
        if source_match.is_none() {
            return Err(vec![RecordError::Reference(
                "name or account number does not match existing records".into(),
            )]);
        }

        if self
            .customers
            .check_duplicate(&draft.name, &draft.account_no)
            .map_err(persistence)?
        {
            return Err(vec![RecordError::Conflict(
                "record already exists among validated customers".into(),
            )]);
        }

        let customer = Customer::new(draft.name, draft.account_no);
        self.customers
            .create(&customer)
            .map_err(|e| vec![RecordError::Persistence(format!("failed to save customer: {e}"))])?;
        Ok(customer)
    }

    /// Import a batch of transaction records. Fails with
    /// [`Error::BatchEmpty`] when nothing committed.
    pub async fn import_transactions<S>(
        &mut self,
        source: S,
        allow_overdraft: bool,
    ) -> Result<ImportReport<LedgerEntry>, Error>
    where
        S: RecordSource<RawTransactionRecord>,
    {
        let mut audit = AuditLog::new();
        let accepted = self.import_transactions_into(source, allow_overdraft, &mut audit).await;
        if accepted.is_empty() {
            return Err(Error::BatchEmpty(audit.into_entries()));
        }
        Ok(ImportReport {
            accepted,
            logs: audit.into_entries(),
        })
    }

    /// Full pipeline: import the batch, backfill history for customers the
    /// batch left untouched, score everyone. The audit log accumulates
    /// across the import and backfill phases.
    pub async fn run<S, G>(
        &mut self,
        source: S,
        allow_overdraft: bool,
        generator: &mut BackfillGenerator<G>,
    ) -> Result<PipelineReport, Error>
    where
        S: RecordSource<RawTransactionRecord>,
        G: Rng,
    {
        let mut audit = AuditLog::new();

        let mut accepted = self.import_transactions_into(source, allow_overdraft, &mut audit).await;
        if accepted.is_empty() {
            return Err(Error::BatchEmpty(audit.into_entries()));
        }

        let synthetic = self.backfill(generator, &mut audit)?;
        accepted.extend(synthetic);

        let ratings = self.score_all()?;

        let persistence_failures = audit.persistence_failures();
        if persistence_failures > 0 {
            warn!(persistence_failures, "records skipped due to repository failures");
        }
        info!(
            entries = accepted.len(),
            ratings = ratings.len(),
            "pipeline finished"
        );
        Ok(PipelineReport {
            accepted,
            ratings,
            logs: audit.into_entries(),
            persistence_failures,
        })
    }

    async fn import_transactions_into<S>(
        &mut self,
        mut source: S,
        allow_overdraft: bool,
        audit: &mut AuditLog,
    ) -> Vec<LedgerEntry>
    where
        S: RecordSource<RawTransactionRecord>,
    {
        let mut accepted = Vec::new();

        let mut records = source.stream();
        while let Some((index, record)) = records.next().await {
            let raw = match record {
                Ok(raw) => raw,
                Err(error) => {
                    audit.rejected(AuditKey::Record(index), vec![error], AttemptedRecord::default());
                    continue;
                }
            };
            match self.import_transaction(&raw, allow_overdraft) {
                Ok(entry) => {
                    debug!(index, entry = %entry.entry_id, "transaction record accepted");
                    audit.accepted_entry(index, entry.clone());
                    accepted.push(entry);
                }
                Err(errors) => {
                    debug!(index, ?errors, "transaction record rejected");
                    audit.rejected(
                        AuditKey::Record(index),
                        errors,
                        AttemptedRecord::transaction(&raw),
                    );
                }
            }
        }

        info!(
            accepted = accepted.len(),
            rejected = audit.len() - accepted.len(),
            "transaction import finished"
        );
        accepted
    }

    fn import_transaction(
        &mut self,
        raw: &RawTransactionRecord,
        allow_overdraft: bool,
    ) -> Result<LedgerEntry, Vec<RecordError>> {
        let draft = ingestion::validate_transaction(raw)?;

        let customer = self
            .customers
            .find_by_account(&draft.from_account)
            .map_err(persistence)?
            .ok_or_else(|| {
                vec![RecordError::Reference(format!(
                    "no customer found for account {}",
                    draft.from_account
                ))]
            })?;

        // Default direction is a debit; a to-account landing back on the
        // same customer marks the entry inbound.
        let mut inferred = Direction::Debit;
        if !draft.to_account.as_str().is_empty() {
            if let Ok(Some(to)) = self.customers.find_by_account(&draft.to_account) {
                if to.customer_id == customer.customer_id {
                    inferred = Direction::Credit;
                }
            }
        }
        let direction = Direction::normalize(&draft.transaction_type, inferred).ok_or_else(|| {
            vec![RecordError::Validation(format!(
                "unsupported transaction type: {}",
                draft.transaction_type
            ))]
        })?;

        let cleared = balance::apply(customer.balance, draft.amount, direction, allow_overdraft)
            .map_err(|_| vec![RecordError::InsufficientFunds])?;

        let entry = LedgerEntry {
            entry_id: short_id("TXN"),
            customer_id: customer.customer_id.clone(),
            from_account: draft.from_account.clone(),
            to_account: draft.to_account.clone(),
            amount: draft.amount,
            transaction_type: direction,
            transaction_date: draft.transaction_date,
            cleared_balance: cleared,
            status: EntryStatus::Completed,
            remark: non_empty(&raw.remark),
            request_id: non_empty(&raw.request_id),
            reference: non_empty(&raw.reference),
            third_party_reference: non_empty(&raw.third_party_reference),
            institution_id: non_empty(&raw.institution_id),
            biller_id: non_empty(&raw.biller_id),
        };

        // Entry first; the balance write must not happen if this fails.
        self.ledger.append(&entry).map_err(|e| {
            vec![RecordError::Persistence(format!("failed to save transaction: {e}"))]
        })?;
        if let Err(e) = self.customers.update_balance(&customer.customer_id, cleared) {
            warn!(
                customer = %customer.customer_id,
                "balance write failed after ledger append; stored balance is stale"
            );
            return Err(vec![RecordError::Persistence(format!(
                "failed to update customer balance: {e}"
            ))]);
        }
        Ok(entry)
    }

    /// Generate history for every customer the import phase left without
    /// entries. Per-customer failures are audited and skipped; the batch
    /// keeps going.
    fn backfill<G: Rng>(
        &mut self,
        generator: &mut BackfillGenerator<G>,
        audit: &mut AuditLog,
    ) -> Result<Vec<LedgerEntry>, Error> {
        let customers = self.customers.list_all()?;
        let mut generated = Vec::new();

        for customer in customers {
            match self.ledger.has_any(&customer.customer_id) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    audit.rejected(
                        AuditKey::Customer(customer.customer_id.clone()),
                        vec![RecordError::Persistence(format!(
                            "error checking transactions: {e}"
                        ))],
                        AttemptedRecord::default(),
                    );
                    continue;
                }
            }

            let history = generator.generate(&customer);
            debug!(
                customer = %customer.customer_id,
                entries = history.entries.len(),
                "generated synthetic history"
            );

            let mut last_balance = customer.balance;
            let mut aborted = false;
            for entry in &history.entries {
                if let Err(e) = self.ledger.append(entry) {
                    // later entries depend on this one's balance, so the
                    // rest of the sequence is dropped
                    audit.rejected(
                        AuditKey::Customer(customer.customer_id.clone()),
                        vec![RecordError::Persistence(format!(
                            "failed to save synthetic transaction: {e}"
                        ))],
                        AttemptedRecord::default(),
                    );
                    aborted = true;
                    break;
                }
                last_balance = entry.cleared_balance;
                audit.accepted_synthetic(customer.customer_id.clone(), entry.clone());
                generated.push(entry.clone());
            }
            debug_assert!(aborted || last_balance == history.final_balance);

            if let Err(e) = self.customers.update_balance(&customer.customer_id, last_balance) {
                warn!(
                    customer = %customer.customer_id,
                    "balance write failed after synthetic history; stored balance is stale"
                );
                audit.rejected(
                    AuditKey::Customer(customer.customer_id.clone()),
                    vec![RecordError::Persistence(format!(
                        "failed to update customer balance: {e}"
                    ))],
                    AttemptedRecord::default(),
                );
            }
        }
        Ok(generated)
    }

    /// Score one customer from their full history and persist the rating.
    /// Empty history here means backfill did not run or was defeated: an
    /// internal invariant violation, not bad input.
    pub fn score_customer(&mut self, id: &CustomerId) -> Result<Rating, Error> {
        let entries = self.ledger.list_for_customer(id)?;
        let rating =
            scoring::score(id.clone(), &entries).ok_or_else(|| Error::NoHistory(id.clone()))?;
        self.ratings.upsert(&rating)?;
        Ok(rating)
    }

    fn score_all(&mut self) -> Result<Vec<Rating>, Error> {
        let customers = self.customers.list_all()?;
        let mut ratings = Vec::with_capacity(customers.len());
        for customer in customers {
            ratings.push(self.score_customer(&customer.customer_id)?);
        }
        Ok(ratings)
    }
}

fn persistence(e: Error) -> Vec<RecordError> {
    vec![RecordError::Persistence(e.to_string())]
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
