//! The single path through which a customer's balance changes.

use rust_decimal::Decimal;

use crate::domain::{Direction, LedgerEntry};

/// A debit was refused because it would drive the balance negative while
/// overdraft is disallowed. Not retryable; callers treat it as a validation
/// failure on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient balance for debit")]
pub struct InsufficientFunds;

/// Apply one ledger effect. Debits subtract, credits add. A refusal means
/// no mutation has happened anywhere.
pub fn apply(
    balance: Decimal,
    amount: Decimal,
    direction: Direction,
    allow_overdraft: bool,
) -> Result<Decimal, InsufficientFunds> {
    match direction {
        Direction::Credit => Ok(balance + amount),
        Direction::Debit => {
            let next = balance - amount;
            if next < Decimal::ZERO && !allow_overdraft {
                return Err(InsufficientFunds);
            }
            Ok(next)
        }
    }
}

/// A cleared-balance snapshot that does not match the replayed chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cleared balance mismatch on entry {entry_id}: recorded {recorded}, replayed {replayed}")]
pub struct BalanceMismatch {
    pub entry_id: String,
    pub recorded: Decimal,
    pub replayed: Decimal,
}

/// Replay a customer's entries in transaction-date order from an opening
/// balance, checking every cleared-balance snapshot. Returns the closing
/// balance. Ties on the date keep their original order (stable sort).
pub fn replay(opening: Decimal, entries: &[LedgerEntry]) -> Result<Decimal, BalanceMismatch> {
    let mut ordered: Vec<&LedgerEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.transaction_date);

    let mut balance = opening;
    for entry in ordered {
        balance = match entry.transaction_type {
            Direction::Debit => balance - entry.amount,
            Direction::Credit => balance + entry.amount,
        };
        if balance != entry.cleared_balance {
            return Err(BalanceMismatch {
                entry_id: entry.entry_id.clone(),
                recorded: entry.cleared_balance,
                replayed: balance,
            });
        }
    }
    Ok(balance)
}
