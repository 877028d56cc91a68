//! Fabricates balance-consistent history for customers that finished import
//! with none, so every customer is scoreable.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use crate::balance;
use crate::domain::{AccountNo, Customer, Direction, EntryStatus, LedgerEntry, short_id};

/// Bounds for generated history.
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    pub min_entries: u32,
    pub max_entries: u32,
    /// Amount range in minor units (cents).
    pub min_amount_cents: i64,
    pub max_amount_cents: i64,
    /// Transaction dates are drawn from the past this-many days.
    pub window_days: i64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            min_entries: 2,
            max_entries: 5,
            min_amount_cents: 5_000,
            max_amount_cents: 50_000,
            window_days: 365,
        }
    }
}

/// A generated sequence plus the balance it leaves the customer at.
#[derive(Debug, Clone)]
pub struct GeneratedHistory {
    pub entries: Vec<LedgerEntry>,
    pub final_balance: Decimal,
}

/// Generates synthetic entries from an injected random source. The
/// generation timestamp is injected too, so tests are deterministic from a
/// seeded rng.
#[derive(Debug)]
pub struct BackfillGenerator<R> {
    config: BackfillConfig,
    rng: R,
    now: DateTime<Utc>,
}

impl<R: Rng> BackfillGenerator<R> {
    pub fn new(rng: R, now: DateTime<Utc>) -> Self {
        Self::with_config(BackfillConfig::default(), rng, now)
    }

    pub fn with_config(config: BackfillConfig, rng: R, now: DateTime<Utc>) -> Self {
        Self { config, rng, now }
    }

    /// Generate a sequence for one customer, threading the running balance
    /// through every emitted entry. Debits that would overdraw are skipped,
    /// never emitted. Dates are sorted before balances are threaded so the
    /// date-ordered replay of the sequence reproduces every cleared-balance
    /// snapshot.
    pub fn generate(&mut self, customer: &Customer) -> GeneratedHistory {
        let count = self
            .rng
            .gen_range(self.config.min_entries..=self.config.max_entries);

        let mut dates: Vec<DateTime<Utc>> = (0..count)
            .map(|_| self.now - Duration::days(self.rng.gen_range(0..self.config.window_days)))
            .collect();
        dates.sort();

        let mut balance = customer.balance;
        let mut entries = Vec::with_capacity(count as usize);
        for date in dates {
            let direction = if self.rng.gen_bool(0.5) {
                Direction::Credit
            } else {
                Direction::Debit
            };
            let cents = self
                .rng
                .gen_range(self.config.min_amount_cents..=self.config.max_amount_cents);
            let amount = Decimal::new(cents, 2);

            let Ok(next) = balance::apply(balance, amount, direction, false) else {
                continue;
            };
            balance = next;
            entries.push(self.entry(customer, amount, direction, date, balance));
        }

        // The generator, not the caller, guarantees a scoreable history: if
        // every draw was an unaffordable debit, emit a single credit.
        if entries.is_empty() {
            let cents = self
                .rng
                .gen_range(self.config.min_amount_cents..=self.config.max_amount_cents);
            let amount = Decimal::new(cents, 2);
            balance += amount;
            let date = self.now - Duration::days(self.rng.gen_range(0..self.config.window_days));
            entries.push(self.entry(customer, amount, Direction::Credit, date, balance));
        }

        GeneratedHistory {
            entries,
            final_balance: balance,
        }
    }

    fn entry(
        &mut self,
        customer: &Customer,
        amount: Decimal,
        direction: Direction,
        date: DateTime<Utc>,
        cleared: Decimal,
    ) -> LedgerEntry {
        LedgerEntry {
            entry_id: short_id("TXN"),
            customer_id: customer.customer_id.clone(),
            from_account: customer.account_no.clone(),
            to_account: AccountNo::new(short_id("SYN")),
            amount,
            transaction_type: direction,
            transaction_date: date,
            cleared_balance: cleared,
            status: EntryStatus::Completed,
            remark: Some(format!("Synthetic {direction}")),
            request_id: None,
            reference: None,
            third_party_reference: None,
            institution_id: None,
            biller_id: None,
        }
    }
}
