//! In-memory reference implementations of the repository contracts, used by
//! the binary harness and the integration tests.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use rust_decimal::Decimal;

use crate::domain::{
    AccountNo, Customer, CustomerId, CustomerRepository, Error, LedgerEntry, LedgerRepository,
    Rating, RatingRepository, SourceRecord, normalized_name,
};

/// Validated customers plus the source-of-truth registry import candidates
/// are matched against.
#[derive(Debug, Default)]
pub struct MemoryCustomers {
    source: Vec<SourceRecord>,
    customers: BTreeMap<String, Customer>,
    by_account: BTreeMap<String, String>,
}

impl MemoryCustomers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: Vec<SourceRecord>) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }
}

impl CustomerRepository for MemoryCustomers {
    fn find_by_account_or_name(
        &mut self,
        name: &str,
        account: &AccountNo,
    ) -> Result<Option<SourceRecord>, Error> {
        Ok(self
            .source
            .iter()
            .find(|r| normalized_name(&r.name) == normalized_name(name) && r.account_no.matches(account))
            .cloned())
    }

    fn check_duplicate(&mut self, name: &str, account: &AccountNo) -> Result<bool, Error> {
        Ok(self.customers.values().any(|c| {
            normalized_name(&c.name) == normalized_name(name) && c.account_no.matches(account)
        }))
    }

    fn find_by_account(&mut self, account: &AccountNo) -> Result<Option<Customer>, Error> {
        Ok(self
            .by_account
            .get(&account.canonical())
            .and_then(|id| self.customers.get(id))
            .cloned())
    }

    fn find_by_id(&mut self, id: &CustomerId) -> Result<Option<Customer>, Error> {
        Ok(self.customers.get(id.as_str()).cloned())
    }

    fn list_all(&mut self) -> Result<Vec<Customer>, Error> {
        Ok(self.customers.values().cloned().collect())
    }

    fn create(&mut self, customer: &Customer) -> Result<(), Error> {
        match self.customers.entry(customer.customer_id.as_str().to_owned()) {
            Entry::Vacant(e) => {
                e.insert(customer.clone());
                self.by_account.insert(
                    customer.account_no.canonical(),
                    customer.customer_id.as_str().to_owned(),
                );
                Ok(())
            }
            Entry::Occupied(_) => Err(Error::Persistence(format!(
                "customer {} already exists",
                customer.customer_id
            ))),
        }
    }

    fn update_balance(&mut self, id: &CustomerId, balance: Decimal) -> Result<(), Error> {
        match self.customers.get_mut(id.as_str()) {
            Some(customer) => {
                customer.balance = balance;
                Ok(())
            }
            None => Err(Error::Persistence(format!("unknown customer {id}"))),
        }
    }
}

/// Append-only ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Vec<LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }
}

impl LedgerRepository for MemoryLedger {
    fn append(&mut self, entry: &LedgerEntry) -> Result<(), Error> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn has_any(&mut self, customer: &CustomerId) -> Result<bool, Error> {
        Ok(self.entries.iter().any(|e| &e.customer_id == customer))
    }

    fn list_for_customer(&mut self, customer: &CustomerId) -> Result<Vec<LedgerEntry>, Error> {
        Ok(self
            .entries
            .iter()
            .filter(|e| &e.customer_id == customer)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRatings {
    ratings: BTreeMap<String, Rating>,
}

impl MemoryRatings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &CustomerId) -> Option<&Rating> {
        self.ratings.get(id.as_str())
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

impl RatingRepository for MemoryRatings {
    fn upsert(&mut self, rating: &Rating) -> Result<(), Error> {
        self.ratings
            .insert(rating.customer_id.as_str().to_owned(), rating.clone());
        Ok(())
    }
}
