//! Contracts through which the engine reaches its collaborators. Each call
//! returns a value, an explicit not-found, or a generic failure; storage
//! engine details never leak past these seams.

use rust_decimal::Decimal;

use crate::domain::{AccountNo, Customer, CustomerId, Error, LedgerEntry, Rating, SourceRecord};

pub trait CustomerRepository {
    /// Source-of-truth lookup backing customer import. Name matching is
    /// trimmed and case-insensitive, account matching leading-zero-stripped.
    fn find_by_account_or_name(
        &mut self,
        name: &str,
        account: &AccountNo,
    ) -> Result<Option<SourceRecord>, Error>;

    /// Whether the already-validated set holds a customer with this name and
    /// account.
    fn check_duplicate(&mut self, name: &str, account: &AccountNo) -> Result<bool, Error>;

    fn find_by_account(&mut self, account: &AccountNo) -> Result<Option<Customer>, Error>;

    fn find_by_id(&mut self, id: &CustomerId) -> Result<Option<Customer>, Error>;

    fn list_all(&mut self) -> Result<Vec<Customer>, Error>;

    fn create(&mut self, customer: &Customer) -> Result<(), Error>;

    fn update_balance(&mut self, id: &CustomerId, balance: Decimal) -> Result<(), Error>;
}

pub trait LedgerRepository {
    fn append(&mut self, entry: &LedgerEntry) -> Result<(), Error>;

    fn has_any(&mut self, customer: &CustomerId) -> Result<bool, Error>;

    fn list_for_customer(&mut self, customer: &CustomerId) -> Result<Vec<LedgerEntry>, Error>;
}

pub trait RatingRepository {
    /// Create or overwrite the one rating a customer has.
    fn upsert(&mut self, rating: &Rating) -> Result<(), Error>;
}
