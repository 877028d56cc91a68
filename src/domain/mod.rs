pub mod customer;
pub mod error;
pub mod money;
pub mod rating;
pub mod traits;
pub mod transaction;

pub use customer::{AccountNo, Customer, CustomerId, SourceRecord, normalized_name};
pub use error::{Error, RecordError};
pub use rating::{Rating, ScoreBreakdown};
pub use traits::{CustomerRepository, LedgerRepository, RatingRepository};
pub use transaction::{Direction, EntryStatus, LedgerEntry};

use uuid::Uuid;

/// Short prefixed identifier, e.g. `CUST-1f8a03bc` or `TXN-9e4d11aa`.
pub fn short_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..8])
}
