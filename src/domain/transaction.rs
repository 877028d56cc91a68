use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountNo, CustomerId};

/// Ledger effect of an entry after inbound type normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Debit,
    Credit,
}

/// Inbound transaction types that always settle as a debit.
const DEBIT_TYPES: &[&str] = &[
    "Derash Bill Payment",
    "DSTV Payment",
    "OtherBank Transaction",
    "mpesa Transaction",
    "M-PESA Transaction",
    "YIMULU",
    "SAFARI AIRTIME",
    "telebirr Transaction",
];

/// Inbound types that keep the direction inferred from the account pair.
const TRANSFER_TYPES: &[&str] = &["withInBank Transaction", "Bank2Bank Transaction"];

impl Direction {
    /// Normalize a raw inbound type tag against the direction inferred from
    /// the account pair. `None` means the tag is unsupported.
    pub fn normalize(raw: &str, inferred: Direction) -> Option<Direction> {
        match raw {
            "" => Some(inferred),
            "Debit" => Some(Direction::Debit),
            "Credit" => Some(Direction::Credit),
            t if DEBIT_TYPES.contains(&t) => Some(Direction::Debit),
            t if TRANSFER_TYPES.contains(&t) => Some(inferred),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Debit => "Debit",
            Direction::Credit => "Credit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Completed,
}

/// One committed transaction. Append-only: entries are never mutated or
/// deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(rename = "id")]
    pub entry_id: String,
    #[serde(rename = "customer_id")]
    pub customer_id: CustomerId,
    pub from_account: AccountNo,
    pub to_account: AccountNo,
    pub amount: Decimal,
    pub transaction_type: Direction,
    pub transaction_date: DateTime<Utc>,
    /// Balance snapshot immediately after this entry was applied.
    pub cleared_balance: Decimal,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_party_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biller_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_known_inbound_types() {
        assert_eq!(
            Direction::normalize("DSTV Payment", Direction::Credit),
            Some(Direction::Debit)
        );
        assert_eq!(
            Direction::normalize("telebirr Transaction", Direction::Credit),
            Some(Direction::Debit)
        );
        assert_eq!(
            Direction::normalize("withInBank Transaction", Direction::Credit),
            Some(Direction::Credit)
        );
        assert_eq!(
            Direction::normalize("Bank2Bank Transaction", Direction::Debit),
            Some(Direction::Debit)
        );
    }

    #[test]
    fn normalize_accepts_explicit_and_empty_tags() {
        assert_eq!(Direction::normalize("Credit", Direction::Debit), Some(Direction::Credit));
        assert_eq!(Direction::normalize("Debit", Direction::Credit), Some(Direction::Debit));
        assert_eq!(Direction::normalize("", Direction::Credit), Some(Direction::Credit));
    }

    #[test]
    fn normalize_rejects_unknown_tags() {
        assert_eq!(Direction::normalize("Wire Transfer", Direction::Debit), None);
    }

    #[test]
    fn entry_serializes_with_wire_field_names() {
        let entry = LedgerEntry {
            entry_id: "TXN-deadbeef".into(),
            customer_id: CustomerId::from("CUST-12345678"),
            from_account: AccountNo::new("1234"),
            to_account: AccountNo::new("5678"),
            amount: Decimal::new(2500, 2),
            transaction_type: Direction::Debit,
            transaction_date: Utc::now(),
            cleared_balance: Decimal::new(7500, 2),
            status: EntryStatus::Completed,
            remark: None,
            request_id: None,
            reference: None,
            third_party_reference: None,
            institution_id: None,
            biller_id: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["fromAccount"], "1234");
        assert_eq!(value["transactionType"], "Debit");
        assert_eq!(value["clearedBalance"], "75.00");
        assert_eq!(value["status"], "completed");
        assert!(value.get("remark").is_none());
    }
}
