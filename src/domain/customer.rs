use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::short_id;

/// Stable external customer key (`CUST-` + 8 hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn generate() -> Self {
        Self(short_id("CUST"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Free-form account identifier. The raw form is kept for display; matching
/// always goes through [`AccountNo::canonical`], which trims whitespace,
/// strips leading zeros, and case-folds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccountNo(String);

impl AccountNo {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn canonical(&self) -> String {
        self.0.trim().trim_start_matches('0').to_lowercase()
    }

    pub fn matches(&self, other: &AccountNo) -> bool {
        self.canonical() == other.canonical()
    }
}

impl fmt::Display for AccountNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Account numbers arrive as JSON numbers or strings; numbers are formatted
// without a fractional part.
impl<'de> Deserialize<'de> for AccountNo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(AccountNo(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(AccountNo(i.to_string()))
                } else if let Some(u) = n.as_u64() {
                    Ok(AccountNo(u.to_string()))
                } else {
                    Ok(AccountNo(format!("{:.0}", n.as_f64().unwrap_or_default())))
                }
            }
            other => Err(serde::de::Error::custom(format!(
                "account number must be a number or string, got {}",
                other
            ))),
        }
    }
}

/// Case- and whitespace-insensitive matching form of a customer name.
pub fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A validated customer. The balance is the only field this crate mutates,
/// and only through the ledger balance tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "customerId")]
    pub customer_id: CustomerId,
    #[serde(rename = "customerName")]
    pub name: String,
    #[serde(rename = "accountNo")]
    pub account_no: AccountNo,
    #[serde(rename = "customerBalance")]
    pub balance: Decimal,
}

impl Customer {
    /// A freshly imported customer: generated id, zero balance.
    pub fn new(name: impl Into<String>, account_no: AccountNo) -> Self {
        Self {
            customer_id: CustomerId::generate(),
            name: name.into(),
            account_no,
            balance: Decimal::ZERO,
        }
    }
}

/// One row of the source-of-truth customer registry that import candidates
/// are matched against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "customerName")]
    pub name: String,
    #[serde(rename = "accountNo")]
    pub account_no: AccountNo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_strips_zeros_whitespace_and_case() {
        assert_eq!(AccountNo::new(" 001234 ").canonical(), "1234");
        assert_eq!(AccountNo::new("00AB9").canonical(), "ab9");
        assert!(AccountNo::new("001234").matches(&AccountNo::new("1234")));
        assert!(!AccountNo::new("1234").matches(&AccountNo::new("12345")));
    }

    #[test]
    fn account_no_deserializes_from_number_or_string() {
        let from_num: AccountNo = serde_json::from_str("5678").unwrap();
        assert_eq!(from_num.as_str(), "5678");
        let from_str: AccountNo = serde_json::from_str("\"001234\"").unwrap();
        assert_eq!(from_str.as_str(), "001234");
        assert!(serde_json::from_str::<AccountNo>("true").is_err());
    }

    #[test]
    fn name_matching_ignores_case_and_padding() {
        assert_eq!(normalized_name("  Alice Mwangi "), normalized_name("alice mwangi"));
    }

    #[test]
    fn new_customers_start_at_zero() {
        let c = Customer::new("Alice", AccountNo::new("1234"));
        assert!(c.customer_id.as_str().starts_with("CUST-"));
        assert_eq!(c.balance, Decimal::ZERO);
    }
}
