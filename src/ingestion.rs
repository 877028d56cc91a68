use std::io::Read;
use std::marker::PhantomData;
use std::pin::Pin;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::stream::{self, Stream};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::money::decimal_from_value;
use crate::domain::{AccountNo, Error, RecordError};

/// A source of raw batch records, yielded with their 1-based record index.
/// A record that fails to deserialize is yielded as an error so the batch
/// keeps going; only an unreadable batch fails the whole stream.
pub trait RecordSource<T> {
    type RecordStream: Stream<Item = (usize, Result<T, RecordError>)> + Send + Unpin + 'static;

    fn stream(&mut self) -> Self::RecordStream;
}

/// Reads a batch delivered as a JSON array of records.
#[derive(Debug)]
pub struct JsonArraySource<T> {
    records: Option<Vec<Value>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonArraySource<T> {
    pub fn new<R: Read>(mut reader: R) -> Result<Self, Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        let records: Vec<Value> = serde_json::from_slice(&buf)
            .map_err(|e| Error::Ingestion(format!("invalid JSON batch: {e}")))?;
        Ok(Self {
            records: Some(records),
            _marker: PhantomData,
        })
    }
}

impl<T: DeserializeOwned + Send + 'static> RecordSource<T> for JsonArraySource<T> {
    type RecordStream = Pin<Box<dyn Stream<Item = (usize, Result<T, RecordError>)> + Send>>;

    fn stream(&mut self) -> Self::RecordStream {
        // Take ownership so the stream owns all data and is 'static; a
        // second call yields an empty stream.
        let records = self.records.take().unwrap_or_default();
        let iter = records.into_iter().enumerate().map(|(i, value)| {
            let parsed = serde_json::from_value::<T>(value)
                .map_err(|e| RecordError::Validation(format!("malformed record: {e}")));
            (i + 1, parsed)
        });
        Box::pin(stream::iter(iter))
    }
}

/// Raw customer record as it appears in a batch file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCustomerRecord {
    #[serde(rename = "customerName")]
    pub customer_name: String,
    #[serde(rename = "accountNo")]
    pub account_no: Option<Value>,
}

/// Raw transaction record as it appears in a batch file. The date arrives
/// either as `date` (`YYYY-MM-DD`) or `transactionDate` (epoch
/// milliseconds, number or string).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTransactionRecord {
    #[serde(rename = "fromAccount")]
    pub from_account: String,
    #[serde(rename = "toAccount")]
    pub to_account: String,
    pub amount: Option<Value>,
    pub date: Option<String>,
    #[serde(rename = "transactionDate")]
    pub transaction_date: Option<Value>,
    #[serde(rename = "transactionType")]
    pub transaction_type: String,
    pub remark: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub reference: String,
    #[serde(rename = "thirdPartyReference")]
    pub third_party_reference: String,
    #[serde(rename = "institutionId")]
    pub institution_id: String,
    #[serde(rename = "billerId")]
    pub biller_id: String,
}

/// A customer record that passed structural validation.
#[derive(Debug, Clone)]
pub struct CustomerDraft {
    pub name: String,
    pub account_no: AccountNo,
}

/// A transaction record that passed structural validation. Reference
/// resolution and direction normalization still follow in the engine.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub from_account: AccountNo,
    pub to_account: AccountNo,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub transaction_type: String,
}

/// Structural checks for a customer record. Collects every failure before
/// rejecting so the audit entry lists them all.
pub fn validate_customer(raw: &RawCustomerRecord) -> Result<CustomerDraft, Vec<RecordError>> {
    let mut errors = Vec::new();

    if raw.customer_name.trim().is_empty() {
        errors.push(RecordError::Validation("customer name is required".into()));
    }

    let account = match &raw.account_no {
        None => {
            errors.push(RecordError::Validation("account number is required".into()));
            None
        }
        Some(value) => match coerce_account_no(value) {
            Some(s) if s.trim().is_empty() => {
                errors.push(RecordError::Validation("account number is required".into()));
                None
            }
            Some(s) => Some(s),
            None => {
                errors.push(RecordError::Validation(
                    "account number is in invalid format/type".into(),
                ));
                None
            }
        },
    };

    if let Some(account) = &account {
        let stripped = account.trim().trim_start_matches('0');
        if stripped.is_empty() || stripped.parse::<i64>().is_err() {
            errors.push(RecordError::Validation(
                "account number is in invalid format/type".into(),
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CustomerDraft {
        name: raw.customer_name.trim().to_owned(),
        // a missing account pushed an error above, so this is always Some
        account_no: AccountNo::new(account.unwrap_or_default()),
    })
}

/// Structural checks for a transaction record.
pub fn validate_transaction(raw: &RawTransactionRecord) -> Result<TransactionDraft, Vec<RecordError>> {
    let mut errors = Vec::new();

    if raw.from_account.trim().is_empty() {
        errors.push(RecordError::Validation("fromAccount is required".into()));
    }

    let amount = match raw.amount.as_ref().and_then(decimal_from_value) {
        Some(amount) if amount > Decimal::ZERO => Some(amount),
        Some(_) => {
            errors.push(RecordError::Validation("amount must be positive".into()));
            None
        }
        None => {
            errors.push(RecordError::Validation("amount must be a number".into()));
            None
        }
    };

    let date = parse_record_date(raw, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(TransactionDraft {
        from_account: AccountNo::new(raw.from_account.trim()),
        to_account: AccountNo::new(raw.to_account.trim()),
        amount: amount.unwrap_or_default(),
        transaction_date: date.unwrap_or_default(),
        transaction_type: raw.transaction_type.clone(),
    })
}

fn parse_record_date(raw: &RawTransactionRecord, errors: &mut Vec<RecordError>) -> Option<DateTime<Utc>> {
    if let Some(date) = &raw.date {
        return match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
            Ok(d) => Some(d.and_time(NaiveTime::MIN).and_utc()),
            Err(e) => {
                errors.push(RecordError::Validation(format!("invalid date format: {e}")));
                None
            }
        };
    }
    if let Some(value) = &raw.transaction_date {
        let millis = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        return match millis.and_then(DateTime::from_timestamp_millis) {
            Some(d) => Some(d),
            None => {
                errors.push(RecordError::Validation(format!(
                    "invalid transaction date: {value}"
                )));
                None
            }
        };
    }
    errors.push(RecordError::Validation("transaction date is required".into()));
    None
}

fn coerce_account_no(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else {
                n.as_f64().map(|f| format!("{f:.0}"))
            }
        }
        _ => None,
    }
}
