use serde::{Deserialize, Serialize};

use crate::domain::CustomerId;

/// The four independently normalized components of a rating, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub count_score: f64,
    pub volume_score: f64,
    pub duration_score: f64,
    pub stability_score: f64,
}

/// Final creditworthiness rating for one customer: a score in [1, 10]
/// rounded to two decimals, plus its breakdown. Recomputed idempotently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub customer_id: CustomerId,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}
