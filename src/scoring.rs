//! Creditworthiness scoring over a customer's full entry history.
//!
//! Normalization policy (one of the two coexisting conventions, applied
//! uniformly): full marks at 10 entries, 100 000 in absolute volume, a
//! 365-day history span, and a cleared-balance standard deviation of zero;
//! a deviation of 2 000 or more zeroes the stability component. The final
//! score is the weighted blend scaled to ten, rounded to two decimals, then
//! clamped to [1, 10].

use rust_decimal::prelude::ToPrimitive;

use crate::domain::{CustomerId, LedgerEntry, Rating, ScoreBreakdown};

/// Entry count that earns a full count score.
pub const FULL_COUNT: f64 = 10.0;
/// Total absolute amount that earns a full volume score.
pub const FULL_VOLUME: f64 = 100_000.0;
/// History span, in days, that earns a full duration score.
pub const FULL_DURATION_DAYS: f64 = 365.0;
/// Cleared-balance standard deviation at which stability bottoms out.
pub const STABILITY_SPREAD: f64 = 2_000.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// min(entry count / 10, 1): rewards activity volume.
pub fn count_score(entries: &[LedgerEntry]) -> f64 {
    (entries.len() as f64 / FULL_COUNT).min(1.0)
}

/// min(Σ|amount| / 100 000, 1) over every entry in the history.
pub fn volume_score(entries: &[LedgerEntry]) -> f64 {
    let total: f64 = entries
        .iter()
        .map(|e| e.amount.abs().to_f64().unwrap_or(0.0))
        .sum();
    (total / FULL_VOLUME).min(1.0)
}

/// min(days between earliest and latest entry / 365, 1). A single entry
/// spans no time, so it scores 0.
pub fn duration_score(entries: &[LedgerEntry]) -> f64 {
    if entries.len() < 2 {
        return 0.0;
    }
    let earliest = entries.iter().map(|e| e.transaction_date).min();
    let latest = entries.iter().map(|e| e.transaction_date).max();
    let (Some(earliest), Some(latest)) = (earliest, latest) else {
        return 0.0;
    };
    let days = (latest - earliest).num_seconds() as f64 / SECONDS_PER_DAY;
    (days / FULL_DURATION_DAYS).min(1.0)
}

/// max(1 − stddev(cleared balances) / 2 000, 0). A single entry shows no
/// volatility and scores 1, deliberately the opposite convention from the
/// duration score.
pub fn stability_score(entries: &[LedgerEntry]) -> f64 {
    if entries.len() < 2 {
        return 1.0;
    }
    let balances: Vec<f64> = entries
        .iter()
        .map(|e| e.cleared_balance.to_f64().unwrap_or(0.0))
        .collect();
    let n = balances.len() as f64;
    let mean = balances.iter().sum::<f64>() / n;
    let variance = balances.iter().map(|b| (b - mean) * (b - mean)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / STABILITY_SPREAD).max(0.0)
}

/// Score a full history. `None` on an empty history; after backfill that
/// is an invariant violation the caller turns into an error.
pub fn score(customer_id: CustomerId, entries: &[LedgerEntry]) -> Option<Rating> {
    if entries.is_empty() {
        return None;
    }
    let breakdown = ScoreBreakdown {
        count_score: count_score(entries),
        volume_score: volume_score(entries),
        duration_score: duration_score(entries),
        stability_score: stability_score(entries),
    };
    let weighted = 0.3 * breakdown.count_score
        + 0.3 * breakdown.volume_score
        + 0.2 * breakdown.duration_score
        + 0.2 * breakdown.stability_score;
    let score = round2(weighted * 10.0).clamp(1.0, 10.0);
    Some(Rating {
        customer_id,
        score,
        breakdown,
    })
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountNo, Customer};
    use rust_decimal::Decimal;

    fn history(shape: &[(i64, i64, i64)]) -> Vec<LedgerEntry> {
        // (amount, cleared, offset_days)
        let customer = Customer::new("Test", AccountNo::new("1234"));
        shape.iter()
            .map(|&(amount, cleared, offset)| {
                let mut e = tests_support::entry_for(&customer, amount, offset);
                e.cleared_balance = Decimal::from(cleared);
                e
            })
            .collect()
    }

    #[test]
    fn single_entry_boundary_conventions() {
        let entries = history(&[(100, 100, 0)]);
        assert_eq!(duration_score(&entries), 0.0);
        assert_eq!(stability_score(&entries), 1.0);
        assert_eq!(count_score(&entries), 0.1);
    }

    #[test]
    fn count_score_is_monotone_and_capped() {
        let mut previous = 0.0;
        for n in 1..=15 {
            let shape: Vec<(i64, i64, i64)> = (0..n).map(|i| (100, 100, i)).collect();
            let s = count_score(&history(&shape));
            assert!(s >= previous);
            assert!((0.0..=1.0).contains(&s));
            previous = s;
        }
        let shape: Vec<(i64, i64, i64)> = (0..25).map(|i| (100, 100, i)).collect();
        assert_eq!(count_score(&history(&shape)), 1.0);
    }

    #[test]
    fn volume_score_sums_absolute_amounts() {
        let entries = history(&[(60_000, 100, 0), (60_000, 100, 1)]);
        assert_eq!(volume_score(&entries), 1.0);
        let entries = history(&[(25_000, 100, 0)]);
        assert_eq!(volume_score(&entries), 0.25);
    }

    #[test]
    fn duration_score_spans_the_history() {
        let entries = history(&[(100, 100, 0), (100, 100, 365)]);
        assert_eq!(duration_score(&entries), 1.0);
        let entries = history(&[(100, 100, 0), (100, 100, 730)]);
        assert_eq!(duration_score(&entries), 1.0);
    }

    #[test]
    fn stability_rewards_flat_balances() {
        let flat = history(&[(100, 500, 0), (100, 500, 1), (100, 500, 2)]);
        assert_eq!(stability_score(&flat), 1.0);
        // huge swings exhaust the 2000 spread
        let volatile = history(&[(100, 0, 0), (100, 10_000, 1)]);
        assert_eq!(stability_score(&volatile), 0.0);
    }

    #[test]
    fn empty_history_is_not_scoreable() {
        assert!(score(crate::domain::CustomerId::from("CUST-x"), &[]).is_none());
    }

    #[test]
    fn score_is_clamped_to_the_floor() {
        // two tiny entries with wildly spread balances: every component is
        // near zero, so the raw score lands under the floor
        let entries = history(&[(1, 0, 0), (1, 100_000, 1)]);
        let rating = score(crate::domain::CustomerId::from("CUST-x"), &entries).unwrap();
        assert!(rating.score >= 1.0);
        assert!(rating.score <= 10.0);
    }

    #[test]
    fn scoring_is_bit_identical_across_runs() {
        let entries = history(&[(137, 42, 0), (9_991, 7_331, 3), (55, 1_024, 17)]);
        let a = score(crate::domain::CustomerId::from("CUST-x"), &entries).unwrap();
        let b = score(crate::domain::CustomerId::from("CUST-x"), &entries).unwrap();
        assert_eq!(a.score.to_bits(), b.score.to_bits());
        assert_eq!(
            a.breakdown.stability_score.to_bits(),
            b.breakdown.stability_score.to_bits()
        );
        assert_eq!(
            a.breakdown.duration_score.to_bits(),
            b.breakdown.duration_score.to_bits()
        );
    }

    #[test]
    fn rich_active_history_scores_high() {
        let shape: Vec<(i64, i64, i64)> = (0..12).map(|i| (10_000, 5_000, i * 40)).collect();
        let rating = score(crate::domain::CustomerId::from("CUST-x"), &history(&shape)).unwrap();
        // count 1.0, volume 1.0, duration 1.0, stability 1.0 => 10.0
        assert_eq!(rating.score, 10.0);
    }
}
