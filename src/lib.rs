//! Computational core for bulk customer and transaction import: per-record
//! validation with a full audit trail, balance-carrying ledger consistency,
//! synthetic history backfill, and a bounded four-factor creditworthiness
//! score. Transport, auth, and storage engines live behind the repository
//! traits in [`domain::traits`].

pub mod audit;
pub mod backfill;
pub mod balance;
pub mod domain;
pub mod engine;
pub mod ingestion;
pub mod repository;
pub mod scoring;

pub use engine::{Engine, ImportReport, PipelineReport};
