//! Core business logic for Homeledger.
//!
//! This crate contains the ledger engine with ZERO web dependencies.
//! All domain types, validation rules, and calculations live here;
//! durable storage is reached only through the [`store::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `ledger` - Double-entry entries, intents, the entry builder and conversion
//! - `loan` - Amortization schedules and loan repayment
//! - `asset` - Depreciation schedules, accrual and disposal
//! - `reconciliation` - External balance snapshots and suspense classification
//! - `amount` - Arithmetic amount capture
//! - `store` - Persistence contract and the in-memory store
//! - `engine` - The `Bookkeeper` facade tying the above together

pub mod amount;
pub mod asset;
pub mod engine;
pub mod ledger;
pub mod loan;
pub mod reconciliation;
pub mod store;

pub use engine::{Bookkeeper, EngineSettings, EntryReceipt, LoanPosting, LoanPreview};
pub use ledger::LedgerError;
pub use store::{InMemoryStore, LedgerStore};
