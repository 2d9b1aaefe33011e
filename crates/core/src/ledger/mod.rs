//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Chart of accounts and posting rules
//! - Journal entries and lines
//! - Simple intents and the entry builder
//! - Entry type conversion
//! - Balance calculations
//! - Business rule validation
//! - Error types for ledger operations

pub mod account;
pub mod balance;
pub mod builder;
pub mod conversion;
pub mod entry;
pub mod error;
pub mod intent;
pub mod validation;

#[cfg(test)]
mod builder_props;
#[cfg(test)]
mod conversion_props;

pub use account::{Account, AccountDirectory, AccountType, ChartOfAccounts, StaticDirectory};
pub use balance::AccountBalance;
pub use builder::{BuiltEntry, EntryBuilder};
pub use conversion::{ConversionRequest, ConversionRules, ConversionService};
pub use entry::{EntryKind, EntrySource, JournalEntry, JournalLine, ReconciliationStatus, Side};
pub use error::{FieldError, LedgerError};
pub use intent::{DepreciationTerms, EntryHeader, EntryIntent, IntentKind, LoanTerms};
pub use validation::{Violations, ensure_balanced, validate_manual_lines};
