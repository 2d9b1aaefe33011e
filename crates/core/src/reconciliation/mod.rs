//! Balance reconciliation against externally reported balances.

pub mod service;
pub mod types;

#[cfg(test)]
mod reconciliation_props;

pub use service::ReconciliationService;
pub use types::{
    BalanceSnapshot, PendingItem, SnapshotRequest, SnapshotStatus, SplitAllocation,
    SuspenseAccounts,
};
