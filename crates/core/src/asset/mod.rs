//! Fixed assets and straight-line depreciation.

pub mod depreciation;
pub mod service;
pub mod types;

#[cfg(test)]
mod depreciation_props;

pub use depreciation::{DAYS_PER_MONTH, DepreciationCalculator};
pub use service::{AssetService, DepreciationAccounts};
pub use types::{
    Accrual, Asset, AssetRequest, AssetStatus, AssetSummary, DepreciationMethod,
    DepreciationRecord, DepreciationScheduleItem, Disposal, DisposalRequest, Granularity,
};
