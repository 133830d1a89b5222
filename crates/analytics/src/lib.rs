//! # Refugio KPI Engine
//!
//! Period-over-period indicators for the shelter's cases, donations, expenses, donors and
//! providers.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage or HTTP.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `KpiEngine` takes plain record slices and a resolved `Period`
//!   and returns a report struct. Empty inputs give zeroed reports, never errors.
//!
//! ## Public API
//!
//! - `Period` / `PreviousPeriod`: current window plus the comparison window a call site uses.
//! - `Aggregate`, `monthly_series`: filtered totals and monthly buckets.
//! - `Trend`: percent change between two periods.
//! - `KpiEngine`: the per-resource calculators and the dashboard.
//! - `CaseRollups`, `summarize_donors`, `top_donors`, `CaseBalance`: per-record summaries.

// Declare the modules that constitute this crate.
pub mod aggregate;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod period;
pub mod report;
pub mod rollup;
pub mod trend;

// Re-export the key components to create a clean, public-facing API.
pub use aggregate::{Aggregate, Entry, MonthlyBucket, monthly_series};
pub use dashboard::{DashboardInput, DashboardLimits};
pub use engine::KpiEngine;
pub use error::AnalyticsError;
pub use period::{DateWindow, MonthSpan, Period, PreviousPeriod, month_shift, parse_date};
pub use report::{
    BalancePoint, CaseKpis, CountryRanking, DashboardReport, DonationKpis, DonorKpis, ExpenseKpis,
    ProviderKpis,
};
pub use rollup::{CaseBalance, CaseRollups, CaseSummary, DonorSummary, summarize_donors, top_donors};
pub use trend::Trend;
