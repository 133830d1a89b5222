//! # Refugio Analyzer
//!
//! The application service between storage and the outer surfaces (HTTP and CLI).
//!
//! `KpiService` reads record sets through the `database::Ledger` trait, resolves each request's
//! reporting period and hands the records to `analytics::KpiEngine`. It also owns the write path:
//! field validation from `core-types` plus referential checks against the ledger, merged into a
//! single field-error map.

pub mod error;
pub mod filters;
pub mod listings;
pub mod maintenance;
pub mod service;
pub mod writes;

pub use error::AnalyzerError;
pub use filters::{
    CaseKpiFilter, CaseListFilter, DateRange, DonationListFilter, DonorListFilter,
    ExpenseKpiFilter, ExpenseListFilter, ShelterHomeFilter,
};
pub use maintenance::RelabelReport;
pub use service::KpiService;
