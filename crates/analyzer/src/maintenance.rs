//! One-off data fixes run from the command line.

use crate::error::AnalyzerError;
use crate::service::KpiService;
use core_types::Expense;
use database::ExpenseQuery;
use serde::Serialize;
use tracing::info;

/// Rows shown before a relabel.
pub const RELABEL_SAMPLE_SIZE: usize = 5;

/// What a status relabel found and changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelabelReport {
    pub from: String,
    pub to: String,
    /// Expenses carrying `from` before the run.
    pub matched: usize,
    pub sample: Vec<Expense>,
    /// Zero on a dry run.
    pub updated: u64,
    /// Expenses still carrying `from` afterwards.
    pub remaining: usize,
    /// Expenses carrying `to` afterwards.
    pub total_with_target: usize,
}

impl KpiService {
    /// Rewrites every expense whose status is exactly `from` to `to`.
    pub async fn relabel_expenses(
        &self,
        from: &str,
        to: &str,
        dry_run: bool,
    ) -> Result<RelabelReport, AnalyzerError> {
        let matching = self.expenses_with_status(from).await?;
        info!(from, matched = matching.len(), "Expenses found for relabel");
        for expense in matching.iter().take(RELABEL_SAMPLE_SIZE) {
            info!(id = expense.id, amount = %expense.amount, status = %expense.status, "Relabel sample");
        }

        let updated = if dry_run || matching.is_empty() {
            0
        } else {
            self.ledger.relabel_expense_status(from, to).await?
        };

        let remaining = self.expenses_with_status(from).await?.len();
        let total_with_target = self.expenses_with_status(to).await?.len();
        info!(updated, remaining, total_with_target, dry_run, "Relabel finished");

        Ok(RelabelReport {
            from: from.to_string(),
            to: to.to_string(),
            matched: matching.len(),
            sample: matching.into_iter().take(RELABEL_SAMPLE_SIZE).collect(),
            updated,
            remaining,
            total_with_target,
        })
    }

    async fn expenses_with_status(&self, status: &str) -> Result<Vec<Expense>, AnalyzerError> {
        let query = ExpenseQuery {
            status: Some(status.to_string()),
            ..ExpenseQuery::default()
        };
        Ok(self.ledger.list_expenses(&query).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::service::tests::service;

    #[tokio::test]
    async fn test_dry_run_reports_without_writing() {
        let service = service();
        let report = service.relabel_expenses("pendiente", "PAGADO", true).await.unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.remaining, 1);
        assert_eq!(report.total_with_target, 1);
    }

    #[tokio::test]
    async fn test_relabel_rewrites_exact_literal() {
        let service = service();
        let report = service.relabel_expenses("pendiente", "PAGADO", false).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.remaining, 0);
        assert_eq!(report.total_with_target, 2);
        assert_eq!(report.sample.len(), 1);
    }
}
