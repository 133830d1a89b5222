//! Status synonym sets.
//!
//! Donation and expense statuses are free text and the historical data carries several
//! spellings and casings of the same meaning ("APROBADA", "Aprobada", "aprobada"). Each call site
//! that needs "successful donations" or "paid expenses" names one of the sets below. The sets
//! list literals as they appear in the data; a literal outside the list does not match, even if it
//! only differs in casing. The two `IgnoreCase` sets are the exception, mirroring how the expense
//! screens have always compared.

/// How a set decides membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRule {
    /// Exact membership in an enumerated list of spellings.
    Synonyms(&'static [&'static str]),
    /// One literal, compared ignoring ASCII case.
    IgnoreCase(&'static str),
    /// Every status matches.
    Any,
}

/// A named family of equivalent status literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSet {
    pub name: &'static str,
    pub rule: StatusRule,
}

impl StatusSet {
    pub const fn synonyms(name: &'static str, literals: &'static [&'static str]) -> Self {
        Self {
            name,
            rule: StatusRule::Synonyms(literals),
        }
    }

    pub const fn ignore_case(name: &'static str, literal: &'static str) -> Self {
        Self {
            name,
            rule: StatusRule::IgnoreCase(literal),
        }
    }

    pub fn matches(&self, status: &str) -> bool {
        match self.rule {
            StatusRule::Synonyms(literals) => literals.contains(&status),
            StatusRule::IgnoreCase(literal) => literal.eq_ignore_ascii_case(status),
            StatusRule::Any => true,
        }
    }
}

/// Donations that brought money in: approved or completed (feminine spellings).
pub const DONATION_SUCCESS: StatusSet = StatusSet::synonyms(
    "donation-success",
    &[
        "APROBADA", "Aprobada", "aprobada", "COMPLETADA", "Completada", "completada",
    ],
);

/// Donations turned down: rejected or cancelled.
pub const DONATION_REJECTED: StatusSet = StatusSet::synonyms(
    "donation-rejected",
    &[
        "RECHAZADA", "Rechazada", "rechazada", "CANCELADA", "Cancelada", "cancelada",
    ],
);

/// Donations that broke on the payment side: failed or error.
pub const DONATION_FAILED: StatusSet = StatusSet::synonyms(
    "donation-failed",
    &["FALLIDA", "Fallida", "fallida", "ERROR", "Error", "error"],
);

/// Donations that count toward a donor's history: approved, completed, confirmed, successful.
pub const DONOR_VALID: StatusSet = StatusSet::synonyms(
    "donor-valid",
    &[
        "APROBADA", "Aprobada", "aprobada",
        "COMPLETADO", "Completado", "completado", "Completada",
        "CONFIRMADO", "Confirmado", "confirmado",
        "EXITOSA", "Exitosa", "exitosa",
    ],
);

/// Expenses that count as money spent on a case. Pending expenses are left out.
pub const EXPENSE_SETTLED: StatusSet = StatusSet::synonyms("expense-settled", &["APROBADA", "PAGADO"]);

pub const EXPENSE_PAID: StatusSet = StatusSet::ignore_case("expense-paid", "PAGADO");

pub const EXPENSE_PENDING: StatusSet = StatusSet::ignore_case("expense-pending", "PENDIENTE");

/// Every record, whatever its status. Used by the burn rate and the case balance sheet.
pub const ANY_STATUS: StatusSet = StatusSet {
    name: "any",
    rule: StatusRule::Any,
};
