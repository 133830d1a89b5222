//! Write-path checks shared by every entry point that creates or edits records.
//!
//! Messages are in Spanish because they are shown verbatim in the admin UI.

use crate::error::CoreError;
use crate::structs::{NewCase, NewDonation, NewDonor, NewExpense, NewProvider, NewShelterHome};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to list of messages, serialized as `{ "field": ["msg", ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error carrying every message.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

fn require_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "Este campo no puede estar vacío.");
    }
}

/// Whole digits an amount may carry; stored as `NUMERIC(12, 2)`.
const MAX_WHOLE_DIGITS: u32 = 10;
const MAX_DECIMAL_PLACES: u32 = 2;

fn require_positive(errors: &mut FieldErrors, field: &str, amount: Decimal, message: &str) {
    if amount <= Decimal::ZERO {
        errors.add(field, message);
    }
    require_money_shape(errors, field, amount);
}

fn require_money_shape(errors: &mut FieldErrors, field: &str, amount: Decimal) {
    if amount.normalize().scale() > MAX_DECIMAL_PLACES {
        errors.add(
            field,
            format!("Asegúrese de que no haya más de {MAX_DECIMAL_PLACES} decimales."),
        );
    }
    if amount.abs().trunc() >= Decimal::from(10_i64.pow(MAX_WHOLE_DIGITS)) {
        errors.add(
            field,
            format!(
                "Asegúrese de que no haya más de {MAX_WHOLE_DIGITS} dígitos antes del punto decimal."
            ),
        );
    }
}

fn require_not_future(
    errors: &mut FieldErrors,
    field: &str,
    date: NaiveDate,
    today: NaiveDate,
    message: &str,
) {
    if date > today {
        errors.add(field, message);
    }
}

fn require_present<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) {
    if value.is_none() {
        errors.add(field, "Este campo es requerido.");
    }
}

pub fn validate_case(case: &NewCase, today: NaiveDate) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "nombre_caso", &case.name);
    require_not_future(
        &mut errors,
        "fecha_ingreso",
        case.admitted_on,
        today,
        "La fecha de ingreso no puede ser futura.",
    );
    if let Some(discharged_on) = case.discharged_on {
        if discharged_on < case.admitted_on {
            errors.add(
                "fecha_salida",
                "La fecha de salida no puede ser anterior a la de ingreso.",
            );
        }
    }
    if let Some(budget) = case.estimated_budget {
        if budget < Decimal::ZERO {
            errors.add("presupuesto_estimado", "El presupuesto no puede ser negativo.");
        }
        require_money_shape(&mut errors, "presupuesto_estimado", budget);
    }
    errors.into_result()
}

pub fn validate_donation(donation: &NewDonation, today: NaiveDate) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();
    require_positive(
        &mut errors,
        "monto",
        donation.amount,
        "El monto de la donación debe ser mayor a 0.",
    );
    require_not_future(
        &mut errors,
        "fecha_donacion",
        donation.donated_on,
        today,
        "La fecha de donación no puede ser futura.",
    );
    require_present(&mut errors, "id_donante", donation.donor_id);
    require_present(&mut errors, "id_caso", donation.case_id);
    require_text(&mut errors, "estado", &donation.status);
    errors.into_result()
}

pub fn validate_expense(expense: &NewExpense, today: NaiveDate) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "nombre_gasto", &expense.concept);
    require_positive(&mut errors, "monto", expense.amount, "El monto debe ser positivo.");
    require_not_future(
        &mut errors,
        "fecha_pago",
        expense.paid_on,
        today,
        "La fecha de pago no puede ser futura.",
    );
    require_present(&mut errors, "id_proveedor", expense.provider_id);
    require_present(&mut errors, "id_caso", expense.case_id);
    require_text(&mut errors, "estado", &expense.status);
    errors.into_result()
}

pub fn validate_donor(donor: &NewDonor) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "donante", &donor.name);
    if let Some(email) = donor.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            errors.add("correo", "Introduzca una dirección de correo electrónico válida.");
        }
    }
    errors.into_result()
}

pub fn validate_provider(provider: &NewProvider) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "nombre_proveedor", &provider.name);
    if let Some(email) = provider.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            errors.add("correo", "Introduzca una dirección de correo electrónico válida.");
        }
    }
    errors.into_result()
}

pub fn validate_shelter_home(home: &NewShelterHome) -> Result<(), CoreError> {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, "nombre_hogar", &home.name);
    if let Some(capacity) = home.capacity {
        if capacity < 0 {
            errors.add("cupo_maximo", "El cupo no puede ser negativo.");
        }
    }
    errors.into_result()
}
