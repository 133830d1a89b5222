use crate::enums::CaseStatus;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Field names follow the product's API contract (Spanish keys) on the wire and
// English names in Rust.

/// A tracked rescue/treatment record for an animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    #[serde(rename = "id_caso")]
    pub id: i64,
    #[serde(rename = "nombre_caso")]
    pub name: String,
    #[serde(rename = "estado")]
    pub status: CaseStatus,
    #[serde(rename = "fecha_ingreso")]
    pub admitted_on: NaiveDate,
    /// `None` while the animal is still in the foundation's care.
    #[serde(rename = "fecha_salida")]
    pub discharged_on: Option<NaiveDate>,
    #[serde(rename = "veterinaria")]
    pub clinic: Option<String>,
    #[serde(rename = "diagnostico")]
    pub diagnosis: Option<String>,
    #[serde(rename = "id_hogar_de_paso")]
    pub shelter_home_id: Option<i64>,
    #[serde(rename = "presupuesto_estimado")]
    pub estimated_budget: Option<Decimal>,
}

impl Case {
    /// A case is active while it has no discharge date, whatever its status says.
    pub fn is_active(&self) -> bool {
        self.discharged_on.is_none()
    }

    /// Days since admission for active cases; `None` once discharged.
    pub fn days_active(&self, today: NaiveDate) -> Option<i64> {
        if self.is_active() {
            Some((today - self.admitted_on).num_days())
        } else {
            None
        }
    }
}

/// Payload used to create or replace a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCase {
    #[serde(rename = "nombre_caso")]
    pub name: String,
    #[serde(rename = "estado", default = "default_case_status")]
    pub status: CaseStatus,
    #[serde(rename = "fecha_ingreso")]
    pub admitted_on: NaiveDate,
    #[serde(rename = "fecha_salida", default)]
    pub discharged_on: Option<NaiveDate>,
    #[serde(rename = "veterinaria", default)]
    pub clinic: Option<String>,
    #[serde(rename = "diagnostico", default)]
    pub diagnosis: Option<String>,
    #[serde(rename = "id_hogar_de_paso", default)]
    pub shelter_home_id: Option<i64>,
    #[serde(rename = "presupuesto_estimado", default)]
    pub estimated_budget: Option<Decimal>,
}

fn default_case_status() -> CaseStatus {
    CaseStatus::Abierto
}

impl NewCase {
    pub fn into_case(self, id: i64) -> Case {
        Case {
            id,
            name: self.name,
            status: self.status,
            admitted_on: self.admitted_on,
            discharged_on: self.discharged_on,
            clinic: self.clinic,
            diagnosis: self.diagnosis,
            shelter_home_id: self.shelter_home_id,
            estimated_budget: self.estimated_budget,
        }
    }
}

/// A foster home that can host animals under treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelterHome {
    #[serde(rename = "id_hogar_de_paso")]
    pub id: i64,
    #[serde(rename = "nombre_hogar")]
    pub name: String,
    #[serde(rename = "nombre_contacto")]
    pub contact_name: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "ciudad")]
    pub city: Option<String>,
    #[serde(rename = "cupo_maximo")]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShelterHome {
    #[serde(rename = "nombre_hogar")]
    pub name: String,
    #[serde(rename = "nombre_contacto", default)]
    pub contact_name: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
    #[serde(rename = "cupo_maximo", default)]
    pub capacity: Option<i32>,
}

impl NewShelterHome {
    pub fn into_shelter_home(self, id: i64) -> ShelterHome {
        ShelterHome {
            id,
            name: self.name,
            contact_name: self.contact_name,
            phone: self.phone,
            city: self.city,
            capacity: self.capacity,
        }
    }
}

/// A person or organisation that gives money to the foundation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    #[serde(rename = "id_donante")]
    pub id: i64,
    #[serde(rename = "donante")]
    pub name: String,
    #[serde(rename = "tipo_id")]
    pub id_kind: Option<String>,
    #[serde(rename = "identificacion")]
    pub identification: Option<String>,
    #[serde(rename = "correo")]
    pub email: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "ciudad")]
    pub city: Option<String>,
    #[serde(rename = "pais")]
    pub country: Option<String>,
    #[serde(rename = "tipo_donante")]
    pub donor_kind: Option<String>,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
    #[serde(rename = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDonor {
    #[serde(rename = "donante")]
    pub name: String,
    #[serde(rename = "tipo_id", default)]
    pub id_kind: Option<String>,
    #[serde(rename = "identificacion", default)]
    pub identification: Option<String>,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
    #[serde(rename = "pais", default)]
    pub country: Option<String>,
    #[serde(rename = "tipo_donante", default)]
    pub donor_kind: Option<String>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
}

impl NewDonor {
    pub fn into_donor(self, id: i64, created_at: DateTime<Utc>) -> Donor {
        Donor {
            id,
            name: self.name,
            id_kind: self.id_kind,
            identification: self.identification,
            email: self.email,
            phone: self.phone,
            city: self.city,
            country: self.country,
            donor_kind: self.donor_kind,
            notes: self.notes,
            created_at,
        }
    }
}

/// A single donation. `status` is stored exactly as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    #[serde(rename = "id_donacion")]
    pub id: i64,
    #[serde(rename = "id_donante")]
    pub donor_id: Option<i64>,
    #[serde(rename = "id_caso")]
    pub case_id: Option<i64>,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "fecha_donacion")]
    pub donated_on: NaiveDate,
    #[serde(rename = "medio_pago")]
    pub payment_method: Option<String>,
    #[serde(rename = "estado")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDonation {
    #[serde(rename = "id_donante", default)]
    pub donor_id: Option<i64>,
    #[serde(rename = "id_caso", default)]
    pub case_id: Option<i64>,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "fecha_donacion")]
    pub donated_on: NaiveDate,
    #[serde(rename = "medio_pago", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "estado")]
    pub status: String,
}

impl NewDonation {
    pub fn into_donation(self, id: i64) -> Donation {
        Donation {
            id,
            donor_id: self.donor_id,
            case_id: self.case_id,
            amount: self.amount,
            donated_on: self.donated_on,
            payment_method: self.payment_method,
            status: self.status,
        }
    }
}

/// A payment (or pending bill) to a provider on behalf of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "id_gasto")]
    pub id: i64,
    #[serde(rename = "nombre_gasto")]
    pub concept: String,
    #[serde(rename = "id_proveedor")]
    pub provider_id: Option<i64>,
    #[serde(rename = "id_caso")]
    pub case_id: Option<i64>,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "fecha_pago")]
    pub paid_on: NaiveDate,
    #[serde(rename = "medio_pago")]
    pub payment_method: Option<String>,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "comprobante")]
    pub receipt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    #[serde(rename = "nombre_gasto")]
    pub concept: String,
    #[serde(rename = "id_proveedor", default)]
    pub provider_id: Option<i64>,
    #[serde(rename = "id_caso", default)]
    pub case_id: Option<i64>,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "fecha_pago")]
    pub paid_on: NaiveDate,
    #[serde(rename = "medio_pago", default)]
    pub payment_method: Option<String>,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "comprobante", default)]
    pub receipt: Option<String>,
}

impl NewExpense {
    pub fn into_expense(self, id: i64) -> Expense {
        Expense {
            id,
            concept: self.concept,
            provider_id: self.provider_id,
            case_id: self.case_id,
            amount: self.amount,
            paid_on: self.paid_on,
            payment_method: self.payment_method,
            status: self.status,
            receipt: self.receipt,
        }
    }
}

/// A veterinary clinic, pharmacy or any other supplier the foundation pays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(rename = "id_proveedor")]
    pub id: i64,
    #[serde(rename = "nombre_proveedor")]
    pub name: String,
    #[serde(rename = "tipo_proveedor")]
    pub kind: Option<String>,
    #[serde(rename = "nit")]
    pub tax_id: Option<String>,
    #[serde(rename = "nombre_contacto")]
    pub contact_name: Option<String>,
    #[serde(rename = "correo")]
    pub email: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "ciudad")]
    pub city: Option<String>,
    #[serde(rename = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProvider {
    #[serde(rename = "nombre_proveedor")]
    pub name: String,
    #[serde(rename = "tipo_proveedor", default)]
    pub kind: Option<String>,
    #[serde(rename = "nit", default)]
    pub tax_id: Option<String>,
    #[serde(rename = "nombre_contacto", default)]
    pub contact_name: Option<String>,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
}

impl NewProvider {
    pub fn into_provider(self, id: i64, created_at: DateTime<Utc>) -> Provider {
        Provider {
            id,
            name: self.name,
            kind: self.kind,
            tax_id: self.tax_id,
            contact_name: self.contact_name,
            email: self.email,
            phone: self.phone,
            city: self.city,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(discharged_on: Option<NaiveDate>) -> Case {
        Case {
            id: 1,
            name: "Firulais".to_string(),
            status: CaseStatus::EnTratamiento,
            admitted_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            discharged_on,
            clinic: None,
            diagnosis: None,
            shelter_home_id: None,
            estimated_budget: None,
        }
    }

    #[test]
    fn test_days_active_counts_from_admission_for_open_cases() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(case(None).days_active(today), Some(30));
    }

    #[test]
    fn test_discharged_cases_report_no_duration() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let closed = case(NaiveDate::from_ymd_opt(2024, 1, 10));
        assert!(!closed.is_active());
        assert_eq!(closed.days_active(today), None);
    }

    #[test]
    fn test_case_uses_spanish_wire_names() {
        let json = serde_json::to_value(case(None)).unwrap();
        assert_eq!(json["nombre_caso"], "Firulais");
        assert_eq!(json["estado"], "EN_TRATAMIENTO");
        assert!(json["fecha_salida"].is_null());
    }

    #[test]
    fn test_new_donation_deserializes_amount_from_a_json_number() {
        let payload: NewDonation = serde_json::from_value(serde_json::json!({
            "id_donante": 3,
            "id_caso": 7,
            "monto": 150.5,
            "fecha_donacion": "2024-02-01",
            "estado": "Aprobada"
        }))
        .unwrap();
        assert_eq!(payload.amount, rust_decimal_macros::dec!(150.5));
        assert_eq!(payload.payment_method, None);
    }
}
