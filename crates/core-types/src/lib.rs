pub mod enums;
pub mod error;
pub mod status;
pub mod structs;
pub mod validation;

// Re-export the core types to provide a clean public API.
pub use enums::CaseStatus;
pub use error::CoreError;
pub use status::StatusSet;
pub use structs::{
    Case, Donation, Donor, Expense, NewCase, NewDonation, NewDonor, NewExpense, NewProvider,
    NewShelterHome, Provider, ShelterHome,
};
pub use validation::FieldErrors;
