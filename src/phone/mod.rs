//! Phone number validation
//!
//! Profiles advertise a contact number in free text. Before a profile becomes
//! a [`crate::Record`] that number has to reduce to a canonical 9-digit
//! Azerbaijani mobile/landline identifier.

mod validator;

pub use validator::{clean_phone, validate_phone, PhoneRejection, VALID_PREFIXES};
