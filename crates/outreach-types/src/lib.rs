//! Shared types for the Outreach CRM.

mod campaign;
mod collection;
mod contact;
mod interaction;

pub use campaign::*;
pub use collection::*;
pub use contact::*;
pub use interaction::*;

use thiserror::Error;

/// Returned when a string does not name any variant of a closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
