//! Domain model for groups, campaigns and their supporting records.
//!
//! # Responsibility
//! - Define the serialized record shapes stored under each collection key.
//! - Own the business rules that mutate a single record (vote thresholds,
//!   completion, member protection, invite redeemability).
//!
//! # Invariants
//! - Records serialize with camelCase field names.
//! - Timestamps are Unix epoch milliseconds.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod activity;
pub mod campaign;
pub mod currency;
pub mod group;
pub mod invite;
pub mod language;
pub mod user;

/// Input validation failure raised by model constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    /// A required text field is blank after trimming.
    BlankField(&'static str),
    /// An amount is not a finite, strictly positive number.
    InvalidAmount { field: &'static str, value: f64 },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidAmount { field, value } => {
                write!(f, "`{field}` must be a positive amount, got {value}")
            }
        }
    }
}

impl Error for ModelValidationError {}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

/// Generates a new stable record id.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ModelValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_positive_amount(
    field: &'static str,
    value: f64,
) -> Result<f64, ModelValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ModelValidationError::InvalidAmount { field, value });
    }
    Ok(value)
}
