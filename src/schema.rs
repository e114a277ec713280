// 📐 Shape Layer - Schema Validation
// Every entity declares its invariants here. They are checked when a record is
// constructed or loaded from storage, never on each in-place mutation.

use crate::error::{EconomyError, Result};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(context: &str, field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

// ============================================================================
// VALIDATE TRAIT
// ============================================================================

pub trait Validate {
    fn validate(&self) -> ValidationResult;

    /// Validate and convert failures into an `EconomyError`
    fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(EconomyError::Validation)
    }
}

// ============================================================================
// RULE COLLECTOR
// ============================================================================

/// Accumulates field errors for one entity
pub struct Checker {
    context: &'static str,
    errors: Vec<ValidationError>,
}

impl Checker {
    pub fn new(context: &'static str) -> Self {
        Checker {
            context,
            errors: Vec::new(),
        }
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "Required field is empty".to_string());
        }
        self
    }

    pub fn non_negative(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() || value < 0.0 {
            self.fail(field, format!("Must be >= 0, got {}", value));
        }
        self
    }

    pub fn positive(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() || value <= 0.0 {
            self.fail(field, format!("Must be > 0, got {}", value));
        }
        self
    }

    pub fn in_range(&mut self, field: &str, value: f64, min: f64, max: f64) -> &mut Self {
        if !value.is_finite() || value < min || value > max {
            self.fail(
                field,
                format!("Must be between {} and {}, got {}", min, max, value),
            );
        }
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.fail(field, message.to_string());
        }
        self
    }

    fn fail(&mut self, field: &str, message: String) {
        self.errors
            .push(ValidationError::new(self.context, field, message));
    }

    pub fn finish(&mut self) -> ValidationResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
