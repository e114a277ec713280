// 🏫 Classroom Entity - top-level grouping of the simulated economy
//
// A classroom owns students, jobs, stocks and savings products by foreign key
// only. Nothing cascades: removing a classroom leaves its dependents in place.

use crate::error::Result;
use crate::schema::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default currency label shown to students
pub const DEFAULT_CURRENCY: &str = "Vivaa";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    /// Stable identity (UUID)
    pub id: String,

    pub name: String,

    pub teacher_name: String,

    /// Display name of the classroom currency
    #[serde(default = "default_currency")]
    pub currency_name: String,

    /// Income tax rate in percent, withheld from every salary payment
    #[serde(default)]
    pub tax_rate: f64,

    /// Tax pool collected from payroll
    #[serde(default)]
    pub treasury: f64,

    pub created_at: DateTime<Utc>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl Classroom {
    /// Create a validated classroom with a fresh UUID and an empty treasury
    pub fn new(name: &str, teacher_name: &str, tax_rate: f64) -> Result<Self> {
        let classroom = Classroom {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            teacher_name: teacher_name.trim().to_string(),
            currency_name: default_currency(),
            tax_rate,
            treasury: 0.0,
            created_at: Utc::now(),
        };
        classroom.ensure_valid()?;
        Ok(classroom)
    }

    pub fn with_currency(mut self, currency_name: &str) -> Self {
        self.currency_name = currency_name.to_string();
        self
    }

    /// Tax withheld on a gross amount
    pub fn tax_on(&self, gross: f64) -> f64 {
        gross * self.tax_rate / 100.0
    }
}

impl Validate for Classroom {
    fn validate(&self) -> ValidationResult {
        Checker::new("Classroom")
            .required("id", &self.id)
            .required("name", &self.name)
            .in_range("taxRate", self.tax_rate, 0.0, 100.0)
            .non_negative("treasury", self.treasury)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classroom_creation() {
        let classroom = Classroom::new("  5th Grade  ", "Ms. Park", 10.0).unwrap();

        assert_eq!(classroom.name, "5th Grade");
        assert_eq!(classroom.currency_name, DEFAULT_CURRENCY);
        assert_eq!(classroom.treasury, 0.0);
        assert_eq!(classroom.id.len(), 36);
    }

    #[test]
    fn test_tax_rate_out_of_range_rejected() {
        assert!(Classroom::new("Class", "Teacher", 120.0).is_err());
        assert!(Classroom::new("Class", "Teacher", -1.0).is_err());
        assert!(Classroom::new("", "Teacher", 5.0).is_err());
    }

    #[test]
    fn test_tax_on() {
        let classroom = Classroom::new("Class", "Teacher", 15.0).unwrap();
        assert!((classroom.tax_on(200.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_camel_case_serialization() {
        let classroom = Classroom::new("Class", "Teacher", 5.0).unwrap();
        let json = serde_json::to_value(&classroom).unwrap();

        assert!(json.get("teacherName").is_some());
        assert!(json.get("taxRate").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
