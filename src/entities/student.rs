// 🎒 Student Entity - cash balance, credit score and current job

use crate::credit::{self, CreditGrade, MAX_CREDIT_SCORE, MIN_CREDIT_SCORE};
use crate::error::Result;
use crate::schema::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score every new student starts with
pub const DEFAULT_CREDIT_SCORE: u16 = 650;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,

    /// Foreign key to Classroom (not enforced)
    pub classroom_id: String,

    pub name: String,

    /// Roster number assigned by the teacher
    #[serde(default)]
    pub student_number: String,

    pub balance: f64,

    #[serde(default = "default_credit_score")]
    pub credit_score: u16,

    /// Foreign key to Job, if employed
    #[serde(default)]
    pub job_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

fn default_credit_score() -> u16 {
    DEFAULT_CREDIT_SCORE
}

impl Student {
    pub fn new(
        classroom_id: &str,
        name: &str,
        student_number: &str,
        opening_balance: f64,
    ) -> Result<Self> {
        let student = Student {
            id: uuid::Uuid::new_v4().to_string(),
            classroom_id: classroom_id.to_string(),
            name: name.trim().to_string(),
            student_number: student_number.trim().to_string(),
            balance: opening_balance,
            credit_score: DEFAULT_CREDIT_SCORE,
            job_id: None,
            created_at: Utc::now(),
        };
        student.ensure_valid()?;
        Ok(student)
    }

    pub fn credit_grade(&self) -> CreditGrade {
        CreditGrade::from_score(self.credit_score)
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        self.balance >= amount
    }

    /// Shift the credit score, clamped to the 300-850 band
    pub fn adjust_credit_score(&mut self, delta: i32) {
        self.credit_score = credit::clamp_score(self.credit_score as i32 + delta);
    }

    pub fn is_employed(&self) -> bool {
        self.job_id.is_some()
    }
}

impl Validate for Student {
    fn validate(&self) -> ValidationResult {
        Checker::new("Student")
            .required("id", &self.id)
            .required("classroomId", &self.classroom_id)
            .required("name", &self.name)
            .non_negative("balance", self.balance)
            .in_range(
                "creditScore",
                self.credit_score as f64,
                MIN_CREDIT_SCORE as f64,
                MAX_CREDIT_SCORE as f64,
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_creation() {
        let student = Student::new("class-1", "Mina", "07", 100.0).unwrap();

        assert_eq!(student.balance, 100.0);
        assert_eq!(student.credit_score, DEFAULT_CREDIT_SCORE);
        assert!(!student.is_employed());
        assert_eq!(student.credit_grade(), CreditGrade::C);
    }

    #[test]
    fn test_negative_opening_balance_rejected() {
        assert!(Student::new("class-1", "Mina", "07", -5.0).is_err());
    }

    #[test]
    fn test_credit_score_adjustment_clamps() {
        let mut student = Student::new("class-1", "Mina", "07", 0.0).unwrap();

        student.adjust_credit_score(1_000);
        assert_eq!(student.credit_score, MAX_CREDIT_SCORE);

        student.adjust_credit_score(-2_000);
        assert_eq!(student.credit_score, MIN_CREDIT_SCORE);
    }

    #[test]
    fn test_out_of_band_score_fails_validation() {
        let mut student = Student::new("class-1", "Mina", "07", 0.0).unwrap();
        student.credit_score = 900;

        let errors = student.validate().unwrap_err();
        assert_eq!(errors[0].field, "creditScore");
    }

    #[test]
    fn test_missing_credit_score_defaults_on_load() {
        let json = serde_json::json!({
            "id": "s1",
            "classroomId": "c1",
            "name": "Mina",
            "balance": 10.0,
            "createdAt": "2025-03-01T00:00:00Z"
        });

        let student: Student = serde_json::from_value(json).unwrap();
        assert_eq!(student.credit_score, DEFAULT_CREDIT_SCORE);
        assert_eq!(student.job_id, None);
    }
}
