// 💼 Job Entity - salaried positions inside a classroom

use crate::error::{EconomyError, Result};
use crate::schema::{Checker, Validate, ValidationResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,

    pub classroom_id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Gross pay per payroll run
    pub salary: f64,

    pub max_positions: u32,

    #[serde(default)]
    pub assigned_student_ids: Vec<String>,
}

impl Job {
    pub fn new(
        classroom_id: &str,
        title: &str,
        description: &str,
        salary: f64,
        max_positions: u32,
    ) -> Result<Self> {
        let job = Job {
            id: uuid::Uuid::new_v4().to_string(),
            classroom_id: classroom_id.to_string(),
            title: title.trim().to_string(),
            description: description.to_string(),
            salary,
            max_positions,
            assigned_student_ids: Vec::new(),
        };
        job.ensure_valid()?;
        Ok(job)
    }

    pub fn open_positions(&self) -> u32 {
        self.max_positions
            .saturating_sub(self.assigned_student_ids.len() as u32)
    }

    pub fn is_assigned(&self, student_id: &str) -> bool {
        self.assigned_student_ids.iter().any(|id| id == student_id)
    }

    /// Add a student to the roster; assigning twice is a no-op
    pub fn assign(&mut self, student_id: &str) -> Result<()> {
        if self.is_assigned(student_id) {
            return Ok(());
        }
        if self.open_positions() == 0 {
            return Err(EconomyError::JobFull {
                job_id: self.id.clone(),
                max_positions: self.max_positions,
            });
        }
        self.assigned_student_ids.push(student_id.to_string());
        Ok(())
    }

    /// Returns true if the student was on the roster
    pub fn release(&mut self, student_id: &str) -> bool {
        let before = self.assigned_student_ids.len();
        self.assigned_student_ids.retain(|id| id != student_id);
        before != self.assigned_student_ids.len()
    }
}

impl Validate for Job {
    fn validate(&self) -> ValidationResult {
        Checker::new("Job")
            .required("id", &self.id)
            .required("classroomId", &self.classroom_id)
            .required("title", &self.title)
            .non_negative("salary", self.salary)
            .check("maxPositions", self.max_positions >= 1, "Must be at least 1")
            .check(
                "assignedStudentIds",
                self.assigned_student_ids.len() as u32 <= self.max_positions,
                "More students assigned than positions",
            )
            .finish()
    }
}
