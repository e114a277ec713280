// 🏆 Achievement Entities - milestones a teacher defines and rewards

use crate::error::Result;
use crate::schema::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub classroom_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Cash credited when awarded
    #[serde(default)]
    pub reward: f64,
    /// Credit score points granted when awarded
    #[serde(default)]
    pub credit_bonus: u16,
}

impl Achievement {
    pub fn new(
        classroom_id: &str,
        name: &str,
        description: &str,
        reward: f64,
        credit_bonus: u16,
    ) -> Result<Self> {
        let achievement = Achievement {
            id: uuid::Uuid::new_v4().to_string(),
            classroom_id: classroom_id.to_string(),
            name: name.trim().to_string(),
            description: description.to_string(),
            reward,
            credit_bonus,
        };
        achievement.ensure_valid()?;
        Ok(achievement)
    }
}

impl Validate for Achievement {
    fn validate(&self) -> ValidationResult {
        Checker::new("Achievement")
            .required("id", &self.id)
            .required("classroomId", &self.classroom_id)
            .required("name", &self.name)
            .non_negative("reward", self.reward)
            .finish()
    }
}

/// Join row: which student earned which achievement, and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAchievement {
    pub id: String,
    pub student_id: String,
    pub achievement_id: String,
    pub awarded_at: DateTime<Utc>,
}

impl StudentAchievement {
    pub fn new(student_id: &str, achievement_id: &str) -> Self {
        StudentAchievement {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            achievement_id: achievement_id.to_string(),
            awarded_at: Utc::now(),
        }
    }
}

impl Validate for StudentAchievement {
    fn validate(&self) -> ValidationResult {
        Checker::new("StudentAchievement")
            .required("id", &self.id)
            .required("studentId", &self.student_id)
            .required("achievementId", &self.achievement_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_achievement_validation() {
        assert!(Achievement::new("c1", "Perfect Week", "", 20.0, 10).is_ok());
        assert!(Achievement::new("c1", " ", "", 20.0, 10).is_err());
        assert!(Achievement::new("c1", "Oops", "", -1.0, 0).is_err());
    }
}
