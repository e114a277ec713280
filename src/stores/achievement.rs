// 🏆 Achievement Store - definitions and awards

use super::{keys, Collection, LedgerStore, StudentStore};
use crate::entities::{Achievement, StudentAchievement, TransactionKind};
use crate::error::{EconomyError, Result};
use crate::storage::Storage;
use tracing::info;

pub struct AchievementStore<'a> {
    achievements: Collection<'a, Achievement>,
    awards: Collection<'a, StudentAchievement>,
}

impl<'a> AchievementStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(AchievementStore {
            achievements: Collection::load(storage, keys::ACHIEVEMENTS)?,
            awards: Collection::load(storage, keys::STUDENT_ACHIEVEMENTS)?,
        })
    }

    pub fn create(
        &mut self,
        classroom_id: &str,
        name: &str,
        description: &str,
        reward: f64,
        credit_bonus: u16,
    ) -> Result<Achievement> {
        let achievement = Achievement::new(classroom_id, name, description, reward, credit_bonus)?;
        self.achievements.insert(achievement.clone())?;
        Ok(achievement)
    }

    pub fn list(&self, classroom_id: &str) -> Vec<Achievement> {
        self.achievements.filter(|a| a.classroom_id == classroom_id)
    }

    pub fn require(&self, id: &str) -> Result<&Achievement> {
        self.achievements.require(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<Achievement> {
        self.achievements.remove(id)
    }

    pub fn has_award(&self, student_id: &str, achievement_id: &str) -> bool {
        self.awards
            .all()
            .iter()
            .any(|a| a.student_id == student_id && a.achievement_id == achievement_id)
    }

    /// Credit the reward, raise the credit score and record the award once
    pub fn award(
        &mut self,
        achievement_id: &str,
        student_id: &str,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<StudentAchievement> {
        let achievement = self.achievements.require(achievement_id)?.clone();
        let student = students.require(student_id)?.clone();
        EconomyError::ensure_same_classroom(
            "Achievement",
            achievement_id,
            &achievement.classroom_id,
            &student.classroom_id,
        )?;

        if self.has_award(student_id, achievement_id) {
            return Err(EconomyError::AlreadyAwarded {
                student_id: student_id.to_string(),
                achievement_id: achievement_id.to_string(),
            });
        }

        if achievement.reward > 0.0 {
            students.credit(student_id, achievement.reward)?;
            ledger.record(
                &student.classroom_id,
                Some(student_id),
                TransactionKind::Reward,
                achievement.reward,
                format!("Achievement: {}", achievement.name),
            )?;
        }
        if achievement.credit_bonus > 0 {
            students.adjust_credit_score(student_id, achievement.credit_bonus as i32)?;
        }

        let award = StudentAchievement::new(student_id, achievement_id);
        self.awards.insert(award.clone())?;
        info!(student_id, achievement = %achievement.name, "achievement awarded");
        Ok(award)
    }

    /// (achievement, awarded_at) pairs; awards whose definition was deleted are skipped
    pub fn earned_by(&self, student_id: &str) -> Vec<(Achievement, StudentAchievement)> {
        self.awards
            .all()
            .iter()
            .filter(|a| a.student_id == student_id)
            .filter_map(|award| {
                self.achievements
                    .get(&award.achievement_id)
                    .map(|a| (a.clone(), award.clone()))
            })
            .collect()
    }
}
