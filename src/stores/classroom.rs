// 🏫 Classroom Store

use super::{keys, Collection};
use crate::entities::Classroom;
use crate::error::{EconomyError, Result};
use crate::storage::Storage;
use tracing::info;

pub struct ClassroomStore<'a> {
    classrooms: Collection<'a, Classroom>,
}

impl<'a> ClassroomStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(ClassroomStore {
            classrooms: Collection::load(storage, keys::CLASSROOMS)?,
        })
    }

    pub fn create(&mut self, name: &str, teacher_name: &str, tax_rate: f64) -> Result<Classroom> {
        let classroom = Classroom::new(name, teacher_name, tax_rate)?;
        self.classrooms.insert(classroom.clone())?;
        info!(id = %classroom.id, name = %classroom.name, "classroom created");
        Ok(classroom)
    }

    pub fn get(&self, id: &str) -> Option<&Classroom> {
        self.classrooms.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&Classroom> {
        self.classrooms.require(id)
    }

    pub fn list(&self) -> &[Classroom] {
        self.classrooms.all()
    }

    /// Full-object replacement
    pub fn update(&mut self, classroom: Classroom) -> Result<()> {
        self.classrooms.replace(classroom)
    }

    pub fn set_tax_rate(&mut self, id: &str, tax_rate: f64) -> Result<Classroom> {
        if !(0.0..=100.0).contains(&tax_rate) {
            return Err(EconomyError::InvalidAmount(format!(
                "tax rate must be between 0 and 100, got {}",
                tax_rate
            )));
        }
        self.classrooms.update(id, |c| {
            c.tax_rate = tax_rate;
            Ok(())
        })
    }

    /// Move money into (positive) or out of (negative) the treasury
    pub fn adjust_treasury(&mut self, id: &str, delta: f64) -> Result<Classroom> {
        self.classrooms.update(id, |c| {
            let next = c.treasury + delta;
            if next < 0.0 {
                return Err(EconomyError::InsufficientFunds {
                    needed: -delta,
                    available: c.treasury,
                });
            }
            c.treasury = next;
            Ok(())
        })
    }

    /// Remove the classroom only. Students, jobs and accounts that point at it
    /// are left in place.
    pub fn delete(&mut self, id: &str) -> Result<Classroom> {
        let removed = self.classrooms.remove(id)?;
        info!(id, "classroom deleted");
        Ok(removed)
    }
}
