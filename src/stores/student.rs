// 🎒 Student Store - balances, credit scores and roster import

use super::{keys, Collection};
use crate::entities::Student;
use crate::error::{EconomyError, Result};
use crate::storage::Storage;
use serde::Deserialize;
use std::io::Read;
use tracing::{info, warn};

pub struct StudentStore<'a> {
    students: Collection<'a, Student>,
}

/// One line of a roster CSV: `Name,Number,Balance`
#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Number", default)]
    number: String,
    #[serde(rename = "Balance", default)]
    balance: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RosterImport {
    pub imported: usize,
    pub skipped: usize,
}

fn require_positive(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EconomyError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

impl<'a> StudentStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(StudentStore {
            students: Collection::load(storage, keys::STUDENTS)?,
        })
    }

    pub fn add(
        &mut self,
        classroom_id: &str,
        name: &str,
        student_number: &str,
        opening_balance: f64,
    ) -> Result<Student> {
        let student = Student::new(classroom_id, name, student_number, opening_balance)?;
        self.students.insert(student.clone())?;
        info!(id = %student.id, classroom_id, "student added");
        Ok(student)
    }

    pub fn get(&self, id: &str) -> Option<&Student> {
        self.students.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&Student> {
        self.students.require(id)
    }

    pub fn all(&self) -> &[Student] {
        self.students.all()
    }

    pub fn list_for_classroom(&self, classroom_id: &str) -> Vec<Student> {
        self.students.filter(|s| s.classroom_id == classroom_id)
    }

    /// Full-object replacement
    pub fn update(&mut self, student: Student) -> Result<()> {
        self.students.replace(student)
    }

    pub fn delete(&mut self, id: &str) -> Result<Student> {
        self.students.remove(id)
    }

    pub fn credit(&mut self, id: &str, amount: f64) -> Result<Student> {
        require_positive(amount)?;
        self.students.update(id, |s| {
            s.balance += amount;
            Ok(())
        })
    }

    /// Withdraw cash; the balance never goes below zero
    pub fn debit(&mut self, id: &str, amount: f64) -> Result<Student> {
        require_positive(amount)?;
        self.students.update(id, |s| {
            if !s.can_afford(amount) {
                return Err(EconomyError::InsufficientFunds {
                    needed: amount,
                    available: s.balance,
                });
            }
            s.balance -= amount;
            Ok(())
        })
    }

    pub fn adjust_credit_score(&mut self, id: &str, delta: i32) -> Result<Student> {
        self.students.update(id, |s| {
            s.adjust_credit_score(delta);
            Ok(())
        })
    }

    pub fn set_job(&mut self, id: &str, job_id: Option<&str>) -> Result<Student> {
        self.students.update(id, |s| {
            s.job_id = job_id.map(str::to_string);
            Ok(())
        })
    }

    /// Import `Name,Number,Balance` rows. Rows that fail validation are
    /// skipped; the rest are persisted in one write.
    pub fn import_roster<R: Read>(&mut self, classroom_id: &str, reader: R) -> Result<RosterImport> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut report = RosterImport::default();
        let mut batch = Vec::new();

        for (line, row) in rdr.deserialize::<RosterRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(line = line + 2, error = %e, "skipping unreadable roster row");
                    report.skipped += 1;
                    continue;
                }
            };

            match Student::new(classroom_id, &row.name, &row.number, row.balance.unwrap_or(0.0)) {
                Ok(student) => batch.push(student),
                Err(e) => {
                    warn!(line = line + 2, error = %e, "skipping invalid roster row");
                    report.skipped += 1;
                }
            }
        }

        report.imported = batch.len();
        let mut all = self.students.all().to_vec();
        all.extend(batch);
        self.students.replace_all(all)?;

        info!(classroom_id, imported = report.imported, skipped = report.skipped, "roster imported");
        Ok(report)
    }
}
