// 💼 Job Store - positions, assignments and payroll

use super::{keys, ClassroomStore, Collection, LedgerStore, StudentStore};
use crate::entities::{Job, Transaction, TransactionKind};
use crate::error::{EconomyError, Result};
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub struct JobStore<'a> {
    jobs: Collection<'a, Job>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollReport {
    pub students_paid: usize,
    pub gross: f64,
    pub tax: f64,
    pub net: f64,
    /// Assigned students whose record no longer exists
    pub skipped: Vec<String>,
}

impl<'a> JobStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(JobStore {
            jobs: Collection::load(storage, keys::JOBS)?,
        })
    }

    pub fn create(
        &mut self,
        classroom_id: &str,
        title: &str,
        description: &str,
        salary: f64,
        max_positions: u32,
    ) -> Result<Job> {
        let job = Job::new(classroom_id, title, description, salary, max_positions)?;
        self.jobs.insert(job.clone())?;
        info!(id = %job.id, title = %job.title, "job created");
        Ok(job)
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&Job> {
        self.jobs.require(id)
    }

    pub fn list_for_classroom(&self, classroom_id: &str) -> Vec<Job> {
        self.jobs.filter(|j| j.classroom_id == classroom_id)
    }

    pub fn update(&mut self, job: Job) -> Result<()> {
        self.jobs.replace(job)
    }

    /// Remove the job. Students keep a dangling `job_id` and are skipped by payroll.
    pub fn delete(&mut self, id: &str) -> Result<Job> {
        self.jobs.remove(id)
    }

    /// Put a student on a job, releasing them from any previous one
    pub fn assign(&mut self, job_id: &str, student_id: &str, students: &mut StudentStore) -> Result<Job> {
        let student = students.require(student_id)?.clone();
        let mut job = self.jobs.require(job_id)?.clone();
        EconomyError::ensure_same_classroom("Job", job_id, &job.classroom_id, &student.classroom_id)?;
        job.assign(student_id)?;

        if let Some(previous) = student.job_id.as_deref().filter(|id| *id != job_id) {
            if let Some(mut old) = self.jobs.get(previous).cloned() {
                old.release(student_id);
                self.jobs.replace(old)?;
            }
        }

        self.jobs.replace(job.clone())?;
        students.set_job(student_id, Some(job_id))?;
        info!(job_id, student_id, "student assigned");
        Ok(job)
    }

    pub fn unassign(&mut self, student_id: &str, students: &mut StudentStore) -> Result<()> {
        let student = students.require(student_id)?.clone();
        if let Some(job_id) = student.job_id.as_deref() {
            if let Some(mut job) = self.jobs.get(job_id).cloned() {
                job.release(student_id);
                self.jobs.replace(job)?;
            }
            students.set_job(student_id, None)?;
        }
        Ok(())
    }

    /// Pay every assigned student in the classroom. Tax at the classroom rate
    /// goes to the treasury, the net salary to the student.
    ///
    /// Every ledger entry is built before any money moves; each student's pay
    /// and its tax then land together.
    pub fn run_payroll(
        &self,
        classroom_id: &str,
        classrooms: &mut ClassroomStore,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<PayrollReport> {
        let classroom = classrooms.require(classroom_id)?.clone();
        let mut report = PayrollReport::default();
        let mut payslips = Vec::new();

        for job in self.jobs.all().iter().filter(|j| j.classroom_id == classroom_id) {
            if job.salary <= 0.0 {
                continue;
            }

            for student_id in &job.assigned_student_ids {
                if students.get(student_id).is_none() {
                    warn!(job_id = %job.id, student_id, "assigned student missing, skipping");
                    report.skipped.push(student_id.clone());
                    continue;
                }
                payslips.push(Payslip::new(classroom_id, student_id, job, classroom.tax_on(job.salary))?);
            }
        }

        for slip in payslips {
            if slip.net > 0.0 {
                students.credit(&slip.student_id, slip.net)?;
            }
            if slip.tax > 0.0 {
                classrooms.adjust_treasury(classroom_id, slip.tax)?;
            }
            for entry in slip.entries {
                ledger.append(entry)?;
            }

            report.students_paid += 1;
            report.gross += slip.gross;
            report.tax += slip.tax;
            report.net += slip.net;
        }

        info!(
            classroom_id,
            paid = report.students_paid,
            gross = report.gross,
            tax = report.tax,
            "payroll complete"
        );
        Ok(report)
    }
}

/// One student's pay for one job, with its ledger entries prepared
struct Payslip {
    student_id: String,
    gross: f64,
    tax: f64,
    net: f64,
    entries: Vec<Transaction>,
}

impl Payslip {
    fn new(classroom_id: &str, student_id: &str, job: &Job, tax: f64) -> Result<Self> {
        let mut entries = vec![Transaction::new(
            classroom_id,
            Some(student_id),
            TransactionKind::Salary,
            job.salary,
            format!("Salary: {}", job.title),
        )?];
        if tax > 0.0 {
            entries.push(Transaction::new(
                classroom_id,
                Some(student_id),
                TransactionKind::Tax,
                -tax,
                format!("Income tax on {}", job.title),
            )?);
        }

        Ok(Payslip {
            student_id: student_id.to_string(),
            gross: job.salary,
            tax,
            net: job.salary - tax,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_moves_student_between_jobs() {
        let storage = Storage::open_in_memory().unwrap();
        let mut jobs = JobStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();

        let s = students.add("c1", "Jae", "01", 0.0).unwrap();
        let banker = jobs.create("c1", "Banker", "", 50.0, 1).unwrap();
        let clerk = jobs.create("c1", "Clerk", "", 30.0, 1).unwrap();

        jobs.assign(&banker.id, &s.id, &mut students).unwrap();
        jobs.assign(&clerk.id, &s.id, &mut students).unwrap();

        assert!(jobs.require(&banker.id).unwrap().assigned_student_ids.is_empty());
        assert!(jobs.require(&clerk.id).unwrap().is_assigned(&s.id));
        assert_eq!(students.require(&s.id).unwrap().job_id.as_deref(), Some(clerk.id.as_str()));

        jobs.unassign(&s.id, &mut students).unwrap();
        assert!(!students.require(&s.id).unwrap().is_employed());
    }

    #[test]
    fn test_full_job_rejects_assignment() {
        let storage = Storage::open_in_memory().unwrap();
        let mut jobs = JobStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();

        let a = students.add("c1", "Jae", "01", 0.0).unwrap();
        let b = students.add("c1", "Mina", "02", 0.0).unwrap();
        let job = jobs.create("c1", "Banker", "", 50.0, 1).unwrap();

        jobs.assign(&job.id, &a.id, &mut students).unwrap();
        let err = jobs.assign(&job.id, &b.id, &mut students).unwrap_err();

        assert!(matches!(err, EconomyError::JobFull { .. }));
        assert!(!students.require(&b.id).unwrap().is_employed());
    }

    #[test]
    fn test_assign_across_classrooms_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut jobs = JobStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();

        let s = students.add("c2", "Mina", "02", 0.0).unwrap();
        let job = jobs.create("c1", "Banker", "", 50.0, 1).unwrap();

        let err = jobs.assign(&job.id, &s.id, &mut students).unwrap_err();
        assert!(matches!(err, EconomyError::ClassroomMismatch { entity: "Job", .. }));
        assert!(!students.require(&s.id).unwrap().is_employed());
    }

    #[test]
    fn test_payroll_withholds_tax_into_treasury() {
        let storage = Storage::open_in_memory().unwrap();
        let mut classrooms = ClassroomStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut jobs = JobStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let room = classrooms.create("Room 7", "Mr. Cho", 10.0).unwrap();
        let a = students.add(&room.id, "Jae", "01", 0.0).unwrap();
        let b = students.add(&room.id, "Mina", "02", 5.0).unwrap();
        let job = jobs.create(&room.id, "Banker", "", 50.0, 2).unwrap();
        jobs.assign(&job.id, &a.id, &mut students).unwrap();
        jobs.assign(&job.id, &b.id, &mut students).unwrap();

        let report = jobs
            .run_payroll(&room.id, &mut classrooms, &mut students, &mut ledger)
            .unwrap();

        assert_eq!(report.students_paid, 2);
        assert_eq!(report.gross, 100.0);
        assert_eq!(report.tax, 10.0);
        assert_eq!(students.require(&a.id).unwrap().balance, 45.0);
        assert_eq!(students.require(&b.id).unwrap().balance, 50.0);
        assert_eq!(classrooms.require(&room.id).unwrap().treasury, 10.0);
        assert_eq!(ledger.for_classroom(&room.id).len(), 4);

        // Gross salary plus the negative tax entry nets out to what was paid
        let net: f64 = ledger.for_student(&a.id).iter().map(|tx| tx.amount).sum();
        assert_eq!(net, 45.0);
    }

    #[test]
    fn test_payroll_treasury_matches_tax_entries() {
        let storage = Storage::open_in_memory().unwrap();
        let mut classrooms = ClassroomStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut jobs = JobStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let room = classrooms.create("Room 7", "Mr. Cho", 20.0).unwrap();
        let a = students.add(&room.id, "Jae", "01", 0.0).unwrap();
        let b = students.add(&room.id, "Mina", "02", 0.0).unwrap();
        let banker = jobs.create(&room.id, "Banker", "", 50.0, 1).unwrap();
        let clerk = jobs.create(&room.id, "Clerk", "", 30.0, 1).unwrap();
        jobs.assign(&banker.id, &a.id, &mut students).unwrap();
        jobs.assign(&clerk.id, &b.id, &mut students).unwrap();

        jobs.run_payroll(&room.id, &mut classrooms, &mut students, &mut ledger)
            .unwrap();

        let classrooms = ClassroomStore::load(&storage).unwrap();
        let ledger = LedgerStore::load(&storage).unwrap();
        let treasury = classrooms.require(&room.id).unwrap().treasury;
        let withheld = -ledger.total_by_kind(&room.id, TransactionKind::Tax);

        assert!((treasury - 16.0).abs() < 1e-9);
        assert!((treasury - withheld).abs() < 1e-9);
    }

    #[test]
    fn test_payroll_skips_deleted_students() {
        let storage = Storage::open_in_memory().unwrap();
        let mut classrooms = ClassroomStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut jobs = JobStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let room = classrooms.create("Room 7", "Mr. Cho", 0.0).unwrap();
        let a = students.add(&room.id, "Jae", "01", 0.0).unwrap();
        let job = jobs.create(&room.id, "Banker", "", 50.0, 1).unwrap();
        jobs.assign(&job.id, &a.id, &mut students).unwrap();
        students.delete(&a.id).unwrap();

        let report = jobs
            .run_payroll(&room.id, &mut classrooms, &mut students, &mut ledger)
            .unwrap();

        assert_eq!(report.students_paid, 0);
        assert_eq!(report.skipped, vec![a.id]);
    }
}
