// 🏛️ Bank Admin Store - teacher-side banking operations
//
// Savings product catalogue, grants and fines, credit score overrides and
// the classroom money summary.

use super::{
    keys, ClassroomStore, Collection, LedgerStore, SavingsStore, StockStore, StudentStore,
};
use crate::credit;
use crate::entities::{SavingsKind, SavingsProduct, Student, Transaction, TransactionKind};
use crate::error::Result;
use crate::storage::Storage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

pub struct BankAdminStore<'a> {
    products: Collection<'a, SavingsProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassroomSummary {
    pub classroom_id: String,
    pub student_count: usize,
    pub cash: f64,
    pub savings: f64,
    pub stocks: f64,
    pub treasury: f64,
    pub average_credit_score: f64,
}

impl ClassroomSummary {
    /// Everything the classroom owns
    pub fn total_wealth(&self) -> f64 {
        self.cash + self.savings + self.stocks + self.treasury
    }
}

impl<'a> BankAdminStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(BankAdminStore {
            products: Collection::load(storage, keys::SAVINGS_PRODUCTS)?,
        })
    }

    // ========================================================================
    // PRODUCT CATALOGUE
    // ========================================================================

    pub fn create_product(
        &mut self,
        classroom_id: &str,
        name: &str,
        kind: SavingsKind,
        base_rate: f64,
        term_months: u32,
        min_amount: f64,
    ) -> Result<SavingsProduct> {
        let product =
            SavingsProduct::new(classroom_id, name, kind, base_rate, term_months, min_amount)?;
        self.products.insert(product.clone())?;
        info!(id = %product.id, name = %product.name, kind = product.kind.as_str(), "savings product created");
        Ok(product)
    }

    pub fn products(&self, classroom_id: &str) -> Vec<SavingsProduct> {
        self.products.filter(|p| p.classroom_id == classroom_id)
    }

    pub fn require_product(&self, id: &str) -> Result<&SavingsProduct> {
        self.products.require(id)
    }

    /// Stop offering a product; open accounts keep their terms
    pub fn deactivate_product(&mut self, id: &str) -> Result<SavingsProduct> {
        self.products.update(id, |p| {
            p.active = false;
            Ok(())
        })
    }

    // ========================================================================
    // STUDENT ADJUSTMENTS
    // ========================================================================

    /// Pay a student from outside the economy
    pub fn grant(
        &self,
        student_id: &str,
        amount: f64,
        reason: &str,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<Student> {
        let classroom_id = students.require(student_id)?.classroom_id.clone();
        let entry = Transaction::new(
            &classroom_id,
            Some(student_id),
            TransactionKind::Grant,
            amount,
            reason,
        )?;

        let student = students.credit(student_id, amount)?;
        ledger.append(entry)?;
        Ok(student)
    }

    /// Take money from a student into the treasury. Rejected if it would
    /// overdraw the student.
    pub fn fine(
        &self,
        student_id: &str,
        amount: f64,
        reason: &str,
        students: &mut StudentStore,
        classrooms: &mut ClassroomStore,
        ledger: &mut LedgerStore,
    ) -> Result<Student> {
        let classroom_id = students.require(student_id)?.classroom_id.clone();
        let entry = Transaction::new(
            &classroom_id,
            Some(student_id),
            TransactionKind::Fine,
            -amount,
            reason,
        )?;

        let student = students.debit(student_id, amount)?;
        if classrooms.get(&classroom_id).is_some() {
            classrooms.adjust_treasury(&classroom_id, amount)?;
        }
        ledger.append(entry)?;
        Ok(student)
    }

    /// Override a credit score (clamped to 300-850)
    pub fn set_credit_score(&self, student_id: &str, score: u16, students: &mut StudentStore) -> Result<Student> {
        let current = students.require(student_id)?.credit_score;
        let target = credit::clamp_score(score as i32);
        students.adjust_credit_score(student_id, target as i32 - current as i32)
    }
}

/// Classroom-wide money picture at `as_of`
pub fn summarize(
    classrooms: &ClassroomStore,
    students: &StudentStore,
    savings: &SavingsStore,
    stocks: &StockStore,
    classroom_id: &str,
    as_of: NaiveDate,
) -> Result<ClassroomSummary> {
    let classroom = classrooms.require(classroom_id)?;
    let roster = students.list_for_classroom(classroom_id);

    let cash = roster.iter().map(|s| s.balance).sum();
    let saved = roster
        .iter()
        .map(|s| savings.balance_for_student(&s.id, as_of))
        .sum();
    let invested = roster.iter().map(|s| stocks.portfolio_value(&s.id)).sum();
    let average_credit_score = if roster.is_empty() {
        0.0
    } else {
        roster.iter().map(|s| s.credit_score as f64).sum::<f64>() / roster.len() as f64
    };

    Ok(ClassroomSummary {
        classroom_id: classroom_id.to_string(),
        student_count: roster.len(),
        cash,
        savings: saved,
        stocks: invested,
        treasury: classroom.treasury,
        average_credit_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EconomyConfig;
    use crate::error::EconomyError;
    use crate::trading::DEFAULT_FEE_RATE;

    #[test]
    fn test_product_catalogue() {
        let storage = Storage::open_in_memory().unwrap();
        let mut bank = BankAdminStore::load(&storage).unwrap();

        let p = bank
            .create_product("c1", "6-month CD", SavingsKind::Deposit, 5.0, 6, 10.0)
            .unwrap();
        assert_eq!(bank.products("c1").len(), 1);

        let p = bank.deactivate_product(&p.id).unwrap();
        assert!(!p.active);
        assert!(bank.create_product("c1", "Bad", SavingsKind::Deposit, 5.0, 0, 10.0).is_err());
    }

    #[test]
    fn test_fine_goes_to_treasury() {
        let storage = Storage::open_in_memory().unwrap();
        let bank = BankAdminStore::load(&storage).unwrap();
        let mut classrooms = ClassroomStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let room = classrooms.create("Room 7", "Mr. Cho", 0.0).unwrap();
        let s = students.add(&room.id, "Jae", "01", 10.0).unwrap();

        bank.fine(&s.id, 4.0, "Late homework", &mut students, &mut classrooms, &mut ledger)
            .unwrap();
        assert_eq!(students.require(&s.id).unwrap().balance, 6.0);
        assert_eq!(classrooms.require(&room.id).unwrap().treasury, 4.0);

        let err = bank
            .fine(&s.id, 7.0, "Too much", &mut students, &mut classrooms, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, EconomyError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_empty_reason_moves_no_money() {
        let storage = Storage::open_in_memory().unwrap();
        let bank = BankAdminStore::load(&storage).unwrap();
        let mut classrooms = ClassroomStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let room = classrooms.create("Room 7", "Mr. Cho", 0.0).unwrap();
        let s = students.add(&room.id, "Jae", "01", 10.0).unwrap();

        let err = bank.grant(&s.id, 5.0, "", &mut students, &mut ledger).unwrap_err();
        assert!(matches!(err, EconomyError::Validation(_)));
        let err = bank
            .fine(&s.id, 4.0, "", &mut students, &mut classrooms, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, EconomyError::Validation(_)));

        // Reload from storage: nothing was persisted
        let students = StudentStore::load(&storage).unwrap();
        let classrooms = ClassroomStore::load(&storage).unwrap();
        let ledger = LedgerStore::load(&storage).unwrap();
        assert_eq!(students.require(&s.id).unwrap().balance, 10.0);
        assert_eq!(classrooms.require(&room.id).unwrap().treasury, 0.0);
        assert!(ledger.for_student(&s.id).is_empty());
    }

    #[test]
    fn test_grant_and_credit_override() {
        let storage = Storage::open_in_memory().unwrap();
        let bank = BankAdminStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let s = students.add("c1", "Jae", "01", 0.0).unwrap();
        bank.grant(&s.id, 15.0, "Class helper", &mut students, &mut ledger).unwrap();
        assert_eq!(students.require(&s.id).unwrap().balance, 15.0);

        assert_eq!(bank.set_credit_score(&s.id, 780, &mut students).unwrap().credit_score, 780);
        assert_eq!(bank.set_credit_score(&s.id, 100, &mut students).unwrap().credit_score, 300);
    }

    #[test]
    fn test_summary_totals() {
        let storage = Storage::open_in_memory().unwrap();
        let mut classrooms = ClassroomStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut stocks = StockStore::load(&storage).unwrap();
        let mut savings = SavingsStore::load(&storage).unwrap();
        let mut bank = BankAdminStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let room = classrooms.create("Room 7", "Mr. Cho", 0.0).unwrap();
        let s = students.add(&room.id, "Jae", "01", 300.0).unwrap();
        let stock = stocks.add_stock(&room.id, "LEMN", "Lemonade", 10.0).unwrap();
        stocks
            .buy(&s.id, &stock.id, 10, DEFAULT_FEE_RATE, &mut students, &mut ledger)
            .unwrap();

        let product = bank
            .create_product(&room.id, "CD", SavingsKind::Deposit, 6.0, 12, 0.0)
            .unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        savings
            .open(&s.id, &product, 100.0, start, &EconomyConfig::default(), &mut students, &mut ledger)
            .unwrap();

        let summary = summarize(&classrooms, &students, &savings, &stocks, &room.id, start).unwrap();

        assert_eq!(summary.student_count, 1);
        assert!((summary.cash - 99.0).abs() < 1e-9);
        assert_eq!(summary.savings, 100.0);
        assert_eq!(summary.stocks, 100.0);
        assert!((summary.total_wealth() - 299.0).abs() < 1e-9);
    }
}
