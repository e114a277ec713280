// 🏦 Savings Store - student deposit and savings accounts

use super::{keys, Collection, LedgerStore, StudentStore};
use crate::config::EconomyConfig;
use crate::credit;
use crate::entities::{SavingsAccount, SavingsProduct, TransactionKind};
use crate::error::{EconomyError, Result};
use crate::interest::{InterestQuote, Settlement};
use crate::storage::Storage;
use chrono::NaiveDate;
use tracing::info;

pub struct SavingsStore<'a> {
    accounts: Collection<'a, SavingsAccount>,
}

impl<'a> SavingsStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(SavingsStore {
            accounts: Collection::load(storage, keys::SAVINGS_ACCOUNTS)?,
        })
    }

    pub fn get(&self, id: &str) -> Option<&SavingsAccount> {
        self.accounts.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&SavingsAccount> {
        self.accounts.require(id)
    }

    pub fn list_for_student(&self, student_id: &str) -> Vec<SavingsAccount> {
        self.accounts.filter(|a| a.student_id == student_id)
    }

    /// Open an account at the student's credit-adjusted rate, paying in
    /// `amount` from their cash balance
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        student_id: &str,
        product: &SavingsProduct,
        amount: f64,
        as_of: NaiveDate,
        config: &EconomyConfig,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<SavingsAccount> {
        if !product.active {
            return Err(EconomyError::InvalidAmount(format!(
                "product {} is no longer offered",
                product.name
            )));
        }

        let student = students.require(student_id)?.clone();
        EconomyError::ensure_same_classroom(
            "SavingsProduct",
            &product.id,
            &product.classroom_id,
            &student.classroom_id,
        )?;
        let rate = credit::adjusted_rate(
            student.credit_grade(),
            product.base_rate,
            config.min_interest_rate,
        );
        let account = SavingsAccount::open(student_id, product, amount, rate, as_of)?;

        if !student.can_afford(amount) {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                available: student.balance,
            });
        }

        students.debit(student_id, amount)?;
        self.accounts.insert(account.clone())?;
        ledger.record(
            &student.classroom_id,
            Some(student_id),
            TransactionKind::SavingsDeposit,
            -amount,
            format!("Opened {} ({}%)", product.name, rate),
        )?;

        info!(
            student_id,
            product = %product.name,
            amount,
            rate,
            grade = %student.credit_grade(),
            "savings account opened"
        );
        Ok(account)
    }

    /// Recurring contribution to a Savings-kind account
    pub fn contribute(
        &mut self,
        account_id: &str,
        amount: f64,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<SavingsAccount> {
        let mut account = self.accounts.require(account_id)?.clone();
        account.contribute(amount)?;

        let student = students.debit(&account.student_id, amount)?;
        self.accounts.replace(account.clone())?;
        ledger.record(
            &student.classroom_id,
            Some(&student.id),
            TransactionKind::SavingsDeposit,
            -amount,
            "Savings contribution",
        )?;
        Ok(account)
    }

    pub fn quote(&self, account_id: &str, as_of: NaiveDate) -> Result<InterestQuote> {
        Ok(self.accounts.require(account_id)?.quote(as_of))
    }

    /// Close the account and pay out. Before maturity half of the remaining
    /// projected interest (by default) is forfeited.
    pub fn withdraw(
        &mut self,
        account_id: &str,
        as_of: NaiveDate,
        penalty_ratio: f64,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<Settlement> {
        let mut account = self.accounts.require(account_id)?.clone();
        let student = students.require(&account.student_id)?.clone();

        let settlement = account.close(as_of, penalty_ratio)?;
        if settlement.payout > 0.0 {
            students.credit(&student.id, settlement.payout)?;
        }
        self.accounts.replace(account)?;

        let description = if settlement.early {
            format!("Early withdrawal (penalty {:.2})", settlement.penalty)
        } else {
            "Matured savings payout".to_string()
        };
        ledger.record(
            &student.classroom_id,
            Some(&student.id),
            TransactionKind::SavingsWithdrawal,
            settlement.payout,
            description,
        )?;

        info!(account_id, payout = settlement.payout, early = settlement.early, "savings withdrawn");
        Ok(settlement)
    }

    /// Mark accounts past maturity; returns how many changed
    pub fn refresh_maturities(&mut self, as_of: NaiveDate) -> Result<usize> {
        let mut all = self.accounts.all().to_vec();
        let mut changed = 0;
        for account in all.iter_mut() {
            if account.refresh_status(as_of) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.accounts.replace_all(all)?;
        }
        Ok(changed)
    }

    /// Value of all open accounts for a student at `as_of`
    pub fn balance_for_student(&self, student_id: &str, as_of: NaiveDate) -> f64 {
        self.accounts
            .all()
            .iter()
            .filter(|a| a.student_id == student_id)
            .map(|a| a.current_balance(as_of))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{SavingsKind, SavingsStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deposit() -> SavingsProduct {
        SavingsProduct::new("c1", "12-month CD", SavingsKind::Deposit, 6.0, 12, 10.0).unwrap()
    }

    #[test]
    fn test_open_uses_credit_adjusted_rate() {
        let storage = Storage::open_in_memory().unwrap();
        let mut savings = SavingsStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();
        let config = EconomyConfig::default();

        let s = students.add("c1", "Jae", "01", 500.0).unwrap();
        students.adjust_credit_score(&s.id, 160).unwrap(); // 810 -> A+

        let account = savings
            .open(&s.id, &deposit(), 200.0, date(2025, 1, 1), &config, &mut students, &mut ledger)
            .unwrap();

        assert_eq!(account.interest_rate, 8.0);
        assert_eq!(students.require(&s.id).unwrap().balance, 300.0);
        assert_eq!(ledger.for_student(&s.id)[0].amount, -200.0);
    }

    #[test]
    fn test_open_without_cash_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut savings = SavingsStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let s = students.add("c1", "Jae", "01", 50.0).unwrap();
        let err = savings
            .open(&s.id, &deposit(), 200.0, date(2025, 1, 1), &EconomyConfig::default(), &mut students, &mut ledger)
            .unwrap_err();

        assert!(matches!(err, EconomyError::InsufficientFunds { .. }));
        assert!(savings.list_for_student(&s.id).is_empty());
    }

    #[test]
    fn test_early_withdrawal_between_principal_and_maturity() {
        let storage = Storage::open_in_memory().unwrap();
        let mut savings = SavingsStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();
        let config = EconomyConfig::default();

        let s = students.add("c1", "Jae", "01", 1000.0).unwrap();
        let account = savings
            .open(&s.id, &deposit(), 1000.0, date(2025, 1, 1), &config, &mut students, &mut ledger)
            .unwrap();
        let maturity = account.quote(date(2025, 1, 1)).maturity_amount;

        let settlement = savings
            .withdraw(&account.id, date(2025, 10, 1), config.early_withdrawal_penalty, &mut students, &mut ledger)
            .unwrap();

        assert!(settlement.early);
        assert!(settlement.payout >= 1000.0);
        assert!(settlement.payout < maturity);
        assert_eq!(students.require(&s.id).unwrap().balance, settlement.payout);
        assert_eq!(savings.require(&account.id).unwrap().status, SavingsStatus::Withdrawn);

        assert!(matches!(
            savings.withdraw(&account.id, date(2025, 10, 1), 0.5, &mut students, &mut ledger),
            Err(EconomyError::AccountClosed(_))
        ));
    }

    #[test]
    fn test_contribute_and_mature() {
        let storage = Storage::open_in_memory().unwrap();
        let mut savings = SavingsStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();
        let config = EconomyConfig::default();

        let product =
            SavingsProduct::new("c1", "Piggy bank", SavingsKind::Savings, 4.0, 3, 5.0).unwrap();
        let s = students.add("c1", "Jae", "01", 100.0).unwrap();
        let account = savings
            .open(&s.id, &product, 20.0, date(2025, 1, 1), &config, &mut students, &mut ledger)
            .unwrap();

        savings.contribute(&account.id, 20.0, &mut students, &mut ledger).unwrap();
        assert_eq!(savings.require(&account.id).unwrap().principal, 40.0);
        assert_eq!(students.require(&s.id).unwrap().balance, 60.0);

        assert_eq!(savings.refresh_maturities(date(2025, 3, 31)).unwrap(), 0);
        assert_eq!(savings.refresh_maturities(date(2025, 4, 1)).unwrap(), 1);
        assert_eq!(savings.require(&account.id).unwrap().status, SavingsStatus::Matured);

        // Matured: full maturity amount, no penalty
        let settlement = savings
            .withdraw(&account.id, date(2025, 4, 1), 0.5, &mut students, &mut ledger)
            .unwrap();
        assert!(!settlement.early);
        assert!((settlement.payout - 40.4).abs() < 1e-9);
    }

    #[test]
    fn test_other_classroom_product_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut savings = SavingsStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let s = students.add("c2", "Mina", "02", 100.0).unwrap();
        let err = savings
            .open(&s.id, &deposit(), 20.0, date(2025, 1, 1), &EconomyConfig::default(), &mut students, &mut ledger)
            .unwrap_err();

        assert!(matches!(err, EconomyError::ClassroomMismatch { .. }));
        assert_eq!(students.require(&s.id).unwrap().balance, 100.0);
    }

    #[test]
    fn test_inactive_product_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut savings = SavingsStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let mut product = deposit();
        product.active = false;
        let s = students.add("c1", "Jae", "01", 100.0).unwrap();

        assert!(savings
            .open(&s.id, &product, 20.0, date(2025, 1, 1), &EconomyConfig::default(), &mut students, &mut ledger)
            .is_err());
    }
}
