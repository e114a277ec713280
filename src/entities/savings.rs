// 🏦 Savings Entities - products defined by the bank admin, accounts held by students
//
// Deposit: one fixed principal paid in at opening.
// Savings: recurring contributions that grow the principal until maturity.

use crate::error::{EconomyError, Result};
use crate::interest::{self, InterestQuote, Settlement};
use crate::schema::{Checker, Validate, ValidationResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingsKind {
    /// Fixed-term lump sum
    Deposit,
    /// Recurring monthly contribution
    Savings,
}

impl SavingsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsKind::Deposit => "Deposit",
            SavingsKind::Savings => "Savings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingsStatus {
    Active,
    Matured,
    Withdrawn,
}

// ============================================================================
// SAVINGS PRODUCT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsProduct {
    pub id: String,
    pub classroom_id: String,
    pub name: String,
    pub kind: SavingsKind,
    /// Annual rate in percent before the credit adjustment
    pub base_rate: f64,
    pub term_months: u32,
    /// Smallest opening amount (Deposit) or monthly contribution (Savings)
    #[serde(default)]
    pub min_amount: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl SavingsProduct {
    pub fn new(
        classroom_id: &str,
        name: &str,
        kind: SavingsKind,
        base_rate: f64,
        term_months: u32,
        min_amount: f64,
    ) -> Result<Self> {
        let product = SavingsProduct {
            id: uuid::Uuid::new_v4().to_string(),
            classroom_id: classroom_id.to_string(),
            name: name.trim().to_string(),
            kind,
            base_rate,
            term_months,
            min_amount,
            active: true,
        };
        product.ensure_valid()?;
        Ok(product)
    }
}

impl Validate for SavingsProduct {
    fn validate(&self) -> ValidationResult {
        Checker::new("SavingsProduct")
            .required("id", &self.id)
            .required("classroomId", &self.classroom_id)
            .required("name", &self.name)
            .non_negative("baseRate", self.base_rate)
            .check("termMonths", self.term_months >= 1, "Must be at least 1 month")
            .non_negative("minAmount", self.min_amount)
            .finish()
    }
}

// ============================================================================
// SAVINGS ACCOUNT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAccount {
    pub id: String,
    pub student_id: String,
    pub product_id: String,
    pub kind: SavingsKind,

    /// Money paid in so far
    pub principal: f64,

    /// Planned monthly contribution (Savings only)
    #[serde(default)]
    pub monthly_amount: f64,

    /// Credit-adjusted annual rate locked in at opening
    pub interest_rate: f64,

    pub term_months: u32,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub status: SavingsStatus,

    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub payout: Option<f64>,
}

impl SavingsAccount {
    /// Open an account against `product` at a pre-computed rate
    pub fn open(
        student_id: &str,
        product: &SavingsProduct,
        amount: f64,
        interest_rate: f64,
        start_date: NaiveDate,
    ) -> Result<Self> {
        if amount < product.min_amount {
            return Err(EconomyError::InvalidAmount(format!(
                "{:.2} is below the product minimum of {:.2}",
                amount, product.min_amount
            )));
        }

        let monthly_amount = match product.kind {
            SavingsKind::Deposit => 0.0,
            SavingsKind::Savings => amount,
        };

        let account = SavingsAccount {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            product_id: product.id.clone(),
            kind: product.kind,
            principal: amount,
            monthly_amount,
            interest_rate,
            term_months: product.term_months,
            start_date,
            maturity_date: interest::maturity_date(start_date, product.term_months),
            status: SavingsStatus::Active,
            closed_at: None,
            payout: None,
        };
        account.ensure_valid()?;
        Ok(account)
    }

    pub fn is_active(&self) -> bool {
        self.status == SavingsStatus::Active
    }

    pub fn quote(&self, as_of: NaiveDate) -> InterestQuote {
        InterestQuote::compute(
            self.principal,
            self.interest_rate,
            self.term_months,
            self.start_date,
            as_of,
        )
    }

    pub fn current_balance(&self, as_of: NaiveDate) -> f64 {
        match self.status {
            SavingsStatus::Withdrawn => 0.0,
            _ => self.quote(as_of).current_balance,
        }
    }

    /// Add a recurring contribution to the principal
    pub fn contribute(&mut self, amount: f64) -> Result<()> {
        if !self.is_active() {
            return Err(EconomyError::AccountClosed(self.id.clone()));
        }
        if self.kind != SavingsKind::Savings {
            return Err(EconomyError::InvalidAmount(
                "deposit accounts do not accept contributions".to_string(),
            ));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EconomyError::InvalidAmount(format!(
                "contribution must be positive, got {}",
                amount
            )));
        }
        self.principal += amount;
        Ok(())
    }

    /// Close the account and compute what the student receives
    pub fn close(&mut self, as_of: NaiveDate, penalty_ratio: f64) -> Result<Settlement> {
        if self.status == SavingsStatus::Withdrawn {
            return Err(EconomyError::AccountClosed(self.id.clone()));
        }

        let settlement = self.quote(as_of).settle(penalty_ratio);
        self.status = SavingsStatus::Withdrawn;
        self.closed_at = Some(Utc::now());
        self.payout = Some(settlement.payout);
        Ok(settlement)
    }

    /// Flip Active accounts past their maturity date to Matured
    pub fn refresh_status(&mut self, as_of: NaiveDate) -> bool {
        if self.is_active() && as_of >= self.maturity_date {
            self.status = SavingsStatus::Matured;
            return true;
        }
        false
    }
}

impl Validate for SavingsAccount {
    fn validate(&self) -> ValidationResult {
        Checker::new("SavingsAccount")
            .required("id", &self.id)
            .required("studentId", &self.student_id)
            .non_negative("principal", self.principal)
            .non_negative("monthlyAmount", self.monthly_amount)
            .non_negative("interestRate", self.interest_rate)
            .check("termMonths", self.term_months >= 1, "Must be at least 1 month")
            .check(
                "maturityDate",
                self.maturity_date == interest::maturity_date(self.start_date, self.term_months),
                "Must equal startDate + termMonths",
            )
            .finish()
    }
}
