// 📈 Savings interest - flat rate, no compounding
//
// Everything is recomputed from (principal, rate, term, start date) on every
// read. There are no accrual snapshots.
//
//   accrued         = principal × rate/100 × elapsed/12
//   maturity_amount = principal × (1 + rate/100 × term/12)
//   early payout    = principal + max(accrued − penalty, 0)
//   penalty         = (projected − accrued) × penalty_ratio

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Share of the not-yet-earned interest forfeited on early withdrawal
pub const DEFAULT_PENALTY_RATIO: f64 = 0.5;

/// Interest on `principal` at `annual_rate` percent held for `months`
pub fn simple_interest(principal: f64, annual_rate: f64, months: u32) -> f64 {
    principal * annual_rate / 100.0 * months as f64 / 12.0
}

/// Maturity date for a product opened on `start`
pub fn maturity_date(start: NaiveDate, term_months: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(term_months))
        .unwrap_or(NaiveDate::MAX)
}

/// Whole calendar months between `start` and `as_of` (0 if `as_of` is earlier)
pub fn elapsed_months(start: NaiveDate, as_of: NaiveDate) -> u32 {
    use chrono::Datelike;

    if as_of <= start {
        return 0;
    }

    let raw = (as_of.year() - start.year()) * 12 + as_of.month() as i32 - start.month() as i32;
    let mut months = raw.max(0) as u32;

    // Month-end clamping (Jan 31 + 1 month = Feb 28) decides the boundary
    while months > 0 && maturity_date(start, months) > as_of {
        months -= 1;
    }
    months
}

// ============================================================================
// QUOTE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestQuote {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_months: u32,
    pub elapsed_months: u32,
    pub accrued_interest: f64,
    pub projected_interest: f64,
    pub current_balance: f64,
    pub maturity_amount: f64,
}

impl InterestQuote {
    pub fn compute(
        principal: f64,
        annual_rate: f64,
        term_months: u32,
        start: NaiveDate,
        as_of: NaiveDate,
    ) -> Self {
        let elapsed = elapsed_months(start, as_of).min(term_months);
        let accrued = simple_interest(principal, annual_rate, elapsed);
        let projected = simple_interest(principal, annual_rate, term_months);

        InterestQuote {
            principal,
            annual_rate,
            term_months,
            elapsed_months: elapsed,
            accrued_interest: accrued,
            projected_interest: projected,
            current_balance: principal + accrued,
            maturity_amount: principal + projected,
        }
    }

    pub fn is_mature(&self) -> bool {
        self.elapsed_months >= self.term_months
    }

    pub fn remaining_interest(&self) -> f64 {
        (self.projected_interest - self.accrued_interest).max(0.0)
    }

    /// Settle the account now. Mature accounts pay the full maturity amount.
    pub fn settle(&self, penalty_ratio: f64) -> Settlement {
        if self.is_mature() {
            return Settlement {
                payout: self.maturity_amount,
                interest_paid: self.projected_interest,
                penalty: 0.0,
                early: false,
            };
        }

        let penalty = self.remaining_interest() * penalty_ratio;
        let interest_paid = (self.accrued_interest - penalty).max(0.0);

        Settlement {
            payout: self.principal + interest_paid,
            interest_paid,
            penalty,
            early: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub payout: f64,
    pub interest_paid: f64,
    pub penalty: f64,
    pub early: bool,
}

// ============================================================================
// TESTS
// ============================================================================
