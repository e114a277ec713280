// 🧾 Ledger Transaction - one money movement in a classroom
//
// Amount sign follows the student's point of view: positive credits the
// student, negative debits them. Treasury-only entries have no student.

use crate::error::Result;
use crate::schema::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Salary,
    Tax,
    Reward,
    Fine,
    Grant,
    SavingsDeposit,
    SavingsWithdrawal,
    StockBuy,
    StockSell,
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Salary => "SALARY",
            TransactionKind::Tax => "TAX",
            TransactionKind::Reward => "REWARD",
            TransactionKind::Fine => "FINE",
            TransactionKind::Grant => "GRANT",
            TransactionKind::SavingsDeposit => "SAVINGS_DEPOSIT",
            TransactionKind::SavingsWithdrawal => "SAVINGS_WITHDRAWAL",
            TransactionKind::StockBuy => "STOCK_BUY",
            TransactionKind::StockSell => "STOCK_SELL",
            TransactionKind::Adjustment => "ADJUSTMENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub classroom_id: String,
    #[serde(default)]
    pub student_id: Option<String>,
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        classroom_id: &str,
        student_id: Option<&str>,
        kind: TransactionKind,
        amount: f64,
        description: impl Into<String>,
    ) -> Result<Self> {
        let tx = Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            classroom_id: classroom_id.to_string(),
            student_id: student_id.map(str::to_string),
            kind,
            amount,
            description: description.into(),
            created_at: Utc::now(),
        };
        tx.ensure_valid()?;
        Ok(tx)
    }

    pub fn is_credit(&self) -> bool {
        self.amount > 0.0
    }
}

impl Validate for Transaction {
    fn validate(&self) -> ValidationResult {
        Checker::new("Transaction")
            .required("id", &self.id)
            .required("classroomId", &self.classroom_id)
            .required("description", &self.description)
            .check("amount", self.amount.is_finite(), "Must be a finite number")
            .finish()
    }
}
