// 🧾 Ledger Store - append-only record of money movements

use super::{keys, Collection};
use crate::entities::{Transaction, TransactionKind};
use crate::error::Result;
use crate::storage::Storage;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

pub struct LedgerStore<'a> {
    transactions: Collection<'a, Transaction>,
}

/// Flat row for CSV export
#[derive(Debug, Serialize)]
struct LedgerRow<'r> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Classroom")]
    classroom_id: &'r str,
    #[serde(rename = "Student")]
    student_id: &'r str,
    #[serde(rename = "Kind")]
    kind: &'static str,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Description")]
    description: &'r str,
}

impl<'a> LedgerStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(LedgerStore {
            transactions: Collection::load(storage, keys::TRANSACTIONS)?,
        })
    }

    pub fn record(
        &mut self,
        classroom_id: &str,
        student_id: Option<&str>,
        kind: TransactionKind,
        amount: f64,
        description: impl Into<String>,
    ) -> Result<Transaction> {
        let tx = Transaction::new(classroom_id, student_id, kind, amount, description)?;
        self.append(tx)
    }

    /// Store an entry built ahead of time, so callers can validate it
    /// before any balance moves
    pub fn append(&mut self, tx: Transaction) -> Result<Transaction> {
        debug!(kind = tx.kind.as_str(), amount = tx.amount, classroom_id = %tx.classroom_id, "ledger entry");
        self.transactions.insert(tx.clone())?;
        Ok(tx)
    }

    pub fn all(&self) -> &[Transaction] {
        self.transactions.all()
    }

    pub fn for_classroom(&self, classroom_id: &str) -> Vec<Transaction> {
        self.transactions.filter(|tx| tx.classroom_id == classroom_id)
    }

    pub fn for_student(&self, student_id: &str) -> Vec<Transaction> {
        self.transactions
            .filter(|tx| tx.student_id.as_deref() == Some(student_id))
    }

    pub fn total_by_kind(&self, classroom_id: &str, kind: TransactionKind) -> f64 {
        self.transactions
            .all()
            .iter()
            .filter(|tx| tx.classroom_id == classroom_id && tx.kind == kind)
            .map(|tx| tx.amount)
            .sum()
    }

    /// Write a classroom's ledger as CSV, oldest first; returns the row count
    pub fn export_csv<W: Write>(&self, classroom_id: &str, writer: W) -> Result<usize> {
        let mut entries = self.for_classroom(classroom_id);
        entries.sort_by_key(|tx| tx.created_at);

        let mut wtr = csv::Writer::from_writer(writer);
        for tx in &entries {
            wtr.serialize(LedgerRow {
                date: tx.created_at.to_rfc3339(),
                classroom_id: &tx.classroom_id,
                student_id: tx.student_id.as_deref().unwrap_or(""),
                kind: tx.kind.as_str(),
                amount: tx.amount,
                description: &tx.description,
            })?;
        }
        wtr.flush()?;
        Ok(entries.len())
    }
}
