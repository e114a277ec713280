// VivaaTown - Core Library
// Classroom economy: jobs, payroll, savings, a toy stock market and
// achievements. Exposes all modules for use in the CLI, API server, and tests.

pub mod config;
pub mod credit;         // Credit grades and rate adjustment
pub mod entities;
pub mod error;
pub mod interest;       // Simple interest and early withdrawal
pub mod logging;
pub mod migration;      // One-time copy of legacy storage keys
pub mod pricing;        // Random price moves and news impact
pub mod schema;
pub mod storage;
pub mod stores;
pub mod trading;        // Fee and average-cost math

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{EconomyConfig, ServerArgs, StorageArgs};
pub use credit::CreditGrade;
pub use entities::{
    Achievement, Classroom, Job, MarketNews, SavingsAccount, SavingsKind, SavingsProduct,
    SavingsStatus, Stock, StockPortfolio, StockTransaction, Student, StudentAchievement,
    TradeSide, Transaction, TransactionKind,
};
pub use error::{EconomyError, Result};
pub use interest::{InterestQuote, Settlement};
pub use migration::{migrate_legacy, MigrationReport};
pub use pricing::PriceChange;
pub use schema::{Validate, ValidationError, ValidationResult};
pub use storage::Storage;
pub use stores::{
    AchievementStore, BankAdminStore, ClassroomStore, ClassroomSummary, Holding, JobStore,
    LedgerStore, MarketStore, PayrollReport, RosterImport, SavingsStore, StockStore,
    StudentStore, TradeReceipt, Town,
};
pub use trading::TradeQuote;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
