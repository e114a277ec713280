// Entity Models
//
// Flat records related by string IDs only. Each entity:
// - has a stable UUID identity
// - declares its invariants through `Validate`
// - serialises as camelCase JSON into the key/value store

pub mod classroom;
pub mod student;
pub mod job;
pub mod savings;
pub mod stock;
pub mod achievement;
pub mod market_news;
pub mod transaction;

pub use classroom::Classroom;
pub use student::Student;
pub use job::Job;
pub use savings::{SavingsAccount, SavingsKind, SavingsProduct, SavingsStatus};
pub use stock::{Stock, StockPortfolio, StockTransaction, TradeSide};
pub use achievement::{Achievement, StudentAchievement};
pub use market_news::MarketNews;
pub use transaction::{Transaction, TransactionKind};
