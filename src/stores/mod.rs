// Domain Stores
//
// One store per domain, each owning fixed keys in `Storage`. A store loads
// its collection on construction, mutates records by whole-object
// replacement and re-persists the entire collection after every change.
// Stores never coordinate: an operation spanning several stores validates
// first, then persists store by store.

pub mod achievement;
pub mod bank_admin;
pub mod classroom;
pub mod job;
pub mod ledger;
pub mod market;
pub mod savings;
pub mod stock;
pub mod student;

pub use achievement::AchievementStore;
pub use bank_admin::{BankAdminStore, ClassroomSummary};
pub use classroom::ClassroomStore;
pub use job::{JobStore, PayrollReport};
pub use ledger::LedgerStore;
pub use market::MarketStore;
pub use savings::SavingsStore;
pub use stock::{Holding, StockStore, TradeReceipt};
pub use student::{RosterImport, StudentStore};

use crate::config::EconomyConfig;
use crate::entities::{
    Achievement, Classroom, Job, MarketNews, SavingsAccount, SavingsProduct, Stock,
    StockPortfolio, StockTransaction, Student, StudentAchievement, Transaction,
};
use crate::error::{EconomyError, Result};
use crate::schema::Validate;
use crate::storage::Storage;
use serde::de::DeserializeOwned;
use serde::Serialize;

// ============================================================================
// STORAGE KEYS
// ============================================================================

pub mod keys {
    pub const CLASSROOMS: &str = "vivaatown:classrooms";
    pub const STUDENTS: &str = "vivaatown:students";
    pub const JOBS: &str = "vivaatown:jobs";
    pub const STOCKS: &str = "vivaatown:stocks";
    pub const STOCK_TRANSACTIONS: &str = "vivaatown:stock-transactions";
    pub const STOCK_PORTFOLIOS: &str = "vivaatown:stock-portfolios";
    pub const SAVINGS_PRODUCTS: &str = "vivaatown:savings-products";
    pub const SAVINGS_ACCOUNTS: &str = "vivaatown:savings-accounts";
    pub const ACHIEVEMENTS: &str = "vivaatown:achievements";
    pub const STUDENT_ACHIEVEMENTS: &str = "vivaatown:student-achievements";
    pub const MARKET_NEWS: &str = "vivaatown:market-news";
    pub const TRANSACTIONS: &str = "vivaatown:transactions";
}

// ============================================================================
// RECORD TRAIT
// ============================================================================

pub trait Record: Serialize + DeserializeOwned + Validate + Clone {
    /// Entity name used in errors and logs
    const ENTITY: &'static str;

    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Record for $ty {
                const ENTITY: &'static str = $name;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_record! {
    Classroom => "Classroom",
    Student => "Student",
    Job => "Job",
    Stock => "Stock",
    StockTransaction => "StockTransaction",
    StockPortfolio => "StockPortfolio",
    SavingsProduct => "SavingsProduct",
    SavingsAccount => "SavingsAccount",
    Achievement => "Achievement",
    StudentAchievement => "StudentAchievement",
    MarketNews => "MarketNews",
    Transaction => "Transaction",
}

// ============================================================================
// COLLECTION
// ============================================================================

/// An in-memory array mirrored to one storage key
pub struct Collection<'a, T: Record> {
    storage: &'a Storage,
    key: &'static str,
    items: Vec<T>,
}

impl<'a, T: Record> Collection<'a, T> {
    pub fn load(storage: &'a Storage, key: &'static str) -> Result<Self> {
        let items = storage.load_collection(key)?;
        Ok(Collection {
            storage,
            key,
            items,
        })
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Like `get`, but a missing record is an error
    pub fn require(&self, id: &str) -> Result<&T> {
        self.get(id).ok_or_else(|| EconomyError::not_found(T::ENTITY, id))
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.iter().filter(|item| predicate(item)).cloned().collect()
    }

    pub fn insert(&mut self, item: T) -> Result<()> {
        item.ensure_valid()?;
        self.items.push(item);
        self.persist()
    }

    /// Replace the record with the same id
    pub fn replace(&mut self, item: T) -> Result<()> {
        let slot = self
            .items
            .iter_mut()
            .find(|existing| existing.id() == item.id())
            .ok_or_else(|| EconomyError::not_found(T::ENTITY, item.id()))?;
        *slot = item;
        self.persist()
    }

    /// Clone, edit, and replace a record; returns the new value
    pub fn update<F>(&mut self, id: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let mut next = self.require(id)?.clone();
        edit(&mut next)?;
        self.replace(next.clone())?;
        Ok(next)
    }

    pub fn remove(&mut self, id: &str) -> Result<T> {
        let index = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| EconomyError::not_found(T::ENTITY, id))?;
        let removed = self.items.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Replace the whole collection at once
    pub fn replace_all(&mut self, items: Vec<T>) -> Result<()> {
        self.items = items;
        self.persist()
    }

    pub fn persist(&self) -> Result<()> {
        self.storage.save_collection(self.key, &self.items)
    }
}

// ============================================================================
// TOWN
// ============================================================================

/// Every store loaded from one `Storage`, plus the economy settings.
///
/// Fields are public so cross-store operations can borrow them disjointly:
/// `town.stocks.buy(&mut town.students, &mut town.ledger, ..)`.
pub struct Town<'a> {
    pub config: EconomyConfig,
    pub classrooms: ClassroomStore<'a>,
    pub students: StudentStore<'a>,
    pub jobs: JobStore<'a>,
    pub stocks: StockStore<'a>,
    pub savings: SavingsStore<'a>,
    pub achievements: AchievementStore<'a>,
    pub market: MarketStore<'a>,
    pub bank: BankAdminStore<'a>,
    pub ledger: LedgerStore<'a>,
}

impl<'a> Town<'a> {
    pub fn load(storage: &'a Storage, config: EconomyConfig) -> Result<Self> {
        Ok(Town {
            classrooms: ClassroomStore::load(storage)?,
            students: StudentStore::load(storage)?,
            jobs: JobStore::load(storage)?,
            stocks: StockStore::load(storage)?,
            savings: SavingsStore::load(storage)?,
            achievements: AchievementStore::load(storage)?,
            market: MarketStore::load(storage)?,
            bank: BankAdminStore::load(storage)?,
            ledger: LedgerStore::load(storage)?,
            config,
        })
    }

    pub fn summary(&self, classroom_id: &str, as_of: chrono::NaiveDate) -> Result<ClassroomSummary> {
        bank_admin::summarize(
            &self.classrooms,
            &self.students,
            &self.savings,
            &self.stocks,
            classroom_id,
            as_of,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_crud() {
        let storage = Storage::open_in_memory().unwrap();
        let mut col: Collection<Classroom> = Collection::load(&storage, keys::CLASSROOMS).unwrap();

        let room = Classroom::new("Room 1", "Kim", 10.0).unwrap();
        col.insert(room.clone()).unwrap();

        let updated = col
            .update(&room.id, |c| {
                c.name = "Room 1A".to_string();
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.name, "Room 1A");

        // Persisted: a fresh load sees the update
        let reloaded: Collection<Classroom> = Collection::load(&storage, keys::CLASSROOMS).unwrap();
        assert_eq!(reloaded.require(&room.id).unwrap().name, "Room 1A");

        col.remove(&room.id).unwrap();
        assert!(col.is_empty());
        assert!(matches!(
            col.remove(&room.id),
            Err(EconomyError::NotFound { entity: "Classroom", .. })
        ));
    }

    #[test]
    fn test_insert_rejects_invalid_record() {
        let storage = Storage::open_in_memory().unwrap();
        let mut col: Collection<Classroom> = Collection::load(&storage, keys::CLASSROOMS).unwrap();

        let mut room = Classroom::new("Room 1", "Kim", 10.0).unwrap();
        room.treasury = -1.0;

        assert!(matches!(col.insert(room), Err(EconomyError::Validation(_))));
        assert_eq!(storage.get(keys::CLASSROOMS).unwrap(), None);
    }

    #[test]
    fn test_failed_update_leaves_record_untouched() {
        let storage = Storage::open_in_memory().unwrap();
        let mut col: Collection<Classroom> = Collection::load(&storage, keys::CLASSROOMS).unwrap();
        let room = Classroom::new("Room 1", "Kim", 10.0).unwrap();
        col.insert(room.clone()).unwrap();

        let result = col.update(&room.id, |c| {
            c.name = "changed".to_string();
            Err(EconomyError::InvalidAmount("nope".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(col.require(&room.id).unwrap().name, "Room 1");
    }
}
