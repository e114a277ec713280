// 📊 Stock Store - listings, trades and per-student holdings
//
// Three collections: stocks, portfolios (one row per student+stock) and the
// trade history. Trades validate cash/shares first, then persist each slice.

use super::{keys, Collection, LedgerStore, StudentStore};
use crate::entities::{
    MarketNews, Stock, StockPortfolio, StockTransaction, TradeSide, TransactionKind,
};
use crate::error::{EconomyError, Result};
use crate::pricing::{self, PriceChange};
use crate::schema::{Validate, ValidationError};
use crate::storage::Storage;
use crate::trading;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

pub struct StockStore<'a> {
    stocks: Collection<'a, Stock>,
    portfolios: Collection<'a, StockPortfolio>,
    transactions: Collection<'a, StockTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReceipt {
    pub transaction: StockTransaction,
    /// Holding after the trade (quantity 0 once fully sold)
    pub portfolio: StockPortfolio,
    pub balance_after: f64,
}

/// A portfolio row joined with its current price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub stock_id: String,
    pub symbol: String,
    pub quantity: u32,
    pub average_cost: f64,
    pub price: f64,
    pub market_value: f64,
    pub unrealized_profit: f64,
}

impl<'a> StockStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(StockStore {
            stocks: Collection::load(storage, keys::STOCKS)?,
            portfolios: Collection::load(storage, keys::STOCK_PORTFOLIOS)?,
            transactions: Collection::load(storage, keys::STOCK_TRANSACTIONS)?,
        })
    }

    // ========================================================================
    // LISTINGS
    // ========================================================================

    pub fn list(&self, classroom_id: &str) -> Vec<Stock> {
        self.stocks.filter(|s| s.classroom_id == classroom_id)
    }

    pub fn get(&self, id: &str) -> Option<&Stock> {
        self.stocks.get(id)
    }

    pub fn require(&self, id: &str) -> Result<&Stock> {
        self.stocks.require(id)
    }

    pub fn find_by_symbol(&self, classroom_id: &str, symbol: &str) -> Option<&Stock> {
        let symbol = symbol.trim().to_uppercase();
        self.stocks
            .all()
            .iter()
            .find(|s| s.classroom_id == classroom_id && s.symbol == symbol)
    }

    /// List a new stock; symbols are unique per classroom
    pub fn add_stock(&mut self, classroom_id: &str, symbol: &str, name: &str, price: f64) -> Result<Stock> {
        let stock = Stock::new(classroom_id, symbol, name, price)?;
        if self.find_by_symbol(classroom_id, &stock.symbol).is_some() {
            return Err(EconomyError::Validation(vec![ValidationError::new(
                "Stock",
                "symbol",
                format!("{} is already listed in this classroom", stock.symbol),
            )]));
        }
        self.stocks.insert(stock.clone())?;
        info!(id = %stock.id, symbol = %stock.symbol, price, "stock listed");
        Ok(stock)
    }

    /// Remove the listing. Holdings in it stay behind and are skipped by valuations.
    pub fn delist(&mut self, id: &str) -> Result<Stock> {
        let stock = self.stocks.remove(id)?;
        info!(id, symbol = %stock.symbol, "stock delisted");
        Ok(stock)
    }

    /// Largest fraction a tick may move this stock's price (0.0 to 1.0)
    pub fn set_volatility(&mut self, id: &str, volatility: f64) -> Result<Stock> {
        self.stocks.update(id, |stock| {
            let next = stock.clone().with_volatility(volatility);
            next.ensure_valid()?;
            *stock = next;
            Ok(())
        })
    }

    // ========================================================================
    // TRADING
    // ========================================================================

    fn holding_row(&self, student_id: &str, stock_id: &str) -> Option<&StockPortfolio> {
        self.portfolios
            .all()
            .iter()
            .find(|p| p.student_id == student_id && p.stock_id == stock_id)
    }

    pub fn buy(
        &mut self,
        student_id: &str,
        stock_id: &str,
        quantity: u32,
        fee_rate: f64,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<TradeReceipt> {
        let student = students.require(student_id)?.clone();
        let stock = self.stocks.require(stock_id)?.clone();
        EconomyError::ensure_same_classroom("Stock", stock_id, &stock.classroom_id, &student.classroom_id)?;
        let quote = trading::quote(TradeSide::Buy, stock.price, quantity, fee_rate)?;

        if !student.can_afford(quote.total) {
            return Err(EconomyError::InsufficientFunds {
                needed: quote.total,
                available: student.balance,
            });
        }

        let existing = self.holding_row(student_id, stock_id).cloned();
        let mut row = existing
            .clone()
            .unwrap_or_else(|| StockPortfolio::empty(student_id, stock_id));
        trading::apply_buy(&mut row, quantity, stock.price)?;

        let after = students.debit(student_id, quote.total)?;
        match existing {
            Some(_) => self.portfolios.replace(row.clone())?,
            None => self.portfolios.insert(row.clone())?,
        }

        let transaction = StockTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            stock_id: stock_id.to_string(),
            side: TradeSide::Buy,
            quantity,
            price: stock.price,
            fee: quote.fee,
            total: quote.total,
            realized_profit: None,
            created_at: Utc::now(),
        };
        self.transactions.insert(transaction.clone())?;

        ledger.record(
            &student.classroom_id,
            Some(student_id),
            TransactionKind::StockBuy,
            -quote.total,
            format!("Bought {} {} @ {:.2}", quantity, stock.symbol, stock.price),
        )?;

        info!(student_id, symbol = %stock.symbol, quantity, total = quote.total, "stock bought");
        Ok(TradeReceipt {
            transaction,
            portfolio: row,
            balance_after: after.balance,
        })
    }

    pub fn sell(
        &mut self,
        student_id: &str,
        stock_id: &str,
        quantity: u32,
        fee_rate: f64,
        students: &mut StudentStore,
        ledger: &mut LedgerStore,
    ) -> Result<TradeReceipt> {
        let student = students.require(student_id)?.clone();
        let stock = self.stocks.require(stock_id)?.clone();
        EconomyError::ensure_same_classroom("Stock", stock_id, &stock.classroom_id, &student.classroom_id)?;
        let quote = trading::quote(TradeSide::Sell, stock.price, quantity, fee_rate)?;

        let mut row = self
            .holding_row(student_id, stock_id)
            .cloned()
            .ok_or(EconomyError::InsufficientShares {
                requested: quantity,
                held: 0,
            })?;
        let realized = trading::apply_sell(&mut row, quantity, stock.price)?;

        let after = if quote.total > 0.0 {
            students.credit(student_id, quote.total)?
        } else {
            student.clone()
        };

        if row.quantity == 0 {
            self.portfolios.remove(&row.id)?;
        } else {
            self.portfolios.replace(row.clone())?;
        }

        let transaction = StockTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            stock_id: stock_id.to_string(),
            side: TradeSide::Sell,
            quantity,
            price: stock.price,
            fee: quote.fee,
            total: quote.total,
            realized_profit: Some(realized),
            created_at: Utc::now(),
        };
        self.transactions.insert(transaction.clone())?;

        ledger.record(
            &student.classroom_id,
            Some(student_id),
            TransactionKind::StockSell,
            quote.total,
            format!("Sold {} {} @ {:.2}", quantity, stock.symbol, stock.price),
        )?;

        info!(student_id, symbol = %stock.symbol, quantity, total = quote.total, "stock sold");
        Ok(TradeReceipt {
            transaction,
            portfolio: row,
            balance_after: after.balance,
        })
    }

    // ========================================================================
    // PORTFOLIO QUERIES
    // ========================================================================

    pub fn portfolio(&self, student_id: &str) -> Vec<StockPortfolio> {
        self.portfolios.filter(|p| p.student_id == student_id)
    }

    /// Holdings priced at current market; rows for delisted stocks are skipped
    pub fn holdings(&self, student_id: &str) -> Vec<Holding> {
        self.portfolios
            .all()
            .iter()
            .filter(|p| p.student_id == student_id)
            .filter_map(|p| {
                let stock = self.stocks.get(&p.stock_id)?;
                Some(Holding {
                    stock_id: stock.id.clone(),
                    symbol: stock.symbol.clone(),
                    quantity: p.quantity,
                    average_cost: p.average_cost,
                    price: stock.price,
                    market_value: p.market_value(stock.price),
                    unrealized_profit: p.unrealized_profit(stock.price),
                })
            })
            .collect()
    }

    pub fn portfolio_value(&self, student_id: &str) -> f64 {
        self.holdings(student_id).iter().map(|h| h.market_value).sum()
    }

    pub fn trades_for_student(&self, student_id: &str) -> Vec<StockTransaction> {
        self.transactions.filter(|t| t.student_id == student_id)
    }

    // ========================================================================
    // PRICE MOVES
    // ========================================================================

    /// Random-walk every stock in the classroom once
    pub fn tick<R: Rng + ?Sized>(&mut self, classroom_id: &str, rng: &mut R, min_price: f64) -> Result<Vec<PriceChange>> {
        let mut all = self.stocks.all().to_vec();
        let changes = pricing::tick(
            all.iter_mut().filter(|s| s.classroom_id == classroom_id),
            rng,
            min_price,
        );
        self.stocks.replace_all(all)?;
        Ok(changes)
    }

    /// Apply a headline's impact to its stock, or to the whole classroom
    pub fn apply_news(&mut self, news: &MarketNews, min_price: f64) -> Result<Vec<PriceChange>> {
        if let Some(stock_id) = news.stock_id.as_deref() {
            self.stocks.require(stock_id)?;
        }

        let mut all = self.stocks.all().to_vec();
        let changes: Vec<PriceChange> = all
            .iter_mut()
            .filter(|s| s.classroom_id == news.classroom_id)
            .filter(|s| news.stock_id.as_deref().map_or(true, |id| id == s.id))
            .map(|s| pricing::apply_impact(s, news.impact_percent, min_price))
            .collect();
        self.stocks.replace_all(all)?;
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::MIN_STOCK_PRICE;
    use crate::trading::DEFAULT_FEE_RATE;

    struct Fixture<'a> {
        stocks: StockStore<'a>,
        students: StudentStore<'a>,
        ledger: LedgerStore<'a>,
        student_id: String,
        stock_id: String,
    }

    fn fixture(storage: &Storage, balance: f64) -> Fixture<'_> {
        let mut stocks = StockStore::load(storage).unwrap();
        let mut students = StudentStore::load(storage).unwrap();
        let ledger = LedgerStore::load(storage).unwrap();

        let student = students.add("c1", "Jae", "01", balance).unwrap();
        let stock = stocks.add_stock("c1", "LEMN", "Lemonade Co", 10.0).unwrap();

        Fixture {
            stocks,
            students,
            ledger,
            student_id: student.id,
            stock_id: stock.id,
        }
    }

    #[test]
    fn test_buy_deducts_cost_plus_fee() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 200.0);

        let receipt = f
            .stocks
            .buy(&f.student_id, &f.stock_id, 10, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap();

        assert!((receipt.transaction.fee - 1.0).abs() < 1e-9);
        assert!((receipt.balance_after - 99.0).abs() < 1e-9);
        assert_eq!(receipt.portfolio.quantity, 10);
        assert_eq!(f.stocks.portfolio_value(&f.student_id), 100.0);
        assert_eq!(f.ledger.for_student(&f.student_id).len(), 1);
    }

    #[test]
    fn test_buy_without_cash_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 100.0);

        // 10 shares cost 100 + 1 fee
        let err = f
            .stocks
            .buy(&f.student_id, &f.stock_id, 10, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap_err();

        assert!(matches!(err, EconomyError::InsufficientFunds { .. }));
        assert_eq!(f.students.require(&f.student_id).unwrap().balance, 100.0);
        assert!(f.stocks.portfolio(&f.student_id).is_empty());
    }

    #[test]
    fn test_buy_past_share_limit_moves_no_cash() {
        let storage = Storage::open_in_memory().unwrap();
        let mut stocks = StockStore::load(&storage).unwrap();
        let mut students = StudentStore::load(&storage).unwrap();
        let mut ledger = LedgerStore::load(&storage).unwrap();

        let s = students.add("c1", "Jae", "01", 1e10).unwrap();
        let penny = stocks.add_stock("c1", "PENY", "Penny Co", 1.0).unwrap();

        stocks
            .buy(&s.id, &penny.id, u32::MAX, DEFAULT_FEE_RATE, &mut students, &mut ledger)
            .unwrap();
        let balance = students.require(&s.id).unwrap().balance;

        let err = stocks
            .buy(&s.id, &penny.id, 1, DEFAULT_FEE_RATE, &mut students, &mut ledger)
            .unwrap_err();

        assert!(matches!(err, EconomyError::InvalidAmount(_)));
        assert_eq!(students.require(&s.id).unwrap().balance, balance);
        assert_eq!(stocks.portfolio(&s.id)[0].quantity, u32::MAX);
        assert_eq!(stocks.trades_for_student(&s.id).len(), 1);
    }

    #[test]
    fn test_other_classroom_stock_not_tradeable() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 200.0);
        let foreign = f.stocks.add_stock("c2", "GLUE", "Glue Works", 10.0).unwrap();

        let err = f
            .stocks
            .buy(&f.student_id, &foreign.id, 1, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap_err();
        assert!(matches!(err, EconomyError::ClassroomMismatch { entity: "Stock", .. }));

        let err = f
            .stocks
            .sell(&f.student_id, &foreign.id, 1, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap_err();
        assert!(matches!(err, EconomyError::ClassroomMismatch { .. }));
        assert_eq!(f.students.require(&f.student_id).unwrap().balance, 200.0);
    }

    #[test]
    fn test_sell_more_than_held_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 200.0);

        f.stocks
            .buy(&f.student_id, &f.stock_id, 5, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap();
        let balance = f.students.require(&f.student_id).unwrap().balance;

        let err = f
            .stocks
            .sell(&f.student_id, &f.stock_id, 6, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap_err();

        assert!(matches!(
            err,
            EconomyError::InsufficientShares { requested: 6, held: 5 }
        ));
        assert_eq!(f.students.require(&f.student_id).unwrap().balance, balance);
        assert_eq!(f.stocks.portfolio(&f.student_id)[0].quantity, 5);
    }

    #[test]
    fn test_sell_without_holding_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 200.0);

        let err = f
            .stocks
            .sell(&f.student_id, &f.stock_id, 1, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap_err();
        assert!(matches!(err, EconomyError::InsufficientShares { held: 0, .. }));
    }

    #[test]
    fn test_full_sell_removes_row() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 200.0);

        f.stocks
            .buy(&f.student_id, &f.stock_id, 5, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap();
        let receipt = f
            .stocks
            .sell(&f.student_id, &f.stock_id, 5, DEFAULT_FEE_RATE, &mut f.students, &mut f.ledger)
            .unwrap();

        // 200 − 50.5 + 49.5
        assert!((receipt.balance_after - 199.0).abs() < 1e-9);
        assert_eq!(receipt.transaction.realized_profit, Some(0.0));
        assert!(f.stocks.portfolio(&f.student_id).is_empty());
        assert_eq!(f.stocks.trades_for_student(&f.student_id).len(), 2);
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 0.0);

        assert!(f.stocks.add_stock("c1", "lemn", "Copycat", 5.0).is_err());
        assert!(f.stocks.add_stock("c2", "LEMN", "Other class", 5.0).is_ok());
    }

    #[test]
    fn test_volatility_override_and_delist() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 0.0);

        f.stocks.set_volatility(&f.stock_id, 0.25).unwrap();
        let err = f.stocks.set_volatility(&f.stock_id, 1.5).unwrap_err();
        assert!(matches!(err, EconomyError::Validation(_)));

        let reloaded = StockStore::load(&storage).unwrap();
        assert_eq!(reloaded.require(&f.stock_id).unwrap().volatility, 0.25);

        f.stocks.delist(&f.stock_id).unwrap();
        assert!(f.stocks.list("c1").is_empty());
        assert!(matches!(
            f.stocks.delist(&f.stock_id),
            Err(EconomyError::NotFound { .. })
        ));
    }

    #[test]
    fn test_news_moves_only_target_stock() {
        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 0.0);
        let other = f.stocks.add_stock("c1", "PENC", "Pencil Inc", 20.0).unwrap();

        let news = MarketNews::new("c1", "Lemon shortage", "", Some(&f.stock_id), 20.0).unwrap();
        let changes = f.stocks.apply_news(&news, MIN_STOCK_PRICE).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(f.stocks.require(&f.stock_id).unwrap().price, 12.0);
        assert_eq!(f.stocks.require(&other.id).unwrap().price, 20.0);
    }

    #[test]
    fn test_tick_persists_prices() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let storage = Storage::open_in_memory().unwrap();
        let mut f = fixture(&storage, 0.0);

        let changes = f
            .stocks
            .tick("c1", &mut StdRng::seed_from_u64(3), MIN_STOCK_PRICE)
            .unwrap();

        let reloaded = StockStore::load(&storage).unwrap();
        assert_eq!(reloaded.require(&f.stock_id).unwrap().price, changes[0].new_price);
        assert_eq!(reloaded.require(&f.stock_id).unwrap().previous_price, 10.0);
    }
}
