// 📊 Stock Entities - simulated listings, trades and holdings

use crate::error::Result;
use crate::schema::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default maximum move per market tick (5%)
pub const DEFAULT_VOLATILITY: f64 = 0.05;

// ============================================================================
// STOCK
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: String,
    pub classroom_id: String,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub previous_price: f64,
    /// Maximum fractional move per tick, 0.0 - 1.0
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    pub updated_at: DateTime<Utc>,
}

fn default_volatility() -> f64 {
    DEFAULT_VOLATILITY
}

impl Stock {
    pub fn new(classroom_id: &str, symbol: &str, name: &str, price: f64) -> Result<Self> {
        let stock = Stock {
            id: uuid::Uuid::new_v4().to_string(),
            classroom_id: classroom_id.to_string(),
            symbol: symbol.trim().to_uppercase(),
            name: name.trim().to_string(),
            price,
            previous_price: price,
            volatility: DEFAULT_VOLATILITY,
            updated_at: Utc::now(),
        };
        stock.ensure_valid()?;
        Ok(stock)
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Move to a new price, remembering the old one
    pub fn reprice(&mut self, new_price: f64) {
        self.previous_price = self.price;
        self.price = new_price;
        self.updated_at = Utc::now();
    }

    /// Percent change since the last reprice
    pub fn change_percent(&self) -> f64 {
        if self.previous_price <= 0.0 {
            return 0.0;
        }
        (self.price - self.previous_price) / self.previous_price * 100.0
    }
}

impl Validate for Stock {
    fn validate(&self) -> ValidationResult {
        Checker::new("Stock")
            .required("id", &self.id)
            .required("classroomId", &self.classroom_id)
            .required("symbol", &self.symbol)
            .positive("price", self.price)
            .in_range("volatility", self.volatility, 0.0, 1.0)
            .finish()
    }
}

// ============================================================================
// STOCK TRANSACTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "Buy",
            TradeSide::Sell => "Sell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: String,
    pub student_id: String,
    pub stock_id: String,
    pub side: TradeSide,
    pub quantity: u32,
    /// Execution price per share
    pub price: f64,
    pub fee: f64,
    /// Cash moved: cost + fee for buys, proceeds − fee for sells
    pub total: f64,
    /// Gain against average cost (sells only)
    #[serde(default)]
    pub realized_profit: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Validate for StockTransaction {
    fn validate(&self) -> ValidationResult {
        Checker::new("StockTransaction")
            .required("id", &self.id)
            .required("studentId", &self.student_id)
            .required("stockId", &self.stock_id)
            .check("quantity", self.quantity >= 1, "Must be at least 1")
            .positive("price", self.price)
            .non_negative("fee", self.fee)
            .finish()
    }
}

// ============================================================================
// STOCK PORTFOLIO
// ============================================================================

/// One row per (student, stock) holding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPortfolio {
    pub id: String,
    pub student_id: String,
    pub stock_id: String,
    pub quantity: u32,
    pub average_cost: f64,
}

impl StockPortfolio {
    pub fn empty(student_id: &str, stock_id: &str) -> Self {
        StockPortfolio {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student_id.to_string(),
            stock_id: stock_id.to_string(),
            quantity: 0,
            average_cost: 0.0,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_profit(&self, price: f64) -> f64 {
        (price - self.average_cost) * self.quantity as f64
    }
}

impl Validate for StockPortfolio {
    fn validate(&self) -> ValidationResult {
        Checker::new("StockPortfolio")
            .required("id", &self.id)
            .required("studentId", &self.student_id)
            .required("stockId", &self.stock_id)
            .non_negative("averageCost", self.average_cost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_symbol_normalized() {
        let stock = Stock::new("c1", " lemn ", "Lemonade Co", 10.0).unwrap();
        assert_eq!(stock.symbol, "LEMN");
        assert_eq!(stock.previous_price, 10.0);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(Stock::new("c1", "LEMN", "Lemonade Co", 0.0).is_err());
    }

    #[test]
    fn test_reprice_tracks_change() {
        let mut stock = Stock::new("c1", "LEMN", "Lemonade Co", 10.0).unwrap();
        stock.reprice(11.0);

        assert_eq!(stock.previous_price, 10.0);
        assert!((stock.change_percent() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_range() {
        let stock = Stock::new("c1", "LEMN", "Lemonade Co", 10.0)
            .unwrap()
            .with_volatility(1.5);
        assert!(stock.validate().is_err());
    }

    #[test]
    fn test_portfolio_valuation() {
        let mut row = StockPortfolio::empty("s1", "k1");
        row.quantity = 4;
        row.average_cost = 10.0;

        assert_eq!(row.market_value(12.0), 48.0);
        assert_eq!(row.unrealized_profit(12.0), 8.0);
    }
}
