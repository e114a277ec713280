// 💹 Trade execution math
//
// Buy:  total = price × qty × (1 + fee_rate), needs that much cash
// Sell: total = price × qty × (1 − fee_rate), needs qty shares held
//
// Average cost is the quantity-weighted execution price, fees excluded.

use crate::entities::{StockPortfolio, TradeSide};
use crate::error::{EconomyError, Result};
use serde::{Deserialize, Serialize};

/// Flat 1% fee on every trade
pub const DEFAULT_FEE_RATE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuote {
    pub side: TradeSide,
    pub quantity: u32,
    pub price: f64,
    /// price × quantity
    pub gross: f64,
    pub fee: f64,
    /// Cash the student pays (buy) or receives (sell)
    pub total: f64,
}

pub fn quote(side: TradeSide, price: f64, quantity: u32, fee_rate: f64) -> Result<TradeQuote> {
    if quantity == 0 {
        return Err(EconomyError::InvalidAmount(
            "quantity must be at least 1".to_string(),
        ));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(EconomyError::InvalidAmount(format!(
            "price must be positive, got {}",
            price
        )));
    }

    let gross = price * quantity as f64;
    let fee = gross * fee_rate;
    let total = match side {
        TradeSide::Buy => gross + fee,
        TradeSide::Sell => gross - fee,
    };

    Ok(TradeQuote {
        side,
        quantity,
        price,
        gross,
        fee,
        total,
    })
}

/// Fold a purchase into a holding, updating the weighted average cost.
/// The row is untouched when the new share count would overflow.
pub fn apply_buy(row: &mut StockPortfolio, quantity: u32, price: f64) -> Result<()> {
    let new_quantity = row.quantity.checked_add(quantity).ok_or_else(|| {
        EconomyError::InvalidAmount(format!(
            "holding of {} shares cannot grow by {}",
            row.quantity, quantity
        ))
    })?;
    let held = row.quantity as f64;
    let bought = quantity as f64;

    row.average_cost = (held * row.average_cost + bought * price) / new_quantity as f64;
    row.quantity = new_quantity;
    Ok(())
}

/// Remove shares from a holding; returns realized profit against average cost.
/// Average cost is unchanged by a partial sell and reset when the row empties.
pub fn apply_sell(row: &mut StockPortfolio, quantity: u32, price: f64) -> Result<f64> {
    if quantity > row.quantity {
        return Err(EconomyError::InsufficientShares {
            requested: quantity,
            held: row.quantity,
        });
    }

    let realized = (price - row.average_cost) * quantity as f64;

    row.quantity -= quantity;
    if row.quantity == 0 {
        row.average_cost = 0.0;
    }
    Ok(realized)
}
