// 🎲 Market pricing - periodic random walk and news impact
//
// Prices move only here. Each tick draws a uniform move in
// [−volatility, +volatility] per stock; news applies a fixed percent move.
// Prices are rounded to cents and never fall below the floor.

use crate::entities::Stock;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_STOCK_PRICE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub stock_id: String,
    pub symbol: String,
    pub old_price: f64,
    pub new_price: f64,
}

impl PriceChange {
    pub fn change_percent(&self) -> f64 {
        (self.new_price - self.old_price) / self.old_price * 100.0
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply a fractional move (0.05 = +5%) and clamp to the floor
pub fn next_price(price: f64, fraction: f64, min_price: f64) -> f64 {
    round_cents(price * (1.0 + fraction)).max(min_price)
}

/// Draw a move for one tick
pub fn random_move<R: Rng + ?Sized>(rng: &mut R, volatility: f64) -> f64 {
    let v = volatility.clamp(0.0, 1.0);
    rng.gen_range(-v..=v)
}

fn reprice(stock: &mut Stock, fraction: f64, min_price: f64) -> PriceChange {
    let old_price = stock.price;
    let new_price = next_price(old_price, fraction, min_price);
    stock.reprice(new_price);

    PriceChange {
        stock_id: stock.id.clone(),
        symbol: stock.symbol.clone(),
        old_price,
        new_price,
    }
}

/// Randomize every stock once
pub fn tick<'a, R, I>(stocks: I, rng: &mut R, min_price: f64) -> Vec<PriceChange>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a mut Stock>,
{
    stocks
        .into_iter()
        .map(|stock| {
            let fraction = random_move(rng, stock.volatility);
            reprice(stock, fraction, min_price)
        })
        .collect()
}

/// Move one stock by a signed percent (news impact)
pub fn apply_impact(stock: &mut Stock, impact_percent: f64, min_price: f64) -> PriceChange {
    reprice(stock, impact_percent / 100.0, min_price)
}
