// 📰 Market Store - news feed and the periodic price routine

use super::{keys, Collection, StockStore};
use crate::entities::MarketNews;
use crate::error::Result;
use crate::pricing::PriceChange;
use crate::storage::Storage;
use rand::Rng;
use tracing::info;

pub struct MarketStore<'a> {
    news: Collection<'a, MarketNews>,
}

impl<'a> MarketStore<'a> {
    pub fn load(storage: &'a Storage) -> Result<Self> {
        Ok(MarketStore {
            news: Collection::load(storage, keys::MARKET_NEWS)?,
        })
    }

    /// Publish a headline and apply its price impact
    pub fn publish(
        &mut self,
        news: MarketNews,
        stocks: &mut StockStore,
        min_price: f64,
    ) -> Result<Vec<PriceChange>> {
        let changes = stocks.apply_news(&news, min_price)?;
        info!(headline = %news.headline, impact = news.impact_percent, moved = changes.len(), "news published");
        self.news.insert(news)?;
        Ok(changes)
    }

    /// Newest first
    pub fn feed(&self, classroom_id: &str) -> Vec<MarketNews> {
        let mut items = self.news.filter(|n| n.classroom_id == classroom_id);
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    /// One round of random price movement for the classroom
    pub fn tick<R: Rng + ?Sized>(
        &self,
        classroom_id: &str,
        stocks: &mut StockStore,
        rng: &mut R,
        min_price: f64,
    ) -> Result<Vec<PriceChange>> {
        let changes = stocks.tick(classroom_id, rng, min_price)?;
        info!(classroom_id, moved = changes.len(), "market tick");
        Ok(changes)
    }
}
