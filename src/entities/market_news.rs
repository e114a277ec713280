// 📰 Market News - headlines that move simulated stock prices

use crate::error::Result;
use crate::schema::{Checker, Validate, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest move a single headline may cause, in percent
pub const MAX_NEWS_IMPACT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketNews {
    pub id: String,
    pub classroom_id: String,
    pub headline: String,
    #[serde(default)]
    pub body: String,
    /// Target stock; None moves every stock in the classroom
    #[serde(default)]
    pub stock_id: Option<String>,
    /// Signed price move in percent
    pub impact_percent: f64,
    pub created_at: DateTime<Utc>,
}

impl MarketNews {
    pub fn new(
        classroom_id: &str,
        headline: &str,
        body: &str,
        stock_id: Option<&str>,
        impact_percent: f64,
    ) -> Result<Self> {
        let news = MarketNews {
            id: uuid::Uuid::new_v4().to_string(),
            classroom_id: classroom_id.to_string(),
            headline: headline.trim().to_string(),
            body: body.to_string(),
            stock_id: stock_id.map(str::to_string),
            impact_percent,
            created_at: Utc::now(),
        };
        news.ensure_valid()?;
        Ok(news)
    }

    pub fn is_market_wide(&self) -> bool {
        self.stock_id.is_none()
    }
}

impl Validate for MarketNews {
    fn validate(&self) -> ValidationResult {
        Checker::new("MarketNews")
            .required("id", &self.id)
            .required("classroomId", &self.classroom_id)
            .required("headline", &self.headline)
            .in_range(
                "impactPercent",
                self.impact_percent,
                -MAX_NEWS_IMPACT,
                MAX_NEWS_IMPACT,
            )
            .finish()
    }
}
