use chrono::{DateTime, Utc};
use serde::Serialize;

/// Canonical line item produced by the normalizer.
///
/// `#[non_exhaustive]` keeps construction inside this crate: downstream code
/// reads items, it never assembles them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct RecommendationItem {
    pub symbol: String,
    /// Portfolio weight or model confidence, in `0..=100`. Unrounded.
    pub weight_or_confidence_percent: f64,
    pub measure: Measure,
    pub label: String,
    pub rationale: String,
    pub price_info: Option<PriceInfo>,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Weight,
    Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Position,
    /// Presented apart from positions; carries no weight.
    Disclaimer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceInfo {
    pub current: Option<f64>,
    pub buy_target: Option<f64>,
    pub sell_target: Option<f64>,
    pub change_percent: Option<f64>,
}

impl PriceInfo {
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
            && self.buy_target.is_none()
            && self.sell_target.is_none()
            && self.change_percent.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketNotes {
    pub sentiment: Option<String>,
    pub volatility: Option<String>,
    pub position_size: Option<String>,
}

/// Which upstream shape a result set was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Predictions,
    Portfolio,
    LegacyAllocation,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Recommendations {
    pub source: RecommendationSource,
    pub items: Vec<RecommendationItem>,
    pub narrative: String,
    pub market: Option<MarketNotes>,
    /// Recent articles per position, in item order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub news: Vec<SymbolNews>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolNews {
    pub symbol: String,
    pub headlines: Vec<Headline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub title: String,
    pub source: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Recommendations {
    pub fn positions(&self) -> impl Iterator<Item = &RecommendationItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::Position)
    }

    pub fn disclaimers(&self) -> impl Iterator<Item = &RecommendationItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::Disclaimer)
    }

    pub fn is_available(&self) -> bool {
        self.source != RecommendationSource::Unavailable
    }
}

impl RecommendationItem {
    pub(crate) fn position(
        symbol: impl Into<String>,
        percent: f64,
        measure: Measure,
        label: impl Into<String>,
        rationale: impl Into<String>,
        price_info: Option<PriceInfo>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            weight_or_confidence_percent: clamp_percent(percent),
            measure,
            label: label.into(),
            rationale: rationale.into(),
            price_info: price_info.filter(|p| !p.is_empty()),
            kind: ItemKind::Position,
        }
    }

    pub(crate) fn disclaimer(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            symbol: String::new(),
            weight_or_confidence_percent: 0.0,
            measure: Measure::Confidence,
            label: label.into(),
            rationale: text.into(),
            price_info: None,
            kind: ItemKind::Disclaimer,
        }
    }
}

impl Recommendations {
    pub(crate) fn new(
        source: RecommendationSource,
        items: Vec<RecommendationItem>,
        narrative: impl Into<String>,
        market: Option<MarketNotes>,
    ) -> Self {
        Self {
            source,
            items,
            narrative: narrative.into(),
            market,
            news: Vec::new(),
        }
    }

    pub(crate) fn with_news(mut self, news: Vec<SymbolNews>) -> Self {
        self.news = news.into_iter().filter(|n| !n.headlines.is_empty()).collect();
        self
    }
}

fn clamp_percent(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
