//! Upstream analysis payloads.
//!
//! Upstream services do not tag their responses, so [`AnalysisPayload::detect`]
//! probes the JSON structure once and hands back a closed enum. Every later
//! branch matches on that enum instead of re-probing fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const ENVELOPE_KEY: &str = "analysis";
const LEGACY_CONTAINER_KEYS: [&str; 2] = ["allocation", "portfolio_allocation"];
const LEGACY_RATIONALE_KEYS: [&str; 5] =
    ["explanation", "rationale", "reasoning", "summary", "strategy"];
const MAX_ARTICLES_PER_SYMBOL: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPayload {
    Predictions(PredictionPayload),
    Portfolio(PortfolioPayload),
    LegacyAllocation(LegacyAllocation),
    Unavailable,
}

impl AnalysisPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisPayload::Predictions(_) => "predictions",
            AnalysisPayload::Portfolio(_) => "portfolio",
            AnalysisPayload::LegacyAllocation(_) => "legacy_allocation",
            AnalysisPayload::Unavailable => "unavailable",
        }
    }

    /// Classify a raw upstream response.
    ///
    /// Accepts either the bare analysis object or the service envelope
    /// (`{"trader_type": ..., "analysis": {...}}`). Shapes that match none of
    /// the known variants, or that match structurally but fail to decode,
    /// come back as `Unavailable`.
    pub fn detect(raw: Option<&Value>) -> Self {
        let Some(root) = raw.and_then(Value::as_object) else {
            return AnalysisPayload::Unavailable;
        };
        let body = match root.get(ENVELOPE_KEY).and_then(Value::as_object) {
            Some(inner) => inner,
            None => root,
        };

        if body.get("predictions").is_some_and(Value::is_array) {
            return decode(body, AnalysisPayload::Predictions);
        }

        if body.get("portfolio").is_some_and(Value::is_array) {
            return decode(body, AnalysisPayload::Portfolio);
        }

        if let Some(legacy) = LegacyAllocation::probe(body) {
            return AnalysisPayload::LegacyAllocation(legacy);
        }

        tracing::debug!(
            keys = ?body.keys().collect::<Vec<_>>(),
            "analysis payload matched no known shape"
        );
        AnalysisPayload::Unavailable
    }
}

fn decode<T, F>(body: &Map<String, Value>, wrap: F) -> AnalysisPayload
where
    T: for<'de> Deserialize<'de>,
    F: FnOnce(T) -> AnalysisPayload,
{
    match serde_json::from_value::<T>(Value::Object(body.clone())) {
        Ok(parsed) => wrap(parsed),
        Err(err) => {
            tracing::warn!(error = %err, "analysis payload has a known shape but failed to decode");
            AnalysisPayload::Unavailable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    #[serde(deserialize_with = "entries")]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub market_sentiment: Option<String>,
    #[serde(default)]
    pub volatility_level: Option<String>,
    #[serde(default)]
    pub recommended_position_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(alias = "symbol")]
    pub ticker: String,
    pub action: String,
    /// Missing, null or unreadable confidence reads as 0.
    #[serde(default, deserialize_with = "number_or_zero")]
    pub confidence: f64,
    #[serde(default, alias = "price")]
    pub current_price: Option<f64>,
    #[serde(default, alias = "target_buy", alias = "buy_price")]
    pub buy_target: Option<f64>,
    #[serde(default, alias = "target_sell", alias = "sell_price", alias = "target_price")]
    pub sell_target: Option<f64>,
    #[serde(default)]
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl SignalAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Some(SignalAction::Buy),
            "sell" => Some(SignalAction::Sell),
            "hold" => Some(SignalAction::Hold),
            _ => None,
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Hold => "HOLD",
        }
    }

    pub fn clause(&self) -> &'static str {
        match self {
            SignalAction::Buy => "open or add to a position",
            SignalAction::Sell => "take profits or reduce",
            SignalAction::Hold => "maintain, no action",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPayload {
    #[serde(deserialize_with = "entries")]
    pub portfolio: Vec<Holding>,
    /// Live quotes keyed by symbol. Kept raw: one malformed quote must not
    /// sink the whole payload.
    #[serde(default)]
    pub quotes: BTreeMap<String, Value>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub risk: Option<RiskSummary>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    /// Recent articles keyed by symbol, kept raw like `quotes`.
    #[serde(default)]
    pub news: BTreeMap<String, Value>,
}

impl PortfolioPayload {
    pub fn quote_for(&self, symbol: &str) -> Option<Quote> {
        let raw = self.quotes.get(symbol)?;
        let quote = serde_json::from_value::<Quote>(raw.clone()).ok()?;
        let price = quote.price.filter(|p| p.is_finite() && *p > 0.0);
        price.map(|price| Quote {
            price: Some(price),
            percent_change: quote.percent_change.filter(|p| p.is_finite()),
        })
    }

    /// Readable articles for `symbol`, newest first as upstream sent them.
    pub fn news_for(&self, symbol: &str) -> Vec<NewsArticle> {
        let Some(raw) = self.news.get(symbol).and_then(Value::as_array) else {
            return Vec::new();
        };
        raw.iter()
            .filter_map(|v| serde_json::from_value::<NewsArticle>(v.clone()).ok())
            .filter(|a| !a.headline.trim().is_empty())
            .take(MAX_ARTICLES_PER_SYMBOL)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(alias = "title")]
    pub headline: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub datetime: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(alias = "symbol")]
    pub asset: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Fraction of the portfolio, `0.0..=1.0`. Numeric strings are accepted.
    #[serde(deserialize_with = "number")]
    pub weight: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub expense_ratio: Option<f64>,
}

impl Holding {
    pub fn is_cash(&self) -> bool {
        self.asset.eq_ignore_ascii_case("cash")
    }

    /// Asset class from `notes` of the form `"equity/US"`.
    pub fn asset_class(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .and_then(|n| n.split('/').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, alias = "c", alias = "current")]
    pub price: Option<f64>,
    #[serde(default, alias = "dp", alias = "change_percent")]
    pub percent_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyAllocation {
    /// Ordered by percentage, largest first; ties by class name.
    pub buckets: Vec<AllocationBucket>,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationBucket {
    pub asset_class: String,
    pub percentage: f64,
    pub recommendations: Vec<String>,
}

impl LegacyAllocation {
    fn probe(body: &Map<String, Value>) -> Option<Self> {
        let container = LEGACY_CONTAINER_KEYS
            .iter()
            .find_map(|k| body.get(*k).and_then(Value::as_object))
            .unwrap_or(body);

        let mut buckets: Vec<AllocationBucket> = container
            .iter()
            .filter_map(|(class, v)| AllocationBucket::probe(class, v))
            .collect();
        if buckets.is_empty() {
            return None;
        }
        buckets.sort_by(|a, b| {
            b.percentage
                .total_cmp(&a.percentage)
                .then_with(|| a.asset_class.cmp(&b.asset_class))
        });

        let rationale = LEGACY_RATIONALE_KEYS.iter().find_map(|k| {
            container
                .get(*k)
                .or_else(|| body.get(*k))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        Some(Self { buckets, rationale })
    }
}

impl AllocationBucket {
    fn probe(class: &str, v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let entries = obj.get("recommendations")?.as_array()?;
        let Some(percentage) = obj.get("percentage").and_then(read_number) else {
            tracing::warn!(
                asset_class = class,
                percentage = ?obj.get("percentage"),
                "allocation bucket has no readable percentage; skipping"
            );
            return None;
        };
        let recommendations = entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            asset_class: class.to_string(),
            percentage,
            recommendations,
        })
    }
}

/// A finite number, or a numeric string such as `"60"` or `"60%"`.
pub(crate) fn read_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Decode a list entry by entry, dropping the ones that do not fit.
fn entries<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<Value>::deserialize(de)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, v)| match serde_json::from_value::<T>(v) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping malformed analysis entry");
                None
            }
        })
        .collect())
}

fn number<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    let v = Value::deserialize(de)?;
    read_number(&v).ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {v}")))
}

fn number_or_zero<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(read_number(&Value::deserialize(de)?).unwrap_or(0.0))
}
