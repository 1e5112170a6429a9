//! Reconciles the upstream analysis shapes into one [`Recommendations`] model.
//!
//! Variant detection happens once, in [`AnalysisPayload::detect`]; each
//! variant has its own module. Item rationales may be enriched through an
//! [`ExplanationProvider`](crate::llm::ExplanationProvider), with a generic
//! rationale substituted whenever a call fails.

mod enrich;
mod legacy;
mod portfolio;
mod predictions;
pub mod text;

pub use enrich::Enrichment;
pub use predictions::{DISCLAIMER_LABEL, DISCLAIMER_TEXT};

use crate::domain::payload::AnalysisPayload;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{RecommendationSource, Recommendations};
use crate::domain::risk::TraderType;
use crate::llm::ExplainContext;
use serde::Serialize;
use serde_json::Value;

pub const UNAVAILABLE_NARRATIVE: &str =
    "Recommendations are not available yet. Run an analysis to see personalised suggestions.";

/// Detect the payload variant and normalize it.
///
/// A missing or unrecognised payload is not an error: it yields an empty item
/// list with [`UNAVAILABLE_NARRATIVE`].
pub async fn normalize(
    trader_type: TraderType,
    payload: Option<&Value>,
    profile: &UserProfile,
    enrichment: Option<&Enrichment<'_>>,
) -> Recommendations {
    let detected = AnalysisPayload::detect(payload);
    normalize_detected(trader_type, &detected, profile, enrichment).await
}

pub async fn normalize_detected(
    trader_type: TraderType,
    payload: &AnalysisPayload,
    profile: &UserProfile,
    enrichment: Option<&Enrichment<'_>>,
) -> Recommendations {
    let matches_track = match payload {
        AnalysisPayload::Predictions(_) => trader_type.wants_short_term_signals(),
        AnalysisPayload::Portfolio(_) | AnalysisPayload::LegacyAllocation(_) => {
            trader_type.wants_long_term_allocation()
        }
        AnalysisPayload::Unavailable => true,
    };
    if !matches_track {
        tracing::warn!(
            trader_type = trader_type.as_str(),
            payload = payload.kind(),
            "analysis payload does not match the trader track; normalizing anyway"
        );
    }

    match payload {
        AnalysisPayload::Predictions(p) => predictions::normalize(p, profile, enrichment).await,
        AnalysisPayload::Portfolio(p) => portfolio::normalize(p, profile, enrichment).await,
        AnalysisPayload::LegacyAllocation(l) => legacy::normalize(l, profile, enrichment).await,
        AnalysisPayload::Unavailable => Recommendations::new(
            RecommendationSource::Unavailable,
            Vec::new(),
            UNAVAILABLE_NARRATIVE,
            None,
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub symbol: String,
    pub text: String,
    /// False when the generic rationale was used.
    pub enriched: bool,
}

/// Rationale for a single symbol, falling back exactly as a batch item would.
pub async fn explain_symbol(
    symbol: &str,
    profile: &UserProfile,
    context: Option<ExplainContext<'_>>,
    enrichment: Option<&Enrichment<'_>>,
) -> Explanation {
    let symbol = symbol.trim().to_uppercase();
    let asked = match enrichment {
        Some(enrichment) => enrich::ask(&symbol, profile, context, enrichment).await,
        None => None,
    };
    let enriched = asked.is_some();
    let text = asked.unwrap_or_else(|| match context {
        Some(ExplainContext::Prediction(p)) => {
            predictions::signal_fallback(predictions::signal_action(p))
        }
        Some(ExplainContext::AssetClass(class)) => enrich::generic_rationale(class),
        None => enrich::generic_rationale("portfolio"),
    });
    Explanation {
        symbol,
        text,
        enriched,
    }
}
