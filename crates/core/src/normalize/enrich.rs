use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{Measure, PriceInfo, RecommendationItem};
use crate::llm::{ExplainContext, ExplanationProvider};
use crate::normalize::text;
use std::time::Duration;

/// Optional per-item rationale enrichment.
#[derive(Clone, Copy)]
pub struct Enrichment<'p> {
    pub provider: &'p dyn ExplanationProvider,
    /// Deadline per call. A call that misses it is treated as failed.
    pub timeout: Duration,
}

impl<'p> Enrichment<'p> {
    pub fn new(provider: &'p dyn ExplanationProvider, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

/// An item before its rationale is settled.
pub(crate) struct Draft<'a> {
    pub symbol: String,
    pub percent: f64,
    pub measure: Measure,
    pub label: String,
    pub price_info: Option<PriceInfo>,
    /// Used when enrichment is off, fails, times out or returns nothing.
    pub fallback: String,
    /// Appended after the settled rationale.
    pub suffix: Option<String>,
    pub explain: Explain<'a>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Explain<'a> {
    /// Upstream already supplied a narrative, or the item needs none.
    Skip,
    Ask(Option<ExplainContext<'a>>),
}

/// Settle every draft's rationale and build items in input order.
///
/// Provider calls run concurrently; this waits for all of them to succeed or
/// fall back, so latency is bounded by the slowest call.
pub(crate) async fn settle(
    drafts: Vec<Draft<'_>>,
    profile: &UserProfile,
    enrichment: Option<&Enrichment<'_>>,
) -> Vec<RecommendationItem> {
    let rationales: Vec<String> = match enrichment {
        None => drafts.iter().map(|d| d.fallback.clone()).collect(),
        Some(enrichment) => {
            let calls = drafts
                .iter()
                .map(|draft| explain_or_fallback(draft, profile, enrichment));
            futures::future::join_all(calls).await
        }
    };

    drafts
        .into_iter()
        .zip(rationales)
        .map(|(draft, rationale)| {
            let rationale = match &draft.suffix {
                Some(suffix) => format!("{rationale} {suffix}"),
                None => rationale,
            };
            RecommendationItem::position(
                draft.symbol,
                draft.percent,
                draft.measure,
                draft.label,
                rationale,
                draft.price_info,
            )
        })
        .collect()
}

async fn explain_or_fallback(
    draft: &Draft<'_>,
    profile: &UserProfile,
    enrichment: &Enrichment<'_>,
) -> String {
    let Explain::Ask(context) = draft.explain else {
        return draft.fallback.clone();
    };
    ask(&draft.symbol, profile, context, enrichment)
        .await
        .unwrap_or_else(|| draft.fallback.clone())
}

/// One bounded provider call. `None` means the caller should fall back.
pub(crate) async fn ask(
    symbol: &str,
    profile: &UserProfile,
    context: Option<ExplainContext<'_>>,
    enrichment: &Enrichment<'_>,
) -> Option<String> {
    let call = enrichment.provider.explain(symbol, profile, context);
    match tokio::time::timeout(enrichment.timeout, call).await {
        Ok(Ok(explanation)) => {
            let explanation = text::collapse_whitespace(&text::strip_code_fences(&explanation));
            (!explanation.is_empty()).then_some(explanation)
        }
        Ok(Err(err)) => {
            tracing::warn!(
                symbol,
                provider = ?enrichment.provider.provider(),
                error = %err,
                "explanation provider failed; using generic rationale"
            );
            None
        }
        Err(_) => {
            tracing::warn!(
                symbol,
                timeout_ms = enrichment.timeout.as_millis() as u64,
                "explanation provider timed out; using generic rationale"
            );
            None
        }
    }
}

/// Generic rationale for an asset class when nothing better is available.
pub(crate) fn generic_rationale(asset_class: &str) -> String {
    let purpose = if is_equity_like(asset_class) {
        "diversification and growth"
    } else {
        "stability"
    };
    format!("Provides {purpose} within the {} allocation.", asset_class.trim().to_lowercase())
}

fn is_equity_like(asset_class: &str) -> bool {
    let class = asset_class.to_lowercase();
    ["stock", "equit", "etf", "growth", "international", "emerging", "index"]
        .iter()
        .any(|needle| class.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_rationale_by_class() {
        assert_eq!(
            generic_rationale("Stocks"),
            "Provides diversification and growth within the stocks allocation."
        );
        assert_eq!(
            generic_rationale("equity"),
            "Provides diversification and growth within the equity allocation."
        );
        assert_eq!(
            generic_rationale("bonds"),
            "Provides stability within the bonds allocation."
        );
        assert_eq!(
            generic_rationale("cash"),
            "Provides stability within the cash allocation."
        );
    }
}
