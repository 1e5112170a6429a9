use crate::domain::payload::LegacyAllocation;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{Measure, RecommendationSource, Recommendations};
use crate::llm::ExplainContext;
use crate::normalize::enrich::{self, generic_rationale, Draft, Enrichment, Explain};
use crate::normalize::text;

const NARRATIVE_SENTENCES: usize = 3;
const NARRATIVE_MIN_SENTENCE_CHARS: usize = 20;

pub(crate) async fn normalize(
    payload: &LegacyAllocation,
    profile: &UserProfile,
    enrichment: Option<&Enrichment<'_>>,
) -> Recommendations {
    let mut drafts: Vec<Draft<'_>> = Vec::new();
    for bucket in &payload.buckets {
        if bucket.recommendations.is_empty() {
            tracing::debug!(asset_class = %bucket.asset_class, "allocation bucket has no recommendations");
            continue;
        }
        // Even split: the upstream gives one aggregate per class.
        let share = bucket.percentage / bucket.recommendations.len() as f64;
        for entry in &bucket.recommendations {
            let (symbol, label) = text::parse_leading_ticker(entry);
            let label = if label.is_empty() {
                bucket.asset_class.clone()
            } else {
                label
            };
            drafts.push(Draft {
                symbol,
                percent: share,
                measure: Measure::Weight,
                label,
                price_info: None,
                fallback: generic_rationale(&bucket.asset_class),
                suffix: None,
                explain: Explain::Ask(Some(ExplainContext::AssetClass(&bucket.asset_class))),
            });
        }
    }

    let items = enrich::settle(drafts, profile, enrichment).await;

    let narrative = payload
        .rationale
        .as_deref()
        .map(|r| text::summarize_rationale(r, NARRATIVE_SENTENCES, NARRATIVE_MIN_SENTENCE_CHARS))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_narrative(payload));

    Recommendations::new(RecommendationSource::LegacyAllocation, items, narrative, None)
}

fn default_narrative(payload: &LegacyAllocation) -> String {
    let parts: Vec<String> = payload
        .buckets
        .iter()
        .map(|b| format!("{} ({:.0}%)", b.asset_class, b.percentage))
        .collect();
    format!("Diversified allocation across {}.", parts.join(", "))
}
