use crate::domain::payload::PortfolioPayload;
use crate::domain::profile::UserProfile;
use crate::domain::payload::NewsArticle;
use crate::domain::recommendation::{
    Headline, Measure, PriceInfo, RecommendationSource, Recommendations, SymbolNews,
};
use crate::llm::ExplainContext;
use crate::normalize::enrich::{self, generic_rationale, Draft, Enrichment, Explain};
use crate::normalize::text;

const CASH_RATIONALE: &str = "Liquidity buffer for emergencies and rebalancing.";

pub(crate) async fn normalize(
    payload: &PortfolioPayload,
    profile: &UserProfile,
    enrichment: Option<&Enrichment<'_>>,
) -> Recommendations {
    let drafts: Vec<Draft<'_>> = payload
        .portfolio
        .iter()
        .map(|holding| {
            let symbol = holding.asset.trim().to_string();
            let label = holding
                .name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(symbol.as_str())
                .to_string();
            let price_info = payload.quote_for(&symbol).map(|q| PriceInfo {
                current: q.price,
                buy_target: None,
                sell_target: None,
                change_percent: q.percent_change,
            });

            let reasons: Vec<&str> = holding
                .reasons
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .collect();
            let asset_class = holding.asset_class().unwrap_or("portfolio");

            let (fallback, explain) = if holding.is_cash() {
                (CASH_RATIONALE.to_string(), Explain::Skip)
            } else if !reasons.is_empty() {
                (reasons.join("; "), Explain::Skip)
            } else {
                (
                    generic_rationale(asset_class),
                    Explain::Ask(Some(ExplainContext::AssetClass(asset_class))),
                )
            };

            Draft {
                symbol,
                percent: holding.weight * 100.0,
                measure: Measure::Weight,
                label,
                price_info,
                fallback,
                suffix: holding
                    .expense_ratio
                    .filter(|r| r.is_finite())
                    .map(|r| format!("Expense ratio: {r:.2}%.")),
                explain,
            }
        })
        .collect();

    let items = enrich::settle(drafts, profile, enrichment).await;

    let narrative = payload
        .explanation
        .as_deref()
        .map(text::light_cleanup)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_narrative(payload, profile));

    let news = items
        .iter()
        .map(|item| SymbolNews {
            symbol: item.symbol.clone(),
            headlines: payload.news_for(&item.symbol).into_iter().map(headline).collect(),
        })
        .collect();

    Recommendations::new(RecommendationSource::Portfolio, items, narrative, None).with_news(news)
}

fn headline(article: NewsArticle) -> Headline {
    Headline {
        title: text::collapse_whitespace(&article.headline),
        source: article.source.filter(|s| !s.trim().is_empty()),
        url: article.url.filter(|s| !s.trim().is_empty()),
        published_at: article
            .datetime
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)),
    }
}

fn default_narrative(payload: &PortfolioPayload, profile: &UserProfile) -> String {
    let risk = payload.risk.as_ref();
    let title = risk
        .and_then(|r| r.title.as_deref())
        .unwrap_or(&profile.risk_band);
    match risk.and_then(|r| r.description.as_deref()) {
        Some(description) => format!("Long-term allocation for the {title} band. {description}"),
        None => format!("Long-term allocation for the {title} band."),
    }
}
