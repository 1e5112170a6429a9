use crate::domain::payload::{Prediction, PredictionPayload, SignalAction};
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{
    MarketNotes, Measure, PriceInfo, RecommendationItem, RecommendationSource, Recommendations,
};
use crate::llm::ExplainContext;
use crate::normalize::enrich::{self, Draft, Enrichment, Explain};

pub const DISCLAIMER_LABEL: &str = "Disclaimer";
pub const DISCLAIMER_TEXT: &str = "Signals are probabilistic model outputs, not financial advice. \
Short-term trading can lose money quickly; only risk what you can afford to lose.";
const NO_SIGNALS_NARRATIVE: &str = "The ML model returned no short-term signals for this session.";

pub(crate) async fn normalize(
    payload: &PredictionPayload,
    profile: &UserProfile,
    enrichment: Option<&Enrichment<'_>>,
) -> Recommendations {
    let drafts: Vec<Draft<'_>> = payload
        .predictions
        .iter()
        .map(|prediction| {
            let action = signal_action(prediction);

            let label = match prediction.timeframe.as_deref().map(str::trim) {
                Some(tf) if !tf.is_empty() => format!("{} ({tf})", action.as_upper()),
                _ => action.as_upper().to_string(),
            };

            Draft {
                symbol: prediction.ticker.trim().to_string(),
                percent: prediction.confidence,
                measure: Measure::Confidence,
                label,
                price_info: Some(PriceInfo {
                    current: prediction.current_price,
                    buy_target: prediction.buy_target,
                    sell_target: prediction.sell_target,
                    change_percent: None,
                }),
                fallback: signal_fallback(action),
                suffix: Some(format!("Suggested move: {}.", action.clause())),
                explain: Explain::Ask(Some(ExplainContext::Prediction(prediction))),
            }
        })
        .collect();

    let mut items = enrich::settle(drafts, profile, enrichment).await;
    let narrative = if items.is_empty() {
        NO_SIGNALS_NARRATIVE.to_string()
    } else {
        let symbols: Vec<&str> = items.iter().map(|i| i.symbol.as_str()).collect();
        format!(
            "Short-term ML signals for {}. Treat each signal as one input and size positions to your risk score of {}/10.",
            symbols.join(", "),
            profile.risk_score
        )
    };
    if !items.is_empty() {
        items.push(RecommendationItem::disclaimer(DISCLAIMER_LABEL, DISCLAIMER_TEXT));
    }

    let market = MarketNotes {
        sentiment: non_blank(payload.market_sentiment.as_deref()),
        volatility: non_blank(payload.volatility_level.as_deref()),
        position_size: non_blank(payload.recommended_position_size.as_deref()),
    };
    let market = (market != MarketNotes::default()).then_some(market);

    Recommendations::new(RecommendationSource::Predictions, items, narrative, market)
}

pub(crate) fn signal_action(prediction: &Prediction) -> SignalAction {
    SignalAction::parse(&prediction.action).unwrap_or_else(|| {
        tracing::warn!(
            ticker = %prediction.ticker,
            action = %prediction.action,
            "unrecognised prediction action; treating as hold"
        );
        SignalAction::Hold
    })
}

pub(crate) fn signal_fallback(action: SignalAction) -> String {
    format!("{} signal based on ML analysis.", action.as_upper())
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
