//! Plain-text export of a profile and its recommendations.

use crate::domain::recommendation::{
    Headline, Measure, PriceInfo, RecommendationItem, RecommendationSource, Recommendations,
};
use crate::domain::risk::{RiskProfile, TraderType};
use crate::policy::bands::RiskBand;
use chrono::{DateTime, Utc};
use std::fmt::Write;

const TITLE: &str = "INVESTMENT PROFILE REPORT";

pub fn compose(
    risk: &RiskProfile,
    trader_type: TraderType,
    recommendations: &Recommendations,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    heading(&mut out, TITLE, '=');

    section(&mut out, "PROFILE SUMMARY");
    let band = RiskBand::for_score(risk.score);
    line(&mut out, format!("Trader type: {trader_type}"));
    line(&mut out, format!("Risk score: {}/10 ({})", risk.score, band.title));
    line(&mut out, format!("Risk band: {}", band.description));
    line(&mut out, format!("Investable monthly: {}", money(risk.investable_monthly)));
    line(&mut out, format!("Suggested monthly cap: {}", money(risk.suggested_cap)));
    line(&mut out, format!("Emergency runway: {:.1} months", risk.runway_months));
    if !risk.warnings.is_empty() {
        line(&mut out, "Warnings:");
        for warning in &risk.warnings {
            line(&mut out, format!("  - {warning}"));
        }
    }

    section(&mut out, "RECOMMENDATIONS");
    let positions: Vec<&RecommendationItem> = recommendations.positions().collect();
    if positions.is_empty() {
        line(&mut out, "No recommendations available.");
    }
    for (idx, item) in positions.iter().enumerate() {
        line(&mut out, item_line(idx + 1, item));
    }
    for item in recommendations.disclaimers() {
        line(&mut out, format!("{}: {}", item.label, item.rationale));
    }

    section(&mut out, "STRATEGY & MARKET NOTES");
    line(&mut out, recommendations.narrative.trim());

    if let Some(market) = &recommendations.market {
        out.push('\n');
        line(&mut out, "Market conditions:");
        if let Some(s) = &market.sentiment {
            line(&mut out, format!("  Sentiment: {s}"));
        }
        if let Some(v) = &market.volatility {
            line(&mut out, format!("  Volatility: {v}"));
        }
        if let Some(p) = &market.position_size {
            line(&mut out, format!("  Suggested position size: {p}"));
        }
    }

    if positions.iter().any(|i| i.price_info.is_some()) {
        out.push('\n');
        let heading = match recommendations.source {
            RecommendationSource::Predictions => "Price targets:",
            _ => "Live quotes:",
        };
        line(&mut out, heading);
        for item in &positions {
            let quote = item
                .price_info
                .as_ref()
                .map(price_line)
                .unwrap_or_else(|| "N/A".to_string());
            line(&mut out, format!("  {}: {quote}", item.symbol));
        }
    }

    if !recommendations.news.is_empty() {
        out.push('\n');
        line(&mut out, "Recent news:");
        for entry in &recommendations.news {
            line(&mut out, format!("  {}:", entry.symbol));
            for h in &entry.headlines {
                line(&mut out, format!("    - {}", headline_line(h)));
            }
        }
    }

    out.push('\n');
    line(&mut out, "---");
    line(
        &mut out,
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    );
    out
}

pub fn compose_now(risk: &RiskProfile, trader_type: TraderType, recommendations: &Recommendations) -> String {
    compose(risk, trader_type, recommendations, Utc::now())
}

fn heading(out: &mut String, title: &str, underline: char) {
    line(out, title);
    line(out, underline.to_string().repeat(title.len()));
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    heading(out, title, '-');
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

fn item_line(n: usize, item: &RecommendationItem) -> String {
    let measure = match item.measure {
        Measure::Weight => "weight",
        Measure::Confidence => "confidence",
    };
    let mut s = format!(
        "{n}. {} | {:.1}% {measure}",
        item.symbol, item.weight_or_confidence_percent
    );
    if !item.label.is_empty() && item.label != item.symbol {
        let _ = write!(s, " | {}", item.label);
    }
    if !item.rationale.is_empty() {
        let _ = write!(s, " | {}", item.rationale);
    }
    s
}

fn price_line(p: &PriceInfo) -> String {
    let mut parts = vec![format!("price {}", opt_money(p.current))];
    if let Some(change) = p.change_percent {
        parts.push(format!("change {change:+.2}%"));
    }
    if p.buy_target.is_some() || p.sell_target.is_some() {
        parts.push(format!("buy target {}", opt_money(p.buy_target)));
        parts.push(format!("sell target {}", opt_money(p.sell_target)));
    }
    parts.join(", ")
}

fn headline_line(h: &Headline) -> String {
    let mut s = match h.published_at {
        Some(at) => format!("{} {}", at.format("%Y-%m-%d"), h.title),
        None => h.title.clone(),
    };
    if let Some(source) = &h.source {
        let _ = write!(s, " ({source})");
    }
    s
}

fn opt_money(v: Option<f64>) -> String {
    v.map(money).unwrap_or_else(|| "N/A".to_string())
}

/// `1234567.891` -> `$1,234,567.89`.
fn money(v: f64) -> String {
    let formatted = format!("{:.2}", v.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recommendation::{MarketNotes, SymbolNews};
    use chrono::TimeZone;

    fn risk() -> RiskProfile {
        RiskProfile {
            score: 7,
            investable_monthly: 2000.0,
            suggested_cap: 1100.0,
            runway_months: 3.3333,
            warnings: vec![],
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 27, 10, 0, 0).unwrap()
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1100.0), "$1,100.00");
        assert_eq!(money(1234567.891), "$1,234,567.89");
        assert_eq!(money(-42.5), "-$42.50");
    }

    #[test]
    fn composes_sections_items_and_footer() {
        let recs = Recommendations::new(
            RecommendationSource::LegacyAllocation,
            vec![
                RecommendationItem::position("VTI", 30.0, Measure::Weight, "Total Market", "Growth.", None),
                RecommendationItem::position("BND", 40.0, Measure::Weight, "BND", "Stability.", None),
            ],
            "A balanced mix.",
            None,
        );
        let report = compose(&risk(), TraderType::RetirementInvestor, &recs, at());

        assert!(report.starts_with("INVESTMENT PROFILE REPORT\n=========================\n"));
        assert!(report.contains("Trader type: Retirement investor\n"));
        assert!(report.contains("Risk score: 7/10 (Moderately Aggressive)\n"));
        assert!(report.contains("Suggested monthly cap: $1,100.00\n"));
        assert!(report.contains("Emergency runway: 3.3 months\n"));
        assert!(report.contains("1. VTI | 30.0% weight | Total Market | Growth.\n"));
        assert!(report.contains("2. BND | 40.0% weight | Stability.\n"));
        assert!(report.contains("STRATEGY & MARKET NOTES\n-----------------------\nA balanced mix.\n"));
        assert!(!report.contains("Warnings:"));
        assert!(!report.contains("Market conditions:"));
        assert!(!report.contains("Live quotes:"));
        assert!(report.ends_with("---\nGenerated: 2026-01-27 10:00:00 UTC\n"));
    }

    #[test]
    fn prints_optional_sections_when_present() {
        let mut r = risk();
        r.warnings.push("Low emergency fund.".into());
        let recs = Recommendations::new(
            RecommendationSource::Predictions,
            vec![
                RecommendationItem::position(
                    "AAPL",
                    78.3,
                    Measure::Confidence,
                    "BUY",
                    "BUY signal based on ML analysis.",
                    Some(PriceInfo {
                        current: Some(189.5),
                        buy_target: None,
                        sell_target: Some(201.13),
                        change_percent: None,
                    }),
                ),
                RecommendationItem::position("MSFT", 65.0, Measure::Confidence, "HOLD", "x", None),
                RecommendationItem::disclaimer("Disclaimer", "Not advice."),
            ],
            "Signals.",
            Some(MarketNotes {
                sentiment: Some("bullish".into()),
                volatility: None,
                position_size: Some("small".into()),
            }),
        );
        let report = compose(&r, TraderType::DayTrader, &recs, at());

        assert!(report.contains("Warnings:\n  - Low emergency fund.\n"));
        assert!(report.contains("1. AAPL | 78.3% confidence | BUY | BUY signal based on ML analysis.\n"));
        assert!(report.contains("Disclaimer: Not advice.\n"));
        assert!(report.contains("Market conditions:\n  Sentiment: bullish\n  Suggested position size: small\n"));
        assert!(!report.contains("Volatility:"));
        assert!(report.contains(
            "Price targets:\n  AAPL: price $189.50, buy target N/A, sell target $201.13\n  MSFT: N/A\n"
        ));
        assert!(!report.contains("Live quotes:"));
        assert!(!report.contains("Recent news:"));
    }

    #[test]
    fn portfolio_prints_live_quotes_and_recent_news() {
        let recs = Recommendations::new(
            RecommendationSource::Portfolio,
            vec![
                RecommendationItem::position(
                    "VTI",
                    60.0,
                    Measure::Weight,
                    "Vanguard Total Stock",
                    "Growth.",
                    Some(PriceInfo {
                        current: Some(250.0),
                        buy_target: None,
                        sell_target: None,
                        change_percent: Some(0.3),
                    }),
                ),
                RecommendationItem::position("BND", 40.0, Measure::Weight, "BND", "Stability.", None),
            ],
            "Long-term mix.",
            None,
        )
        .with_news(vec![
            SymbolNews {
                symbol: "VTI".into(),
                headlines: vec![Headline {
                    title: "Stocks rally".into(),
                    source: Some("Wire".into()),
                    url: None,
                    published_at: Some(Utc.with_ymd_and_hms(2026, 1, 26, 14, 0, 0).unwrap()),
                }],
            },
            SymbolNews {
                symbol: "BND".into(),
                headlines: vec![],
            },
        ]);
        let report = compose(&risk(), TraderType::RetirementInvestor, &recs, at());

        assert!(report.contains("Live quotes:\n  VTI: price $250.00, change +0.30%\n  BND: N/A\n"));
        assert!(report.contains("Recent news:\n  VTI:\n    - 2026-01-26 Stocks rally (Wire)\n\n---"));
        assert!(!report.contains("  BND:\n"));
    }

    #[test]
    fn empty_recommendations_say_so() {
        let recs = Recommendations::new(RecommendationSource::Unavailable, vec![], "Not available.", None);
        let report = compose(&risk(), TraderType::RetirementInvestor, &recs, at());
        assert!(report.contains("No recommendations available.\n"));
        assert!(report.contains("Not available.\n"));
    }
}
