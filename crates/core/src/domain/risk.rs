use serde::{Deserialize, Serialize};
use std::fmt;

/// Output of the risk engine for one completed questionnaire.
///
/// Recomputed wholesale when answers change; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Integer risk score in `1..=10`.
    pub score: u8,
    /// Monthly income minus monthly expenses, floored at zero.
    pub investable_monthly: f64,
    /// Portion of `investable_monthly` the score allows; never exceeds it.
    pub suggested_cap: f64,
    /// Savings expressed in months of expenses.
    pub runway_months: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraderType {
    DayTrader,
    RetirementInvestor,
    Both,
    Unknown,
}

impl TraderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraderType::DayTrader => "day_trader",
            TraderType::RetirementInvestor => "retirement_investor",
            TraderType::Both => "both",
            TraderType::Unknown => "unknown",
        }
    }

    /// Lenient parse of a user- or caller-supplied label ("Day trader",
    /// "day-trader", "RETIREMENT_INVESTOR", ...). Anything else is `Unknown`.
    pub fn parse(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "day_trader" | "daytrader" | "day_trading" => TraderType::DayTrader,
            "retirement_investor" | "retirement" => TraderType::RetirementInvestor,
            "both" => TraderType::Both,
            _ => TraderType::Unknown,
        }
    }

    pub fn wants_short_term_signals(&self) -> bool {
        matches!(self, TraderType::DayTrader | TraderType::Both)
    }

    pub fn wants_long_term_allocation(&self) -> bool {
        matches!(
            self,
            TraderType::RetirementInvestor | TraderType::Both | TraderType::Unknown
        )
    }
}

impl fmt::Display for TraderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TraderType::DayTrader => "Day trader",
            TraderType::RetirementInvestor => "Retirement investor",
            TraderType::Both => "Day trader and retirement investor",
            TraderType::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}
