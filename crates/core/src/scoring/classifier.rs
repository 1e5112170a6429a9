use crate::domain::answers::AnswerSet;
use crate::domain::risk::TraderType;

pub const TRADER_TYPE_KEY: &str = "trader_type";
pub const PRIMARY_GOAL_KEY: &str = "primary_goal";

/// Recommendation track for an answer set.
///
/// An explicit trader-type answer wins; otherwise the primary goal decides;
/// otherwise the user is treated as a retirement investor. Never `Unknown`.
pub fn classify(answers: &AnswerSet) -> TraderType {
    if let Some(explicit) = answers.text(TRADER_TYPE_KEY) {
        match TraderType::parse(explicit) {
            TraderType::Unknown => {
                tracing::debug!(value = explicit, "unrecognised trader_type answer; using primary goal");
            }
            t => return t,
        }
    }

    match answers.text(PRIMARY_GOAL_KEY).map(str::to_lowercase).as_deref() {
        Some("short-term trading") => TraderType::DayTrader,
        Some("retirement") => TraderType::RetirementInvestor,
        _ => TraderType::RetirementInvestor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers(v: serde_json::Value) -> AnswerSet {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn explicit_both_wins_over_any_goal() {
        for goal in ["Retirement", "Short-term trading", "Supplemental Income"] {
            let a = answers(json!({"trader_type": "Both", "primary_goal": goal}));
            assert_eq!(classify(&a), TraderType::Both, "goal {goal}");
        }
    }

    #[test]
    fn explicit_values_map_one_to_one() {
        let a = answers(json!({"trader_type": "day_trader", "primary_goal": "Retirement"}));
        assert_eq!(classify(&a), TraderType::DayTrader);
        let a = answers(json!({"trader_type": "Retirement investor"}));
        assert_eq!(classify(&a), TraderType::RetirementInvestor);
    }

    #[test]
    fn falls_back_to_primary_goal() {
        let a = answers(json!({"primary_goal": "Short-term trading"}));
        assert_eq!(classify(&a), TraderType::DayTrader);
        let a = answers(json!({"trader_type": "scalper", "primary_goal": "short-term TRADING"}));
        assert_eq!(classify(&a), TraderType::DayTrader);
        let a = answers(json!({"primary_goal": "Retirement"}));
        assert_eq!(classify(&a), TraderType::RetirementInvestor);
    }

    #[test]
    fn defaults_to_retirement_investor() {
        assert_eq!(classify(&AnswerSet::new()), TraderType::RetirementInvestor);
        let a = answers(json!({"primary_goal": "Supplemental Income", "trader_type": 3}));
        assert_eq!(classify(&a), TraderType::RetirementInvestor);
    }
}
