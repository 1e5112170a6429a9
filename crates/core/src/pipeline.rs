//! Intake steps shared by the service and the export CLI.

use crate::domain::answers::{AnswerSet, QuestionDef};
use crate::domain::profile::UserProfile;
use crate::domain::risk::{RiskProfile, TraderType};
use crate::scoring::{classify, compute_risk, validate, ValidationError};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub risk: RiskProfile,
    pub trader_type: TraderType,
    pub profile: UserProfile,
}

/// Validate, score and classify an answer set.
///
/// `answers` gains `total_expenses` on success.
pub fn assess(
    answers: &mut AnswerSet,
    questions: &[QuestionDef],
    default_jurisdiction: &str,
) -> Result<Assessment, ValidationError> {
    validate(answers, questions)?;
    let risk = compute_risk(answers);
    let trader_type = classify(answers);
    let profile = UserProfile::from_parts(answers, &risk, trader_type, default_jurisdiction);

    tracing::info!(
        score = risk.score,
        trader_type = trader_type.as_str(),
        warnings = risk.warnings.len(),
        "assessed answers"
    );

    Ok(Assessment {
        risk,
        trader_type,
        profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::answers::{AnswerValue, TOTAL_EXPENSES_KEY};
    use crate::questions::default_questions;
    use serde_json::json;

    fn complete_answers() -> AnswerSet {
        serde_json::from_value(json!({
            "income": 5000,
            "expenses": {"housing": 1800, "groceries": 600, "utilities": 200, "transportation": 250, "miscellaneous": 150},
            "savings": 10000,
            "debt_payments": 0,
            "dependents": 0,
            "age": 35,
            "primary_goal": "Retirement",
            "horizon": "15+ years",
            "invest_percentage": 20,
            "risk_scale": 3,
            "loss_reaction": "Do nothing",
            "experience": "Intermediate",
            "check_frequency": "Weekly",
            "investor_style": "I'm okay with short-term losses if I can earn more long-term.",
            "portfolio_priority": "Balanced Growth"
        }))
        .unwrap()
    }

    #[test]
    fn assesses_a_complete_answer_set() {
        let mut answers = complete_answers();
        let a = assess(&mut answers, &default_questions(), "CA").unwrap();

        assert_eq!(answers.number(TOTAL_EXPENSES_KEY), Some(3000.0));
        assert_eq!(a.risk.score, 7);
        assert_eq!(a.risk.investable_monthly, 2000.0);
        assert!((a.risk.suggested_cap - 1100.0).abs() < 1e-9);
        assert_eq!(a.trader_type, TraderType::RetirementInvestor);
        assert_eq!(a.profile.risk_band, "Moderately Aggressive");
        assert_eq!(a.profile.jurisdiction, "CA");
        assert_eq!(a.profile.experience.as_deref(), Some("Intermediate"));
    }

    #[test]
    fn explicit_trader_type_and_jurisdiction_win() {
        let mut answers = complete_answers();
        answers.insert("trader_type", AnswerValue::Text("Day trader".into()));
        answers.insert("jurisdiction", AnswerValue::Text("us".into()));
        let a = assess(&mut answers, &default_questions(), "CA").unwrap();
        assert_eq!(a.trader_type, TraderType::DayTrader);
        assert_eq!(a.profile.jurisdiction, "US");
    }

    #[test]
    fn stops_at_first_invalid_answer() {
        let mut answers = complete_answers();
        answers.insert("age", AnswerValue::Number(12.0));
        let err = assess(&mut answers, &default_questions(), "CA").unwrap_err();
        assert_eq!(err.key(), "age");
        assert!(answers.number(TOTAL_EXPENSES_KEY).is_none());
    }
}
