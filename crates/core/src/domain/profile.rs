use crate::domain::answers::AnswerSet;
use crate::domain::risk::{RiskProfile, TraderType};
use crate::policy::bands::RiskBand;
use serde::{Deserialize, Serialize};

/// Compact user summary handed to explanation providers and the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub risk_score: u8,
    pub risk_band: String,
    pub trader_type: TraderType,
    pub investable_monthly: f64,
    pub age: Option<f64>,
    pub horizon: Option<String>,
    pub experience: Option<String>,
    pub primary_goal: Option<String>,
    pub jurisdiction: String,
}

impl UserProfile {
    pub fn from_parts(
        answers: &AnswerSet,
        risk: &RiskProfile,
        trader_type: TraderType,
        default_jurisdiction: &str,
    ) -> Self {
        let jurisdiction = answers
            .text("jurisdiction")
            .map(str::to_uppercase)
            .unwrap_or_else(|| default_jurisdiction.to_uppercase());

        Self {
            risk_score: risk.score,
            risk_band: RiskBand::for_score(risk.score).title.to_string(),
            trader_type,
            investable_monthly: risk.investable_monthly,
            age: answers.number("age"),
            horizon: answers.text("horizon").map(str::to_string),
            experience: answers.text("experience").map(str::to_string),
            primary_goal: answers.text("primary_goal").map(str::to_string),
            jurisdiction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_parts_reads_answers_and_band() {
        let answers: AnswerSet = serde_json::from_value(json!({
            "age": 41,
            "horizon": "7-15 years",
            "experience": "Intermediate",
            "jurisdiction": "us",
        }))
        .unwrap();
        let risk = RiskProfile {
            score: 6,
            investable_monthly: 1200.0,
            suggested_cap: 540.0,
            runway_months: 8.0,
            warnings: vec![],
        };

        let profile = UserProfile::from_parts(&answers, &risk, TraderType::RetirementInvestor, "CA");
        assert_eq!(profile.risk_band, "Moderate");
        assert_eq!(profile.jurisdiction, "US");
        assert_eq!(profile.age, Some(41.0));
        assert_eq!(profile.horizon.as_deref(), Some("7-15 years"));
        assert_eq!(profile.primary_goal, None);
    }
}
