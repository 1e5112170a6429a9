//! Default intake questionnaire.

use crate::domain::answers::{QuestionDef, QuestionKind};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct QuestionSection {
    pub id: u32,
    pub title: &'static str,
    pub questions: Vec<QuestionDef>,
}

fn number(key: &str, text: &str, integer: bool, min: Option<f64>, max: Option<f64>) -> QuestionDef {
    QuestionDef {
        key: key.to_string(),
        text: text.to_string(),
        kind: if integer {
            QuestionKind::Integer
        } else {
            QuestionKind::Float
        },
        min,
        max,
        required: true,
    }
}

fn choice(key: &str, text: &str, options: &[&str]) -> QuestionDef {
    QuestionDef {
        key: key.to_string(),
        text: text.to_string(),
        kind: QuestionKind::Choice {
            options: options.iter().map(|s| s.to_string()).collect(),
        },
        min: None,
        max: None,
        required: true,
    }
}

fn optional(mut def: QuestionDef) -> QuestionDef {
    def.required = false;
    def
}

pub fn default_sections() -> Vec<QuestionSection> {
    vec![
        QuestionSection {
            id: 1,
            title: "Financial Snapshot",
            questions: vec![
                number(
                    "income",
                    "What is your net monthly take-home income (after taxes)?",
                    false,
                    Some(0.0),
                    None,
                ),
                QuestionDef {
                    key: "expenses".to_string(),
                    text: "What are your average monthly expenses? (break down by category)"
                        .to_string(),
                    kind: QuestionKind::Categories {
                        categories: [
                            "housing",
                            "groceries",
                            "utilities",
                            "transportation",
                            "miscellaneous",
                        ]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    },
                    min: None,
                    max: None,
                    required: true,
                },
                number(
                    "savings",
                    "How much do you currently have in savings or investments?",
                    false,
                    Some(0.0),
                    None,
                ),
                number(
                    "debt_payments",
                    "Total monthly debt/loan payments (enter 0 if none)",
                    false,
                    Some(0.0),
                    None,
                ),
                number(
                    "dependents",
                    "How many dependents rely on your income?",
                    true,
                    Some(0.0),
                    Some(20.0),
                ),
                number("age", "What is your age?", true, Some(16.0), Some(120.0)),
            ],
        },
        QuestionSection {
            id: 2,
            title: "Investment Goals",
            questions: vec![
                choice(
                    "primary_goal",
                    "What's your primary investment goal?",
                    &["Retirement", "Short-term trading", "Supplemental Income"],
                ),
                choice(
                    "horizon",
                    "How long do you plan to keep this money invested?",
                    &["<1 year", "1-3 years", "3-7 years", "7-15 years", "15+ years"],
                ),
                optional(number(
                    "retirement_age",
                    "If retirement, at what age would you like to retire?",
                    true,
                    Some(30.0),
                    Some(100.0),
                )),
                number(
                    "invest_percentage",
                    "How much of your net savings are you willing to invest?",
                    true,
                    Some(0.0),
                    Some(100.0),
                ),
                number(
                    "risk_scale",
                    "Would you prefer steady growth or higher potential returns (which results in more ups and downs)?",
                    true,
                    Some(1.0),
                    Some(5.0),
                ),
                optional(choice(
                    "trader_type",
                    "Which best describes how you want to invest?",
                    &["Day trader", "Retirement investor", "Both"],
                )),
            ],
        },
        QuestionSection {
            id: 3,
            title: "Personal Profile",
            questions: vec![
                choice(
                    "loss_reaction",
                    "If your investment dropped 20% in a month, what would you do?",
                    &["Sell everything", "Sell some", "Do nothing", "Buy more"],
                ),
                choice(
                    "experience",
                    "How experienced are you with investing?",
                    &["Beginner", "Intermediate", "Advanced"],
                ),
                choice(
                    "check_frequency",
                    "How often do you check your portfolio or market news?",
                    &["Daily", "Weekly", "Monthly", "Rarely"],
                ),
                choice(
                    "investor_style",
                    "Which statement best describes you?",
                    &[
                        "I'd rather miss some gains than lose money.",
                        "I'm okay with short-term losses if I can earn more long-term.",
                        "I enjoy taking calculated risks.",
                    ],
                ),
                choice(
                    "portfolio_priority",
                    "Would you prefer your portfolio to prioritize...",
                    &["Safety & Stability", "Balanced Growth", "Aggressive Growth"],
                ),
            ],
        },
    ]
}

/// Ordered definition list for the validator.
pub fn flatten(sections: &[QuestionSection]) -> Vec<QuestionDef> {
    sections
        .iter()
        .flat_map(|s| s.questions.iter().cloned())
        .collect()
}

pub fn default_questions() -> Vec<QuestionDef> {
    flatten(&default_sections())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn keys_are_unique_and_ordered_by_section() {
        let questions = default_questions();
        let keys: BTreeSet<_> = questions.iter().map(|q| q.key.as_str()).collect();
        assert_eq!(keys.len(), questions.len());
        assert_eq!(questions[0].key, "income");
        assert_eq!(questions.last().unwrap().key, "portfolio_priority");
    }

    #[test]
    fn trader_type_and_retirement_age_are_optional() {
        let questions = default_questions();
        let optional: Vec<_> = questions
            .iter()
            .filter(|q| !q.required)
            .map(|q| q.key.as_str())
            .collect();
        assert_eq!(optional, vec!["retirement_age", "trader_type"]);
    }
}
