use crate::domain::answers::{AnswerSet, AnswerValue, QuestionDef, QuestionKind, TOTAL_EXPENSES_KEY};

/// First problem found in an answer set. Always recoverable by re-asking the
/// question named by [`ValidationError::key`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{key}: an answer is required")]
    Missing { key: String },

    #[error("{key}: expected {expected}, got {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{key}: must be a whole number")]
    NotInteger { key: String },

    #[error("{key}: must be at least {min}")]
    BelowMin { key: String, min: f64 },

    #[error("{key}: must be at most {max}")]
    AboveMax { key: String, max: f64 },

    #[error("{key}: \"{value}\" is not one of: {allowed}")]
    NotAnOption {
        key: String,
        value: String,
        allowed: String,
    },

    #[error("{key}: amount for {category} must be zero or more")]
    InvalidCategoryAmount { key: String, category: String },

    #[error("{key}: enter at least one amount greater than zero")]
    NoPositiveCategory { key: String },
}

impl ValidationError {
    pub fn key(&self) -> &str {
        match self {
            ValidationError::Missing { key }
            | ValidationError::WrongType { key, .. }
            | ValidationError::NotInteger { key }
            | ValidationError::BelowMin { key, .. }
            | ValidationError::AboveMax { key, .. }
            | ValidationError::NotAnOption { key, .. }
            | ValidationError::InvalidCategoryAmount { key, .. }
            | ValidationError::NoPositiveCategory { key } => key,
        }
    }
}

/// Check `answers` against `questions` in order, stopping at the first failure.
///
/// On success the summed expense breakdown is written to `total_expenses`.
/// On failure `answers` is left untouched.
pub fn validate(answers: &mut AnswerSet, questions: &[QuestionDef]) -> Result<(), ValidationError> {
    let mut total_expenses: Option<f64> = None;

    for def in questions {
        let Some(value) = answers.get(&def.key).filter(|v| !is_blank(v)) else {
            if def.required {
                return Err(ValidationError::Missing {
                    key: def.key.clone(),
                });
            }
            continue;
        };

        match &def.kind {
            QuestionKind::Integer | QuestionKind::Float => {
                let n = check_number(def, value)?;
                check_bounds(def, n)?;
            }
            QuestionKind::Choice { options } => check_choice(def, value, options)?,
            QuestionKind::Categories { .. } => {
                let sum = check_categories(def, value)?;
                *total_expenses.get_or_insert(0.0) += sum;
            }
        }
    }

    if let Some(total) = total_expenses {
        answers.insert(TOTAL_EXPENSES_KEY, AnswerValue::Number(total));
    }
    Ok(())
}

fn is_blank(value: &AnswerValue) -> bool {
    matches!(value, AnswerValue::Text(s) if s.trim().is_empty())
}

fn wrong_type(def: &QuestionDef, expected: &'static str, value: &AnswerValue) -> ValidationError {
    ValidationError::WrongType {
        key: def.key.clone(),
        expected,
        found: value.type_name(),
    }
}

fn check_number(def: &QuestionDef, value: &AnswerValue) -> Result<f64, ValidationError> {
    let n = value
        .as_number()
        .filter(|n| n.is_finite())
        .ok_or_else(|| wrong_type(def, "number", value))?;
    if def.kind == QuestionKind::Integer && n.fract() != 0.0 {
        return Err(ValidationError::NotInteger {
            key: def.key.clone(),
        });
    }
    Ok(n)
}

fn check_bounds(def: &QuestionDef, n: f64) -> Result<(), ValidationError> {
    if let Some(min) = def.min {
        if n < min {
            return Err(ValidationError::BelowMin {
                key: def.key.clone(),
                min,
            });
        }
    }
    if let Some(max) = def.max {
        if n > max {
            return Err(ValidationError::AboveMax {
                key: def.key.clone(),
                max,
            });
        }
    }
    Ok(())
}

fn check_choice(
    def: &QuestionDef,
    value: &AnswerValue,
    options: &[String],
) -> Result<(), ValidationError> {
    let text = value
        .as_text()
        .ok_or_else(|| wrong_type(def, "one of the listed options", value))?
        .trim();
    if options.iter().any(|o| o.trim().eq_ignore_ascii_case(text)) {
        return Ok(());
    }
    Err(ValidationError::NotAnOption {
        key: def.key.clone(),
        value: text.to_string(),
        allowed: options.join(", "),
    })
}

fn check_categories(def: &QuestionDef, value: &AnswerValue) -> Result<f64, ValidationError> {
    let categories = value
        .as_categories()
        .ok_or_else(|| wrong_type(def, "category breakdown", value))?;

    let mut sum = 0.0;
    let mut any_positive = false;
    for (category, amount) in categories {
        if !amount.is_finite() || *amount < 0.0 {
            return Err(ValidationError::InvalidCategoryAmount {
                key: def.key.clone(),
                category: category.clone(),
            });
        }
        any_positive |= *amount > 0.0;
        sum += amount;
    }

    if !any_positive {
        return Err(ValidationError::NoPositiveCategory {
            key: def.key.clone(),
        });
    }
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::default_questions;
    use serde_json::json;

    fn complete_answers() -> AnswerSet {
        serde_json::from_value(json!({
            "income": 5000,
            "expenses": {"housing": 1800, "groceries": 600, "utilities": 200, "transportation": 250, "miscellaneous": 150},
            "savings": 10000,
            "debt_payments": 0,
            "dependents": 0,
            "age": 30,
            "primary_goal": "Retirement",
            "horizon": "15+ years",
            "invest_percentage": 20,
            "risk_scale": 3,
            "loss_reaction": "Do nothing",
            "experience": "Beginner",
            "check_frequency": "Monthly",
            "investor_style": "I enjoy taking calculated risks.",
            "portfolio_priority": "Balanced Growth",
        }))
        .unwrap()
    }

    #[test]
    fn accepts_complete_answers_and_inserts_total_expenses() {
        let mut answers = complete_answers();
        validate(&mut answers, &default_questions()).unwrap();
        assert_eq!(answers.number(TOTAL_EXPENSES_KEY), Some(3000.0));
    }

    #[test]
    fn fails_fast_on_first_missing_key() {
        let mut answers = complete_answers();
        let mut raw = serde_json::to_value(&answers).unwrap();
        let obj = raw.as_object_mut().unwrap();
        obj.remove("savings");
        obj.remove("age");
        answers = serde_json::from_value(raw).unwrap();

        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(err, ValidationError::Missing { key: "savings".into() });
        assert_eq!(err.key(), "savings");
        assert!(!answers.contains_key(TOTAL_EXPENSES_KEY));
    }

    #[test]
    fn failure_leaves_answers_untouched() {
        let mut answers = complete_answers();
        answers.insert("risk_scale", AnswerValue::Number(9.0));
        let before = answers.clone();

        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(err, ValidationError::AboveMax { key: "risk_scale".into(), max: 5.0 });
        assert_eq!(answers, before);
    }

    #[test]
    fn rejects_fractional_integer_and_text_number() {
        let mut answers = complete_answers();
        answers.insert("dependents", AnswerValue::Number(1.5));
        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(err, ValidationError::NotInteger { key: "dependents".into() });

        let mut answers = complete_answers();
        answers.insert("income", AnswerValue::Text("lots".into()));
        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { ref key, expected: "number", found: "text" } if key == "income"));
    }

    #[test]
    fn choice_is_case_insensitive_but_closed() {
        let mut answers = complete_answers();
        answers.insert("experience", AnswerValue::Text(" advanced ".into()));
        assert!(validate(&mut answers, &default_questions()).is_ok());

        answers.insert("experience", AnswerValue::Text("Guru".into()));
        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(err.key(), "experience");
        assert!(err.to_string().contains("Beginner, Intermediate, Advanced"));
    }

    #[test]
    fn categories_reject_negative_and_all_zero() {
        let mut answers = complete_answers();
        answers.insert(
            "expenses",
            serde_json::from_value(json!({"housing": 100, "groceries": -5})).unwrap(),
        );
        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCategoryAmount {
                key: "expenses".into(),
                category: "groceries".into()
            }
        );

        answers.insert(
            "expenses",
            serde_json::from_value(json!({"housing": 0, "groceries": 0})).unwrap(),
        );
        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(err, ValidationError::NoPositiveCategory { key: "expenses".into() });
    }

    #[test]
    fn optional_questions_may_be_absent_but_are_checked_when_present() {
        let mut answers = complete_answers();
        assert!(validate(&mut answers, &default_questions()).is_ok());

        answers.insert("trader_type", AnswerValue::Text("Scalper".into()));
        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(err.key(), "trader_type");
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let mut answers = complete_answers();
        answers.insert("horizon", AnswerValue::Text("   ".into()));
        let err = validate(&mut answers, &default_questions()).unwrap_err();
        assert_eq!(err, ValidationError::Missing { key: "horizon".into() });
    }
}
