use crate::domain::answers::{AnswerSet, TOTAL_EXPENSES_KEY};
use crate::domain::risk::RiskProfile;

const BASELINE_SCORE: f64 = 5.0;
const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 10.0;

/// Share of investable capital allowed per score; index 0 is score 1.
const ALLOCATION_CAP: [f64; 10] = [0.10, 0.15, 0.20, 0.28, 0.36, 0.45, 0.55, 0.65, 0.75, 0.85];

pub const PAUSE_INVESTING_WARNING: &str =
    "Your expenses meet or exceed your income. Consider pausing investing until you have a monthly surplus.";

/// Score a validated answer set.
///
/// Total over every numeric input: missing or non-finite answers count as 0
/// and every denominator is floored, so the result is always finite.
pub fn compute_risk(answers: &AnswerSet) -> RiskProfile {
    let income = answers.number_or_zero("income");
    let expenses = monthly_expenses(answers);
    let savings = answers.number_or_zero("savings");
    let dependents = answers.number_or_zero("dependents");
    let age = answers.number_or_zero("age");
    let risk_scale = answers.number_or_zero("risk_scale");

    let investable = (income - expenses).clamp(0.0, f64::MAX);
    let runway_months = savings / expenses.max(1.0);

    let mut adjustment = 0.0;
    // Both income tiers apply when the higher one is met.
    if income > 1.25 * expenses {
        adjustment += 1.0;
    }
    if income > 1.5 * expenses {
        adjustment += 1.0;
    }
    if expenses > 0.7 * income {
        adjustment -= 1.0;
    }
    if expenses > 0.9 * income {
        adjustment -= 1.0;
    }
    if dependents >= 1.0 {
        adjustment -= dependents.min(2.0);
    }
    if age <= 25.0 {
        adjustment += 1.0;
    }
    if age >= 55.0 {
        adjustment -= 1.0;
    }
    if risk_scale >= 4.0 {
        adjustment += 1.0;
    } else if risk_scale <= 2.0 {
        adjustment -= 1.0;
    }
    if runway_months >= 6.0 {
        adjustment += 1.0;
    } else if runway_months < 3.0 {
        adjustment -= 2.0;
    }

    let score = (BASELINE_SCORE + adjustment)
        .clamp(MIN_SCORE, MAX_SCORE)
        .round() as u8;
    let suggested_cap = investable * allocation_cap(score);

    let mut warnings = Vec::new();
    if investable <= 0.0 {
        warnings.push(PAUSE_INVESTING_WARNING.to_string());
    }
    if runway_months < 3.0 {
        warnings.push(format!(
            "Low emergency fund: your savings cover about {runway_months:.1} months of expenses. Build at least 3 months before investing heavily."
        ));
    }

    tracing::debug!(score, investable, runway_months, adjustment, "computed risk profile");

    RiskProfile {
        score,
        investable_monthly: investable,
        suggested_cap,
        runway_months,
        warnings,
    }
}

/// Fraction of investable capital allowed at `score`; scores outside
/// `1..=10` are clamped into the table.
pub fn allocation_cap(score: u8) -> f64 {
    let idx = usize::from(score.clamp(1, 10)) - 1;
    ALLOCATION_CAP[idx]
}

/// Validated `total_expenses`, falling back to an unvalidated category
/// breakdown under `expenses`, then 0.
fn monthly_expenses(answers: &AnswerSet) -> f64 {
    if let Some(total) = answers.number(TOTAL_EXPENSES_KEY) {
        return total;
    }
    match answers.get("expenses") {
        Some(v) => {
            if let Some(n) = v.as_number().filter(|n| n.is_finite()) {
                n
            } else if let Some(categories) = v.as_categories() {
                categories.values().filter(|n| n.is_finite()).sum()
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}
