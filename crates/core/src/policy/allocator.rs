use crate::policy::bands::RiskBand;
use serde::Serialize;

/// Weights are rounded to this step (0.5%) before renormalising.
const ROUND_STEP: f64 = 0.005;

const US_EQUITY_SPLIT: &[(&str, f64)] = &[("US", 0.65), ("IntlDev", 0.25), ("EM", 0.10)];
const CA_EQUITY_SPLIT: &[(&str, f64)] = &[
    ("Canada", 0.20),
    ("US", 0.50),
    ("IntlDev", 0.25),
    ("EM", 0.05),
];
const US_BOND_SPLIT: &[(&str, f64)] = &[("CoreIG", 0.80), ("LongDur", 0.10), ("TIPS", 0.10)];
const CA_BOND_SPLIT: &[(&str, f64)] = &[("CoreIG", 0.90), ("LongDur", 0.10)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SleeveClass {
    Equity,
    Bonds,
    Alts,
    Cash,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sleeve {
    pub class: SleeveClass,
    pub subclass: &'static str,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jurisdiction {
    Us,
    Ca,
}

impl Jurisdiction {
    /// Unrecognised codes fall back to Canada.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("us") {
            Jurisdiction::Us
        } else {
            Jurisdiction::Ca
        }
    }

    fn equity_split(&self) -> &'static [(&'static str, f64)] {
        match self {
            Jurisdiction::Us => US_EQUITY_SPLIT,
            Jurisdiction::Ca => CA_EQUITY_SPLIT,
        }
    }

    fn bond_split(&self) -> &'static [(&'static str, f64)] {
        match self {
            Jurisdiction::Us => US_BOND_SPLIT,
            Jurisdiction::Ca => CA_BOND_SPLIT,
        }
    }
}

fn round_to_step(x: f64) -> f64 {
    (x / ROUND_STEP).round() * ROUND_STEP
}

/// Deterministic sleeve targets for a risk score, largest weight first.
/// Weights sum to 1.0.
pub fn target_sleeves(score: u8, jurisdiction: Jurisdiction) -> Vec<Sleeve> {
    let band = RiskBand::for_score(score);
    // Absorb any drift in the band table into cash.
    let cash = (band.target_cash + (1.0 - band.total())).max(0.0);

    let mut sleeves = Vec::new();
    for &(subclass, frac) in jurisdiction.equity_split() {
        sleeves.push(Sleeve {
            class: SleeveClass::Equity,
            subclass,
            weight: band.target_equity * frac,
        });
    }
    for &(subclass, frac) in jurisdiction.bond_split() {
        sleeves.push(Sleeve {
            class: SleeveClass::Bonds,
            subclass,
            weight: band.target_bonds * frac,
        });
    }
    if band.target_alts > 0.0 {
        sleeves.push(Sleeve {
            class: SleeveClass::Alts,
            subclass: "REIT",
            weight: band.target_alts,
        });
    }
    if cash > 0.0 {
        sleeves.push(Sleeve {
            class: SleeveClass::Cash,
            subclass: "CASH",
            weight: cash,
        });
    }

    for s in &mut sleeves {
        s.weight = round_to_step(s.weight);
    }
    let sum: f64 = sleeves.iter().map(|s| s.weight).sum();
    for s in &mut sleeves {
        s.weight = if sum > 0.0 { s.weight / sum } else { 0.0 };
    }

    let residual = 1.0 - sleeves.iter().map(|s| s.weight).sum::<f64>();
    let has_non_cash = sleeves.iter().any(|s| s.class != SleeveClass::Cash);
    let largest = sleeves
        .iter_mut()
        .filter(|s| !has_non_cash || s.class != SleeveClass::Cash)
        .max_by(|a, b| a.weight.total_cmp(&b.weight));
    if let Some(largest) = largest {
        largest.weight += residual;
    }

    sleeves.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    sleeves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleeves_sum_to_one_for_every_score() {
        for score in 1..=10u8 {
            for j in [Jurisdiction::Us, Jurisdiction::Ca] {
                let sleeves = target_sleeves(score, j);
                let total: f64 = sleeves.iter().map(|s| s.weight).sum();
                assert!((total - 1.0).abs() < 1e-9, "score {score} {j:?}: {total}");
            }
        }
    }

    #[test]
    fn sleeves_are_sorted_largest_first() {
        let sleeves = target_sleeves(6, Jurisdiction::Ca);
        for pair in sleeves.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
        assert_eq!(sleeves[0].subclass, "US");
        assert_eq!(sleeves[0].class, SleeveClass::Equity);
    }

    #[test]
    fn jurisdiction_controls_subclasses() {
        let ca = target_sleeves(5, Jurisdiction::Ca);
        assert!(ca.iter().any(|s| s.subclass == "Canada"));
        assert!(!ca.iter().any(|s| s.subclass == "TIPS"));

        let us = target_sleeves(5, Jurisdiction::Us);
        assert!(us.iter().any(|s| s.subclass == "TIPS"));
        assert!(!us.iter().any(|s| s.subclass == "Canada"));
    }

    #[test]
    fn unknown_jurisdiction_falls_back_to_canada() {
        assert_eq!(Jurisdiction::parse("uk"), Jurisdiction::Ca);
        assert_eq!(Jurisdiction::parse(" US "), Jurisdiction::Us);
    }

    #[test]
    fn conservative_scores_hold_more_bonds() {
        let bonds = |score| -> f64 {
            target_sleeves(score, Jurisdiction::Us)
                .iter()
                .filter(|s| s.class == SleeveClass::Bonds)
                .map(|s| s.weight)
                .sum()
        };
        assert!(bonds(1) > bonds(10));
    }
}
