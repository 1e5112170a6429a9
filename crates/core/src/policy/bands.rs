use serde::Serialize;
use std::ops::RangeInclusive;

/// Deterministic risk band. Targets sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBand {
    pub title: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub scores: RangeInclusive<u8>,
    pub target_equity: f64,
    pub target_bonds: f64,
    pub target_cash: f64,
    pub target_alts: f64,
}

pub static RISK_BANDS: [RiskBand; 6] = [
    RiskBand {
        title: "Very Conservative",
        description: "Capital preservation first; minimal volatility.",
        scores: 1..=2,
        target_equity: 0.20,
        target_bonds: 0.70,
        target_cash: 0.08,
        target_alts: 0.02,
    },
    RiskBand {
        title: "Conservative",
        description: "Income-oriented with limited drawdowns.",
        scores: 3..=3,
        target_equity: 0.30,
        target_bonds: 0.60,
        target_cash: 0.07,
        target_alts: 0.03,
    },
    RiskBand {
        title: "Moderately Conservative",
        description: "Balanced tilt to bonds; controlled equity risk.",
        scores: 4..=5,
        target_equity: 0.45,
        target_bonds: 0.47,
        target_cash: 0.05,
        target_alts: 0.03,
    },
    RiskBand {
        title: "Moderate",
        description: "Balanced growth and income; diversified risk.",
        scores: 6..=6,
        target_equity: 0.60,
        target_bonds: 0.33,
        target_cash: 0.04,
        target_alts: 0.03,
    },
    RiskBand {
        title: "Moderately Aggressive",
        description: "Growth-tilted with meaningful drawdown risk.",
        scores: 7..=8,
        target_equity: 0.75,
        target_bonds: 0.20,
        target_cash: 0.03,
        target_alts: 0.02,
    },
    RiskBand {
        title: "Aggressive",
        description: "Maximize long-run growth; high volatility acceptable.",
        scores: 9..=10,
        target_equity: 0.90,
        target_bonds: 0.07,
        target_cash: 0.02,
        target_alts: 0.01,
    },
];

impl RiskBand {
    /// Band containing `score`; anything outside the table maps to the most
    /// aggressive band.
    pub fn for_score(score: u8) -> &'static RiskBand {
        RISK_BANDS
            .iter()
            .find(|b| b.scores.contains(&score))
            .unwrap_or(&RISK_BANDS[RISK_BANDS.len() - 1])
    }

    pub fn total(&self) -> f64 {
        self.target_equity + self.target_bonds + self.target_cash + self.target_alts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_score_has_a_band() {
        for score in 1..=10u8 {
            let band = RiskBand::for_score(score);
            assert!(band.scores.contains(&score), "score {score}");
        }
        assert_eq!(RiskBand::for_score(6).title, "Moderate");
        assert_eq!(RiskBand::for_score(0).title, "Aggressive");
    }

    #[test]
    fn targets_sum_to_one() {
        for band in &RISK_BANDS {
            assert!((band.total() - 1.0).abs() < 1e-9, "{}", band.title);
        }
    }
}
