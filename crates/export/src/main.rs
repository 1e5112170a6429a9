use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskwise_core::config::Settings;
use riskwise_core::domain::answers::AnswerSet;
use riskwise_core::llm::anthropic::AnthropicExplainer;
use riskwise_core::normalize::{normalize, Enrichment};
use riskwise_core::pipeline::assess;
use riskwise_core::questions::default_questions;
use riskwise_core::scoring::ValidationError;

#[derive(Debug, Parser)]
#[command(name = "riskwise_export")]
struct Args {
    /// Questionnaire answers (JSON object keyed by question key).
    #[arg(long)]
    answers: PathBuf,

    /// Analysis payload JSON from the upstream analysis service.
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Write the report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip per-item rationale enrichment even when a provider key is set.
    #[arg(long)]
    no_enrich: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match run(&settings, &args).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => match invalid_answers(&err) {
            Some(invalid) => {
                tracing::info!(key = invalid.key(), "answers failed validation");
                eprintln!("invalid answers: {invalid}");
                Ok(ExitCode::from(2))
            }
            None => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "report export failed");
                Err(err)
            }
        },
    }
}

/// Bad input is the user's to fix, not an exception to report.
fn invalid_answers(err: &anyhow::Error) -> Option<&ValidationError> {
    err.downcast_ref::<ValidationError>()
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    let mut answers: AnswerSet = read_json(&args.answers)?;
    let payload: Option<serde_json::Value> = match &args.payload {
        Some(path) => Some(read_json(path)?),
        None => None,
    };

    let assessment = assess(
        &mut answers,
        &default_questions(),
        &settings.default_jurisdiction,
    )
    .context("answers failed validation")?;

    let explainer = if args.no_enrich || !settings.enrichment_enabled() {
        None
    } else {
        Some(AnthropicExplainer::from_settings(settings)?)
    };
    let enrichment = explainer
        .as_ref()
        .map(|p| Enrichment::new(p, settings.explanation_timeout));

    let recommendations = normalize(
        assessment.trader_type,
        payload.as_ref(),
        &assessment.profile,
        enrichment.as_ref(),
    )
    .await;

    let report = riskwise_core::report::compose(
        &assessment.risk,
        assessment.trader_type,
        &recommendations,
        chrono::Utc::now(),
    );

    match &args.out {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                items = recommendations.items.len(),
                source = ?recommendations.source,
                "wrote report"
            );
        }
        None => print!("{report}"),
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> Settings {
        Settings {
            default_jurisdiction: "CA".to_string(),
            explanation_timeout: Duration::from_secs(1),
            ..Settings::default()
        }
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("riskwise_export_{}_{name}", std::process::id()))
    }

    #[test]
    fn parses_flags() {
        let args = Args::parse_from([
            "riskwise_export",
            "--answers",
            "a.json",
            "--payload",
            "p.json",
            "--no-enrich",
        ]);
        assert_eq!(args.answers, PathBuf::from("a.json"));
        assert_eq!(args.payload, Some(PathBuf::from("p.json")));
        assert!(args.out.is_none());
        assert!(args.no_enrich);
    }

    #[tokio::test]
    async fn writes_report_for_portfolio_payload() {
        let answers = scratch("answers.json");
        let payload = scratch("payload.json");
        let out = scratch("report.txt");
        std::fs::write(
            &answers,
            serde_json::json!({
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
                "investor_style": "I enjoy taking calculated risks.",
                "portfolio_priority": "Balanced Growth"
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            &payload,
            serde_json::json!({
                "portfolio": [
                    {"asset": "VTI", "name": "Vanguard Total Stock Market", "weight": 0.7, "notes": "Equity / US"},
                    {"asset": "CASH", "weight": 0.3}
                ],
                "quotes": {"VTI": {"c": 250.0, "dp": 0.3}}
            })
            .to_string(),
        )
        .unwrap();

        let args = Args {
            answers: answers.clone(),
            payload: Some(payload.clone()),
            out: Some(out.clone()),
            no_enrich: true,
        };
        run(&settings(), &args).await.unwrap();

        let report = std::fs::read_to_string(&out).unwrap();
        assert!(report.contains("Risk score: 7/10 (Moderately Aggressive)"));
        assert!(report.contains("1. VTI | 70.0% weight | Vanguard Total Stock Market"));
        assert!(report.contains("  VTI: price $250.00, change +0.30%"));
        assert!(report.contains("  CASH: N/A"));

        for p in [answers, payload, out] {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn io_failures_are_not_treated_as_invalid_answers() {
        let err = read_json::<serde_json::Value>(&scratch("missing.json")).unwrap_err();
        assert!(invalid_answers(&err).is_none());
    }

    #[tokio::test]
    async fn invalid_answers_fail_with_the_offending_key() {
        let answers = scratch("bad_answers.json");
        std::fs::write(&answers, r#"{"income": 5000}"#).unwrap();
        let args = Args {
            answers: answers.clone(),
            payload: None,
            out: None,
            no_enrich: true,
        };
        let err = run(&settings(), &args).await.unwrap_err();
        let invalid = invalid_answers(&err).expect("validation error");
        assert_eq!(invalid.key(), "expenses");
        assert!(format!("{err:#}").contains("expenses"));
        let _ = std::fs::remove_file(answers);
    }
}
