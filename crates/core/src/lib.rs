pub mod domain;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod policy;
pub mod questions;
pub mod report;
pub mod scoring;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    const DEFAULT_EXPLANATION_TIMEOUT_SECS: u64 = 20;
    const DEFAULT_JURISDICTION: &str = "CA";
    const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
    const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";
    const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 300;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub anthropic_api_key: Option<String>,
        pub anthropic_base_url: String,
        pub anthropic_model: String,
        pub anthropic_max_tokens: u32,
        pub sentry_dsn: Option<String>,
        pub default_jurisdiction: String,
        pub explanation_timeout: Duration,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                anthropic_api_key: None,
                anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
                anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
                anthropic_max_tokens: DEFAULT_ANTHROPIC_MAX_TOKENS,
                sentry_dsn: None,
                default_jurisdiction: DEFAULT_JURISDICTION.to_string(),
                explanation_timeout: Duration::from_secs(DEFAULT_EXPLANATION_TIMEOUT_SECS),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Build settings from any key lookup; unset or blank keys take defaults.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let get = |key: &str| {
                lookup(key)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            };
            let defaults = Self::default();

            Ok(Self {
                anthropic_api_key: get("ANTHROPIC_API_KEY"),
                anthropic_base_url: get("ANTHROPIC_BASE_URL").unwrap_or(defaults.anthropic_base_url),
                anthropic_model: get("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
                anthropic_max_tokens: parse_or(get("ANTHROPIC_MAX_TOKENS"), "ANTHROPIC_MAX_TOKENS")?
                    .unwrap_or(defaults.anthropic_max_tokens),
                sentry_dsn: get("SENTRY_DSN"),
                default_jurisdiction: get("DEFAULT_JURISDICTION")
                    .map(|s| s.to_uppercase())
                    .unwrap_or(defaults.default_jurisdiction),
                explanation_timeout: parse_or(get("EXPLANATION_TIMEOUT_SECS"), "EXPLANATION_TIMEOUT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.explanation_timeout),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        /// Enrichment is opt-in: it only runs when a provider key is configured.
        pub fn enrichment_enabled(&self) -> bool {
            self.anthropic_api_key.is_some()
        }
    }

    fn parse_or<T>(raw: Option<String>, key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        raw.map(|s| {
            s.parse::<T>()
                .with_context(|| format!("{key} is not a number: {s}"))
        })
        .transpose()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn empty_environment_takes_defaults() {
            let s = Settings::from_lookup(lookup(&[])).unwrap();
            assert!(s.anthropic_api_key.is_none());
            assert!(!s.enrichment_enabled());
            assert_eq!(s.anthropic_max_tokens, 300);
            assert_eq!(s.default_jurisdiction, "CA");
            assert_eq!(s.explanation_timeout, Duration::from_secs(20));
        }

        #[test]
        fn reads_provider_overrides() {
            let s = Settings::from_lookup(lookup(&[
                ("ANTHROPIC_API_KEY", "k"),
                ("ANTHROPIC_BASE_URL", "http://localhost:9999"),
                ("ANTHROPIC_MODEL", "claude-test"),
                ("ANTHROPIC_MAX_TOKENS", " 512 "),
                ("DEFAULT_JURISDICTION", "us"),
                ("EXPLANATION_TIMEOUT_SECS", "5"),
            ]))
            .unwrap();
            assert_eq!(s.require_anthropic_api_key().unwrap(), "k");
            assert_eq!(s.anthropic_base_url, "http://localhost:9999");
            assert_eq!(s.anthropic_model, "claude-test");
            assert_eq!(s.anthropic_max_tokens, 512);
            assert_eq!(s.default_jurisdiction, "US");
            assert_eq!(s.explanation_timeout, Duration::from_secs(5));
        }

        #[test]
        fn non_numeric_limits_are_errors() {
            for key in ["ANTHROPIC_MAX_TOKENS", "EXPLANATION_TIMEOUT_SECS"] {
                let err = Settings::from_lookup(lookup(&[(key, "lots")])).unwrap_err();
                assert!(err.to_string().contains(key), "{err}");
            }
        }
    }
}
