pub mod anthropic;
pub mod error;

use crate::domain::payload::Prediction;
use crate::domain::profile::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
}

/// Model output an item's explanation can be conditioned on.
#[derive(Debug, Clone, Copy)]
pub enum ExplainContext<'a> {
    Prediction(&'a Prediction),
    AssetClass(&'a str),
}

/// Per-item rationale source.
///
/// Implementations may fail or hang; the normalizer bounds each call and
/// substitutes a generic rationale on any error.
#[async_trait::async_trait]
pub trait ExplanationProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn explain(
        &self,
        symbol: &str,
        profile: &UserProfile,
        context: Option<ExplainContext<'_>>,
    ) -> anyhow::Result<String>;
}
