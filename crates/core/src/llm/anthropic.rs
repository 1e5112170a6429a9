use crate::config::Settings;
use crate::domain::profile::UserProfile;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{ExplainContext, ExplanationProvider, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicExplainer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicExplainer {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url = settings.anthropic_base_url.clone();
        let model = settings.anthropic_model.clone();
        let max_tokens = settings.anthropic_max_tokens;

        // The normalizer enforces its own per-item deadline; this is a backstop
        // for callers that use the client directly.
        let http = reqwest::Client::builder()
            .timeout(settings.explanation_timeout + Duration::from_secs(5))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    async fn create_message(&self, req: CreateMessageRequest) -> anyhow::Result<CreateMessageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        serde_json::from_str::<CreateMessageResponse>(&text)
            .with_context(|| format!("failed to decode Anthropic response: {text}"))
    }

    fn system_prompt() -> String {
        [
            "You are a fiduciary financial advisor explaining recommendations to a client.",
            "Given the user profile and the model output, explain clearly why this recommendation",
            "makes sense (or does not) for this specific user.",
            "Always compare the investment's risk with the user's risk score. If the model signals",
            "BUY or SELL with high confidence, acknowledge it and state the risk comparison.",
            "Consider risk tolerance, horizon, financial situation and experience.",
            "Answer in plain prose, three sentences or fewer. No markdown, no JSON, no guarantees.",
        ]
        .join("\n")
    }

    fn user_prompt(
        symbol: &str,
        profile: &UserProfile,
        context: Option<ExplainContext<'_>>,
    ) -> anyhow::Result<String> {
        let profile_json =
            serde_json::to_string(profile).context("failed to serialize user profile")?;
        let context_json = match context {
            Some(ExplainContext::Prediction(p)) => {
                serde_json::to_string(p).context("failed to serialize prediction")?
            }
            Some(ExplainContext::AssetClass(class)) => {
                serde_json::json!({ "asset_class": class }).to_string()
            }
            None => "null".to_string(),
        };

        Ok(format!(
            "User profile: {profile_json}\nModel output: {context_json}\nSymbol: {symbol}\n\n\
Explain why this recommendation suits this user."
        ))
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out.trim().to_string()
    }
}

#[async_trait::async_trait]
impl ExplanationProvider for AnthropicExplainer {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn explain(
        &self,
        symbol: &str,
        profile: &UserProfile,
        context: Option<ExplainContext<'_>>,
    ) -> anyhow::Result<String> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(Self::system_prompt()),
            messages: vec![Message {
                role: "user",
                content: Self::user_prompt(symbol, profile, context)?,
            }],
        };

        let res = self.create_message(req).await?;
        let text = Self::response_text(&res);
        if text.is_empty() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "empty_output",
                detail: format!("no text blocks for {symbol} (stop_reason={:?})", res.stop_reason),
                raw_output: None,
                raw_response_json: None,
            }
            .into());
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Unknown,
}
