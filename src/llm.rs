//! LLMエンドポイント連携
//!
//! `{model, prompt}` をPOSTし、生成テキストを返す

use crate::error::{Result, SurveyAiError};
use serde::Serialize;
use survey_ai_common::parse_generated_body;
use tracing::{debug, warn};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl LlmClient {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            model: model.into(),
        }
    }

    /// プロンプトを送って生成テキストを取得
    ///
    /// 認識できるフィールドが無いレスポンスは `UnexpectedLlmResponse`
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(url = %self.url, model = %self.model, prompt_len = prompt.len(), "calling LLM");

        let response = self
            .http
            .post(&self.url)
            .json(&GenerateRequest { model: &self.model, prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SurveyAiError::LlmHttpStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_generated_body(&body).ok_or_else(|| {
            warn!(%body, "LLM response without generated text");
            SurveyAiError::UnexpectedLlmResponse
        })
    }
}
