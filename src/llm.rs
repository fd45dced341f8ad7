//! Chat-completion client.
//!
//! One blocking-per-question call against an OpenAI-compatible endpoint.
//! When no real API key is configured the client answers with a canned
//! completion so the rest of the pipeline stays exercisable.

use crate::config::{AnalyzerConfig, OFFLINE_API_KEY};
use crate::error::{InsightError, Result};

const OFFLINE_ANSWER: &str = "Offline analysis: the first numeric column shows a high maximum \
and a low minimum. Therefore, most values cluster near the median. \
Suggested next step: ask about the distribution of another column.";

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, config: &AnalyzerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Client that never touches the network.
    pub fn offline(config: &AnalyzerConfig) -> Self {
        Self::new(OFFLINE_API_KEY.to_string(), config)
    }

    pub fn is_offline(&self) -> bool {
        self.api_key == OFFLINE_API_KEY
    }

    /// Submit one prompt, receive one text completion.
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        if self.is_offline() {
            return Ok(OFFLINE_ANSWER.to_string());
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": temperature,
            "max_tokens": max_tokens
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Llm(format!("LLM API call failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(InsightError::Llm(format!(
                "LLM API returned status {}",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InsightError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| InsightError::Llm("No content in LLM response".to_string()))?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_client_answers_deterministically() {
        let client = LlmClient::offline(&AnalyzerConfig::default());
        assert!(client.is_offline());
        let a = client.chat("system", "user", 0.3, 1024).await.unwrap();
        let b = client.chat("system", "other", 0.3, 1024).await.unwrap();
        assert_eq!(a, b);
        assert!(a.to_lowercase().contains("therefore"));
    }
}
