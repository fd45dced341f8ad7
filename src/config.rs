//! Runtime configuration for the analyzer.
//!
//! The heuristic knobs (dataset size thresholds, IQR multiplier, context
//! window sizes) live here rather than as magic numbers in the code that
//! uses them. Defaults reproduce the original behavior.

use tracing::warn;

/// Placeholder key that routes the LLM client into offline mode.
pub const OFFLINE_API_KEY: &str = "offline";

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Chat-completion model identifier.
    pub model: String,

    /// OpenAI-compatible endpoint base URL.
    pub base_url: String,

    /// Sampling temperature for analysis answers.
    pub temperature: f64,

    /// Token ceiling per completion.
    pub max_tokens: u32,

    /// Row count above which a dataset is called large.
    pub large_dataset_rows: usize,

    /// Row count below which a dataset is called small.
    pub small_dataset_rows: usize,

    /// IQR multiplier for outlier bounds.
    pub iqr_multiplier: f64,

    /// How many numeric columns the initial profile scans for outliers.
    pub profiled_numeric_columns: usize,

    /// How many prior analyses feed the prompt context.
    pub history_context: usize,

    /// Characters of each prior answer included in the prompt context.
    pub answer_excerpt_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            temperature: 0.3,
            max_tokens: 1024,
            large_dataset_rows: 1000,
            small_dataset_rows: 100,
            iqr_multiplier: 1.5,
            profiled_numeric_columns: 3,
            history_context: 3,
            answer_excerpt_chars: 200,
        }
    }
}

impl AnalyzerConfig {
    /// Resolve the API key from the environment.
    ///
    /// A missing key is a warning, not a startup failure: the engine degrades
    /// to the offline stub client so the rest of the pipeline keeps working.
    pub fn api_key_from_env() -> String {
        match std::env::var("GROQ_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                warn!("GROQ_API_KEY not set; LLM client running in offline mode");
                OFFLINE_API_KEY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_heuristics() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.large_dataset_rows, 1000);
        assert_eq!(cfg.small_dataset_rows, 100);
        assert!((cfg.iqr_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(cfg.max_tokens, 1024);
        assert!((cfg.temperature - 0.3).abs() < f64::EPSILON);
    }
}
