//! Orchestration: dataset loading, context-augmented prompting, answer
//! recording and conclusion extraction.
//!
//! The analyzer owns the current dataset and delegates every memory mutation
//! to [`SessionMemory`]. Each question runs to completion before the next one
//! is accepted; LLM and rendering failures resolve into reply variants, never
//! into panics or propagated faults.

use crate::config::AnalyzerConfig;
use crate::llm::LlmClient;
use crate::memory::{Confidence, SessionMemory};
use crate::profile::DatasetProfile;
use crate::viz;
use polars::prelude::DataFrame;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are a data analysis expert with contextual memory. \
Use the history of previous analyses to enrich your answers. \
Identify patterns, trends and relationships in the data. \
At the end of each analysis, suggest next steps or related questions.";

const NO_DATASET_GUIDANCE: &str = "Please load a CSV dataset first.";

/// Phrases whose presence in an answer marks an extractable conclusion.
const CONCLUSION_MARKERS: &[&str] = &[
    "we conclude that",
    "therefore",
    "thus",
    "in summary",
    "this indicates",
    "this suggests",
    "evidence that",
    "demonstrates",
];

/// Outcome of one question. Callers must branch on all three paths.
#[derive(Debug, Clone)]
pub enum AnalyzerReply {
    /// Successful analysis, with or without a chart.
    Answer { text: String, chart: Option<String> },
    /// No dataset loaded; guidance instead of a failure.
    NoDataset { guidance: String },
    /// The LLM call failed; the session continues.
    LlmFailure { reason: String },
}

impl AnalyzerReply {
    pub fn text(&self) -> &str {
        match self {
            Self::Answer { text, .. } => text,
            Self::NoDataset { guidance } => guidance,
            Self::LlmFailure { reason } => reason,
        }
    }

    pub fn chart(&self) -> Option<&str> {
        match self {
            Self::Answer { chart, .. } => chart.as_deref(),
            _ => None,
        }
    }
}

pub struct IntelligentAnalyzer {
    llm: LlmClient,
    config: AnalyzerConfig,
    dataset: Option<DataFrame>,
    profile: Option<DatasetProfile>,
    memory: SessionMemory,
}

impl IntelligentAnalyzer {
    pub fn new(llm: LlmClient, config: AnalyzerConfig) -> Self {
        Self {
            llm,
            config,
            dataset: None,
            profile: None,
            memory: SessionMemory::new(),
        }
    }

    /// Replace the dataset. Memory is reset first, so no record from a prior
    /// dataset survives, then the initial profile conclusion is stored at
    /// high confidence. Profiling failures degrade to a row-count conclusion.
    pub fn load_dataset(&mut self, df: DataFrame) {
        self.memory.reset();

        let conclusion = match DatasetProfile::build(&df, &self.config) {
            Ok(profile) => {
                let text = profile.initial_conclusion(&self.config);
                self.profile = Some(profile);
                text
            }
            Err(e) => {
                warn!("dataset profiling failed, recording minimal conclusion: {}", e);
                self.profile = None;
                format!("Initial scan: {} rows loaded", df.height())
            }
        };
        self.memory.add_conclusion(&conclusion, Confidence::High);
        info!(
            "dataset loaded: {} rows x {} columns",
            df.height(),
            df.width()
        );
        self.dataset = Some(df);
    }

    /// Answer one question against the loaded dataset.
    pub async fn answer(&mut self, question: &str) -> AnalyzerReply {
        let df = match &self.dataset {
            Some(df) => df,
            None => {
                return AnalyzerReply::NoDataset {
                    guidance: NO_DATASET_GUIDANCE.to_string(),
                }
            }
        };

        let prompt = self.compose_prompt(question, df);
        let answer = match self
            .llm
            .chat(
                SYSTEM_PROMPT,
                &prompt,
                self.config.temperature,
                self.config.max_tokens,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("LLM call failed: {}", e);
                return AnalyzerReply::LlmFailure {
                    reason: format!("Error processing question: {}", e),
                };
            }
        };

        self.memory.record_analysis(question, &answer, None);
        let chart = viz::chart_for(question, df);
        self.extract_conclusion(&answer);

        AnalyzerReply::Answer {
            text: answer,
            chart,
        }
    }

    fn compose_prompt(&self, question: &str, df: &DataFrame) -> String {
        let history = self.memory.recent_history(self.config.history_context);
        let history_block = if history.is_empty() {
            "No prior analysis history.".to_string()
        } else {
            let mut block = String::from("### Recent analysis history:\n");
            for (i, record) in history.iter().enumerate() {
                let excerpt: String = record
                    .answer
                    .chars()
                    .take(self.config.answer_excerpt_chars)
                    .collect();
                block.push_str(&format!(
                    "{}. Question: {}\n   Category: {}\n   Summary: {}...\n",
                    i + 1,
                    record.question,
                    record.category,
                    excerpt
                ));
            }
            block
        };

        let data_block = match &self.profile {
            Some(profile) => profile.prompt_block(df),
            None => format!(
                "Dataset information:\n- Shape: {} rows x {} columns\n",
                df.height(),
                df.width()
            ),
        };

        format!(
            "{}\n\n{}\nCurrent question: {}\n\n\
             Using the analysis history and the current data, provide a complete answer. \
             Consider patterns already identified and previous conclusions.",
            history_block, data_block, question
        )
    }

    /// Store the first marker-bearing sentence of the answer as a
    /// medium-confidence conclusion.
    fn extract_conclusion(&mut self, answer: &str) {
        let answer_lower = answer.to_lowercase();
        let Some(marker) = CONCLUSION_MARKERS
            .iter()
            .copied()
            .find(|m| answer_lower.contains(m))
        else {
            return;
        };
        for sentence in answer.split('.') {
            if sentence.to_lowercase().contains(marker) {
                self.memory
                    .add_conclusion(sentence.trim(), Confidence::Medium);
                break;
            }
        }
    }

    /// Report of accumulated conclusions and insights.
    pub fn summarize(&self) -> String {
        self.memory.summarize_conclusions()
    }

    /// Clear the memory without touching the loaded dataset.
    pub fn reset(&mut self) {
        self.memory.reset();
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    pub fn dataset(&self) -> Option<&DataFrame> {
        self.dataset.as_ref()
    }

    pub fn profile(&self) -> Option<&DatasetProfile> {
        self.profile.as_ref()
    }
}
