//! Conversational analysis engine for tabular data.
//!
//! A user loads a CSV, asks natural-language questions, and gets an
//! LLM-generated answer paired with a heuristically selected chart. The
//! session memory classifies questions, extracts keyword insights from
//! answers and accumulates confidence-tagged conclusions.

pub mod analyzer;
pub mod config;
pub mod conversation;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod memory;
pub mod profile;
pub mod session;
pub mod viz;

pub use analyzer::{AnalyzerReply, IntelligentAnalyzer};
pub use config::AnalyzerConfig;
pub use error::{InsightError, Result};
pub use llm::LlmClient;
pub use memory::{AnalysisCategory, Confidence, SessionMemory};
pub use session::AnalysisSession;
