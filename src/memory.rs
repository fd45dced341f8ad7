//! Session-scoped analysis memory.
//!
//! Stores the analysis history, extracted insights, detected patterns and
//! accumulated conclusions for one loaded dataset. Classification and insight
//! extraction are fixed keyword rule tables scanned in priority order.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

const DISTRIBUTION_WORDS: &[&str] = &["distribution", "histogram", "frequency"];
const CORRELATION_WORDS: &[&str] = &["correlation", "relationship", "association"];
const TREND_WORDS: &[&str] = &["trend", "evolution", "time"];
const COMPARISON_WORDS: &[&str] = &["comparison", "difference", "category"];

/// Vocabulary scanned against LLM answers when extracting insights.
pub const INSIGHT_KEYWORDS: &[&str] = &[
    "high",
    "low",
    "increase",
    "decrease",
    "correlation",
    "significant",
    "outlier",
    "pattern",
    "trend",
    "higher",
    "lower",
    "maximum",
    "minimum",
];

const NO_CONCLUSIONS_MESSAGE: &str =
    "No significant conclusions identified yet. Run more analyses to generate insights.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisCategory {
    Distribution,
    Correlation,
    Trend,
    Comparison,
    General,
}

impl AnalysisCategory {
    /// Classify a question by keyword match. First matching category wins;
    /// precedence is distribution > correlation > trend > comparison.
    pub fn classify(question: &str) -> Self {
        let q = question.to_lowercase();
        let rules = [
            (DISTRIBUTION_WORDS, Self::Distribution),
            (CORRELATION_WORDS, Self::Correlation),
            (TREND_WORDS, Self::Trend),
            (COMPARISON_WORDS, Self::Comparison),
        ];
        for (words, category) in rules {
            if words.iter().any(|w| q.contains(w)) {
                return category;
            }
        }
        Self::General
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distribution => "distribution",
            Self::Correlation => "correlation",
            Self::Trend => "trend",
            Self::Comparison => "comparison",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for AnalysisCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// One question/answer turn, immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    pub metric: Option<f64>,
    pub category: AnalysisCategory,
}

/// Keyword-triggered snippet extracted from an LLM answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub timestamp: DateTime<Utc>,
    pub keyword: String,
    /// First 100 characters of the question that prompted the answer.
    pub context: String,
    pub summary: String,
}

impl Insight {
    /// Content equality, ignoring the timestamp. Used for deduplication.
    fn same_content(&self, other: &Insight) -> bool {
        self.keyword == other.keyword
            && self.context == other.context
            && self.summary == other.summary
    }
}

/// Recorded but never read back; kept as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_type: String,
    pub description: String,
    pub supporting_data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conclusion {
    pub text: String,
    pub confidence: Confidence,
    pub timestamp: DateTime<Utc>,
    /// History length at the time the conclusion was recorded.
    pub basis: usize,
}

/// Memory for exactly one loaded dataset. Loading a new dataset resets it.
#[derive(Debug, Default)]
pub struct SessionMemory {
    history: Vec<AnalysisRecord>,
    insights: Vec<Insight>,
    patterns: Vec<Pattern>,
    conclusions: Vec<Conclusion>,
    interactions: usize,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one question/answer turn and extract insights from the answer.
    pub fn record_analysis(&mut self, question: &str, answer: &str, metric: Option<f64>) {
        let record = AnalysisRecord {
            timestamp: Utc::now(),
            question: question.to_string(),
            answer: answer.to_string(),
            metric,
            category: AnalysisCategory::classify(question),
        };
        self.history.push(record);
        self.interactions += 1;
        self.extract_insights(answer, question);
    }

    fn extract_insights(&mut self, answer: &str, question: &str) {
        let answer_lower = answer.to_lowercase();
        for keyword in INSIGHT_KEYWORDS {
            if !answer_lower.contains(keyword) {
                continue;
            }
            let candidate = Insight {
                timestamp: Utc::now(),
                keyword: keyword.to_string(),
                context: truncate_chars(question, 100),
                summary: summarize_keyword(answer, keyword),
            };
            if !self.insights.iter().any(|i| i.same_content(&candidate)) {
                self.insights.push(candidate);
            }
        }
    }

    pub fn add_pattern(
        &mut self,
        pattern_type: &str,
        description: &str,
        supporting_data: serde_json::Value,
    ) {
        self.patterns.push(Pattern {
            pattern_type: pattern_type.to_string(),
            description: description.to_string(),
            supporting_data,
            timestamp: Utc::now(),
        });
    }

    pub fn add_conclusion(&mut self, text: &str, confidence: Confidence) {
        self.conclusions.push(Conclusion {
            text: text.to_string(),
            confidence,
            timestamp: Utc::now(),
            basis: self.history.len(),
        });
    }

    /// Formatted report: up to the 5 most recent conclusions, then up to 5
    /// first-seen-per-keyword insight summaries, then the interaction count.
    pub fn summarize_conclusions(&self) -> String {
        if self.conclusions.is_empty() && self.insights.is_empty() {
            return NO_CONCLUSIONS_MESSAGE.to_string();
        }

        let mut report = String::from("## Conclusions and Insights\n\n");

        if !self.conclusions.is_empty() {
            report.push_str("### Key conclusions:\n");
            let start = self.conclusions.len().saturating_sub(5);
            for (i, conclusion) in self.conclusions[start..].iter().enumerate() {
                report.push_str(&format!(
                    "{}. {} (confidence: {})\n",
                    i + 1,
                    conclusion.text,
                    conclusion.confidence
                ));
            }
        }

        if !self.insights.is_empty() {
            report.push_str("\n### Detected insights:\n");
            for insight in self
                .insights
                .iter()
                .unique_by(|i| i.keyword.as_str())
                .take(5)
            {
                report.push_str(&format!("- {}: {}\n", insight.keyword, insight.summary));
            }
        }

        report.push_str(&format!("\nBased on {} recorded analyses", self.interactions));
        report
    }

    /// Last `limit` records in chronological order.
    pub fn recent_history(&self, limit: usize) -> &[AnalysisRecord] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    /// Clear everything. Callers never observe a partially cleared state.
    pub fn reset(&mut self) {
        self.history.clear();
        self.insights.clear();
        self.patterns.clear();
        self.conclusions.clear();
        self.interactions = 0;
    }

    pub fn history(&self) -> &[AnalysisRecord] {
        &self.history
    }

    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn conclusions(&self) -> &[Conclusion] {
        &self.conclusions
    }

    pub fn interactions(&self) -> usize {
        self.interactions
    }
}

/// First sentence of `answer` containing `keyword` (case-insensitive), else
/// the first 150 characters with an ellipsis.
fn summarize_keyword(answer: &str, keyword: &str) -> String {
    for sentence in answer.split('.') {
        if sentence.to_lowercase().contains(keyword) {
            return sentence.trim().to_string();
        }
    }
    format!("{}...", truncate_chars(answer, 150))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_precedence() {
        assert_eq!(
            AnalysisCategory::classify("Show me the distribution of ages"),
            AnalysisCategory::Distribution
        );
        assert_eq!(
            AnalysisCategory::classify("Is there a correlation here?"),
            AnalysisCategory::Correlation
        );
        assert_eq!(
            AnalysisCategory::classify("What is the trend over the years?"),
            AnalysisCategory::Trend
        );
        assert_eq!(
            AnalysisCategory::classify("What is the difference between groups?"),
            AnalysisCategory::Comparison
        );
        assert_eq!(
            AnalysisCategory::classify("Tell me something"),
            AnalysisCategory::General
        );
        // distribution outranks correlation when both match
        assert_eq!(
            AnalysisCategory::classify("histogram of the correlation residuals"),
            AnalysisCategory::Distribution
        );
        // correlation outranks trend
        assert_eq!(
            AnalysisCategory::classify("relationship with the trend column"),
            AnalysisCategory::Correlation
        );
    }

    #[test]
    fn record_analysis_is_append_only() {
        let mut memory = SessionMemory::new();
        memory.record_analysis("first question", "plain answer", None);
        assert_eq!(memory.history().len(), 1);
        memory.record_analysis("second question", "plain answer", Some(3.5));
        assert_eq!(memory.history().len(), 2);
        assert_eq!(memory.interactions(), 2);
        assert_eq!(memory.history()[0].question, "first question");
        assert_eq!(memory.history()[1].metric, Some(3.5));
    }

    #[test]
    fn recent_history_respects_limit_and_order() {
        let mut memory = SessionMemory::new();
        for i in 0..7 {
            memory.record_analysis(&format!("q{}", i), "answer", None);
        }
        let recent = memory.recent_history(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].question, "q2");
        assert_eq!(recent[4].question, "q6");
        assert_eq!(memory.recent_history(100).len(), 7);
    }

    #[test]
    fn insight_extraction_and_dedup() {
        let mut memory = SessionMemory::new();
        memory.record_analysis(
            "any question",
            "The maximum value is high. Nothing else stands out.",
            None,
        );
        let kw: Vec<&str> = memory.insights().iter().map(|i| i.keyword.as_str()).collect();
        assert!(kw.contains(&"high"));
        assert!(kw.contains(&"maximum"));
        let before = memory.insights().len();

        // identical question/answer pair produces structurally identical
        // insights, which must be suppressed
        memory.record_analysis(
            "any question",
            "The maximum value is high. Nothing else stands out.",
            None,
        );
        assert_eq!(memory.insights().len(), before);

        // same keyword with a different summary is a distinct insight
        memory.record_analysis("any question", "A high outlier count appeared.", None);
        let high_count = memory
            .insights()
            .iter()
            .filter(|i| i.keyword == "high")
            .count();
        assert_eq!(high_count, 2);
    }

    #[test]
    fn insight_context_is_truncated_question() {
        let mut memory = SessionMemory::new();
        let long_question = "q".repeat(250);
        memory.record_analysis(&long_question, "a low reading", None);
        let insight = &memory.insights()[0];
        assert_eq!(insight.context.chars().count(), 100);
        assert!(long_question.starts_with(&insight.context));
    }

    #[test]
    fn insight_summary_prefers_keyword_sentence() {
        let mut memory = SessionMemory::new();
        memory.record_analysis(
            "question",
            "The first column is stable. An outlier was found in income. Done.",
            None,
        );
        let insight = memory
            .insights()
            .iter()
            .find(|i| i.keyword == "outlier")
            .unwrap();
        assert_eq!(insight.summary, "An outlier was found in income");
    }

    #[test]
    fn conclusion_basis_tracks_history_length() {
        let mut memory = SessionMemory::new();
        memory.add_conclusion("initial profile", Confidence::High);
        assert_eq!(memory.conclusions()[0].basis, 0);
        memory.record_analysis("q", "a", None);
        memory.add_conclusion("derived", Confidence::Medium);
        assert_eq!(memory.conclusions()[1].basis, 1);
    }

    #[test]
    fn summary_on_empty_memory_is_fixed_message() {
        let memory = SessionMemory::new();
        assert_eq!(memory.summarize_conclusions(), NO_CONCLUSIONS_MESSAGE);
    }

    #[test]
    fn summary_contains_conclusion_and_confidence() {
        let mut memory = SessionMemory::new();
        memory.add_conclusion("X", Confidence::High);
        let report = memory.summarize_conclusions();
        assert!(report.contains("X"));
        assert!(report.contains("high"));
        assert!(report.contains("Based on 0 recorded analyses"));
    }

    #[test]
    fn summary_lists_at_most_five_recent_conclusions() {
        let mut memory = SessionMemory::new();
        for i in 0..8 {
            memory.add_conclusion(&format!("conclusion-{}", i), Confidence::Medium);
        }
        let report = memory.summarize_conclusions();
        assert!(!report.contains("conclusion-2"));
        assert!(report.contains("conclusion-3"));
        assert!(report.contains("conclusion-7"));
    }

    #[test]
    fn summary_insights_are_first_seen_per_keyword() {
        let mut memory = SessionMemory::new();
        memory.record_analysis("q1", "A high spike appeared early.", None);
        memory.record_analysis("q2", "Another high reading came later.", None);
        let report = memory.summarize_conclusions();
        assert!(report.contains("A high spike appeared early"));
        assert!(!report.contains("Another high reading came later"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut memory = SessionMemory::new();
        memory.record_analysis("q", "a high value", None);
        memory.add_pattern("seasonal", "monthly spike", serde_json::json!({"month": 6}));
        memory.add_conclusion("c", Confidence::Low);
        memory.reset();
        assert!(memory.history().is_empty());
        assert!(memory.insights().is_empty());
        assert!(memory.patterns().is_empty());
        assert!(memory.conclusions().is_empty());
        assert_eq!(memory.interactions(), 0);
    }
}
