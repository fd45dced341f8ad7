//! Session-scoped context: one analyzer plus one conversation log.
//!
//! Sessions are explicit values rather than process globals, so several
//! independent sessions can coexist in one process (and in one test).

use crate::analyzer::{AnalyzerReply, IntelligentAnalyzer};
use crate::config::AnalyzerConfig;
use crate::conversation::{ConversationLog, Sender};
use crate::llm::LlmClient;
use uuid::Uuid;

pub struct AnalysisSession {
    id: Uuid,
    analyzer: IntelligentAnalyzer,
    conversation: ConversationLog,
}

impl AnalysisSession {
    pub fn new(llm: LlmClient, config: AnalyzerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            analyzer: IntelligentAnalyzer::new(llm, config),
            conversation: ConversationLog::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask one question, recording both sides of the exchange in the
    /// conversation log.
    pub async fn ask(&mut self, question: &str) -> AnalyzerReply {
        self.conversation.push(Sender::User, question, None);
        let reply = self.analyzer.answer(question).await;
        self.conversation.push(
            Sender::Assistant,
            reply.text().to_string(),
            reply.chart().map(String::from),
        );
        reply
    }

    pub fn analyzer(&self) -> &IntelligentAnalyzer {
        &self.analyzer
    }

    pub fn analyzer_mut(&mut self) -> &mut IntelligentAnalyzer {
        &mut self.analyzer
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }
}
