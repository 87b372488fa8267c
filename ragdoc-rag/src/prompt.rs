//! Grounded prompt assembly.
//!
//! Retrieved chunk texts are joined in relevance order and interpolated with
//! the question into a fixed two-message conversation that tells the model to
//! answer only from the supplied context.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::QueryResult;

/// System instruction sent with every question.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Answer questions based on the \
provided context. If the context doesn't contain the answer, say so clearly.";

/// Separator placed between retrieved chunk texts.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation.
    System,
    /// The end user's turn.
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::User => f.write_str("user"),
        }
    }
}

/// A role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// An ordered, immutable list of messages sent to a completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Wrap an ordered list of messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// The messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Join the texts of retrieved matches, most relevant first.
pub fn join_context(result: &QueryResult) -> String {
    result
        .matches
        .iter()
        .map(|m| m.metadata.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Build the system + user conversation for a question over `context`.
pub fn build_conversation(context: &str, question: &str) -> Conversation {
    Conversation::new(vec![
        Message::system(SYSTEM_INSTRUCTION),
        Message::user(format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ChunkMetadata, QueryMatch};

    fn matched(text: &str, score: f32) -> QueryMatch {
        QueryMatch {
            id: format!("doc_chunk_{text}"),
            score,
            metadata: ChunkMetadata { text: text.into(), source: "doc".into(), chunk_id: 0 },
        }
    }

    #[test]
    fn conversation_has_system_then_user() {
        let conversation = build_conversation("Rust is safe.", "Is Rust safe?");
        assert_eq!(conversation.len(), 2);
        let messages = conversation.messages();
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_INSTRUCTION);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].content,
            "Context:\nRust is safe.\n\nQuestion: Is Rust safe?\n\nAnswer:"
        );
    }

    #[test]
    fn context_keeps_relevance_order() {
        let result =
            QueryResult { matches: vec![matched("second part", 0.9), matched("first part", 0.4)] };
        assert_eq!(join_context(&result), "second part\n\nfirst part");
    }

    #[test]
    fn system_instruction_demands_admitting_gaps() {
        assert!(SYSTEM_INSTRUCTION.contains("based on the provided context"));
        assert!(SYSTEM_INSTRUCTION.contains("say so clearly"));
    }

    #[test]
    fn serializes_as_role_content_list() {
        let json = serde_json::to_value(build_conversation("c", "q")).unwrap();
        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[1]["role"], "user");
    }

    #[test]
    fn only_system_and_user_roles_exist() {
        assert_eq!(serde_json::from_str::<Role>("\"system\"").unwrap(), Role::System);
        assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
        assert!(serde_json::from_str::<Role>("\"assistant\"").is_err());
    }
}
