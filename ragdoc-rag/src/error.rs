//! Error types for the `ragdoc-rag` crate.

use std::fmt;

use thiserror::Error;

/// Why a call to a remote service failed.
///
/// Gateways collapse every failure into an error value instead of a partial
/// result, but keep the cause so callers can tell a network problem from a
/// provider that answered with an unexpected body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced a response (connection refused, DNS, TLS, ...).
    Transport,
    /// The request exceeded its configured timeout.
    Timeout,
    /// The service answered with a non-success HTTP status.
    Status(u16),
    /// The response body did not have the expected shape.
    MalformedResponse,
    /// No credential was configured for the service.
    MissingCredentials,
}

impl FailureKind {
    /// Whether the failure came from the transport layer rather than the response contents.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport | Self::Timeout | Self::Status(_))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => f.write_str("transport"),
            Self::Timeout => f.write_str("timeout"),
            Self::Status(code) => write!(f, "status {code}"),
            Self::MalformedResponse => f.write_str("malformed response"),
            Self::MissingCredentials => f.write_str("missing credentials"),
        }
    }
}

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}, {kind}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// The failure category.
        kind: FailureKind,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while generating a completion.
    #[error("Completion error ({provider}, {kind}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// The failure category.
        kind: FailureKind,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}, {kind}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// The failure category.
        kind: FailureKind,
        /// A description of the failure.
        message: String,
    },

    /// The document type is not handled by the configured extractor.
    #[error("Unsupported document '{name}' (type: {kind})")]
    UnsupportedDocument {
        /// The document name.
        name: String,
        /// The declared document type.
        kind: String,
    },

    /// The document type is supported but its contents could not be read.
    #[error("Failed to extract text from '{name}': {message}")]
    ExtractionError {
        /// The document name.
        name: String,
        /// A description of the failure.
        message: String,
    },

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    /// Return the remote failure category, if this error came from a gateway.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::EmbeddingError { kind, .. }
            | Self::CompletionError { kind, .. }
            | Self::VectorStoreError { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
