use crate::workflow::Facet;
use thiserror::Error;

// ─── Workflow errors ─────────────────────────────────────────────────────────

/// Errors returned by the publish workflow.
///
/// Local rejections (`Validation`, `PreconditionNotMet`, `PublishInFlight`,
/// `Busy`) never reach the remote service. The remaining variants describe a
/// remote outcome the caller may want to retry manually.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("publish blocked: approval missing for {}", format_facets(.missing))]
    PreconditionNotMet { missing: Vec<Facet> },

    #[error("a publish attempt is already in flight for this session")]
    PublishInFlight,

    #[error("content is being updated, try again when it finishes")]
    Busy,

    #[error("remote failure: {0}")]
    RemoteFailure(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("outcome is ambiguous ({0}); check the channel before retrying")]
    AmbiguousOutcome(AmbiguityKind),

    #[error("network error: {0}")]
    Network(String),

    #[error("QR login was not confirmed after {polls} checks")]
    LoginNotCompleted { polls: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AmbiguityKind {
    Timeout,
    UnknownStatus,
}

// ─── Validation errors ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("verification code must not be empty")]
    EmptyCode,

    #[error("no generated content to work on")]
    NoContent,
}

// ─── Remote boundary errors ──────────────────────────────────────────────────

/// Failures reported by a [`crate::remote::RemoteService`] implementation.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The request never produced a readable reply.
    #[error("{0}")]
    Network(String),

    /// The service answered but refused the operation.
    #[error("{0}")]
    Rejected(String),

    /// The reply did not match the expected shape.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl From<RemoteError> for WorkflowError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(message) => Self::Network(message),
            RemoteError::Rejected(message) => Self::RemoteFailure(message),
            RemoteError::Malformed(_) => Self::RemoteFailure(err.to_string()),
        }
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

fn format_facets(facets: &[Facet]) -> String {
    facets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shorthand result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
