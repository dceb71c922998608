//! Generate → review → approve → publish workflow.

pub mod approval;
pub mod auth;
pub mod facet;
pub mod login;
pub mod observer;
pub mod profile;
pub mod publish;
pub mod session;

pub use approval::ApprovalGate;
pub use auth::{AuthChallengeHandler, CodeOutcome, looks_like_auth_failure};
pub use facet::Facet;
pub use login::TelegramLogin;
pub use observer::{
    DeclineRetry, MessageLevel, RetryPrompter, RetryReason, TracingObserver, WorkflowObserver,
};
pub use profile::{PROFILE_KEYS, ServiceProfile};
pub use publish::{
    AuthResolution, PendingPublishRequest, PublishOrchestrator, PublishReport, PublishState,
    StoryMode, TerminalKind,
};
pub use session::{ContentArtifact, ContentSession, Origin};
