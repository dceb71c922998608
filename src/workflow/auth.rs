use super::observer::{MessageLevel, WorkflowObserver};
use crate::error::{Result, ValidationError, WorkflowError};
use crate::remote::RemoteService;
use std::sync::Arc;

/// What the service said about a submitted verification code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOutcome {
    pub accepted: bool,
    pub message: Option<String>,
    /// The service asks for the interrupted publish to be replayed.
    pub resume: bool,
    pub needs_two_factor: bool,
}

/// Verification-code sub-protocol used when publishing hits an auth wall.
///
/// The handler never resumes anything itself; it reports `resume` and leaves
/// replaying the captured request to the publish orchestrator.
pub struct AuthChallengeHandler {
    remote: Arc<dyn RemoteService>,
    observer: Arc<dyn WorkflowObserver>,
}

impl AuthChallengeHandler {
    pub fn new(remote: Arc<dyn RemoteService>, observer: Arc<dyn WorkflowObserver>) -> Self {
        Self { remote, observer }
    }

    pub async fn submit_code(&self, code: &str) -> Result<CodeOutcome> {
        let code = code.trim();
        if code.is_empty() {
            self.observer
                .on_message(MessageLevel::Warning, "Enter the verification code.");
            return Err(ValidationError::EmptyCode.into());
        }

        self.observer
            .on_message(MessageLevel::Info, "Checking verification code...");

        let verdict = match self.remote.verify_code(code).await {
            Ok(verdict) => verdict,
            Err(e) => {
                self.observer.on_message(
                    MessageLevel::Danger,
                    &format!("Verification error: {e}"),
                );
                return Err(WorkflowError::from(e));
            }
        };

        if verdict.accepted {
            tracing::info!(resume = verdict.resume_publish, "verification code accepted");
            self.observer
                .on_message(MessageLevel::Success, "Verification code confirmed.");
            self.observer.on_auth_challenge_closed();
        } else {
            tracing::warn!(
                needs_two_factor = verdict.needs_two_factor,
                "verification code rejected"
            );
            let reason = verdict.message.as_deref().unwrap_or("Invalid code");
            self.observer.on_message(MessageLevel::Danger, reason);
            if verdict.needs_two_factor {
                self.observer.on_message(
                    MessageLevel::Warning,
                    "A two-step verification password is required.",
                );
                self.observer.on_message(
                    MessageLevel::Info,
                    "Temporarily disable two-step verification in Telegram settings and try again.",
                );
            }
        }

        Ok(CodeOutcome {
            accepted: verdict.accepted,
            message: verdict.message,
            resume: verdict.accepted && verdict.resume_publish,
            needs_two_factor: verdict.needs_two_factor,
        })
    }
}

/// Heuristic for services that report an expired login as a plain failure.
pub fn looks_like_auth_failure(message: &str, markers: &[String]) -> bool {
    let message = message.to_lowercase();
    markers
        .iter()
        .filter(|marker| !marker.trim().is_empty())
        .any(|marker| message.contains(&marker.to_lowercase()))
}
