use super::Facet;
use std::future::Future;
use std::pin::Pin;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// Rendering-layer callbacks emitted by the workflow.
///
/// Only `on_message` is mandatory; a renderer that does not show approval
/// badges or previews can ignore the rest.
pub trait WorkflowObserver: Send + Sync {
    fn on_message(&self, level: MessageLevel, text: &str);

    fn on_approval_changed(&self, _facet: Facet, _approved: bool) {}

    fn on_publish_enabled_changed(&self, _enabled: bool) {}

    fn on_content_updated(&self, _facet: Facet, _value: &str) {}

    fn on_auth_challenge_requested(&self) {}

    fn on_auth_challenge_closed(&self) {}

    /// A QR login code is ready to be scanned in the Telegram app.
    fn on_qr_login_ready(&self, _url: &str, _image: Option<&str>) {}
}

/// Why the workflow is asking whether to try publishing again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    Timeout,
    Network { message: String },
}

impl RetryReason {
    pub fn question(&self) -> &'static str {
        match self {
            Self::Timeout => "Publishing timed out. Try publishing again?",
            Self::Network { .. } => "A network error occurred. Try publishing again?",
        }
    }
}

/// Asks the user whether a publish attempt should be retried.
pub trait RetryPrompter: Send + Sync {
    fn confirm_retry<'a>(
        &'a self,
        reason: &'a RetryReason,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Non-interactive prompter that never retries.
pub struct DeclineRetry;

impl RetryPrompter for DeclineRetry {
    fn confirm_retry<'a>(
        &'a self,
        _reason: &'a RetryReason,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async { false })
    }
}

/// Observer that forwards messages to `tracing`.
pub struct TracingObserver;

impl WorkflowObserver for TracingObserver {
    fn on_message(&self, level: MessageLevel, text: &str) {
        match level {
            MessageLevel::Success | MessageLevel::Info => tracing::info!("{text}"),
            MessageLevel::Warning => tracing::warn!("{text}"),
            MessageLevel::Danger => tracing::error!("{text}"),
        }
    }

    fn on_auth_challenge_requested(&self) {
        tracing::info!("verification code required to continue publishing");
    }
}
