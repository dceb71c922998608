//! Approval-gated publish state machine.
//!
//! ```text
//! Idle ─▶ AwaitingApproval ─▶ Publishing ─▶ Terminal(Success | PartialSuccess)
//!   ▲            │                │  ▲  │
//!   └────────────┘                ▼  │  └─▶ Idle (failed, kept for a manual retry)
//!     not approved            AuthPending
//!                               resume (same request)
//! ```
//!
//! A publish captures its [`PendingPublishRequest`] once. Retries after a
//! timeout or network error and the resume after a verification code replay
//! that exact request.

use super::auth::{AuthChallengeHandler, CodeOutcome, looks_like_auth_failure};
use super::observer::{MessageLevel, RetryPrompter, RetryReason, WorkflowObserver};
use super::session::{ContentArtifact, ContentSession};
use super::{ApprovalGate, Facet};
use crate::config::PublishConfig;
use crate::error::{AmbiguityKind, RemoteError, Result, ValidationError, WorkflowError};
use crate::remote::{RemoteOutcome, RemoteService};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Where the auxiliary Story is posted alongside the channel post.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoryMode {
    #[default]
    None,
    Channel,
    Personal,
    Both,
}

impl StoryMode {
    pub fn describe(self) -> &'static str {
        match self {
            Self::None => "post only, no Stories",
            Self::Channel => "post + channel Story",
            Self::Personal => "post + personal Story",
            Self::Both => "post + both Stories",
        }
    }
}

/// Publish parameters frozen when the user confirms publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPublishRequest {
    #[serde(rename = "story_type")]
    pub story_mode: StoryMode,
    /// Identifies the attempt lineage in logs; never sent to the service.
    #[serde(skip)]
    pub attempt_id: Uuid,
}

impl PendingPublishRequest {
    pub fn capture(story_mode: StoryMode) -> Self {
        Self {
            story_mode,
            attempt_id: Uuid::new_v4(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TerminalKind {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishState {
    #[default]
    Idle,
    AwaitingApproval,
    Publishing,
    AuthPending,
    Terminal(TerminalKind),
}

impl PublishState {
    /// A publish attempt owns the session in these states.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Publishing | Self::AuthPending)
    }
}

/// Non-error end of a publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReport {
    Published {
        details: Vec<String>,
        warnings: Vec<String>,
    },
    PartiallyPublished {
        warnings: Vec<String>,
    },
    /// Suspended until a verification code is submitted.
    AwaitingAuth,
}

impl PublishReport {
    /// For callers that cannot run the verification-code step.
    pub fn require_completed(self) -> Result<Self> {
        match self {
            Self::AwaitingAuth => Err(WorkflowError::AuthRequired),
            done => Ok(done),
        }
    }
}

/// How a submitted verification code was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResolution {
    Rejected { needs_two_factor: bool },
    /// Accepted, with no suspended attempt to replay.
    Verified,
    /// Accepted and the suspended attempt was replayed.
    Resumed(PublishReport),
}

#[derive(Debug, Default)]
struct Machine {
    state: PublishState,
    pending: Option<PendingPublishRequest>,
    last_terminal: Option<TerminalKind>,
}

pub struct PublishOrchestrator {
    remote: Arc<dyn RemoteService>,
    observer: Arc<dyn WorkflowObserver>,
    prompter: Arc<dyn RetryPrompter>,
    auth: AuthChallengeHandler,
    settings: PublishConfig,
    machine: Mutex<Machine>,
    session: Mutex<ContentSession>,
    // Held across generate, regenerate and the publishing phase so content
    // never changes under an in-flight publish.
    content_slot: tokio::sync::Mutex<()>,
}

impl PublishOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        observer: Arc<dyn WorkflowObserver>,
        prompter: Arc<dyn RetryPrompter>,
        settings: PublishConfig,
    ) -> Self {
        let auth = AuthChallengeHandler::new(Arc::clone(&remote), Arc::clone(&observer));
        Self {
            remote,
            observer,
            prompter,
            auth,
            settings,
            machine: Mutex::new(Machine::default()),
            session: Mutex::new(ContentSession::new()),
            content_slot: tokio::sync::Mutex::new(()),
        }
    }

    // ── Inspection ───────────────────────────────────────────────

    pub fn state(&self) -> PublishState {
        self.machine().state
    }

    /// How the most recent attempt ended, kept after a failure settles to `Idle`.
    pub fn last_terminal(&self) -> Option<TerminalKind> {
        self.machine().last_terminal
    }

    pub fn pending_request(&self) -> Option<PendingPublishRequest> {
        self.machine().pending.clone()
    }

    pub fn artifact(&self) -> Option<ContentArtifact> {
        self.session().artifact().cloned()
    }

    pub fn approvals(&self) -> ApprovalGate {
        *self.session().approvals()
    }

    // ── Content ──────────────────────────────────────────────────

    /// Start a new generation cycle for `topic`, discarding the current post.
    pub async fn generate(&self, topic: &str) -> Result<ContentArtifact> {
        let topic = topic.trim();
        if topic.is_empty() {
            self.say(MessageLevel::Warning, "Enter a post topic.");
            return Err(ValidationError::EmptyTopic.into());
        }

        self.ensure_not_publishing()?;
        let _slot = self.content_slot.lock().await;
        self.ensure_not_publishing()?;

        let was_enabled = self.approvals().is_fully_approved();
        self.session().begin_generation();
        self.announce_reset(was_enabled);

        self.say(
            MessageLevel::Info,
            "Generating content... This may take a few minutes.",
        );
        let content = match self.remote.generate(topic).await {
            Ok(content) => content,
            Err(e) => {
                self.say(MessageLevel::Danger, &format!("Generation failed: {e}"));
                return Err(e.into());
            }
        };

        let artifact = ContentArtifact::from_generated(topic, content);
        self.session().install(artifact.clone());
        tracing::info!(topic, "content generated");

        for facet in Facet::ALL {
            self.observer.on_content_updated(facet, artifact.value(facet));
        }
        self.say(MessageLevel::Success, "Content generated.");
        Ok(artifact)
    }

    /// Replace one facet with a fresh rendition and revoke its approval.
    pub async fn regenerate(&self, facet: Facet) -> Result<ContentArtifact> {
        self.ensure_not_publishing()?;
        let _slot = self.content_slot.lock().await;
        self.ensure_not_publishing()?;

        if self.session().artifact().is_none() {
            self.say(MessageLevel::Warning, "Generate content first.");
            return Err(ValidationError::NoContent.into());
        }

        self.say(
            MessageLevel::Info,
            &format!("Regenerating {}...", facet.label().to_lowercase()),
        );
        let update = match self.remote.regenerate(facet).await {
            Ok(update) if update.facet() == facet => update,
            Ok(update) => {
                let err = RemoteError::Malformed(format!(
                    "asked for {facet}, service returned {}",
                    update.facet()
                ));
                self.say(MessageLevel::Danger, &format!("Regeneration failed: {err}"));
                return Err(err.into());
            }
            Err(e) => {
                self.say(MessageLevel::Danger, &format!("Regeneration failed: {e}"));
                return Err(e.into());
            }
        };

        let was_enabled = self.approvals().is_fully_approved();
        let (changed, artifact) = {
            let mut session = self.session();
            let changed = session
                .apply_regeneration(facet, update)
                .ok_or(ValidationError::NoContent)?;
            let artifact = session.artifact().cloned().ok_or(ValidationError::NoContent)?;
            (changed, artifact)
        };
        tracing::info!(%facet, "facet regenerated");

        for (updated, value) in &changed {
            self.observer.on_content_updated(*updated, value);
        }
        self.observer.on_approval_changed(facet, false);
        if was_enabled {
            self.observer.on_publish_enabled_changed(false);
        }
        self.say(
            MessageLevel::Success,
            &format!("{} updated.", facet.label()),
        );
        Ok(artifact)
    }

    pub fn approve(&self, facet: Facet) {
        let (was_enabled, enabled) = {
            let mut session = self.session();
            let was_enabled = session.approvals().is_fully_approved();
            session.approve(facet);
            (was_enabled, session.approvals().is_fully_approved())
        };

        self.observer.on_approval_changed(facet, true);
        if enabled != was_enabled {
            self.observer.on_publish_enabled_changed(enabled);
        }
        self.say(
            MessageLevel::Success,
            &format!("{} approved.", facet.label()),
        );
    }

    /// Mark all facets approved without per-facet notices, for content that
    /// was reviewed outside this session.
    pub fn approve_reviewed(&self) {
        let mut session = self.session();
        for facet in Facet::ALL {
            session.approve(facet);
        }
        tracing::debug!("all facets approved as reviewed");
    }

    /// Discard the post, its approvals and any suspended publish attempt.
    pub async fn reset_form(&self) -> Result<()> {
        if self.state() == PublishState::Publishing {
            self.say(MessageLevel::Warning, "Wait for the current publish to finish.");
            return Err(WorkflowError::PublishInFlight);
        }
        let _slot = self.content_slot.lock().await;

        let was_auth_pending = {
            let mut machine = self.machine();
            if machine.state == PublishState::Publishing {
                return Err(WorkflowError::PublishInFlight);
            }
            let was_auth_pending = machine.state == PublishState::AuthPending;
            *machine = Machine::default();
            was_auth_pending
        };

        let was_enabled = self.approvals().is_fully_approved();
        self.session().clear();
        self.announce_reset(was_enabled);
        if was_auth_pending {
            self.observer.on_auth_challenge_closed();
        }
        tracing::debug!("form reset");
        Ok(())
    }

    // ── Publishing ───────────────────────────────────────────────

    /// Start a new publish attempt with the given story selection.
    pub async fn publish(&self, story_mode: StoryMode) -> Result<PublishReport> {
        let Ok(_slot) = self.content_slot.try_lock() else {
            return Err(self.reject_busy());
        };

        let request = {
            let mut machine = self.machine();
            if machine.state.is_in_flight() {
                drop(machine);
                return Err(self.reject_in_flight());
            }
            machine.state = PublishState::AwaitingApproval;

            let approvals = *self.session().approvals();
            if !approvals.is_fully_approved() {
                machine.state = PublishState::Idle;
                drop(machine);
                let missing = approvals.missing();
                tracing::debug!(?missing, "publish rejected: approvals missing");
                self.say(
                    MessageLevel::Warning,
                    "Approve the text, image and headline before publishing.",
                );
                return Err(WorkflowError::PreconditionNotMet { missing });
            }

            let request = PendingPublishRequest::capture(story_mode);
            machine.pending = Some(request.clone());
            machine.last_terminal = None;
            machine.state = PublishState::Publishing;
            request
        };

        tracing::info!(
            attempt_id = %request.attempt_id,
            story_mode = %request.story_mode,
            "publish attempt started"
        );
        self.run_attempt(&request).await
    }

    /// Submit the verification code for a suspended publish and, when the
    /// service asks for it, replay the captured request.
    pub async fn submit_auth_code(&self, code: &str) -> Result<AuthResolution> {
        let CodeOutcome {
            accepted,
            resume,
            needs_two_factor,
            ..
        } = self.auth.submit_code(code).await?;

        if !accepted {
            return Ok(AuthResolution::Rejected { needs_two_factor });
        }

        if !resume || self.pending_request().is_none() {
            self.release_auth_pending();
            self.say(MessageLevel::Info, "You can publish now.");
            return Ok(AuthResolution::Verified);
        }

        self.say(MessageLevel::Info, "Retrying publish...");
        tokio::time::sleep(self.settings.resume_delay()).await;

        let _slot = self.content_slot.lock().await;
        let Some(request) = self.take_resumable() else {
            // The form was reset while the session settled.
            return Ok(AuthResolution::Verified);
        };

        tracing::info!(attempt_id = %request.attempt_id, "resuming publish after verification");
        self.run_attempt(&request).await.map(AuthResolution::Resumed)
    }

    async fn run_attempt(&self, request: &PendingPublishRequest) -> Result<PublishReport> {
        loop {
            self.say(
                MessageLevel::Info,
                &format!("Publishing to Telegram ({})...", request.story_mode.describe()),
            );

            let outcome = match self.remote.publish(request).await {
                Ok(outcome) => outcome,
                Err(RemoteError::Network(message)) => {
                    self.say(MessageLevel::Danger, &format!("Network error: {message}"));
                    let reason = RetryReason::Network {
                        message: message.clone(),
                    };
                    if self.offer_retry(request, &reason).await {
                        continue;
                    }
                    self.fail();
                    return Err(WorkflowError::Network(message));
                }
                Err(other) => RemoteOutcome::Failure {
                    message: other.to_string(),
                },
            };

            tracing::info!(
                attempt_id = %request.attempt_id,
                outcome = outcome.kind(),
                "publish outcome"
            );

            match outcome {
                RemoteOutcome::Success { details, warnings } => {
                    self.say(MessageLevel::Success, "Publishing finished successfully!");
                    if !details.is_empty() {
                        self.say(
                            MessageLevel::Info,
                            &format!("Results:\n{}", details.join("\n")),
                        );
                    }
                    if !warnings.is_empty() {
                        self.say(MessageLevel::Warning, &bulleted("Warnings:", &warnings));
                    }
                    self.finish(TerminalKind::Success, true);
                    return Ok(PublishReport::Published { details, warnings });
                }
                RemoteOutcome::PartialSuccess { warnings } => {
                    self.say(MessageLevel::Warning, "Publishing finished with errors.");
                    if !warnings.is_empty() {
                        self.say(MessageLevel::Danger, &bulleted("Errors:", &warnings));
                    }
                    self.finish(TerminalKind::PartialSuccess, self.settings.clear_on_partial);
                    return Ok(PublishReport::PartiallyPublished { warnings });
                }
                RemoteOutcome::AuthRequired => {
                    self.say(
                        MessageLevel::Info,
                        "Telegram needs a verification code to continue.",
                    );
                    self.suspend_for_auth(request);
                    return Ok(PublishReport::AwaitingAuth);
                }
                RemoteOutcome::Timeout => {
                    self.say(MessageLevel::Warning, "Publishing timed out.");
                    self.say(
                        MessageLevel::Info,
                        "Check Telegram. If the post is not there, try again.",
                    );
                    if self.offer_retry(request, &RetryReason::Timeout).await {
                        continue;
                    }
                    self.settle(PublishState::Idle);
                    return Err(WorkflowError::AmbiguousOutcome(AmbiguityKind::Timeout));
                }
                RemoteOutcome::UnknownStatus => {
                    self.say(MessageLevel::Warning, "Publishing status is unknown.");
                    self.say(
                        MessageLevel::Info,
                        "Check Telegram. The post may have been published.",
                    );
                    self.settle(PublishState::Idle);
                    return Err(WorkflowError::AmbiguousOutcome(
                        AmbiguityKind::UnknownStatus,
                    ));
                }
                RemoteOutcome::Failure { message } => {
                    self.say(MessageLevel::Danger, &format!("Error: {message}"));
                    if looks_like_auth_failure(&message, &self.settings.auth_failure_markers) {
                        self.suspend_for_auth(request);
                        return Ok(PublishReport::AwaitingAuth);
                    }
                    self.fail();
                    return Err(WorkflowError::RemoteFailure(message));
                }
            }
        }
    }

    async fn offer_retry(&self, request: &PendingPublishRequest, reason: &RetryReason) -> bool {
        let retry = self.prompter.confirm_retry(reason).await;
        tracing::info!(attempt_id = %request.attempt_id, retry, "retry offer answered");
        retry
    }

    // ── Transitions ──────────────────────────────────────────────

    fn suspend_for_auth(&self, request: &PendingPublishRequest) {
        {
            let mut machine = self.machine();
            machine.state = PublishState::AuthPending;
            machine.pending = Some(request.clone());
        }
        self.observer.on_auth_challenge_requested();
    }

    fn take_resumable(&self) -> Option<PendingPublishRequest> {
        let mut machine = self.machine();
        if machine.state != PublishState::AuthPending {
            return None;
        }
        let request = machine.pending.clone()?;
        machine.state = PublishState::Publishing;
        Some(request)
    }

    fn release_auth_pending(&self) {
        let mut machine = self.machine();
        if machine.state == PublishState::AuthPending {
            *machine = Machine::default();
        }
    }

    /// End the attempt and drop its request, keeping content and approvals.
    fn settle(&self, state: PublishState) {
        let mut machine = self.machine();
        machine.state = state;
        machine.pending = None;
    }

    /// Failed attempts return to `Idle` so the user can retry by hand.
    fn fail(&self) {
        self.settle(PublishState::Idle);
        self.machine().last_terminal = Some(TerminalKind::Failed);
    }

    fn finish(&self, kind: TerminalKind, clear_content: bool) {
        self.settle(PublishState::Terminal(kind));
        self.machine().last_terminal = Some(kind);
        if clear_content {
            let was_enabled = self.approvals().is_fully_approved();
            self.session().clear();
            self.announce_reset(was_enabled);
        }
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn ensure_not_publishing(&self) -> Result<()> {
        if self.state().is_in_flight() {
            return Err(self.reject_in_flight());
        }
        Ok(())
    }

    fn reject_in_flight(&self) -> WorkflowError {
        self.say(MessageLevel::Warning, "A publish is already in progress.");
        WorkflowError::PublishInFlight
    }

    fn reject_busy(&self) -> WorkflowError {
        if self.state().is_in_flight() {
            return self.reject_in_flight();
        }
        self.say(
            MessageLevel::Warning,
            "Content is still being updated. Publish when it finishes.",
        );
        WorkflowError::Busy
    }

    fn announce_reset(&self, was_enabled: bool) {
        for facet in Facet::ALL {
            self.observer.on_approval_changed(facet, false);
        }
        if was_enabled {
            self.observer.on_publish_enabled_changed(false);
        }
    }

    fn say(&self, level: MessageLevel, text: &str) {
        self.observer.on_message(level, text);
    }

    fn machine(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> MutexGuard<'_, ContentSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn bulleted(title: &str, items: &[String]) -> String {
    let mut out = title.to_string();
    for item in items {
        out.push_str("\n• ");
        out.push_str(item);
    }
    out
}
