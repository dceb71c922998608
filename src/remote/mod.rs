//! Boundary to the content/publishing service.
//!
//! The workflow only talks to the service through [`RemoteService`]; the
//! HTTP binding lives in [`http`].

pub mod http;
pub mod scrub;

pub use http::HttpRemoteService;

use crate::error::RemoteError;
use crate::workflow::{Facet, PendingPublishRequest};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

/// Flat key/value configuration stored by the service.
pub type ConfigMap = BTreeMap<String, String>;

/// Boxed future returned by [`RemoteService`] operations.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub text: String,
    pub image: String,
    pub headline: String,
}

/// Fields returned by a single-facet regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetUpdate {
    Text { text: String },
    Image { image: String },
    /// The service re-renders the image whenever the headline changes.
    Headline { headline: String, image: String },
}

impl FacetUpdate {
    pub fn facet(&self) -> Facet {
        match self {
            Self::Text { .. } => Facet::Text,
            Self::Image { .. } => Facet::Image,
            Self::Headline { .. } => Facet::Headline,
        }
    }
}

/// Result of a publish call, as classified by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Success {
        details: Vec<String>,
        warnings: Vec<String>,
    },
    PartialSuccess {
        warnings: Vec<String>,
    },
    AuthRequired,
    Timeout,
    UnknownStatus,
    Failure {
        message: String,
    },
}

impl RemoteOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::PartialSuccess { .. } => "partial_success",
            Self::AuthRequired => "auth_required",
            Self::Timeout => "timeout",
            Self::UnknownStatus => "unknown_status",
            Self::Failure { .. } => "failure",
        }
    }
}

/// Service verdict on a submitted verification code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeVerification {
    pub accepted: bool,
    pub resume_publish: bool,
    pub needs_two_factor: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorySupport {
    pub supports_stories: bool,
}

/// Telegram account the service is signed in as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TelegramUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl TelegramUser {
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        match (full.is_empty(), self.username.as_deref()) {
            (false, Some(username)) => format!("{full} (@{username})"),
            (false, None) => full,
            (true, Some(username)) => format!("@{username}"),
            (true, None) => format!("id {}", self.id),
        }
    }
}

/// Whether the service holds an authorized Telegram session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub authorized: bool,
    pub user: Option<TelegramUser>,
    pub message: Option<String>,
}

/// Reply to a QR login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrLogin {
    AlreadyAuthorized,
    /// Scan `url` with the Telegram app; `image` is a PNG data URI of the code.
    Pending { url: String, image: Option<String> },
}

/// Operations the workflow consumes from the publishing service.
pub trait RemoteService: Send + Sync {
    fn load_config(&self) -> RemoteFuture<'_, ConfigMap>;

    fn save_config<'a>(&'a self, config: &'a ConfigMap) -> RemoteFuture<'a, ()>;

    fn generate<'a>(&'a self, topic: &'a str) -> RemoteFuture<'a, GeneratedContent>;

    fn regenerate(&self, facet: Facet) -> RemoteFuture<'_, FacetUpdate>;

    fn check_story_support<'a>(&'a self, group: &'a str) -> RemoteFuture<'a, StorySupport>;

    /// Publish the reviewed post. Transport failures are `Err`; every
    /// answer from the service, including its own failures, is an outcome.
    fn publish<'a>(&'a self, request: &'a PendingPublishRequest)
    -> RemoteFuture<'a, RemoteOutcome>;

    fn verify_code<'a>(&'a self, code: &'a str) -> RemoteFuture<'a, CodeVerification>;

    fn session_status(&self) -> RemoteFuture<'_, SessionStatus>;

    fn request_qr_login(&self) -> RemoteFuture<'_, QrLogin>;

    fn logout(&self) -> RemoteFuture<'_, ()>;
}
