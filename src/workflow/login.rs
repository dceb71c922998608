//! Telegram login session held by the publishing service.

use super::observer::{MessageLevel, WorkflowObserver};
use crate::config::LoginConfig;
use crate::error::{RemoteError, Result, WorkflowError};
use crate::remote::{QrLogin, RemoteService, SessionStatus};
use std::sync::Arc;

pub struct TelegramLogin {
    remote: Arc<dyn RemoteService>,
    observer: Arc<dyn WorkflowObserver>,
    settings: LoginConfig,
}

impl TelegramLogin {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        observer: Arc<dyn WorkflowObserver>,
        settings: LoginConfig,
    ) -> Self {
        Self {
            remote,
            observer,
            settings,
        }
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        match self.remote.session_status().await {
            Ok(status) => {
                self.report(&status);
                Ok(status)
            }
            Err(e) => {
                self.say(
                    MessageLevel::Danger,
                    &format!("Could not check the Telegram session: {e}"),
                );
                Err(e.into())
            }
        }
    }

    pub async fn logout(&self) -> Result<()> {
        match self.remote.logout().await {
            Ok(()) => {
                tracing::info!("telegram session logged out");
                self.say(MessageLevel::Success, "Logged out of Telegram.");
                Ok(())
            }
            Err(e) => {
                self.say(MessageLevel::Danger, &format!("Logout failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// Request a QR login code and wait until it is scanned. Network errors
    /// while waiting are retried on the next check.
    pub async fn login_with_qr(&self) -> Result<SessionStatus> {
        let (url, image) = match self.remote.request_qr_login().await {
            Ok(QrLogin::AlreadyAuthorized) => {
                self.say(MessageLevel::Info, "Telegram is already signed in.");
                return Ok(SessionStatus {
                    authorized: true,
                    ..SessionStatus::default()
                });
            }
            Ok(QrLogin::Pending { url, image }) => (url, image),
            Err(e) => {
                self.say(MessageLevel::Danger, &format!("QR login failed: {e}"));
                return Err(e.into());
            }
        };

        self.observer.on_qr_login_ready(&url, image.as_deref());
        self.say(
            MessageLevel::Info,
            "Scan the code in Telegram: Settings → Devices → Link Desktop Device.",
        );

        let polls = self.settings.qr_max_polls;
        for attempt in 1..=polls {
            tokio::time::sleep(self.settings.poll_interval()).await;
            match self.remote.session_status().await {
                Ok(status) if status.authorized => {
                    tracing::info!(attempt, "QR login confirmed");
                    self.report(&status);
                    return Ok(status);
                }
                Ok(_) => tracing::debug!(attempt, "QR login not confirmed yet"),
                Err(RemoteError::Network(message)) => {
                    tracing::warn!(attempt, error = %message, "QR login check failed");
                }
                Err(e) => {
                    self.say(MessageLevel::Danger, &format!("QR login failed: {e}"));
                    return Err(e.into());
                }
            }
        }

        self.say(
            MessageLevel::Warning,
            "The QR code was not scanned in time. Request a new one.",
        );
        Err(WorkflowError::LoginNotCompleted { polls })
    }

    fn report(&self, status: &SessionStatus) {
        if status.authorized {
            let name = status
                .user
                .as_ref()
                .map_or_else(|| "an unknown account".to_string(), |u| u.display_name());
            self.say(
                MessageLevel::Success,
                &format!("Telegram is signed in as {name}."),
            );
        } else {
            let text = status
                .message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("Telegram is not signed in.");
            self.say(MessageLevel::Info, text);
        }
    }

    fn say(&self, level: MessageLevel, text: &str) {
        self.observer.on_message(level, text);
    }
}
