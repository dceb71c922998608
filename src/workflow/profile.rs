use super::observer::{MessageLevel, WorkflowObserver};
use crate::error::Result;
use crate::remote::scrub::mask_secret;
use crate::remote::{ConfigMap, RemoteService};
use std::sync::Arc;

/// Service configuration keys the front-end knows how to edit.
pub const PROFILE_KEYS: [&str; 6] = [
    "openai_key",
    "stability_key",
    "telegram_api_id",
    "telegram_api_hash",
    "telegram_phone",
    "telegram_group",
];

const SECRET_KEYS: [&str; 3] = ["openai_key", "stability_key", "telegram_api_hash"];

pub fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

/// Value suitable for display, with credentials masked.
pub fn display_value(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        mask_secret(value)
    } else {
        value.to_string()
    }
}

/// Round-trips the service's stored credentials and settings.
pub struct ServiceProfile {
    remote: Arc<dyn RemoteService>,
    observer: Arc<dyn WorkflowObserver>,
}

impl ServiceProfile {
    pub fn new(remote: Arc<dyn RemoteService>, observer: Arc<dyn WorkflowObserver>) -> Self {
        Self { remote, observer }
    }

    pub async fn load(&self) -> Result<ConfigMap> {
        match self.remote.load_config().await {
            Ok(config) => {
                tracing::debug!(keys = config.len(), "service config loaded");
                Ok(config)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load service config");
                Err(e.into())
            }
        }
    }

    /// Merge `updates` over the stored config and save the result, keeping
    /// keys this client does not know about.
    pub async fn update(&self, updates: ConfigMap) -> Result<ConfigMap> {
        let mut config = self.load().await?;
        config.extend(updates);
        self.save(&config).await?;
        Ok(config)
    }

    pub async fn save(&self, config: &ConfigMap) -> Result<()> {
        match self.remote.save_config(config).await {
            Ok(()) => {
                self.observer
                    .on_message(MessageLevel::Success, "Configuration saved.");
                Ok(())
            }
            Err(e) => {
                self.observer
                    .on_message(MessageLevel::Danger, &format!("Error saving configuration: {e}"));
                Err(e.into())
            }
        }
    }

    /// Advisory check whether `group` can carry Stories. Never fails: a check
    /// error is logged and reported as `None`.
    pub async fn story_support(&self, group: &str) -> Option<bool> {
        let group = group.trim();
        if group.is_empty() {
            return None;
        }

        match self.remote.check_story_support(group).await {
            Ok(support) => {
                if !support.supports_stories {
                    self.observer.on_message(
                        MessageLevel::Info,
                        "This channel or group may not support Stories. An alternative method will be used.",
                    );
                }
                Some(support.supports_stories)
            }
            Err(e) => {
                tracing::warn!(group, error = %e, "story support check failed");
                None
            }
        }
    }
}
