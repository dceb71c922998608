//! HTTP binding of [`RemoteService`] for the content/publishing service.
//!
//! Every reply carries a `status` field; anything other than `"success"` is a
//! service-side refusal with an optional `message`. Publish is the exception:
//! its status is mapped onto [`RemoteOutcome`] instead of an error.

use super::scrub::sanitize_remote_error;
use super::{
    CodeVerification, ConfigMap, FacetUpdate, GeneratedContent, QrLogin, RemoteFuture,
    RemoteOutcome, RemoteService, SessionStatus, StorySupport, TelegramUser,
};
use crate::config::ServiceConfig;
use crate::error::RemoteError;
use crate::workflow::{Facet, PendingPublishRequest};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const STATUS_SUCCESS: &str = "success";

pub struct HttpRemoteService {
    base_url: String,
    publish_timeout: Duration,
    client: Client,
}

impl HttpRemoteService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            publish_timeout: Duration::from_secs(config.publish_timeout_secs),
            client: build_service_client(config),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RemoteError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(path, &e))?;
        decode(path, response).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, RemoteError> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|e| transport_error(path, &e))?;
        decode(path, response).await
    }
}

pub fn build_service_client(config: &ServiceConfig) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn transport_error(path: &str, err: &reqwest::Error) -> RemoteError {
    tracing::debug!(path, error = %err, "service request failed");
    RemoteError::Network(sanitize_remote_error(&err.to_string()))
}

async fn decode<R: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<R, RemoteError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(path, &e))?;
    parse_reply(path, status, &body)
}

fn parse_reply<R: DeserializeOwned>(
    path: &str,
    status: StatusCode,
    body: &str,
) -> Result<R, RemoteError> {
    // The service reports its own failures in the JSON body, often with a
    // 4xx/5xx status; only a body we cannot parse is a hard error.
    serde_json::from_str(body).map_err(|e| {
        if status.is_success() {
            RemoteError::Malformed(format!("{path}: {e}"))
        } else {
            RemoteError::Rejected(format!(
                "{path} failed ({status}): {}",
                sanitize_remote_error(body)
            ))
        }
    })
}

fn rejection(message: Option<String>, fallback: &str) -> RemoteError {
    let message = message
        .filter(|m| !m.trim().is_empty())
        .map_or_else(|| fallback.to_string(), |m| sanitize_remote_error(&m));
    RemoteError::Rejected(message)
}

// ── Wire types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StatusReply {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigReply {
    status: String,
    #[serde(default)]
    config: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    topic: &'a str,
}

#[derive(Debug, Serialize)]
struct RegenerateBody {
    #[serde(rename = "type")]
    facet: Facet,
}

#[derive(Debug, Default, Deserialize)]
struct ContentFields {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    headline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentReply {
    status: String,
    #[serde(default)]
    data: Option<ContentFields>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct StoryCheckBody<'a> {
    group_username: &'a str,
}

#[derive(Debug, Deserialize)]
struct StoryInfo {
    #[serde(default)]
    supports_stories: bool,
}

#[derive(Debug, Deserialize)]
struct StoryCheckReply {
    status: String,
    #[serde(default)]
    info: Option<StoryInfo>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishReply {
    status: String,
    #[serde(default)]
    need_code: bool,
    #[serde(default)]
    details: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifyBody<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyReply {
    status: String,
    #[serde(default)]
    retry_publish: bool,
    #[serde(default)]
    need_2fa: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Login endpoints answer with a boolean `success` and an `error` string.
#[derive(Debug, Deserialize)]
struct SessionReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    authorized: bool,
    #[serde(default)]
    user: Option<TelegramUser>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QrReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    authorized: bool,
    #[serde(default)]
    qr_url: Option<String>,
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogoutReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn config_value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn classify_publish(reply: PublishReply) -> RemoteOutcome {
    if reply.status == "auth_required" || reply.need_code {
        return RemoteOutcome::AuthRequired;
    }
    match reply.status.as_str() {
        STATUS_SUCCESS => RemoteOutcome::Success {
            details: reply.details,
            warnings: reply.warnings,
        },
        "partial" => RemoteOutcome::PartialSuccess {
            warnings: reply.warnings,
        },
        "timeout" => RemoteOutcome::Timeout,
        "unknown" => RemoteOutcome::UnknownStatus,
        _ => RemoteOutcome::Failure {
            message: reply
                .message
                .filter(|m| !m.trim().is_empty())
                .map_or_else(|| "unknown error".to_string(), |m| sanitize_remote_error(&m)),
        },
    }
}

fn facet_update(facet: Facet, fields: ContentFields) -> Result<FacetUpdate, RemoteError> {
    let missing = |name: &str| RemoteError::Malformed(format!("regenerate {facet}: missing {name}"));
    match facet {
        Facet::Text => Ok(FacetUpdate::Text {
            text: fields.text.ok_or_else(|| missing("text"))?,
        }),
        Facet::Image => Ok(FacetUpdate::Image {
            image: fields.image.ok_or_else(|| missing("image"))?,
        }),
        Facet::Headline => Ok(FacetUpdate::Headline {
            headline: fields.headline.ok_or_else(|| missing("headline"))?,
            image: fields.image.ok_or_else(|| missing("image"))?,
        }),
    }
}

impl RemoteService for HttpRemoteService {
    fn load_config(&self) -> RemoteFuture<'_, ConfigMap> {
        Box::pin(async move {
            let reply: ConfigReply = self.get("get_config").await?;
            if reply.status != STATUS_SUCCESS {
                return Err(rejection(reply.message, "failed to load config"));
            }
            Ok(reply
                .config
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, config_value_to_string(value)))
                .collect())
        })
    }

    fn save_config<'a>(&'a self, config: &'a ConfigMap) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let reply: StatusReply = self.post("save_config", config).await?;
            if reply.status != STATUS_SUCCESS {
                return Err(rejection(reply.message, "failed to save config"));
            }
            Ok(())
        })
    }

    fn generate<'a>(&'a self, topic: &'a str) -> RemoteFuture<'a, GeneratedContent> {
        Box::pin(async move {
            let reply: ContentReply = self
                .post("generate_content", &GenerateBody { topic })
                .await?;
            if reply.status != STATUS_SUCCESS {
                return Err(rejection(reply.message, "generation failed"));
            }
            let fields = reply
                .data
                .ok_or_else(|| RemoteError::Malformed("generate: missing data".into()))?;
            let missing = |name: &str| RemoteError::Malformed(format!("generate: missing {name}"));
            Ok(GeneratedContent {
                text: fields.text.ok_or_else(|| missing("text"))?,
                image: fields.image.ok_or_else(|| missing("image"))?,
                headline: fields.headline.ok_or_else(|| missing("headline"))?,
            })
        })
    }

    fn regenerate(&self, facet: Facet) -> RemoteFuture<'_, FacetUpdate> {
        Box::pin(async move {
            let reply: ContentReply = self
                .post("regenerate_content", &RegenerateBody { facet })
                .await?;
            if reply.status != STATUS_SUCCESS {
                return Err(rejection(reply.message, "regeneration failed"));
            }
            facet_update(facet, reply.data.unwrap_or_default())
        })
    }

    fn check_story_support<'a>(&'a self, group: &'a str) -> RemoteFuture<'a, StorySupport> {
        Box::pin(async move {
            let reply: StoryCheckReply = self
                .post(
                    "check_story_support",
                    &StoryCheckBody {
                        group_username: group,
                    },
                )
                .await?;
            if reply.status != STATUS_SUCCESS {
                return Err(rejection(reply.message, "story support check failed"));
            }
            let info = reply
                .info
                .ok_or_else(|| RemoteError::Malformed("check_story_support: missing info".into()))?;
            Ok(StorySupport {
                supports_stories: info.supports_stories,
            })
        })
    }

    fn publish<'a>(
        &'a self,
        request: &'a PendingPublishRequest,
    ) -> RemoteFuture<'a, RemoteOutcome> {
        Box::pin(async move {
            let sent = self
                .client
                .post(self.endpoint("publish_post"))
                .timeout(self.publish_timeout)
                .json(request)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                // Delivery may still complete server-side; report it as a
                // timeout so the caller does not treat it as a plain failure.
                Err(e) if e.is_timeout() => {
                    tracing::warn!(attempt_id = %request.attempt_id, "publish request timed out");
                    return Ok(RemoteOutcome::Timeout);
                }
                Err(e) => return Err(transport_error("publish_post", &e)),
            };

            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) if e.is_timeout() => {
                    tracing::warn!(attempt_id = %request.attempt_id, "publish reply timed out");
                    return Ok(RemoteOutcome::Timeout);
                }
                Err(e) => return Err(transport_error("publish_post", &e)),
            };

            match parse_reply::<PublishReply>("publish_post", status, &body) {
                Ok(reply) => Ok(classify_publish(reply)),
                // Accepted but unreadable: the post may well be out.
                Err(RemoteError::Malformed(reason)) => {
                    tracing::warn!(attempt_id = %request.attempt_id, %reason, "publish reply unreadable");
                    Ok(RemoteOutcome::UnknownStatus)
                }
                Err(RemoteError::Rejected(message)) => Ok(RemoteOutcome::Failure { message }),
                Err(e) => Err(e),
            }
        })
    }

    fn verify_code<'a>(&'a self, code: &'a str) -> RemoteFuture<'a, CodeVerification> {
        Box::pin(async move {
            let reply: VerifyReply = self
                .post("verify_telegram_code", &VerifyBody { code })
                .await?;
            let accepted = reply.status == STATUS_SUCCESS;
            Ok(CodeVerification {
                accepted,
                resume_publish: accepted && reply.retry_publish,
                needs_two_factor: reply.need_2fa,
                message: reply.message.map(|m| sanitize_remote_error(&m)),
            })
        })
    }

    fn session_status(&self) -> RemoteFuture<'_, SessionStatus> {
        Box::pin(async move {
            let reply: SessionReply = self.get("api/telegram/check_auth").await?;
            if !reply.success {
                return Err(rejection(reply.error, "session check failed"));
            }
            Ok(SessionStatus {
                authorized: reply.authorized,
                user: reply.user,
                message: reply.message,
            })
        })
    }

    fn request_qr_login(&self) -> RemoteFuture<'_, QrLogin> {
        Box::pin(async move {
            let reply: QrReply = self.get("api/telegram/qr_code").await?;
            if !reply.success {
                return Err(rejection(reply.error, "QR login request failed"));
            }
            if reply.authorized {
                return Ok(QrLogin::AlreadyAuthorized);
            }
            let url = reply
                .qr_url
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| RemoteError::Malformed("qr_code: missing qr_url".into()))?;
            Ok(QrLogin::Pending {
                url,
                image: reply.qr_code,
            })
        })
    }

    fn logout(&self) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let reply: LogoutReply = self
                .post("api/telegram/logout", &serde_json::Map::new())
                .await?;
            if !reply.success {
                return Err(rejection(reply.error.or(reply.message), "logout failed"));
            }
            Ok(())
        })
    }
}
