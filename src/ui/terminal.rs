//! Terminal rendering of workflow callbacks.

use super::style as ui;
use crate::workflow::{Facet, MessageLevel, RetryPrompter, RetryReason, WorkflowObserver};
use dialoguer::Confirm;
use std::future::Future;
use std::pin::Pin;

const PREVIEW_CHARS: usize = 160;

/// Prints workflow messages and previews to stdout.
pub struct ConsoleObserver;

impl WorkflowObserver for ConsoleObserver {
    fn on_message(&self, level: MessageLevel, text: &str) {
        let mut lines = text.lines();
        let first = lines.next().unwrap_or_default();
        let marker = match level {
            MessageLevel::Success => ui::success("✓"),
            MessageLevel::Info => ui::cyan("ℹ"),
            MessageLevel::Warning => ui::yellow("!"),
            MessageLevel::Danger => ui::danger("✗"),
        };
        println!("  {marker} {first}");
        for line in lines {
            println!("    {line}");
        }
    }

    fn on_approval_changed(&self, facet: Facet, approved: bool) {
        let badge = if approved {
            ui::value("approved")
        } else {
            ui::dim("pending")
        };
        println!("  {} {}: {badge}", ui::dim("→"), facet.label());
    }

    fn on_publish_enabled_changed(&self, enabled: bool) {
        if enabled {
            println!("  {} Ready to publish.", ui::success("✓"));
        }
    }

    fn on_content_updated(&self, facet: Facet, value: &str) {
        println!("  {} {}", ui::header(facet.label()), ui::dim(preview(facet, value)));
    }

    fn on_auth_challenge_requested(&self) {
        println!(
            "  {} {}",
            ui::yellow("🔐"),
            ui::header("Enter the verification code Telegram sent you.")
        );
    }

    fn on_qr_login_ready(&self, url: &str, image: Option<&str>) {
        println!("  {} {}", ui::header("Telegram login link:"), ui::value(url));
        if let Some(image) = image {
            println!("    {}", ui::dim(preview(Facet::Image, image)));
        }
    }
}

/// Shortened preview; inline image data is not worth printing.
fn preview(facet: Facet, value: &str) -> String {
    if facet == Facet::Image && value.starts_with("data:") {
        let kind = value
            .split_once(';')
            .map_or("inline image", |(head, _)| head.trim_start_matches("data:"));
        return format!("<{kind}, {} bytes>", value.len());
    }
    if value.chars().count() <= PREVIEW_CHARS {
        return value.to_string();
    }
    let cut: String = value.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}…")
}

/// Asks retry questions on the terminal.
pub struct ConsolePrompter;

impl RetryPrompter for ConsolePrompter {
    fn confirm_retry<'a>(
        &'a self,
        reason: &'a RetryReason,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        let question = reason.question();
        Box::pin(async move {
            // dialoguer reads stdin synchronously
            let answer = tokio::task::spawn_blocking(move || {
                Confirm::new()
                    .with_prompt(format!("  {question}"))
                    .default(false)
                    .interact()
            })
            .await;

            match answer {
                Ok(Ok(retry)) => retry,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "retry prompt failed");
                    false
                }
                Err(e) => {
                    tracing::warn!(error = %e, "retry prompt task failed");
                    false
                }
            }
        })
    }
}
