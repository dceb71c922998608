//! Interactive terminal session driving one publish workflow.

use anyhow::{Context, Result};
use dialoguer::{Input, Select};
use postgate::Config;
use postgate::remote::RemoteService;
use postgate::ui::{ConsoleObserver, ConsolePrompter};
use postgate::ui::style as ui;
use postgate::workflow::{
    AuthResolution, Facet, PublishOrchestrator, PublishState, ServiceProfile, StoryMode,
    WorkflowObserver,
};
use std::sync::Arc;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Generate,
    Regenerate,
    Approve,
    Publish,
    EnterCode,
    Preview,
    Reset,
    Quit,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Self::Generate => "Generate a new post",
            Self::Regenerate => "Regenerate text, image or headline",
            Self::Approve => "Approve a piece",
            Self::Publish => "Publish",
            Self::EnterCode => "Enter verification code",
            Self::Preview => "Show current post",
            Self::Reset => "Reset",
            Self::Quit => "Quit",
        }
    }
}

fn available_actions(state: PublishState, has_content: bool) -> Vec<Action> {
    if state == PublishState::AuthPending {
        return vec![Action::EnterCode, Action::Reset, Action::Quit];
    }
    let mut actions = vec![Action::Generate];
    if has_content {
        actions.extend([
            Action::Regenerate,
            Action::Approve,
            Action::Publish,
            Action::Preview,
        ]);
    }
    actions.extend([Action::EnterCode, Action::Reset, Action::Quit]);
    actions
}

pub async fn run(
    config: &Config,
    remote: Arc<dyn RemoteService>,
    observer: Arc<dyn WorkflowObserver>,
    topic: Option<String>,
) -> Result<()> {
    let orchestrator = PublishOrchestrator::new(
        Arc::clone(&remote),
        Arc::clone(&observer),
        Arc::new(ConsolePrompter),
        config.publish.clone(),
    );
    let profile = ServiceProfile::new(remote, observer);

    if let Ok(service_config) = profile.load().await {
        if let Some(group) = service_config.get("telegram_group") {
            profile.story_support(group).await;
        }
    }

    if let Some(topic) = topic {
        log_result("generate", orchestrator.generate(&topic).await);
    }

    let mut story_mode = config.publish.default_story_mode;

    loop {
        println!();
        let actions = available_actions(orchestrator.state(), orchestrator.artifact().is_some());
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let choice = prompt(move || {
            Select::new()
                .with_prompt("  What next?")
                .items(&labels)
                .default(0)
                .interact()
        })
        .await?;

        match actions[choice] {
            Action::Generate => {
                let topic: String = prompt(|| {
                    Input::new()
                        .with_prompt("  Post topic")
                        .allow_empty(true)
                        .interact_text()
                })
                .await?;
                log_result("generate", orchestrator.generate(&topic).await);
            }
            Action::Regenerate => {
                let facet = choose_facet(&Facet::ALL).await?;
                log_result("regenerate", orchestrator.regenerate(facet).await);
            }
            Action::Approve => {
                let missing = orchestrator.approvals().missing();
                if missing.is_empty() {
                    println!("  {} Everything is approved.", ui::dim("→"));
                    continue;
                }
                let facet = choose_facet(&missing).await?;
                orchestrator.approve(facet);
            }
            Action::Publish => {
                story_mode = choose_story_mode(story_mode).await?;
                log_result("publish", orchestrator.publish(story_mode).await);
            }
            Action::EnterCode => {
                let code: String = prompt(|| {
                    Input::new()
                        .with_prompt("  Verification code")
                        .allow_empty(true)
                        .interact_text()
                })
                .await?;
                match orchestrator.submit_auth_code(&code).await {
                    Ok(AuthResolution::Rejected { needs_two_factor }) => {
                        tracing::debug!(needs_two_factor, "verification code rejected");
                    }
                    other => log_result("verify code", other),
                }
            }
            Action::Preview => print_preview(&orchestrator),
            Action::Reset => log_result("reset", orchestrator.reset_form().await),
            Action::Quit => break,
        }
    }

    Ok(())
}

/// Workflow failures are already shown through the observer; keep a trace.
fn log_result<T: std::fmt::Debug>(operation: &str, result: postgate::error::Result<T>) {
    match result {
        Ok(value) => tracing::debug!(operation, ?value, "workflow step finished"),
        Err(e) => tracing::debug!(operation, error = %e, "workflow step failed"),
    }
}

fn print_preview(orchestrator: &PublishOrchestrator) {
    let Some(artifact) = orchestrator.artifact() else {
        return;
    };
    let approvals = orchestrator.approvals();
    println!("  {} {}", ui::header("Topic:"), artifact.topic);
    for facet in Facet::ALL {
        let badge = if approvals.is_approved(facet) {
            ui::value("approved")
        } else {
            ui::dim("pending")
        };
        println!(
            "  {} [{badge}, {}]",
            ui::header(facet.label()),
            artifact.origin(facet)
        );
        ConsoleObserver.on_content_updated(facet, artifact.value(facet));
    }
}

async fn choose_facet(facets: &[Facet]) -> Result<Facet> {
    let facets = facets.to_vec();
    let labels: Vec<&'static str> = facets.iter().map(|f| f.label()).collect();
    let index = prompt(move || {
        Select::new()
            .with_prompt("  Which piece?")
            .items(&labels)
            .default(0)
            .interact()
    })
    .await?;
    Ok(facets[index])
}

async fn choose_story_mode(current: StoryMode) -> Result<StoryMode> {
    let modes: Vec<StoryMode> = StoryMode::iter().collect();
    let labels: Vec<&'static str> = modes.iter().map(|m| m.describe()).collect();
    let default = modes.iter().position(|m| *m == current).unwrap_or_default();
    let index = prompt(move || {
        Select::new()
            .with_prompt("  Publish as")
            .items(&labels)
            .default(default)
            .interact()
    })
    .await?;
    Ok(modes[index])
}

/// Run a blocking dialoguer prompt off the async runtime.
async fn prompt<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    let value = tokio::task::spawn_blocking(f)
        .await
        .context("prompt task failed")?
        .context("prompt failed")?;
    Ok(value)
}
