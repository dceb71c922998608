use crate::app::session;
use crate::cli::commands::{AuthCommands, Cli, Commands, ConfigCommands, StoriesCommands};
use anyhow::{Context, Result, bail};
use postgate::Config;
use postgate::remote::{ConfigMap, HttpRemoteService, RemoteService};
use postgate::ui::ConsoleObserver;
use postgate::ui::style as ui;
use postgate::workflow::profile::display_value;
use postgate::workflow::{
    DeclineRetry, PROFILE_KEYS, PublishOrchestrator, PublishReport, ServiceProfile,
    TelegramLogin, WorkflowObserver,
};
use std::sync::Arc;
use tracing::info;

pub async fn dispatch(cli: Cli, mut config: Config) -> Result<()> {
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
        config.validate().context("Invalid --base-url")?;
    }
    info!(base_url = %config.service.base_url, "using content service");

    let remote: Arc<dyn RemoteService> = Arc::new(HttpRemoteService::new(&config.service));
    let observer: Arc<dyn WorkflowObserver> = Arc::new(ConsoleObserver);

    match cli.command {
        Commands::Session { topic } => session::run(&config, remote, observer, topic).await,
        Commands::Publish {
            story_mode,
            approve_all,
        } => {
            let story_mode = story_mode.unwrap_or(config.publish.default_story_mode);
            run_publish(&config, remote, observer, story_mode, approve_all).await
        }
        Commands::Config { config_command } => {
            let profile = ServiceProfile::new(remote, observer);
            match config_command {
                ConfigCommands::Show => show_profile(&profile).await,
                ConfigCommands::Set { key, value } => set_profile_value(&profile, key, value).await,
            }
        }
        Commands::Stories {
            stories_command: StoriesCommands::Check { group },
        } => {
            let profile = ServiceProfile::new(remote, observer);
            match profile.story_support(&group).await {
                Some(true) => println!("  {} {group} supports Stories.", ui::success("✓")),
                Some(false) => {}
                None => println!("  {} Could not determine Story support.", ui::dim("→")),
            }
            Ok(())
        }
        Commands::Auth { auth_command } => {
            let login = TelegramLogin::new(remote, observer, config.login.clone());
            match auth_command {
                AuthCommands::Status => {
                    login.status().await?;
                }
                AuthCommands::Login => {
                    login.login_with_qr().await?;
                }
                AuthCommands::Logout => login.logout().await?,
            }
            Ok(())
        }
    }
}

/// One-shot publish without prompts: retries are declined and a verification
/// code request ends the command.
async fn run_publish(
    config: &Config,
    remote: Arc<dyn RemoteService>,
    observer: Arc<dyn WorkflowObserver>,
    story_mode: postgate::StoryMode,
    approve_all: bool,
) -> Result<()> {
    let orchestrator = PublishOrchestrator::new(
        remote,
        observer,
        Arc::new(DeclineRetry),
        config.publish.clone(),
    );

    if approve_all {
        orchestrator.approve_reviewed();
        println!(
            "  {} Server-side content marked as reviewed.",
            ui::success("✓")
        );
    }

    let report = orchestrator
        .publish(story_mode)
        .await
        .and_then(PublishReport::require_completed);

    match report {
        Ok(_) => Ok(()),
        Err(postgate::WorkflowError::PreconditionNotMet { .. }) => {
            bail!("review the content first, then rerun with --approve-all")
        }
        Err(postgate::WorkflowError::AuthRequired) => {
            bail!("Telegram asked for a verification code; run `postgate session` to enter it")
        }
        Err(e) => Err(e.into()),
    }
}

async fn show_profile(profile: &ServiceProfile) -> Result<()> {
    let config = profile.load().await.context("Failed to load service config")?;

    println!("  {}", ui::header("Service configuration"));
    for key in PROFILE_KEYS {
        let value = config.get(key).map(String::as_str).unwrap_or_default();
        let shown = if value.is_empty() {
            ui::dim("(not set)")
        } else {
            ui::value(display_value(key, value))
        };
        println!("  {} {shown}", ui::cyan(format!("{key:<18}")));
    }
    for (key, value) in config.iter().filter(|(k, _)| !PROFILE_KEYS.contains(&k.as_str())) {
        println!(
            "  {} {}",
            ui::cyan(format!("{key:<18}")),
            ui::value(display_value(key, value))
        );
    }
    Ok(())
}

async fn set_profile_value(profile: &ServiceProfile, key: String, value: String) -> Result<()> {
    let key = key.trim().to_string();
    if key.is_empty() {
        bail!("configuration key must not be empty");
    }
    if !PROFILE_KEYS.contains(&key.as_str()) {
        println!(
            "  {} '{key}' is not a known key; storing it anyway.",
            ui::yellow("!")
        );
    }

    let mut updates = ConfigMap::new();
    updates.insert(key.clone(), value);
    let saved = profile
        .update(updates)
        .await
        .context("Failed to save service config")?;

    if key == "telegram_group" {
        if let Some(group) = saved.get("telegram_group") {
            profile.story_support(group).await;
        }
    }
    Ok(())
}
