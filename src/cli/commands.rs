use clap::{Parser, Subcommand};
use postgate::StoryMode;

/// `postgate` - review and publish generated posts to Telegram.
#[derive(Parser, Debug)]
#[command(name = "postgate")]
#[command(version = "0.1.0")]
#[command(about = "Approval-gated post generation and publishing.", long_about = None)]
pub struct Cli {
    /// Override the service base URL from config.toml
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive generate → review → approve → publish session
    Session {
        /// Generate content for this topic right away
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Publish the content currently held by the service
    Publish {
        /// Story to post alongside: none, channel, personal, both
        #[arg(long, value_parser = parse_story_mode)]
        story_mode: Option<StoryMode>,

        /// Confirm that text, image and headline were reviewed
        #[arg(long)]
        approve_all: bool,
    },

    /// Inspect or edit the service configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },

    /// Story support checks
    Stories {
        #[command(subcommand)]
        stories_command: StoriesCommands,
    },

    /// Telegram login session held by the service
    Auth {
        #[command(subcommand)]
        auth_command: AuthCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the stored configuration (secrets masked)
    Show,
    /// Set one configuration value
    Set { key: String, value: String },
}

#[derive(Subcommand, Debug)]
pub enum StoriesCommands {
    /// Check whether a channel or group can carry Stories
    Check { group: String },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum AuthCommands {
    /// Show whether the service is signed in to Telegram
    Status,
    /// Sign in by scanning a QR code in the Telegram app
    Login,
    /// End the service's Telegram session
    Logout,
}

fn parse_story_mode(raw: &str) -> Result<StoryMode, String> {
    raw.parse::<StoryMode>()
        .map_err(|_| format!("unknown story mode '{raw}' (none, channel, personal, both)"))
}
