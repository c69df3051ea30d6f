use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parlor_core::config::Config;
use parlor_core::core_chat::{ChatService, CreateChannelRequest};
use parlor_core::core_enrich::EnrichmentRunner;
use parlor_core::core_store::{Channel, ChatStore, MemberProfile, UserId};
use parlor_core::logging::{init_logging_with_config, LogConfig};
use parlor_core::metrics::init_metrics;
use parlor_core::shutdown::{install_signal_handlers, ShutdownCoordinator};
use tracing::{info, warn};

/// How long a finished command waits for queued enrichment before exiting.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file (PARLOR_* environment variables apply otherwise)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the database path
    #[arg(long)]
    db: Option<String>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Acting user id
    #[arg(short, long, default_value = "cli")]
    user: String,

    /// Acting user display name (defaults to the user id)
    #[arg(long)]
    display_name: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a channel
    CreateChannel {
        name: String,

        /// Channel description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Make the channel password-protected
        #[arg(long)]
        private: bool,

        /// Password for a private channel
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all channels
    Channels,

    /// Post a message to a channel
    Post {
        /// Channel name
        channel: String,

        /// Message body
        body: String,
    },

    /// Page through a channel's history, newest first
    Messages {
        /// Channel name
        channel: String,

        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u64,

        /// Messages per page
        #[arg(long, default_value_t = 20)]
        per_page: u64,

        /// Password for a private channel
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Subscribe to a channel and print its events as JSON lines
    Watch {
        /// Channel name
        channel: String,

        /// Password for a private channel
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Set the acting user's presence
    Status {
        /// "online" or "offline"
        state: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let log_config = LogConfig::from_settings(&config.logging)?;
    init_logging_with_config(log_config)?;
    init_metrics();

    let Some(command) = args.command else {
        info!("No command specified. Use --help for usage information.");
        return Ok(());
    };

    let actor = MemberProfile::new(
        UserId::new(args.user.clone()),
        args.display_name.unwrap_or_else(|| args.user.clone()),
    );

    let store = ChatStore::open(&config.store.db_path).with_context(|| {
        format!("failed to open store at {}", config.store.db_path.display())
    })?;
    let (service, runner) = ChatService::spawn(store, &config)?;

    run_command(command, &service, &actor).await?;

    drain(service, runner).await;
    Ok(())
}

/// Merges the config file (or environment) with command-line overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let path = shellexpand::tilde(path);
            Config::from_file(path.as_ref())
                .with_context(|| format!("failed to load config from {}", path))?
        }
        None => Config::from_env().context("failed to load config from environment")?,
    };

    if let Some(db) = &args.db {
        config.store.db_path = PathBuf::from(shellexpand::tilde(db).as_ref());
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    config.validate()?;
    Ok(config)
}

async fn run_command(
    command: Command,
    service: &Arc<ChatService>,
    actor: &MemberProfile,
) -> Result<()> {
    match command {
        Command::CreateChannel {
            name,
            description,
            private,
            password,
        } => {
            let request = CreateChannelRequest {
                name,
                description,
                is_private: private,
                password,
            };
            let channel = service.create_channel(request, actor).await?;
            println!("created channel '{}' ({})", channel.name, channel.id);
        }

        Command::Channels => {
            for channel in service.list_channels()? {
                let access = if channel.is_private { "private" } else { "open" };
                println!(
                    "{}  [{}]  {} member(s)  {}",
                    channel.name,
                    access,
                    channel.members.len(),
                    channel.description
                );
            }
        }

        Command::Post { channel, body } => {
            let channel = resolve_channel(service, &channel)?;
            let message = service.post_message(&channel.id, body, actor).await?;
            println!("posted {} to '{}'", message.id, channel.name);
        }

        Command::Messages {
            channel,
            page,
            per_page,
            password,
        } => {
            let channel = resolve_channel(service, &channel)?;
            let listing = service
                .list_messages(&channel.id, page * per_page, per_page, password.as_deref())
                .await?;
            println!("{} message(s) total", listing.total);
            for message in listing.messages {
                println!("{}", serde_json::to_string(&message)?);
            }
        }

        Command::Watch { channel, password } => {
            watch(service, &channel, password.as_deref(), actor).await?;
        }

        Command::Status { state } => {
            let online = match state.as_str() {
                "online" => true,
                "offline" => false,
                other => anyhow::bail!("unknown status '{}', expected online or offline", other),
            };
            service.set_status(&actor.id, online).await?;
            println!("{} is now {}", actor.id, state);
        }
    }

    Ok(())
}

fn resolve_channel(service: &ChatService, name: &str) -> Result<Channel> {
    service
        .store()
        .get_channel_by_name(name)?
        .with_context(|| format!("no channel named '{}'", name))
}

/// Joins the channel and streams its events to stdout until ctrl-c.
async fn watch(
    service: &Arc<ChatService>,
    channel: &str,
    password: Option<&str>,
    actor: &MemberProfile,
) -> Result<()> {
    let coordinator = Arc::new(ShutdownCoordinator::new(DRAIN_GRACE));
    install_signal_handlers(Arc::clone(&coordinator));
    let mut shutdown_rx = coordinator.subscribe();

    let mut handle = service.join_channel(channel, password, actor).await?;
    if let Some(announcement) = handle.take_announcement() {
        service.announce_join(announcement);
    }
    info!(channel = %channel, user_id = %actor.id, "watching, press ctrl-c to stop");

    loop {
        tokio::select! {
            event = handle.subscription.recv() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
            _ = shutdown_rx.recv() => break,
        }
    }

    Ok(())
}

/// Closes the job queue and waits for queued enrichment to finish.
async fn drain(service: Arc<ChatService>, runner: EnrichmentRunner) {
    drop(service);
    if tokio::time::timeout(DRAIN_GRACE, runner.join())
        .await
        .is_err()
    {
        warn!("enrichment did not drain in time, abandoning queued jobs");
    }
}
