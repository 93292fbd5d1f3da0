//! stockverse-xp - Entry Point
//!
//! Operator tool for inspecting and adjusting player progression in a
//! JSON user store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use stockverse_progression::config::{default_config_path, export_default_config};
use stockverse_progression::progression::level_title;
use stockverse_progression::store::default_store_path;
use stockverse_progression::{JsonFileStore, ProgressionConfig, ProgressionGateway, UserId};

#[derive(Parser)]
#[command(name = "stockverse-xp", version, about = "StockVerse XP and level tool")]
struct Cli {
    /// Config file (RON); defaults are used if it does not exist
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User store file (JSON)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    User(UserCommand),
    /// Write the default config to a file
    ExportConfig { path: PathBuf },
}

/// Commands that need a loaded config and an open store
#[derive(Subcommand)]
enum UserCommand {
    /// Create a level 1 record for a new user
    Register { user: String },
    /// Award XP to a user
    Award {
        user: String,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
        #[arg(long, default_value = "manual award")]
        reason: String,
    },
    /// Show level progress
    Progress { user: String },
    /// Check whether a feature is locked for a user
    Gate { user: String, feature: String },
    /// List features available at a level
    Features { level: u32 },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let command = match cli.command {
        Command::ExportConfig { path } => return export_config(&path),
        Command::User(command) => command,
    };

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ProgressionConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let store_path = cli.store.unwrap_or_else(default_store_path);
    let store = JsonFileStore::open(&store_path)
        .with_context(|| format!("opening user store {}", store_path.display()))?;

    let gateway = ProgressionGateway::from_config(store, &config)?;
    log::debug!("Using store {:?}", gateway.store().path());

    run(&gateway, command)
}

/// Does not touch the store, so it also works when the current config is broken
fn export_config(path: &Path) -> Result<()> {
    export_default_config(path)?;
    println!("Default config written to {}", path.display());
    Ok(())
}

fn run(gateway: &ProgressionGateway<JsonFileStore>, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::Register { user } => {
            let record = gateway.register_user(&UserId::new(user))?;
            println!("Registered {} (level {}, {} XP)", record.id, record.level, record.xp);
        }
        UserCommand::Award { user, amount, reason } => {
            let result = gateway.award_xp(&UserId::new(user), amount, &reason)?;
            println!("XP: {}  Level: {}", result.new_xp, result.new_level);
            if let Some(event) = result.level_up {
                println!("{}", event.summary());
            }
        }
        UserCommand::Progress { user } => {
            let info = gateway.get_progress(&UserId::new(user))?;
            println!("Level {} ({})", info.level, level_title(info.level));
            println!("XP: {}", info.xp);
            if info.is_max_level() {
                println!("Max level reached");
            } else {
                println!(
                    "Next level at {} XP ({} to go, {:.1}%)",
                    info.xp_for_next_level, info.xp_to_next, info.percent_to_next
                );
            }
        }
        UserCommand::Gate { user, feature } => {
            let gate = gateway.check_feature_lock(&UserId::new(user), &feature)?;
            match (gate.locked, gate.requirement) {
                (true, Some(req)) => println!("{}: locked. {}", feature, req.message),
                (true, None) => println!("{}: locked", feature),
                (false, _) => println!("{}: unlocked", feature),
            }
        }
        UserCommand::Features { level } => {
            for feature in gateway.engine().unlocked_features(level) {
                println!("{:>3}  {:<20} {}", feature.min_level, feature.key, feature.name);
            }
        }
    }
    Ok(())
}
