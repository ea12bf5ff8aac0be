use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::database::models::job_type::JobType;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// Configuration file (default: config.json, or config.<environment>.json
    /// outside development)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scrape and distribution schedulers (default)
    Serve,
    /// Scrape every source once and exit
    Scrape,
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Manage guild broadcast channels
    Guild {
        #[command(subcommand)]
        action: GuildAction,
    },
    /// Manage user subscriptions
    Subscription {
        #[command(subcommand)]
        action: SubscriptionAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Run migrations up
    Up {
        /// Number of migrations to run (default: all)
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Run migrations down
    Down {
        /// Number of migrations to rollback (default: 1)
        #[arg(short, long, default_value = "1")]
        steps: u32,
    },
    /// Show migration status
    Status,
    /// Drop every table and migrate up again
    Fresh,
}

#[derive(Subcommand)]
pub enum GuildAction {
    /// Register a guild, or bring back one that left
    Register { guild_id: String },
    /// Stop broadcasting to a guild
    Remove { guild_id: String },
    /// Set the channels jobs are broadcast to; an empty id clears a channel
    Configure {
        guild_id: String,
        #[arg(long)]
        intern: Option<String>,
        #[arg(long)]
        new_grad: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// Subscribe a user to jobs of one type
    Add {
        user_id: String,
        /// INTERN or NEW_GRAD
        #[arg(long = "type")]
        job_type: JobType,
        /// Comma separated location terms
        #[arg(long, default_value = "")]
        locations: String,
        /// Comma separated company terms
        #[arg(long, default_value = "")]
        companies: String,
        /// Comma separated role terms
        #[arg(long, default_value = "")]
        roles: String,
    },
    /// List a user's subscriptions, newest first
    List { user_id: String },
    /// Remove a subscription by its position in the list
    Remove { user_id: String, position: usize },
}
