use std::{path::Path, process};

use clap::Parser as _;
use config_rs::Config as ConfigRs;
use tracing::{debug, error, trace};
use validator::Validate as _;

use crate::{
    app_info::AppInfo,
    cli::{Cli, Commands},
    commands::{guild, migrate, scrape, serve, subscription, version, CommandError},
    config::{Config, ConfigError},
    environment::Environment,
    setup_tracing::setup_tracing_for_command,
};

const ENVIRONMENT_PREFIX: &str = "INTERNLY";

pub async fn boot() {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Version)) {
        version::print_version_info(AppInfo::current());
        return;
    }

    let environment = Environment::from_env();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| environment.default_config_path());

    let app_config = match read_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {} ({})", e, config_path.display());
            process::exit(1);
        }
    };

    setup_tracing_for_command(cli.command.as_ref(), &app_config.tracing.log_level);

    debug!("Environment set to: {:?}", environment);
    trace!("Configuration loaded: {:?}", app_config);

    if let Err(e) = handle_command(app_config, cli).await {
        error!("❌ {}", e);
        process::exit(1);
    }
}

/// Loads the JSON configuration, overlays `INTERNLY_*` variables and validates it.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    trace!("Reading configuration from: {}", path.display());

    let config: Config = ConfigRs::builder()
        .add_source(config_rs::File::from(path))
        .add_source(config_rs::Environment::with_prefix(ENVIRONMENT_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

pub async fn handle_command(config: Config, cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Some(Commands::Migrate { action }) => {
            migrate::handle_migrate_command(&config, action).await?;
        }
        Some(Commands::Scrape) => scrape::handle_scrape_command(config).await?,
        Some(Commands::Guild { action }) => guild::handle_guild_command(config, action).await?,
        Some(Commands::Subscription { action }) => {
            subscription::handle_subscription_command(config, action).await?;
        }
        Some(Commands::Version) => version::print_version_info(AppInfo::current()),
        Some(Commands::Serve) | None => serve::handle_serve_command(config).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_and_validates_json_config() {
        let file = config_file(
            r#"{
                "discordToken": "token",
                "dbName": "bot",
                "pollTime": "90m",
                "distribution": { "pacingMillis": 250 }
            }"#,
        );

        let config = read_config(file.path()).unwrap();

        assert_eq!(config.database_file(), "bot.db");
        assert_eq!(config.poll_interval(), chrono::Duration::minutes(90));
        assert_eq!(config.distribution.pacing_millis, 250);
        assert_eq!(config.distribution.workers, 3);
        assert_eq!(config.feeds.len(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let file = config_file(r#"{ "discordToken": "", "feeds": [] }"#);

        assert!(matches!(
            read_config(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        assert!(matches!(
            read_config(Path::new("/nonexistent/internly.json")),
            Err(ConfigError::Load(_))
        ));
    }
}
