use time::format_description::parse;
use tracing_subscriber::{filter::Directive, fmt::time::OffsetTime, EnvFilter};

use crate::cli::Commands;

/// Third-party targets that are too chatty at `info`
const QUIET_TARGETS: [&str; 3] = [
    "sqlx=warn",
    "sea_orm_migration::migrator=warn",
    "hyper_util=warn",
];

/// Default log level for a command; `RUST_LOG` overrides it.
#[must_use]
pub fn default_level<'a>(command: Option<&Commands>, service_log_level: &'a str) -> &'a str {
    match command {
        Some(
            Commands::Migrate { .. }
            | Commands::Guild { .. }
            | Commands::Subscription { .. },
        ) => "warn",
        Some(Commands::Version) => "error",
        Some(Commands::Serve | Commands::Scrape) | None => service_log_level,
    }
}

pub fn setup_tracing_for_command(command: Option<&Commands>, service_log_level: &str) {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(command, service_log_level)));

    for target in QUIET_TARGETS {
        if let Ok(directive) = target.parse::<Directive>() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_ansi(true);

    match parse("[hour]:[minute]:[second].[subsecond digits:2]") {
        Ok(format) => builder
            .with_timer(OffsetTime::new(
                time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC),
                format,
            ))
            .compact()
            .init(),
        Err(_) => builder.compact().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MigrateAction;

    #[test]
    fn test_management_commands_are_quiet() {
        assert_eq!(default_level(Some(&Commands::Version), "info"), "error");
        assert_eq!(
            default_level(
                Some(&Commands::Migrate {
                    action: MigrateAction::Status
                }),
                "info"
            ),
            "warn"
        );
    }

    #[test]
    fn test_services_use_configured_level() {
        assert_eq!(default_level(None, "debug"), "debug");
        assert_eq!(default_level(Some(&Commands::Scrape), "info"), "info");
    }
}
