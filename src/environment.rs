use std::{env, path::PathBuf, str::FromStr as _};

use strum::{Display, EnumString};

const ENVIRONMENT_VARIABLE: &str = "INTERNLY_ENVIRONMENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    /// Reads `INTERNLY_ENVIRONMENT`, falling back to development.
    #[must_use]
    pub fn from_env() -> Self {
        env::var(ENVIRONMENT_VARIABLE)
            .ok()
            .and_then(|name| Self::from_str(&name).ok())
            .unwrap_or_default()
    }

    /// Configuration file read when none is given on the command line.
    #[must_use]
    pub fn default_config_path(self) -> PathBuf {
        match self {
            Self::Development => PathBuf::from("config.json"),
            other => PathBuf::from(format!("config.{other}.json")),
        }
    }
}
