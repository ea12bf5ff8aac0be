use sea_orm::{ConnectOptions, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::debug;

use crate::{
    app::App,
    config::Config,
    database::migrations::Migrator,
    notifier::{mock::MockNotifier, Notifier},
};

static TRACING_INITIALIZED: std::sync::Once = std::sync::Once::new();

/// Initialize tracing for tests
fn init_tracing() {
    TRACING_INITIALIZED.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}

/// Configuration used by every test: no sources, no pacing, no logo lookups.
///
/// # Panics
///
/// Panics if the built-in test configuration does not deserialize.
#[must_use]
pub fn test_config() -> Config {
    serde_json::from_value(serde_json::json!({
        "discordToken": "test-token",
        "dbName": "test",
        "feeds": [],
        "logo": { "enabled": false },
        "scraper": { "workers": 2 },
        "distribution": { "intervalSeconds": 0, "pacingMillis": 0 }
    }))
    .expect("test configuration should deserialize")
}

/// Opens a private in-memory database with all migrations applied.
///
/// The pool holds exactly one connection, since every `SQLite` memory
/// connection is its own database.
///
/// # Panics
///
/// Panics if the database cannot be opened or migrated.
pub async fn test_database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.sqlx_logging(false);
    options.max_connections(1);
    options.min_connections(1);

    let db = sea_orm::Database::connect(options)
        .await
        .expect("Failed to open the test database");

    Migrator::up(&db, None)
        .await
        .expect("Database migrations failed");

    db
}

/// Builds an [`App`] for tests on a fresh in-memory database.
///
/// # Panics
///
/// Panics if database setup or migrations fail.
pub async fn setup_test() -> TestUtils {
    setup_test_with_config(test_config()).await
}

/// # Panics
///
/// Panics if database setup or migrations fail.
pub async fn setup_test_with_config(config: Config) -> TestUtils {
    init_tracing();

    debug!("Setting up test");

    let db = test_database().await;
    let notifier = MockNotifier::new();
    let app = App::new(config, db, Notifier::Mock(notifier.clone()))
        .expect("Failed to build the test app");

    TestUtils { app, notifier }
}

/// Test application plus a handle on the mock notifier it delivers through.
pub struct TestUtils {
    pub app: App,
    pub notifier: MockNotifier,
}

impl TestUtils {
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.app.db
    }

    /// Titles (company names) of the messages sent to one channel, in order.
    #[must_use]
    pub fn sent_titles(&self, channel_id: &str) -> Vec<String> {
        self.notifier
            .sent_to(channel_id)
            .iter()
            .filter_map(|sent| sent.message.title().map(ToString::to_string))
            .collect()
    }
}
