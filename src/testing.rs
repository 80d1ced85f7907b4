use crate::core::Config;
use crate::db::Database;
use crate::errors::Result;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "chrome")]
use crate::browser::{ChromeBrowser, WebSession};

/// Set to `1` to run scenarios against a live frontend.
pub const E2E_ENV: &str = "FRONTEND_E2E";
/// Optional path to a TOML config for live runs.
pub const CONFIG_ENV: &str = "FRONTEND_CONFIG";

pub struct TestHelper;

impl TestHelper {
    /// Installs the log subscriber once per test binary. `RUST_LOG`
    /// overrides the default filter.
    pub fn init_tracing() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("browser_acceptance=info"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        });
    }

    pub fn e2e_enabled() -> bool {
        std::env::var(E2E_ENV).map(|v| v == "1").unwrap_or(false)
    }

    /// Config for live runs: the file named by `FRONTEND_CONFIG` if set,
    /// otherwise defaults, with `FRONTEND_*` overrides applied either way.
    pub fn config() -> Result<Config> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Config::load(path),
            Err(_) => {
                let mut config = Config::default();
                config.apply_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn open_database(config: &Config) -> Result<Option<Database>> {
        config
            .database
            .path
            .as_deref()
            .map(Database::open)
            .transpose()
    }

    #[cfg(feature = "chrome")]
    pub async fn create_test_session() -> Result<WebSession<ChromeBrowser>> {
        Self::init_tracing();
        WebSession::new(ChromeBrowser::new(), Self::config()?).await
    }
}
