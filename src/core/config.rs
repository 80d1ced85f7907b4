use crate::errors::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frontend: FrontendConfig,
    pub browser: BrowserConfig,
    pub waits: WaitConfig,
    pub database: DatabaseConfig,
    pub artifacts: ArtifactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub session_cookie: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub disable_images: bool,
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub navigation_timeout_ms: u64,
    pub element_timeout_ms: u64,
    pub message_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub screenshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
            username: "Admin".to_string(),
            password: "zabbix".to_string(),
            session_cookie: "zbx_session".to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            disable_images: false,
            args: vec![],
            timeout_ms: 30000,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 10000,
            element_timeout_ms: 5000,
            message_timeout_ms: 5000,
            poll_interval_ms: 50,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: None }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_scale_factor: 1.0,
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| HarnessError::ConfigurationError(e.to_string()))
    }

    /// Reads a TOML file, applies environment overrides and validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml_str(&source)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("FRONTEND_URL") {
            self.frontend.base_url = url;
        }
        if let Some(user) = lookup("FRONTEND_USER") {
            self.frontend.username = user;
        }
        if let Some(password) = lookup("FRONTEND_PASSWORD") {
            self.frontend.password = password;
        }
        if let Some(db) = lookup("FRONTEND_DB") {
            self.database.path = Some(PathBuf::from(db));
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.frontend.base_url).map_err(|e| {
            HarnessError::ConfigurationError(format!(
                "frontend.base_url '{}': {}",
                self.frontend.base_url, e
            ))
        })?;

        let waits = [
            ("waits.navigation_timeout_ms", self.waits.navigation_timeout_ms),
            ("waits.element_timeout_ms", self.waits.element_timeout_ms),
            ("waits.message_timeout_ms", self.waits.message_timeout_ms),
            ("waits.poll_interval_ms", self.waits.poll_interval_ms),
        ];
        for (name, value) in waits {
            if value == 0 {
                return Err(HarnessError::ConfigurationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Resolves a frontend-relative path such as `hosts.php?form=create`.
    pub fn page_url(&self, path: &str) -> Result<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }

        let mut base = self.frontend.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        let base = url::Url::parse(&base)
            .map_err(|e| HarnessError::ConfigurationError(e.to_string()))?;
        base.join(path.trim_start_matches('/'))
            .map(|u| u.to_string())
            .map_err(|e| HarnessError::NavigationFailed(format!("{}: {}", path, e)))
    }
}
