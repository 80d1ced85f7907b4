use crate::browser::navigation::{wait_until, NavigationManager, NavigationResult};
use crate::core::{AuthState, BrowserTrait, Config, CookieData, Credentials, SessionToken};
use crate::errors::{ensure_eq, HarnessError, Result};
use crate::locator::Locator;
use crate::utils::{JavaScriptRunner, ProbeCall, ScreenshotManager};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const LOGIN_PATH: &str = "index.php";
pub const LOGOUT_PATH: &str = "index.php?reconnect=1";

/// The page header every frontend page renders.
pub fn header_locator() -> Locator {
    Locator::id("page-title-general")
}

fn login_username() -> Locator {
    Locator::id("name")
}

fn login_password() -> Locator {
    Locator::id("password")
}

fn login_submit() -> Locator {
    Locator::id("enter")
}

/// A browser tab bound to the frontend under test.
///
/// Every helper takes the session explicitly; nothing about the browser or
/// the logged-in user lives in globals.
pub struct WebSession<B: BrowserTrait> {
    browser: B,
    tab: Option<B::TabHandle>,
    config: Config,
    auth: AuthState,
    session_id: String,
}

impl<B: BrowserTrait> WebSession<B> {
    pub async fn new(mut browser: B, config: Config) -> Result<Self> {
        browser.launch(&config).await?;
        let tab = browser.new_tab().await?;
        let session_id = uuid::Uuid::new_v4().to_string();
        info!(session = %session_id, base_url = %config.frontend.base_url, "browser session started");

        Ok(Self {
            browser,
            tab: Some(tab),
            config,
            auth: AuthState::Anonymous,
            session_id,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    fn tab(&self) -> Result<&B::TabHandle> {
        self.tab.as_ref().ok_or(HarnessError::NoActiveTab)
    }

    pub(crate) fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.config.waits.element_timeout_ms)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.waits.poll_interval_ms)
    }

    /// Sends one request to the in-page runtime.
    pub async fn call(&self, call: &ProbeCall) -> Result<Value> {
        JavaScriptRunner::call(&self.browser, self.tab()?, call).await
    }

    // ──────────────────── navigation ────────────────────

    /// Opens a frontend page and blocks until it has settled.
    pub async fn open(&self, path: &str) -> Result<NavigationResult> {
        self.open_without_wait(path).await?;
        self.wait_until_ready().await
    }

    pub async fn open_without_wait(&self, path: &str) -> Result<()> {
        let url = self.config.page_url(path)?;
        info!(url = %url, "open");
        self.browser.navigate(self.tab()?, &url).await
    }

    pub async fn wait_until_ready(&self) -> Result<NavigationResult> {
        NavigationManager::wait_until_ready(
            &self.browser,
            self.tab()?,
            self.config.waits.navigation_timeout_ms,
            self.config.waits.poll_interval_ms,
        )
        .await
    }

    /// Clicks something that reloads the page and waits for the new
    /// document. The old one is flagged first, so its own "complete" state
    /// is never mistaken for the result.
    pub async fn click_and_reload(&self, locator: &Locator) -> Result<NavigationResult> {
        self.call(&ProbeCall::mark_stale()).await?;
        self.click(locator).await?;
        NavigationManager::wait_for_new_document(
            &self.browser,
            self.tab()?,
            self.config.waits.navigation_timeout_ms,
            self.config.waits.poll_interval_ms,
        )
        .await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.browser.get_url(self.tab()?).await
    }

    pub async fn title(&self) -> Result<String> {
        self.browser.get_title(self.tab()?).await
    }

    pub async fn check_title(&self, expected: &str) -> Result<()> {
        let actual = self.title().await?;
        ensure_eq("Page title", expected, actual.as_str())
    }

    pub async fn check_header(&self, expected: &str) -> Result<()> {
        let actual = self.text(&header_locator()).await?;
        ensure_eq("Page header", expected, actual.as_str())
    }

    // ──────────────────── authentication ────────────────────

    /// Logs in with the configured default user.
    pub async fn login(&mut self) -> Result<&AuthState> {
        let credentials = Credentials::new(
            self.config.frontend.username.clone(),
            self.config.frontend.password.clone(),
        );
        self.login_as(&credentials).await
    }

    /// Submits the login form. Wrong credentials are not an error: the
    /// session ends up [`AuthState::Rejected`] and the page shows why.
    pub async fn login_as(&mut self, credentials: &Credentials) -> Result<&AuthState> {
        info!(user = %credentials.username, "login through form");
        self.open(LOGIN_PATH).await?;
        self.wait_for(&login_username()).await?;

        self.call(&ProbeCall::fill(&login_username(), json!(credentials.username)))
            .await?;
        self.call(&ProbeCall::fill(&login_password(), json!(credentials.password)))
            .await?;
        self.click_and_reload(&login_submit()).await?;

        self.auth = if self.exists(&login_submit()).await? {
            warn!(user = %credentials.username, "login form still shown after submit");
            AuthState::Rejected {
                username: credentials.username.clone(),
            }
        } else {
            AuthState::Authenticated {
                username: credentials.username.clone(),
            }
        };
        Ok(&self.auth)
    }

    /// Skips the login form by injecting an existing session as a cookie.
    /// The session row must already exist in the frontend database.
    pub async fn login_with_token(&mut self, token: &SessionToken) -> Result<&AuthState> {
        info!(user_id = token.user_id, "login through session cookie");
        self.open_without_wait(LOGIN_PATH).await?;

        let cookie = CookieData::session(
            self.config.frontend.session_cookie.clone(),
            token.cookie_value(),
        );
        let tab = self.tab()?;
        self.browser.clear_cookies(tab).await?;
        self.browser.set_cookie(tab, &cookie).await?;

        self.auth = AuthState::Injected {
            user_id: token.user_id,
        };
        Ok(&self.auth)
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.browser.clear_cookies(self.tab()?).await?;
        self.open(LOGOUT_PATH).await?;
        self.auth = AuthState::Anonymous;
        Ok(())
    }

    // ──────────────────── elements ────────────────────

    pub async fn count(&self, locator: &Locator) -> Result<usize> {
        let value = self.call(&ProbeCall::on("count", locator)).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    pub async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.count(locator).await? > 0)
    }

    pub async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        let value = self.call(&ProbeCall::on("visible", locator)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    pub async fn html(&self, locator: &Locator) -> Result<String> {
        let value = self.call(&ProbeCall::on("html", locator)).await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    pub async fn text(&self, locator: &Locator) -> Result<String> {
        let value = self.call(&ProbeCall::on("text", locator)).await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    pub async fn click(&self, locator: &Locator) -> Result<()> {
        debug!(locator = %locator, "click");
        self.call(&ProbeCall::on("click", locator)).await?;
        Ok(())
    }

    /// Waits until the element is present and visible.
    pub async fn wait_for(&self, locator: &Locator) -> Result<()> {
        self.wait_for_within(locator, self.element_timeout()).await
    }

    pub async fn wait_for_within(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let what = format!("{} to become visible", locator);
        wait_until(&what, timeout, self.poll_interval(), || async move {
            Ok(self.is_visible(locator).await?.then_some(()))
        })
        .await
    }

    /// Waits until the element is in the DOM, visible or not.
    pub async fn wait_for_present(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let what = format!("{} to appear", locator);
        wait_until(&what, timeout, self.poll_interval(), || async move {
            Ok(self.exists(locator).await?.then_some(()))
        })
        .await
    }

    /// Waits until exactly `expected` elements match.
    pub async fn wait_for_count(&self, locator: &Locator, expected: usize) -> Result<()> {
        let what = format!("{} elements matching {}", expected, locator);
        wait_until(&what, self.element_timeout(), self.poll_interval(), || async move {
            Ok((self.count(locator).await? == expected).then_some(()))
        })
        .await
    }

    /// Drops a PNG of the current page into the configured artifact
    /// directory. Returns `None` when no directory is configured.
    pub async fn screenshot_on_failure(&self, scenario: &str) -> Result<Option<PathBuf>> {
        let Some(dir) = self.config.artifacts.screenshot_dir.as_ref() else {
            return Ok(None);
        };

        let path = ScreenshotManager::artifact_path(dir, scenario);
        ScreenshotManager::save_to_file(&self.browser, self.tab()?, &path).await?;
        warn!(scenario, path = %path.display(), "failure screenshot saved");
        Ok(Some(path))
    }

    pub async fn close(mut self) -> Result<()> {
        self.tab = None;
        self.browser.close().await
    }
}
