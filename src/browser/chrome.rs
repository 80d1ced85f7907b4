use crate::core::{BrowserTrait, Config, CookieData};
use crate::errors::{HarnessError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Chrome browser implementation
pub struct ChromeBrowser {
    browser: Option<Browser>,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self { browser: None }
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Runs a blocking headless_chrome call on the blocking pool, so polling
/// loops and timeouts on the runtime keep running meanwhile.
async fn blocking<T, F>(call: F, wrap: fn(String) -> HarnessError) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| HarnessError::ChromeError(e.to_string()))?
        .map_err(|e| wrap(e.to_string()))
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type TabHandle = Arc<Tab>;

    async fn launch(&mut self, config: &Config) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.browser.viewport.width, config.browser.viewport.height
        );

        let user_agent_arg = config
            .browser
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        if config.browser.disable_images {
            args.push(OsStr::new("--blink-settings=imagesEnabled=false"));
        }

        for arg in &config.browser.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.browser.headless)
            .idle_browser_timeout(Duration::from_millis(config.browser.timeout_ms))
            .args(args)
            .build()
            .map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;

        info!(headless = config.browser.headless, "chrome launched");
        self.browser = Some(browser);
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        let browser = self
            .browser
            .as_ref()
            .ok_or(HarnessError::BrowserNotLaunched)?;

        let browser = browser.clone();
        blocking(move || browser.new_tab(), HarnessError::TabCreationFailed).await
    }

    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()> {
        debug!(url, "navigate");
        let tab = tab.clone();
        let url = url.to_string();
        blocking(
            move || {
                tab.navigate_to(&url)?;
                tab.wait_until_navigated()?;
                Ok(())
            },
            HarnessError::NavigationFailed,
        )
        .await
    }

    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value> {
        let tab = tab.clone();
        let script = script.to_string();
        let result = blocking(
            move || tab.evaluate(&script, false),
            HarnessError::JavaScriptFailed,
        )
        .await?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn take_screenshot(&self, tab: &Self::TabHandle) -> Result<Vec<u8>> {
        let tab = tab.clone();
        blocking(
            move || {
                tab.capture_screenshot(
                    headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                    None,
                    None,
                    true,
                )
            },
            HarnessError::ScreenshotFailed,
        )
        .await
    }

    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String> {
        Ok(tab.get_url())
    }

    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String> {
        let result = self.execute_script(tab, "document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    async fn set_cookie(&self, tab: &Self::TabHandle, cookie: &CookieData) -> Result<()> {
        let mut attributes = format!("path={}", cookie.path);
        if cookie.secure {
            attributes.push_str("; secure");
        }

        let script = format!(
            "document.cookie = encodeURIComponent({}) + '=' + encodeURIComponent({}) + '; ' + {};",
            js_string(&cookie.name),
            js_string(&cookie.value),
            js_string(&attributes)
        );
        self.execute_script(tab, &script).await?;
        Ok(())
    }

    async fn clear_cookies(&self, tab: &Self::TabHandle) -> Result<()> {
        let script = r#"
            document.cookie.split(';').forEach((c) => {
                const name = c.split('=')[0].trim();
                if (name) document.cookie = name + '=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/';
            });
        "#;
        self.execute_script(tab, script).await?;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        self.browser = None;
        Ok(())
    }
}
