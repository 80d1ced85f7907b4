use crate::core::session::CookieData;
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type TabHandle: Send + Sync;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &crate::core::Config) -> Result<()>;

    /// Create a new tab/page
    async fn new_tab(&self) -> Result<Self::TabHandle>;

    /// Navigate to a URL
    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()>;

    /// Execute JavaScript in the browser
    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value>;

    /// Take a PNG screenshot
    async fn take_screenshot(&self, tab: &Self::TabHandle) -> Result<Vec<u8>>;

    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String>;

    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String>;

    /// Set a cookie for the page currently loaded in `tab`
    async fn set_cookie(&self, tab: &Self::TabHandle, cookie: &CookieData) -> Result<()>;

    async fn clear_cookies(&self, tab: &Self::TabHandle) -> Result<()>;

    /// Check if browser is still running
    fn is_running(&self) -> bool;

    /// Close the browser
    async fn close(&mut self) -> Result<()>;
}
