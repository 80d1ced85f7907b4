use crate::browser::WebSession;
use crate::core::BrowserTrait;
use crate::dom::message::BANNER_CSS;
use crate::dom::{Banner, MessageKind};
use crate::errors::{ensure_eq, HarnessError, Result};
use crate::locator::Locator;
use crate::types::Outcome;
use std::time::Duration;
use tracing::{debug, info};

/// The notification banner currently rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBanner {
    banner: Banner,
}

impl MessageBanner {
    pub fn locator() -> Locator {
        Locator::css(BANNER_CSS)
    }

    fn close_button() -> Locator {
        Locator::css(".btn-overlay-close").within(Self::locator())
    }

    /// Waits for the banner to render and captures it.
    pub async fn find<B: BrowserTrait>(session: &WebSession<B>) -> Result<Self> {
        let timeout = Duration::from_millis(session.config().waits.message_timeout_ms);
        session.wait_for_present(&Self::locator(), timeout).await?;

        let found = Self::capture(session).await?;
        debug!(kind = ?found.banner.kind, title = %found.banner.title, "message banner");
        Ok(found)
    }

    /// Captures the banner if one is rendered right now.
    pub async fn find_now<B: BrowserTrait>(session: &WebSession<B>) -> Result<Option<Self>> {
        if !session.exists(&Self::locator()).await? {
            return Ok(None);
        }
        Self::capture(session).await.map(Some)
    }

    async fn capture<B: BrowserTrait>(session: &WebSession<B>) -> Result<Self> {
        let html = session.html(&Self::locator()).await?;
        Ok(Self {
            banner: Banner::parse(&html)?,
        })
    }

    pub fn from_banner(banner: Banner) -> Self {
        Self { banner }
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    pub fn is_good(&self) -> bool {
        self.banner.is_good()
    }

    pub fn is_bad(&self) -> bool {
        self.banner.is_bad()
    }

    pub fn title(&self) -> &str {
        &self.banner.title
    }

    pub fn lines(&self) -> &[String] {
        &self.banner.lines
    }

    pub fn has_line(&self, text: &str) -> bool {
        self.banner.has_line(text)
    }

    /// Dismisses the banner and waits for it to go away.
    pub async fn close<B: BrowserTrait>(&self, session: &WebSession<B>) -> Result<()> {
        session.click(&Self::close_button()).await?;
        session.wait_for_count(&Self::locator(), 0).await
    }

    /// Checks state, title and (as an unordered subset) detail lines.
    pub fn check(&self, outcome: Outcome, title: &str, lines: &[String]) -> Result<()> {
        let expected_kind = match outcome {
            Outcome::Good => MessageKind::Good,
            Outcome::Bad | Outcome::Error => MessageKind::Bad,
        };
        ensure_eq("Message state", expected_kind, self.banner.kind)?;
        ensure_eq("Message title", title, self.title())?;

        let missing = self.banner.missing_lines(lines);
        if !missing.is_empty() {
            return Err(HarnessError::assertion(
                "Message details",
                missing,
                &self.banner.lines,
            ));
        }
        Ok(())
    }
}

/// Waits for the banner and checks it in one go.
pub async fn assert_message<B: BrowserTrait>(
    session: &WebSession<B>,
    outcome: Outcome,
    title: &str,
    lines: &[String],
) -> Result<MessageBanner> {
    let message = MessageBanner::find(session).await?;
    message.check(outcome, title, lines)?;
    info!(?outcome, title, "message verified");
    Ok(message)
}
