use crate::core::BrowserTrait;
use crate::errors::{HarnessError, Result};
use crate::utils::{JavaScriptRunner, ProbeCall};
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Polls `probe` every `poll` until it yields `Some`, or fails with
/// [`HarnessError::Timeout`] naming `what` once `timeout` has elapsed.
///
/// Errors returned by the probe abort the wait immediately.
pub async fn wait_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start_time = Instant::now();

    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }

        if start_time.elapsed() >= timeout {
            return Err(HarnessError::Timeout(format!(
                "{} ({}ms)",
                what,
                timeout.as_millis()
            )));
        }

        tokio::time::sleep(poll).await;
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadyState {
    ready_state: String,
    pending: i64,
    #[serde(default)]
    stale: bool,
    url: String,
}

pub struct NavigationManager;

impl NavigationManager {
    /// Blocks until the document has loaded and no XHR/fetch is in flight.
    pub async fn wait_until_ready<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        timeout_ms: u64,
        poll_interval_ms: u64,
    ) -> Result<NavigationResult> {
        Self::wait_for_document(browser, tab, timeout_ms, poll_interval_ms, false).await
    }

    /// Like [`NavigationManager::wait_until_ready`], but a document flagged
    /// with [`ProbeCall::mark_stale`] never counts as ready.
    pub async fn wait_for_new_document<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        timeout_ms: u64,
        poll_interval_ms: u64,
    ) -> Result<NavigationResult> {
        Self::wait_for_document(browser, tab, timeout_ms, poll_interval_ms, true).await
    }

    async fn wait_for_document<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        timeout_ms: u64,
        poll_interval_ms: u64,
        fresh: bool,
    ) -> Result<NavigationResult> {
        let start_time = Instant::now();
        let mut polls = 0u32;
        let what = if fresh { "page reload" } else { "page readiness" };

        let state = wait_until(
            what,
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
            || {
                polls += 1;
                async move {
                    let value = JavaScriptRunner::call(browser, tab, &ProbeCall::ready()).await?;
                    let state: ReadyState = serde_json::from_value(value)?;
                    if state.ready_state == "complete" && state.pending <= 0 && !(fresh && state.stale) {
                        Ok(Some(state))
                    } else {
                        Ok(None)
                    }
                }
            },
        )
        .await?;

        let result = NavigationResult {
            url: state.url,
            ready_state: state.ready_state,
            duration_ms: start_time.elapsed().as_millis() as u64,
            polls,
        };
        debug!(url = %result.url, duration_ms = result.duration_ms, polls = result.polls, "page ready");
        Ok(result)
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub ready_state: String,
    pub duration_ms: u64,
    pub polls: u32,
}
