// Playwright backend
//
// Drives a real browser through playwright-rs. One browser process per
// factory; every session gets its own BrowserContext, so cookies and local
// storage never leak between scenarios.
//
// Locator descriptors are rendered to Playwright selector strings
// (Locator::selector) and resolved by the Playwright server, which applies
// its own auto-waiting and strict-mode rules to actions. Queries count first
// so that zero matches never waits and several matches fail immediately. The
// read that follows the count is bounded by the query timeout: an element that
// re-renders in between reads as absent instead of stalling the poll.

use crate::config::{BrowserKind, SuiteConfig};
use crate::driver::{Driver, PageSnapshot, SessionFactory};
use crate::error::{Error, Result};
use crate::locator::Locator;
use async_trait::async_trait;
use playwright_rs::{
    Browser, BrowserContext, CheckOptions, ClickOptions, FillOptions, LaunchOptions, Page,
    Playwright, PressOptions,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// One browser context and its page.
pub struct PlaywrightDriver {
    context: BrowserContext,
    page: Page,
    action_timeout_ms: f64,
    query_timeout: Duration,
}

impl PlaywrightDriver {
    async fn resolve(&self, locator: &Locator) -> playwright_rs::Locator {
        self.page.locator(&locator.selector()).await
    }

    // Count-then-read for single-element queries.
    async fn resolve_single(&self, locator: &Locator) -> Result<Option<playwright_rs::Locator>> {
        let resolved = self.resolve(locator).await;
        match resolved.count().await? {
            0 => Ok(None),
            1 => Ok(Some(resolved)),
            count => Err(Error::StrictModeViolation {
                selector: locator.selector(),
                count,
            }),
        }
    }

    // Runs a read on an already-counted element. `None` means it went away
    // before the read settled.
    async fn read_bounded<T>(
        &self,
        op: &str,
        locator: &Locator,
        read: impl Future<Output = playwright_rs::Result<T>>,
    ) -> Result<Option<T>> {
        match tokio::time::timeout(self.query_timeout, read).await {
            Ok(value) => Ok(Some(value?)),
            Err(_) => {
                tracing::debug!(op, selector = %locator, "element detached during read");
                Ok(None)
            }
        }
    }

    // Maps a failed action onto the shared error contract.
    async fn action_error(&self, op: &str, locator: &Locator, err: playwright_rs::Error) -> Error {
        let message = err.to_string();
        if message.to_ascii_lowercase().contains("strict mode violation") {
            return match self.resolve(locator).await.count().await {
                Ok(count) => Error::StrictModeViolation {
                    selector: locator.selector(),
                    count,
                },
                Err(recount) => {
                    tracing::warn!(error = %recount, "recount after strict mode violation failed");
                    Error::from(err).context(format!("{} '{}'", op, locator))
                }
            };
        }
        match err {
            playwright_rs::Error::Timeout(msg) => Error::Timeout(format!(
                "{} waiting for '{}': {}",
                op, locator, msg
            )),
            other => Error::from(other).context(format!("{} '{}'", op, locator)),
        }
    }
}

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "playwright navigation");
        self.page
            .goto(url, None)
            .await
            .map_err(|e| Error::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.resolve(locator).await.count().await?)
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        match self.resolve_single(locator).await? {
            Some(element) => {
                let visible = self.read_bounded("is_visible", locator, element.is_visible());
                Ok(visible.await?.unwrap_or(false))
            }
            None => Ok(false),
        }
    }

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>> {
        match self.resolve_single(locator).await? {
            Some(element) => self.read_bounded("inner_text", locator, element.inner_text()).await,
            None => Ok(None),
        }
    }

    async fn all_inner_texts(&self, locator: &Locator) -> Result<Vec<String>> {
        let resolved = self.resolve(locator).await;
        let count = resolved.count().await?;
        let mut texts = Vec::with_capacity(count);
        for index in 0..count {
            let index = i32::try_from(index)
                .map_err(|_| Error::InvalidArgument(format!("too many matches: {}", count)))?;
            let item = resolved.nth(index);
            match self.read_bounded("all_inner_texts", locator, item.inner_text()).await? {
                Some(text) => texts.push(text),
                // The list shrank under us; report what is still there
                None => break,
            }
        }
        Ok(texts)
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        tracing::debug!(selector = %locator, "playwright fill");
        let options = FillOptions::builder().timeout(self.action_timeout_ms).build();
        match self.resolve(locator).await.fill(text, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.action_error("fill", locator, e).await),
        }
    }

    async fn press(&self, locator: &Locator, key: &str) -> Result<()> {
        tracing::debug!(selector = %locator, key, "playwright press");
        let options = PressOptions::builder().timeout(self.action_timeout_ms).build();
        match self.resolve(locator).await.press(key, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.action_error("press", locator, e).await),
        }
    }

    async fn check(&self, locator: &Locator) -> Result<()> {
        tracing::debug!(selector = %locator, "playwright check");
        let options = CheckOptions::builder().timeout(self.action_timeout_ms).build();
        match self.resolve(locator).await.check(Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.action_error("check", locator, e).await),
        }
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        tracing::debug!(selector = %locator, "playwright click");
        let options = ClickOptions::builder().timeout(self.action_timeout_ms).build();
        match self.resolve(locator).await.click(Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.action_error("click", locator, e).await),
        }
    }

    async fn snapshot(&self) -> Result<PageSnapshot> {
        let html = self.page.content().await?;
        let screenshot = match self.page.screenshot(None).await {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::warn!(error = %e, "screenshot failed, keeping HTML only");
                None
            }
        };
        Ok(PageSnapshot {
            url: self.page.url(),
            html,
            screenshot,
        })
    }

    async fn close(&self) -> Result<()> {
        self.context.close().await?;
        Ok(())
    }
}

/// Launches one browser and opens a fresh context per session.
pub struct PlaywrightSessionFactory {
    playwright: Playwright,
    browser: Browser,
    action_timeout: Duration,
    query_timeout: Duration,
}

impl PlaywrightSessionFactory {
    /// Starts the Playwright server and launches the configured browser.
    pub async fn launch(config: &SuiteConfig) -> Result<Self> {
        tracing::info!(browser = %config.browser, headless = config.headless, "launching browser");
        let playwright = Playwright::launch().await?;
        let browser_type = match config.browser {
            BrowserKind::Chromium => playwright.chromium(),
            BrowserKind::Firefox => playwright.firefox(),
            BrowserKind::Webkit => playwright.webkit(),
        };
        let browser = browser_type
            .launch_with_options(LaunchOptions::new().headless(config.headless))
            .await?;
        Ok(Self {
            playwright,
            browser,
            action_timeout: config.action_timeout(),
            query_timeout: config.assertion_timeout(),
        })
    }
}

#[async_trait]
impl SessionFactory for PlaywrightSessionFactory {
    fn backend(&self) -> &'static str {
        "playwright"
    }

    async fn open_session(&self) -> Result<Arc<dyn Driver>> {
        let context = self.browser.new_context().await?;
        let page = context.new_page().await?;
        Ok(Arc::new(PlaywrightDriver {
            context,
            page,
            action_timeout_ms: self.action_timeout.as_millis() as f64,
            query_timeout: self.query_timeout,
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::debug!("closing browser");
        self.browser.close().await?;
        self.playwright.shutdown().await?;
        Ok(())
    }
}
