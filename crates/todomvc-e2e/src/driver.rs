// Driver - The automation seam
//
// Everything the page object does goes through `Driver`. Two backends
// implement it:
// - `SimDriver` (crate::sim): in-process TodoMVC model, no browser
// - `PlaywrightDriver` (crate::playwright, feature "playwright"): real browser
//
// Contract shared by all backends:
// - Actions (fill/press/check/click) wait until the locator resolves to
//   exactly one element, up to the action timeout
// - Zero matches after the timeout is `Error::Timeout`
// - More than one match is `Error::StrictModeViolation`, raised immediately
// - Queries (count/is_visible/inner_text/all_inner_texts) evaluate against
//   current state once and never wait; the single-element ones still raise
//   `StrictModeViolation` on ambiguity

use crate::error::Result;
use crate::locator::Locator;
use async_trait::async_trait;
use std::sync::Arc;

/// Page state captured for failure diagnostics.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// URL the session was on
    pub url: String,
    /// Serialised DOM
    pub html: String,
    /// PNG screenshot, when the backend can render one
    pub screenshot: Option<Vec<u8>>,
}

/// One isolated page session.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigates to an absolute URL.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Number of elements currently matching `locator`.
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Whether the single element matching `locator` is visible.
    ///
    /// Returns false when nothing matches.
    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    /// Rendered text of the single element matching `locator`.
    ///
    /// Returns `None` when nothing matches.
    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>>;

    /// Rendered text of every element matching `locator`, in document order.
    async fn all_inner_texts(&self, locator: &Locator) -> Result<Vec<String>>;

    /// Replaces the value of an input.
    async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Presses a key (e.g. "Enter") with the element focused.
    async fn press(&self, locator: &Locator, key: &str) -> Result<()>;

    /// Ensures a checkbox is checked. No-op if it already is.
    async fn check(&self, locator: &Locator) -> Result<()>;

    /// Clicks the element.
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Captures the current page state.
    async fn snapshot(&self) -> Result<PageSnapshot>;

    /// Closes the session. Further calls fail.
    async fn close(&self) -> Result<()>;
}

/// Opens isolated sessions against one backend.
///
/// Sessions opened from the same factory share nothing but the backend's
/// process-level resources (e.g. one browser process).
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Short backend name for logs and reports.
    fn backend(&self) -> &'static str;

    /// Opens a fresh session with its own application state.
    async fn open_session(&self) -> Result<Arc<dyn Driver>>;

    /// Releases backend resources. Sessions must be closed first.
    async fn shutdown(&self) -> Result<()>;
}
