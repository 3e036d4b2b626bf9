//! Simulated TodoMVC backend.
//!
//! `SimDriver` implements [`Driver`] against an in-process model of the
//! TodoMVC application. Every query renders the model to an element tree and
//! resolves the locator against it, so the page object and scenarios exercise
//! the same selectors, strictness rules and waiting behaviour they use in a
//! real browser, without one.
//!
//! An optional render latency delays every mutation, which makes the
//! auto-waiting paths observable in tests.

mod app;
mod dom;
mod selector;

pub use app::{NEW_TODO_PLACEHOLDER, Todo};

use crate::config::SuiteConfig;
use crate::driver::{Driver, PageSnapshot, SessionFactory};
use crate::error::{Error, Result};
use crate::locator::{Locator, normalize_whitespace};
use crate::todo_page::Filter;
use crate::wait::{Polled, poll_until};
use app::{Mutation, TodoMvcApp};
use async_trait::async_trait;
use dom::{Element, Target};
use parking_lot::Mutex;
use selector::{Match, resolve};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tuning for simulated sessions.
#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    /// Delay before a user action becomes visible in the rendered page
    pub latency: Duration,
    /// How long actions wait for their target to appear
    pub action_timeout: Duration,
    /// Retry interval while an action waits
    pub poll_interval: Duration,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            action_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(20),
        }
    }
}

impl From<&SuiteConfig> for SimOptions {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            action_timeout: config.action_timeout(),
            ..Self::default()
        }
    }
}

struct SimState {
    app: TodoMvcApp,
    url: Option<String>,
    pending: VecDeque<(Instant, Mutation)>,
    closed: bool,
}

impl SimState {
    fn settle(&mut self) {
        let now = Instant::now();
        while self.pending.front().is_some_and(|(due, _)| *due <= now) {
            if let Some((_, mutation)) = self.pending.pop_front() {
                self.app.apply(mutation);
            }
        }
    }

    // Nothing is rendered before the first navigation.
    fn render(&self) -> Element {
        if self.url.is_some() {
            self.app.render()
        } else {
            Element::new("body")
        }
    }
}

/// One simulated page session.
pub struct SimDriver {
    state: Mutex<SimState>,
    options: SimOptions,
}

impl SimDriver {
    /// Opens a blank session. Nothing renders until the first `goto`.
    pub fn new(options: SimOptions) -> Self {
        Self {
            state: Mutex::new(SimState {
                app: TodoMvcApp::new(),
                url: None,
                pending: VecDeque::new(),
                closed: false,
            }),
            options,
        }
    }

    /// Todos as currently rendered, including ones hidden by the filter.
    pub fn todos(&self) -> Vec<Todo> {
        let mut state = self.state.lock();
        state.settle();
        state.app.todos().to_vec()
    }

    // Runs `f` on the current rendering. The lock is released before any await.
    fn with_page<R>(&self, op: &str, f: impl FnOnce(&Element) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::SessionClosed(op.to_string()));
        }
        state.settle();
        let root = state.render();
        f(&root)
    }

    fn with_single<R>(
        &self,
        op: &str,
        locator: &Locator,
        f: impl FnOnce(Option<Match<'_>>) -> Result<R>,
    ) -> Result<R> {
        self.with_page(op, |root| {
            let matches = resolve(root, locator)?;
            match matches.as_slice() {
                [] => f(None),
                [only] => f(Some(*only)),
                many => Err(Error::StrictModeViolation {
                    selector: locator.selector(),
                    count: many.len(),
                }),
            }
        })
    }

    fn enqueue(&self, mutation: Mutation) {
        let mut state = self.state.lock();
        let due = Instant::now() + self.options.latency;
        tracing::debug!(?mutation, latency = ?self.options.latency, "sim mutation");
        state.pending.push_back((due, mutation));
    }

    // Waits for `locator` to resolve to exactly one element, then asks
    // `decide` what the action means for the application.
    async fn act<F>(&self, op: &str, locator: &Locator, decide: F) -> Result<()>
    where
        F: Fn(&Element) -> Result<Option<Mutation>>,
    {
        tracing::debug!(action = op, selector = %locator, "sim action");

        let outcome = poll_until(
            self.options.action_timeout,
            self.options.poll_interval,
            || {
                std::future::ready(self.with_single(op, locator, |found| {
                    found.map(|m| decide(m.element)).transpose()
                }))
            },
            Option::is_some,
        )
        .await?;

        match outcome {
            Polled::Matched(Some(Some(mutation))) => {
                self.enqueue(mutation);
                Ok(())
            }
            Polled::Matched(_) => Ok(()),
            Polled::TimedOut(_) => Err(Error::Timeout(format!(
                "{} waiting for '{}' after {:?}",
                op, locator, self.options.action_timeout
            ))),
        }
    }
}

fn unsupported(op: &str, el: &Element) -> Error {
    Error::UnsupportedAction(format!("cannot {} a <{}> element", op, el.tag))
}

fn is_checkbox(el: &Element) -> bool {
    el.tag == "input" && el.get_attr("type") == Some("checkbox")
}

#[async_trait]
impl Driver for SimDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        let parsed = url::Url::parse(url).map_err(|e| Error::NavigationFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let filter = Filter::from_route(parsed.fragment().unwrap_or("/"));

        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::SessionClosed("goto".to_string()));
        }
        // A load flushes everything the previous page had in flight
        while let Some((_, mutation)) = state.pending.pop_front() {
            state.app.apply(mutation);
        }
        state.app.load(filter);
        state.url = Some(parsed.to_string());
        tracing::debug!(url = %parsed, ?filter, "sim navigation");
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        self.with_page("count", |root| Ok(resolve(root, locator)?.len()))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        self.with_single("is_visible", locator, |found| {
            Ok(found.is_some_and(|m| m.visible))
        })
    }

    async fn inner_text(&self, locator: &Locator) -> Result<Option<String>> {
        self.with_single("inner_text", locator, |found| {
            Ok(found.map(|m| normalize_whitespace(&m.element.text_content())))
        })
    }

    async fn all_inner_texts(&self, locator: &Locator) -> Result<Vec<String>> {
        self.with_page("all_inner_texts", |root| {
            Ok(resolve(root, locator)?
                .iter()
                .map(|m| normalize_whitespace(&m.element.text_content()))
                .collect())
        })
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        self.act("fill", locator, |el| match el.target {
            Some(Target::NewTodo) => Ok(Some(Mutation::SetDraft(text.to_string()))),
            _ if el.tag == "input" && !is_checkbox(el) => Ok(None),
            _ => Err(unsupported("fill", el)),
        })
        .await
    }

    async fn press(&self, locator: &Locator, key: &str) -> Result<()> {
        self.act("press", locator, |el| {
            Ok(match (el.target, key) {
                (Some(Target::NewTodo), "Enter") => Some(Mutation::SubmitDraft),
                // Printable keys type into the field
                (Some(Target::NewTodo), key) if key.chars().count() == 1 => {
                    let draft = el.get_attr("value").unwrap_or_default();
                    Some(Mutation::SetDraft(format!("{}{}", draft, key)))
                }
                _ => None,
            })
        })
        .await
    }

    async fn check(&self, locator: &Locator) -> Result<()> {
        self.act("check", locator, |el| {
            if !is_checkbox(el) {
                return Err(unsupported("check", el));
            }
            if el.has_attr("checked") {
                return Ok(None);
            }
            Ok(match el.target {
                Some(Target::Toggle(id)) => Some(Mutation::SetCompleted(id, true)),
                Some(Target::ToggleAll) => Some(Mutation::SetAllCompleted(true)),
                _ => None,
            })
        })
        .await
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.act("click", locator, |el| {
            let checked = el.has_attr("checked");
            Ok(match el.target {
                Some(Target::Toggle(id)) => Some(Mutation::SetCompleted(id, !checked)),
                Some(Target::ToggleAll) => Some(Mutation::SetAllCompleted(!checked)),
                Some(Target::FilterLink(filter)) => Some(Mutation::SetFilter(filter)),
                Some(Target::ClearCompleted) => Some(Mutation::ClearCompleted),
                Some(Target::NewTodo) | None => None,
            })
        })
        .await
    }

    async fn snapshot(&self) -> Result<PageSnapshot> {
        let url = self.state.lock().url.clone().unwrap_or_else(|| "about:blank".to_string());
        self.with_page("snapshot", |root| {
            Ok(PageSnapshot {
                url,
                html: format!("<!DOCTYPE html><html>{}</html>", root.to_html()),
                screenshot: None,
            })
        })
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.closed = true;
        state.pending.clear();
        Ok(())
    }
}

/// Opens independent simulated sessions.
#[derive(Debug, Clone, Default)]
pub struct SimSessionFactory {
    options: SimOptions,
}

impl SimSessionFactory {
    /// Every session opened from this factory uses `options`.
    pub fn new(options: SimOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionFactory for SimSessionFactory {
    fn backend(&self) -> &'static str {
        "sim"
    }

    async fn open_session(&self) -> Result<Arc<dyn Driver>> {
        Ok(Arc::new(SimDriver::new(self.options)))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::AriaRole;

    const URL: &str = "https://demo.playwright.dev/todomvc/";

    fn input() -> Locator {
        Locator::get_by_placeholder(NEW_TODO_PLACEHOLDER)
    }

    fn quick() -> SimOptions {
        SimOptions {
            action_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
            ..SimOptions::default()
        }
    }

    async fn add(driver: &SimDriver, title: &str) {
        driver.fill(&input(), title).await.expect("fill");
        driver.press(&input(), "Enter").await.expect("press");
    }

    #[tokio::test]
    async fn test_blank_page_before_navigation() {
        let driver = SimDriver::new(quick());
        assert_eq!(driver.count(&input()).await.unwrap(), 0);

        let err = driver.fill(&input(), "Buy milk").await.expect_err("no page");
        assert!(matches!(err, Error::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn test_add_and_toggle() {
        let driver = SimDriver::new(quick());
        driver.goto(URL).await.unwrap();
        add(&driver, "Buy milk").await;
        add(&driver, "Walk the dog").await;

        let toggle = Locator::css(".todo-list li")
            .filter_has_text("Buy milk")
            .locator("input.toggle");
        driver.check(&toggle).await.unwrap();
        // check() is idempotent
        driver.check(&toggle).await.unwrap();

        let todos = driver.todos();
        assert_eq!(todos.len(), 2);
        assert!(todos[0].completed);
        assert!(!todos[1].completed);
        assert_eq!(
            driver.inner_text(&Locator::css(".todo-count")).await.unwrap().as_deref(),
            Some("1 item left")
        );
    }

    #[tokio::test]
    async fn test_press_types_printable_keys() {
        let driver = SimDriver::new(quick());
        driver.goto(URL).await.unwrap();
        driver.fill(&input(), "Bu").await.unwrap();
        driver.press(&input(), "y").await.unwrap();
        driver.press(&input(), "Enter").await.unwrap();

        assert_eq!(driver.todos()[0].title, "Buy");
    }

    #[tokio::test]
    async fn test_strict_mode_violation_is_immediate() {
        let driver = SimDriver::new(SimOptions {
            action_timeout: Duration::from_secs(30),
            ..quick()
        });
        driver.goto(URL).await.unwrap();
        add(&driver, "Buy milk").await;
        add(&driver, "Buy bread").await;

        let start = Instant::now();
        let ambiguous = Locator::css(".todo-list li")
            .filter_has_text("Buy")
            .locator("input.toggle");
        let err = driver.check(&ambiguous).await.expect_err("ambiguous");
        assert!(matches!(err, Error::StrictModeViolation { count: 2, .. }));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_unsupported_actions() {
        let driver = SimDriver::new(quick());
        driver.goto(URL).await.unwrap();
        add(&driver, "Buy milk").await;

        let link = Locator::get_by_role(AriaRole::Link, "Active");
        let err = driver.fill(&link, "x").await.expect_err("fill a link");
        assert!(matches!(err, Error::UnsupportedAction(_)));

        let err = driver.check(&link).await.expect_err("check a link");
        assert!(matches!(err, Error::UnsupportedAction(_)));
    }

    #[tokio::test]
    async fn test_latency_delays_rendering_and_actions_wait() {
        let driver = SimDriver::new(SimOptions {
            latency: Duration::from_millis(50),
            action_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(5),
        });
        driver.goto(URL).await.unwrap();
        add(&driver, "Buy milk").await;

        let items = Locator::css(".todo-list li");
        assert_eq!(driver.count(&items).await.unwrap(), 0, "not rendered yet");

        // Waits for the item to render before checking it
        let toggle = items.filter_has_text("Buy milk").locator("input.toggle");
        driver.check(&toggle).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(driver.count(&items).await.unwrap(), 1);
        assert!(driver.todos()[0].completed);
    }

    #[tokio::test]
    async fn test_goto_route_selects_filter_and_keeps_todos() {
        let driver = SimDriver::new(quick());
        driver.goto(URL).await.unwrap();
        add(&driver, "Buy milk").await;

        driver.goto(&format!("{}#/completed", URL)).await.unwrap();
        assert_eq!(driver.count(&Locator::css(".todo-list li")).await.unwrap(), 0);
        assert_eq!(driver.todos().len(), 1);

        let err = driver.goto("not a url").await.expect_err("bad url");
        assert!(matches!(err, Error::NavigationFailed { .. }));
    }

    #[tokio::test]
    async fn test_snapshot_and_close() {
        let driver = SimDriver::new(quick());
        driver.goto(URL).await.unwrap();
        add(&driver, "Buy milk").await;

        let snapshot = driver.snapshot().await.unwrap();
        assert_eq!(snapshot.url, URL);
        assert!(snapshot.html.contains(r#"<label data-testid="todo-title">Buy milk</label>"#));
        assert!(snapshot.screenshot.is_none());

        driver.close().await.unwrap();
        let err = driver.count(&input()).await.expect_err("closed");
        assert!(matches!(err, Error::SessionClosed(_)));
    }

    #[tokio::test]
    async fn test_factory_sessions_are_isolated() {
        let factory = SimSessionFactory::new(quick());
        let first = factory.open_session().await.unwrap();
        let second = factory.open_session().await.unwrap();
        first.goto(URL).await.unwrap();
        second.goto(URL).await.unwrap();

        first.fill(&input(), "Only here").await.unwrap();
        first.press(&input(), "Enter").await.unwrap();

        let items = Locator::css(".todo-list li");
        assert_eq!(first.count(&items).await.unwrap(), 1);
        assert_eq!(second.count(&items).await.unwrap(), 0);
        assert_eq!(factory.backend(), "sim");
    }
}
