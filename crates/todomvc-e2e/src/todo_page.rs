// TodoPage - Page object for the TodoMVC application
//
// Owns the locators for one TodoMVC page and turns user intents into Driver
// calls. Holds no application state: every method acts on or reads the live
// page, and every failure propagates unchanged to the calling scenario.

use crate::assertions::{Expectation, expect};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::locator::{AriaRole, Locator};
use crate::wait::{DEFAULT_ASSERTION_TIMEOUT, DEFAULT_POLL_INTERVAL, Polled, poll_until};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Which todos the list shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Accessible name of the navigation link.
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    /// Hash route the link points at.
    pub fn route(&self) -> &'static str {
        match self {
            Filter::All => "#/",
            Filter::Active => "#/active",
            Filter::Completed => "#/completed",
        }
    }

    /// Parses a hash route (`#/active`, `/active`); anything unknown is `All`.
    pub fn from_route(route: &str) -> Self {
        match route.trim_start_matches('#').trim_end_matches('/') {
            "/active" => Filter::Active,
            "/completed" => Filter::Completed,
            _ => Filter::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Text of the remaining-items counter for `n` active todos.
///
/// The application pluralises for every count except one.
pub fn items_left_label(n: usize) -> String {
    if n == 1 {
        "1 item left".to_string()
    } else {
        format!("{} items left", n)
    }
}

/// Page object for the TodoMVC application.
///
/// # Example
///
/// ```ignore
/// use todomvc_e2e::{Filter, TodoPage};
///
/// let todo = TodoPage::new(driver, "https://demo.playwright.dev/todomvc/");
/// todo.navigate_to_app().await?;
/// todo.add_todo("Buy milk").await?;
/// todo.toggle_todo("Buy milk").await?;
/// todo.set_filter(Filter::Completed).await?;
/// todo.expect_todo_count(1).await?;
/// ```
#[derive(Clone)]
pub struct TodoPage {
    driver: Arc<dyn Driver>,
    base_url: String,
    timeout: Duration,
    poll_interval: Duration,
    input_field: Locator,
    todo_list: Locator,
    todo_items: Locator,
    todo_titles: Locator,
    items_counter: Locator,
    all_filter: Locator,
    active_filter: Locator,
    completed_filter: Locator,
    clear_completed_button: Locator,
}

impl TodoPage {
    /// Builds the page object and its locators. Does not touch the page.
    pub fn new(driver: Arc<dyn Driver>, base_url: impl Into<String>) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            timeout: DEFAULT_ASSERTION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            input_field: Locator::get_by_placeholder("What needs to be done?"),
            todo_list: Locator::css(".todo-list"),
            todo_items: Locator::css(".todo-list li"),
            todo_titles: Locator::get_by_test_id("todo-title"),
            items_counter: Locator::css(".todo-count"),
            all_filter: Locator::get_by_role(AriaRole::Link, Filter::All.label()),
            active_filter: Locator::get_by_role(AriaRole::Link, Filter::Active.label()),
            completed_filter: Locator::get_by_role(AriaRole::Link, Filter::Completed.label()),
            clear_completed_button: Locator::get_by_role(AriaRole::Button, "Clear completed"),
        }
    }

    /// Returns a copy whose assertions wait up to `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a copy whose assertions re-check every `interval`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The driver session this page acts through.
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// URL the application is loaded from.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Locator for the list container.
    pub fn todo_list(&self) -> &Locator {
        &self.todo_list
    }

    /// Locator for every rendered todo item.
    pub fn todo_items(&self) -> &Locator {
        &self.todo_items
    }

    fn expect(&self, locator: &Locator) -> Expectation<'_> {
        expect(self.driver.as_ref(), locator)
            .with_timeout(self.timeout)
            .with_poll_interval(self.poll_interval)
    }

    fn filter_link(&self, filter: Filter) -> &Locator {
        match filter {
            Filter::All => &self.all_filter,
            Filter::Active => &self.active_filter,
            Filter::Completed => &self.completed_filter,
        }
    }

    /// Loads the application at the base URL.
    pub async fn navigate_to_app(&self) -> Result<()> {
        tracing::debug!(url = %self.base_url, "navigate to app");
        self.driver.goto(&self.base_url).await
    }

    /// Types `text` into the new-todo field and commits it with Enter.
    ///
    /// Blank text is rejected: the application would ignore it.
    pub async fn add_todo(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "todo text must not be blank".to_string(),
            ));
        }
        tracing::debug!(text, "add todo");
        self.driver.fill(&self.input_field, text).await?;
        self.driver.press(&self.input_field, "Enter").await
    }

    /// Marks the todo whose text contains `text` as completed.
    ///
    /// Exactly one item must match.
    pub async fn toggle_todo(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "toggle todo");
        let checkbox = self
            .todo_items
            .filter_has_text(text)
            .locator("input.toggle");
        self.driver.check(&checkbox).await
    }

    /// Activates the navigation link for `filter`.
    pub async fn set_filter(&self, filter: Filter) -> Result<()> {
        tracing::debug!(%filter, "set filter");
        self.driver.click(self.filter_link(filter)).await
    }

    /// Activates "Clear completed".
    ///
    /// The button may render late after a toggle, so it is awaited for up to
    /// the assertion timeout. If it never appears nothing is completed and the
    /// call does nothing.
    pub async fn clear_completed(&self) -> Result<()> {
        let driver = self.driver.as_ref();
        let button = &self.clear_completed_button;
        let outcome = poll_until(
            self.timeout,
            self.poll_interval,
            || driver.count(button),
            |count| *count > 0,
        )
        .await?;

        if let Polled::TimedOut(_) = outcome {
            tracing::debug!(timeout = ?self.timeout, "clear completed: button never rendered");
            return Ok(());
        }
        tracing::debug!("clear completed");
        self.driver.click(button).await
    }

    /// Asserts that a todo title containing `text` is visible.
    pub async fn expect_todo_visible(&self, text: &str) -> Result<()> {
        let title = self.todo_titles.filter_has_text(text);
        self.expect(&title).to_be_visible().await
    }

    /// Asserts that exactly `n` todo items are rendered.
    pub async fn expect_todo_count(&self, n: usize) -> Result<()> {
        self.expect(&self.todo_items).to_have_count(n).await
    }

    /// Asserts that the rendered titles are exactly `titles`, in order.
    pub async fn expect_todo_titles(&self, titles: &[&str]) -> Result<()> {
        self.expect(&self.todo_titles).to_have_texts(titles).await
    }

    /// Asserts that the counter reads "`n` items left" ("1 item left" for one).
    ///
    /// For zero the assertion also holds when the counter is not rendered,
    /// which is how the application shows an empty list.
    pub async fn expect_items_left(&self, n: usize) -> Result<()> {
        let expected = items_left_label(n);
        if n > 0 {
            return self
                .expect(&self.items_counter)
                .to_contain_text(&expected)
                .await;
        }

        let driver = self.driver.as_ref();
        let counter = &self.items_counter;
        let outcome = poll_until(
            self.timeout,
            self.poll_interval,
            || driver.inner_text(counter),
            |text| match text {
                None => true,
                Some(text) => crate::locator::normalize_whitespace(text).contains(&expected),
            },
        )
        .await?;

        match outcome {
            Polled::Matched(_) => Ok(()),
            Polled::TimedOut(observed) => Err(Error::AssertionTimeout {
                selector: counter.selector(),
                expected: format!("to contain text '{}' or be absent", expected),
                observed: format!("had '{}'", observed.unwrap_or_default()),
                timeout: self.timeout,
            }),
        }
    }
}

impl fmt::Debug for TodoPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoPage")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
