// Assertions - Auto-retry assertions for testing
//
// Provides an expect() API with auto-retry logic matching Playwright's assertions,
// evaluated through any Driver backend.
//
// See: https://playwright.dev/docs/test-assertions

use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::locator::{Locator, normalize_whitespace};
use crate::wait::{DEFAULT_ASSERTION_TIMEOUT, DEFAULT_POLL_INTERVAL, Polled, poll_until};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

/// Creates an expectation for a locator with auto-retry behavior.
///
/// Assertions will retry until they pass or timeout (default: 5 seconds).
///
/// # Example
///
/// ```ignore
/// use todomvc_e2e::{expect, Locator};
/// use std::time::Duration;
///
/// let items = Locator::css(".todo-list li");
/// expect(driver.as_ref(), &items).to_have_count(3).await?;
/// expect(driver.as_ref(), &items)
///     .with_timeout(Duration::from_secs(10))
///     .not()
///     .to_have_count(0)
///     .await?;
/// ```
///
/// See: <https://playwright.dev/docs/test-assertions>
pub fn expect<'a>(driver: &'a dyn Driver, locator: &Locator) -> Expectation<'a> {
    Expectation::new(driver, locator.clone())
}

/// Expectation wraps a locator and provides assertion methods with auto-retry.
pub struct Expectation<'a> {
    driver: &'a dyn Driver,
    locator: Locator,
    timeout: Duration,
    poll_interval: Duration,
    negate: bool,
}

// Allow clippy::wrong_self_convention for to_* methods that consume self
// This matches Playwright's expect API pattern where assertions are chained and consumed
#[allow(clippy::wrong_self_convention)]
impl<'a> Expectation<'a> {
    pub(crate) fn new(driver: &'a dyn Driver, locator: Locator) -> Self {
        Self {
            driver,
            locator,
            timeout: DEFAULT_ASSERTION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            negate: false,
        }
    }

    /// Sets a custom timeout for this assertion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a custom poll interval for this assertion.
    ///
    /// Default is 100ms.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Negates the assertion.
    ///
    /// Note: We intentionally use `.not()` method instead of implementing `std::ops::Not`
    /// to match Playwright's API across all language bindings.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Asserts that the element is visible.
    ///
    /// See: <https://playwright.dev/docs/test-assertions#locator-assertions-to-be-visible>
    pub async fn to_be_visible(self) -> Result<()> {
        let driver = self.driver;
        let locator = &self.locator;
        self.poll(
            "to be visible",
            || driver.is_visible(locator),
            |visible| *visible,
            |visible| {
                if *visible {
                    "it was visible".to_string()
                } else {
                    "it was not visible".to_string()
                }
            },
        )
        .await
    }

    /// Asserts that the element is hidden (not visible, or absent).
    ///
    /// See: <https://playwright.dev/docs/test-assertions#locator-assertions-to-be-hidden>
    pub async fn to_be_hidden(self) -> Result<()> {
        self.not().to_be_visible().await
    }

    /// Asserts that the locator resolves to exactly `expected` elements.
    ///
    /// See: <https://playwright.dev/docs/test-assertions#locator-assertions-to-have-count>
    pub async fn to_have_count(self, expected: usize) -> Result<()> {
        let driver = self.driver;
        let locator = &self.locator;
        self.poll(
            &format!("to have count {}", expected),
            || driver.count(locator),
            |count| *count == expected,
            |count| format!("had count {}", count),
        )
        .await
    }

    /// Asserts that the element contains the specified text (substring match).
    ///
    /// Whitespace is normalised on both sides before comparison; the match is
    /// case-sensitive.
    ///
    /// See: <https://playwright.dev/docs/test-assertions#locator-assertions-to-contain-text>
    pub async fn to_contain_text(self, expected: &str) -> Result<()> {
        let driver = self.driver;
        let locator = &self.locator;
        let needle = normalize_whitespace(expected);
        self.poll(
            &format!("to contain text '{}'", needle),
            || driver.inner_text(locator),
            |actual| {
                actual
                    .as_deref()
                    .is_some_and(|text| normalize_whitespace(text).contains(&needle))
            },
            describe_text,
        )
        .await
    }

    /// Asserts that the element has the specified text content (exact match).
    ///
    /// See: <https://playwright.dev/docs/test-assertions#locator-assertions-to-have-text>
    pub async fn to_have_text(self, expected: &str) -> Result<()> {
        let driver = self.driver;
        let locator = &self.locator;
        let expected = normalize_whitespace(expected);
        self.poll(
            &format!("to have text '{}'", expected),
            || driver.inner_text(locator),
            |actual| {
                actual
                    .as_deref()
                    .is_some_and(|text| normalize_whitespace(text) == expected)
            },
            describe_text,
        )
        .await
    }

    /// Asserts that the matched elements' texts equal `expected`, in order.
    ///
    /// See: <https://playwright.dev/docs/test-assertions#locator-assertions-to-have-text>
    pub async fn to_have_texts(self, expected: &[&str]) -> Result<()> {
        let driver = self.driver;
        let locator = &self.locator;
        let expected: Vec<String> = expected.iter().map(|t| normalize_whitespace(t)).collect();
        self.poll(
            &format!("to have texts {:?}", expected),
            || driver.all_inner_texts(locator),
            |actual| {
                actual.len() == expected.len()
                    && actual
                        .iter()
                        .zip(&expected)
                        .all(|(a, e)| normalize_whitespace(a) == *e)
            },
            |actual| {
                let actual: Vec<String> = actual.iter().map(|t| normalize_whitespace(t)).collect();
                format!("had {:?}", actual)
            },
        )
        .await
    }

    // Shared retry loop: negation flips the acceptance, the failure message
    // reports the last observation.
    async fn poll<T, F, Fut, A, D>(
        &self,
        expected: &str,
        probe: F,
        accept: A,
        describe: D,
    ) -> Result<()>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        A: Fn(&T) -> bool,
        D: Fn(&T) -> String,
    {
        let negate = self.negate;
        let outcome = poll_until(self.timeout, self.poll_interval, probe, |observed| {
            accept(observed) != negate
        })
        .await?;

        match outcome {
            Polled::Matched(_) => Ok(()),
            Polled::TimedOut(observed) => {
                let expected = if negate {
                    format!("NOT {}", expected)
                } else {
                    expected.to_string()
                };
                tracing::debug!(
                    selector = %self.locator,
                    %expected,
                    observed = ?observed,
                    "assertion timed out"
                );
                Err(Error::AssertionTimeout {
                    selector: self.locator.selector(),
                    expected,
                    observed: describe(&observed),
                    timeout: self.timeout,
                })
            }
        }
    }
}

fn describe_text(actual: &Option<String>) -> String {
    match actual {
        Some(text) => format!("had '{}'", normalize_whitespace(text)),
        None => "no element matched".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimDriver, SimOptions};

    async fn driver_with(titles: &[&str]) -> SimDriver {
        let driver = SimDriver::new(SimOptions::default());
        driver
            .goto("https://demo.playwright.dev/todomvc/")
            .await
            .expect("goto");
        let input = Locator::get_by_placeholder("What needs to be done?");
        for title in titles {
            driver.fill(&input, title).await.expect("fill");
            driver.press(&input, "Enter").await.expect("press");
        }
        driver
    }

    fn quick<'a>(driver: &'a SimDriver, locator: &Locator) -> Expectation<'a> {
        expect(driver, locator)
            .with_timeout(Duration::from_millis(100))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_count_and_negation() {
        let driver = driver_with(&["Buy milk", "Walk the dog"]).await;
        let items = Locator::css(".todo-list li");

        quick(&driver, &items).to_have_count(2).await.expect("count 2");
        quick(&driver, &items)
            .not()
            .to_have_count(3)
            .await
            .expect("not count 3");

        let err = quick(&driver, &items)
            .to_have_count(3)
            .await
            .expect_err("count 3 should time out");
        match err {
            Error::AssertionTimeout {
                expected, observed, ..
            } => {
                assert_eq!(expected, "to have count 3");
                assert_eq!(observed, "had count 2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_text_assertions() {
        let driver = driver_with(&["Buy milk", "Walk the dog"]).await;
        let counter = Locator::css(".todo-count");

        quick(&driver, &counter)
            .to_contain_text("2 items left")
            .await
            .expect("contains");
        quick(&driver, &counter)
            .to_have_text("2 items left")
            .await
            .expect("exact");
        quick(&driver, &Locator::get_by_test_id("todo-title"))
            .to_have_texts(&["Buy milk", "Walk the dog"])
            .await
            .expect("texts");

        let err = quick(&driver, &counter)
            .to_contain_text("3 items left")
            .await
            .expect_err("wrong count");
        assert!(err.to_string().contains("had '2 items left'"));
    }

    #[tokio::test]
    async fn test_visible_and_hidden() {
        let driver = driver_with(&["Buy milk"]).await;
        let title = Locator::get_by_test_id("todo-title");

        quick(&driver, &title.filter_has_text("Buy milk"))
            .to_be_visible()
            .await
            .expect("visible");
        quick(&driver, &title.filter_has_text("Learn Rust"))
            .to_be_hidden()
            .await
            .expect("absent is hidden");

        let err = quick(&driver, &title.filter_has_text("Buy milk"))
            .not()
            .to_be_visible()
            .await
            .expect_err("negated visible");
        match err {
            Error::AssertionTimeout { expected, .. } => assert_eq!(expected, "NOT to be visible"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_strict_violation_is_not_retried() {
        let driver = driver_with(&["Buy milk", "Buy bread"]).await;
        let ambiguous = Locator::get_by_test_id("todo-title").filter_has_text("Buy");

        let err = expect(&driver, &ambiguous)
            .with_timeout(Duration::from_secs(30))
            .to_be_visible()
            .await
            .expect_err("two matches");
        assert!(matches!(
            err,
            Error::StrictModeViolation { count: 2, .. }
        ));
    }
}
