// Locator - Declarative element descriptor
//
// A Locator describes "the elements matching C on the page at the moment it is
// evaluated". It carries no page handle and never caches elements: backends
// resolve it again on every use, so it always reflects current page state.
//
// Architecture:
// - A Locator is a chain of steps
// - Query steps (CSS, role, placeholder, test id) search the subtree of the
//   previous step's matches (or the document for the first step)
// - Filter steps (has-text) narrow the previous step's matches in place
// - The chain renders to a Playwright selector string joined with " >> "
//
// See: https://playwright.dev/docs/other-locators#chaining-locators

use serde_json::Value;
use std::fmt;

/// Collapses runs of whitespace into one space and trims both ends.
///
/// Text comparisons follow Playwright's convention of matching on normalised
/// text, so `"  2 \n items left"` and `"2 items left"` compare equal.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ARIA roles the suite locates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriaRole {
    Button,
    Checkbox,
    Heading,
    Link,
    List,
    ListItem,
    Textbox,
}

impl AriaRole {
    /// Role name as used in Playwright's role selector engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Button => "button",
            AriaRole::Checkbox => "checkbox",
            AriaRole::Heading => "heading",
            AriaRole::Link => "link",
            AriaRole::List => "list",
            AriaRole::ListItem => "listitem",
            AriaRole::Textbox => "textbox",
        }
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a text criterion is compared against element text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    /// Case-insensitive substring of the whitespace-normalised text
    Contains(String),
    /// Whole normalised text, case-sensitive
    Exact(String),
}

impl TextMatch {
    /// Returns true if `actual` satisfies this criterion.
    pub fn matches(&self, actual: &str) -> bool {
        let actual = normalize_whitespace(actual);
        match self {
            TextMatch::Contains(needle) => actual
                .to_lowercase()
                .contains(&normalize_whitespace(needle).to_lowercase()),
            TextMatch::Exact(expected) => actual == normalize_whitespace(expected),
        }
    }

    /// The text being matched.
    pub fn text(&self) -> &str {
        match self {
            TextMatch::Contains(text) | TextMatch::Exact(text) => text,
        }
    }

    // Playwright encodes strings as JSON literals with an `i` (insensitive)
    // or `s` (sensitive) suffix.
    fn to_selector_literal(&self) -> String {
        let quoted = Value::String(self.text().to_string()).to_string();
        match self {
            TextMatch::Contains(_) => format!("{}i", quoted),
            TextMatch::Exact(_) => format!("{}s", quoted),
        }
    }
}

/// One link in a locator chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// CSS selector, evaluated against descendants
    Css(String),
    /// Implicit or explicit ARIA role, optionally with an accessible name
    Role {
        role: AriaRole,
        name: Option<TextMatch>,
    },
    /// `placeholder` attribute of inputs
    Placeholder(TextMatch),
    /// `data-testid` attribute (always exact)
    TestId(String),
    /// Keeps only the previous matches whose text content matches
    HasText(TextMatch),
}

impl Step {
    /// Returns true for steps that narrow the current set instead of descending.
    pub fn is_filter(&self) -> bool {
        matches!(self, Step::HasText(_))
    }

    /// Renders this step in Playwright selector syntax.
    pub fn to_selector(&self) -> String {
        match self {
            Step::Css(css) => css.clone(),
            Step::Role { role, name: None } => format!("internal:role={}", role),
            Step::Role {
                role,
                name: Some(name),
            } => format!("internal:role={}[name={}]", role, name.to_selector_literal()),
            Step::Placeholder(text) => {
                format!("internal:attr=[placeholder={}]", text.to_selector_literal())
            }
            Step::TestId(id) => format!(
                "internal:testid=[data-testid={}]",
                TextMatch::Exact(id.clone()).to_selector_literal()
            ),
            Step::HasText(text) => format!("internal:has-text={}", text.to_selector_literal()),
        }
    }
}

/// Locator represents a way to find element(s) on the page at any given moment.
///
/// Locators are inert values: creating or cloning one never touches the page.
/// Pass them to a [`Driver`](crate::driver::Driver) to act or to
/// [`expect`](crate::assertions::expect) to assert.
///
/// # Example
///
/// ```ignore
/// use todomvc_e2e::{AriaRole, Locator};
///
/// let items = Locator::css(".todo-list li");
/// let toggle = items.filter_has_text("Buy milk").locator("input.toggle");
/// assert_eq!(
///     toggle.selector(),
///     r#".todo-list li >> internal:has-text="Buy milk"i >> input.toggle"#
/// );
///
/// let all = Locator::get_by_role(AriaRole::Link, "All");
/// assert_eq!(all.selector(), r#"internal:role=link[name="All"i]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    fn from_step(step: Step) -> Self {
        Self { steps: vec![step] }
    }

    fn then(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Locates elements by CSS selector.
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_step(Step::Css(selector.into()))
    }

    /// Locates elements by role and accessible name (case-insensitive substring).
    ///
    /// See: <https://playwright.dev/docs/api/class-page#page-get-by-role>
    pub fn get_by_role(role: AriaRole, name: impl Into<String>) -> Self {
        Self::from_step(Step::Role {
            role,
            name: Some(TextMatch::Contains(name.into())),
        })
    }

    /// Locates elements by role and exact accessible name.
    pub fn get_by_role_exact(role: AriaRole, name: impl Into<String>) -> Self {
        Self::from_step(Step::Role {
            role,
            name: Some(TextMatch::Exact(name.into())),
        })
    }

    /// Locates input elements by placeholder text.
    ///
    /// See: <https://playwright.dev/docs/api/class-page#page-get-by-placeholder>
    pub fn get_by_placeholder(text: impl Into<String>) -> Self {
        Self::from_step(Step::Placeholder(TextMatch::Contains(text.into())))
    }

    /// Locates elements by their `data-testid` attribute.
    ///
    /// See: <https://playwright.dev/docs/api/class-page#page-get-by-test-id>
    pub fn get_by_test_id(id: impl Into<String>) -> Self {
        Self::from_step(Step::TestId(id.into()))
    }

    /// Creates a sub-locator within this locator's subtree.
    ///
    /// See: <https://playwright.dev/docs/api/class-locator#locator-locator>
    pub fn locator(&self, selector: impl Into<String>) -> Self {
        self.then(Step::Css(selector.into()))
    }

    /// Narrows this locator to elements containing `text` somewhere inside.
    ///
    /// See: <https://playwright.dev/docs/api/class-locator#locator-filter>
    pub fn filter_has_text(&self, text: impl Into<String>) -> Self {
        self.then(Step::HasText(TextMatch::Contains(text.into())))
    }

    /// Returns the chain of steps, first step first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the Playwright selector string for this locator.
    pub fn selector(&self) -> String {
        self.steps
            .iter()
            .map(Step::to_selector)
            .collect::<Vec<_>>()
            .join(" >> ")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_rendering() {
        assert_eq!(Locator::css(".todo-count").selector(), ".todo-count");
        assert_eq!(
            Locator::get_by_placeholder("What needs to be done?").selector(),
            r#"internal:attr=[placeholder="What needs to be done?"i]"#
        );
        assert_eq!(
            Locator::get_by_role(AriaRole::Button, "Clear completed").selector(),
            r#"internal:role=button[name="Clear completed"i]"#
        );
        assert_eq!(
            Locator::get_by_role_exact(AriaRole::Link, "All").selector(),
            r#"internal:role=link[name="All"s]"#
        );
        assert_eq!(
            Locator::get_by_test_id("todo-title")
                .filter_has_text("Buy milk")
                .selector(),
            r#"internal:testid=[data-testid="todo-title"s] >> internal:has-text="Buy milk"i"#
        );
    }

    #[test]
    fn test_selector_literals_are_json_escaped() {
        let locator = Locator::css("li").filter_has_text(r#"say "hi""#);
        assert_eq!(locator.selector(), r#"li >> internal:has-text="say \"hi\""i"#);
    }

    #[test]
    fn test_chaining_does_not_mutate_parent() {
        let items = Locator::css(".todo-list li");
        let filtered = items.filter_has_text("Walk the dog");
        let toggle = filtered.locator("input.toggle");

        assert_eq!(items.steps().len(), 1);
        assert_eq!(filtered.steps().len(), 2);
        assert_eq!(toggle.steps().len(), 3);
        assert!(filtered.steps()[1].is_filter());
        assert!(!toggle.steps()[2].is_filter());
    }

    #[test]
    fn test_text_match_normalises_whitespace() {
        let contains = TextMatch::Contains("items LEFT".to_string());
        assert!(contains.matches("  2\n   items left "));
        assert!(!contains.matches("2 item left"));

        let exact = TextMatch::Exact("2 items left".to_string());
        assert!(exact.matches("2   items\tleft"));
        assert!(!exact.matches("2 Items left"));
    }
}
