//! Scenario catalogue.
//!
//! Each scenario is a user journey written against [`TodoPage`] only, so the
//! same catalogue runs on every backend. Scenarios start from a fresh session
//! and load the application themselves.

use crate::error::{Error, Result};
use crate::todo_page::{Filter, TodoPage};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::fmt;

/// Signature of a scenario body.
pub type ScenarioFn = for<'a> fn(&'a TodoPage) -> BoxFuture<'a, Result<()>>;

/// A named, runnable user journey.
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub body: ScenarioFn,
}

impl Scenario {
    pub async fn run(&self, page: &TodoPage) -> Result<()> {
        (self.body)(page).await
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Every scenario, in catalogue order.
pub fn catalogue() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "add-todo",
            description: "user can add a todo item",
            body: |page| add_todo(page).boxed(),
        },
        Scenario {
            name: "manage-todos-with-filters",
            description: "user can add and manage todos with filters and counter",
            body: |page| manage_todos_with_filters(page).boxed(),
        },
        Scenario {
            name: "filter-round-trip",
            description: "Completed and Active partition the list, All restores it",
            body: |page| filter_round_trip(page).boxed(),
        },
        Scenario {
            name: "items-left-counter",
            description: "counter pluralises and reaches zero when everything is done",
            body: |page| items_left_counter(page).boxed(),
        },
        Scenario {
            name: "clear-completed",
            description: "clearing removes only completed items",
            body: |page| clear_completed(page).boxed(),
        },
        Scenario {
            name: "add-increments-count",
            description: "each added todo increments the count by one",
            body: |page| add_increments_count(page).boxed(),
        },
    ]
}

/// Scenarios whose name contains any of `filters`; all of them when empty.
///
/// Fails if a filter matches nothing, so typos are not silently skipped.
pub fn select(filters: &[String]) -> Result<Vec<Scenario>> {
    let all = catalogue();
    if filters.is_empty() {
        return Ok(all);
    }
    if let Some(unknown) = filters
        .iter()
        .find(|f| !all.iter().any(|s| s.name.contains(f.as_str())))
    {
        return Err(Error::InvalidArgument(format!(
            "no scenario matches '{}'",
            unknown
        )));
    }
    Ok(all
        .into_iter()
        .filter(|s| filters.iter().any(|f| s.name.contains(f.as_str())))
        .collect())
}

async fn add_todo(page: &TodoPage) -> Result<()> {
    page.navigate_to_app().await?;
    page.add_todo("Buy milk").await?;
    page.expect_todo_visible("Buy milk").await?;
    // Locators are re-evaluated on every use
    page.expect_todo_visible("Buy milk").await?;
    page.expect_todo_count(1).await
}

async fn manage_todos_with_filters(page: &TodoPage) -> Result<()> {
    page.navigate_to_app().await?;
    page.add_todo("Buy milk").await?;
    page.add_todo("Walk the dog").await?;
    page.add_todo("Learn Playwright").await?;
    page.expect_todo_count(3).await?;

    page.toggle_todo("Buy milk").await?;
    page.expect_items_left(2).await?;

    page.set_filter(Filter::Completed).await?;
    page.expect_todo_count(1).await?;

    page.set_filter(Filter::Active).await?;
    page.expect_todo_count(2).await?;

    page.set_filter(Filter::All).await?;
    page.expect_todo_count(3).await?;

    page.clear_completed().await?;
    page.set_filter(Filter::All).await?;
    page.expect_todo_count(2).await?;
    page.expect_items_left(2).await
}

async fn filter_round_trip(page: &TodoPage) -> Result<()> {
    let titles = ["Buy milk", "Walk the dog", "Learn Playwright", "Water plants"];
    let toggled = ["Walk the dog", "Water plants"];
    let untoggled: Vec<&str> = titles
        .iter()
        .copied()
        .filter(|t| !toggled.contains(t))
        .collect();

    page.navigate_to_app().await?;
    for title in titles {
        page.add_todo(title).await?;
    }
    for title in toggled {
        page.toggle_todo(title).await?;
    }

    page.set_filter(Filter::Completed).await?;
    page.expect_todo_titles(&toggled).await?;

    page.set_filter(Filter::Active).await?;
    page.expect_todo_titles(&untoggled).await?;

    page.set_filter(Filter::Completed).await?;
    page.set_filter(Filter::Active).await?;
    page.set_filter(Filter::All).await?;
    page.expect_todo_titles(&titles).await
}

async fn items_left_counter(page: &TodoPage) -> Result<()> {
    page.navigate_to_app().await?;
    page.expect_items_left(0).await?;

    page.add_todo("Buy milk").await?;
    page.expect_items_left(1).await?;

    page.add_todo("Walk the dog").await?;
    page.expect_items_left(2).await?;

    page.toggle_todo("Buy milk").await?;
    page.expect_items_left(1).await?;

    page.toggle_todo("Walk the dog").await?;
    page.expect_items_left(0).await
}

async fn clear_completed(page: &TodoPage) -> Result<()> {
    page.navigate_to_app().await?;
    page.add_todo("Buy milk").await?;
    page.add_todo("Walk the dog").await?;
    page.add_todo("Learn Playwright").await?;
    page.toggle_todo("Learn Playwright").await?;
    page.expect_items_left(2).await?;

    page.clear_completed().await?;
    page.expect_todo_titles(&["Buy milk", "Walk the dog"]).await?;
    page.expect_items_left(2).await?;

    // Nothing left to clear
    page.clear_completed().await?;
    page.expect_todo_count(2).await
}

async fn add_increments_count(page: &TodoPage) -> Result<()> {
    page.navigate_to_app().await?;
    let titles = ["Buy milk", "Walk the dog", "Learn Playwright"];
    for (added, title) in titles.iter().enumerate() {
        page.expect_todo_count(added).await?;
        page.add_todo(title).await?;
        page.expect_todo_count(added + 1).await?;
        page.expect_todo_visible(title).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimDriver, SimOptions};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn page() -> TodoPage {
        let driver = Arc::new(SimDriver::new(SimOptions {
            action_timeout: Duration::from_millis(500),
            ..SimOptions::default()
        }));
        TodoPage::new(driver, "https://demo.playwright.dev/todomvc/")
            .with_timeout(Duration::from_millis(500))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_catalogue_names_are_unique() {
        let names: HashSet<_> = catalogue().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), catalogue().len());
        assert_eq!(catalogue()[0].name, "add-todo");
    }

    #[test]
    fn test_select() {
        assert_eq!(select(&[]).unwrap().len(), catalogue().len());

        let picked = select(&["filter".to_string()]).unwrap();
        let names: Vec<_> = picked.iter().map(|s| s.name).collect();
        assert_eq!(names, ["manage-todos-with-filters", "filter-round-trip"]);

        let err = select(&["nope".to_string()]).expect_err("unknown");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_every_scenario_passes_on_fresh_sim_session() {
        for scenario in catalogue() {
            let page = page();
            scenario
                .run(&page)
                .await
                .unwrap_or_else(|e| panic!("{} failed: {}", scenario.name, e));
        }
    }
}
