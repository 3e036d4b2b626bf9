//! todomvc-e2e: Page object and end-to-end scenarios for the TodoMVC demo
//!
//! This crate drives the TodoMVC application through a [`TodoPage`] page
//! object. Locators are immutable descriptors resolved against the live page
//! on every use, assertions are bounded polls, and the same scenarios run on
//! two backends:
//!
//! - [`sim`]: an in-process model of the application, no browser needed
//! - `playwright` (feature `playwright`): a real browser via playwright-rs
//!
//! # Examples
//!
//! ## Driving the page object
//!
//! ```ignore
//! use std::sync::Arc;
//! use todomvc_e2e::sim::{SimDriver, SimOptions};
//! use todomvc_e2e::{Filter, TodoPage};
//!
//! #[tokio::main]
//! async fn main() -> todomvc_e2e::Result<()> {
//!     let driver = Arc::new(SimDriver::new(SimOptions::default()));
//!     let todo = TodoPage::new(driver, "https://demo.playwright.dev/todomvc/");
//!
//!     todo.navigate_to_app().await?;
//!     todo.add_todo("Buy milk").await?;
//!     todo.add_todo("Walk the dog").await?;
//!     todo.toggle_todo("Buy milk").await?;
//!     todo.expect_items_left(1).await?;
//!
//!     todo.set_filter(Filter::Completed).await?;
//!     todo.expect_todo_count(1).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Running the catalogue
//!
//! ```ignore
//! use std::sync::Arc;
//! use todomvc_e2e::sim::{SimOptions, SimSessionFactory};
//! use todomvc_e2e::{SuiteConfig, run_scenarios, scenarios};
//!
//! #[tokio::main]
//! async fn main() -> todomvc_e2e::Result<()> {
//!     let config = SuiteConfig::default();
//!     let factory = Arc::new(SimSessionFactory::new(SimOptions::from(&config)));
//!     let report = run_scenarios(factory, scenarios::catalogue(), &config).await?;
//!     assert!(report.success());
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod config;
pub mod driver;
pub mod error;
pub mod locator;
#[cfg(feature = "playwright")]
pub mod playwright;
pub mod runner;
pub mod scenarios;
pub mod sim;
pub mod todo_page;
pub mod wait;

// Re-export error types
pub use error::{Error, Result};

// Re-export assertions API
pub use assertions::{Expectation, expect};

// Re-export the driver seam
pub use driver::{Driver, PageSnapshot, SessionFactory};

// Re-export locator descriptors
pub use locator::{AriaRole, Locator, Step, TextMatch};

// Re-export the page object
pub use todo_page::{Filter, TodoPage, items_left_label};

// Re-export configuration
pub use config::{BrowserKind, DEFAULT_BASE_URL, SuiteConfig};

// Re-export runner API
pub use runner::{ScenarioOutcome, ScenarioStatus, SuiteReport, run_scenarios};
pub use scenarios::Scenario;

#[cfg(feature = "playwright")]
pub use playwright::{PlaywrightDriver, PlaywrightSessionFactory};
