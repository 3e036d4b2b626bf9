// Integration tests for the TodoMVC page object on the simulated backend
//
// Tests cover:
// - The add / toggle / filter / clear journey
// - Per-add count increments and immediate visibility
// - Filter partitioning and the All round-trip
// - Counter wording at 0, 1 and many
// - Auto-waiting when the application renders late
// - Concurrent isolated sessions through the runner

use std::sync::Arc;
use std::time::Duration;
use todomvc_e2e::sim::{SimDriver, SimOptions, SimSessionFactory};
use todomvc_e2e::{
    Error, Filter, ScenarioStatus, SessionFactory, SuiteConfig, TodoPage, run_scenarios,
    scenarios,
};

const URL: &str = "https://demo.playwright.dev/todomvc/";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn open(options: SimOptions) -> TodoPage {
    init_tracing();
    let page = TodoPage::new(Arc::new(SimDriver::new(options)), URL)
        .with_timeout(Duration::from_secs(1))
        .with_poll_interval(Duration::from_millis(10));
    page.navigate_to_app().await.expect("Failed to navigate");
    page
}

fn quick() -> SimOptions {
    SimOptions {
        action_timeout: Duration::from_secs(1),
        ..SimOptions::default()
    }
}

#[tokio::test]
async fn test_add_todo_is_visible() -> anyhow::Result<()> {
    let todo = open(quick()).await;

    todo.add_todo("Buy milk").await?;
    todo.expect_todo_visible("Buy milk").await?;
    todo.expect_todo_visible("buy MILK").await?;
    todo.expect_todo_count(1).await?;
    Ok(())
}

#[tokio::test]
async fn test_manage_todos_with_filters_and_counter() -> anyhow::Result<()> {
    let todo = open(quick()).await;

    todo.add_todo("Buy milk").await?;
    todo.add_todo("Walk the dog").await?;
    todo.add_todo("Learn Playwright").await?;
    todo.expect_todo_count(3).await?;

    todo.toggle_todo("Buy milk").await?;
    todo.expect_items_left(2).await?;

    todo.set_filter(Filter::Completed).await?;
    todo.expect_todo_count(1).await?;

    todo.set_filter(Filter::Active).await?;
    todo.expect_todo_count(2).await?;

    todo.set_filter(Filter::All).await?;
    todo.expect_todo_count(3).await?;

    todo.clear_completed().await?;
    todo.set_filter(Filter::All).await?;
    todo.expect_todo_count(2).await?;
    todo.expect_items_left(2).await?;
    Ok(())
}

#[tokio::test]
async fn test_toggled_set_is_completed_view() -> anyhow::Result<()> {
    let todo = open(quick()).await;
    for title in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
        todo.add_todo(title).await?;
    }
    todo.toggle_todo("Bravo").await?;
    todo.toggle_todo("Delta").await?;

    todo.set_filter(Filter::Completed).await?;
    todo.expect_todo_titles(&["Bravo", "Delta"]).await?;

    todo.set_filter(Filter::Active).await?;
    todo.expect_todo_titles(&["Alpha", "Charlie", "Echo"]).await?;

    // Toggling is idempotent through check()
    todo.set_filter(Filter::All).await?;
    todo.toggle_todo("Bravo").await?;
    todo.expect_items_left(3).await?;
    todo.expect_todo_count(5).await?;
    Ok(())
}

#[tokio::test]
async fn test_items_left_boundaries() -> anyhow::Result<()> {
    let todo = open(quick()).await;
    todo.expect_items_left(0).await?;

    todo.add_todo("Buy milk").await?;
    todo.expect_items_left(1).await?;

    todo.toggle_todo("Buy milk").await?;
    todo.expect_items_left(0).await?;

    let err = todo
        .clone()
        .with_timeout(Duration::from_millis(100))
        .expect_items_left(1)
        .await
        .expect_err("nothing left");
    assert!(err.to_string().contains("1 item left"), "{err}");
    Ok(())
}

#[tokio::test]
async fn test_filter_route_survives_reload() -> anyhow::Result<()> {
    let todo = open(quick()).await;
    todo.add_todo("Buy milk").await?;
    todo.add_todo("Walk the dog").await?;
    todo.toggle_todo("Walk the dog").await?;

    todo.driver().goto(&format!("{}#/active", URL)).await?;
    todo.expect_todo_titles(&["Buy milk"]).await?;

    todo.navigate_to_app().await?;
    todo.expect_todo_count(2).await?;
    Ok(())
}

fn late_rendering() -> SimOptions {
    SimOptions {
        latency: Duration::from_millis(80),
        action_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn test_actions_wait_for_late_rendering() -> anyhow::Result<()> {
    let todo = open(late_rendering()).await;

    // Every step is issued before the previous one has rendered; actions and
    // assertions both have to wait for it.
    todo.add_todo("Buy milk").await?;
    todo.add_todo("Walk the dog").await?;
    todo.toggle_todo("Buy milk").await?;
    todo.set_filter(Filter::Completed).await?;
    todo.expect_todo_titles(&["Buy milk"]).await?;
    todo.set_filter(Filter::Active).await?;
    todo.expect_todo_titles(&["Walk the dog"]).await?;
    todo.set_filter(Filter::All).await?;
    todo.clear_completed().await?;
    todo.expect_todo_titles(&["Walk the dog"]).await?;
    todo.expect_items_left(1).await?;
    todo.expect_todo_visible("Walk the dog").await?;
    Ok(())
}

#[tokio::test]
async fn test_clear_right_after_toggle_is_not_dropped() -> anyhow::Result<()> {
    let todo = open(late_rendering()).await;
    todo.add_todo("Buy milk").await?;
    todo.add_todo("Walk the dog").await?;

    // The button only renders once the toggle lands
    todo.toggle_todo("Buy milk").await?;
    todo.clear_completed().await?;

    todo.expect_todo_count(1).await?;
    todo.expect_todo_titles(&["Walk the dog"]).await?;
    Ok(())
}

#[tokio::test]
async fn test_missing_todo_times_out_with_selector() {
    let todo = open(SimOptions {
        action_timeout: Duration::from_millis(100),
        ..SimOptions::default()
    })
    .await;

    let err = todo.toggle_todo("Learn Rust").await.expect_err("no such todo");
    assert!(matches!(err, Error::Timeout(_)));
    assert!(err.to_string().contains("Learn Rust"), "{err}");
}

#[tokio::test]
async fn test_runner_isolates_concurrent_sessions() {
    init_tracing();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = SuiteConfig {
        assertion_timeout_ms: 1_000,
        poll_interval_ms: 10,
        action_timeout_ms: 1_000,
        scenario_timeout_ms: 10_000,
        jobs: 6,
        artifacts_dir: dir.path().to_path_buf(),
        ..SuiteConfig::default()
    };
    let factory: Arc<dyn SessionFactory> = Arc::new(SimSessionFactory::new(SimOptions {
        latency: Duration::from_millis(5),
        ..SimOptions::from(&config)
    }));

    // The same scenario three times at once: shared state would break the counts
    let picked = scenarios::select(&["manage".to_string()]).expect("scenario exists");
    let repeated = [picked.clone(), picked.clone(), picked].concat();

    let report = run_scenarios(factory, repeated, &config)
        .await
        .expect("Failed to run suite");
    assert_eq!(report.outcomes.len(), 3);
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| o.status == ScenarioStatus::Passed),
        "{:?}",
        report.outcomes
    );
}
