// Runner - Executes scenarios in isolated sessions
//
// - One session per scenario, opened from the factory and closed afterwards
// - At most `jobs` scenarios in flight (semaphore permits)
// - Each scenario bounded by `scenario_timeout`, session setup included
// - On failure the page snapshot is written under `artifacts_dir/<scenario>/`
//
// Dropping the future returned by `run_scenarios` aborts every scenario
// still running.

use crate::config::SuiteConfig;
use crate::driver::{Driver, SessionFactory};
use crate::error::Result;
use crate::scenarios::Scenario;
use crate::todo_page::TodoPage;
use futures_util::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    TimedOut,
}

/// Result of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PathBuf>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

/// Results of a whole run, in the order the scenarios were given.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub backend: String,
    pub base_url: String,
    pub duration_ms: u64,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs `scenarios` against sessions from `factory`.
///
/// Individual scenario failures are reported in the returned [`SuiteReport`];
/// only an invalid configuration is an error.
pub async fn run_scenarios(
    factory: Arc<dyn SessionFactory>,
    scenarios: Vec<Scenario>,
    config: &SuiteConfig,
) -> Result<SuiteReport> {
    config.validate()?;
    let started = Instant::now();
    let config = Arc::new(config.clone());
    let permits = Arc::new(Semaphore::new(config.jobs));

    tracing::info!(
        backend = factory.backend(),
        scenarios = scenarios.len(),
        jobs = config.jobs,
        "starting suite"
    );

    let mut tasks = JoinSet::new();
    for (index, scenario) in scenarios.iter().copied().enumerate() {
        let factory = Arc::clone(&factory);
        let config = Arc::clone(&config);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            // The semaphore is never closed while tasks hold a clone
            let _permit = permits.acquire_owned().await.ok();
            (index, run_one(factory.as_ref(), scenario, &config).await)
        });
    }

    let mut outcomes: Vec<Option<ScenarioOutcome>> = vec![None; scenarios.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => tracing::warn!(error = %e, "scenario task did not complete"),
        }
    }

    let outcomes = outcomes
        .into_iter()
        .zip(&scenarios)
        .map(|(outcome, scenario)| {
            outcome.unwrap_or_else(|| ScenarioOutcome {
                name: scenario.name.to_string(),
                status: ScenarioStatus::Failed,
                duration_ms: 0,
                error: Some("scenario task did not complete".to_string()),
                artifacts: Vec::new(),
            })
        })
        .collect();

    let report = SuiteReport {
        backend: factory.backend().to_string(),
        base_url: config.base_url.clone(),
        duration_ms: millis(started.elapsed()),
        outcomes,
    };
    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        duration_ms = report.duration_ms,
        "suite finished"
    );
    Ok(report)
}

async fn run_one(
    factory: &dyn SessionFactory,
    scenario: Scenario,
    config: &SuiteConfig,
) -> ScenarioOutcome {
    let started = Instant::now();
    let deadline = config.scenario_timeout();
    tracing::info!(scenario = scenario.name, "scenario started");

    let finish = |status: ScenarioStatus, error: Option<String>, artifacts: Vec<PathBuf>| {
        let outcome = ScenarioOutcome {
            name: scenario.name.to_string(),
            status,
            duration_ms: millis(started.elapsed()),
            error,
            artifacts,
        };
        match &outcome.error {
            None => tracing::info!(
                scenario = scenario.name,
                duration_ms = outcome.duration_ms,
                "scenario passed"
            ),
            Some(error) => tracing::warn!(
                scenario = scenario.name,
                status = ?outcome.status,
                duration_ms = outcome.duration_ms,
                %error,
                "scenario failed"
            ),
        }
        outcome
    };

    let driver = match tokio::time::timeout(deadline, factory.open_session()).await {
        Ok(Ok(driver)) => driver,
        Ok(Err(e)) => {
            let error = e.context("opening session").to_string();
            return finish(ScenarioStatus::Failed, Some(error), Vec::new());
        }
        Err(_) => {
            let error = format!("opening a session exceeded {:?}", deadline);
            return finish(ScenarioStatus::TimedOut, Some(error), Vec::new());
        }
    };

    let page = TodoPage::new(Arc::clone(&driver), config.base_url.clone())
        .with_timeout(config.assertion_timeout())
        .with_poll_interval(config.poll_interval());
    let remaining = deadline.saturating_sub(started.elapsed());
    let body = AssertUnwindSafe(scenario.run(&page)).catch_unwind();

    let (status, error) = match tokio::time::timeout(remaining, body).await {
        Ok(Ok(Ok(()))) => (ScenarioStatus::Passed, None),
        Ok(Ok(Err(e))) => (ScenarioStatus::Failed, Some(e.to_string())),
        Ok(Err(panic)) => (
            ScenarioStatus::Failed,
            Some(format!("scenario panicked: {}", panic_message(panic.as_ref()))),
        ),
        Err(_) => (
            ScenarioStatus::TimedOut,
            Some(format!("scenario exceeded {:?}", deadline)),
        ),
    };

    let artifacts = if status == ScenarioStatus::Passed {
        Vec::new()
    } else {
        capture_artifacts(driver.as_ref(), &config.artifacts_dir, scenario.name).await
    };

    if let Err(e) = driver.close().await {
        tracing::warn!(scenario = scenario.name, error = %e, "failed to close session");
    }
    finish(status, error, artifacts)
}

/// Writes the current page snapshot under `dir/<scenario>/`.
///
/// Problems are logged; whatever was written is returned.
pub async fn capture_artifacts(driver: &dyn Driver, dir: &Path, scenario: &str) -> Vec<PathBuf> {
    let snapshot = match tokio::time::timeout(SNAPSHOT_TIMEOUT, driver.snapshot()).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            tracing::warn!(scenario, error = %e, "could not capture page snapshot");
            return Vec::new();
        }
        Err(_) => {
            tracing::warn!(scenario, "page snapshot timed out");
            return Vec::new();
        }
    };

    let dir = dir.join(scenario);
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        tracing::warn!(dir = %dir.display(), error = %e, "could not create artifacts directory");
        return Vec::new();
    }

    let mut files = vec![(dir.join("page.html"), snapshot.html.into_bytes())];
    if let Some(png) = snapshot.screenshot {
        files.push((dir.join("screenshot.png"), png));
    }

    let mut written = Vec::new();
    for (path, bytes) in files {
        match tokio::fs::write(&path, bytes).await {
            Ok(()) => written.push(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not write artifact")
            }
        }
    }
    tracing::debug!(scenario, url = %snapshot.url, files = written.len(), "artifacts written");
    written
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
