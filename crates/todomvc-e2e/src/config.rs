// Suite configuration
//
// Layered: defaults, then an optional TOML file, then TODOMVC_* environment
// variables. The runner applies its command-line flags on top.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Application the suite targets unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "https://demo.playwright.dev/todomvc/";

/// Browser engine for the Playwright backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    /// Lowercase engine name, as accepted by `--browser`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" => Ok(BrowserKind::Webkit),
            other => Err(Error::Config(format!(
                "unknown browser '{}' (expected chromium, firefox or webkit)",
                other
            ))),
        }
    }
}

/// Settings shared by every scenario in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Where the application is served
    pub base_url: String,

    pub browser: BrowserKind,

    pub headless: bool,

    /// How long assertions retry before failing (ms)
    pub assertion_timeout_ms: u64,

    /// Delay between assertion retries (ms)
    pub poll_interval_ms: u64,

    /// How long actions wait for their target (ms)
    pub action_timeout_ms: u64,

    /// Upper bound on one scenario, setup and teardown included (ms)
    pub scenario_timeout_ms: u64,

    /// Scenarios run at the same time
    pub jobs: usize,

    /// Failure snapshots are written here
    pub artifacts_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            browser: BrowserKind::default(),
            headless: true,
            assertion_timeout_ms: 5_000,
            poll_interval_ms: 100,
            action_timeout_ms: 30_000,
            scenario_timeout_ms: 60_000,
            jobs: 4,
            artifacts_dir: PathBuf::from("target/todomvc-artifacts"),
        }
    }
}

impl SuiteConfig {
    /// Reads a TOML file. Keys it omits keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| e.context(format!("loading {}", path.display())))
    }

    /// Parses TOML settings. Keys it omits keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Overrides fields from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overrides fields from `lookup`, which maps variable names to values.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TODOMVC_BASE_URL") {
            self.base_url = url;
        }
        if let Some(browser) = lookup("TODOMVC_BROWSER") {
            self.browser = browser.parse()?;
        }
        if let Some(headless) = lookup("TODOMVC_HEADLESS") {
            self.headless = parse_bool("TODOMVC_HEADLESS", &headless)?;
        }
        if let Some(ms) = lookup("TODOMVC_TIMEOUT_MS") {
            self.assertion_timeout_ms = parse_number("TODOMVC_TIMEOUT_MS", &ms)?;
        }
        if let Some(jobs) = lookup("TODOMVC_JOBS") {
            self.jobs = parse_number("TODOMVC_JOBS", &jobs)?;
        }
        Ok(())
    }

    /// Rejects an unparseable base URL, zero jobs and zero timeouts.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url '{}': {}", self.base_url, e)))?;
        if self.jobs == 0 {
            return Err(Error::Config("jobs must be at least 1".to_string()));
        }
        for (name, value) in [
            ("assertion_timeout_ms", self.assertion_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("action_timeout_ms", self.action_timeout_ms),
            ("scenario_timeout_ms", self.scenario_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }

    /// Resolves `path` against the base URL.
    ///
    /// Relative paths keep the base path, so "#/active" on
    /// "https://demo.playwright.dev/todomvc/" stays under `/todomvc/`.
    pub fn resolve_url(&self, path: &str) -> Result<String> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url '{}': {}", self.base_url, e)))?;
        let joined = base.join(path).map_err(|e| Error::NavigationFailed {
            url: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(joined.into())
    }

    /// `assertion_timeout_ms` as a `Duration`.
    pub fn assertion_timeout(&self) -> Duration {
        Duration::from_millis(self.assertion_timeout_ms)
    }

    /// `poll_interval_ms` as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `action_timeout_ms` as a `Duration`.
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// `scenario_timeout_ms` as a `Duration`.
    pub fn scenario_timeout(&self) -> Duration {
        Duration::from_millis(self.scenario_timeout_ms)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}
