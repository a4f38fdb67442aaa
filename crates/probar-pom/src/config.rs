//! Engine tuning.
//!
//! Browser and session settings belong to whatever harness creates the
//! driver; this only covers timings and artifact locations used by the action
//! engine itself.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::result::{ActionError, ActionResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Fixed wait ceiling used by `input`, independent of caller timeouts
pub const INPUT_WAIT_CEILING_MS: u64 = 30_000;

/// Implicit wait used while `exists` probes for matches
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 500;

/// Hold duration of a long press
pub const DEFAULT_LONG_PRESS_MS: u64 = 2_000;

/// Action engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Implicit wait while probing in `exists`
    pub probe_interval_ms: u64,
    /// Explicit-wait polling interval
    pub poll_interval_ms: u64,
    /// Wait ceiling inside `input`
    pub input_wait_ceiling_ms: u64,
    /// Long-press hold duration
    pub long_press_ms: u64,
    /// Timeout used by the convenience wrappers
    pub default_timeout_ms: u64,
    /// Root of report and screenshot artifacts
    pub results_dir: PathBuf,
    /// Screenshot folder, relative to `results_dir`
    pub screenshot_dir: PathBuf,
    /// Directory holding `<component>.properties` files
    pub locator_dir: PathBuf,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            input_wait_ceiling_ms: INPUT_WAIT_CEILING_MS,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            default_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            results_dir: PathBuf::from("results"),
            screenshot_dir: PathBuf::from("screenshots"),
            locator_dir: PathBuf::from("locators"),
        }
    }
}

impl ExecutorConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from YAML; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> ActionResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ActionError::Config {
            message: e.to_string(),
        })
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: &Path) -> ActionResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| ActionError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ActionResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| ActionError::Config {
            message: e.to_string(),
        })
    }

    /// Set probe interval
    #[must_use]
    pub const fn with_probe_interval(mut self, ms: u64) -> Self {
        self.probe_interval_ms = ms;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set input wait ceiling
    #[must_use]
    pub const fn with_input_wait_ceiling(mut self, ms: u64) -> Self {
        self.input_wait_ceiling_ms = ms;
        self
    }

    /// Set long-press duration
    #[must_use]
    pub const fn with_long_press(mut self, ms: u64) -> Self {
        self.long_press_ms = ms;
        self
    }

    /// Set default timeout
    #[must_use]
    pub const fn with_default_timeout(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Set results directory
    #[must_use]
    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    /// Set screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Set locator directory
    #[must_use]
    pub fn with_locator_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.locator_dir = dir.into();
        self
    }

    /// Probe interval as Duration
    #[must_use]
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Long press as Duration
    #[must_use]
    pub const fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    /// Default timeout as Duration
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Explicit-wait options for `timeout`
    #[must_use]
    pub fn wait_options(&self, timeout: Duration) -> WaitOptions {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        WaitOptions::new()
            .with_timeout(timeout_ms)
            .with_poll_interval(self.poll_interval_ms)
    }

    /// Explicit-wait options for `input`
    #[must_use]
    pub fn input_wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.input_wait_ceiling_ms)
            .with_poll_interval(self.poll_interval_ms)
    }
}
