//! Screenshot files under the results directory.
//!
//! Captures land in `<results_dir>/<screenshot_dir>/<timestamp>_<seq>.png`; the
//! path relative to `results_dir` is what the report carries, so the report and
//! its screenshots can be moved together.

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::driver::Driver;
use crate::result::{ActionError, ActionResult};

/// Allocates screenshot paths and asks the driver to write them
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    results_dir: PathBuf,
    screenshot_dir: PathBuf,
    sequence: u32,
}

impl ScreenshotStore {
    /// Store writing to `<results_dir>/<screenshot_dir>`
    #[must_use]
    pub fn new(results_dir: impl Into<PathBuf>, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            screenshot_dir: screenshot_dir.into(),
            sequence: 0,
        }
    }

    /// Results directory
    #[must_use]
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Next relative path; the sequence number keeps same-millisecond captures apart
    pub fn next_relative_path(&mut self) -> PathBuf {
        self.sequence += 1;
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        self.screenshot_dir
            .join(format!("{stamp}_{:04}.png", self.sequence))
    }

    /// Capture the page; returns the path relative to the results directory
    pub fn capture<D: Driver + ?Sized>(&mut self, driver: &mut D) -> ActionResult<PathBuf> {
        let relative = self.next_relative_path();
        let absolute = self.results_dir.join(&relative);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ActionError::ScreenshotCapture {
                message: format!("{}: {e}", parent.display()),
            })?;
        }
        driver
            .save_screenshot(&absolute)
            .map_err(|e| ActionError::ScreenshotCapture {
                message: e.to_string(),
            })?;
        Ok(relative)
    }

    /// Best-effort capture: failures are logged and yield `None`
    pub fn try_capture<D: Driver + ?Sized>(&mut self, driver: &mut D) -> Option<PathBuf> {
        match self.capture(driver) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(error = %err, "screenshot capture failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    #[test]
    fn test_paths_are_relative_and_unique() {
        let mut store = ScreenshotStore::new("results", "screenshots");
        let a = store.next_relative_path();
        let b = store.next_relative_path();
        assert!(a.starts_with("screenshots"));
        assert!(a.is_relative());
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "png");
    }

    #[test]
    fn test_capture_writes_under_results_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ScreenshotStore::new(dir.path(), "shots");
        let mut driver = MockDriver::new();

        let relative = store.capture(&mut driver).unwrap();
        assert!(relative.is_relative());
        assert!(dir.path().join(&relative).exists());
    }

    #[test]
    fn test_try_capture_swallows_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ScreenshotStore::new(dir.path(), "shots");
        let mut driver = MockDriver::new();
        driver.fail_screenshots(true);

        assert!(store.try_capture(&mut driver).is_none());
        assert!(matches!(
            store.capture(&mut driver),
            Err(ActionError::ScreenshotCapture { .. })
        ));
    }
}
