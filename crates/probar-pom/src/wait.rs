//! Explicit waits.
//!
//! Polling loops that re-query the driver until a condition holds or the
//! timeout expires. The condition is always evaluated at least once, so a zero
//! timeout means "check now".

use std::time::{Duration, Instant};

use crate::driver::{Driver, ElementHandle};
use crate::locator::Locator;
use crate::result::{ActionError, ActionResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for explicit waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Value produced by a successful wait
#[derive(Debug, Clone)]
pub struct WaitOutcome<T> {
    /// Value the probe returned
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of probes made
    pub attempts: u32,
}

/// Poll `probe` until it yields `Some`, or fail with [`ActionError::Timeout`].
///
/// Probe errors end the wait immediately.
pub fn poll_until<T, F>(
    options: &WaitOptions,
    waited_for: &str,
    mut probe: F,
) -> ActionResult<WaitOutcome<T>>
where
    F: FnMut() -> ActionResult<Option<T>>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let mut attempts = 0;

    loop {
        attempts += 1;
        if let Some(value) = probe()? {
            return Ok(WaitOutcome {
                value,
                elapsed: start.elapsed(),
                attempts,
            });
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(ActionError::Timeout {
                ms: options.timeout_ms,
                waited_for: waited_for.to_string(),
            });
        }
        std::thread::sleep(options.poll_interval().min(timeout - elapsed));
    }
}

/// Wait until the first element matching `locator` is present and displayed.
///
/// An expired wait is reported as [`ActionError::ElementNotInteractable`].
pub fn until_interactable<D: Driver + ?Sized>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
) -> ActionResult<ElementHandle> {
    let waited_for = format!("'{locator}' to be interactable");
    let outcome = poll_until(options, &waited_for, || {
        let Some(first) = driver.find_elements(locator)?.into_iter().next() else {
            return Ok(None);
        };
        Ok(driver.is_displayed(&first)?.then_some(first))
    });

    match outcome {
        Ok(found) => {
            tracing::trace!(locator = %locator, attempts = found.attempts, "element interactable");
            Ok(found.value)
        }
        Err(ActionError::Timeout { ms, .. }) => Err(ActionError::not_interactable(
            locator.as_str(),
            format!("not interactable within {ms}ms"),
        )),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_builder() {
            let opts = WaitOptions::new().with_timeout(250).with_poll_interval(5);
            assert_eq!(opts.timeout(), Duration::from_millis(250));
            assert_eq!(opts.poll_interval(), Duration::from_millis(5));
        }
    }

    mod poll_until_tests {
        use super::*;

        #[test]
        fn test_immediate_success() {
            let opts = WaitOptions::new().with_timeout(0);
            let out = poll_until(&opts, "x", || Ok(Some(42))).unwrap();
            assert_eq!(out.value, 42);
            assert_eq!(out.attempts, 1);
        }

        #[test]
        fn test_eventual_success() {
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let mut n = 0;
            let out = poll_until(&opts, "x", || {
                n += 1;
                Ok((n >= 3).then_some(n))
            })
            .unwrap();
            assert_eq!(out.value, 3);
            assert_eq!(out.attempts, 3);
        }

        #[test]
        fn test_timeout() {
            let opts = WaitOptions::new().with_timeout(10).with_poll_interval(1);
            let err = poll_until(&opts, "never", || -> ActionResult<Option<()>> { Ok(None) })
                .unwrap_err();
            assert!(matches!(err, ActionError::Timeout { ms: 10, .. }));
        }

        #[test]
        fn test_probe_error_ends_wait() {
            let opts = WaitOptions::new().with_timeout(1_000);
            let err = poll_until(&opts, "x", || -> ActionResult<Option<()>> {
                Err(ActionError::driver("gone"))
            })
            .unwrap_err();
            assert!(matches!(err, ActionError::Driver { .. }));
        }
    }

    mod until_interactable_tests {
        use super::*;

        fn opts() -> WaitOptions {
            WaitOptions::new().with_timeout(30).with_poll_interval(1)
        }

        #[test]
        fn test_visible_element() {
            let mut driver = MockDriver::new().with_element(MockElement::new("a", "//a"));
            let el = until_interactable(&mut driver, &Locator::xpath("//a"), &opts()).unwrap();
            assert_eq!(el.id, "a");
        }

        #[test]
        fn test_late_element() {
            let mut driver =
                MockDriver::new().with_element(MockElement::new("a", "//a").appears_after(2));
            let opts = WaitOptions::new().with_timeout(1_000).with_poll_interval(1);
            let el = until_interactable(&mut driver, &Locator::xpath("//a"), &opts).unwrap();
            assert_eq!(el.id, "a");
        }

        #[test]
        fn test_hidden_element_times_out_as_not_interactable() {
            let mut driver = MockDriver::new().with_element(MockElement::new("a", "//a").hidden());
            let err = until_interactable(&mut driver, &Locator::xpath("//a"), &opts()).unwrap_err();
            assert!(matches!(err, ActionError::ElementNotInteractable { .. }));
            assert!(err.to_string().contains("within 30ms"));
        }

        #[test]
        fn test_missing_element() {
            let mut driver = MockDriver::new();
            let err = until_interactable(&mut driver, &Locator::xpath("//a"), &opts()).unwrap_err();
            assert!(err.is_absorbed());
        }
    }
}
