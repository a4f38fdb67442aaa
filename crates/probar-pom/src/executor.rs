//! Action engine.
//!
//! [`ActionExecutor`] turns locator delegates into waited-for, type-dispatched
//! driver calls and mirrors every outcome into the test's report node.
//!
//! # Action flow
//!
//! ```text
//! caller ──► run stopped? ──yes──► skip value (no driver call, no entry)
//!                 │ no
//!                 ▼
//!           resolve delegate ──► wait until interactable ──► dispatch
//!                 │                        │                    │
//!                 └───────── error ────────┴────────────────────┤
//!                                  │                            ▼
//!                       FAIL entry + screenshot          PASS entry, counter
//!                                  │
//!              interaction error: run stops, skip value returned
//!              fixture error:     run stops, Err returned
//! ```

use std::time::Duration;

use crate::config::ExecutorConfig;
use crate::driver::{Driver, ElementHandle, GestureSequence, ImplicitWaitGuard};
use crate::locator::{Locator, LocatorDelegate, LocatorRegistry};
use crate::report::TestContext;
use crate::result::{ActionError, ActionResult};
use crate::run_state::Guarded;
use crate::screenshot::ScreenshotStore;
use crate::wait;
use crate::widget::{ClickGesture, ToggleState, WidgetType};

/// Mask a secret value for logs and report entries.
///
/// Yields one `*` fewer than the value has characters; empty stays empty.
#[must_use]
pub fn mask_secret(value: &str) -> String {
    "*".repeat(value.chars().count().saturating_sub(1))
}

/// Resolves, waits, dispatches and reports browser actions
#[derive(Debug)]
pub struct ActionExecutor<D: Driver> {
    driver: D,
    registry: LocatorRegistry,
    screenshots: ScreenshotStore,
    config: ExecutorConfig,
}

impl<D: Driver> ActionExecutor<D> {
    /// Executor reading locators from `config.locator_dir`
    #[must_use]
    pub fn new(driver: D, config: ExecutorConfig) -> Self {
        let registry = LocatorRegistry::from_dir(&config.locator_dir);
        let screenshots = ScreenshotStore::new(&config.results_dir, &config.screenshot_dir);
        Self {
            driver,
            registry,
            screenshots,
            config,
        }
    }

    /// Replace the locator registry
    #[must_use]
    pub fn with_registry(mut self, registry: LocatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Locator registry
    #[must_use]
    pub const fn registry(&self) -> &LocatorRegistry {
        &self.registry
    }

    /// Mutable locator registry
    pub fn registry_mut(&mut self) -> &mut LocatorRegistry {
        &mut self.registry
    }

    /// Configuration
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    // =========================================================================
    // EXISTS
    // =========================================================================

    /// Whether `delegate` matches an interactable element within `timeout`.
    ///
    /// Absence is a reported outcome: PASS, or FAIL with a screenshot when
    /// `report_failed` is set. Never errors and never stops the run on absence.
    /// A driver failure during the probe is not absence: it logs FAIL and
    /// stops the run.
    pub fn exists(
        &mut self,
        ctx: &mut TestContext,
        delegate: &str,
        report_failed: bool,
        timeout: Duration,
    ) -> bool {
        if ctx.run_state_mut().check_skip() {
            return false;
        }

        let resolved = match self.registry.resolve(delegate) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.fail_with_screenshot(ctx, format!("Existence check on '{delegate}' failed: {err}"));
                ctx.run_state_mut().stop(Some(err));
                return false;
            }
        };
        let locator = resolved.locator;

        let found = match self.probe(ctx, &locator, timeout) {
            Ok(found) => found,
            Err(err) => {
                self.fail_with_screenshot(ctx, format!("Existence check on '{locator}' failed: {err}"));
                ctx.run_state_mut().stop(Some(err));
                return false;
            }
        };

        if found {
            ctx.pass(format!("Element '{locator}' exists"));
        } else if report_failed {
            self.fail_with_screenshot(ctx, format!("Element '{locator}' does not exist"));
        } else {
            ctx.pass(format!("Element '{locator}' does not exist"));
        }
        found
    }

    fn probe(
        &mut self,
        ctx: &mut TestContext,
        locator: &Locator,
        timeout: Duration,
    ) -> ActionResult<bool> {
        let options = self.config.wait_options(timeout);
        let mut driver = ImplicitWaitGuard::acquire(&mut self.driver, self.config.probe_interval())?;
        if driver.find_elements(locator)?.is_empty() {
            return Ok(false);
        }
        ctx.counters_mut().waits += 1;
        match wait::until_interactable(&mut *driver, locator, &options) {
            Ok(_) => Ok(true),
            Err(ActionError::ElementNotInteractable { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    // =========================================================================
    // CLICK
    // =========================================================================

    /// Wait for `delegate`, then perform `gesture` on it.
    ///
    /// A disabled element fails the action and stops the run.
    pub fn click(
        &mut self,
        ctx: &mut TestContext,
        delegate: &str,
        gesture: ClickGesture,
        timeout: Duration,
    ) -> ActionResult<()> {
        if ctx.run_state_mut().check_skip() {
            return Ok(());
        }
        let result = self.try_click(ctx, delegate, gesture, timeout);
        let what = format!("{gesture:?} on '{delegate}'");
        Ok(self.settle(ctx, &what, result)?.unwrap_or(()))
    }

    /// Simple click with the configured default timeout
    pub fn click_default(&mut self, ctx: &mut TestContext, delegate: &str) -> ActionResult<()> {
        let timeout = self.config.default_timeout();
        self.click(ctx, delegate, ClickGesture::Click, timeout)
    }

    fn try_click(
        &mut self,
        ctx: &mut TestContext,
        delegate: &str,
        gesture: ClickGesture,
        timeout: Duration,
    ) -> ActionResult<()> {
        let locator = self.registry.resolve(delegate)?.locator;
        let options = self.config.wait_options(timeout);
        let element = self.wait_interactable(ctx, &locator, &options)?;

        if !self.driver.is_enabled(&element)? {
            return Err(ActionError::not_interactable(locator.as_str(), "element is disabled"));
        }

        let gestures = GestureSequence::for_click(gesture, &element, self.config.long_press());
        self.driver.perform(&gestures)?;
        ctx.counters_mut().clicks += 1;
        ctx.pass(format!("{} '{locator}'", gesture.verb()));
        Ok(())
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Apply `value` to `delegate` according to `widget`.
    ///
    /// Waits up to the input ceiling regardless of any caller timeout. With
    /// `secret`, the value is masked in every entry and log line.
    pub fn input(
        &mut self,
        ctx: &mut TestContext,
        delegate: &str,
        widget: WidgetType,
        value: &str,
        secret: bool,
    ) -> ActionResult<()> {
        if ctx.run_state_mut().check_skip() {
            return Ok(());
        }
        let result = self
            .registry
            .resolve(delegate)
            .and_then(|resolved| self.apply_input(ctx, &resolved.locator, widget, value, secret));
        let what = format!("Input into '{delegate}'");
        Ok(self.settle(ctx, &what, result)?.unwrap_or(()))
    }

    /// Like [`input`](Self::input), taking the widget type from the delegate's
    /// middle part
    pub fn input_auto(
        &mut self,
        ctx: &mut TestContext,
        delegate: &str,
        value: &str,
        secret: bool,
    ) -> ActionResult<()> {
        if ctx.run_state_mut().check_skip() {
            return Ok(());
        }
        let result = self.registry.resolve(delegate).and_then(|resolved| {
            let widget = match LocatorDelegate::parse(delegate)? {
                LocatorDelegate::Structured { widget, .. } => widget.parse::<WidgetType>()?,
                LocatorDelegate::Raw(_) => {
                    return Err(ActionError::UnknownWidgetType {
                        widget: "raw XPath".to_string(),
                    })
                }
            };
            self.apply_input(ctx, &resolved.locator, widget, value, secret)
        });
        let what = format!("Input into '{delegate}'");
        Ok(self.settle(ctx, &what, result)?.unwrap_or(()))
    }

    fn apply_input(
        &mut self,
        ctx: &mut TestContext,
        locator: &Locator,
        widget: WidgetType,
        value: &str,
        secret: bool,
    ) -> ActionResult<()> {
        let unknown = || ActionError::UnknownWidgetType {
            widget: widget.to_string(),
        };
        if !widget.accepts_input() {
            return Err(unknown());
        }

        let shown = if secret {
            mask_secret(value)
        } else {
            value.to_string()
        };
        let not_applicable = || ActionError::ValueNotApplicable {
            widget: widget.to_string(),
            locator: locator.to_string(),
            value: shown.clone(),
        };

        let options = self.config.input_wait_options();
        let element = self.wait_interactable(ctx, locator, &options)?;

        let message = match widget {
            WidgetType::ListBox => {
                if !self.driver.select_by_visible_text(&element, value)? {
                    return Err(not_applicable());
                }
                format!("Selected '{shown}' in {widget} '{locator}'")
            }
            toggle if toggle.is_toggle() => {
                let wanted = ToggleState::parse(value).ok_or_else(not_applicable)?;
                if self.driver.is_selected(&element)? == wanted.is_on() {
                    return Err(not_applicable());
                }
                self.press(&element)?;
                format!("Set {widget} '{locator}' to {shown}")
            }
            WidgetType::RadioGroup => {
                let radios = self.driver.find_elements(locator)?;
                let target = value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| index.checked_sub(1))
                    .and_then(|index| radios.get(index))
                    .ok_or_else(not_applicable)?;
                self.press(target)?;
                format!("Selected option {shown} of {widget} '{locator}'")
            }
            entry if entry.is_text_entry() => {
                self.press(&element)?;
                self.driver.clear(&element)?;
                self.driver.send_keys(&element, value)?;
                format!("Entered '{shown}' into {widget} '{locator}'")
            }
            _ => return Err(unknown()),
        };

        ctx.counters_mut().inputs += 1;
        ctx.pass(message);
        Ok(())
    }

    fn press(&mut self, element: &ElementHandle) -> ActionResult<()> {
        let gestures =
            GestureSequence::for_click(ClickGesture::Click, element, self.config.long_press());
        self.driver.perform(&gestures)
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Full `textContent` of the first element matching `delegate`.
    ///
    /// Returns an empty string when skipped or absorbed.
    pub fn output(&mut self, ctx: &mut TestContext, delegate: &str) -> ActionResult<String> {
        if ctx.run_state_mut().check_skip() {
            return Ok(String::new());
        }
        let result = self.try_output(ctx, delegate);
        let what = format!("Output of '{delegate}'");
        Ok(self.settle(ctx, &what, result)?.unwrap_or_default())
    }

    fn try_output(&mut self, ctx: &mut TestContext, delegate: &str) -> ActionResult<String> {
        let locator = self.registry.resolve(delegate)?.locator;
        let element = self.first_element(&locator)?;
        let text = self.driver.text_content(&element)?;
        ctx.counters_mut().outputs += 1;
        ctx.pass(format!("Retrieved '{text}' from '{locator}'"));
        Ok(text)
    }

    // =========================================================================
    // VALIDATE
    // =========================================================================

    /// Record a check. Runs even after the run has stopped.
    ///
    /// # Errors
    ///
    /// [`ActionError::ValidationFailed`] when `condition` is false.
    pub fn validate(
        &mut self,
        ctx: &mut TestContext,
        condition: bool,
        description: &str,
    ) -> ActionResult<bool> {
        if condition {
            ctx.pass(format!("Validated: {description}"));
            return Ok(true);
        }
        self.fail_with_screenshot(ctx, format!("Validation failed: {description}"));
        let err = ActionError::ValidationFailed {
            description: description.to_string(),
        };
        ctx.run_state_mut().stop(Some(err.clone()));
        Err(err)
    }

    // =========================================================================
    // DRAG AND DROP
    // =========================================================================

    /// Drag the first match of `from` onto the first match of `to`, without waiting
    pub fn drag_and_drop(
        &mut self,
        ctx: &mut TestContext,
        from: &str,
        to: &str,
    ) -> ActionResult<()> {
        if ctx.run_state_mut().check_skip() {
            return Ok(());
        }
        let result = self.try_drag_and_drop(ctx, from, to);
        let what = format!("Drag from '{from}' to '{to}'");
        Ok(self.settle(ctx, &what, result)?.unwrap_or(()))
    }

    fn try_drag_and_drop(
        &mut self,
        ctx: &mut TestContext,
        from: &str,
        to: &str,
    ) -> ActionResult<()> {
        let source = self.registry.resolve(from)?.locator;
        let target = self.registry.resolve(to)?.locator;
        let source_el = self.first_element(&source)?;
        let target_el = self.first_element(&target)?;
        self.driver
            .perform(&GestureSequence::drag(&source_el, &target_el))?;
        ctx.pass(format!("Dragged '{source}' onto '{target}'"));
        Ok(())
    }

    // =========================================================================
    // SHARED
    // =========================================================================

    fn wait_interactable(
        &mut self,
        ctx: &mut TestContext,
        locator: &Locator,
        options: &wait::WaitOptions,
    ) -> ActionResult<ElementHandle> {
        ctx.counters_mut().waits += 1;
        wait::until_interactable(&mut self.driver, locator, options)
    }

    fn first_element(&mut self, locator: &Locator) -> ActionResult<ElementHandle> {
        self.driver
            .find_elements(locator)?
            .into_iter()
            .next()
            .ok_or_else(|| ActionError::not_interactable(locator.as_str(), "no matching element"))
    }

    fn fail_with_screenshot(&mut self, ctx: &mut TestContext, message: String) {
        let screenshot = self.screenshots.try_capture(&mut self.driver);
        ctx.fail(message, screenshot);
    }

    /// FAIL entry with screenshot on error, then the run-state policy
    fn settle<T>(
        &mut self,
        ctx: &mut TestContext,
        what: &str,
        result: ActionResult<T>,
    ) -> ActionResult<Guarded<T>> {
        if let Err(err) = &result {
            self.fail_with_screenshot(ctx, format!("{what} failed: {err}"));
        }
        ctx.run_state_mut().settle(result)
    }
}
