//! Driver collaborator: the blocking WebDriver-like surface the engine drives.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Driver (trait)                                                  │
//! │                                                                  │
//! │  find_elements ─ implicit wait get/set ─ element state queries   │
//! │  text_content ─ clear/send_keys/select ─ perform(gestures)       │
//! │  save_screenshot                                                 │
//! ├──────────────────────────────┬───────────────────────────────────┤
//! │  session-backed drivers      │  MockDriver (in-memory DOM)       │
//! │  (supplied by the harness)   │  used by every test in the crate  │
//! └──────────────────────────────┴───────────────────────────────────┘
//! ```
//!
//! Every call blocks until the browser answers. [`ElementHandle`]s are only
//! valid for the action that obtained them; the engine re-finds elements from
//! their locator on every call.

use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::time::Duration;

use crate::locator::Locator;
use crate::result::{ActionError, ActionResult};
use crate::widget::{ClickGesture, Modifier};

/// Reference to a live DOM element, valid for a single action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned element id
    pub id: String,
    /// Element tag name
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

/// One primitive of a pointer/keyboard composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Move the pointer to the element's center
    MoveTo(ElementHandle),
    /// Press and release the primary button
    Click,
    /// Two clicks
    DoubleClick,
    /// Secondary-button click
    ContextClick,
    /// Hold a modifier key
    KeyDown(Modifier),
    /// Release a modifier key
    KeyUp(Modifier),
    /// Press the primary button without releasing
    Press,
    /// Wait inside the composition
    Pause(Duration),
    /// Release the primary button
    Release,
}

/// Ordered composition of gestures performed as one driver call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GestureSequence {
    steps: Vec<Gesture>,
}

impl GestureSequence {
    /// Empty sequence
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gesture
    #[must_use]
    pub fn then(mut self, gesture: Gesture) -> Self {
        self.steps.push(gesture);
        self
    }

    /// Move to `element`
    #[must_use]
    pub fn move_to(self, element: &ElementHandle) -> Self {
        self.then(Gesture::MoveTo(element.clone()))
    }

    /// Composition for a click gesture on `element`
    #[must_use]
    pub fn for_click(gesture: ClickGesture, element: &ElementHandle, long_press: Duration) -> Self {
        let seq = Self::new().move_to(element);
        match gesture {
            ClickGesture::Click => seq.then(Gesture::Click),
            ClickGesture::RightClick => seq.then(Gesture::ContextClick),
            ClickGesture::DoubleClick => seq.then(Gesture::DoubleClick),
            ClickGesture::AltClick | ClickGesture::CtrlClick | ClickGesture::ShiftClick => {
                let modifier = gesture.modifier().unwrap_or(Modifier::Control);
                seq.then(Gesture::KeyDown(modifier))
                    .then(Gesture::Click)
                    .then(Gesture::KeyUp(modifier))
            }
            ClickGesture::LongPress => seq
                .then(Gesture::Press)
                .then(Gesture::Pause(long_press))
                .then(Gesture::Release),
            ClickGesture::Hover => seq,
        }
    }

    /// Drag from the center of `from` to the center of `to`
    #[must_use]
    pub fn drag(from: &ElementHandle, to: &ElementHandle) -> Self {
        Self::new()
            .move_to(from)
            .then(Gesture::Press)
            .move_to(to)
            .then(Gesture::Release)
    }

    /// Gestures in order
    #[must_use]
    pub fn steps(&self) -> &[Gesture] {
        &self.steps
    }

    /// Number of gestures
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Blocking browser driver used by the action engine
pub trait Driver {
    /// All elements currently matching `locator` (honours the implicit wait)
    fn find_elements(&mut self, locator: &Locator) -> ActionResult<Vec<ElementHandle>>;

    /// Current implicit wait
    fn implicit_wait(&self) -> Duration;

    /// Replace the implicit wait
    fn set_implicit_wait(&mut self, timeout: Duration) -> ActionResult<()>;

    /// Element is enabled
    fn is_enabled(&mut self, element: &ElementHandle) -> ActionResult<bool>;

    /// Element is selected (checkbox, radio, option)
    fn is_selected(&mut self, element: &ElementHandle) -> ActionResult<bool>;

    /// Element is rendered and visible
    fn is_displayed(&mut self, element: &ElementHandle) -> ActionResult<bool>;

    /// Full `textContent`, regardless of CSS visibility
    fn text_content(&mut self, element: &ElementHandle) -> ActionResult<String>;

    /// Clear an editable element
    fn clear(&mut self, element: &ElementHandle) -> ActionResult<()>;

    /// Type `text` into an element
    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> ActionResult<()>;

    /// Select the `<option>` whose visible text equals `text`; false if none does
    fn select_by_visible_text(&mut self, element: &ElementHandle, text: &str)
        -> ActionResult<bool>;

    /// Perform a gesture composition
    fn perform(&mut self, gestures: &GestureSequence) -> ActionResult<()>;

    /// Write a full-page screenshot to `path`
    fn save_screenshot(&mut self, path: &Path) -> ActionResult<()>;
}

/// Lowers the implicit wait and restores it on drop, even on early return
#[derive(Debug)]
pub struct ImplicitWaitGuard<'a, D: Driver + ?Sized> {
    driver: &'a mut D,
    original: Duration,
}

impl<'a, D: Driver + ?Sized> ImplicitWaitGuard<'a, D> {
    /// Save the current implicit wait and switch to `temporary`
    pub fn acquire(driver: &'a mut D, temporary: Duration) -> ActionResult<Self> {
        let original = driver.implicit_wait();
        driver.set_implicit_wait(temporary)?;
        Ok(Self { driver, original })
    }

    /// Implicit wait that will be restored
    #[must_use]
    pub const fn original(&self) -> Duration {
        self.original
    }
}

impl<D: Driver + ?Sized> Deref for ImplicitWaitGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.driver
    }
}

impl<D: Driver + ?Sized> DerefMut for ImplicitWaitGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.driver
    }
}

impl<D: Driver + ?Sized> Drop for ImplicitWaitGuard<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.driver.set_implicit_wait(self.original) {
            tracing::warn!(error = %err, "failed to restore implicit wait");
        }
    }
}

/// Element in the [`MockDriver`] DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Element id
    pub id: String,
    /// Tag name
    pub tag_name: String,
    /// Locator string this element answers to
    pub locator: String,
    /// Enabled state
    pub enabled: bool,
    /// Selected state
    pub selected: bool,
    /// Displayed state
    pub displayed: bool,
    /// `textContent`
    pub text_content: String,
    /// Typed value
    pub value: String,
    /// `<option>` texts
    pub options: Vec<String>,
    /// Currently selected option
    pub selected_option: Option<String>,
    /// Clicking flips `selected` (checkbox)
    pub toggles: bool,
    /// Clicking sets `selected` (radio)
    pub selects: bool,
    /// Lookups that miss this element before it appears
    pub appears_after: u32,
    /// Times this element received a click
    pub clicks: u32,
}

impl MockElement {
    /// Enabled, displayed element
    #[must_use]
    pub fn new(id: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: "div".to_string(),
            locator: locator.into(),
            enabled: true,
            selected: false,
            displayed: true,
            text_content: String::new(),
            value: String::new(),
            options: Vec::new(),
            selected_option: None,
            toggles: false,
            selects: false,
            appears_after: 0,
            clicks: 0,
        }
    }

    /// Checkbox with initial state
    #[must_use]
    pub fn checkbox(id: impl Into<String>, locator: impl Into<String>, checked: bool) -> Self {
        let mut el = Self::new(id, locator).with_tag("input");
        el.toggles = true;
        el.selected = checked;
        el
    }

    /// Radio button with initial state
    #[must_use]
    pub fn radio(id: impl Into<String>, locator: impl Into<String>, checked: bool) -> Self {
        let mut el = Self::new(id, locator).with_tag("input");
        el.selects = true;
        el.selected = checked;
        el
    }

    /// `<select>` with option texts
    #[must_use]
    pub fn list_box(id: impl Into<String>, locator: impl Into<String>, options: &[&str]) -> Self {
        let mut el = Self::new(id, locator).with_tag("select");
        el.options = options.iter().map(|o| (*o).to_string()).collect();
        el
    }

    /// Set tag name
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_name = tag.into();
        self
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    /// Mark disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Mark not displayed
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Miss the first `lookups` lookups
    #[must_use]
    pub const fn appears_after(mut self, lookups: u32) -> Self {
        self.appears_after = lookups;
        self
    }

    fn handle(&self) -> ElementHandle {
        ElementHandle::new(&self.id, &self.tag_name)
    }
}

/// In-memory driver for unit and integration tests
#[derive(Debug)]
pub struct MockDriver {
    /// Mock DOM
    pub elements: Vec<MockElement>,
    /// Current implicit wait
    pub implicit_wait: Duration,
    /// Every implicit wait value set, in order
    pub implicit_wait_history: Vec<Duration>,
    /// Gesture compositions performed
    pub performed: Vec<GestureSequence>,
    /// Call history for verification
    pub call_history: Vec<String>,
    fail_screenshots: bool,
    fail_lookups: bool,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            implicit_wait: Duration::from_secs(10),
            implicit_wait_history: Vec::new(),
            performed: Vec::new(),
            call_history: Vec::new(),
            fail_screenshots: false,
            fail_lookups: false,
        }
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mock element
    pub fn add_element(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Add a mock element (builder form)
    #[must_use]
    pub fn with_element(mut self, element: MockElement) -> Self {
        self.add_element(element);
        self
    }

    /// Make screenshot capture fail
    pub fn fail_screenshots(&mut self, fail: bool) {
        self.fail_screenshots = fail;
    }

    /// Make element lookups fail as if the browser session were gone
    pub fn fail_lookups(&mut self, fail: bool) {
        self.fail_lookups = fail;
    }

    /// Look up an element by id
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn element_mut(&mut self, handle: &ElementHandle) -> ActionResult<&mut MockElement> {
        self.elements
            .iter_mut()
            .find(|e| e.id == handle.id)
            .ok_or_else(|| ActionError::driver(format!("stale element '{}'", handle.id)))
    }

    fn click_element(&mut self, handle: &ElementHandle) -> ActionResult<()> {
        let el = self.element_mut(handle)?;
        el.clicks += 1;
        if el.toggles {
            el.selected = !el.selected;
        } else if el.selects {
            el.selected = true;
        }
        Ok(())
    }
}

impl Driver for MockDriver {
    fn find_elements(&mut self, locator: &Locator) -> ActionResult<Vec<ElementHandle>> {
        self.call_history.push(format!("find:{locator}"));
        if self.fail_lookups {
            return Err(ActionError::driver("session lost"));
        }
        let mut found = Vec::new();
        for el in self.elements.iter_mut().filter(|e| e.locator == locator.as_str()) {
            if el.appears_after > 0 {
                el.appears_after -= 1;
            } else {
                found.push(el.handle());
            }
        }
        Ok(found)
    }

    fn implicit_wait(&self) -> Duration {
        self.implicit_wait
    }

    fn set_implicit_wait(&mut self, timeout: Duration) -> ActionResult<()> {
        self.implicit_wait = timeout;
        self.implicit_wait_history.push(timeout);
        Ok(())
    }

    fn is_enabled(&mut self, element: &ElementHandle) -> ActionResult<bool> {
        Ok(self.element_mut(element)?.enabled)
    }

    fn is_selected(&mut self, element: &ElementHandle) -> ActionResult<bool> {
        Ok(self.element_mut(element)?.selected)
    }

    fn is_displayed(&mut self, element: &ElementHandle) -> ActionResult<bool> {
        Ok(self.element_mut(element)?.displayed)
    }

    fn text_content(&mut self, element: &ElementHandle) -> ActionResult<String> {
        self.call_history.push(format!("text_content:{}", element.id));
        Ok(self.element_mut(element)?.text_content.clone())
    }

    fn clear(&mut self, element: &ElementHandle) -> ActionResult<()> {
        self.call_history.push(format!("clear:{}", element.id));
        self.element_mut(element)?.value.clear();
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementHandle, text: &str) -> ActionResult<()> {
        self.call_history.push(format!("send_keys:{}", element.id));
        self.element_mut(element)?.value.push_str(text);
        Ok(())
    }

    fn select_by_visible_text(
        &mut self,
        element: &ElementHandle,
        text: &str,
    ) -> ActionResult<bool> {
        self.call_history.push(format!("select:{}", element.id));
        let el = self.element_mut(element)?;
        if el.options.iter().any(|o| o == text) {
            el.selected_option = Some(text.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn perform(&mut self, gestures: &GestureSequence) -> ActionResult<()> {
        self.call_history.push(format!("perform:{}", gestures.len()));
        let mut pointer: Option<ElementHandle> = None;
        for step in gestures.steps() {
            match step {
                Gesture::MoveTo(el) => pointer = Some(el.clone()),
                Gesture::Click | Gesture::DoubleClick | Gesture::ContextClick => {
                    let target = pointer
                        .clone()
                        .ok_or_else(|| ActionError::driver("click without pointer target"))?;
                    self.click_element(&target)?;
                    if matches!(step, Gesture::DoubleClick) {
                        self.click_element(&target)?;
                    }
                }
                Gesture::KeyDown(_) | Gesture::KeyUp(_) | Gesture::Pause(_) => {}
                Gesture::Press | Gesture::Release => {
                    if pointer.is_none() {
                        return Err(ActionError::driver("press without pointer target"));
                    }
                }
            }
        }
        self.performed.push(gestures.clone());
        Ok(())
    }

    fn save_screenshot(&mut self, path: &Path) -> ActionResult<()> {
        self.call_history
            .push(format!("screenshot:{}", path.display()));
        if self.fail_screenshots {
            return Err(ActionError::driver("screenshot capture disabled"));
        }
        // PNG signature only; enough for a file to exist
        std::fs::write(path, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod gesture_sequence_tests {
        use super::*;

        fn el() -> ElementHandle {
            ElementHandle::new("e1", "button")
        }

        #[test]
        fn test_simple_click_moves_then_clicks() {
            let seq = GestureSequence::for_click(ClickGesture::Click, &el(), Duration::ZERO);
            assert_eq!(seq.steps(), &[Gesture::MoveTo(el()), Gesture::Click]);
        }

        #[test]
        fn test_modifier_click_wraps_key_down_up() {
            let seq = GestureSequence::for_click(ClickGesture::ShiftClick, &el(), Duration::ZERO);
            assert_eq!(
                seq.steps(),
                &[
                    Gesture::MoveTo(el()),
                    Gesture::KeyDown(Modifier::Shift),
                    Gesture::Click,
                    Gesture::KeyUp(Modifier::Shift),
                ]
            );
        }

        #[test]
        fn test_long_press_holds() {
            let hold = Duration::from_millis(2000);
            let seq = GestureSequence::for_click(ClickGesture::LongPress, &el(), hold);
            assert!(seq.steps().contains(&Gesture::Pause(hold)));
            assert_eq!(seq.steps().last(), Some(&Gesture::Release));
        }

        #[test]
        fn test_hover_never_clicks() {
            let seq = GestureSequence::for_click(ClickGesture::Hover, &el(), Duration::ZERO);
            assert_eq!(seq.len(), 1);
        }

        #[test]
        fn test_drag() {
            let to = ElementHandle::new("e2", "div");
            let seq = GestureSequence::drag(&el(), &to);
            assert_eq!(
                seq.steps(),
                &[
                    Gesture::MoveTo(el()),
                    Gesture::Press,
                    Gesture::MoveTo(to),
                    Gesture::Release
                ]
            );
        }
    }

    mod implicit_wait_guard_tests {
        use super::*;

        #[test]
        fn test_restores_on_drop() {
            let mut driver = MockDriver::new();
            let before = driver.implicit_wait();
            {
                let guard = ImplicitWaitGuard::acquire(&mut driver, Duration::from_millis(100)).unwrap();
                assert_eq!(guard.implicit_wait(), Duration::from_millis(100));
                assert_eq!(guard.original(), before);
            }
            assert_eq!(driver.implicit_wait(), before);
        }

        #[test]
        fn test_restores_on_early_error() {
            fn probe(driver: &mut MockDriver) -> ActionResult<()> {
                let mut guard = ImplicitWaitGuard::acquire(driver, Duration::ZERO)?;
                let _ = guard.find_elements(&Locator::xpath("//x"))?;
                Err(ActionError::driver("boom"))
            }

            let mut driver = MockDriver::new();
            let before = driver.implicit_wait();
            assert!(probe(&mut driver).is_err());
            assert_eq!(driver.implicit_wait(), before);
            assert_eq!(driver.implicit_wait_history, vec![Duration::ZERO, before]);
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[test]
        fn test_find_by_locator() {
            let mut driver = MockDriver::new()
                .with_element(MockElement::new("a", "//a"))
                .with_element(MockElement::new("b", "//a"))
                .with_element(MockElement::new("c", "//b"));
            let found = driver.find_elements(&Locator::xpath("//a")).unwrap();
            assert_eq!(found.len(), 2);
            assert!(driver.was_called("find://a"));
        }

        #[test]
        fn test_failed_lookup() {
            let mut driver = MockDriver::new().with_element(MockElement::new("a", "//a"));
            driver.fail_lookups(true);
            let err = driver.find_elements(&Locator::xpath("//a")).unwrap_err();
            assert!(matches!(err, ActionError::Driver { .. }));
            assert!(driver.was_called("find://a"));
        }

        #[test]
        fn test_delayed_appearance() {
            let mut driver =
                MockDriver::new().with_element(MockElement::new("a", "//a").appears_after(2));
            let loc = Locator::xpath("//a");
            assert!(driver.find_elements(&loc).unwrap().is_empty());
            assert!(driver.find_elements(&loc).unwrap().is_empty());
            assert_eq!(driver.find_elements(&loc).unwrap().len(), 1);
        }

        #[test]
        fn test_checkbox_click_toggles() {
            let mut driver = MockDriver::new().with_element(MockElement::checkbox("c", "//c", false));
            let handle = ElementHandle::new("c", "input");
            let seq = GestureSequence::for_click(ClickGesture::Click, &handle, Duration::ZERO);
            driver.perform(&seq).unwrap();
            assert!(driver.element("c").unwrap().selected);
            driver.perform(&seq).unwrap();
            assert!(!driver.element("c").unwrap().selected);
        }

        #[test]
        fn test_send_keys_and_clear() {
            let mut driver = MockDriver::new().with_element(MockElement::new("i", "//i"));
            let handle = ElementHandle::new("i", "div");
            driver.send_keys(&handle, "abc").unwrap();
            driver.clear(&handle).unwrap();
            driver.send_keys(&handle, "xyz").unwrap();
            assert_eq!(driver.element("i").unwrap().value, "xyz");
        }

        #[test]
        fn test_select_option() {
            let mut driver =
                MockDriver::new().with_element(MockElement::list_box("s", "//s", &["Red", "Blue"]));
            let handle = ElementHandle::new("s", "select");
            assert!(driver.select_by_visible_text(&handle, "Blue").unwrap());
            assert!(!driver.select_by_visible_text(&handle, "Green").unwrap());
            assert_eq!(
                driver.element("s").unwrap().selected_option.as_deref(),
                Some("Blue")
            );
        }

        #[test]
        fn test_stale_handle() {
            let mut driver = MockDriver::new();
            let err = driver
                .is_enabled(&ElementHandle::new("gone", "div"))
                .unwrap_err();
            assert!(matches!(err, ActionError::Driver { .. }));
        }

        #[test]
        fn test_click_without_target_fails() {
            let mut driver = MockDriver::new();
            let seq = GestureSequence::new().then(Gesture::Click);
            assert!(driver.perform(&seq).is_err());
        }
    }
}
