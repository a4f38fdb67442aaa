//! Probar POM: page-object action engine for browser tests
//!
//! Turns declarative element references (`Login.EditField.User`, or a raw
//! XPath) into waited-for, type-dispatched driver actions, stops a test on
//! its first failure, and mirrors every action into a Test → Step report with
//! screenshots and per-test counters.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PROBAR POM Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Locator    │    │ Action     │    │ Driver     │            │
//! │   │ Registry   │───►│ Executor   │───►│ (WebDriver │            │
//! │   │ (.props)   │    │            │    │  or mock)  │            │
//! │   └────────────┘    └─────┬──────┘    └────────────┘            │
//! │                           │                                     │
//! │               ┌───────────┴───────────┐                         │
//! │               ▼                       ▼                         │
//! │        ┌────────────┐          ┌────────────┐                   │
//! │        │ RunState   │          │ ReportTree │──► HTML / JSON    │
//! │        │ (fail-fast)│          │ Test→Step  │                   │
//! │        └────────────┘          └────────────┘                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use probar_pom::prelude::*;
//! use std::time::Duration;
//!
//! let page = PageDefinition::new("Login")
//!     .with_locator(WidgetType::Button, "Submit", "//button[@type='submit']");
//! let driver = MockDriver::new()
//!     .with_element(MockElement::new("submit", "//button[@type='submit']"));
//! let results = std::env::temp_dir().join("probar-pom-doctest");
//! let mut executor = ActionExecutor::new(driver, ExecutorConfig::new().with_results_dir(&results))
//!     .with_registry(LocatorRegistry::new().with_page(page));
//!
//! let mut report = ReportTree::new("smoke");
//! let mut ctx = report.begin_test("login");
//! ctx.step("Submit the form");
//! executor
//!     .click(&mut ctx, "Login.Button.Submit", ClickGesture::Click, Duration::from_secs(1))
//!     .unwrap();
//! let node = report.end_test(ctx).unwrap();
//! assert_eq!(node.counters.clicks, 1);
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod config;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod driver;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod executor;
mod locator;
/// Logging setup for binaries and test harnesses
pub mod logging;
mod properties;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod report;
mod result;
mod run_state;
mod screenshot;
mod wait;
mod widget;
#[allow(
    clippy::missing_errors_doc,
    clippy::format_push_string,
    clippy::needless_raw_string_hashes
)]
mod writer;

pub use config::{
    ExecutorConfig, DEFAULT_LONG_PRESS_MS, DEFAULT_PROBE_INTERVAL_MS, INPUT_WAIT_CEILING_MS,
};
pub use driver::{
    Driver, ElementHandle, Gesture, GestureSequence, ImplicitWaitGuard, MockDriver, MockElement,
};
pub use executor::{mask_secret, ActionExecutor};
pub use locator::{
    DirectorySource, Locator, LocatorDelegate, LocatorKind, LocatorRegistry, PageDefinition,
    PropertySource, ResolvedLocator, PASSWORD_KEY, PROPERTIES_EXTENSION,
};
pub use properties::PropertyStore;
pub use report::{
    ActionCounters, LogEntry, ReportTree, Status, StepNode, TestContext, TestNode,
};
pub use result::{ActionError, ActionResult, ErrorClass};
pub use run_state::{Guarded, RunState};
pub use screenshot::ScreenshotStore;
pub use wait::{
    poll_until, until_interactable, WaitOptions, WaitOutcome, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};
pub use widget::{ClickGesture, Modifier, ToggleState, WidgetType};
pub use writer::{HtmlReportWriter, JsonReportWriter, ReportWriter};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::executor::*;
    pub use super::locator::*;
    pub use super::properties::*;
    pub use super::report::*;
    pub use super::result::*;
    pub use super::run_state::*;
    pub use super::screenshot::*;
    pub use super::wait::*;
    pub use super::widget::*;
    pub use super::writer::*;
}
