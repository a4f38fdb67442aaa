//! Hierarchical Test → Step report.
//!
//! # Architecture
//!
//! ```text
//! ReportTree ──begin_test──► TestContext ──(actions log here)──► end_test ──► TestNode
//!     │                        │  RunState                              │
//!     │                        │  TestNode { log, steps, summary }      ▼
//!     └──────────────────────────────────────────────────────── ReportWriter
//! ```
//!
//! A [`TestContext`] is created per test and owns everything that used to be
//! process-wide: the run state, the test node under construction, and its
//! action counters. Nothing is shared between two contexts.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::result::{ActionError, ActionResult};
use crate::run_state::RunState;
use crate::writer::ReportWriter;

/// Status of a log entry or node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Action succeeded
    Pass,
    /// Informational line
    Info,
    /// Action or validation failed
    Fail,
}

impl Status {
    /// Upper-case label used in log lines
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Info => "INFO",
            Self::Fail => "FAIL",
        }
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One log line in a test or step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Entry status
    pub status: Status,
    /// Message (may carry simple inline markup)
    pub message: String,
    /// Screenshot path relative to the results directory
    pub screenshot: Option<PathBuf>,
    /// When the entry was logged
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Create an entry stamped now
    #[must_use]
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            screenshot: None,
            timestamp: Local::now(),
        }
    }

    /// Attach a screenshot
    #[must_use]
    pub fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        self.screenshot = path;
        self
    }
}

/// Per-test action counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounters {
    /// Explicit waits performed
    pub waits: u32,
    /// Successful click gestures
    pub clicks: u32,
    /// Successful inputs
    pub inputs: u32,
    /// Successful text reads
    pub outputs: u32,
}

impl ActionCounters {
    /// Summary line emitted when a test closes
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "waits: {}, clicks: {}, inputs: {}, outputs: {}",
            self.waits, self.clicks, self.inputs, self.outputs
        )
    }

    /// Sum two counter sets
    #[must_use]
    pub const fn merged(self, other: Self) -> Self {
        Self {
            waits: self.waits + other.waits,
            clicks: self.clicks + other.clicks,
            inputs: self.inputs + other.inputs,
            outputs: self.outputs + other.outputs,
        }
    }
}

/// A logical step inside a test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepNode {
    /// Step name
    pub name: String,
    /// Entries logged while this step was current
    pub entries: Vec<LogEntry>,
}

impl StepNode {
    /// Create an empty step
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Fail if any entry failed, Pass otherwise
    #[must_use]
    pub fn status(&self) -> Status {
        if self.entries.iter().any(|e| e.status.is_failed()) {
            Status::Fail
        } else {
            Status::Pass
        }
    }

    /// Screenshots attached to this step's entries
    pub fn screenshots(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().filter_map(|e| e.screenshot.as_ref())
    }
}

/// One test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestNode {
    /// Unique id (used for report anchors)
    pub id: Uuid,
    /// Test name
    pub name: String,
    /// Entries logged before the first step
    pub log: Vec<LogEntry>,
    /// Steps, in creation order; the last one is current
    pub steps: Vec<StepNode>,
    /// Counter summary written when the test closes
    pub summary: Option<LogEntry>,
    /// Action counters
    pub counters: ActionCounters,
    /// Creation time
    pub started: DateTime<Local>,
    /// Closure time
    pub finished: Option<DateTime<Local>>,
}

impl TestNode {
    /// Create an open test node with zeroed counters
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            log: Vec::new(),
            steps: Vec::new(),
            summary: None,
            counters: ActionCounters::default(),
            started: Local::now(),
            finished: None,
        }
    }

    /// Fail if the test log or any step failed
    #[must_use]
    pub fn status(&self) -> Status {
        let test_failed = self.log.iter().any(|e| e.status.is_failed());
        if test_failed || self.steps.iter().any(|s| s.status().is_failed()) {
            Status::Fail
        } else {
            Status::Pass
        }
    }

    /// All entries in order: test log, each step's, then the summary
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.log
            .iter()
            .chain(self.steps.iter().flat_map(|s| s.entries.iter()))
            .chain(self.summary.iter())
    }

    /// Number of FAIL entries
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries().filter(|e| e.status.is_failed()).count()
    }

    /// True once `end_test` has run
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.finished.is_some()
    }

    fn push(&mut self, entry: LogEntry) {
        match self.steps.last_mut() {
            Some(step) => step.entries.push(entry),
            None => self.log.push(entry),
        }
    }
}

/// Everything one test needs: run state, its report node, its counters
#[derive(Debug)]
pub struct TestContext {
    run_state: RunState,
    node: TestNode,
}

impl TestContext {
    /// Fresh context: running, empty node, zeroed counters
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut run_state = RunState::new();
        run_state.reset();
        Self {
            run_state,
            node: TestNode::new(name),
        }
    }

    /// Open a new step; the previous one is closed implicitly
    pub fn step(&mut self, name: impl Into<String>) {
        let name = name.into();
        tracing::info!(test = %self.node.name, step = %name, "step");
        self.node.steps.push(StepNode::new(name));
    }

    /// Log a PASS entry
    pub fn pass(&mut self, message: impl Into<String>) {
        self.log(Status::Pass, message, None);
    }

    /// Log an INFO entry
    pub fn info(&mut self, message: impl Into<String>) {
        self.log(Status::Info, message, None);
    }

    /// Log a FAIL entry with an optional screenshot
    pub fn fail(&mut self, message: impl Into<String>, screenshot: Option<PathBuf>) {
        self.log(Status::Fail, message, screenshot);
    }

    /// Log an entry into the current step (or the test log before any step)
    pub fn log(&mut self, status: Status, message: impl Into<String>, screenshot: Option<PathBuf>) {
        let message = message.into();
        match status {
            Status::Pass => tracing::info!(test = %self.node.name, "{message}"),
            Status::Info => tracing::debug!(test = %self.node.name, "{message}"),
            Status::Fail => tracing::error!(test = %self.node.name, "{message}"),
        }
        self.node
            .push(LogEntry::new(status, message).with_screenshot(screenshot));
    }

    /// True while guarded actions execute
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.run_state.is_running()
    }

    /// Root cause of a stopped run
    #[must_use]
    pub const fn first_failure(&self) -> Option<&ActionError> {
        self.run_state.first_failure()
    }

    /// Run state
    #[must_use]
    pub const fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// Mutable run state
    pub fn run_state_mut(&mut self) -> &mut RunState {
        &mut self.run_state
    }

    /// Counters
    #[must_use]
    pub const fn counters(&self) -> &ActionCounters {
        &self.node.counters
    }

    /// Mutable counters
    pub fn counters_mut(&mut self) -> &mut ActionCounters {
        &mut self.node.counters
    }

    /// Test node under construction
    #[must_use]
    pub const fn node(&self) -> &TestNode {
        &self.node
    }

    /// Test name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Close the node: emit the counter summary and stamp the end time
    #[must_use]
    pub fn close(mut self) -> TestNode {
        let summary = format!("Summary - {}", self.node.counters.summary());
        tracing::info!(test = %self.node.name, status = %self.node.status(), "{summary}");
        self.node.summary = Some(LogEntry::new(Status::Info, summary));
        self.node.finished = Some(Local::now());
        self.node
    }
}

/// All tests of one run, plus the writer that persists them
pub struct ReportTree {
    name: String,
    tests: Vec<TestNode>,
    writer: Option<Box<dyn ReportWriter>>,
}

impl fmt::Debug for ReportTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportTree")
            .field("name", &self.name)
            .field("tests", &self.tests.len())
            .field("has_writer", &self.writer.is_some())
            .finish()
    }
}

impl ReportTree {
    /// In-memory report without a writer
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            writer: None,
        }
    }

    /// Attach a writer
    #[must_use]
    pub fn with_writer(mut self, writer: impl ReportWriter + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Start a test: fresh run state and zeroed counters
    #[must_use]
    pub fn begin_test(&self, name: impl Into<String>) -> TestContext {
        let ctx = TestContext::new(name);
        tracing::info!(report = %self.name, test = %ctx.name(), "test started");
        ctx
    }

    /// Close a test, record it, and hand it to the writer.
    ///
    /// The test is recorded even when the writer fails.
    pub fn end_test(&mut self, ctx: TestContext) -> ActionResult<&TestNode> {
        let index = self.tests.len();
        self.tests.push(ctx.close());
        let node = &self.tests[index];
        if let Some(writer) = self.writer.as_mut() {
            writer.write_test(node)?;
            writer.flush()?;
        }
        Ok(node)
    }

    /// Persist everything written so far
    pub fn flush(&mut self) -> ActionResult<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Report name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Closed tests
    #[must_use]
    pub fn tests(&self) -> &[TestNode] {
        &self.tests
    }

    /// Number of passing tests
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.tests
            .iter()
            .filter(|t| !t.status().is_failed())
            .count()
    }

    /// Number of failing tests
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.tests.iter().filter(|t| t.status().is_failed()).count()
    }

    /// Counters summed over all tests
    #[must_use]
    pub fn total_counters(&self) -> ActionCounters {
        self.tests
            .iter()
            .fold(ActionCounters::default(), |acc, t| acc.merged(t.counters))
    }

    /// Summary string
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed",
            self.name,
            self.passed_count(),
            self.tests.len()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod test_context_tests {
        use super::*;

        #[test]
        fn test_entries_before_first_step_go_to_test_log() {
            let mut ctx = TestContext::new("t");
            ctx.info("opening browser");
            assert_eq!(ctx.node().log.len(), 1);
            assert!(ctx.node().steps.is_empty());
        }

        #[test]
        fn test_entries_land_in_current_step() {
            let mut ctx = TestContext::new("t");
            ctx.step("first");
            ctx.pass("a");
            ctx.step("second");
            ctx.pass("b");
            ctx.pass("c");

            let node = ctx.node();
            assert_eq!(node.steps.len(), 2);
            assert_eq!(node.steps[0].entries.len(), 1);
            assert_eq!(node.steps[1].entries.len(), 2);
        }

        #[test]
        fn test_fail_marks_step_and_test() {
            let mut ctx = TestContext::new("t");
            ctx.step("ok");
            ctx.pass("fine");
            ctx.step("broken");
            ctx.fail("nope", Some(PathBuf::from("screenshots/a.png")));

            let node = ctx.node();
            assert_eq!(node.steps[0].status(), Status::Pass);
            assert_eq!(node.steps[1].status(), Status::Fail);
            assert_eq!(node.steps[1].screenshots().count(), 1);
            assert_eq!(node.status(), Status::Fail);
            assert_eq!(node.failure_count(), 1);
        }

        #[test]
        fn test_new_context_is_running_with_zero_counters() {
            let ctx = TestContext::new("t");
            assert!(ctx.is_running());
            assert_eq!(*ctx.counters(), ActionCounters::default());
        }

        #[test]
        fn test_close_emits_summary() {
            let mut ctx = TestContext::new("t");
            ctx.counters_mut().clicks = 3;
            ctx.counters_mut().inputs = 2;
            let node = ctx.close();

            assert!(node.is_closed());
            let last = node.summary.as_ref().unwrap();
            assert_eq!(last.status, Status::Info);
            assert!(last.message.contains("clicks: 3"));
            assert!(last.message.contains("inputs: 2"));
            assert!(node.log.is_empty());
        }

        #[test]
        fn test_summary_follows_step_entries() {
            let mut ctx = TestContext::new("t");
            ctx.step("broken");
            ctx.fail("nope", None);
            let node = ctx.close();

            let statuses: Vec<Status> = node.entries().map(|e| e.status).collect();
            assert_eq!(statuses, vec![Status::Fail, Status::Info]);
            assert!(node.entries().last().unwrap().message.starts_with("Summary - "));
        }
    }

    mod counters_tests {
        use super::*;

        #[test]
        fn test_summary_format() {
            let c = ActionCounters {
                waits: 1,
                clicks: 2,
                inputs: 3,
                outputs: 4,
            };
            assert_eq!(c.summary(), "waits: 1, clicks: 2, inputs: 3, outputs: 4");
        }

        #[test]
        fn test_merged() {
            let a = ActionCounters {
                clicks: 1,
                ..ActionCounters::default()
            };
            let b = ActionCounters {
                clicks: 2,
                outputs: 1,
                ..ActionCounters::default()
            };
            let m = a.merged(b);
            assert_eq!(m.clicks, 3);
            assert_eq!(m.outputs, 1);
        }
    }

    mod report_tree_tests {
        use super::*;

        #[test]
        fn test_begin_and_end() {
            let mut report = ReportTree::new("suite");
            let mut ctx = report.begin_test("login");
            ctx.pass("done");
            let node = report.end_test(ctx).unwrap();
            assert_eq!(node.name, "login");
            assert_eq!(report.tests().len(), 1);
            assert_eq!(report.passed_count(), 1);
        }

        #[test]
        fn test_each_test_starts_fresh() {
            let mut report = ReportTree::new("suite");
            let mut first = report.begin_test("one");
            first.counters_mut().clicks = 5;
            first.run_state_mut().stop(None);
            let _ = report.end_test(first).unwrap();

            let second = report.begin_test("two");
            assert!(second.is_running());
            assert_eq!(second.counters().clicks, 0);
        }

        #[test]
        fn test_counts_and_totals() {
            let mut report = ReportTree::new("suite");

            let mut ok = report.begin_test("ok");
            ok.counters_mut().clicks = 2;
            let _ = report.end_test(ok).unwrap();

            let mut bad = report.begin_test("bad");
            bad.counters_mut().clicks = 1;
            bad.fail("broken", None);
            let _ = report.end_test(bad).unwrap();

            assert_eq!(report.passed_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.total_counters().clicks, 3);
            assert_eq!(report.summary(), "suite: 1/2 passed");
        }

        #[test]
        fn test_failed_writer_still_records_test() {
            let dir = tempfile::tempdir().unwrap();
            let mut report =
                ReportTree::new("suite").with_writer(crate::writer::HtmlReportWriter::new(dir.path()));
            let mut ctx = report.begin_test("broken");
            ctx.counters_mut().clicks = 1;
            ctx.fail("nope", None);

            assert!(report.end_test(ctx).is_err());
            assert_eq!(report.tests().len(), 1);
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.total_counters().clicks, 1);
        }

        #[test]
        fn test_flush_without_writer_is_noop() {
            let mut report = ReportTree::new("suite");
            report.flush().unwrap();
        }
    }
}
