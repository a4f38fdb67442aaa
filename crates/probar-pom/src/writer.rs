//! Report writers.
//!
//! A writer receives each closed [`TestNode`] and persists the collected run on
//! `flush`. Two writers ship with the crate: a self-contained HTML page and a
//! JSON document.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::report::{LogEntry, Status, StepNode, TestNode};
use crate::result::ActionResult;

/// Receives closed tests and persists them
pub trait ReportWriter {
    /// Record a closed test
    fn write_test(&mut self, test: &TestNode) -> ActionResult<()>;

    /// Persist everything recorded so far
    fn flush(&mut self) -> ActionResult<()>;
}

/// Escape HTML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const fn status_class(status: Status) -> &'static str {
    match status {
        Status::Pass => "pass",
        Status::Info => "info",
        Status::Fail => "fail",
    }
}

fn ensure_parent(path: &Path) -> ActionResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Single-page HTML report
#[derive(Debug, Clone)]
pub struct HtmlReportWriter {
    output_path: PathBuf,
    title: String,
    tests: Vec<TestNode>,
}

impl HtmlReportWriter {
    /// Write to `output_path` on flush
    #[must_use]
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            title: "Test Report".to_string(),
            tests: Vec::new(),
        }
    }

    /// Set page title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Output path
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Render HTML report content
    #[must_use]
    pub fn render(&self) -> String {
        let mut html = String::new();
        let passed = self
            .tests
            .iter()
            .filter(|t| !t.status().is_failed())
            .count();

        html.push_str(&format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }}
        .summary {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .test {{ padding: 10px; margin: 10px 0; border-radius: 4px; }}
        .test.pass {{ background: #e8f5e9; border-left: 4px solid #4caf50; }}
        .test.fail {{ background: #ffebee; border-left: 4px solid #f44336; }}
        .step {{ margin: 6px 0 6px 16px; }}
        .entry {{ font-family: monospace; margin-left: 16px; }}
        .entry.pass {{ color: #2e7d32; }}
        .entry.info {{ color: #555; }}
        .entry.fail {{ color: #d32f2f; }}
        .counters {{ color: #555; font-size: 0.9em; }}
    </style>
</head>
<body>
<div class="summary">
    <h1>{title}</h1>
    <h2>Results: {passed}/{total} passed</h2>
</div>
"#,
            title = escape_html(&self.title),
            total = self.tests.len(),
        ));

        for test in &self.tests {
            render_test(&mut html, test);
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

fn render_entry(html: &mut String, entry: &LogEntry) {
    html.push_str(&format!(
        r#"        <div class="entry {}">[{}] {} {}"#,
        status_class(entry.status),
        entry.timestamp.format("%H:%M:%S"),
        entry.status.label(),
        escape_html(&entry.message)
    ));
    if let Some(shot) = &entry.screenshot {
        let href = escape_html(&shot.to_string_lossy());
        html.push_str(&format!(r#" <a href="{href}">screenshot</a>"#));
    }
    html.push_str("</div>\n");
}

fn render_step(html: &mut String, step: &StepNode) {
    html.push_str(&format!(
        r#"    <div class="step {}"><strong>{}</strong>
"#,
        status_class(step.status()),
        escape_html(&step.name)
    ));
    for entry in &step.entries {
        render_entry(html, entry);
    }
    html.push_str("    </div>\n");
}

fn render_test(html: &mut String, test: &TestNode) {
    html.push_str(&format!(
        r#"<div class="test {}" id="test-{}">
    <h3>{} - {}</h3>
    <div class="counters">{}</div>
"#,
        status_class(test.status()),
        test.id,
        escape_html(&test.name),
        test.status().label(),
        test.counters.summary()
    ));
    for entry in &test.log {
        render_entry(html, entry);
    }
    for step in &test.steps {
        render_step(html, step);
    }
    if let Some(summary) = &test.summary {
        render_entry(html, summary);
    }
    html.push_str("</div>\n");
}

impl ReportWriter for HtmlReportWriter {
    fn write_test(&mut self, test: &TestNode) -> ActionResult<()> {
        self.tests.push(test.clone());
        Ok(())
    }

    fn flush(&mut self) -> ActionResult<()> {
        ensure_parent(&self.output_path)?;
        std::fs::write(&self.output_path, self.render())?;
        tracing::debug!(path = %self.output_path.display(), tests = self.tests.len(), "html report written");
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    passed: usize,
    failed: usize,
    tests: &'a [TestNode],
}

/// JSON report (serde)
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    output_path: PathBuf,
    title: String,
    tests: Vec<TestNode>,
}

impl JsonReportWriter {
    /// Write to `output_path` on flush
    #[must_use]
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            title: "Test Report".to_string(),
            tests: Vec::new(),
        }
    }

    /// Set report title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Render JSON content
    pub fn render(&self) -> ActionResult<String> {
        let failed = self
            .tests
            .iter()
            .filter(|t| t.status().is_failed())
            .count();
        let report = JsonReport {
            title: &self.title,
            passed: self.tests.len() - failed,
            failed,
            tests: &self.tests,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

impl ReportWriter for JsonReportWriter {
    fn write_test(&mut self, test: &TestNode) -> ActionResult<()> {
        self.tests.push(test.clone());
        Ok(())
    }

    fn flush(&mut self) -> ActionResult<()> {
        ensure_parent(&self.output_path)?;
        std::fs::write(&self.output_path, self.render()?)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::report::{ReportTree, TestContext};

    fn sample_node(fail: bool) -> TestNode {
        let mut ctx = TestContext::new("login <admin>");
        ctx.step("Submit form");
        ctx.pass("Clicked on //button");
        if fail {
            ctx.fail("Element not enabled", Some(PathBuf::from("screenshots/x.png")));
        }
        ctx.close()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_html_render_contains_tree() {
        let mut writer = HtmlReportWriter::new("unused.html").with_title("Nightly");
        writer.write_test(&sample_node(true)).unwrap();
        let html = writer.render();

        assert!(html.contains("<title>Nightly</title>"));
        assert!(html.contains("login &lt;admin&gt;"));
        assert!(html.contains("Submit form"));
        assert!(html.contains(r#"<a href="screenshots/x.png">screenshot</a>"#));
        assert!(html.contains("Results: 0/1 passed"));
        assert!(html.contains("clicks: 0"));

        let step_at = html.find("Element not enabled").unwrap();
        let summary_at = html.find("Summary - ").unwrap();
        assert!(summary_at > step_at);
    }

    #[test]
    fn test_html_flush_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.html");
        let mut report = ReportTree::new("suite").with_writer(HtmlReportWriter::new(&path));

        let mut ctx = report.begin_test("t");
        ctx.pass("ok");
        let _ = report.end_test(ctx).unwrap();
        report.flush().unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Results: 1/1 passed"));
    }

    #[test]
    fn test_json_render() {
        let mut writer = JsonReportWriter::new("unused.json");
        writer.write_test(&sample_node(false)).unwrap();
        writer.write_test(&sample_node(true)).unwrap();

        let value: serde_json::Value = serde_json::from_str(&writer.render().unwrap()).unwrap();
        assert_eq!(value["passed"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["tests"][0]["steps"][0]["name"], "Submit form");
    }

    #[test]
    fn test_json_flush_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut writer = JsonReportWriter::new(&path);
        writer.write_test(&sample_node(false)).unwrap();
        writer.flush().unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"passed\": 1"));
    }
}
