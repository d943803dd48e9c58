/*!
 * Audit artifacts for a gating run.
 *
 * Every run produces a machine-readable JSON report; runs that leave
 * lessons needing human attention additionally produce a markdown task
 * list. Both files are keyed by a timestamp and written create-new, so
 * no run ever overwrites another run's artifacts.
 */

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::errors::PipelineError;
use crate::quiz::pipeline::{GateConfig, LessonAction, LessonOutcome};

/// Filename timestamp key, fixed-width so names sort chronologically
const TIMESTAMP_KEY_FORMAT: &str = "%Y%m%dT%H%M%S%3f";

/// Aggregate counters over one run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunTotals {
    /// Lessons processed
    pub lessons: usize,
    /// Lessons that already conformed
    pub passed: usize,
    /// Lessons repaired or filled successfully
    pub enriched: usize,
    /// Lessons that still fail after every attempt
    pub rewrite_failed: usize,
    /// Lessons flagged for content refinement
    pub flagged_for_refinement: usize,
    /// Questions replaced in place
    pub replaced: usize,
    /// Questions inserted
    pub inserted: usize,
}

/// The full audit document for one gating run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run start time, RFC 3339
    pub generated_at: String,

    /// Whether writes were suppressed
    pub dry_run: bool,

    /// Thresholds the run was executed with
    pub thresholds: GateConfig,

    /// Course ids processed, in order
    pub courses: Vec<String>,

    /// Per-lesson outcomes, in processing order
    pub lessons: Vec<LessonOutcome>,

    /// Aggregate counters
    pub totals: RunTotals,
}

impl RunReport {
    /// Start an empty report under the given thresholds.
    pub fn new(config: &GateConfig) -> Self {
        RunReport {
            generated_at: Utc::now().to_rfc3339(),
            dry_run: config.dry_run,
            thresholds: config.clone(),
            courses: Vec::new(),
            lessons: Vec::new(),
            totals: RunTotals::default(),
        }
    }

    /// Note that a course was entered.
    pub fn record_course(&mut self, course_id: &str) {
        self.courses.push(course_id.to_string());
    }

    /// Record one lesson outcome and roll it into the totals.
    pub fn record(&mut self, outcome: LessonOutcome) {
        self.totals.lessons += 1;
        match outcome.action {
            LessonAction::Pass => self.totals.passed += 1,
            LessonAction::Enriched => self.totals.enriched += 1,
            LessonAction::RewriteFailed => self.totals.rewrite_failed += 1,
        }
        if outcome.flagged_for_refinement {
            self.totals.flagged_for_refinement += 1;
        }
        self.totals.replaced += outcome.replaced;
        self.totals.inserted += outcome.inserted;

        self.lessons.push(outcome);
    }

    /// Lessons a human still has to look at.
    pub fn attention_list(&self) -> Vec<&LessonOutcome> {
        self.lessons
            .iter()
            .filter(|outcome| {
                outcome.flagged_for_refinement
                    || outcome.action == LessonAction::RewriteFailed
                    || !outcome.still_flagged.is_empty()
            })
            .collect()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        parts.push(format!("{} lesson(s)", self.totals.lessons));
        parts.push(format!(
            "pass: {}, enriched: {}, rewrite failed: {}",
            self.totals.passed, self.totals.enriched, self.totals.rewrite_failed
        ));

        if self.totals.replaced > 0 || self.totals.inserted > 0 {
            parts.push(format!(
                "replaced: {}, inserted: {}",
                self.totals.replaced, self.totals.inserted
            ));
        }

        if self.totals.flagged_for_refinement > 0 {
            parts.push(format!(
                "{} flagged for refinement",
                self.totals.flagged_for_refinement
            ));
        }

        if self.dry_run {
            parts.push("dry run".to_string());
        }

        parts.join(" | ")
    }
}

/// Writes run artifacts under the configured report directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    root: PathBuf,
}

impl ReportWriter {
    /// Create a writer over the given directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        ReportWriter {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory artifacts are written under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the JSON run report; returns the created path.
    pub fn write_run_report(&self, report: &RunReport) -> Result<PathBuf, PipelineError> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| PipelineError::Report(format!("Failed to encode run report: {}", e)))?;

        let key = Utc::now().format(TIMESTAMP_KEY_FORMAT);
        let path = self.root.join(format!("run-{}.json", key));
        self.persist_new(&path, &json)?;

        info!("Run report written to {:?}", path);
        Ok(path)
    }

    /// Write the refinement task list, when anything needs attention.
    ///
    /// Returns `None` when every lesson passed cleanly and no task list is
    /// warranted.
    pub fn write_refine_list(&self, report: &RunReport) -> Result<Option<PathBuf>, PipelineError> {
        let attention = report.attention_list();
        if attention.is_empty() {
            return Ok(None);
        }

        let markdown = refine_markdown(report, &attention);

        let key = Utc::now().format(TIMESTAMP_KEY_FORMAT);
        let path = self.root.join(format!("refine-{}.md", key));
        self.persist_new(&path, &markdown)?;

        info!(
            "Refinement task list for {} lesson(s) written to {:?}",
            attention.len(),
            path
        );
        Ok(Some(path))
    }

    /// Create-new write through a temp file in the target directory.
    fn persist_new(&self, path: &Path, contents: &str) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            PipelineError::Report(format!(
                "Failed to create report directory {:?}: {}",
                self.root, e
            ))
        })?;

        let mut temp = NamedTempFile::new_in(&self.root).map_err(|e| {
            PipelineError::Report(format!("Failed to create temp file in {:?}: {}", self.root, e))
        })?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| PipelineError::Report(format!("Failed to write artifact: {}", e)))?;
        temp.persist_noclobber(path).map_err(|e| {
            PipelineError::Report(format!("Failed to persist artifact {:?}: {}", path, e))
        })?;

        Ok(())
    }
}

/// Render the markdown task list for the lessons needing attention.
fn refine_markdown(report: &RunReport, attention: &[&LessonOutcome]) -> String {
    let mut doc = String::new();

    // Writing to a String cannot fail, so the pushed results are uniform
    let _ = writeln!(doc, "# Content refinement tasks");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "Generated: {}", report.generated_at);
    if report.dry_run {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "Dry run: no changes were written.");
    }

    for outcome in attention {
        let _ = writeln!(doc);
        let _ = writeln!(
            doc,
            "## {} day {}: {}",
            outcome.course_id, outcome.day_number, outcome.title
        );
        let _ = writeln!(doc);
        let _ = writeln!(doc, "- Action: {}", outcome.action);
        let _ = writeln!(doc, "- Quality: {}", outcome.quality.summary());

        if !outcome.integrity.ok {
            let _ = writeln!(doc, "- Integrity errors:");
            for error in &outcome.integrity.errors {
                let _ = writeln!(doc, "  - {}", error);
            }
            for finding in &outcome.integrity.findings {
                let _ = writeln!(doc, "    - [{}] \"{}\"", finding.label, finding.snippet);
            }
        }

        let refine = &outcome.quality.refine;
        if !refine.is_empty() {
            let _ = writeln!(doc, "- Tasks:");
            if refine.add_definitions {
                let _ = writeln!(doc, "  - [ ] Add definitions or comparisons for the key terms");
            }
            if refine.add_checklist {
                let _ = writeln!(doc, "  - [ ] Add a step-by-step checklist");
            }
            if refine.add_examples_or_pitfalls {
                let _ = writeln!(doc, "  - [ ] Add worked examples or common pitfalls");
            }
            if refine.add_metrics {
                let _ = writeln!(doc, "  - [ ] Add measurable success criteria");
            }
        }

        if !outcome.still_flagged.is_empty() {
            let _ = writeln!(doc, "- Questions still needing replacement:");
            for flag in &outcome.still_flagged {
                let _ = writeln!(doc, "  - {}: {}", flag.question_id, flag.reasons.join("; "));
            }
        }

        if let Some(ref error) = outcome.error {
            let _ = writeln!(doc, "- Final validation error: {}", error);
        }
    }

    doc
}
