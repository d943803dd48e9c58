/*!
 * Lesson quality scoring.
 *
 * A lesson needs enough structure for independent quiz generation:
 * definitions, steps, examples, contrast, measurable criteria. The
 * scorer detects each signal with lightweight multilingual keyword and
 * pattern checks, subtracts a fixed penalty per missing signal from a
 * starting score of 100, and emits a remediation template for the
 * content-refinement tooling downstream.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::content::lexicon::Lexicon;
use crate::content::markup::strip_markup;
use crate::language_utils;

/// Content below this many plain-text characters is too short to quiz
pub const MIN_CONTENT_CHARS: usize = 500;

/// ASCII ratio above which a non-host lesson looks untranslated
pub const MISMATCH_ASCII_RATIO: f64 = 0.98;

/// Word count above which the mismatch heuristic is considered reliable
pub const MISMATCH_MIN_WORDS: usize = 80;

/// Regex for numbered step lines like "1." or "2)"
static NUMBERED_STEP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*\d{1,2}[.)]\s+").expect("Invalid numbered step regex")
});

/// One detected quality problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    /// Content is too short to support a quiz
    TooShort,
    /// No definition or comparison language found
    NoDefinitions,
    /// Neither bullets nor numbered steps found
    NoSteps,
    /// No worked example found
    NoExamples,
    /// No good/bad or do/don't contrast found
    NoContrast,
    /// No metrics or success criteria found
    NoMetrics,
    /// Declared non-host language but the text reads as host-language
    SuspectedLanguageMismatch,
}

impl QualityIssue {
    /// Fixed score penalty, applied once per distinct issue
    pub fn penalty(&self) -> u8 {
        match self {
            QualityIssue::TooShort => 25,
            QualityIssue::NoDefinitions => 15,
            QualityIssue::NoSteps => 15,
            QualityIssue::NoExamples => 15,
            QualityIssue::NoContrast => 10,
            QualityIssue::NoMetrics => 15,
            QualityIssue::SuspectedLanguageMismatch => 20,
        }
    }

    /// Short human-readable description for reports
    pub fn description(&self) -> &'static str {
        match self {
            QualityIssue::TooShort => "content too short",
            QualityIssue::NoDefinitions => "no definitions or comparisons",
            QualityIssue::NoSteps => "no steps or checklist structure",
            QualityIssue::NoExamples => "no worked examples",
            QualityIssue::NoContrast => "no good/bad contrast",
            QualityIssue::NoMetrics => "no metrics or success criteria",
            QualityIssue::SuspectedLanguageMismatch => "suspected untranslated content",
        }
    }
}

/// Raw structural measurements behind the score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualitySignals {
    /// Plain-text character count
    pub char_count: usize,
    /// Plain-text word count
    pub word_count: usize,
    /// Bulleted list present
    pub has_bullets: bool,
    /// Numbered step list present
    pub has_numbered_steps: bool,
    /// Worked example language present
    pub has_examples: bool,
    /// Good/bad contrast language present
    pub has_good_bad_contrast: bool,
    /// Metrics or criteria language present
    pub has_metrics: bool,
    /// Definition or comparison language present
    pub has_definitions: bool,
}

/// Remediation flags consumed by content-refinement tooling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineTemplate {
    /// Add definitions of the key terms
    pub add_definitions: bool,
    /// Add a step-by-step checklist
    pub add_checklist: bool,
    /// Add worked examples or common pitfalls
    pub add_examples_or_pitfalls: bool,
    /// Add measurable success criteria
    pub add_metrics: bool,
}

impl RefineTemplate {
    /// Build the template straight from the issue set
    pub fn from_issues(issues: &[QualityIssue]) -> Self {
        RefineTemplate {
            add_definitions: issues.contains(&QualityIssue::NoDefinitions),
            add_checklist: issues.contains(&QualityIssue::NoSteps),
            add_examples_or_pitfalls: issues.contains(&QualityIssue::NoExamples)
                || issues.contains(&QualityIssue::NoContrast),
            add_metrics: issues.contains(&QualityIssue::NoMetrics),
        }
    }

    /// Whether any remediation is requested
    pub fn is_empty(&self) -> bool {
        !(self.add_definitions
            || self.add_checklist
            || self.add_examples_or_pitfalls
            || self.add_metrics)
    }
}

/// Completeness assessment for one lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0-100 completeness score
    pub score: u8,
    /// Distinct issues found, each applied once
    pub issues: Vec<QualityIssue>,
    /// Raw measurements
    pub signals: QualitySignals,
    /// Remediation template for refinement tooling
    pub refine: RefineTemplate,
}

impl QualityReport {
    /// Whether the lesson meets a minimum score gate
    pub fn passed(&self, min_score: u8) -> bool {
        self.score >= min_score
    }

    /// One-line summary for logs and task lists
    pub fn summary(&self) -> String {
        if self.issues.is_empty() {
            format!("score {}/100, no issues", self.score)
        } else {
            let issue_list: Vec<&str> = self.issues.iter().map(|i| i.description()).collect();
            format!("score {}/100: {}", self.score, issue_list.join(", "))
        }
    }
}

/// Quality scorer over a lexicon table set
pub struct QualityScorer<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> QualityScorer<'a> {
    /// Scorer over a caller-supplied lexicon
    pub fn new(lexicon: &'a Lexicon) -> Self {
        QualityScorer { lexicon }
    }

    /// Scorer over the built-in tables
    pub fn with_builtin() -> QualityScorer<'static> {
        QualityScorer {
            lexicon: Lexicon::builtin(),
        }
    }

    /// Assess one lesson's structural completeness
    pub fn assess(&self, title: &str, content: &str, language_tag: &str) -> QualityReport {
        let plain = strip_markup(content);
        let lower = plain.to_lowercase();

        let signals = QualitySignals {
            char_count: plain.chars().count(),
            word_count: plain.split_whitespace().count(),
            // List markup is stripped away, so check both the raw
            // markup and plain-text bullet characters
            has_bullets: content.contains("<li") || has_bullet_lines(&plain),
            has_numbered_steps: content.contains("<ol") || NUMBERED_STEP_REGEX.is_match(&plain),
            has_examples: contains_any(&lower, &self.lexicon.example_keywords),
            has_good_bad_contrast: contains_any(&lower, &self.lexicon.contrast_keywords),
            has_metrics: contains_any(&lower, &self.lexicon.metric_keywords),
            has_definitions: contains_any(&lower, &self.lexicon.definition_keywords),
        };

        let mut issues = Vec::new();
        if signals.char_count < MIN_CONTENT_CHARS {
            issues.push(QualityIssue::TooShort);
        }
        if !signals.has_definitions {
            issues.push(QualityIssue::NoDefinitions);
        }
        if !signals.has_bullets && !signals.has_numbered_steps {
            issues.push(QualityIssue::NoSteps);
        }
        if !signals.has_examples {
            issues.push(QualityIssue::NoExamples);
        }
        if !signals.has_good_bad_contrast {
            issues.push(QualityIssue::NoContrast);
        }
        if !signals.has_metrics {
            issues.push(QualityIssue::NoMetrics);
        }
        if self.suspects_mismatch(language_tag, &plain, &signals) {
            issues.push(QualityIssue::SuspectedLanguageMismatch);
        }

        let penalty_total: u32 = issues.iter().map(|i| i.penalty() as u32).sum();
        let score = 100u32.saturating_sub(penalty_total) as u8;
        let refine = RefineTemplate::from_issues(&issues);

        debug!(
            "Quality assessment for '{}' [{}]: score={}, issues={}",
            title,
            language_tag,
            score,
            issues.len()
        );

        QualityReport {
            score,
            issues,
            signals,
            refine,
        }
    }

    /// A non-host lesson that reads almost entirely in ASCII is
    /// probably untranslated
    fn suspects_mismatch(&self, language_tag: &str, plain: &str, signals: &QualitySignals) -> bool {
        if language_utils::is_host_tag(language_tag) {
            return false;
        }
        if signals.word_count <= MISMATCH_MIN_WORDS {
            return false;
        }

        let total = plain.chars().count();
        if total == 0 {
            return false;
        }
        let ascii = plain.chars().filter(char::is_ascii).count();

        (ascii as f64 / total as f64) > MISMATCH_ASCII_RATIO
    }
}

/// Any plain-text line starting with a bullet character
fn has_bullet_lines(plain: &str) -> bool {
    plain.lines().any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with("- ")
            || trimmed.starts_with("• ")
            || trimmed.starts_with("* ")
            || trimmed.starts_with("– ")
    })
}

/// Case-insensitive keyword containment over a lowercased haystack
fn contains_any(lower: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| lower.contains(keyword.to_lowercase().as_str()))
}
