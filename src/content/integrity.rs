/*!
 * Language integrity validation for lesson content.
 *
 * Content declared as language L must not carry untranslated fragments
 * of another language or script. The policy dispatches on the script
 * family the declared tag implies: host-language content is only
 * checked for emptiness, non-Latin-script content must be visibly in
 * its script and free of long Latin stretches, and Latin-script
 * translations are scanned line by line for leaked host-language
 * sentences plus stray foreign-script runs.
 */

use serde::{Deserialize, Serialize};

use crate::content::lexicon::Lexicon;
use crate::content::markup::strip_markup;
use crate::content::scanner::{classify_line, script_letter_ratio, script_runs, ScanProfile};
use crate::language_utils::{self, ScriptFamily};

/// Minimum dominant-script letter ratio for non-Latin-script languages
pub const MIN_SCRIPT_RATIO: f64 = 0.25;

/// Latin-letter run limit inside non-Latin-script content
pub const LATIN_RUN_LIMIT: usize = 10;

/// Stricter run limit for Arabic-script content, where even short
/// leaked UI labels stay user-visible
pub const LATIN_RUN_LIMIT_ARABIC: usize = 5;

/// Foreign-script run limit inside Latin-script content
pub const FOREIGN_RUN_LIMIT: usize = 12;

/// Maximum findings reported per violation category
pub const FINDINGS_CAP: usize = 6;

/// Texts shorter than this only get a warning-level confidence note
const MIN_RELIABLE_CHARS: usize = 40;

/// A located piece of evidence for one violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Violation category label
    pub label: String,
    /// Offending text snippet
    pub snippet: String,
}

/// Structured result of an integrity check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Whether the text passed every gate; always equals `errors.is_empty()`
    pub ok: bool,
    /// One entry per violated gate
    pub errors: Vec<String>,
    /// Non-blocking observations
    pub warnings: Vec<String>,
    /// Located evidence, capped per category
    pub findings: Vec<Finding>,
}

impl IntegrityReport {
    /// A passing report with nothing to say
    pub fn passing() -> Self {
        IntegrityReport {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            findings: Vec::new(),
        }
    }

    /// Record one violation with its capped findings
    fn push_violation(&mut self, error: String, label: &str, snippets: Vec<String>) {
        self.errors.push(error);
        self.ok = false;
        for snippet in snippets.into_iter().take(FINDINGS_CAP) {
            self.findings.push(Finding {
                label: label.to_string(),
                snippet,
            });
        }
    }

    /// Merge another field's report, de-duplicating message strings
    fn absorb(&mut self, other: IntegrityReport) {
        for error in other.errors {
            if !self.errors.contains(&error) {
                self.errors.push(error);
            }
        }
        for warning in other.warnings {
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }
        self.findings.extend(other.findings);
        self.ok = self.errors.is_empty();
    }
}

/// The fields of one stored record that carry language content
#[derive(Debug, Clone, Copy)]
pub struct ContentUnit<'a> {
    /// Declared language of every field
    pub language_tag: &'a str,
    /// Main lesson body, may contain markup
    pub content: &'a str,
    /// Optional email subject line
    pub email_subject: Option<&'a str>,
    /// Optional email body, may contain markup
    pub email_body: Option<&'a str>,
}

/// Language integrity validator over a lexicon table set
pub struct IntegrityValidator<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> IntegrityValidator<'a> {
    /// Validator over a caller-supplied lexicon
    pub fn new(lexicon: &'a Lexicon) -> Self {
        IntegrityValidator { lexicon }
    }

    /// Validator over the built-in tables
    pub fn with_builtin() -> IntegrityValidator<'static> {
        IntegrityValidator {
            lexicon: Lexicon::builtin(),
        }
    }

    /// Validate one text field declared as `language_tag`.
    ///
    /// `context_label` names the field in every message so an aggregate
    /// report stays readable.
    pub fn validate(&self, language_tag: &str, text: &str, context_label: &str) -> IntegrityReport {
        let mut report = IntegrityReport::passing();
        let plain = strip_markup(text);

        if plain.trim().is_empty() {
            report.push_violation(
                format!("{}: content is empty", context_label),
                "empty",
                Vec::new(),
            );
            return report;
        }

        // Host-language content ships untranslated; nothing further to gate
        if language_utils::is_host_tag(language_tag) {
            return report;
        }

        if plain.chars().count() < MIN_RELIABLE_CHARS {
            report.warnings.push(format!(
                "{}: text under {} characters, language checks are low-confidence",
                context_label, MIN_RELIABLE_CHARS
            ));
        }

        let family = language_utils::declared_script(language_tag);
        if family == ScriptFamily::Latin {
            self.check_latin_script_content(language_tag, &plain, context_label, &mut report);
        } else {
            self.check_native_script_content(language_tag, family, &plain, context_label, &mut report);
        }

        report
    }

    /// Validate every content-bearing field of a record and merge the
    /// per-field reports
    pub fn validate_record(&self, unit: &ContentUnit) -> IntegrityReport {
        let mut report = self.validate(unit.language_tag, unit.content, "lesson content");

        if let Some(subject) = unit.email_subject {
            report.absorb(self.validate(unit.language_tag, subject, "email subject"));
        }
        if let Some(body) = unit.email_body {
            report.absorb(self.validate(unit.language_tag, body, "email body"));
        }

        report
    }

    /// Policy for languages written in a non-Latin script: the script
    /// must dominate, and long Latin stretches are rejected outright
    fn check_native_script_content(
        &self,
        language_tag: &str,
        family: ScriptFamily,
        plain: &str,
        context_label: &str,
        report: &mut IntegrityReport,
    ) {
        if let Some(ratio) = script_letter_ratio(plain, family) {
            if ratio < MIN_SCRIPT_RATIO {
                let foreign_lines: Vec<String> = plain
                    .lines()
                    .filter(|line| {
                        line.chars().any(char::is_alphabetic)
                            && !line.chars().any(|c| family.contains(c))
                    })
                    .map(|line| line.trim().to_string())
                    .collect();

                report.push_violation(
                    format!(
                        "{}: content tagged '{}' is not visibly in {} script ({:.0}% of letters)",
                        context_label,
                        language_tag,
                        family.display_name(),
                        ratio * 100.0
                    ),
                    "script_ratio",
                    foreign_lines,
                );
            }
        } else {
            report.warnings.push(format!(
                "{}: no letters found, script ratio not measurable",
                context_label
            ));
        }

        let run_limit = if family == ScriptFamily::Arabic {
            LATIN_RUN_LIMIT_ARABIC
        } else {
            LATIN_RUN_LIMIT
        };
        let runs = script_runs(plain, ScriptFamily::Latin, run_limit);
        if !runs.is_empty() {
            report.push_violation(
                format!(
                    "{}: content tagged '{}' embeds {} untranslated Latin fragment(s)",
                    context_label,
                    language_tag,
                    runs.len()
                ),
                "latin_run",
                runs,
            );
        }
    }

    /// Policy for Latin-script translations: same alphabet as the host
    /// language, so the gate is the per-line lexical scanner plus a
    /// ceiling on stray foreign-script runs
    fn check_latin_script_content(
        &self,
        language_tag: &str,
        plain: &str,
        context_label: &str,
        report: &mut IntegrityReport,
    ) {
        let profile = ScanProfile::for_language(self.lexicon, language_tag);
        let host_name = language_utils::language_name(language_utils::HOST_LANGUAGE_TAG)
            .unwrap_or_else(|_| "host-language".to_string());

        let leaked_lines: Vec<String> = plain
            .lines()
            .filter(|line| classify_line(line, &profile).likely_foreign_instruction)
            .map(|line| line.trim().to_string())
            .collect();

        if !leaked_lines.is_empty() {
            report.push_violation(
                format!(
                    "{}: content tagged '{}' contains {} suspected {} line(s)",
                    context_label,
                    language_tag,
                    leaked_lines.len(),
                    host_name
                ),
                "foreign_line",
                leaked_lines,
            );
        }

        for family in [ScriptFamily::Cyrillic, ScriptFamily::Cjk, ScriptFamily::Arabic] {
            let runs = script_runs(plain, family, FOREIGN_RUN_LIMIT);
            if !runs.is_empty() {
                report.push_violation(
                    format!(
                        "{}: content tagged '{}' embeds a long {} run",
                        context_label,
                        language_tag,
                        family.display_name()
                    ),
                    "script_run",
                    runs,
                );
            }
        }
    }
}
