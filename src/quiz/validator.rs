/*!
 * Quiz question validation.
 *
 * A question passes when its shape is servable (interrogative text within
 * bounds, 2 to 6 distinct options, one in-range correct answer), its type
 * teaches rather than parrots (recall is never accepted), and its text is
 * written in the lesson's language. Validation is pure; queueing a failed
 * question for replacement is the pipeline's job.
 */

use std::collections::HashSet;
use std::str::FromStr;

use crate::content::lexicon::Lexicon;
use crate::content::scanner::{self, ScanProfile};
use crate::generator::CandidateQuestion;
use crate::language_utils::{self, ScriptFamily};
use crate::quiz::dedup::normalize_text;
use crate::store::models::{Difficulty, QuestionRecord, QuestionType};

/// Shortest acceptable question text, in characters
pub const MIN_QUESTION_CHARS: usize = 10;

/// Longest acceptable question text, in characters
pub const MAX_QUESTION_CHARS: usize = 300;

/// Fewest options a question may offer
pub const MIN_OPTIONS: usize = 2;

/// Most options a question may offer
pub const MAX_OPTIONS: usize = 6;

/// Question marks across the scripts the course catalog serves
const INTERROGATIVE_MARKS: [char; 5] = ['?', '？', '؟', ';', '՞'];

/// Minimum native-script letter share for questions under a non-Latin tag
const MIN_NATIVE_RATIO: f64 = 0.25;

/// Borrowed view of a question under validation
///
/// Stored rows and fresh candidates validate through the same view, so a
/// junk value persisted earlier fails here instead of crashing a read.
#[derive(Debug, Clone, Copy)]
pub struct QuestionInput<'a> {
    /// Question text
    pub question_text: &'a str,
    /// Answer options
    pub options: &'a [String],
    /// Index of the correct option
    pub correct_index: i64,
    /// Raw question type string
    pub question_type: &'a str,
    /// Raw difficulty string
    pub difficulty: &'a str,
}

impl<'a> From<&'a QuestionRecord> for QuestionInput<'a> {
    fn from(record: &'a QuestionRecord) -> Self {
        QuestionInput {
            question_text: &record.question_text,
            options: &record.options,
            correct_index: record.correct_index,
            question_type: &record.question_type,
            difficulty: &record.difficulty,
        }
    }
}

impl<'a> From<&'a CandidateQuestion> for QuestionInput<'a> {
    fn from(candidate: &'a CandidateQuestion) -> Self {
        QuestionInput {
            question_text: &candidate.question_text,
            options: &candidate.options,
            correct_index: candidate.correct_index,
            question_type: &candidate.question_type,
            difficulty: &candidate.difficulty,
        }
    }
}

/// Outcome of validating one question
#[derive(Debug, Clone)]
pub struct QuestionVerdict {
    /// Whether the question may be served as-is
    pub is_valid: bool,
    /// One message per failed check
    pub errors: Vec<String>,
}

impl QuestionVerdict {
    fn from_errors(errors: Vec<String>) -> Self {
        QuestionVerdict {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Quiz question validator over a lexicon table set
pub struct QuestionValidator<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> QuestionValidator<'a> {
    /// Validator over a caller-supplied lexicon
    pub fn new(lexicon: &'a Lexicon) -> Self {
        QuestionValidator { lexicon }
    }

    /// Validator over the built-in tables
    pub fn with_builtin() -> QuestionValidator<'static> {
        QuestionValidator {
            lexicon: Lexicon::builtin(),
        }
    }

    /// Validate one question against the lesson's declared language
    pub fn validate(&self, question: &QuestionInput, language_tag: &str) -> QuestionVerdict {
        let mut errors = Vec::new();

        self.check_text(question, &mut errors);
        self.check_options(question, &mut errors);
        self.check_classification(question, &mut errors);
        self.check_language(question, language_tag, &mut errors);

        QuestionVerdict::from_errors(errors)
    }

    fn check_text(&self, question: &QuestionInput, errors: &mut Vec<String>) {
        let text = question.question_text.trim();

        if text.is_empty() {
            errors.push("question text is empty".to_string());
            return;
        }

        let chars = text.chars().count();
        if chars < MIN_QUESTION_CHARS {
            errors.push(format!(
                "question text under {} characters",
                MIN_QUESTION_CHARS
            ));
        }
        if chars > MAX_QUESTION_CHARS {
            errors.push(format!(
                "question text over {} characters",
                MAX_QUESTION_CHARS
            ));
        }

        if !text.ends_with(INTERROGATIVE_MARKS) {
            errors.push("question text does not end with a question mark".to_string());
        }
    }

    fn check_options(&self, question: &QuestionInput, errors: &mut Vec<String>) {
        let options = question.options;

        if options.len() < MIN_OPTIONS {
            errors.push(format!(
                "only {} option(s); at least {} required",
                options.len(),
                MIN_OPTIONS
            ));
        }
        if options.len() > MAX_OPTIONS {
            errors.push(format!(
                "{} options; at most {} allowed",
                options.len(),
                MAX_OPTIONS
            ));
        }

        if options.iter().any(|option| option.trim().is_empty()) {
            errors.push("an option is empty".to_string());
        }

        let mut seen = HashSet::new();
        if !options.iter().all(|option| seen.insert(normalize_text(option))) {
            errors.push("options contain duplicates".to_string());
        }

        match usize::try_from(question.correct_index) {
            Ok(index) if index < options.len() => {}
            _ => errors.push(format!(
                "correct index {} out of range for {} option(s)",
                question.correct_index,
                options.len()
            )),
        }

        let question_normalized = normalize_text(question.question_text);
        if !question_normalized.is_empty()
            && options
                .iter()
                .any(|option| normalize_text(option) == question_normalized)
        {
            errors.push("an option repeats the question text".to_string());
        }
    }

    fn check_classification(&self, question: &QuestionInput, errors: &mut Vec<String>) {
        match QuestionType::from_str(question.question_type) {
            Ok(QuestionType::Recall) => {
                errors.push("recall questions are not accepted".to_string());
            }
            Ok(_) => {}
            Err(_) => {
                errors.push(format!("unknown question type: {}", question.question_type));
            }
        }

        if Difficulty::from_str(question.difficulty).is_err() {
            errors.push(format!("unknown difficulty: {}", question.difficulty));
        }
    }

    /// Flag question text that is not written in the lesson's language
    fn check_language(&self, question: &QuestionInput, language_tag: &str, errors: &mut Vec<String>) {
        // Host-language quizzes ship untranslated
        if language_utils::is_host_tag(language_tag) {
            return;
        }

        let text = question.question_text.trim();
        if text.is_empty() {
            return;
        }

        let family = language_utils::declared_script(language_tag);
        if family == ScriptFamily::Latin {
            let profile = ScanProfile::for_language(self.lexicon, language_tag);
            let scan = scanner::classify_line(text, &profile);
            if scan.likely_foreign_instruction {
                errors.push(format!(
                    "question text reads as English, lesson language is {}",
                    language_utils::language_name(language_tag)
                        .unwrap_or_else(|_| language_tag.to_string())
                ));
            }
        } else if let Some(ratio) = scanner::script_letter_ratio(text, family) {
            if ratio < MIN_NATIVE_RATIO {
                errors.push(format!(
                    "question text is not in {} script ({:.0}% of letters)",
                    family.display_name(),
                    ratio * 100.0
                ));
            }
        }
    }
}
