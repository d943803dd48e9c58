/*!
 * Line-level script and lexical heuristics.
 *
 * The scanner decides whether a single physical line of plain text
 * looks like a leaked host-language fragment inside content declared
 * as another language. It is pure and stateless; all language-specific
 * data comes in through a `ScanProfile` built from the lexicon.
 */

use std::collections::HashSet;

use crate::content::lexicon::Lexicon;
use crate::language_utils::ScriptFamily;

/// Lines shorter than this are never flagged
pub const MIN_SCANNABLE_CHARS: usize = 20;

/// Non-Latin letter ratio at which a line counts as non-Latin-dominant
/// and is exempt from the stopword heuristic
pub const NON_LATIN_EXEMPT_RATIO: f64 = 0.4;

/// Stopword density threshold for flagging a line
pub const STOPWORD_DENSITY_THRESHOLD: f64 = 0.25;

/// Minimum stopword matches before density is considered
pub const MIN_STOPWORD_MATCHES: usize = 3;

/// Minimum token count before density is considered
pub const MIN_TOKENS_FOR_DENSITY: usize = 6;

/// Result of classifying one line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineScan {
    /// Fraction of letters outside the Latin script, 0.0 when no letters
    pub non_latin_ratio: f64,
    /// Whether the line looks like a leaked host-language fragment
    pub likely_foreign_instruction: bool,
}

/// Per-language view of the lexicon used by `classify_line`
pub struct ScanProfile<'a> {
    stopwords: HashSet<&'a str>,
    instruction_verbs: HashSet<&'a str>,
}

impl<'a> ScanProfile<'a> {
    /// Build the profile for one content language
    pub fn for_language(lexicon: &'a Lexicon, language_tag: &str) -> Self {
        ScanProfile {
            stopwords: lexicon.stopwords_for(language_tag),
            instruction_verbs: lexicon.instruction_verb_set(),
        }
    }
}

/// Classify a single physical line.
///
/// The instruction-verb prefix is a strong signal on its own. The
/// stopword-density heuristic only applies to lines that are not
/// non-Latin-dominant, so a quoted native-script phrase containing a
/// couple of host-language words never trips it.
pub fn classify_line(line: &str, profile: &ScanProfile) -> LineScan {
    let trimmed = line.trim();
    let non_latin_ratio = non_latin_letter_ratio(trimmed);

    // Too short to be reliable
    if trimmed.chars().count() < MIN_SCANNABLE_CHARS {
        return LineScan {
            non_latin_ratio,
            likely_foreign_instruction: false,
        };
    }

    let tokens = letter_tokens(trimmed);

    if let Some(first) = tokens.first() {
        if profile.instruction_verbs.contains(first.as_str()) {
            return LineScan {
                non_latin_ratio,
                likely_foreign_instruction: true,
            };
        }
    }

    if non_latin_ratio >= NON_LATIN_EXEMPT_RATIO {
        return LineScan {
            non_latin_ratio,
            likely_foreign_instruction: false,
        };
    }

    if tokens.len() >= MIN_TOKENS_FOR_DENSITY {
        let matches = tokens
            .iter()
            .filter(|token| profile.stopwords.contains(token.as_str()))
            .count();
        let density = matches as f64 / tokens.len() as f64;

        if matches >= MIN_STOPWORD_MATCHES && density >= STOPWORD_DENSITY_THRESHOLD {
            return LineScan {
                non_latin_ratio,
                likely_foreign_instruction: true,
            };
        }
    }

    LineScan {
        non_latin_ratio,
        likely_foreign_instruction: false,
    }
}

/// Fraction of letters outside the Latin script among all letters
pub fn non_latin_letter_ratio(text: &str) -> f64 {
    let mut letters = 0usize;
    let mut non_latin = 0usize;

    for c in text.chars() {
        if c.is_alphabetic() {
            letters += 1;
            if !ScriptFamily::Latin.contains(c) {
                non_latin += 1;
            }
        }
    }

    if letters == 0 {
        0.0
    } else {
        non_latin as f64 / letters as f64
    }
}

/// Fraction of letters belonging to one script family, `None` when the
/// text has no letters at all
pub fn script_letter_ratio(text: &str, family: ScriptFamily) -> Option<f64> {
    let mut letters = 0usize;
    let mut in_script = 0usize;

    for c in text.chars() {
        if c.is_alphabetic() {
            letters += 1;
            if family.contains(c) {
                in_script += 1;
            }
        }
    }

    if letters == 0 {
        None
    } else {
        Some(in_script as f64 / letters as f64)
    }
}

/// Maximal contiguous stretches of one script, returned as snippets.
///
/// A run extends over letters of the family plus digits and joining
/// punctuation, and counts once its letter total reaches `min_letters`.
/// Runs never span line breaks.
pub fn script_runs(text: &str, family: ScriptFamily, min_letters: usize) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut letter_count = 0usize;

    for c in text.chars() {
        let is_run_letter = family.contains(c);
        let is_joiner = c.is_ascii_digit()
            || matches!(
                c,
                ' ' | '\t' | '-' | '\'' | '.' | ',' | '&' | '/' | '(' | ')' | ':' | '"'
            );

        if is_run_letter || is_joiner {
            current.push(c);
            if is_run_letter {
                letter_count += 1;
            }
        } else {
            if letter_count >= min_letters {
                runs.push(current.trim().to_string());
            }
            current.clear();
            letter_count = 0;
        }
    }

    if letter_count >= min_letters {
        runs.push(current.trim().to_string());
    }

    runs
}

/// Tokenize into lowercase letter-only tokens
fn letter_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}
