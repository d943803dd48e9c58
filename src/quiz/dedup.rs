/*!
 * Question duplicate detection.
 *
 * Two questions count as duplicates when their normalized texts match or
 * when their option sets match regardless of option order. Normalization
 * is lowercasing plus whitespace collapse; it deliberately keeps
 * punctuation so "Why tokens?" and "Why tokens!" stay distinct.
 */

use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Normalize question or option text for duplicate comparison
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Order-independent fingerprint of an option set
pub fn option_signature(options: &[String]) -> String {
    let mut normalized: Vec<String> = options.iter().map(|o| normalize_text(o)).collect();
    normalized.sort();

    let mut hasher = Sha256::new();
    for option in &normalized {
        hasher.update(option.as_bytes());
        // Separator keeps ["ab", "c"] and ["a", "bc"] distinct
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Course-wide record of question texts already in use
///
/// The course driver owns one tracker per course and threads it through
/// every lesson run, so a question accepted for day 3 can never be accepted
/// again for day 9. Texts are held in normalized form.
#[derive(Debug, Clone, Default)]
pub struct UniquenessTracker {
    /// Normalized question texts seen so far
    seen: HashSet<String>,
}

impl UniquenessTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of existing question texts
    pub fn seed<'a, I>(&mut self, texts: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for text in texts {
            self.seen.insert(normalize_text(text));
        }
    }

    /// Whether a question text has been recorded
    pub fn is_seen(&self, text: &str) -> bool {
        self.seen.contains(&normalize_text(text))
    }

    /// Record a question text; returns false when it was already present
    pub fn record(&mut self, text: &str) -> bool {
        self.seen.insert(normalize_text(text))
    }

    /// Number of distinct texts recorded
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
