/*!
 * Store entity models.
 *
 * These structures map directly to database tables. Question type and
 * difficulty are persisted as raw strings: stored rows are
 * machine-authored and may carry values outside the accepted sets, and
 * such rows must load cleanly so the pipeline can classify and replace
 * them instead of failing the read.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Accepted quiz question types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// Apply the lesson to a concrete situation
    Application,
    /// Reason about trade-offs or consequences
    CriticalThinking,
    /// Repeat a stated fact; rejected by the validator
    Recall,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Application => write!(f, "application"),
            QuestionType::CriticalThinking => write!(f, "critical-thinking"),
            QuestionType::Recall => write!(f, "recall"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "application" => Ok(QuestionType::Application),
            "critical-thinking" | "critical_thinking" => Ok(QuestionType::CriticalThinking),
            "recall" => Ok(QuestionType::Recall),
            _ => Err(anyhow::anyhow!("Invalid question type: {}", s)),
        }
    }
}

/// Accepted question difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(anyhow::anyhow!("Invalid difficulty: {}", s)),
        }
    }
}

/// Lesson record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    /// Unique lesson identifier (UUID)
    pub id: String,
    /// Course this lesson belongs to
    pub course_id: String,
    /// Day number within the course; duplicates possible
    pub day_number: i64,
    /// Declared content language
    pub language_tag: String,
    /// Lesson title
    pub title: String,
    /// Lesson body, may contain markup
    pub content: String,
    /// Optional email subject line
    pub email_subject: Option<String>,
    /// Optional email body, may contain markup
    pub email_body: Option<String>,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

impl LessonRecord {
    /// Create a new lesson record with a fresh id and timestamp
    pub fn new(
        course_id: String,
        day_number: i64,
        language_tag: String,
        title: String,
        content: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            course_id,
            day_number,
            language_tag,
            title,
            content,
            email_subject: None,
            email_body: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Quiz question record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Unique question identifier (UUID)
    pub id: String,
    /// Lesson this question belongs to
    pub lesson_id: String,
    /// Course the lesson belongs to, denormalized for course-wide checks
    pub course_id: String,
    /// Question text
    pub question_text: String,
    /// Answer options, stored as a JSON array column
    pub options: Vec<String>,
    /// Index of the correct option
    pub correct_index: i64,
    /// Raw question type string; see module docs
    pub question_type: String,
    /// Raw difficulty string; see module docs
    pub difficulty: String,
    /// Stable display slot within the lesson quiz
    pub display_order: i64,
    /// Whether the question is currently served
    pub is_active: bool,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Last update timestamp (ISO 8601)
    pub updated_at: String,
}

impl QuestionRecord {
    /// Create a new question record with a fresh id and timestamps
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lesson_id: String,
        course_id: String,
        question_text: String,
        options: Vec<String>,
        correct_index: i64,
        question_type: QuestionType,
        difficulty: Difficulty,
        display_order: i64,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            lesson_id,
            course_id,
            question_text,
            options,
            correct_index,
            question_type: question_type.to_string(),
            difficulty: difficulty.to_string(),
            display_order,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// The typed question type, when the stored string is one of the
    /// accepted values
    pub fn parsed_type(&self) -> Option<QuestionType> {
        QuestionType::from_str(&self.question_type).ok()
    }

    /// The correct answer's text, when the index is in range
    pub fn correct_option(&self) -> Option<&str> {
        usize::try_from(self.correct_index)
            .ok()
            .and_then(|idx| self.options.get(idx))
            .map(String::as_str)
    }
}
