/*!
 * Question generator implementations.
 *
 * This module contains the generation seam used to author replacement and
 * fill quiz questions:
 * - Llm: HTTP client for a local LLM server
 * - Mock: scripted generators for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;

use crate::errors::GeneratorError;
use crate::store::models::{Difficulty, QuestionRecord, QuestionType};

/// Common trait for all question generators
///
/// This trait defines the interface that all generator implementations must
/// follow, allowing the pipeline to author questions without knowing where
/// they come from.
#[async_trait]
pub trait QuestionGenerator: Send + Sync + Debug {
    /// Generate candidate questions for a lesson
    ///
    /// # Arguments
    /// * `request` - The lesson context and generation constraints
    ///
    /// # Returns
    /// * `Result<Vec<CandidateQuestion>, GeneratorError>` - Candidates or an error
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Vec<CandidateQuestion>, GeneratorError>;

    /// Test the connection to the generator backend
    ///
    /// # Returns
    /// * `Result<(), GeneratorError>` - Ok if the backend is reachable
    async fn test_connection(&self) -> Result<(), GeneratorError>;

    /// Short name of the generator, used in logs
    fn name(&self) -> &str;
}

/// Lesson context and constraints for a generation call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Course the lesson belongs to
    pub course_id: String,
    /// Lesson the questions are authored for
    pub lesson_id: String,
    /// Day number of the lesson within the course
    pub day_number: i64,
    /// Lesson title
    pub lesson_title: String,
    /// Lesson body, markup included
    pub lesson_content: String,
    /// Language the questions must be written in
    pub language_tag: String,
    /// Number of candidates to produce
    pub count: usize,
    /// Question type to favor, when the quiz is short on one
    pub preferred_type: Option<QuestionType>,
    /// Question texts already in use; candidates must not repeat them
    pub existing_questions: Vec<String>,
    /// Sampling seed for backends that support one
    pub seed: Option<u64>,
}

/// A machine-authored question before validation
///
/// Type and difficulty stay raw strings here: the backend may emit values
/// outside the accepted sets and the validator decides what to do with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQuestion {
    /// Question text
    #[serde(alias = "question")]
    pub question_text: String,
    /// Answer options
    pub options: Vec<String>,
    /// Index of the correct option
    pub correct_index: i64,
    /// Question type as emitted by the backend
    #[serde(alias = "type")]
    pub question_type: String,
    /// Difficulty as emitted by the backend
    pub difficulty: String,
}

impl CandidateQuestion {
    /// The typed question type, when the emitted string is one of the
    /// accepted values
    pub fn parsed_type(&self) -> Option<QuestionType> {
        QuestionType::from_str(&self.question_type).ok()
    }

    /// Promote a validated candidate into a storable question record
    pub fn into_record(
        self,
        lesson_id: String,
        course_id: String,
        display_order: i64,
    ) -> anyhow::Result<QuestionRecord> {
        let question_type = QuestionType::from_str(&self.question_type)?;
        let difficulty = Difficulty::from_str(&self.difficulty)?;

        Ok(QuestionRecord::new(
            lesson_id,
            course_id,
            self.question_text,
            self.options,
            self.correct_index,
            question_type,
            difficulty,
            display_order,
        ))
    }
}

pub mod llm;
pub mod mock;

pub use llm::LlmGenerator;
pub use mock::MockGenerator;
