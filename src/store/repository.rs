/*!
 * Repository layer for store operations.
 *
 * This module provides a high-level API for all lesson and quiz question
 * access, abstracting away the SQL details and providing type-safe records.
 * Reads return rows in a stable order so repeated runs see the same
 * sequence; writes are insert or in-place update only, never delete.
 */

use anyhow::Result;
use rusqlite::{params, OptionalExtension};

use super::connection::StoreConnection;
use super::models::{LessonRecord, QuestionRecord};

/// Repository for lesson and quiz question operations
#[derive(Clone)]
pub struct Repository {
    /// Store connection
    db: StoreConnection,
}

impl Repository {
    /// Create a new repository with the given store connection
    pub fn new(db: StoreConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = StoreConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = StoreConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Access the underlying connection
    pub fn connection(&self) -> &StoreConnection {
        &self.db
    }

    // =========================================================================
    // Lesson Operations
    // =========================================================================

    /// Insert a lesson row
    pub async fn insert_lesson(&self, lesson: &LessonRecord) -> Result<()> {
        let lesson = lesson.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO lessons (
                        id, course_id, day_number, language_tag, title, content,
                        email_subject, email_body, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        lesson.id,
                        lesson.course_id,
                        lesson.day_number,
                        lesson.language_tag,
                        lesson.title,
                        lesson.content,
                        lesson.email_subject,
                        lesson.email_body,
                        lesson.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get a lesson by ID
    pub async fn get_lesson(&self, lesson_id: &str) -> Result<Option<LessonRecord>> {
        let lesson_id = lesson_id.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        r#"
                        SELECT id, course_id, day_number, language_tag, title, content,
                               email_subject, email_body, created_at
                        FROM lessons WHERE id = ?1
                        "#,
                        [&lesson_id],
                        Self::lesson_from_row,
                    )
                    .optional()?;

                Ok(result)
            })
            .await
    }

    /// Get all lessons for a course in day order
    ///
    /// Ties on day number are broken by creation time and then by id, so
    /// two runs over the same store always see the same sequence.
    pub async fn lessons_for_course(&self, course_id: &str) -> Result<Vec<LessonRecord>> {
        let course_id = course_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, course_id, day_number, language_tag, title, content,
                           email_subject, email_body, created_at
                    FROM lessons
                    WHERE course_id = ?1
                    ORDER BY day_number, created_at, id
                    "#,
                )?;

                let rows = stmt.query_map([&course_id], Self::lesson_from_row)?;

                let lessons: Vec<LessonRecord> = rows.filter_map(|r| r.ok()).collect();
                Ok(lessons)
            })
            .await
    }

    /// List the distinct course ids present in the store
    pub async fn course_ids(&self) -> Result<Vec<String>> {
        self.db
            .execute_async(|conn| {
                let mut stmt =
                    conn.prepare("SELECT DISTINCT course_id FROM lessons ORDER BY course_id")?;

                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let ids: Vec<String> = rows.filter_map(|r| r.ok()).collect();
                Ok(ids)
            })
            .await
    }

    // =========================================================================
    // Question Operations
    // =========================================================================

    /// Insert a quiz question row
    pub async fn insert_question(&self, question: &QuestionRecord) -> Result<()> {
        let question = question.clone();

        self.db
            .execute_async(move |conn| {
                let options_json = serde_json::to_string(&question.options)?;

                conn.execute(
                    r#"
                    INSERT INTO quiz_questions (
                        id, lesson_id, course_id, question_text, options, correct_index,
                        question_type, difficulty, display_order, is_active,
                        created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    "#,
                    params![
                        question.id,
                        question.lesson_id,
                        question.course_id,
                        question.question_text,
                        options_json,
                        question.correct_index,
                        question.question_type,
                        question.difficulty,
                        question.display_order,
                        question.is_active as i32,
                        question.created_at,
                        question.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Insert quiz questions in a single transaction (batch insert)
    pub async fn insert_questions(&self, questions: Vec<QuestionRecord>) -> Result<()> {
        self.db
            .transaction_async(move |tx| {
                for question in questions {
                    let options_json = serde_json::to_string(&question.options)?;

                    tx.execute(
                        r#"
                        INSERT INTO quiz_questions (
                            id, lesson_id, course_id, question_text, options, correct_index,
                            question_type, difficulty, display_order, is_active,
                            created_at, updated_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                        "#,
                        params![
                            question.id,
                            question.lesson_id,
                            question.course_id,
                            question.question_text,
                            options_json,
                            question.correct_index,
                            question.question_type,
                            question.difficulty,
                            question.display_order,
                            question.is_active as i32,
                            question.created_at,
                            question.updated_at,
                        ],
                    )?;
                }
                Ok(())
            })
            .await
    }

    /// Get the active questions for a lesson in display order
    ///
    /// Ties on display slot are broken by creation time and then by id.
    pub async fn active_questions(&self, lesson_id: &str) -> Result<Vec<QuestionRecord>> {
        let lesson_id = lesson_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, lesson_id, course_id, question_text, options, correct_index,
                           question_type, difficulty, display_order, is_active,
                           created_at, updated_at
                    FROM quiz_questions
                    WHERE lesson_id = ?1 AND is_active = 1
                    ORDER BY display_order, created_at, id
                    "#,
                )?;

                let rows = stmt.query_map([&lesson_id], Self::question_from_row)?;

                let questions: Vec<QuestionRecord> = rows.filter_map(|r| r.ok()).collect();
                Ok(questions)
            })
            .await
    }

    /// Get all active questions across a course
    ///
    /// Used to seed course-wide uniqueness checks when only a subset of
    /// lessons is being processed.
    pub async fn active_questions_for_course(
        &self,
        course_id: &str,
    ) -> Result<Vec<QuestionRecord>> {
        let course_id = course_id.to_string();

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT id, lesson_id, course_id, question_text, options, correct_index,
                           question_type, difficulty, display_order, is_active,
                           created_at, updated_at
                    FROM quiz_questions
                    WHERE course_id = ?1 AND is_active = 1
                    ORDER BY lesson_id, display_order, created_at, id
                    "#,
                )?;

                let rows = stmt.query_map([&course_id], Self::question_from_row)?;

                let questions: Vec<QuestionRecord> = rows.filter_map(|r| r.ok()).collect();
                Ok(questions)
            })
            .await
    }

    /// Replace a question's content in place
    ///
    /// The row keeps its id, display slot and active flag; only the visible
    /// content and its timestamps change. Returns the number of rows
    /// updated, which is zero when no row matches both the id and the
    /// lesson id.
    pub async fn replace_question(&self, question: &QuestionRecord) -> Result<usize> {
        let question = question.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                let options_json = serde_json::to_string(&question.options)?;

                let updated = conn.execute(
                    r#"
                    UPDATE quiz_questions
                    SET question_text = ?1, options = ?2, correct_index = ?3,
                        question_type = ?4, difficulty = ?5, updated_at = ?6
                    WHERE id = ?7 AND lesson_id = ?8
                    "#,
                    params![
                        question.question_text,
                        options_json,
                        question.correct_index,
                        question.question_type,
                        question.difficulty,
                        now,
                        question.id,
                        question.lesson_id,
                    ],
                )?;

                Ok(updated)
            })
            .await
    }

    // =========================================================================
    // Row Parsing
    // =========================================================================

    /// Parse a lesson row
    fn lesson_from_row(row: &rusqlite::Row) -> rusqlite::Result<LessonRecord> {
        Ok(LessonRecord {
            id: row.get(0)?,
            course_id: row.get(1)?,
            day_number: row.get(2)?,
            language_tag: row.get(3)?,
            title: row.get(4)?,
            content: row.get(5)?,
            email_subject: row.get(6)?,
            email_body: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    /// Parse a question row, decoding the options JSON column
    fn question_from_row(row: &rusqlite::Row) -> rusqlite::Result<QuestionRecord> {
        let options_json: String = row.get(4)?;
        let options: Vec<String> = serde_json::from_str(&options_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(QuestionRecord {
            id: row.get(0)?,
            lesson_id: row.get(1)?,
            course_id: row.get(2)?,
            question_text: row.get(3)?,
            options,
            correct_index: row.get(5)?,
            question_type: row.get(6)?,
            difficulty: row.get(7)?,
            display_order: row.get(8)?,
            is_active: row.get::<_, i32>(9)? != 0,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}
