/*!
 * Store module for persistent lesson and quiz content.
 *
 * This module provides SQLite-based persistence for:
 * - Lesson records as authored for each course day
 * - Quiz question records with stable display slots
 * - In-place question replacement that preserves row identity
 */

// Allow dead code and unused imports - store types are for library consumers
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::StoreConnection;
pub use models::{Difficulty, LessonRecord, QuestionRecord, QuestionType};
pub use repository::Repository;
