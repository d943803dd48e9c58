/*!
 * # Coursewarden - content integrity and quiz gating
 *
 * A Rust library for gating machine-authored course content before it is
 * served to learners.
 *
 * ## Features
 *
 * - Detect English leakage in lessons written for another language
 * - Score lessons for structural completeness with remediation flags
 * - Validate quiz questions for shape, classification and language
 * - Replace and fill failing questions through a generator backend
 * - Snapshot question sets before every rewrite, with manual restore
 * - Course-wide question uniqueness tracking
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `content`: Lesson-side checks:
 *   - `content::scanner`: Line-level script and lexical leak detection
 *   - `content::integrity`: Per-language integrity reports
 *   - `content::quality`: Structural quality scoring
 *   - `content::lexicon`: Keyword and stopword tables
 * - `store`: SQLite-backed lesson and question store
 * - `generator`: Candidate question generation:
 *   - `generator::llm`: Local LLM server client
 *   - `generator::mock`: Scripted generators for tests
 * - `quiz`: Question validation and repair:
 *   - `quiz::pipeline`: The per-lesson gating orchestrator
 *   - `quiz::dedup`: Normalization and uniqueness tracking
 *   - `quiz::backup`: Snapshots and restore
 *   - `quiz::report`: Run artifacts
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code and script utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod content;
pub mod store;
pub mod generator;
pub mod quiz;
pub mod app_controller;
pub mod language_utils;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunOptions};
pub use content::{IntegrityReport, IntegrityValidator, QualityReport, QualityScorer};
pub use language_utils::{declared_script, is_host_tag, language_name};
pub use quiz::{GateConfig, LessonOutcome, QuizPipeline, RunReport};
pub use errors::{AppError, GeneratorError, PipelineError};
