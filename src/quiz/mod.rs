/*!
 * Quiz validation and repair for gated lessons.
 *
 * This module contains the quiz-side half of the gating pipeline. It is
 * split into several submodules:
 *
 * - `validator`: structural and language checks for a single question
 * - `dedup`: text normalization, option signatures and course-wide
 *   uniqueness tracking
 * - `backup`: pre-mutation snapshots and restore support
 * - `pipeline`: the per-lesson repair orchestrator
 * - `report`: run report and refinement task list artifacts
 */

// Re-export main types for easier usage
pub use self::backup::{restore_snapshot, BackupSnapshot, BackupStore};
pub use self::dedup::{normalize_text, option_signature, UniquenessTracker};
pub use self::pipeline::{
    canonical_lessons, GateConfig, LessonAction, LessonOutcome, QuestionFlag, QuizPipeline,
    ShapeCounts,
};
pub use self::report::{ReportWriter, RunReport, RunTotals};
pub use self::validator::{QuestionInput, QuestionValidator, QuestionVerdict};

// Submodules
pub mod backup;
pub mod dedup;
pub mod pipeline;
pub mod report;
pub mod validator;
