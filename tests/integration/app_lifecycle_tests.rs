/*!
 * Controller-level tests covering full runs, artifacts, and restore
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use coursewarden::app_controller::{Controller, RunOptions};
use coursewarden::errors::PipelineError;
use coursewarden::generator::MockGenerator;
use coursewarden::quiz::{LessonAction, RunReport};
use coursewarden::store::Repository;

use crate::common;

/// Build a controller over the temp-dir config and the given store
fn controller_with(
    temp_dir: &TempDir,
    repository: &Repository,
    generator: MockGenerator,
) -> Result<Controller> {
    Controller::with_components(
        common::test_config(temp_dir),
        repository.clone(),
        Arc::new(generator),
    )
}

/// Collect report-directory files whose names start with the given prefix
fn artifact_paths(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(prefix) {
                paths.push(entry.path());
            }
        }
    }
    paths
}

/// A clean multi-course run reports every lesson and writes the JSON
/// artifact, with no refinement list
#[tokio::test]
async fn test_run_withConformingCourses_shouldReportAndWriteArtifacts() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    common::seed_conforming_lesson(&repository, "course-a", 1).await?;
    common::seed_conforming_lesson(&repository, "course-b", 1).await?;

    let controller = controller_with(&temp_dir, &repository, MockGenerator::working())?;
    let report = controller.run(RunOptions::default()).await?;

    assert_eq!(report.totals.lessons, 2);
    assert_eq!(report.totals.passed, 2);
    assert_eq!(report.totals.enriched, 0);
    assert_eq!(report.totals.rewrite_failed, 0);
    assert_eq!(report.totals.replaced, 0);
    assert_eq!(report.totals.inserted, 0);
    assert!(report.courses.contains(&"course-a".to_string()));
    assert!(report.courses.contains(&"course-b".to_string()));

    // The JSON artifact decodes back to the same totals
    let report_dir = temp_dir.path().join("reports");
    let runs = artifact_paths(&report_dir, "run-");
    assert_eq!(runs.len(), 1);
    let decoded: RunReport = serde_json::from_str(&std::fs::read_to_string(&runs[0])?)?;
    assert_eq!(decoded.totals.lessons, 2);
    assert_eq!(decoded.totals.passed, 2);
    assert_eq!(decoded.lessons.len(), 2);

    // Nothing needed attention, so no task list was written
    assert!(artifact_paths(&report_dir, "refine-").is_empty());

    Ok(())
}

/// A lesson whose prose leaks instructional English passes the quiz gate
/// but lands on the refinement task list with the offending line quoted
#[tokio::test]
async fn test_run_withLeakedEnglishLine_shouldEmitRefineList() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;

    let mut lesson = common::hungarian_lesson("course-hu", 1);
    lesson.content = common::hungarian_content_with_leak();
    repository.insert_lesson(&lesson).await?;
    repository
        .insert_questions(common::hungarian_question_set(&lesson, 100))
        .await?;

    let controller = controller_with(&temp_dir, &repository, MockGenerator::working())?;
    let report = controller.run(RunOptions::default()).await?;

    assert_eq!(report.totals.lessons, 1);
    assert_eq!(report.totals.passed, 1);
    assert_eq!(report.totals.flagged_for_refinement, 1);
    let outcome = &report.lessons[0];
    assert_eq!(outcome.action, LessonAction::Pass);
    assert!(outcome.flagged_for_refinement);

    // The task list quotes the leaked line verbatim
    let refines = artifact_paths(&temp_dir.path().join("reports"), "refine-");
    assert_eq!(refines.len(), 1);
    let markdown = std::fs::read_to_string(&refines[0])?;
    assert!(markdown.contains("Review the baseline grid"));
    assert!(markdown.contains("course-hu"));

    Ok(())
}

/// A backend that cannot produce usable questions stops the run, but the
/// failing lesson's outcome and artifacts are still recorded
#[tokio::test]
async fn test_run_withFailingGenerator_shouldStopAndRecordFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;
    for slot in 0..5 {
        repository
            .insert_question(&common::application_question(&lesson, 100 + slot, slot as i64))
            .await?;
    }

    let controller = controller_with(&temp_dir, &repository, MockGenerator::invalid())?;
    let error = controller.run(RunOptions::default()).await.unwrap_err();

    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::BatchValidationFailed { lesson_id, reason }) => {
            assert_eq!(lesson_id, &lesson.id);
            assert!(reason.contains("only 5 valid"));
        }
        other => panic!("expected BatchValidationFailed, got {:?}", other),
    }

    // The run report covers the failed lesson
    let runs = artifact_paths(&temp_dir.path().join("reports"), "run-");
    assert_eq!(runs.len(), 1);
    let decoded: RunReport = serde_json::from_str(&std::fs::read_to_string(&runs[0])?)?;
    assert_eq!(decoded.totals.rewrite_failed, 1);
    assert!(decoded.lessons[0].error.is_some());

    // The pre-mutation snapshot is on disk
    let course_backups = temp_dir.path().join("backups").join("course-a");
    assert!(course_backups.is_dir());
    assert!(std::fs::read_dir(&course_backups)?.next().is_some());

    // The store kept every question
    assert_eq!(repository.active_questions(&lesson.id).await?.len(), 5);

    Ok(())
}

/// Restoring the latest snapshot brings back the exact pre-run questions
#[tokio::test]
async fn test_restore_afterRepair_shouldReturnOriginalQuestions() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;

    let mut seeded = common::conforming_question_set(&lesson, 100);
    seeded[2] = common::recall_question(&lesson, 102, 2);
    repository.insert_questions(seeded).await?;

    let before: HashMap<String, String> = repository
        .active_questions(&lesson.id)
        .await?
        .into_iter()
        .map(|q| (q.id, q.question_text))
        .collect();

    let controller = controller_with(&temp_dir, &repository, MockGenerator::working())?;
    let report = controller.run(RunOptions::default()).await?;
    assert_eq!(report.totals.replaced, 1);

    // The run rewrote the recall question in place
    let repaired: HashMap<String, String> = repository
        .active_questions(&lesson.id)
        .await?
        .into_iter()
        .map(|q| (q.id, q.question_text))
        .collect();
    assert_ne!(before, repaired);

    let restored = controller.restore("course-a", &lesson.id, None).await?;
    assert_eq!(restored, 12);

    let after: HashMap<String, String> = repository
        .active_questions(&lesson.id)
        .await?
        .into_iter()
        .map(|q| (q.id, q.question_text))
        .collect();
    assert_eq!(before, after);

    Ok(())
}

/// An out-of-range question filter surfaces as an index error
#[tokio::test]
async fn test_run_withQuestionFilterOutOfRange_shouldFailWithIndexError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    common::seed_conforming_lesson(&repository, "course-a", 1).await?;

    let controller = controller_with(&temp_dir, &repository, MockGenerator::working())?;
    let options = RunOptions {
        courses: vec!["course-a".to_string()],
        day: Some(1),
        question: Some(20),
        dry_run: false,
    };
    let error = controller.run(options).await.unwrap_err();

    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::QuestionIndexOutOfRange { index, .. }) => {
            assert_eq!(*index, 20);
        }
        other => panic!("expected QuestionIndexOutOfRange, got {:?}", other),
    }

    Ok(())
}

/// Dry run reports the planned work and writes the JSON artifact, while
/// the store and backup directory stay untouched
#[tokio::test]
async fn test_run_withDryRun_shouldLeaveStoreUntouched() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;
    for slot in 0..3 {
        repository
            .insert_question(&common::application_question(&lesson, 100 + slot, slot as i64))
            .await?;
    }

    let controller = controller_with(&temp_dir, &repository, MockGenerator::working())?;
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let report = controller.run(options).await?;

    assert!(report.dry_run);
    assert_eq!(report.totals.enriched, 1);
    assert_eq!(report.totals.inserted, 4);

    assert_eq!(repository.active_questions(&lesson.id).await?.len(), 3);
    assert!(!temp_dir.path().join("backups").exists());

    // The audit trail is still written
    assert_eq!(
        artifact_paths(&temp_dir.path().join("reports"), "run-").len(),
        1
    );

    Ok(())
}
