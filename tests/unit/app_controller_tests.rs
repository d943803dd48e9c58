/*!
 * Tests for controller construction and run preconditions
 */

use std::sync::Arc;

use anyhow::Result;
use coursewarden::app_controller::{Controller, RunOptions};
use coursewarden::generator::MockGenerator;
use coursewarden::store::Repository;

use crate::common;

/// Test controller construction over an in-memory store
#[test]
fn test_controller_newForTest_shouldSucceed() -> Result<()> {
    let _controller = Controller::new_for_test(Arc::new(MockGenerator::working()))?;
    Ok(())
}

/// Test controller construction from explicit components
#[test]
fn test_controller_withComponents_shouldUseGivenRepository() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let controller = Controller::with_components(
        common::test_config(&temp_dir),
        repository,
        Arc::new(MockGenerator::working()),
    )?;

    // The controller exposes the repository it was built over
    let stats = controller.repository().connection().stats()?;
    assert_eq!(stats.course_count, 0);

    Ok(())
}

/// Test the default run options
#[test]
fn test_runOptions_default_shouldSelectEverything() {
    let options = RunOptions::default();

    assert!(options.courses.is_empty());
    assert_eq!(options.day, None);
    assert_eq!(options.question, None);
    assert!(!options.dry_run);
}

/// Test that a question filter without a day filter is rejected up front
#[tokio::test]
async fn test_run_withQuestionFilterAndNoDay_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_components(
        common::test_config(&temp_dir),
        Repository::new_in_memory()?,
        Arc::new(MockGenerator::working()),
    )?;

    let result = controller
        .run(RunOptions {
            question: Some(0),
            ..RunOptions::default()
        })
        .await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("question filter requires a day filter"));

    Ok(())
}

/// Test that a day filter over more than one course is rejected up front
#[tokio::test]
async fn test_run_withDayFilterAcrossCourses_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    common::seed_conforming_lesson(&repository, "course-a", 1).await?;
    common::seed_conforming_lesson(&repository, "course-b", 1).await?;

    let controller = Controller::with_components(
        common::test_config(&temp_dir),
        repository,
        Arc::new(MockGenerator::working()),
    )?;

    let result = controller
        .run(RunOptions {
            day: Some(1),
            ..RunOptions::default()
        })
        .await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("exactly one course"));

    Ok(())
}

/// Test a run over an empty store
#[tokio::test]
async fn test_run_withEmptyStore_shouldReturnEmptyReport() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_components(
        common::test_config(&temp_dir),
        Repository::new_in_memory()?,
        Arc::new(MockGenerator::working()),
    )?;

    let report = controller.run(RunOptions::default()).await?;

    assert!(report.courses.is_empty());
    assert!(report.lessons.is_empty());
    assert_eq!(report.totals.lessons, 0);

    Ok(())
}

/// Test that a run over an unknown course warns and completes
#[tokio::test]
async fn test_run_withUnknownCourse_shouldRecordNoLessons() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_components(
        common::test_config(&temp_dir),
        Repository::new_in_memory()?,
        Arc::new(MockGenerator::working()),
    )?;

    let report = controller
        .run(RunOptions {
            courses: vec!["no-such-course".to_string()],
            ..RunOptions::default()
        })
        .await?;

    assert_eq!(report.courses, vec!["no-such-course".to_string()]);
    assert!(report.lessons.is_empty());

    Ok(())
}

/// Test restore when no snapshot was ever taken
#[tokio::test]
async fn test_restore_withNoSnapshots_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::seed_conforming_lesson(&repository, "course-a", 1).await?;

    let controller = Controller::with_components(
        common::test_config(&temp_dir),
        repository,
        Arc::new(MockGenerator::working()),
    )?;

    let result = controller.restore("course-a", &lesson.id, None).await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("No snapshot found"));

    Ok(())
}
