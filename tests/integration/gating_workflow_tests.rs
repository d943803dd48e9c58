/*!
 * End-to-end tests for the quiz gating pipeline over an in-memory store
 */

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use coursewarden::errors::PipelineError;
use coursewarden::generator::MockGenerator;
use coursewarden::quiz::{
    normalize_text, option_signature, BackupStore, GateConfig, LessonAction, QuizPipeline,
    UniquenessTracker,
};
use coursewarden::store::Repository;

use crate::common;

/// Build a pipeline over the given store with backups under the temp dir
fn pipeline_with(
    repository: &Repository,
    generator: MockGenerator,
    temp_dir: &TempDir,
    config: GateConfig,
) -> QuizPipeline {
    QuizPipeline::new(
        repository.clone(),
        Arc::new(generator),
        BackupStore::new(temp_dir.path().join("backups")),
        config,
    )
}

/// A lesson that already conforms passes without a single write or
/// generator call
#[tokio::test]
async fn test_processLesson_withConformingSet_shouldPassWithoutWrites() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::seed_conforming_lesson(&repository, "course-a", 1).await?;

    let generator = MockGenerator::working();
    let pipeline = pipeline_with(&repository, generator.clone(), &temp_dir, GateConfig::default());

    let mut tracker = UniquenessTracker::new();
    let outcome = pipeline.process_lesson(&lesson, &mut tracker, None).await?;

    assert_eq!(outcome.action, LessonAction::Pass);
    assert!(!outcome.flagged_for_refinement);
    assert_eq!(outcome.replaced, 0);
    assert_eq!(outcome.inserted, 0);
    assert!(outcome.still_flagged.is_empty());
    assert!(outcome.backup_path.is_none());
    assert!(outcome.error.is_none());
    assert_eq!(outcome.before.valid, 12);
    assert_eq!(outcome.after, outcome.before);

    // No generator traffic and no store writes
    assert_eq!(generator.call_count(), 0);
    assert_eq!(repository.active_questions(&lesson.id).await?.len(), 12);

    Ok(())
}

/// A thin but valid set gets filled up to the serving targets
#[tokio::test]
async fn test_processLesson_withThinValidSet_shouldFillToTargets() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;
    for slot in 0..3 {
        repository
            .insert_question(&common::application_question(&lesson, 100 + slot, slot as i64))
            .await?;
    }

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut tracker = UniquenessTracker::new();
    let outcome = pipeline.process_lesson(&lesson, &mut tracker, None).await?;

    assert_eq!(outcome.action, LessonAction::Enriched);
    assert_eq!(outcome.replaced, 0);
    assert_eq!(outcome.inserted, 4);
    assert!(outcome.error.is_none());
    assert!(outcome.after.valid >= 7);
    assert!(outcome.after.application >= 5);
    assert!(outcome.after.critical_thinking >= 2);
    assert_eq!(outcome.after.recall, 0);

    // The snapshot preceded the first write
    let backup_path = outcome.backup_path.expect("backup should be recorded");
    assert!(std::path::Path::new(&backup_path).is_file());

    // Active questions only ever grow
    let questions = repository.active_questions(&lesson.id).await?;
    assert_eq!(questions.len(), 7);

    Ok(())
}

/// A second run over an already-gated lesson changes nothing
#[tokio::test]
async fn test_processLesson_runTwice_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;
    for slot in 0..3 {
        repository
            .insert_question(&common::application_question(&lesson, 100 + slot, slot as i64))
            .await?;
    }

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut first_tracker = UniquenessTracker::new();
    let first = pipeline
        .process_lesson(&lesson, &mut first_tracker, None)
        .await?;
    assert_eq!(first.action, LessonAction::Enriched);

    let after_first: Vec<String> = repository
        .active_questions(&lesson.id)
        .await?
        .iter()
        .map(|q| q.question_text.clone())
        .collect();

    // Each run starts its own course-wide tracker
    let mut second_tracker = UniquenessTracker::new();
    let second = pipeline
        .process_lesson(&lesson, &mut second_tracker, None)
        .await?;

    assert_eq!(second.action, LessonAction::Pass);
    assert_eq!(second.replaced, 0);
    assert_eq!(second.inserted, 0);
    assert!(second.backup_path.is_none());

    let after_second: Vec<String> = repository
        .active_questions(&lesson.id)
        .await?
        .iter()
        .map(|q| q.question_text.clone())
        .collect();
    assert_eq!(after_first, after_second);

    Ok(())
}

/// Recall and structurally broken questions are replaced in place,
/// keeping their ids and display slots
#[tokio::test]
async fn test_processLesson_withRecallAndBrokenQuestions_shouldReplaceInPlace() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;

    let mut seeded = Vec::new();
    for slot in 0..3 {
        seeded.push(common::application_question(&lesson, 100 + slot, slot as i64));
    }
    for slot in 3..5 {
        seeded.push(common::critical_question(&lesson, 100 + slot, slot as i64));
    }
    seeded.push(common::recall_question(&lesson, 105, 5));
    let mut broken = common::application_question(&lesson, 106, 6);
    broken.correct_index = 9;
    seeded.push(broken);

    let recall_id = seeded[5].id.clone();
    let broken_id = seeded[6].id.clone();
    let before_ids: HashSet<String> = seeded.iter().map(|q| q.id.clone()).collect();
    repository.insert_questions(seeded).await?;

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut tracker = UniquenessTracker::new();
    let outcome = pipeline.process_lesson(&lesson, &mut tracker, None).await?;

    assert_eq!(outcome.action, LessonAction::Enriched);
    assert_eq!(outcome.replaced, 2);
    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.after.recall, 0);
    assert!(outcome.error.is_none());

    let questions = repository.active_questions(&lesson.id).await?;
    let after_ids: HashSet<String> = questions.iter().map(|q| q.id.clone()).collect();
    assert_eq!(before_ids, after_ids);

    // The repaired rows kept their slots but changed content and type
    let repaired_recall = questions.iter().find(|q| q.id == recall_id).unwrap();
    assert_eq!(repaired_recall.display_order, 5);
    assert_ne!(repaired_recall.question_type, "recall");

    let repaired_broken = questions.iter().find(|q| q.id == broken_id).unwrap();
    assert_eq!(repaired_broken.display_order, 6);
    let correct = usize::try_from(repaired_broken.correct_index).unwrap();
    assert!(correct < repaired_broken.options.len());

    Ok(())
}

/// Within-lesson duplicates collapse to the smallest id; the others are
/// rewritten until every text and option set is unique
#[tokio::test]
async fn test_processLesson_withDuplicates_shouldCollapseToUniqueSet() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;

    let mut seeded = common::conforming_question_set(&lesson, 100);
    // Same text modulo case, different options
    seeded[1].question_text = seeded[0].question_text.to_uppercase();
    // Same options in a different order, different text
    let mut reordered = seeded[2].options.clone();
    reordered.reverse();
    seeded[3].options = reordered;

    let text_pair = (seeded[0].id.clone(), seeded[1].id.clone());
    let option_pair = (seeded[2].id.clone(), seeded[3].id.clone());
    let original_text = seeded[0].question_text.clone();
    repository.insert_questions(seeded).await?;

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut tracker = UniquenessTracker::new();
    let outcome = pipeline.process_lesson(&lesson, &mut tracker, None).await?;

    assert_eq!(outcome.action, LessonAction::Enriched);
    assert_eq!(outcome.replaced, 2);
    assert!(outcome.error.is_none());

    let questions = repository.active_questions(&lesson.id).await?;
    assert_eq!(questions.len(), 12);

    // Closure: no duplicate texts or option sets survive
    let texts: HashSet<String> = questions
        .iter()
        .map(|q| normalize_text(&q.question_text))
        .collect();
    assert_eq!(texts.len(), questions.len());
    let signatures: HashSet<String> = questions
        .iter()
        .map(|q| option_signature(&q.options))
        .collect();
    assert_eq!(signatures.len(), questions.len());

    // The lexicographically-first id of each pair kept its content
    let text_keeper = std::cmp::min(&text_pair.0, &text_pair.1);
    let keeper_row = questions.iter().find(|q| &q.id == text_keeper).unwrap();
    assert_eq!(
        normalize_text(&keeper_row.question_text),
        normalize_text(&original_text)
    );

    let option_keeper = std::cmp::min(&option_pair.0, &option_pair.1);
    let option_loser = if option_keeper == &option_pair.0 {
        &option_pair.1
    } else {
        &option_pair.0
    };
    let loser_row = questions.iter().find(|q| &q.id == option_loser).unwrap();
    let keeper_row = questions.iter().find(|q| &q.id == option_keeper).unwrap();
    assert_ne!(
        option_signature(&loser_row.options),
        option_signature(&keeper_row.options)
    );

    Ok(())
}

/// A question text accepted for one day is never accepted again for a
/// later day of the same course
#[tokio::test]
async fn test_processLesson_withCourseWideDuplicate_shouldReplaceReusedText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;

    let first = common::seed_conforming_lesson(&repository, "course-a", 1).await?;

    // Day 2 reuses day 1's first question text verbatim
    let second = common::english_lesson("course-a", 2);
    repository.insert_lesson(&second).await?;
    let mut seeded = common::conforming_question_set(&second, 200);
    seeded[0].question_text =
        "How would you roll the spacing scale out to review case 100?".to_string();
    repository.insert_questions(seeded).await?;

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut tracker = UniquenessTracker::new();
    let first_outcome = pipeline.process_lesson(&first, &mut tracker, None).await?;
    assert_eq!(first_outcome.action, LessonAction::Pass);

    let second_outcome = pipeline.process_lesson(&second, &mut tracker, None).await?;
    assert_eq!(second_outcome.action, LessonAction::Enriched);
    assert_eq!(second_outcome.replaced, 1);

    // The two days end up with disjoint normalized texts
    let first_texts: HashSet<String> = repository
        .active_questions(&first.id)
        .await?
        .iter()
        .map(|q| normalize_text(&q.question_text))
        .collect();
    let second_texts: HashSet<String> = repository
        .active_questions(&second.id)
        .await?
        .iter()
        .map(|q| normalize_text(&q.question_text))
        .collect();
    assert!(first_texts.is_disjoint(&second_texts));

    Ok(())
}

/// A backend that never yields a usable candidate ends in REWRITE_FAILED
/// with the backup already on disk and nothing deleted
#[tokio::test]
async fn test_processLesson_withExhaustedGenerator_shouldReportRewriteFailed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;
    for slot in 0..5 {
        repository
            .insert_question(&common::application_question(&lesson, 100 + slot, slot as i64))
            .await?;
    }

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::invalid(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut tracker = UniquenessTracker::new();
    let outcome = pipeline.process_lesson(&lesson, &mut tracker, None).await?;

    assert_eq!(outcome.action, LessonAction::RewriteFailed);
    assert_eq!(outcome.inserted, 0);
    let error = outcome.error.expect("final validation error expected");
    assert!(error.contains("only 5 valid"));

    // The snapshot was written before any mutation was attempted
    let backup_path = outcome.backup_path.expect("backup should be recorded");
    assert!(std::path::Path::new(&backup_path).is_file());

    // Nothing was deleted or deactivated
    assert_eq!(repository.active_questions(&lesson.id).await?.len(), 5);

    Ok(())
}

/// Dry run computes the full outcome but leaves the store and the backup
/// directory untouched
#[tokio::test]
async fn test_processLesson_withDryRun_shouldComputeWithoutWrites() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;
    for slot in 0..3 {
        repository
            .insert_question(&common::application_question(&lesson, 100 + slot, slot as i64))
            .await?;
    }

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default().with_dry_run(true),
    );

    let mut tracker = UniquenessTracker::new();
    let outcome = pipeline.process_lesson(&lesson, &mut tracker, None).await?;

    assert_eq!(outcome.action, LessonAction::Enriched);
    assert_eq!(outcome.inserted, 4);
    assert!(outcome.backup_path.is_none());

    assert_eq!(repository.active_questions(&lesson.id).await?.len(), 3);
    assert!(!temp_dir.path().join("backups").exists());

    Ok(())
}

/// Single-question mode repairs exactly the targeted slot and leaves the
/// rest of the quiz alone
#[tokio::test]
async fn test_processLesson_withQuestionFilter_shouldRepairOnlyTarget() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::english_lesson("course-a", 1);
    repository.insert_lesson(&lesson).await?;

    let mut seeded = Vec::new();
    for slot in [0usize, 1] {
        seeded.push(common::application_question(&lesson, 100 + slot, slot as i64));
    }
    seeded.push(common::recall_question(&lesson, 102, 2));
    for slot in 3..9 {
        seeded.push(common::application_question(&lesson, 100 + slot, slot as i64));
    }
    for slot in 9..12 {
        seeded.push(common::critical_question(&lesson, 100 + slot, slot as i64));
    }
    let target_id = seeded[2].id.clone();
    let untouched: Vec<(String, String)> = seeded
        .iter()
        .filter(|q| q.id != target_id)
        .map(|q| (q.id.clone(), q.question_text.clone()))
        .collect();
    repository.insert_questions(seeded).await?;

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut tracker = UniquenessTracker::new();
    let outcome = pipeline
        .process_lesson(&lesson, &mut tracker, Some(2))
        .await?;

    assert_eq!(outcome.action, LessonAction::Enriched);
    assert_eq!(outcome.replaced, 1);
    assert_eq!(outcome.inserted, 0);
    assert!(outcome.error.is_none());

    let questions = repository.active_questions(&lesson.id).await?;
    assert_eq!(questions.len(), 12);

    let repaired = questions.iter().find(|q| q.id == target_id).unwrap();
    assert_eq!(repaired.display_order, 2);
    assert_ne!(repaired.question_type, "recall");

    for (id, text) in untouched {
        let row = questions.iter().find(|q| q.id == id).unwrap();
        assert_eq!(row.question_text, text);
    }

    Ok(())
}

/// A question index beyond the quiz fails before any work is attempted
#[tokio::test]
async fn test_processLesson_withBadQuestionIndex_shouldErrorBeforeAnyWork() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let repository = Repository::new_in_memory()?;
    let lesson = common::seed_conforming_lesson(&repository, "course-a", 1).await?;

    let pipeline = pipeline_with(
        &repository,
        MockGenerator::working(),
        &temp_dir,
        GateConfig::default(),
    );

    let mut tracker = UniquenessTracker::new();
    let result = pipeline.process_lesson(&lesson, &mut tracker, Some(50)).await;

    match result {
        Err(PipelineError::QuestionIndexOutOfRange { lesson_id, index }) => {
            assert_eq!(lesson_id, lesson.id);
            assert_eq!(index, 50);
        }
        other => panic!("expected QuestionIndexOutOfRange, got {:?}", other),
    }

    // No backup, no writes
    assert!(!temp_dir.path().join("backups").exists());
    assert_eq!(repository.active_questions(&lesson.id).await?.len(), 12);

    Ok(())
}
