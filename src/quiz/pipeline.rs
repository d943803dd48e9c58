/*!
 * Quiz quality gating pipeline.
 *
 * Brings each lesson's active question set up to the serving bar: at
 * least 7 valid questions, among them at least 5 application and 2
 * critical-thinking, no recall questions, no duplicates within the
 * lesson, and no question text reused anywhere in the course. Per
 * lesson the pipeline runs:
 * 1. Gate check: language integrity and structural quality (flags only)
 * 2. Classification of existing questions
 * 3. Two-pass within-lesson dedup (text, then option signature)
 * 4. Course-wide text uniqueness against the shared tracker
 * 5. Pass-through short-circuit when every target already holds
 * 6. Repair queue: backup first, then replace flagged rows in place
 * 7. Fill queue: insert fresh questions until the shape targets hold
 * 8. Final batch re-validation deciding PASS / ENRICHED / REWRITE_FAILED
 */

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::content::integrity::{ContentUnit, IntegrityReport, IntegrityValidator};
use crate::content::lexicon::Lexicon;
use crate::content::quality::{QualityReport, QualityScorer};
use crate::errors::PipelineError;
use crate::generator::{CandidateQuestion, GenerateRequest, QuestionGenerator};
use crate::quiz::backup::{BackupSnapshot, BackupStore};
use crate::quiz::dedup::{normalize_text, option_signature, UniquenessTracker};
use crate::quiz::validator::{QuestionInput, QuestionValidator};
use crate::store::models::{LessonRecord, QuestionRecord, QuestionType};
use crate::store::Repository;

/// Fewest valid questions a lesson may serve
pub const MIN_VALID_QUESTIONS: usize = 7;

/// Fewest application-type questions among them
pub const MIN_APPLICATION_QUESTIONS: usize = 5;

/// Fewest critical-thinking questions among them
pub const MIN_CRITICAL_THINKING_QUESTIONS: usize = 2;

/// Extra fill rounds granted beyond the computed deficit
const FILL_ROUND_SLACK: usize = 2;

/// Tunable thresholds for one gating run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Quality score below which a lesson is flagged for refinement
    pub min_score: u8,

    /// Candidates requested from the generator per attempt
    pub candidates_per_attempt: usize,

    /// Generation attempts allowed per queued replacement
    pub replace_attempts: usize,

    /// Generation attempts allowed per missing question slot
    pub fill_attempts: usize,

    /// Sampling seed forwarded to backends that support one
    pub seed: Option<u64>,

    /// Compute and report everything, but suppress writes
    pub dry_run: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_score: 70,
            candidates_per_attempt: 3,
            replace_attempts: 3,
            fill_attempts: 4,
            seed: None,
            dry_run: false,
        }
    }
}

impl GateConfig {
    /// Create a configuration with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quality score below which a lesson is flagged.
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set a sampling seed for deterministic candidate generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Question-set shape at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeCounts {
    /// Active questions
    pub total: usize,

    /// Questions passing the per-question validator
    pub valid: usize,

    /// Valid application-type questions
    pub application: usize,

    /// Valid critical-thinking questions
    pub critical_thinking: usize,

    /// Questions typed recall, valid or not
    pub recall: usize,
}

impl ShapeCounts {
    /// Whether every serving target holds.
    pub fn meets_targets(&self) -> bool {
        self.valid >= MIN_VALID_QUESTIONS
            && self.application >= MIN_APPLICATION_QUESTIONS
            && self.critical_thinking >= MIN_CRITICAL_THINKING_QUESTIONS
            && self.recall == 0
    }

    /// Questions that must be added to reach the targets.
    pub fn deficit(&self) -> usize {
        let total_needed = MIN_VALID_QUESTIONS.saturating_sub(self.valid);
        let type_needed = MIN_APPLICATION_QUESTIONS.saturating_sub(self.application)
            + MIN_CRITICAL_THINKING_QUESTIONS.saturating_sub(self.critical_thinking);

        total_needed.max(type_needed)
    }
}

/// Final action recorded for one lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonAction {
    /// Everything already conformed; nothing was written
    Pass,
    /// Questions were replaced or inserted and the result validates
    Enriched,
    /// The set still fails validation after exhausting every attempt
    RewriteFailed,
}

impl fmt::Display for LessonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonAction::Pass => write!(f, "PASS"),
            LessonAction::Enriched => write!(f, "ENRICHED"),
            LessonAction::RewriteFailed => write!(f, "REWRITE_FAILED"),
        }
    }
}

/// A question queued for replacement, with the reasons it was queued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFlag {
    /// Stored question id
    pub question_id: String,
    /// One entry per failed check
    pub reasons: Vec<String>,
}

/// Everything recorded about one lesson's gating run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonOutcome {
    /// Lesson that was processed
    pub lesson_id: String,

    /// Course the lesson belongs to
    pub course_id: String,

    /// Day number within the course
    pub day_number: i64,

    /// Lesson title
    pub title: String,

    /// Final action for the lesson
    pub action: LessonAction,

    /// Whether the gate check flagged the lesson content for refinement
    pub flagged_for_refinement: bool,

    /// Language integrity result
    pub integrity: IntegrityReport,

    /// Structural quality result
    pub quality: QualityReport,

    /// Question-set shape before the run
    pub before: ShapeCounts,

    /// Question-set shape after the run
    pub after: ShapeCounts,

    /// Questions replaced in place
    pub replaced: usize,

    /// Questions inserted at new display slots
    pub inserted: usize,

    /// Questions left needing replacement after every attempt
    pub still_flagged: Vec<QuestionFlag>,

    /// Snapshot written before the first mutation attempt
    pub backup_path: Option<String>,

    /// First failed final-validation check, when the lesson failed
    pub error: Option<String>,
}

impl LessonOutcome {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        parts.push(format!("Day {} \"{}\"", self.day_number, self.title));
        parts.push(format!("action: {}", self.action));
        parts.push(format!(
            "questions: {} to {} ({} valid)",
            self.before.total, self.after.total, self.after.valid
        ));

        if self.replaced > 0 || self.inserted > 0 {
            parts.push(format!(
                "replaced: {}, inserted: {}",
                self.replaced, self.inserted
            ));
        }

        if self.flagged_for_refinement {
            parts.push("flagged for refinement".to_string());
        }

        if let Some(ref error) = self.error {
            parts.push(format!("error: {}", error));
        }

        parts.join(" | ")
    }
}

/// Normalized texts and option signatures already in use within a lesson
#[derive(Debug, Default)]
struct LessonSeenSets {
    texts: HashSet<String>,
    signatures: HashSet<String>,
}

/// The per-lesson gating orchestrator.
pub struct QuizPipeline {
    repository: Repository,
    generator: Arc<dyn QuestionGenerator>,
    backups: BackupStore,
    lexicon: Arc<Lexicon>,
    config: GateConfig,
}

impl QuizPipeline {
    /// Create a pipeline over the built-in lexicon tables.
    pub fn new(
        repository: Repository,
        generator: Arc<dyn QuestionGenerator>,
        backups: BackupStore,
        config: GateConfig,
    ) -> Self {
        Self::with_lexicon(
            repository,
            generator,
            backups,
            Arc::new(Lexicon::builtin().clone()),
            config,
        )
    }

    /// Create a pipeline over caller-supplied lexicon tables.
    pub fn with_lexicon(
        repository: Repository,
        generator: Arc<dyn QuestionGenerator>,
        backups: BackupStore,
        lexicon: Arc<Lexicon>,
        config: GateConfig,
    ) -> Self {
        Self {
            repository,
            generator,
            backups,
            lexicon,
            config,
        }
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Gate one lesson's question set.
    ///
    /// The tracker carries course-wide normalized question texts; the caller
    /// threads one tracker through every lesson of a course, in day order.
    /// With `question_filter` set, only the question at that zero-based
    /// display position is eligible for repair and the fill queue is skipped.
    ///
    /// # Arguments
    /// * `lesson` - The canonical lesson record for one day
    /// * `tracker` - Course-wide question-text seen-set
    /// * `question_filter` - Optional single-question debug filter
    ///
    /// # Returns
    /// The lesson outcome, including REWRITE_FAILED; `Err` is reserved for
    /// store, backup, and identity failures
    pub async fn process_lesson(
        &self,
        lesson: &LessonRecord,
        tracker: &mut UniquenessTracker,
        question_filter: Option<usize>,
    ) -> Result<LessonOutcome, PipelineError> {
        info!(
            "Gating quiz for course {} day {} (lesson {})",
            lesson.course_id, lesson.day_number, lesson.id
        );

        let validator = QuestionValidator::new(&self.lexicon);

        // Step 1: gate check; failures flag the lesson but never skip repair
        let integrity = IntegrityValidator::new(&self.lexicon).validate_record(&ContentUnit {
            language_tag: &lesson.language_tag,
            content: &lesson.content,
            email_subject: lesson.email_subject.as_deref(),
            email_body: lesson.email_body.as_deref(),
        });
        let quality = QualityScorer::new(&self.lexicon).assess(
            &lesson.title,
            &lesson.content,
            &lesson.language_tag,
        );
        let flagged_for_refinement = !integrity.ok || !quality.passed(self.config.min_score);
        if flagged_for_refinement {
            warn!(
                "Lesson {} flagged for refinement (integrity ok: {}, quality score: {})",
                lesson.id, integrity.ok, quality.score
            );
        }

        let mut working = self
            .repository
            .active_questions(&lesson.id)
            .await
            .map_err(|e| PipelineError::Store(e.to_string()))?;

        // Precondition: an explicit question index must exist before any work
        let target_id = match question_filter {
            Some(index) => match working.get(index) {
                Some(question) => Some(question.id.clone()),
                None => {
                    return Err(PipelineError::QuestionIndexOutOfRange {
                        lesson_id: lesson.id.clone(),
                        index,
                    });
                }
            },
            None => None,
        };

        let before = self.shape_counts(&working, &lesson.language_tag);

        // Step 2: classify existing questions
        let mut queue: Vec<QuestionFlag> = Vec::new();
        let mut survivors: Vec<usize> = Vec::new();
        for (position, question) in working.iter().enumerate() {
            let verdict = validator.validate(&QuestionInput::from(question), &lesson.language_tag);
            if verdict.is_valid {
                survivors.push(position);
            } else {
                queue.push(QuestionFlag {
                    question_id: question.id.clone(),
                    reasons: verdict.errors,
                });
            }
        }

        // Step 3: two-pass dedup among the valid ones
        queue_duplicates(
            &working,
            &mut survivors,
            &mut queue,
            |q| normalize_text(&q.question_text),
            "duplicate text of",
        );
        queue_duplicates(
            &working,
            &mut survivors,
            &mut queue,
            |q| option_signature(&q.options),
            "duplicate option set of",
        );

        // Step 4: course-wide text uniqueness, survivors walked in id order
        let mut by_id = survivors.clone();
        by_id.sort_by(|&a, &b| working[a].id.cmp(&working[b].id));
        let mut course_dropped: HashSet<usize> = HashSet::new();
        for position in by_id {
            if tracker.record(&working[position].question_text) {
                continue;
            }
            course_dropped.insert(position);
            queue.push(QuestionFlag {
                question_id: working[position].id.clone(),
                reasons: vec!["question text already used elsewhere in the course".to_string()],
            });
        }
        survivors.retain(|position| !course_dropped.contains(position));

        // In single-question mode only the targeted question gets repaired
        if let Some(ref id) = target_id {
            queue.retain(|flag| &flag.question_id == id);
        }

        let mut seen = LessonSeenSets::default();
        let mut kept_texts: Vec<String> = Vec::new();
        for &position in &survivors {
            let question = &working[position];
            seen.texts.insert(normalize_text(&question.question_text));
            seen.signatures.insert(option_signature(&question.options));
            kept_texts.push(question.question_text.clone());
        }

        // Step 5: pass-through short-circuit, zero writes
        let counts = self.shape_counts(&working, &lesson.language_tag);
        let conforming = match target_id {
            Some(_) => queue.is_empty(),
            None => queue.is_empty() && counts.meets_targets(),
        };
        if conforming {
            info!("Lesson {} already conforms, no writes", lesson.id);
            let outcome = LessonOutcome {
                lesson_id: lesson.id.clone(),
                course_id: lesson.course_id.clone(),
                day_number: lesson.day_number,
                title: lesson.title.clone(),
                action: LessonAction::Pass,
                flagged_for_refinement,
                integrity,
                quality,
                before,
                after: counts,
                replaced: 0,
                inserted: 0,
                still_flagged: Vec::new(),
                backup_path: None,
                error: None,
            };
            info!("{}", outcome.summary());
            return Ok(outcome);
        }

        // Step 6: repair queue, one item at a time. The backup precedes the
        // first mutation attempt; dry runs write nothing at all.
        let mut backup_path: Option<String> = None;
        if !self.config.dry_run {
            let snapshot = BackupSnapshot::capture(&lesson.course_id, &lesson.id, working.clone());
            let path = self.backups.write_snapshot(&snapshot)?;
            backup_path = Some(path.display().to_string());
        }

        let mut replaced = 0usize;
        let mut still_flagged: Vec<QuestionFlag> = Vec::new();

        for flag in queue {
            let position = match working.iter().position(|q| q.id == flag.question_id) {
                Some(position) => position,
                None => continue,
            };

            debug!(
                "Repairing question {} ({})",
                flag.question_id,
                flag.reasons.join("; ")
            );

            let mut repaired = false;
            for attempt in 1..=self.config.replace_attempts {
                let counts = self.shape_counts(&working, &lesson.language_tag);
                let candidates = self
                    .request_candidates(lesson, scarcest_type(&counts), &kept_texts)
                    .await;

                let candidate =
                    match self.pick_candidate(candidates, &lesson.language_tag, &seen, tracker) {
                        Some(candidate) => candidate,
                        None => {
                            debug!(
                                "Replacement attempt {}/{} for question {} produced no usable candidate",
                                attempt, self.config.replace_attempts, flag.question_id
                            );
                            continue;
                        }
                    };

                let record = match candidate.into_record(
                    lesson.id.clone(),
                    lesson.course_id.clone(),
                    working[position].display_order,
                ) {
                    Ok(mut record) => {
                        // Same identity, same display slot
                        record.id = working[position].id.clone();
                        record.created_at = working[position].created_at.clone();
                        record
                    }
                    Err(e) => {
                        debug!("Accepted candidate failed conversion: {}", e);
                        continue;
                    }
                };

                if !self.config.dry_run {
                    let matched = self
                        .repository
                        .replace_question(&record)
                        .await
                        .map_err(|e| PipelineError::Store(e.to_string()))?;
                    if matched == 0 {
                        return Err(PipelineError::IdentityDrift(record.id));
                    }
                }

                seen.texts.insert(normalize_text(&record.question_text));
                seen.signatures.insert(option_signature(&record.options));
                tracker.record(&record.question_text);
                kept_texts.push(record.question_text.clone());
                working[position] = record;
                replaced += 1;
                repaired = true;
                break;
            }

            if !repaired {
                warn!(
                    "Question {} left unrepaired after {} attempt(s)",
                    flag.question_id, self.config.replace_attempts
                );
                still_flagged.push(flag);
            }
        }

        // Step 7: fill queue, bounded by the deficit at entry
        let mut inserted = 0usize;
        if target_id.is_none() {
            let initial = self.shape_counts(&working, &lesson.language_tag);
            let budget = (initial.deficit() + FILL_ROUND_SLACK) * self.config.fill_attempts;
            let mut attempts = 0usize;

            while attempts < budget {
                let counts = self.shape_counts(&working, &lesson.language_tag);
                if counts.deficit() == 0 {
                    break;
                }
                attempts += 1;

                let candidates = self
                    .request_candidates(lesson, scarcest_type(&counts), &kept_texts)
                    .await;

                let candidate =
                    match self.pick_candidate(candidates, &lesson.language_tag, &seen, tracker) {
                        Some(candidate) => candidate,
                        None => {
                            debug!(
                                "Fill attempt {}/{} for lesson {} produced no usable candidate",
                                attempts, budget, lesson.id
                            );
                            continue;
                        }
                    };

                let next_slot = working.iter().map(|q| q.display_order).max().unwrap_or(0) + 1;
                let record = match candidate.into_record(
                    lesson.id.clone(),
                    lesson.course_id.clone(),
                    next_slot,
                ) {
                    Ok(record) => record,
                    Err(e) => {
                        debug!("Accepted candidate failed conversion: {}", e);
                        continue;
                    }
                };

                if !self.config.dry_run {
                    self.repository
                        .insert_question(&record)
                        .await
                        .map_err(|e| PipelineError::Store(e.to_string()))?;
                }

                seen.texts.insert(normalize_text(&record.question_text));
                seen.signatures.insert(option_signature(&record.options));
                tracker.record(&record.question_text);
                kept_texts.push(record.question_text.clone());
                working.push(record);
                inserted += 1;
            }
        }

        // Step 8: final batch re-validation over the full set
        let after = self.shape_counts(&working, &lesson.language_tag);
        let error = self.batch_validation_error(&working, &lesson.language_tag, target_id.as_deref());

        let action = match &error {
            Some(reason) => {
                warn!("Lesson {} failed final validation: {}", lesson.id, reason);
                LessonAction::RewriteFailed
            }
            None if replaced + inserted > 0 => LessonAction::Enriched,
            None => LessonAction::Pass,
        };

        let outcome = LessonOutcome {
            lesson_id: lesson.id.clone(),
            course_id: lesson.course_id.clone(),
            day_number: lesson.day_number,
            title: lesson.title.clone(),
            action,
            flagged_for_refinement,
            integrity,
            quality,
            before,
            after,
            replaced,
            inserted,
            still_flagged,
            backup_path,
            error,
        };
        info!("{}", outcome.summary());

        Ok(outcome)
    }

    /// Count the shape of a question set under the lesson's language.
    fn shape_counts(&self, questions: &[QuestionRecord], language_tag: &str) -> ShapeCounts {
        let validator = QuestionValidator::new(&self.lexicon);
        let mut counts = ShapeCounts {
            total: questions.len(),
            ..Default::default()
        };

        for question in questions {
            if question.parsed_type() == Some(QuestionType::Recall) {
                counts.recall += 1;
            }

            let verdict = validator.validate(&QuestionInput::from(question), language_tag);
            if !verdict.is_valid {
                continue;
            }

            counts.valid += 1;
            match question.parsed_type() {
                Some(QuestionType::Application) => counts.application += 1,
                Some(QuestionType::CriticalThinking) => counts.critical_thinking += 1,
                _ => {}
            }
        }

        counts
    }

    /// Ask the generator for one batch of candidates.
    ///
    /// Generation failures are soft: the attempt is consumed and the queue
    /// moves on, since a backend returning nothing usable must never crash
    /// the run.
    async fn request_candidates(
        &self,
        lesson: &LessonRecord,
        preferred_type: Option<QuestionType>,
        existing: &[String],
    ) -> Vec<CandidateQuestion> {
        let request = GenerateRequest {
            course_id: lesson.course_id.clone(),
            lesson_id: lesson.id.clone(),
            day_number: lesson.day_number,
            lesson_title: lesson.title.clone(),
            lesson_content: lesson.content.clone(),
            language_tag: lesson.language_tag.clone(),
            count: self.config.candidates_per_attempt,
            preferred_type,
            existing_questions: existing.to_vec(),
            seed: self.config.seed,
        };

        match self.generator.generate(&request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Candidate generation failed for lesson {}: {}", lesson.id, e);
                Vec::new()
            }
        }
    }

    /// Pick the first candidate that validates and collides with nothing.
    fn pick_candidate(
        &self,
        candidates: Vec<CandidateQuestion>,
        language_tag: &str,
        seen: &LessonSeenSets,
        tracker: &UniquenessTracker,
    ) -> Option<CandidateQuestion> {
        let validator = QuestionValidator::new(&self.lexicon);

        for candidate in candidates {
            let verdict = validator.validate(&QuestionInput::from(&candidate), language_tag);
            if !verdict.is_valid {
                debug!("Candidate rejected: {}", verdict.errors.join("; "));
                continue;
            }

            if seen.texts.contains(&normalize_text(&candidate.question_text))
                || tracker.is_seen(&candidate.question_text)
            {
                debug!("Candidate rejected: text already in use");
                continue;
            }

            if seen.signatures.contains(&option_signature(&candidate.options)) {
                debug!("Candidate rejected: option set already in use");
                continue;
            }

            return Some(candidate);
        }

        None
    }

    /// Holistic check over the final set; returns the first failure.
    fn batch_validation_error(
        &self,
        working: &[QuestionRecord],
        language_tag: &str,
        target: Option<&str>,
    ) -> Option<String> {
        let validator = QuestionValidator::new(&self.lexicon);

        if let Some(target_id) = target {
            // Single-question mode: the targeted question must validate and
            // collide with nothing else in the lesson
            let question = match working.iter().find(|q| q.id == target_id) {
                Some(question) => question,
                None => {
                    return Some(format!("question {} missing from the working set", target_id));
                }
            };

            let verdict = validator.validate(&QuestionInput::from(question), language_tag);
            if let Some(first) = verdict.errors.first() {
                return Some(format!("question {} invalid: {}", question.id, first));
            }

            let text_key = normalize_text(&question.question_text);
            if working
                .iter()
                .any(|other| other.id != question.id && normalize_text(&other.question_text) == text_key)
            {
                return Some(format!(
                    "question {} duplicates another question's text",
                    question.id
                ));
            }

            let signature = option_signature(&question.options);
            if working
                .iter()
                .any(|other| other.id != question.id && option_signature(&other.options) == signature)
            {
                return Some(format!(
                    "question {} duplicates another question's option set",
                    question.id
                ));
            }

            if let Some(answer) = question.correct_option() {
                let answer_key = normalize_text(answer);
                if working.iter().any(|other| {
                    other.id != question.id
                        && other.correct_option().map(normalize_text).as_deref()
                            == Some(answer_key.as_str())
                }) {
                    return Some(format!(
                        "question {} shares its correct answer with another question",
                        question.id
                    ));
                }
            }

            return None;
        }

        for question in working {
            let verdict = validator.validate(&QuestionInput::from(question), language_tag);
            if let Some(first) = verdict.errors.first() {
                return Some(format!("question {} invalid: {}", question.id, first));
            }
        }

        let mut texts: HashMap<String, &str> = HashMap::new();
        for question in working {
            if let Some(holder) = texts.insert(normalize_text(&question.question_text), &question.id)
            {
                return Some(format!(
                    "questions {} and {} share question text",
                    holder, question.id
                ));
            }
        }

        let mut signatures: HashMap<String, &str> = HashMap::new();
        for question in working {
            if let Some(holder) = signatures.insert(option_signature(&question.options), &question.id)
            {
                return Some(format!(
                    "questions {} and {} share an option set",
                    holder, question.id
                ));
            }
        }

        let counts = self.shape_counts(working, language_tag);
        if counts.valid < MIN_VALID_QUESTIONS {
            return Some(format!(
                "only {} valid question(s), need {}",
                counts.valid, MIN_VALID_QUESTIONS
            ));
        }
        if counts.application < MIN_APPLICATION_QUESTIONS {
            return Some(format!(
                "only {} application question(s), need {}",
                counts.application, MIN_APPLICATION_QUESTIONS
            ));
        }
        if counts.critical_thinking < MIN_CRITICAL_THINKING_QUESTIONS {
            return Some(format!(
                "only {} critical-thinking question(s), need {}",
                counts.critical_thinking, MIN_CRITICAL_THINKING_QUESTIONS
            ));
        }
        if counts.recall > 0 {
            return Some(format!("{} recall question(s) still active", counts.recall));
        }

        // No two questions may resolve to the same correct answer
        let mut answers: HashMap<String, &str> = HashMap::new();
        for question in working {
            if let Some(answer) = question.correct_option() {
                if let Some(holder) = answers.insert(normalize_text(answer), &question.id) {
                    return Some(format!(
                        "questions {} and {} share the same correct answer",
                        holder, question.id
                    ));
                }
            }
        }

        None
    }
}

/// Queue every duplicate in a survivor group, keeping the smallest id.
fn queue_duplicates<F>(
    working: &[QuestionRecord],
    survivors: &mut Vec<usize>,
    queue: &mut Vec<QuestionFlag>,
    key_of: F,
    reason: &str,
) where
    F: Fn(&QuestionRecord) -> String,
{
    let mut by_id = survivors.clone();
    by_id.sort_by(|&a, &b| working[a].id.cmp(&working[b].id));

    // Walking in id order makes the lexicographically-first id the keeper
    let mut keeper_by_key: HashMap<String, usize> = HashMap::new();
    let mut dropped: HashSet<usize> = HashSet::new();

    for position in by_id {
        let key = key_of(&working[position]);
        match keeper_by_key.get(&key) {
            Some(&keeper) => {
                dropped.insert(position);
                queue.push(QuestionFlag {
                    question_id: working[position].id.clone(),
                    reasons: vec![format!("{} question {}", reason, working[keeper].id)],
                });
            }
            None => {
                keeper_by_key.insert(key, position);
            }
        }
    }

    survivors.retain(|position| !dropped.contains(position));
}

/// The question type the lesson is currently furthest from its target on
fn scarcest_type(counts: &ShapeCounts) -> Option<QuestionType> {
    let application_needed = MIN_APPLICATION_QUESTIONS.saturating_sub(counts.application);
    let critical_needed = MIN_CRITICAL_THINKING_QUESTIONS.saturating_sub(counts.critical_thinking);

    if application_needed == 0 && critical_needed == 0 {
        None
    } else if critical_needed > application_needed {
        Some(QuestionType::CriticalThinking)
    } else {
        Some(QuestionType::Application)
    }
}

/// Collapse duplicate day numbers to their canonical record.
///
/// Canonical for a day is the oldest record, ties broken by smallest id.
/// Later records for the same day are shadows: skipped, never merged.
pub fn canonical_lessons(mut lessons: Vec<LessonRecord>) -> Vec<LessonRecord> {
    lessons.sort_by(|a, b| {
        a.day_number
            .cmp(&b.day_number)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut seen_days: HashSet<i64> = HashSet::new();
    let mut canonical = Vec::with_capacity(lessons.len());

    for lesson in lessons {
        if seen_days.insert(lesson.day_number) {
            canonical.push(lesson);
        } else {
            debug!(
                "Skipping shadow lesson {} for day {}",
                lesson.id, lesson.day_number
            );
        }
    }

    canonical
}
