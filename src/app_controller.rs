use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Once;
use url::Url;

use crate::app_config::Config;
use crate::content::Lexicon;
use crate::errors::PipelineError;
use crate::generator::{LlmGenerator, QuestionGenerator};
use crate::quiz::{
    canonical_lessons, restore_snapshot, BackupStore, GateConfig, LessonAction, QuizPipeline,
    ReportWriter, RunReport, UniquenessTracker,
};
use crate::store::{Repository, StoreConnection};

// @module: Application controller for course gating runs

/// Options for one gating run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    // @field: Course ids to process; all stored courses when empty
    pub courses: Vec<String>,

    // @field: Restrict the run to a single day's lesson
    pub day: Option<i64>,

    // @field: Zero-based question position to repair in isolation
    pub question: Option<usize>,

    // @field: Compute and report without writing store or backup state
    pub dry_run: bool,
}

/// Main application controller for lesson and quiz gating
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Lesson and question store
    repository: Repository,

    // @field: Candidate question generator
    generator: Arc<dyn QuestionGenerator>,

    // @field: Keyword tables the content checks run with
    lexicon: Arc<Lexicon>,
}

impl Controller {
    /// Create a new controller for test purposes with an in-memory store
    pub fn new_for_test(generator: Arc<dyn QuestionGenerator>) -> Result<Self> {
        let repository = Repository::new_in_memory()?;
        Self::with_components(Config::default(), repository, generator)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let repository = match &config.storage.db_path {
            Some(path) => Repository::new(StoreConnection::new(path)?),
            None => Repository::new_default()?,
        };

        let (host, port) = parse_endpoint(&config.generator.endpoint)?;
        let generator: Arc<dyn QuestionGenerator> = Arc::new(LlmGenerator::new_with_config(
            host,
            port,
            config.generator.model.clone(),
            config.generator.retry_count,
            config.generator.retry_backoff_ms,
            config.generator.temperature,
        ));

        Self::with_components(config, repository, generator)
    }

    // @method: Create a controller over explicit store and generator instances
    pub fn with_components(
        config: Config,
        repository: Repository,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Result<Self> {
        let lexicon = match &config.storage.lexicon_path {
            Some(path) => Arc::new(Lexicon::from_file(path)?),
            None => Arc::new(Lexicon::builtin().clone()),
        };

        Ok(Self {
            config,
            repository,
            generator,
            lexicon,
        })
    }

    /// Access the store the controller runs against
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Run the gating workflow over the selected courses.
    ///
    /// Every processed lesson is recorded in the returned report and the
    /// report artifacts are written even when a hard failure stops the run
    /// partway. A lesson that ends in REWRITE_FAILED stops the invocation
    /// with an error after its outcome has been recorded.
    pub async fn run(&self, options: RunOptions) -> Result<RunReport> {
        let start_time = std::time::Instant::now();

        if options.question.is_some() && options.day.is_none() {
            return Err(anyhow!("A question filter requires a day filter"));
        }

        let courses = if options.courses.is_empty() {
            self.repository.course_ids().await?
        } else {
            options.courses.clone()
        };

        if options.day.is_some() && courses.len() != 1 {
            return Err(anyhow!(
                "A day filter requires exactly one course, {} selected",
                courses.len()
            ));
        }

        if courses.is_empty() {
            warn!("Store has no courses to process");
        }

        if options.dry_run {
            info!("Dry run: store and backup writes are suppressed");
        }

        // Probe the generator backend once per process, in the background
        static INIT_TEST: Once = Once::new();
        INIT_TEST.call_once(|| {
            let generator = Arc::clone(&self.generator);
            tokio::spawn(async move {
                if let Err(e) = generator.test_connection().await {
                    warn!("Generator backend check failed: {}", e);
                }
            });
        });

        let mut report = RunReport::new(&self.gate_config(&options));
        let mut failure: Option<PipelineError> = None;

        for course_id in &courses {
            info!("Processing course {}", course_id);
            report.record_course(course_id);

            if let Err(e) = self
                .process_course(course_id, &options, &mut report)
                .await
            {
                error!("Stopping run on course {}: {}", course_id, e);
                failure = Some(e);
                break;
            }
        }

        // Artifacts cover everything processed up to a failure
        let writer = ReportWriter::new(&self.config.storage.report_dir);
        writer.write_run_report(&report)?;
        if let Some(path) = writer.write_refine_list(&report)? {
            info!("Refinement tasks written to {:?}", path);
        }

        match self.repository.connection().stats() {
            Ok(stats) => info!(
                "Store: {} course(s), {} lesson(s), {} question(s) ({} active)",
                stats.course_count,
                stats.lesson_count,
                stats.question_count,
                stats.active_question_count
            ),
            Err(e) => debug!("Could not read store statistics: {}", e),
        }

        info!(
            "Gating run completed in {}: {}",
            Self::format_duration(start_time.elapsed()),
            report.summary()
        );

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(report),
        }
    }

    /// Gate every lesson of one course, recording outcomes into the report.
    ///
    /// Hard failures return an error after the failing lesson's outcome has
    /// been recorded; batch callers that want to continue with the next
    /// course can call this per course and collect the errors.
    pub async fn process_course(
        &self,
        course_id: &str,
        options: &RunOptions,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        let lessons = self
            .repository
            .lessons_for_course(course_id)
            .await
            .map_err(|e| PipelineError::Store(e.to_string()))?;
        let lessons = canonical_lessons(lessons);

        if lessons.is_empty() {
            warn!("No lessons found for course {}", course_id);
            return Ok(());
        }

        let lessons = match options.day {
            Some(day) => {
                let filtered: Vec<_> = lessons
                    .into_iter()
                    .filter(|lesson| lesson.day_number == day)
                    .collect();
                if filtered.is_empty() {
                    return Err(PipelineError::LessonNotFound(format!(
                        "course {} has no lesson for day {}",
                        course_id, day
                    )));
                }
                filtered
            }
            None => lessons,
        };

        // Course-wide uniqueness spans lessons outside a day filter too
        let mut tracker = UniquenessTracker::new();
        if options.day.is_some() {
            let course_questions = self
                .repository
                .active_questions_for_course(course_id)
                .await
                .map_err(|e| PipelineError::Store(e.to_string()))?;
            let selected: HashSet<&str> = lessons.iter().map(|l| l.id.as_str()).collect();
            tracker.seed(
                course_questions
                    .iter()
                    .filter(|q| !selected.contains(q.lesson_id.as_str()))
                    .map(|q| q.question_text.as_str()),
            );
        }

        let pipeline = self.build_pipeline(options);

        let course_pb = ProgressBar::new(lessons.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lessons ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        course_pb.set_style(template_result.progress_chars("█▓▒░"));
        course_pb.set_message(format!("Course {}", course_id));

        for lesson in &lessons {
            course_pb.set_message(format!("Day {}: {}", lesson.day_number, lesson.title));

            let outcome = match pipeline
                .process_lesson(lesson, &mut tracker, options.question)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    course_pb.abandon_with_message(format!("Stopped at day {}", lesson.day_number));
                    return Err(e);
                }
            };

            let failed = outcome.action == LessonAction::RewriteFailed;
            let reason = outcome.error.clone();
            report.record(outcome);
            course_pb.inc(1);

            if failed {
                course_pb.abandon_with_message(format!("Failed at day {}", lesson.day_number));
                return Err(PipelineError::BatchValidationFailed {
                    lesson_id: lesson.id.clone(),
                    reason: reason.unwrap_or_else(|| "batch validation failed".to_string()),
                });
            }
        }

        course_pb.finish_and_clear();
        info!("Course {} complete: {} lesson(s)", course_id, lessons.len());

        Ok(())
    }

    /// Restore a lesson's question set from a backup snapshot.
    ///
    /// Without an explicit snapshot path the most recent snapshot for the
    /// lesson is used. Returns the number of restored questions.
    pub async fn restore(
        &self,
        course_id: &str,
        lesson_id: &str,
        snapshot_path: Option<PathBuf>,
    ) -> Result<usize> {
        let backups = BackupStore::new(&self.config.storage.backup_dir);

        let path = match snapshot_path {
            Some(path) => path,
            None => backups
                .latest_for_lesson(course_id, lesson_id)?
                .ok_or_else(|| {
                    anyhow!(
                        "No snapshot found for lesson {} of course {}",
                        lesson_id,
                        course_id
                    )
                })?,
        };

        let snapshot = BackupStore::load_snapshot(&path)?;
        if snapshot.course_id != course_id || snapshot.lesson_id != lesson_id {
            return Err(anyhow!(
                "Snapshot {:?} belongs to lesson {} of course {}, not lesson {} of course {}",
                path,
                snapshot.lesson_id,
                snapshot.course_id,
                lesson_id,
                course_id
            ));
        }

        info!(
            "Restoring {} question(s) for lesson {} from {:?}",
            snapshot.questions.len(),
            lesson_id,
            path
        );
        let restored = restore_snapshot(&self.repository, &snapshot).await?;
        info!("Restored {} question(s)", restored);

        Ok(restored)
    }

    /// Assemble the pipeline thresholds for one run
    fn gate_config(&self, options: &RunOptions) -> GateConfig {
        GateConfig {
            min_score: self.config.gate.min_score,
            candidates_per_attempt: self.config.gate.candidates_per_attempt,
            replace_attempts: self.config.gate.replace_attempts,
            fill_attempts: self.config.gate.fill_attempts,
            seed: self.config.generator.seed,
            dry_run: options.dry_run,
        }
    }

    fn build_pipeline(&self, options: &RunOptions) -> QuizPipeline {
        QuizPipeline::with_lexicon(
            self.repository.clone(),
            Arc::clone(&self.generator),
            BackupStore::new(&self.config.storage.backup_dir),
            Arc::clone(&self.lexicon),
            self.gate_config(options),
        )
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Split a generator endpoint into host and port
fn parse_endpoint(endpoint: &str) -> Result<(String, u16)> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Invalid host in endpoint: {}", endpoint))?
        .to_string();

    let port = url
        .port()
        .unwrap_or(if url.scheme() == "https" { 443 } else { 80 });

    Ok((host, port))
}
