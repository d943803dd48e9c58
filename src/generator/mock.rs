/*!
 * Mock generator implementations for testing.
 *
 * This module provides mock generators that simulate different behaviors:
 * - `MockGenerator::working()` - Always succeeds with fresh, valid candidates
 * - `MockGenerator::repeating()` - Returns the same candidate on every call
 * - `MockGenerator::invalid()` - Returns candidates the validator must reject
 * - `MockGenerator::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::GeneratorError;
use crate::generator::{CandidateQuestion, GenerateRequest, QuestionGenerator};

/// Behavior mode for the mock generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with fresh, well-formed candidates
    Working,
    /// Returns the same candidate on every call, simulating a backend
    /// that has run out of ideas
    Repeating,
    /// Returns candidates that fail validation (recall type, broken index)
    Invalid,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
}

/// Mock generator for testing pipeline behavior
#[derive(Debug)]
pub struct MockGenerator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Candidate counter so fresh candidates never repeat
    candidate_count: Arc<AtomicUsize>,
    /// Seeded rng for option order shuffling
    rng: Arc<Mutex<StdRng>>,
    /// Custom candidate generator (optional)
    custom_candidates: Option<fn(&GenerateRequest) -> Vec<CandidateQuestion>>,
}

impl MockGenerator {
    /// Create a new mock generator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            candidate_count: Arc::new(AtomicUsize::new(0)),
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(0))),
            custom_candidates: None,
        }
    }

    /// Create a working mock generator that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock generator that repeats one candidate forever
    pub fn repeating() -> Self {
        Self::new(MockBehavior::Repeating)
    }

    /// Create a mock generator whose candidates fail validation
    pub fn invalid() -> Self {
        Self::new(MockBehavior::Invalid)
    }

    /// Create an intermittently failing mock generator
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock generator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Reseed the option shuffle rng
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            ..self
        }
    }

    /// Set a custom candidate generator
    pub fn with_custom_candidates(
        mut self,
        generator: fn(&GenerateRequest) -> Vec<CandidateQuestion>,
    ) -> Self {
        self.custom_candidates = Some(generator);
        self
    }

    /// Number of generate calls made so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Build one fresh, valid candidate with a unique serial
    fn fresh_candidate(&self, request: &GenerateRequest) -> CandidateQuestion {
        let serial = self.candidate_count.fetch_add(1, Ordering::SeqCst);

        let question_type = request
            .preferred_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| {
                if serial % 2 == 0 {
                    "application".to_string()
                } else {
                    "critical-thinking".to_string()
                }
            });

        let difficulty = match serial % 3 {
            0 => "easy",
            1 => "medium",
            _ => "hard",
        }
        .to_string();

        let correct_text = format!("Apply the day {} rule to case {}", request.day_number, serial);
        let mut options = vec![
            format!("Ignore the lesson entirely in case {}", serial),
            correct_text.clone(),
            format!("Postpone the decision for case {}", serial),
            format!("Copy an unrelated example in case {}", serial),
        ];

        {
            let mut rng = self.rng.lock().unwrap();
            options.shuffle(&mut *rng);
        }

        let correct_index = options
            .iter()
            .position(|option| option == &correct_text)
            .unwrap_or(0) as i64;

        CandidateQuestion {
            question_text: format!(
                "How would you apply '{}' to practice case {}?",
                request.lesson_title, serial
            ),
            options,
            correct_index,
            question_type,
            difficulty,
        }
    }

    /// The candidate the repeating generator always returns
    fn repeated_candidate() -> CandidateQuestion {
        CandidateQuestion {
            question_text: "Which principle does this course repeat on every single day?"
                .to_string(),
            options: vec![
                "There is no principle".to_string(),
                "Consistency beats intensity".to_string(),
                "Speed beats everything".to_string(),
            ],
            correct_index: 1,
            question_type: "application".to_string(),
            difficulty: "medium".to_string(),
        }
    }

    /// Build a candidate the validator must reject
    fn invalid_candidate(&self) -> CandidateQuestion {
        let serial = self.candidate_count.fetch_add(1, Ordering::SeqCst);

        if serial % 2 == 0 {
            // Recall questions are never accepted
            CandidateQuestion {
                question_text: format!("What exact sentence appears in lesson case {}?", serial),
                options: vec![
                    "The first sentence".to_string(),
                    "The last sentence".to_string(),
                ],
                correct_index: 0,
                question_type: "recall".to_string(),
                difficulty: "easy".to_string(),
            }
        } else {
            // Correct index points outside the options
            CandidateQuestion {
                question_text: format!("Which option resolves case {}?", serial),
                options: vec!["Only option".to_string(), "Other option".to_string()],
                correct_index: 5,
                question_type: "application".to_string(),
                difficulty: "medium".to_string(),
            }
        }
    }
}

impl Clone for MockGenerator {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            candidate_count: Arc::clone(&self.candidate_count),
            rng: Arc::clone(&self.rng),
            custom_candidates: self.custom_candidates,
        }
    }
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Vec<CandidateQuestion>, GeneratorError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => {
                // Use custom candidates if set, otherwise generate fresh ones
                if let Some(generator) = self.custom_candidates {
                    return Ok(generator(request));
                }

                let candidates = (0..request.count)
                    .map(|_| self.fresh_candidate(request))
                    .collect();
                Ok(candidates)
            }

            MockBehavior::Repeating => {
                Ok(vec![Self::repeated_candidate(); request.count.max(1)])
            }

            MockBehavior::Invalid => {
                let candidates = (0..request.count.max(1))
                    .map(|_| self.invalid_candidate())
                    .collect();
                Ok(candidates)
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(GeneratorError::ApiError {
                        message: format!(
                            "Simulated intermittent failure (request #{})",
                            count + 1
                        ),
                        status_code: 503,
                    })
                } else {
                    let candidates = (0..request.count)
                        .map(|_| self.fresh_candidate(request))
                        .collect();
                    Ok(candidates)
                }
            }

            MockBehavior::Failing => Err(GeneratorError::ApiError {
                message: "Simulated generator failure".to_string(),
                status_code: 500,
            }),
        }
    }

    async fn test_connection(&self) -> Result<(), GeneratorError> {
        match self.behavior {
            MockBehavior::Failing => Err(GeneratorError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
