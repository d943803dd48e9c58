/*!
 * Tests for error types and conversions
 */

use coursewarden::errors::{AppError, GeneratorError, PipelineError};

#[test]
fn test_generatorError_requestFailed_shouldDisplayCorrectly() {
    let error = GeneratorError::RequestFailed("Connection timeout".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Generator request failed"));
    assert!(display.contains("Connection timeout"));
}

#[test]
fn test_generatorError_parseError_shouldDisplayCorrectly() {
    let error = GeneratorError::ParseError("Invalid JSON".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Failed to parse generator response"));
    assert!(display.contains("Invalid JSON"));
}

#[test]
fn test_generatorError_apiError_shouldDisplayStatusAndMessage() {
    let error = GeneratorError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_generatorError_connectionError_shouldDisplayCorrectly() {
    let error = GeneratorError::ConnectionError("Host unreachable".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Connection error"));
    assert!(display.contains("Host unreachable"));
}

#[test]
fn test_pipelineError_lessonNotFound_shouldDisplayLessonId() {
    let error = PipelineError::LessonNotFound("lesson-42".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Lesson not found"));
    assert!(display.contains("lesson-42"));
}

#[test]
fn test_pipelineError_questionIndexOutOfRange_shouldDisplayBothParts() {
    let error = PipelineError::QuestionIndexOutOfRange {
        lesson_id: "lesson-42".to_string(),
        index: 9,
    };
    let display = format!("{}", error);
    assert!(display.contains("index 9"));
    assert!(display.contains("lesson-42"));
}

#[test]
fn test_pipelineError_identityDrift_shouldDisplayQuestionId() {
    let error = PipelineError::IdentityDrift("question-7".to_string());
    let display = format!("{}", error);
    assert!(display.contains("identity drift"));
    assert!(display.contains("question-7"));
}

#[test]
fn test_pipelineError_batchValidationFailed_shouldDisplayReason() {
    let error = PipelineError::BatchValidationFailed {
        lesson_id: "lesson-42".to_string(),
        reason: "only 5 valid question(s), need 7".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("failed validation"));
    assert!(display.contains("lesson-42"));
    assert!(display.contains("only 5 valid question(s)"));
}

#[test]
fn test_pipelineError_fromGeneratorError_shouldWrapCorrectly() {
    let generator_error = GeneratorError::RequestFailed("Test error".to_string());
    let pipeline_error: PipelineError = generator_error.into();
    let display = format!("{}", pipeline_error);
    assert!(display.contains("Generator error"));
    assert!(display.contains("Test error"));
}

#[test]
fn test_appError_fromGeneratorError_shouldWrapCorrectly() {
    let generator_error = GeneratorError::ConnectionError("Network down".to_string());
    let app_error: AppError = generator_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Generator error"));
}

#[test]
fn test_appError_fromPipelineError_shouldWrapCorrectly() {
    let pipeline_error = PipelineError::Store("database locked".to_string());
    let app_error: AppError = pipeline_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Pipeline error"));
    assert!(display.contains("database locked"));
}

#[test]
fn test_appError_fromIoError_shouldWrapAsFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    let app_error: AppError = io_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("File error"));
    assert!(display.contains("File not found"));
}

#[test]
fn test_appError_fromAnyhowError_shouldWrapAsUnknown() {
    let anyhow_error = anyhow::anyhow!("Something went wrong");
    let app_error: AppError = anyhow_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Unknown error"));
    assert!(display.contains("Something went wrong"));
}

#[test]
fn test_appError_config_shouldDisplayCorrectly() {
    let error = AppError::Config("min_score out of range".to_string());
    let display = format!("{}", error);
    assert!(display.contains("Config error"));
    assert!(display.contains("min_score out of range"));
}

#[test]
fn test_pipelineError_debug_shouldBeImplemented() {
    let error = PipelineError::Backup("disk full".to_string());
    let debug = format!("{:?}", error);
    assert!(debug.contains("Backup"));
}

#[test]
fn test_generatorError_debug_shouldBeImplemented() {
    let error = GeneratorError::RateLimitExceeded("slow down".to_string());
    let debug = format!("{:?}", error);
    assert!(debug.contains("RateLimitExceeded"));
}
