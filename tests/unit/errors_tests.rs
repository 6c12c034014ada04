/*!
 * Tests for error types and conversions
 */

use phasewai::errors::{AppError, ProviderError, SubtitleError, TranslationError};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 529,
        message: "Overloaded".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("529"));
    assert!(display.contains("Overloaded"));
}

#[test]
fn test_translationError_shouldReportBatchesOneBased() {
    let error = TranslationError::ResponseValidation {
        batch: 0,
        reason: "no JSON payload found in response".to_string(),
    };
    assert_eq!(error.batch(), 0);
    assert_eq!(
        error.to_string(),
        "Batch 1 returned an invalid response: no JSON payload found in response"
    );

    let error = TranslationError::MissingIndices { batch: 2, indices: vec![71, 72] };
    assert_eq!(error.to_string(), "Batch 3 left subtitles untranslated: [71, 72]");
}

#[test]
fn test_translationError_serviceInvocation_shouldKeepSource() {
    let error = TranslationError::ServiceInvocation {
        batch: 4,
        source: ProviderError::ConnectionError("refused".to_string()),
    };

    assert!(error.to_string().starts_with("Batch 5 failed to reach the translation service"));
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_subtitleError_shouldNameTheProblem() {
    let error = SubtitleError::NonAscendingIndex { previous: 5, current: 5 };
    assert!(error.to_string().contains("5 does not follow 5"));

    let error = SubtitleError::DecodeFailure { source_name: "lesson.srt".to_string() };
    assert!(error.to_string().contains("lesson.srt"));
}

#[test]
fn test_appError_fromConversions_shouldWrap() {
    let app_error: AppError = TranslationError::ForeignIndices { batch: 0, indices: vec![99] }.into();
    assert!(matches!(app_error, AppError::Translation(_)));

    let app_error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(matches!(app_error, AppError::File(_)));

    let app_error: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(app_error, AppError::Unknown(_)));
}
