/*!
 * Tests for error classification
 */

use docbatch::errors::{AppError, ErrorClass, ProviderError, TranslationError};

#[test]
fn test_fromStatus_shouldClassifyEveryStatusFamily() {
    let cases = [
        (400, ErrorClass::NonRetryable),
        (401, ErrorClass::NonRetryable),
        (403, ErrorClass::NonRetryable),
        (404, ErrorClass::NonRetryable),
        (422, ErrorClass::NonRetryable),
        (408, ErrorClass::Retryable),
        (429, ErrorClass::Retryable),
        (500, ErrorClass::Retryable),
        (502, ErrorClass::Retryable),
        (503, ErrorClass::Retryable),
        (504, ErrorClass::Retryable),
    ];
    for (status, expected) in cases {
        assert_eq!(ProviderError::from_status(status, "x").class(), expected, "status {}", status);
    }
}

#[test]
fn test_connectionLevelErrors_shouldBeRetryable() {
    assert!(ProviderError::ConnectionError("reset by peer".into()).is_retryable());
    assert!(ProviderError::Timeout("deadline".into()).is_retryable());
    assert!(ProviderError::RequestFailed("unexpected eof".into()).is_retryable());
    assert!(ProviderError::ParseError("truncated".into()).is_retryable());
}

#[test]
fn test_statusCode_shouldSurviveClassification() {
    assert_eq!(ProviderError::from_status(503, "down").status_code(), Some(503));
    assert_eq!(ProviderError::from_status(429, "slow").status_code(), Some(429));
    assert_eq!(ProviderError::from_status(401, "key").status_code(), None);
}

#[test]
fn test_translationError_shouldKeepSourceChain() {
    use std::error::Error;

    let error = TranslationError::UnitFailed {
        unit_id: "p7".to_string(),
        source: ProviderError::from_status(500, "boom"),
    };
    assert!(error.to_string().contains("p7"));
    assert!(error.source().is_some());

    let all = TranslationError::AllUnitsFailed {
        failed_ids: vec!["a".into(), "b".into()],
        source: ProviderError::from_status(503, "down"),
    };
    assert!(all.to_string().contains("All 2 units"));
}

#[test]
fn test_appError_shouldWrapLowerLayers() {
    let app: AppError = TranslationError::Cancelled.into();
    assert!(matches!(app, AppError::Translation(TranslationError::Cancelled)));

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert!(matches!(AppError::from(io), AppError::File(_)));
}
