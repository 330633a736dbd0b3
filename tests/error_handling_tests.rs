//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses carry a stable code and useful details
//! - Errors raised by real operations have the expected variants

use axum::http::StatusCode;
use axum::response::IntoResponse;
use dashspot::core::error::FieldValidationError;
use dashspot::prelude::*;
use uuid::Uuid;

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_unauthenticated_returns_401() {
        let err = DashError::Request(RequestError::Unauthenticated);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_returns_403() {
        let err = DashError::Request(RequestError::Forbidden {
            message: "not your playlist".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_validation_errors_return_400() {
        let errors = [
            ValidationError::InvalidValue {
                field: "public".to_string(),
                value: "notabool".to_string(),
                expected: "a boolean".to_string(),
            },
            ValidationError::InvalidDirection {
                field: "name".to_string(),
                value: "sideways".to_string(),
            },
            ValidationError::MissingField {
                field: "track".to_string(),
            },
        ];
        for err in errors {
            assert_eq!(DashError::from(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_not_found_returns_404() {
        let err = DashError::Storage(StorageError::NotFound {
            resource: "playlists".to_string(),
            id: Uuid::new_v4(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_config_and_lock_errors_return_500() {
        let config = DashError::Config(ConfigError::UnknownResource {
            resource: "podcasts".to_string(),
        });
        let lock = DashError::Storage(StorageError::LockPoisoned {
            mode: "read".to_string(),
            message: "poisoned".to_string(),
        });
        assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(lock.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_remote_failures_return_502() {
        let err = DashError::Sync(SyncError::Api {
            status: 500,
            message: "upstream".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            DashError::Sync(SyncError::RefreshFailed {
                message: "invalid_grant".to_string()
            })
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_error_response_has_code_and_message() {
        let err = DashError::Storage(StorageError::NotFound {
            resource: "albums".to_string(),
            id: Uuid::nil(),
        });

        let response = err.to_response();

        assert_eq!(response.code, "NOT_FOUND");
        assert!(response.message.contains("albums"));
        assert!(response.message.contains("not found"));
    }

    #[test]
    fn test_invalid_value_includes_details() {
        let err: DashError = ValidationError::InvalidValue {
            field: "num_tracks".to_string(),
            value: "lots".to_string(),
            expected: "an integer".to_string(),
        }
        .into();

        let details = err.to_response().details.unwrap();
        assert_eq!(details["field"], "num_tracks");
        assert_eq!(details["value"], "lots");
        assert_eq!(details["expected"], "an integer");
    }

    #[test]
    fn test_field_errors_include_every_field() {
        let err = DashError::Validation(ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "owner_id".to_string(),
                message: "playlist has no owner".to_string(),
            },
            FieldValidationError {
                field: "version".to_string(),
                message: "playlist has no snapshot id".to_string(),
            },
        ]));

        let details = err.to_response().details.unwrap();
        assert_eq!(details["fields"].as_array().unwrap().len(), 2);
        assert_eq!(details["fields"][0]["field"], "owner_id");
    }

    #[test]
    fn test_unauthenticated_has_no_details() {
        let response = DashError::Request(RequestError::Unauthenticated).to_response();
        assert_eq!(response.code, "UNAUTHENTICATED");
        assert!(response.details.is_none());
    }
}

// =============================================================================
// Errors raised by operations
// =============================================================================

mod operation_error_tests {
    use super::*;

    #[test]
    fn test_require_missing_record() {
        let store = LibraryStore::new();
        let id = Uuid::new_v4();

        let err = store.require::<Playlist>(id).unwrap_err();
        assert!(matches!(
            err,
            DashError::Storage(StorageError::NotFound { ref resource, id: missing })
                if resource == "playlists" && missing == id
        ));
    }

    #[test]
    fn test_analysis_for_missing_playlist() {
        let store = LibraryStore::new();
        let err = store.record_analysis(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_page_request_rejects_text() {
        let params = ParameterSet::from_query_str("page_size=ten");
        let err = PageRequest::from_params(&params, &PaginationConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue { ref field, .. } if field == "page_size"
        ));
    }

    #[test]
    fn test_anyhow_error_becomes_internal() {
        let err: DashError = anyhow::anyhow!("fixture source crashed").into();
        assert!(matches!(err, DashError::Internal(_)));
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}

// =============================================================================
// IntoResponse Tests
// =============================================================================

mod into_response_tests {
    use super::*;

    #[test]
    fn test_into_response_status() {
        let cases = [
            (
                DashError::Request(RequestError::Unauthenticated),
                StatusCode::UNAUTHORIZED,
            ),
            (
                DashError::Validation(ValidationError::InvalidDirection {
                    field: "name".to_string(),
                    value: "up".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                DashError::Sync(SyncError::ExpiredToken),
                StatusCode::UNAUTHORIZED,
            ),
            (
                DashError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
