use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductSourceError;

/// The persisted progress pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Next unprocessed position in the product list.
    #[serde(default, alias = "current_row")]
    pub current_index: usize,
    /// When the pointer last advanced.
    #[serde(default, alias = "last_run")]
    pub last_run_timestamp: Option<DateTime<Utc>>,
}

/// Errors raised by the run state tracker.
#[derive(Debug, Error)]
pub enum StateError {
    /// The new state could not be written; the pointer did not move.
    #[error("failed to persist run state: {0}")]
    Persistence(String),

    /// The persisted state exists but could not be read.
    #[error("failed to load run state: {0}")]
    Load(String),

    /// The product list could not be fetched.
    #[error("product source error: {0}")]
    Source(#[from] ProductSourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_serialization_shape() {
        let state = RunState {
            current_index: 4,
            last_run_timestamp: None,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["current_index"], 4);
        assert!(json["last_run_timestamp"].is_null());
    }

    #[test]
    fn test_run_state_accepts_legacy_keys() {
        let json = r#"{"current_row": 7, "last_run": "2024-03-01T09:00:00Z"}"#;
        let state: RunState = serde_json::from_str(json).unwrap();
        assert_eq!(state.current_index, 7);
        assert!(state.last_run_timestamp.is_some());
    }

    #[test]
    fn test_error_display() {
        let err = StateError::Persistence("disk full".to_string());
        assert_eq!(err.to_string(), "failed to persist run state: disk full");
    }
}
