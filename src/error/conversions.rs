//! Type conversions into `AssistantError`

use super::types::AssistantError;

impl From<serde_json::Error> for AssistantError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}
