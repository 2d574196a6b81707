//! Normalized outcome of an image API operation

use crate::error::{ErrorKind, ImageApiError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Uniform return shape of every [`ImageApiClient`](crate::ImageApiClient) operation.
///
/// Either a success payload (`{"photoId": "..."}`, `{"message": "..."}`) or an
/// error payload (`{"error": "..."}`), together with an HTTP-like status code.
/// Serializes as `{"status": 200, "body": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    status: u16,
    outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Map<String, Value>),
    Failure { kind: ErrorKind, message: String },
}

impl OperationResult {
    pub fn success(payload: Map<String, Value>) -> Self {
        Self {
            status: 200,
            outcome: Outcome::Success(payload),
        }
    }

    /// Success carrying a single named field
    pub fn field(name: &str, value: impl Into<Value>) -> Self {
        let mut payload = Map::new();
        payload.insert(name.to_string(), value.into());
        Self::success(payload)
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::field("message", message.into())
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status(),
            outcome: Outcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure { message, .. } => Some(message),
            Outcome::Success(_) => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Failure { kind, .. } => Some(*kind),
            Outcome::Success(_) => None,
        }
    }

    /// Look up a string field of the success payload
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(payload) => payload.get(name).and_then(Value::as_str),
            Outcome::Failure { .. } => None,
        }
    }

    /// New handle of an upload/update, if any
    pub fn photo_id(&self) -> Option<&str> {
        self.get_str("photoId")
    }

    /// JSON body for a web layer: the success payload or `{"error": message}`
    pub fn to_json(&self) -> Value {
        match &self.outcome {
            Outcome::Success(payload) => Value::Object(payload.clone()),
            Outcome::Failure { message, .. } => serde_json::json!({ "error": message }),
        }
    }

    /// Recover the typed error of a failed result
    pub fn into_error(self) -> Option<ImageApiError> {
        match self.outcome {
            Outcome::Failure { kind, message } => Some(kind.error(message)),
            Outcome::Success(_) => None,
        }
    }
}

impl From<ImageApiError> for OperationResult {
    fn from(err: ImageApiError) -> Self {
        OperationResult::failure(err.kind(), err.to_string())
    }
}

impl Serialize for OperationResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("OperationResult", 2)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("body", &self.to_json())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_json() {
        let result = OperationResult::field("photoId", "img_123");

        assert!(result.is_success());
        assert_eq!(result.status(), 200);
        assert_eq!(result.photo_id(), Some("img_123"));
        assert_eq!(result.to_json(), serde_json::json!({ "photoId": "img_123" }));
    }

    #[test]
    fn test_failure_json() {
        let result: OperationResult =
            ImageApiError::Validation("Cannot reach or find photo.".to_string()).into();

        assert!(!result.is_success());
        assert_eq!(result.status(), 422);
        assert_eq!(result.error_kind(), Some(ErrorKind::Validation));
        assert_eq!(
            result.to_json(),
            serde_json::json!({ "error": "Cannot reach or find photo." })
        );
    }

    #[test]
    fn test_serialize_wraps_status_and_body() {
        let result = OperationResult::message("Photo deleted successfully");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "status": 200,
                "body": { "message": "Photo deleted successfully" }
            })
        );
    }
}
