//! JSON response envelopes.
//!
//! The route layer serializes results into `{ success, data, total }` and
//! failures into `{ success: false, message }`. Kept here so every caller
//! agrees on the envelope shape.

use serde::Serialize;

/// Successful listing envelope.
///
/// `total` is the count of all rows matching the filter, not the page size,
/// so clients can paginate.
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self {
            success: true,
            data,
            total,
        }
    }
}

/// Failure envelope. No partial results ride along with an error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_envelope_shape() {
        let response = ListResponse::new(vec!["a", "b"], 17);
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(
            serialized,
            json!({ "success": true, "data": ["a", "b"], "total": 17 })
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let response = ErrorResponse::new("internal error");
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(
            serialized,
            json!({ "success": false, "message": "internal error" })
        );
    }
}
