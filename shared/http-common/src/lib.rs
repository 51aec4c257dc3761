//! Shared HTTP utilities for the Doctor Directory workspace.
//!
//! Provides the JSON error-body builders used by the api-server handlers.
//! The directory's wire contract uses two distinct error shapes, kept here
//! so any future HTTP surface produces identical bodies.

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a `{"message": "<message>"}` body.
///
/// Used for lookup failures, e.g. `{"message": "Doctor not found"}`.
pub fn json_message(message: &str) -> serde_json::Value {
    serde_json::json!({ "message": message })
}

/// Create an `{"error_detail": "<detail>"}` body.
///
/// Used for request validation failures, e.g.
/// `{"error_detail": "Missing required field"}`.
pub fn json_error_detail(detail: &str) -> serde_json::Value {
    serde_json::json!({ "error_detail": detail })
}

/// Canonical body for an unknown or out-of-range doctor id.
pub fn doctor_not_found() -> serde_json::Value {
    json_message("Doctor not found")
}

/// Canonical body for a create request missing `first_name` or `last_name`.
pub fn missing_required_field() -> serde_json::Value {
    json_error_detail("Missing required field")
}
