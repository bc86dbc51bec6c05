// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! [`JsonExtractor`] separates an absent body from a body that fails to decode,
//! which the default Axum `Json` extractor folds into one rejection. The
//! decoder detail is kept on the error for logging; clients only see the
//! generic message.

use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ServerError;

mod error_hints {
    pub const MISSING_COMMA: &str =
        "check for missing or extra commas between object properties or array elements";
    pub const MISSING_BRACE: &str = "check for missing closing brace '}' for JSON object";
    pub const MISSING_BRACKET: &str = "check for missing closing bracket ']' for JSON array";
    pub const MISSING_QUOTES: &str =
        "check for missing or improperly escaped quotes around string values";
    pub const CONTROL_CHARS: &str = "JSON contains invalid control characters that must be escaped";
    pub const EXPECTED_VALUE: &str =
        "expected a valid JSON value (string, number, boolean, null, object, or array)";
    pub const DEFAULT_SYNTAX: &str = "check JSON formatting and structure";
    pub const TRUNCATED_JSON: &str =
        "unexpected end of JSON input, request appears to be truncated";
}

const MAX_JSON_PAYLOAD_SIZE: usize = 1024 * 1024; // 1MB limit

/// Custom JSON extractor that distinguishes empty and malformed bodies
#[derive(Debug)]
pub struct JsonExtractor<T>(pub T);

impl<T, S> FromRequest<S> for JsonExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let result = Self::extract_json(req, state).await;
        match &result {
            Err(ServerError::EmptyBody) => warn!("request body is empty"),
            Err(ServerError::JsonError { message }) => {
                warn!(error = %message, "failed to decode request body");
            }
            _ => {}
        }
        result
    }
}

impl<T> JsonExtractor<T>
where
    T: DeserializeOwned,
{
    async fn extract_json<S>(req: Request, state: &S) -> Result<Self, ServerError>
    where
        S: Send + Sync,
    {
        // Validate content-type if present
        if let Some(content_type) = req.headers().get("content-type")
            && let Ok(content_type_str) = content_type.to_str()
            && !content_type_str.starts_with("application/json")
        {
            return Err(ServerError::JsonError {
                message: format!(
                    "invalid content-type: expected 'application/json', got '{content_type_str}'"
                ),
            });
        }

        let bytes = match axum::body::Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(rejection) => {
                return Err(ServerError::JsonError {
                    message: format!("failed to read request body: {rejection}"),
                });
            }
        };

        // Check payload size limit
        if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
            return Err(ServerError::JsonError {
                message: format!(
                    "request body too large: {} bytes (max: {} bytes)",
                    bytes.len(),
                    MAX_JSON_PAYLOAD_SIZE
                ),
            });
        }

        // Whitespace only counts as empty, the decoder would hit EOF immediately
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ServerError::EmptyBody);
        }

        serde_json::from_slice::<T>(&bytes)
            .map(JsonExtractor)
            .map_err(|err| ServerError::JsonError {
                message: describe_decode_error(&err),
            })
    }
}

impl<T> IntoResponse for JsonExtractor<T>
where
    T: IntoResponse,
{
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

fn describe_decode_error(err: &serde_json::Error) -> String {
    if err.is_syntax() {
        format!(
            "invalid JSON syntax at line {}, column {}: {}",
            err.line(),
            err.column(),
            get_json_syntax_hint(err)
        )
    } else if err.is_data() {
        format!(
            "JSON data validation failed: {}",
            get_data_validation_hint(err)
        )
    } else if err.is_eof() {
        error_hints::TRUNCATED_JSON.to_string()
    } else {
        format!("JSON parsing error: {err}")
    }
}

/// Provides helpful hints for JSON syntax errors
fn get_json_syntax_hint(err: &serde_json::Error) -> &'static str {
    let err_msg = err.to_string();

    if err_msg.contains("expected ','") || err_msg.contains("trailing comma") {
        error_hints::MISSING_COMMA
    } else if err_msg.contains("expected '}'") {
        error_hints::MISSING_BRACE
    } else if err_msg.contains("expected ']'") {
        error_hints::MISSING_BRACKET
    } else if err_msg.contains("expected '\"'") {
        error_hints::MISSING_QUOTES
    } else if err_msg.contains("control character") {
        error_hints::CONTROL_CHARS
    } else if err_msg.contains("expected value") {
        error_hints::EXPECTED_VALUE
    } else {
        error_hints::DEFAULT_SYNTAX
    }
}

/// Provides helpful hints for data validation errors
fn get_data_validation_hint(err: &serde_json::Error) -> String {
    let err_msg = err.to_string();

    if err_msg.contains("invalid type") {
        if err_msg.contains("expected a string") {
            "expected a string value, but received a different data type".to_string()
        } else if err_msg.contains("expected struct") || err_msg.contains("expected a map") {
            "expected a JSON object, but received a different data type".to_string()
        } else {
            format!("data type mismatch: {err_msg}")
        }
    } else if err_msg.contains("missing field") {
        format!("required field is missing: {err_msg}")
    } else {
        err_msg
    }
}
