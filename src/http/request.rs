//! Request bodies
//!
//! JSON decoding with the same rejections the store has always made.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::error::Category;

use super::ApiError;

/// Body of get and delete requests
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyBody {
    #[serde(default, alias = "Key")]
    pub key: String,
}

/// Body of put requests
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PutBody {
    #[serde(default, alias = "Key")]
    pub key: String,

    #[serde(default, alias = "Value")]
    pub value: String,
}

/// Decode a single JSON object from a request body
///
/// Rejects a non-JSON content type (415), an empty body, malformed JSON,
/// unknown fields, wrongly typed fields and trailing data (400).
pub fn decode_json_body<T: DeserializeOwned>(headers: &HeaderMap, body: &Bytes) -> Result<T, ApiError> {
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        let media_type = content_type
            .to_str()
            .unwrap_or_default()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        if !media_type.eq_ignore_ascii_case("application/json") {
            return Err(ApiError::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type header is not application/json",
            ));
        }
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("Request body must not be empty"));
    }

    let mut stream = serde_json::Deserializer::from_slice(body).into_iter::<T>();

    let value = match stream.next() {
        Some(Ok(value)) => value,
        Some(Err(e)) => return Err(json_error(e)),
        None => return Err(ApiError::bad_request("Request body must not be empty")),
    };

    if stream.next().is_some() {
        return Err(ApiError::bad_request(
            "Request body must only contain a single JSON object",
        ));
    }

    Ok(value)
}

fn json_error(e: serde_json::Error) -> ApiError {
    match e.classify() {
        Category::Syntax => ApiError::bad_request(format!(
            "Request body contains badly-formed JSON (at line {}, column {})",
            e.line(),
            e.column()
        )),
        Category::Eof => ApiError::bad_request("Request body contains badly-formed JSON"),
        Category::Data => {
            let message = e.to_string();
            if message.starts_with("unknown field") {
                ApiError::bad_request(format!("Request body contains {}", message))
            } else {
                ApiError::bad_request(format!("Request body contains an invalid value: {}", message))
            }
        }
        Category::Io => ApiError::internal(e.to_string()),
    }
}
