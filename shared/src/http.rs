//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::analysis::{AnalysisResult, FailureKind};
use crate::models::AnalysisResponse;

/// Error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: None,
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("access-control-allow-origin", "*")
        .body(Body::from(serde_json::to_string(data)?))?)
}

/// Create an empty response, e.g. for 204 No Content.
pub fn empty_response(status: u16) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("access-control-allow-origin", "*")
        .body(Body::Empty)?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ErrorBody::new(message))
}

/// Map an analysis outcome to its HTTP response: 200 on success, 400 otherwise.
pub fn analysis_response(result: AnalysisResult) -> Result<Response<Body>, lambda_http::Error> {
    match result {
        AnalysisResult::Success {
            analysis_text,
            entries_analyzed,
            model_id,
        } => json_response(
            200,
            &AnalysisResponse {
                analysis: analysis_text,
                moods_analyzed: entries_analyzed,
                model_used: model_id,
            },
        ),
        AnalysisResult::NoData { message } => failure_response(FailureKind::NoData, message),
        AnalysisResult::ProviderError { kind, message } => failure_response(kind, message),
    }
}

fn failure_response(kind: FailureKind, message: String) -> Result<Response<Body>, lambda_http::Error> {
    json_response(
        400,
        &ErrorBody {
            error: message,
            kind: Some(kind),
        },
    )
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
/// or `Err(lambda_http::Error)` on serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    match serde_json::from_slice(body.as_ref()) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => {
            let response = error_response(400, format!("Invalid request body: {}", e))?;
            Ok(Err(response))
        }
    }
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($body:expr) => {
        match shared::http::parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}
