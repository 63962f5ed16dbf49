//! Writing an [`ActionOutcome`] as an HTTP response.

use axum::body::Body;
use axum::response::Response;
use http::header::CONTENT_TYPE;

use problemkit_errors::APPLICATION_JSON;
use problemkit_errors::xml::{
    XmlError, model_state_to_xml, problem_to_xml, validation_problem_to_xml,
};

use crate::api::negotiate::select_media_type;
use crate::outcome::{ActionOutcome, ObjectResult, Payload};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML serialization failed: {0}")]
    Xml(#[from] XmlError),
    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),
}

fn is_xml(media_type: &str) -> bool {
    media_type
        .split_once('/')
        .is_some_and(|(_, subtype)| subtype == "xml" || subtype.ends_with("+xml"))
}

/// Render `outcome`, negotiating the body format against `accept`.
///
/// # Errors
/// Returns `RenderError` if the payload cannot be serialized in the selected
/// format or a header value is invalid.
pub fn render_outcome(
    outcome: &ActionOutcome,
    accept: Option<&str>,
) -> Result<Response, RenderError> {
    match outcome {
        ActionOutcome::Status(status) => Ok(Response::builder()
            .status(*status)
            .body(Body::empty())?),
        ActionOutcome::Content {
            status,
            content_type,
            body,
        } => Ok(Response::builder()
            .status(*status)
            .header(CONTENT_TYPE, content_type.as_str())
            .body(Body::from(body.clone()))?),
        ActionOutcome::Object(object) => render_object(object, accept),
    }
}

fn render_object(object: &ObjectResult, accept: Option<&str>) -> Result<Response, RenderError> {
    let candidates: Vec<&str> = object
        .media_types()
        .into_iter()
        .filter(|media_type| object.payload.supports_xml() || !is_xml(media_type))
        .collect();
    let media_type = select_media_type(accept, &candidates).unwrap_or(APPLICATION_JSON);

    let body = if is_xml(media_type) {
        match &object.payload {
            Payload::Problem(problem) => problem_to_xml(problem)?.into_bytes(),
            Payload::ValidationProblem(problem) => {
                validation_problem_to_xml(problem)?.into_bytes()
            }
            Payload::ModelState(state) => model_state_to_xml(state)?.into_bytes(),
            Payload::Json(value) => serde_json::to_vec(value)?,
        }
    } else {
        serde_json::to_vec(&object.payload)?
    };

    tracing::trace!(
        status = object.status.as_u16(),
        media_type,
        "writing object result"
    );
    Ok(Response::builder()
        .status(object.status)
        .header(CONTENT_TYPE, media_type)
        .body(Body::from(body))?)
}
