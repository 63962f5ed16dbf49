//! What an action asks the pipeline to write back.

use http::StatusCode;
use serde::Serialize;

use problemkit_errors::{
    APPLICATION_JSON, APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, APPLICATION_XML,
    ModelState, Problem, ValidationProblem,
};

/// Body of an [`ObjectResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Problem(Problem),
    ValidationProblem(ValidationProblem),
    ModelState(ModelState),
    Json(serde_json::Value),
}

impl Payload {
    /// Whether the payload has an XML rendering.
    #[must_use]
    pub fn supports_xml(&self) -> bool {
        !matches!(self, Self::Json(_))
    }

    /// Media types used when the result does not declare its own.
    #[must_use]
    pub fn default_media_types(&self) -> &'static [&'static str] {
        match self {
            Self::Problem(_) | Self::ValidationProblem(_) => {
                &[APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML]
            }
            Self::ModelState(_) => &[APPLICATION_JSON, APPLICATION_XML],
            Self::Json(_) => &[APPLICATION_JSON],
        }
    }
}

impl From<Problem> for Payload {
    fn from(problem: Problem) -> Self {
        Self::Problem(problem)
    }
}

impl From<ValidationProblem> for Payload {
    fn from(problem: ValidationProblem) -> Self {
        Self::ValidationProblem(problem)
    }
}

impl From<ModelState> for Payload {
    fn from(state: ModelState) -> Self {
        Self::ModelState(state)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// A payload plus the status code it is written with.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ObjectResult {
    pub status: StatusCode,
    pub payload: Payload,
    /// Media types this result may be written as, in preference order.
    /// Empty means "whatever the payload supports".
    pub content_types: Vec<String>,
}

impl ObjectResult {
    pub fn new(status: StatusCode, payload: impl Into<Payload>) -> Self {
        Self {
            status,
            payload: payload.into(),
            content_types: Vec::new(),
        }
    }

    pub fn bad_request(payload: impl Into<Payload>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, payload)
    }

    pub fn with_content_type(mut self, media_type: impl Into<String>) -> Self {
        self.content_types.push(media_type.into());
        self
    }

    /// Declared media types, or the payload defaults when none were declared.
    #[must_use]
    pub fn media_types(&self) -> Vec<&str> {
        if self.content_types.is_empty() {
            self.payload.default_media_types().to_vec()
        } else {
            self.content_types.iter().map(String::as_str).collect()
        }
    }
}

/// Response outcome produced by an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Only a status code, no body.
    Status(StatusCode),
    /// A structured payload written through content negotiation.
    Object(ObjectResult),
    /// A body that is already formatted.
    Content {
        status: StatusCode,
        content_type: String,
        body: String,
    },
}

impl ActionOutcome {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Status(status) | Self::Content { status, .. } => *status,
            Self::Object(object) => object.status,
        }
    }

    #[must_use]
    pub fn is_bare_status(&self) -> bool {
        matches!(self, Self::Status(_))
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectResult> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<StatusCode> for ActionOutcome {
    fn from(status: StatusCode) -> Self {
        Self::Status(status)
    }
}

impl From<ObjectResult> for ActionOutcome {
    fn from(object: ObjectResult) -> Self {
        Self::Object(object)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_result_falls_back_to_payload_media_types() {
        let result = ObjectResult::new(
            StatusCode::NOT_FOUND,
            Problem::from_status(StatusCode::NOT_FOUND),
        );
        assert_eq!(
            result.media_types(),
            vec![APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML]
        );

        let declared = result.with_content_type("application/vnd.test+json");
        assert_eq!(declared.media_types(), vec!["application/vnd.test+json"]);
    }

    #[test]
    fn outcome_status_covers_every_variant() {
        assert_eq!(
            ActionOutcome::from(StatusCode::IM_A_TEAPOT).status(),
            StatusCode::IM_A_TEAPOT
        );
        assert_eq!(
            ActionOutcome::from(ObjectResult::new(StatusCode::CREATED, json!({"id": 1}))).status(),
            StatusCode::CREATED
        );
        let content = ActionOutcome::Content {
            status: StatusCode::OK,
            content_type: "text/plain".to_owned(),
            body: "ok".to_owned(),
        };
        assert_eq!(content.status(), StatusCode::OK);
        assert!(!content.is_bare_status());
    }

    #[test]
    fn payload_serializes_inner_value() {
        let payload = Payload::from(ModelState::new().with_error("id", "Id is required"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"id": ["Id is required"]})
        );
        assert!(payload.supports_xml());
        assert!(!Payload::from(json!([1, 2])).supports_xml());
    }
}
