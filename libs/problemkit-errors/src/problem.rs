//! RFC 7807 / RFC 9457 Problem Details for HTTP APIs (pure data model)

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model_state::ModelState;

/// Title used by [`ValidationProblem`] unless a caller supplies another one.
pub const VALIDATION_PROBLEM_TITLE: &str = "One or more validation errors occurred.";

/// Member names of [`Problem`]; extensions never use them.
pub const RESERVED_MEMBERS: &[&str] = &[
    "type", "title", "status", "detail", "instance", "trace_id",
];

/// Member of [`ValidationProblem`] holding the field errors.
const ERRORS_MEMBER: &str = "errors";

const ABOUT_BLANK: &str = "about:blank";

fn default_type_url() -> String {
    ABOUT_BLANK.to_owned()
}

/// Custom serializer for `StatusCode` to u16
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Custom deserializer for `StatusCode` from u16
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

/// RFC 7807 Problem Details for HTTP APIs.
///
/// Members not defined by the RFC are carried in `extensions` and serialized
/// inline next to the standard members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type", default = "default_type_url")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status: StatusCode,
    /// A human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_url: default_type_url(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
            trace_id: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Problem titled with the canonical reason phrase of `status`.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Unknown Status"))
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = Some(uri.into());
        self
    }

    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Add an extension member. Names in [`RESERVED_MEMBERS`] are ignored;
    /// use the matching builder instead.
    pub fn with_extension(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        let name = name.into();
        if !RESERVED_MEMBERS.contains(&name.as_str()) {
            self.extensions.insert(name, value.into());
        }
        self
    }
}

/// Problem Details for a request whose input failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct ValidationProblem {
    #[serde(flatten)]
    pub problem: Problem,
    /// Field path to the ordered messages reported for it.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblem {
    /// 400 problem carrying every error recorded in `model_state`.
    pub fn from_model_state(model_state: &ModelState) -> Self {
        Self {
            problem: Problem::new(StatusCode::BAD_REQUEST, VALIDATION_PROBLEM_TITLE),
            errors: model_state.clone().into_errors(),
        }
    }

    /// Edit the embedded problem. An `errors` extension is dropped since the
    /// field errors own that member.
    pub fn with_problem(mut self, f: impl FnOnce(Problem) -> Problem) -> Self {
        self.problem = f(self.problem);
        self.problem.extensions.remove(ERRORS_MEMBER);
        self
    }
}

/// Axum integration: make Problem directly usable as a response
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        problem_json_response(self.status, &self)
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ValidationProblem {
    fn into_response(self) -> axum::response::Response {
        problem_json_response(self.problem.status, &self)
    }
}

#[cfg(feature = "axum")]
fn problem_json_response<T: Serialize>(status: StatusCode, body: &T) -> axum::response::Response {
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;

    use crate::media_types::APPLICATION_PROBLEM_JSON;

    let mut resp = axum::Json(body).into_response();
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
    );
    resp
}
