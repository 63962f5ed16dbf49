//! Per-request contexts handed to factories and result filters.

use http::{HeaderMap, Method, request::Parts};

use problemkit_errors::ModelState;

use crate::outcome::ActionOutcome;

/// What factories know about the request being answered.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub method: Method,
    /// Request path, used as the problem `instance`.
    pub path: String,
    pub headers: HeaderMap,
    pub trace_id: Option<String>,
    pub model_state: ModelState,
}

impl ActionContext {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            trace_id: None,
            model_state: ModelState::new(),
        }
    }

    /// Context for an incoming request; the trace id comes from its headers.
    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_owned(),
            headers: parts.headers.clone(),
            trace_id: extract_trace_id(&parts.headers),
            model_state: ModelState::new(),
        }
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    #[must_use]
    pub fn with_model_state(mut self, model_state: ModelState) -> Self {
        self.model_state = model_state;
        self
    }
}

/// Extract trace ID from headers or the current tracing span
pub fn extract_trace_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-trace-id")
        .or_else(|| headers.get("x-request-id"))
        .or_else(|| headers.get("traceparent"))
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .or_else(|| {
            tracing::Span::current()
                .id()
                .map(|id| id.into_u64().to_string())
        })
}

/// Context seen by [`ResultFilter::on_result_executing`](crate::ResultFilter::on_result_executing).
///
/// Filters may replace `result` or set `cancel` to stop the remaining
/// non-always-run filters.
#[derive(Debug)]
pub struct ResultExecutingContext<'a> {
    pub action: &'a ActionContext,
    pub result: ActionOutcome,
    pub cancel: bool,
}

impl<'a> ResultExecutingContext<'a> {
    #[must_use]
    pub fn new(action: &'a ActionContext, result: ActionOutcome) -> Self {
        Self {
            action,
            result,
            cancel: false,
        }
    }
}

/// Context seen by [`ResultFilter::on_result_executed`](crate::ResultFilter::on_result_executed).
#[derive(Debug)]
pub struct ResultExecutedContext<'a> {
    pub action: &'a ActionContext,
    pub result: &'a ActionOutcome,
    pub canceled: bool,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::Request;

    #[test]
    fn from_parts_captures_path_and_trace_header() {
        let (parts, ()) = Request::builder()
            .method(Method::GET)
            .uri("/api/items/7?expand=true")
            .header("x-request-id", "req-42")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = ActionContext::from_parts(&parts);
        assert_eq!(ctx.method, Method::GET);
        assert_eq!(ctx.path, "/api/items/7");
        assert_eq!(ctx.trace_id.as_deref(), Some("req-42"));
        assert!(ctx.model_state.is_valid());
    }

    #[test]
    fn x_trace_id_wins_over_other_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("traceparent", "00-abc-def-01".parse().unwrap());
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        assert_eq!(extract_trace_id(&headers), Some("test-trace-123".to_owned()));
    }
}
