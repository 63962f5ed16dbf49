//! Result-processing middleware for axum routers.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::HeaderMap;
use http::StatusCode;
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};

use problemkit_errors::Problem;

use crate::api::ApiBehavior;
use crate::api::render::render_outcome;
use crate::context::ActionContext;
use crate::outcome::ActionOutcome;

/// Outcome returned by a handler, carried to the middleware in the response
/// extensions.
#[derive(Debug, Clone)]
pub(crate) struct PendingOutcome(pub(crate) ActionOutcome);

/// Handlers can return an [`ActionOutcome`] directly.
///
/// Without [`problem_details_middleware`] the outcome is written as-is with
/// its first media type; with it, the outcome goes through the result filters
/// and content negotiation first.
impl IntoResponse for ActionOutcome {
    fn into_response(self) -> Response {
        let mut response = match render_outcome(&self, None) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "failed to render action outcome");
                Problem::from_status(StatusCode::INTERNAL_SERVER_ERROR).into_response()
            }
        };
        response.extensions_mut().insert(PendingOutcome(self));
        response
    }
}

/// Run the result filters over each response and write the final outcome.
///
/// Install with `axum::middleware::from_fn_with_state(behavior, problem_details_middleware)`.
/// Responses that are neither a handler-returned [`ActionOutcome`] nor a
/// bare error status (4xx/5xx without `Content-Type`) pass through untouched.
pub async fn problem_details_middleware(
    State(behavior): State<ApiBehavior>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let action = ActionContext::from_parts(&parts);
    let accept = parts
        .headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    parts.extensions.insert(behavior.clone());

    let response = next.run(Request::from_parts(parts, body)).await;

    let (outcome, original_headers) = match take_outcome(response) {
        Ok(found) => found,
        Err(response) => return response,
    };

    let short_circuited = outcome.status().is_server_error();
    let run = behavior
        .pipeline()
        .execute(&action, outcome, short_circuited);
    let outcome = if run.canceled {
        ActionOutcome::Status(run.outcome.status())
    } else {
        run.outcome
    };

    match render_outcome(&outcome, accept.as_deref()) {
        Ok(mut rendered) => {
            copy_headers(&original_headers, rendered.headers_mut());
            rendered
        }
        Err(err) => {
            tracing::error!(error = %err, path = %action.path, "failed to render result");
            Problem::from_status(StatusCode::INTERNAL_SERVER_ERROR)
                .with_instance(action.path)
                .into_response()
        }
    }
}

fn take_outcome(mut response: Response) -> Result<(ActionOutcome, HeaderMap), Response> {
    let outcome = match response.extensions_mut().remove::<PendingOutcome>() {
        Some(PendingOutcome(outcome)) => outcome,
        None if is_bare_error(&response) => ActionOutcome::Status(response.status()),
        None => return Err(response),
    };
    let (parts, _body) = response.into_parts();
    Ok((outcome, parts.headers))
}

fn is_bare_error(response: &Response) -> bool {
    let status = response.status();
    (status.is_client_error() || status.is_server_error())
        && !response.headers().contains_key(CONTENT_TYPE)
}

// Keep handler headers (Location, WWW-Authenticate, ...) except the body framing ones.
fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if name == CONTENT_TYPE || name == CONTENT_LENGTH {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}
