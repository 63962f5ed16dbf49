//! Handler-side access to the action context and behavior options.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;

use problemkit_errors::{ModelState, Problem};

use crate::api::ApiBehavior;
use crate::context::ActionContext;
use crate::options::ApiBehaviorOptions;
use crate::outcome::ActionOutcome;

/// Extractor giving handlers the [`ActionContext`] of the current request.
///
/// Requires [`problem_details_middleware`](crate::api::problem_details_middleware)
/// on the route; without it extraction fails with a 500 problem.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub action: ActionContext,
    behavior: ApiBehavior,
}

impl ApiContext {
    #[must_use]
    pub fn options(&self) -> &ApiBehaviorOptions {
        self.behavior.options()
    }

    /// Outcome for a request whose input failed validation, built by the
    /// configured invalid-model-state factory.
    #[must_use]
    pub fn invalid_model_state(&self, model_state: ModelState) -> ActionOutcome {
        let ctx = self.action.clone().with_model_state(model_state);
        self.options()
            .invalid_model_state_response(&ctx)
            .map_or(ActionOutcome::Status(StatusCode::BAD_REQUEST), ActionOutcome::Object)
    }
}

impl<S> FromRequestParts<S> for ApiContext
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let behavior = parts
            .extensions
            .get::<ApiBehavior>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("ApiContext used on a route without problem_details_middleware");
                Problem::from_status(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_detail("API behavior is not configured for this route")
            })?;
        Ok(Self {
            action: ActionContext::from_parts(parts),
            behavior,
        })
    }
}
