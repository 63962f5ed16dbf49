//! Startup-time API behavior options.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use problemkit_errors::Problem;

use crate::compat::CompatibilitySwitch;
use crate::context::ActionContext;
use crate::outcome::ObjectResult;

/// Builds the problem written for a bare status code.
pub type ProblemDetailsFactory = Arc<dyn Fn(&ActionContext) -> Problem + Send + Sync>;

/// Builds the response written when the request's model state is invalid.
pub type InvalidModelStateResponseFactory =
    Arc<dyn Fn(&ActionContext) -> ObjectResult + Send + Sync>;

/// Built-in invalid-model-state factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultFactory {
    /// 400 with the model state as a plain JSON/XML body.
    BadRequest,
    /// 400 with a validation problem as `application/problem+json`/`+xml`.
    ValidationProblem,
}

/// Who assigned the current invalid-model-state factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FactorySource {
    #[default]
    Unset,
    DefaultAssigned(DefaultFactory),
    UserOverridden,
}

/// Options shared by every request once startup has finished.
#[derive(Default)]
pub struct ApiBehaviorOptions {
    problem_details_factories: HashMap<StatusCode, ProblemDetailsFactory>,
    invalid_model_state_response_factory: Option<InvalidModelStateResponseFactory>,
    invalid_model_state_factory_source: FactorySource,
    allow_use_problem_details_for_client_error_responses: CompatibilitySwitch<bool>,
    /// Skip installing the problem details result filter.
    pub suppress_map_client_errors: bool,
}

impl fmt::Debug for ApiBehaviorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<u16> = self
            .problem_details_factories
            .keys()
            .map(StatusCode::as_u16)
            .collect();
        codes.sort_unstable();
        f.debug_struct("ApiBehaviorOptions")
            .field("problem_details_factories", &codes)
            .field(
                "invalid_model_state_factory_source",
                &self.invalid_model_state_factory_source,
            )
            .field(
                "allow_use_problem_details_for_client_error_responses",
                &self.allow_use_problem_details_for_client_error_responses,
            )
            .field("suppress_map_client_errors", &self.suppress_map_client_errors)
            .finish_non_exhaustive()
    }
}

impl ApiBehaviorOptions {
    #[must_use]
    pub fn problem_details_factories(&self) -> &HashMap<StatusCode, ProblemDetailsFactory> {
        &self.problem_details_factories
    }

    #[must_use]
    pub fn problem_details_factory(&self, status: StatusCode) -> Option<&ProblemDetailsFactory> {
        self.problem_details_factories.get(&status)
    }

    /// Register (or replace) the problem produced for bare `status` results.
    pub fn set_problem_details_factory<F>(&mut self, status: StatusCode, factory: F)
    where
        F: Fn(&ActionContext) -> Problem + Send + Sync + 'static,
    {
        self.problem_details_factories
            .insert(status, Arc::new(factory));
    }

    pub fn remove_problem_details_factory(&mut self, status: StatusCode) -> bool {
        self.problem_details_factories.remove(&status).is_some()
    }

    #[must_use]
    pub fn invalid_model_state_response_factory(
        &self,
    ) -> Option<&InvalidModelStateResponseFactory> {
        self.invalid_model_state_response_factory.as_ref()
    }

    #[must_use]
    pub fn invalid_model_state_factory_source(&self) -> FactorySource {
        self.invalid_model_state_factory_source
    }

    /// Install a caller-supplied factory; the setup never replaces it.
    pub fn set_invalid_model_state_response_factory<F>(&mut self, factory: F)
    where
        F: Fn(&ActionContext) -> ObjectResult + Send + Sync + 'static,
    {
        self.invalid_model_state_response_factory = Some(Arc::new(factory));
        self.invalid_model_state_factory_source = FactorySource::UserOverridden;
    }

    pub(crate) fn assign_default_invalid_model_state_factory(
        &mut self,
        kind: DefaultFactory,
        factory: InvalidModelStateResponseFactory,
    ) {
        self.invalid_model_state_response_factory = Some(factory);
        self.invalid_model_state_factory_source = FactorySource::DefaultAssigned(kind);
    }

    /// Response for a request whose model state failed validation, if a
    /// factory is configured.
    #[must_use]
    pub fn invalid_model_state_response(&self, ctx: &ActionContext) -> Option<ObjectResult> {
        self.invalid_model_state_response_factory
            .as_ref()
            .map(|factory| factory(ctx))
    }

    #[must_use]
    pub fn allow_use_problem_details_for_client_error_responses(&self) -> bool {
        self.allow_use_problem_details_for_client_error_responses
            .value()
    }

    /// Explicitly enable or disable problem details; compatibility defaults
    /// no longer apply afterwards.
    pub fn set_allow_use_problem_details_for_client_error_responses(&mut self, allow: bool) {
        self.allow_use_problem_details_for_client_error_responses
            .set(allow);
    }

    pub(crate) fn allow_use_problem_details_switch_mut(&mut self) -> &mut CompatibilitySwitch<bool> {
        &mut self.allow_use_problem_details_for_client_error_responses
    }
}
