//! Startup configuration of [`ApiBehaviorOptions`].
//!
//! Options are built in three steps, in this order:
//! 1. [`ApiBehaviorOptionsSetup::configure`] assigns the defaults;
//! 2. user configuration runs (code or [`ApiBehaviorConfig`](crate::ApiBehaviorConfig));
//! 3. [`ApiBehaviorOptionsSetup::post_configure`] applies compatibility-version
//!    defaults and upgrades the untouched plain invalid-model-state factory to
//!    the problem details one when problem details are allowed.

use std::sync::Arc;

use http::StatusCode;

use problemkit_errors::{
    APPLICATION_JSON, APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, APPLICATION_XML,
    Problem, ValidationProblem,
};

use crate::compat::CompatibilityVersion;
use crate::context::ActionContext;
use crate::options::{
    ApiBehaviorOptions, DefaultFactory, FactorySource, InvalidModelStateResponseFactory,
};
use crate::outcome::ObjectResult;

/// Problem `type` of 400 responses, shared by validation problems.
pub const BAD_REQUEST_TYPE: &str = "https://tools.ietf.org/html/rfc7231#section-6.5.1";

/// Client errors mapped to problem details out of the box: status, problem `type` link.
const DEFAULT_CLIENT_ERRORS: &[(StatusCode, &str)] = &[
    (StatusCode::BAD_REQUEST, BAD_REQUEST_TYPE),
    (
        StatusCode::UNAUTHORIZED,
        "https://tools.ietf.org/html/rfc7235#section-3.1",
    ),
    (
        StatusCode::FORBIDDEN,
        "https://tools.ietf.org/html/rfc7231#section-6.5.3",
    ),
    (
        StatusCode::NOT_FOUND,
        "https://tools.ietf.org/html/rfc7231#section-6.5.4",
    ),
    (
        StatusCode::NOT_ACCEPTABLE,
        "https://tools.ietf.org/html/rfc7231#section-6.5.6",
    ),
    (
        StatusCode::CONFLICT,
        "https://tools.ietf.org/html/rfc7231#section-6.5.8",
    ),
    (
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
        "https://tools.ietf.org/html/rfc7231#section-6.5.13",
    ),
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        "https://tools.ietf.org/html/rfc4918#section-11.2",
    ),
];

/// Configures [`ApiBehaviorOptions`] for a compatibility version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiBehaviorOptionsSetup {
    version: CompatibilityVersion,
}

impl ApiBehaviorOptionsSetup {
    /// First version that allows problem details for client errors by default.
    pub const PROBLEM_DETAILS_MIN_VERSION: CompatibilityVersion =
        CompatibilityVersion::Version2_2;

    #[must_use]
    pub fn new(version: CompatibilityVersion) -> Self {
        Self { version }
    }

    #[must_use]
    pub fn version(&self) -> CompatibilityVersion {
        self.version
    }

    /// Build options: `configure`, then `user`, then `post_configure`.
    pub fn build(&self, user: impl FnOnce(&mut ApiBehaviorOptions)) -> ApiBehaviorOptions {
        let mut options = ApiBehaviorOptions::default();
        self.configure(&mut options);
        user(&mut options);
        self.post_configure(&mut options);
        options
    }

    /// Assign the plain invalid-model-state factory and the default client
    /// error problem factories.
    pub fn configure(&self, options: &mut ApiBehaviorOptions) {
        options.assign_default_invalid_model_state_factory(
            DefaultFactory::BadRequest,
            Arc::new(bad_request_response),
        );
        for (status, link) in DEFAULT_CLIENT_ERRORS {
            let title = status.canonical_reason().unwrap_or("Client Error");
            let factory = client_error_problem(*status, title, *link);
            options.set_problem_details_factory(*status, factory);
        }
    }

    /// Compatibility-version defaults; explicit values are left alone.
    pub fn apply_compatibility_defaults(&self, options: &mut ApiBehaviorOptions) {
        if self.version >= Self::PROBLEM_DETAILS_MIN_VERSION {
            let applied = options.allow_use_problem_details_switch_mut().apply_default(true);
            tracing::debug!(
                version = %self.version,
                applied,
                "compatibility default: allow_use_problem_details_for_client_error_responses = true"
            );
        }
    }

    /// Apply compatibility defaults, then switch the untouched plain factory
    /// to the problem details variant when problem details are allowed.
    pub fn post_configure(&self, options: &mut ApiBehaviorOptions) {
        self.apply_compatibility_defaults(options);

        if options.allow_use_problem_details_for_client_error_responses()
            && options.invalid_model_state_factory_source()
                == FactorySource::DefaultAssigned(DefaultFactory::BadRequest)
        {
            tracing::debug!("invalid model state responses use validation problem details");
            options.assign_default_invalid_model_state_factory(
                DefaultFactory::ValidationProblem,
                Arc::new(validation_problem_response),
            );
        }
    }
}

/// Factory producing a client error problem for `status`.
///
/// The problem `instance` is the request path and `trace_id` the request's
/// trace id, when known.
pub fn client_error_problem(
    status: StatusCode,
    title: impl Into<String>,
    link: impl Into<String>,
) -> impl Fn(&ActionContext) -> Problem + Send + Sync + 'static {
    let title = title.into();
    let link = link.into();
    move |ctx: &ActionContext| {
        let mut problem = Problem::new(status, title.clone())
            .with_type(link.clone())
            .with_instance(ctx.path.clone());
        if let Some(trace_id) = &ctx.trace_id {
            problem = problem.with_trace_id(trace_id.clone());
        }
        problem
    }
}

fn bad_request_response(ctx: &ActionContext) -> ObjectResult {
    ObjectResult::bad_request(ctx.model_state.clone())
        .with_content_type(APPLICATION_JSON)
        .with_content_type(APPLICATION_XML)
}

fn validation_problem_response(ctx: &ActionContext) -> ObjectResult {
    let problem = ValidationProblem::from_model_state(&ctx.model_state).with_problem(|p| {
        let p = p
            .with_type(BAD_REQUEST_TYPE)
            .with_instance(ctx.path.clone());
        match &ctx.trace_id {
            Some(trace_id) => p.with_trace_id(trace_id.clone()),
            None => p,
        }
    });
    ObjectResult::bad_request(problem)
        .with_content_type(APPLICATION_PROBLEM_JSON)
        .with_content_type(APPLICATION_PROBLEM_XML)
}

/// The factory installed for a default kind; exposed for callers that want to
/// wrap a built-in response.
#[must_use]
pub fn default_invalid_model_state_factory(
    kind: DefaultFactory,
) -> InvalidModelStateResponseFactory {
    match kind {
        DefaultFactory::BadRequest => Arc::new(bad_request_response),
        DefaultFactory::ValidationProblem => Arc::new(validation_problem_response),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::outcome::Payload;
    use http::Method;
    use problemkit_errors::ModelState;

    fn invalid_ctx() -> ActionContext {
        ActionContext::new(Method::POST, "/api/items")
            .with_trace_id("trace-1")
            .with_model_state(ModelState::new().with_error("name", "Name is required"))
    }

    #[test]
    fn configure_assigns_plain_default() {
        let mut options = ApiBehaviorOptions::default();
        ApiBehaviorOptionsSetup::new(CompatibilityVersion::Latest).configure(&mut options);

        assert_eq!(
            options.invalid_model_state_factory_source(),
            FactorySource::DefaultAssigned(DefaultFactory::BadRequest)
        );
        let response = options.invalid_model_state_response(&invalid_ctx()).unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.content_types, vec![APPLICATION_JSON, APPLICATION_XML]);
        assert!(matches!(response.payload, Payload::ModelState(_)));
    }

    #[test]
    fn configure_registers_default_client_errors() {
        let setup = ApiBehaviorOptionsSetup::new(CompatibilityVersion::Version2_0);
        let options = setup.build(|_| {});
        for code in [400_u16, 401, 403, 404, 406, 409, 415, 422] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(options.problem_details_factory(status).is_some(), "{code}");
        }
        assert!(options.problem_details_factory(StatusCode::IM_A_TEAPOT).is_none());

        let bad_request = options.problem_details_factory(StatusCode::BAD_REQUEST).unwrap();
        assert_eq!(bad_request(&invalid_ctx()).type_url, BAD_REQUEST_TYPE);

        let factory = options.problem_details_factory(StatusCode::NOT_FOUND).unwrap();
        let problem = factory(&invalid_ctx());
        assert_eq!(problem.title, "Not Found");
        assert_eq!(
            problem.type_url,
            "https://tools.ietf.org/html/rfc7231#section-6.5.4"
        );
        assert_eq!(problem.instance.as_deref(), Some("/api/items"));
        assert_eq!(problem.trace_id.as_deref(), Some("trace-1"));
    }

    #[test]
    fn version_2_2_defaults_to_problem_details() {
        let setup = ApiBehaviorOptionsSetup::new(CompatibilityVersion::Version2_2);
        let options = setup.build(|_| {});

        assert!(options.allow_use_problem_details_for_client_error_responses());
        assert_eq!(
            options.invalid_model_state_factory_source(),
            FactorySource::DefaultAssigned(DefaultFactory::ValidationProblem)
        );
        let response = options.invalid_model_state_response(&invalid_ctx()).unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.content_types,
            vec![APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML]
        );
        let Payload::ValidationProblem(problem) = response.payload else {
            panic!("expected a validation problem");
        };
        assert_eq!(problem.problem.type_url, BAD_REQUEST_TYPE);
        assert_eq!(problem.problem.instance.as_deref(), Some("/api/items"));
        assert_eq!(problem.errors["name"], vec!["Name is required"]);
    }

    #[test]
    fn older_versions_keep_plain_default() {
        for version in [CompatibilityVersion::Version2_0, CompatibilityVersion::Version2_1] {
            let options = ApiBehaviorOptionsSetup::new(version).build(|_| {});
            assert!(!options.allow_use_problem_details_for_client_error_responses());
            assert_eq!(
                options.invalid_model_state_factory_source(),
                FactorySource::DefaultAssigned(DefaultFactory::BadRequest)
            );
        }
    }

    #[test]
    fn explicit_flag_beats_version_default() {
        let enabled = ApiBehaviorOptionsSetup::new(CompatibilityVersion::Version2_1)
            .build(|o| o.set_allow_use_problem_details_for_client_error_responses(true));
        assert_eq!(
            enabled.invalid_model_state_factory_source(),
            FactorySource::DefaultAssigned(DefaultFactory::ValidationProblem)
        );

        let disabled = ApiBehaviorOptionsSetup::new(CompatibilityVersion::Version2_2)
            .build(|o| o.set_allow_use_problem_details_for_client_error_responses(false));
        assert!(!disabled.allow_use_problem_details_for_client_error_responses());
        assert_eq!(
            disabled.invalid_model_state_factory_source(),
            FactorySource::DefaultAssigned(DefaultFactory::BadRequest)
        );
    }

    #[test]
    fn user_override_is_preserved() {
        let options = ApiBehaviorOptionsSetup::new(CompatibilityVersion::Latest).build(|o| {
            o.set_invalid_model_state_response_factory(|ctx| {
                ObjectResult::new(StatusCode::UNPROCESSABLE_ENTITY, ctx.model_state.clone())
            });
        });

        assert!(options.allow_use_problem_details_for_client_error_responses());
        assert_eq!(
            options.invalid_model_state_factory_source(),
            FactorySource::UserOverridden
        );
        let response = options.invalid_model_state_response(&invalid_ctx()).unwrap();
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn post_configure_without_configure_leaves_factory_unset() {
        let mut options = ApiBehaviorOptions::default();
        ApiBehaviorOptionsSetup::new(CompatibilityVersion::Latest).post_configure(&mut options);
        assert!(options.allow_use_problem_details_for_client_error_responses());
        assert_eq!(
            options.invalid_model_state_factory_source(),
            FactorySource::Unset
        );
    }

    #[test]
    fn default_factory_lookup_matches_installed_variants() {
        let ctx = invalid_ctx();
        let plain = default_invalid_model_state_factory(DefaultFactory::BadRequest)(&ctx);
        assert!(matches!(plain.payload, Payload::ModelState(_)));
        let factory = default_invalid_model_state_factory(DefaultFactory::ValidationProblem);
        let problem = factory(&ctx);
        assert!(matches!(problem.payload, Payload::ValidationProblem(_)));
    }
}
