//! problemkit: result-processing pipeline for HTTP APIs
//!
//! Handlers produce an [`ActionOutcome`]. Before the response is written the
//! outcome runs through a [`ResultFilterPipeline`]; the built-in
//! [`ProblemDetailsResultFilter`] replaces bare client error status codes
//! with RFC 7807 Problem Details bodies. [`ApiBehaviorOptionsSetup`] builds the
//! startup-time [`ApiBehaviorOptions`] for a given [`CompatibilityVersion`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod compat;
pub mod config;
pub mod context;
pub mod filter;
pub mod options;
pub mod outcome;
pub mod problem_filter;
pub mod setup;
pub mod telemetry;

pub use api::{ApiBehavior, ApiContext, problem_details_middleware};
pub use compat::{CompatibilitySwitch, CompatibilityVersion};
pub use config::{ApiBehaviorConfig, ClientErrorConfig, ConfigError};
pub use context::{ActionContext, ResultExecutedContext, ResultExecutingContext};
pub use filter::{FilterRun, ResultFilter, ResultFilterPipeline};
pub use options::{
    ApiBehaviorOptions, DefaultFactory, FactorySource, InvalidModelStateResponseFactory,
    ProblemDetailsFactory,
};
pub use outcome::{ActionOutcome, ObjectResult, Payload};
pub use problem_filter::ProblemDetailsResultFilter;
pub use setup::ApiBehaviorOptionsSetup;
pub use telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};

pub use problemkit_errors::{ModelState, Problem, ValidationProblem};
