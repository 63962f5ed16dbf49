//! Axum integration
//!
//! [`problem_details_middleware`] runs the result filter pipeline over every
//! response produced by the wrapped routes and writes the final outcome with
//! content negotiation. Handlers may return [`ActionOutcome`](crate::ActionOutcome)
//! directly, or plain axum responses; bare error status codes (no
//! `Content-Type`) are treated as status outcomes.

pub mod extract;
pub mod middleware;
pub mod negotiate;
pub mod render;

use std::sync::Arc;

use crate::filter::{ResultFilter, ResultFilterPipeline};
use crate::options::ApiBehaviorOptions;

pub use extract::ApiContext;
pub use middleware::problem_details_middleware;
pub use negotiate::select_media_type;
pub use render::{RenderError, render_outcome};

/// Middleware state: the frozen options and the filter pipeline built from them.
#[derive(Debug, Clone)]
pub struct ApiBehavior {
    options: Arc<ApiBehaviorOptions>,
    pipeline: Arc<ResultFilterPipeline>,
}

impl ApiBehavior {
    #[must_use]
    pub fn new(options: ApiBehaviorOptions) -> Self {
        let pipeline = ResultFilterPipeline::for_api_behavior(&options);
        Self {
            options: Arc::new(options),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Add an application filter next to the built-in ones.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn ResultFilter>) -> Self {
        Arc::make_mut(&mut self.pipeline).add(filter);
        self
    }

    #[must_use]
    pub fn options(&self) -> &ApiBehaviorOptions {
        &self.options
    }

    #[must_use]
    pub fn pipeline(&self) -> &ResultFilterPipeline {
        &self.pipeline
    }
}
