//! Ordered result filters.
//!
//! A [`ResultFilterPipeline`] runs every registered [`ResultFilter`] over an
//! [`ActionOutcome`] before it is written. Filters run in ascending
//! [`ResultFilter::order`]; filters with equal order keep registration order.
//! When the action was short-circuited (an error path produced the outcome)
//! only filters that report [`ResultFilter::always_run`] take part.

use std::fmt;
use std::sync::Arc;

use crate::context::{ActionContext, ResultExecutedContext, ResultExecutingContext};
use crate::options::ApiBehaviorOptions;
use crate::outcome::ActionOutcome;
use crate::problem_filter::ProblemDetailsResultFilter;

/// Hook into result processing.
pub trait ResultFilter: Send + Sync {
    /// Position in the pipeline; lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Whether the filter also runs for short-circuited or canceled results.
    fn always_run(&self) -> bool {
        false
    }

    fn on_result_executing(&self, ctx: &mut ResultExecutingContext<'_>);

    fn on_result_executed(&self, _ctx: &ResultExecutedContext<'_>) {}
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRun {
    pub outcome: ActionOutcome,
    /// Set when a filter canceled result execution.
    pub canceled: bool,
}

#[derive(Clone, Default)]
pub struct ResultFilterPipeline {
    filters: Vec<Arc<dyn ResultFilter>>,
}

impl fmt::Debug for ResultFilterPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let orders: Vec<i32> = self.filters.iter().map(|filter| filter.order()).collect();
        f.debug_struct("ResultFilterPipeline")
            .field("filter_orders", &orders)
            .finish()
    }
}

impl ResultFilterPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with the filters implied by `options`.
    ///
    /// The problem details filter is installed only when problem details are
    /// allowed for client errors and mapping is not suppressed.
    #[must_use]
    pub fn for_api_behavior(options: &ApiBehaviorOptions) -> Self {
        let mut pipeline = Self::new();
        if options.suppress_map_client_errors {
            tracing::debug!("client error mapping suppressed; problem details filter not installed");
        } else if !options.allow_use_problem_details_for_client_error_responses() {
            tracing::debug!("problem details not allowed for client errors; filter not installed");
        } else {
            pipeline.add(Arc::new(ProblemDetailsResultFilter::new(options)));
        }
        pipeline
    }

    pub fn add(&mut self, filter: Arc<dyn ResultFilter>) {
        self.filters.push(filter);
        // stable: equal orders keep registration order
        self.filters.sort_by_key(|filter| filter.order());
    }

    #[must_use]
    pub fn with(mut self, filter: Arc<dyn ResultFilter>) -> Self {
        self.add(filter);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run the filters over `outcome` for the request described by `action`.
    pub fn execute(
        &self,
        action: &ActionContext,
        outcome: ActionOutcome,
        short_circuited: bool,
    ) -> FilterRun {
        let mut ctx = ResultExecutingContext::new(action, outcome);
        let mut canceled = false;
        let mut ran = Vec::with_capacity(self.filters.len());

        for filter in &self.filters {
            if !filter.always_run() && (short_circuited || canceled) {
                continue;
            }
            filter.on_result_executing(&mut ctx);
            ran.push(filter);
            if ctx.cancel && !canceled {
                tracing::debug!(order = filter.order(), "result execution canceled by filter");
                canceled = true;
            }
        }

        let executed = ResultExecutedContext {
            action,
            result: &ctx.result,
            canceled,
        };
        for filter in ran.iter().rev() {
            filter.on_result_executed(&executed);
        }

        FilterRun {
            outcome: ctx.result,
            canceled,
        }
    }
}
