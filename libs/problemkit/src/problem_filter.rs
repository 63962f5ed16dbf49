//! Turns bare status-code outcomes into Problem Details.

use std::collections::HashMap;

use http::StatusCode;

use crate::context::ResultExecutingContext;
use crate::filter::ResultFilter;
use crate::options::{ApiBehaviorOptions, ProblemDetailsFactory};
use crate::outcome::{ActionOutcome, ObjectResult};

/// Replaces `ActionOutcome::Status(code)` with an object result carrying the
/// problem produced by the factory registered for `code`.
///
/// Outcomes without a registered factory, and every non-status outcome, are
/// left untouched. The filter always runs, even for short-circuited results.
pub struct ProblemDetailsResultFilter {
    factories: HashMap<StatusCode, ProblemDetailsFactory>,
}

impl ProblemDetailsResultFilter {
    /// Gets the filter order. Runs ahead of filters with the default order.
    pub const ORDER: i32 = -1000;

    #[must_use]
    pub fn new(options: &ApiBehaviorOptions) -> Self {
        Self {
            factories: options.problem_details_factories().clone(),
        }
    }
}

impl ResultFilter for ProblemDetailsResultFilter {
    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn always_run(&self) -> bool {
        true
    }

    fn on_result_executing(&self, ctx: &mut ResultExecutingContext<'_>) {
        let ActionOutcome::Status(status) = ctx.result else {
            return;
        };
        let Some(factory) = self.factories.get(&status) else {
            return;
        };

        tracing::trace!(
            status = status.as_u16(),
            "converting status code result to problem details"
        );
        let problem = factory(ctx.action);
        ctx.result = ActionOutcome::Object(ObjectResult::new(status, problem));
    }
}
