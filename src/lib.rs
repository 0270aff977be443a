#![forbid(unsafe_code)]
//! `sigma-evaluator` evaluates parsed Sigma detections against log events.
//!
//! A [`Detection`] (named searches plus conditions) is compiled once into a
//! [`RuleEvaluator`], which can then be shared between tasks and asked
//! whether any condition holds for an event. Field values may contain
//! `%name%` placeholders that are resolved per evaluation through a
//! [`PlaceholderExpander`].

mod basevalue;
mod condition;
mod context;
mod detection;
mod error;
mod event;
mod field;
mod placeholder;
mod rule;
mod search;
mod wildcard;

pub use basevalue::BaseValue;
pub use context::Context;
pub use detection::{Condition, Detection, EventMatcher, FieldMatcher, Search, SearchExpr};
#[cfg(feature = "serde_json")]
pub use error::JSONError;
pub use error::{BoxError, BuildError, EvalError};
pub use event::{Event, EventValue, QueryableEvent};
pub use placeholder::{PlaceholderExpander, StaticPlaceholders};
pub use rule::{MatchResult, RuleEvaluator, RuleEvaluatorBuilder};
pub use tokio_util::sync::CancellationToken;

/// Start configuring an evaluator for `detection`
pub fn for_detection(detection: &Detection) -> RuleEvaluatorBuilder<'_> {
    RuleEvaluatorBuilder::new(detection)
}

/// Parse an event from a JSON string
#[cfg(feature = "serde_json")]
pub fn event_from_json(json: &str) -> Result<Event, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse a list of events from a JSON string
#[cfg(feature = "serde_json")]
pub fn events_from_json(json: &str) -> Result<Vec<Event>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Check if any condition of the evaluator's detection holds for an event
pub async fn check_event(
    evaluator: &RuleEvaluator,
    ctx: &Context,
    event: &Event,
) -> Result<bool, EvalError> {
    Ok(evaluator.matches(ctx, event).await?.matched)
}
