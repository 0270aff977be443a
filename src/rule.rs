use crate::condition::CompiledCondition;
use crate::context::Context;
use crate::detection::Detection;
use crate::error::{BuildError, EvalError};
use crate::event::QueryableEvent;
use crate::field::FieldOptions;
use crate::placeholder::{Expansions, PlaceholderExpander};
use crate::search::CompiledSearch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The outcome of evaluating one event.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// True if any condition holds
    pub matched: bool,
    /// The result of every search, by name
    pub search_results: HashMap<String, bool>,
    /// The result of every condition, in declaration order
    pub condition_results: Vec<bool>,
}

/// Configures how a [`Detection`] is compiled into a [`RuleEvaluator`].
pub struct RuleEvaluatorBuilder<'a> {
    detection: &'a Detection,
    expander: Option<Arc<dyn PlaceholderExpander>>,
    options: FieldOptions,
}

impl<'a> RuleEvaluatorBuilder<'a> {
    pub fn new(detection: &'a Detection) -> Self {
        Self {
            detection,
            expander: None,
            options: FieldOptions::default(),
        }
    }

    /// Resolve `%name%` placeholders through `expander`. Without one,
    /// placeholders contribute no candidate values.
    pub fn with_placeholder_expander<P>(mut self, expander: P) -> Self
    where
        P: PlaceholderExpander + 'static,
    {
        let expander: Arc<dyn PlaceholderExpander> = Arc::new(expander);
        self.expander = Some(expander);
        self
    }

    /// Match every field as if it carried the `cased` modifier.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.options.case_sensitive = case_sensitive;
        self
    }

    /// Look `field` up under the `targets` names instead, e.g. to run a
    /// Sysmon rule against ECS events.
    pub fn with_field_mapping<S, I, T>(mut self, field: S, targets: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.options.field_mappings.insert(
            field.into(),
            targets.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn build(self) -> Result<RuleEvaluator, BuildError> {
        let mut names: Vec<&String> = self.detection.searches.keys().collect();
        names.sort();

        let mut searches = Vec::with_capacity(names.len());
        for name in names {
            let search = CompiledSearch::compile(&self.detection.searches[name], &self.options)?;
            searches.push((name.clone(), search));
        }

        let search_names: Vec<String> = searches.iter().map(|(name, _)| name.clone()).collect();
        let conditions = self
            .detection
            .conditions
            .iter()
            .map(|c| (c.source.clone(), CompiledCondition::compile(&c.search, &search_names)))
            .collect();

        Ok(RuleEvaluator {
            searches,
            conditions,
            expander: self.expander,
        })
    }
}

/// A compiled detection, reusable across events and safe to share between
/// tasks.
///
/// ```rust
/// use sigma_evaluator::{Context, Detection, Event, FieldMatcher, RuleEvaluator, Search, SearchExpr};
///
/// let detection = Detection::new()
///     .with_search("selection", Search::from_fields([FieldMatcher::equals("Image", ["*\\whoami.exe"])]))
///     .with_condition(SearchExpr::search("selection").into());
/// let evaluator = RuleEvaluator::new(&detection).unwrap();
///
/// let event = Event::from([("Image", "C:\\Windows\\System32\\whoami.exe")]);
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let result = runtime.block_on(evaluator.matches(&Context::new(), &event)).unwrap();
/// assert!(result.matched);
/// ```
pub struct RuleEvaluator {
    // Sorted by name so errors surface deterministically
    searches: Vec<(String, CompiledSearch)>,
    conditions: Vec<(String, CompiledCondition)>,
    expander: Option<Arc<dyn PlaceholderExpander>>,
}

impl fmt::Debug for RuleEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEvaluator")
            .field("searches", &self.searches)
            .field("conditions", &self.conditions)
            .field("expander", &self.expander.is_some())
            .finish()
    }
}

impl RuleEvaluator {
    /// Compile `detection` with default options.
    pub fn new(detection: &Detection) -> Result<Self, BuildError> {
        RuleEvaluatorBuilder::new(detection).build()
    }

    /// Evaluate every search once, then every condition against the search
    /// results. Any error means the verdict is unknown and no partial result
    /// is returned.
    ///
    /// Must run inside a tokio runtime with the time driver enabled
    /// (`enable_time`, or `enable_all`): placeholder lookups under a context
    /// with a deadline wait on a tokio timer and panic without one.
    pub async fn matches<E: QueryableEvent>(
        &self,
        ctx: &Context,
        event: &E,
    ) -> Result<MatchResult, EvalError> {
        ctx.check()?;
        let mut expansions = Expansions::new(ctx, self.expander.as_deref());

        let mut search_results = HashMap::with_capacity(self.searches.len());
        for (name, search) in &self.searches {
            ctx.check()?;
            let result = search.evaluate(event, &mut expansions).await?;
            trace!(search = name.as_str(), result, "evaluated search");
            search_results.insert(name.clone(), result);
        }

        let mut condition_results = Vec::with_capacity(self.conditions.len());
        for (source, condition) in &self.conditions {
            let result = condition.evaluate(&search_results)?;
            trace!(condition = source.as_str(), result, "evaluated condition");
            condition_results.push(result);
        }

        let matched = condition_results.iter().any(|r| *r);
        debug!(matched, "evaluated detection");

        Ok(MatchResult {
            matched,
            search_results,
            condition_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{FieldMatcher, Search, SearchExpr};
    use crate::event::Event;

    fn search(field: &str, value: &str) -> Search {
        Search::from_fields([FieldMatcher::equals(field, [value])])
    }

    fn scenario() -> Detection {
        Detection::new()
            .with_search("foo", search("foo-field", "foo-value"))
            .with_search("bar", search("bar-field", "bar-value"))
            .with_search("baz", search("baz-field", "baz-value"))
            .with_search("null-field", search("non-existent-field", "null"))
            .with_condition(
                SearchExpr::And(vec![
                    SearchExpr::search("foo"),
                    SearchExpr::search("bar"),
                    SearchExpr::search("null-field"),
                ])
                .into(),
            )
            .with_condition(SearchExpr::AllOfThem.into())
    }

    fn scenario_event() -> Event {
        Event::from([
            ("foo-field", "foo-value"),
            ("bar-field", "bar-value"),
            ("baz-field", "wrong-value"),
        ])
    }

    #[tokio::test]
    async fn test_scenario() {
        let evaluator = RuleEvaluator::new(&scenario()).unwrap();
        let result = evaluator
            .matches(&Context::new(), &scenario_event())
            .await
            .unwrap();

        let expected: HashMap<String, bool> = [
            ("foo", true),
            ("bar", true),
            ("baz", false),
            ("null-field", true),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        assert_eq!(result.search_results, expected);
        assert_eq!(result.condition_results, vec![true, false]);
        assert!(result.matched);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let evaluator = RuleEvaluator::new(&scenario()).unwrap();
        let ctx = Context::new();
        let event = scenario_event();
        let first = evaluator.matches(&ctx, &event).await.unwrap();
        let second = evaluator.matches(&ctx, &event).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_no_conditions_never_matches() {
        let detection = Detection::new().with_search("foo", search("a", "b"));
        let evaluator = RuleEvaluator::new(&detection).unwrap();
        let result = evaluator
            .matches(&Context::new(), &Event::from([("a", "b")]))
            .await
            .unwrap();
        assert!(result.search_results["foo"]);
        assert!(result.condition_results.is_empty());
        assert!(!result.matched);
    }

    #[tokio::test]
    async fn test_all_of_them_without_searches() {
        let detection = Detection::new()
            .with_condition(SearchExpr::AllOfThem.into())
            .with_condition(SearchExpr::OneOfThem.into())
            .with_condition(SearchExpr::AllOf("selection_*".into()).into());
        let evaluator = RuleEvaluator::new(&detection).unwrap();
        let result = evaluator
            .matches(&Context::new(), &Event::from([("a", "b")]))
            .await
            .unwrap();
        assert!(result.search_results.is_empty());
        assert_eq!(result.condition_results, vec![true, false, false]);
        assert!(result.matched);
    }

    #[tokio::test]
    async fn test_unknown_search_is_an_error() {
        let detection = Detection::new()
            .with_search("foo", search("a", "b"))
            .with_condition(SearchExpr::search("foo").into())
            .with_condition(SearchExpr::search("bar").into());
        let evaluator = RuleEvaluator::new(&detection).unwrap();
        let err = evaluator
            .matches(&Context::new(), &Event::from([("a", "b")]))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownSearch(name) if name == "bar"));
    }

    #[tokio::test]
    async fn test_invalid_regex_fails_build() {
        let detection = Detection::new().with_search(
            "foo",
            Search::from_fields([FieldMatcher::new("a", ["re"], ["("])]),
        );
        assert!(matches!(
            RuleEvaluator::new(&detection),
            Err(BuildError::InvalidRegex { .. })
        ));
    }

    #[tokio::test]
    async fn test_builder_options() {
        let detection = Detection::new()
            .with_search("foo", search("Image", "*\\cmd.exe"))
            .with_condition(SearchExpr::search("foo").into());
        let event = Event::from([("process.executable", "C:\\Windows\\CMD.EXE")]);
        let ctx = Context::new();

        let evaluator = RuleEvaluatorBuilder::new(&detection)
            .with_field_mapping("Image", ["process.executable"])
            .build()
            .unwrap();
        assert!(evaluator.matches(&ctx, &event).await.unwrap().matched);

        let evaluator = RuleEvaluatorBuilder::new(&detection)
            .with_field_mapping("Image", ["process.executable"])
            .case_sensitive(true)
            .build()
            .unwrap();
        assert!(!evaluator.matches(&ctx, &event).await.unwrap().matched);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let evaluator = RuleEvaluator::new(&scenario()).unwrap();
        let ctx = Context::new();
        ctx.cancel();
        assert!(matches!(
            evaluator.matches(&ctx, &scenario_event()).await,
            Err(EvalError::Cancelled)
        ));
    }
}
