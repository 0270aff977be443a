use crate::context::Context;
use crate::error::{BoxError, EvalError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// Resolves a `%name%` placeholder to the concrete values it stands for.
///
/// The token is passed verbatim, including the surrounding `%`. Implementations
/// are shared by all concurrent evaluations of a rule and must be safe to call
/// concurrently; the evaluator does not serialize access.
///
/// Closures of the shape `Fn(Context, String) -> impl Future<Output = Result<Vec<String>, BoxError>>`
/// implement this trait.
#[async_trait]
pub trait PlaceholderExpander: Send + Sync {
    async fn expand(&self, ctx: &Context, placeholder: &str) -> Result<Vec<String>, BoxError>;
}

#[async_trait]
impl<F, Fut> PlaceholderExpander for F
where
    F: Fn(Context, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>, BoxError>> + Send + 'static,
{
    async fn expand(&self, ctx: &Context, placeholder: &str) -> Result<Vec<String>, BoxError> {
        (self)(ctx.clone(), placeholder.to_string()).await
    }
}

/// A fixed placeholder table, e.g. loaded from configuration at startup.
#[derive(Debug, Default, Clone)]
pub struct StaticPlaceholders {
    values: HashMap<String, Vec<String>>,
}

impl StaticPlaceholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S, I, V>(&mut self, placeholder: S, values: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.values.insert(
            placeholder.into(),
            values.into_iter().map(Into::into).collect(),
        );
    }
}

impl<S, V, const N: usize> From<[(S, Vec<V>); N]> for StaticPlaceholders
where
    S: Into<String>,
    V: Into<String>,
{
    fn from(entries: [(S, Vec<V>); N]) -> Self {
        let mut result = Self::new();
        for (placeholder, values) in entries {
            result.insert(placeholder, values);
        }
        result
    }
}

#[async_trait]
impl PlaceholderExpander for StaticPlaceholders {
    async fn expand(&self, _ctx: &Context, placeholder: &str) -> Result<Vec<String>, BoxError> {
        Ok(self.values.get(placeholder).cloned().unwrap_or_default())
    }
}

pub(crate) fn is_placeholder(value: &str) -> bool {
    value.len() > 2
        && value.starts_with('%')
        && value.ends_with('%')
        && !value[1..value.len() - 1].contains('%')
}

/// Placeholder values resolved during one evaluation. Each distinct
/// placeholder reaches the expander at most once; the cache dies with the
/// call because expansions may change between events.
pub(crate) struct Expansions<'a> {
    ctx: &'a Context,
    expander: Option<&'a dyn PlaceholderExpander>,
    resolved: HashMap<String, Vec<String>>,
}

impl<'a> Expansions<'a> {
    pub(crate) fn new(ctx: &'a Context, expander: Option<&'a dyn PlaceholderExpander>) -> Self {
        Self {
            ctx,
            expander,
            resolved: HashMap::new(),
        }
    }

    pub(crate) async fn resolve(
        &mut self,
        field: &str,
        placeholder: &str,
    ) -> Result<&[String], EvalError> {
        if !self.resolved.contains_key(placeholder) {
            let values = match self.expander {
                Some(expander) => self
                    .ctx
                    .run(expander.expand(self.ctx, placeholder))
                    .await?
                    .map_err(|source| EvalError::PlaceholderExpansionFailed {
                        field: field.to_string(),
                        placeholder: placeholder.to_string(),
                        source,
                    })?,
                None => vec![],
            };
            debug!(placeholder, count = values.len(), "expanded placeholder");
            self.resolved.insert(placeholder.to_string(), values);
        }

        Ok(self
            .resolved
            .get(placeholder)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}
