use crate::detection::Search;
use crate::error::{BuildError, EvalError};
use crate::event::QueryableEvent;
use crate::field::{Field, FieldOptions};
use crate::placeholder::Expansions;
use crate::wildcard::WildcardPattern;

/// A [`Search`] compiled for evaluation: an OR over event matchers, each an
/// AND over fields, plus keywords matched anywhere in the event.
#[derive(Debug)]
pub(crate) struct CompiledSearch {
    event_matchers: Vec<Vec<Field>>,
    keywords: Vec<WildcardPattern>,
}

impl CompiledSearch {
    pub(crate) fn compile(search: &Search, options: &FieldOptions) -> Result<Self, BuildError> {
        let mut event_matchers = Vec::with_capacity(search.event_matchers.len());
        for matcher in &search.event_matchers {
            let mut fields = Vec::with_capacity(matcher.0.len());
            for field in &matcher.0 {
                fields.push(Field::compile(field, options)?);
            }
            event_matchers.push(fields);
        }

        let keywords = search
            .keywords
            .iter()
            .map(|k| WildcardPattern::surrounded(k, true, true, true))
            .collect();

        Ok(Self {
            event_matchers,
            keywords,
        })
    }

    /// Event matchers run in declaration order and stop at the first match;
    /// fields within a matcher stop at the first miss. Errors abort at once.
    pub(crate) async fn evaluate<E: QueryableEvent>(
        &self,
        event: &E,
        expansions: &mut Expansions<'_>,
    ) -> Result<bool, EvalError> {
        for fields in &self.event_matchers {
            if self.all_fields_match(fields, event, expansions).await? {
                return Ok(true);
            }
        }

        Ok(self
            .keywords
            .iter()
            .any(|keyword| event.values().any(|v| v.contains_keyword(keyword))))
    }

    async fn all_fields_match<E: QueryableEvent>(
        &self,
        fields: &[Field],
        event: &E,
        expansions: &mut Expansions<'_>,
    ) -> Result<bool, EvalError> {
        for field in fields {
            if !field.evaluate(event, expansions).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
