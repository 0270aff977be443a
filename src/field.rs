mod modifier;
mod transformation;
mod value;

use crate::detection::FieldMatcher;
use crate::error::{BuildError, EvalError};
use crate::event::{EventValue, QueryableEvent};
use crate::field::modifier::{MatchModifier, Modifier, ValueTransformer};
use crate::field::transformation::{encode_base64, encode_base64_offset, windash_variations};
use crate::field::value::{fieldref_matches, FieldValue};
use crate::placeholder::{is_placeholder, Expansions};
use crate::wildcard::WildcardPattern;
use cidr::IpCidr;
use regex::RegexBuilder;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// Evaluator wide settings that influence how a field matcher compiles.
#[derive(Debug, Default, Clone)]
pub(crate) struct FieldOptions {
    pub(crate) case_sensitive: bool,
    pub(crate) field_mappings: HashMap<String, Vec<String>>,
}

/// One declared value: compiled up front, or a placeholder compiled per call.
#[derive(Debug)]
enum Candidate {
    Literal(Vec<FieldValue>),
    Placeholder(String),
}

/// A [`FieldMatcher`] compiled for evaluation.
#[derive(Debug)]
pub(crate) struct Field {
    pub(crate) name: String,
    lookup_names: Vec<String>,
    candidates: Vec<Candidate>,
    modifier: Modifier,
    exists: Option<bool>,
}

impl Field {
    pub(crate) fn compile(matcher: &FieldMatcher, options: &FieldOptions) -> Result<Self, BuildError> {
        let name = matcher.field.clone();
        let mut modifier = Modifier::parse(&name, &matcher.modifiers)?;
        if options.case_sensitive {
            modifier.cased = true;
        }

        let lookup_names = options
            .field_mappings
            .get(&name)
            .cloned()
            .unwrap_or_else(|| vec![name.clone()]);

        let exists = if modifier.exists {
            match matcher.values.as_slice() {
                [v] if v.eq_ignore_ascii_case("true") => Some(true),
                [v] if v.eq_ignore_ascii_case("false") => Some(false),
                _ => return Err(BuildError::InvalidExistsValue(name)),
            }
        } else {
            None
        };

        let mut candidates = Vec::with_capacity(matcher.values.len());
        if exists.is_none() {
            for raw in &matcher.values {
                if is_placeholder(raw) {
                    candidates.push(Candidate::Placeholder(raw.clone()));
                } else {
                    candidates.push(Candidate::Literal(compile_value(&name, &modifier, raw)?));
                }
            }
        }

        Ok(Self {
            name,
            lookup_names,
            candidates,
            modifier,
            exists,
        })
    }

    /// True if any candidate matches, or with the `all` modifier if every
    /// candidate matches. Values are tried in declaration order and the
    /// first decisive one ends the evaluation, so a placeholder declared
    /// after a matching literal is never expanded and cannot fail the call.
    pub(crate) async fn evaluate<E: QueryableEvent>(
        &self,
        event: &E,
        expansions: &mut Expansions<'_>,
    ) -> Result<bool, EvalError> {
        let actual: Vec<&EventValue> = self
            .lookup_names
            .iter()
            .filter_map(|name| event.get(name))
            .collect();

        if let Some(expected) = self.exists {
            return Ok(!actual.is_empty() == expected);
        }

        let mut tried = 0;
        for candidate in &self.candidates {
            let expanded;
            let values = match candidate {
                Candidate::Literal(values) => values,
                Candidate::Placeholder(placeholder) => {
                    expanded = self.expand(placeholder, expansions).await?;
                    &expanded
                }
            };
            for value in values {
                tried += 1;
                if let Some(verdict) = self.decide(self.hit(value, &actual, event)) {
                    return Ok(verdict);
                }
            }
        }

        // Either nothing fired (any) or everything fired (all)
        Ok(self.modifier.match_all && tried > 0)
    }

    async fn expand(
        &self,
        placeholder: &str,
        expansions: &mut Expansions<'_>,
    ) -> Result<Vec<FieldValue>, EvalError> {
        let mut values = vec![];
        for raw in expansions.resolve(&self.name, placeholder).await? {
            let compiled = compile_value(&self.name, &self.modifier, raw).map_err(|source| {
                EvalError::InvalidExpansion {
                    field: self.name.clone(),
                    placeholder: placeholder.to_string(),
                    source,
                }
            })?;
            values.extend(compiled);
        }
        Ok(values)
    }

    fn decide(&self, fired: bool) -> Option<bool> {
        match (fired, self.modifier.match_all) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }

    fn hit<E: QueryableEvent>(&self, value: &FieldValue, actual: &[&EventValue], event: &E) -> bool {
        if actual.is_empty() {
            return value.is_null();
        }
        match value {
            FieldValue::FieldRef(other) => actual
                .iter()
                .any(|a| fieldref_matches(a, event.get(other), &self.modifier)),
            _ => actual.iter().any(|a| value.matches(a, &self.modifier)),
        }
    }
}

/// Compile one raw pattern under the field's modifiers. Transformers may turn
/// one raw value into several candidates; a malformed CIDR turns into none.
fn compile_value(name: &str, modifier: &Modifier, raw: &str) -> Result<Vec<FieldValue>, BuildError> {
    if modifier.fieldref {
        return Ok(vec![FieldValue::FieldRef(raw.to_string())]);
    }

    match modifier.match_modifier {
        Some(MatchModifier::Re) => {
            let flags = modifier.regex_flags;
            let re = RegexBuilder::new(raw)
                .case_insensitive(flags.ignore_case)
                .multi_line(flags.multi_line)
                .dot_matches_new_line(flags.dot_matches_new_line)
                .build()
                .map_err(|source| BuildError::InvalidRegex {
                    field: name.to_string(),
                    source,
                })?;
            return Ok(vec![FieldValue::Regex(re)]);
        }
        Some(MatchModifier::Cidr) => {
            return Ok(match IpCidr::from_str(raw.trim()) {
                Ok(cidr) => vec![FieldValue::Cidr(cidr)],
                Err(err) => {
                    warn!(field = name, pattern = raw, error = %err, "CIDR pattern never matches");
                    vec![]
                }
            });
        }
        Some(m) if m.is_numeric() => {
            let n = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| BuildError::InvalidNumber(name.to_string(), raw.to_string()))?;
            return Ok(vec![FieldValue::Number(n)]);
        }
        _ => {}
    }

    if raw == "null" && modifier.match_modifier.is_none() && modifier.value_transformer.is_none() {
        return Ok(vec![FieldValue::Null]);
    }

    let transformed = match modifier.value_transformer {
        Some(ValueTransformer::Base64(utf16)) => vec![encode_base64(raw, utf16)],
        Some(ValueTransformer::Base64offset(utf16)) => encode_base64_offset(raw, utf16),
        Some(ValueTransformer::Windash) => windash_variations(raw),
        None => vec![raw.to_string()],
    };

    let (leading, trailing) = match modifier.match_modifier {
        Some(MatchModifier::Contains) => (true, true),
        Some(MatchModifier::StartsWith) => (false, true),
        Some(MatchModifier::EndsWith) => (true, false),
        _ => (false, false),
    };
    Ok(transformed
        .iter()
        .map(|s| {
            FieldValue::WildcardPattern(WildcardPattern::surrounded(
                s,
                !modifier.cased,
                leading,
                trailing,
            ))
        })
        .collect())
}
