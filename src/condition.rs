use crate::detection::SearchExpr;
use crate::error::EvalError;
use crate::wildcard::WildcardPattern;
use std::collections::HashMap;

/// A condition expression with every aggregate resolved to the concrete list
/// of search names it covers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CompiledCondition {
    Search(String),
    And(Vec<CompiledCondition>),
    Or(Vec<CompiledCondition>),
    Not(Box<CompiledCondition>),
    /// `all of them`: true over zero searches
    AllOfThem(Vec<String>),
    /// `all of <glob>`: false when the glob selects nothing
    AllOf(Vec<String>),
    OneOf(Vec<String>),
}

impl CompiledCondition {
    /// `search_names` must be sorted; aggregates keep that order.
    pub(crate) fn compile(expr: &SearchExpr, search_names: &[String]) -> Self {
        match expr {
            SearchExpr::Search(name) => Self::Search(name.clone()),
            SearchExpr::And(children) => Self::And(
                children
                    .iter()
                    .map(|c| Self::compile(c, search_names))
                    .collect(),
            ),
            SearchExpr::Or(children) => Self::Or(
                children
                    .iter()
                    .map(|c| Self::compile(c, search_names))
                    .collect(),
            ),
            SearchExpr::Not(child) => Self::Not(Box::new(Self::compile(child, search_names))),
            SearchExpr::AllOfThem => Self::AllOfThem(search_names.to_vec()),
            SearchExpr::OneOfThem => Self::OneOf(search_names.to_vec()),
            SearchExpr::AllOf(glob) => Self::AllOf(select(glob, search_names)),
            SearchExpr::OneOf(glob) => Self::OneOf(select(glob, search_names)),
        }
    }

    /// Evaluate against the results of every search. `And`/`Or` short-circuit
    /// left to right. A glob aggregate selecting zero searches is false, while
    /// `all of them` over zero searches is true.
    pub(crate) fn evaluate(&self, results: &HashMap<String, bool>) -> Result<bool, EvalError> {
        match self {
            Self::Search(name) => lookup(results, name),
            Self::And(children) => {
                for child in children {
                    if !child.evaluate(results)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(children) => {
                for child in children {
                    if child.evaluate(results)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(child) => Ok(!child.evaluate(results)?),
            Self::AllOfThem(names) => all(results, names),
            Self::AllOf(names) => {
                if names.is_empty() {
                    return Ok(false);
                }
                all(results, names)
            }
            Self::OneOf(names) => {
                for name in names {
                    if lookup(results, name)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn all(results: &HashMap<String, bool>, names: &[String]) -> Result<bool, EvalError> {
    for name in names {
        if !lookup(results, name)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn lookup(results: &HashMap<String, bool>, name: &str) -> Result<bool, EvalError> {
    results
        .get(name)
        .copied()
        .ok_or_else(|| EvalError::UnknownSearch(name.to_string()))
}

// Search names are identifiers, so the glob is matched case-sensitively
fn select(glob: &str, search_names: &[String]) -> Vec<String> {
    let pattern = WildcardPattern::new(glob, false);
    search_names
        .iter()
        .filter(|name| pattern.is_match(name))
        .cloned()
        .collect()
}
