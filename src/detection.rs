use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A parsed detection: named searches plus the conditions combining them.
///
/// Detections are produced by a rule parser and handed to
/// [`RuleEvaluator::new`](crate::RuleEvaluator::new) or
/// [`for_detection`](crate::for_detection). Both serialize with serde, so a
/// parser in another process can ship them as JSON.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub searches: HashMap<String, Search>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Detection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search<S: Into<String>>(mut self, name: S, search: Search) -> Self {
        self.searches.insert(name.into(), search);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// A named search. It matches if any event matcher matches or any keyword
/// occurs somewhere in the event.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    #[serde(default)]
    pub event_matchers: Vec<EventMatcher>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Search {
    /// A search with a single event matcher.
    pub fn from_fields<I: IntoIterator<Item = FieldMatcher>>(fields: I) -> Self {
        Self {
            event_matchers: vec![EventMatcher::new(fields)],
            keywords: vec![],
        }
    }

    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            event_matchers: vec![],
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn or(mut self, matcher: EventMatcher) -> Self {
        self.event_matchers.push(matcher);
        self
    }
}

/// A conjunction of field matchers.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventMatcher(pub Vec<FieldMatcher>);

impl EventMatcher {
    pub fn new<I: IntoIterator<Item = FieldMatcher>>(fields: I) -> Self {
        Self(fields.into_iter().collect())
    }
}

/// One field condition, e.g. `CommandLine|contains|all: [a, b]` is the field
/// `CommandLine` with modifiers `contains` and `all` and values `a` and `b`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatcher {
    pub field: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl FieldMatcher {
    pub fn new<S, M, V>(
        field: S,
        modifiers: impl IntoIterator<Item = M>,
        values: impl IntoIterator<Item = V>,
    ) -> Self
    where
        S: Into<String>,
        M: Into<String>,
        V: Into<String>,
    {
        Self {
            field: field.into(),
            modifiers: modifiers.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// A matcher without modifiers.
    pub fn equals<S, V>(field: S, values: impl IntoIterator<Item = V>) -> Self
    where
        S: Into<String>,
        V: Into<String>,
    {
        Self::new(field, Vec::<String>::new(), values)
    }
}

/// A condition expression together with the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub search: SearchExpr,
    #[serde(default)]
    pub source: String,
}

impl Condition {
    pub fn new<S: Into<String>>(search: SearchExpr, source: S) -> Self {
        Self {
            search,
            source: source.into(),
        }
    }
}

impl From<SearchExpr> for Condition {
    fn from(search: SearchExpr) -> Self {
        Self {
            search,
            source: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchExpr {
    /// Reference to a search by name
    Search(String),
    And(Vec<SearchExpr>),
    Or(Vec<SearchExpr>),
    Not(Box<SearchExpr>),
    /// `all of them`
    AllOfThem,
    /// `1 of them`
    OneOfThem,
    /// `all of <glob>`
    AllOf(String),
    /// `1 of <glob>`
    OneOf(String),
}

impl SearchExpr {
    pub fn search<S: Into<String>>(name: S) -> Self {
        Self::Search(name.into())
    }

    pub fn not(expr: SearchExpr) -> Self {
        Self::Not(Box::new(expr))
    }
}
