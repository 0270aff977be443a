use crate::basevalue::BaseValue;
use crate::wildcard::WildcardPattern;
use std::collections::HashMap;
use std::hash::Hash;

#[cfg(feature = "serde_json")]
#[derive(Debug, serde::Deserialize)]
struct EventProxy {
    #[serde(flatten)]
    value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Value(BaseValue),
    Sequence(Vec<EventValue>),
    Map(HashMap<String, EventValue>),
}

#[cfg(feature = "serde_json")]
impl TryFrom<serde_json::Value> for EventValue {
    type Error = crate::error::JSONError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Array(a) => {
                let mut result = Vec::with_capacity(a.len());
                for item in a {
                    result.push(Self::try_from(item)?);
                }
                Ok(Self::Sequence(result))
            }
            serde_json::Value::Object(data) => {
                let mut result = HashMap::with_capacity(data.len());
                for (key, value) in data {
                    result.insert(key, Self::try_from(value)?);
                }
                Ok(Self::Map(result))
            }
            scalar => Ok(Self::Value(BaseValue::try_from(scalar)?)),
        }
    }
}

impl EventValue {
    /// Build a sequence value from anything convertible into scalars.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<BaseValue>,
    {
        Self::Sequence(items.into_iter().map(|v| Self::Value(v.into())).collect())
    }

    /// Returns the string representation of an EventValue
    pub fn value_to_string(&self) -> String {
        match self {
            Self::Value(v) => v.to_string(),
            Self::Sequence(v) => format!(
                "[{}]",
                v.iter()
                    .map(|v| v.value_to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            Self::Map(m) => format!(
                "{{{}}}",
                m.iter()
                    .map(|(k, v)| format!("{}: {}", k, v.value_to_string()))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        }
    }

    /// Keyword search descends into sequences and nested maps.
    pub(crate) fn contains_keyword(&self, keyword: &WildcardPattern) -> bool {
        match self {
            Self::Value(BaseValue::Null) => false,
            Self::Value(v) => keyword.is_match(&v.to_string()),
            Self::Sequence(seq) => seq.iter().any(|v| v.contains_keyword(keyword)),
            Self::Map(m) => m.values().any(|v| v.contains_keyword(keyword)),
        }
    }
}

impl<T> From<T> for EventValue
where
    T: Into<BaseValue>,
{
    fn from(value: T) -> Self {
        Self::Value(value.into())
    }
}

/// `QueryableEvent` is the read-only lookup the evaluator needs. Implement it
/// to run detections on top of your own data structures instead of copying
/// them into an [`Event`].
pub trait QueryableEvent {
    /// Get the value for a key in the event
    fn get(&self, key: &str) -> Option<&EventValue>;

    /// All top-level values, used by keyword searches
    fn values(&self) -> impl Iterator<Item = &EventValue>;
}

/// The `Event` struct represents a log event.
///
/// It is a collection of key-value pairs where the value is a string, number,
/// boolean, null, a sequence of those or a nested map.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde_json", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde_json", serde(try_from = "EventProxy"))]
pub struct Event {
    inner: HashMap<String, EventValue>,
}

#[cfg(feature = "serde_json")]
impl TryFrom<EventProxy> for Event {
    type Error = crate::error::JSONError;

    fn try_from(other: EventProxy) -> Result<Self, Self::Error> {
        Self::try_from(other.value)
    }
}

impl<T, S, const N: usize> From<[(S, T); N]> for Event
where
    S: Into<String> + Hash + Eq,
    T: Into<EventValue>,
{
    fn from(values: [(S, T); N]) -> Self {
        let mut event = Self::default();
        for (k, v) in values {
            event.insert(k, v);
        }
        event
    }
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key-value pair into the event.
    /// If the key already exists, the value will be replaced.
    ///
    /// # Example
    /// ```rust
    /// use sigma_evaluator::{Event, EventValue};
    /// let mut event = Event::new();
    /// event.insert("name", "John Doe");
    /// event.insert("age", 43);
    /// event.insert("is_admin", true);
    /// event.insert("groups", EventValue::list(["users", "admins"]));
    /// ```
    pub fn insert<T, S>(&mut self, key: S, value: T)
    where
        S: Into<String> + Hash + Eq,
        T: Into<EventValue>,
    {
        self.inner.insert(key.into(), value.into());
    }
}

impl QueryableEvent for Event {
    /// Exact keys win over dotted paths into nested maps
    fn get(&self, key: &str) -> Option<&EventValue> {
        if let Some(ev) = self.inner.get(key) {
            return Some(ev);
        }

        let mut nested_key = key;
        let mut current = &self.inner;
        while let Some((head, tail)) = nested_key.split_once('.') {
            let Some(EventValue::Map(map)) = current.get(head) else {
                return None;
            };
            if let Some(value) = map.get(tail) {
                return Some(value);
            }
            current = map;
            nested_key = tail;
        }
        None
    }

    fn values(&self) -> impl Iterator<Item = &EventValue> {
        self.inner.values()
    }
}

#[cfg(feature = "serde_json")]
impl TryFrom<serde_json::Value> for Event {
    type Error = crate::error::JSONError;

    fn try_from(data: serde_json::Value) -> Result<Self, Self::Error> {
        let serde_json::Value::Object(data) = data else {
            return Err(Self::Error::InvalidEvent());
        };
        let mut result = Self::default();
        for (key, value) in data {
            result.insert(key, EventValue::try_from(value)?);
        }
        Ok(result)
    }
}
