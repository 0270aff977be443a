use crate::basevalue::BaseValue;
use crate::event::EventValue;
use crate::field::modifier::{MatchModifier, Modifier};
use crate::wildcard::WildcardPattern;
use cidr::IpCidr;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;

/// A candidate value of a field matcher, compiled for its modifiers.
#[derive(Debug, Clone)]
pub(crate) enum FieldValue {
    /// The literal `null`: the field is absent or explicitly null
    Null,
    WildcardPattern(WildcardPattern),
    Regex(Regex),
    Cidr(IpCidr),
    Number(f64),
    /// Name of another event field to compare against
    FieldRef(String),
}

impl FieldValue {
    pub(crate) fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compare one actual value against this candidate. Sequences match if
    /// any element matches.
    pub(crate) fn matches(&self, actual: &EventValue, modifier: &Modifier) -> bool {
        let target = match actual {
            EventValue::Value(v) => v,
            EventValue::Sequence(seq) => return seq.iter().any(|v| self.matches(v, modifier)),
            EventValue::Map(_) => return false,
        };

        match self {
            Self::Null => target.is_null(),
            _ if target.is_null() => false,
            Self::WildcardPattern(p) => p.is_match(&target.to_string()),
            Self::Regex(r) => r.is_match(&target.to_string()),
            Self::Cidr(c) => match IpAddr::from_str(target.to_string().trim()) {
                Ok(ip) => c.contains(&ip),
                Err(_) => false,
            },
            Self::Number(n) => match (target.as_f64(), modifier.match_modifier) {
                (Some(t), Some(MatchModifier::Gt)) => t > *n,
                (Some(t), Some(MatchModifier::Gte)) => t >= *n,
                (Some(t), Some(MatchModifier::Lt)) => t < *n,
                (Some(t), Some(MatchModifier::Lte)) => t <= *n,
                _ => false,
            },
            // Resolved against the event by the field matcher
            Self::FieldRef(_) => false,
        }
    }
}

/// Compare `actual` with the value of a referenced field. Only scalar
/// references take part; a missing or structured reference never matches.
pub(crate) fn fieldref_matches(
    actual: &EventValue,
    reference: Option<&EventValue>,
    modifier: &Modifier,
) -> bool {
    let Some(EventValue::Value(reference)) = reference else {
        return false;
    };
    if reference.is_null() {
        return false;
    }

    let mut needle = reference.to_string();
    if !modifier.cased {
        needle = needle.to_lowercase();
    }
    matches_reference(actual, &needle, modifier)
}

fn matches_reference(actual: &EventValue, needle: &str, modifier: &Modifier) -> bool {
    let target = match actual {
        EventValue::Value(BaseValue::Null) | EventValue::Map(_) => return false,
        EventValue::Value(v) => v.to_string(),
        EventValue::Sequence(seq) => {
            return seq
                .iter()
                .any(|v| matches_reference(v, needle, modifier))
        }
    };
    let target = if modifier.cased {
        target
    } else {
        target.to_lowercase()
    };

    match modifier.match_modifier {
        Some(MatchModifier::Contains) => target.contains(needle),
        Some(MatchModifier::StartsWith) => target.starts_with(needle),
        Some(MatchModifier::EndsWith) => target.ends_with(needle),
        _ => target == needle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(m: Option<MatchModifier>) -> Modifier {
        Modifier {
            match_modifier: m,
            ..Default::default()
        }
    }

    #[test]
    fn test_wildcard_stringifies_scalars() {
        let m = modifier(None);
        let wildcard = FieldValue::WildcardPattern(WildcardPattern::new("4?", true));

        assert!(wildcard.matches(&EventValue::from("42"), &m));
        assert!(wildcard.matches(&EventValue::from(43), &m));
        assert!(wildcard.matches(&EventValue::from(43u32), &m));
        assert!(!wildcard.matches(&EventValue::from(433), &m));
        assert!(!wildcard.matches(&EventValue::from(BaseValue::Null), &m));

        let wildcard = FieldValue::WildcardPattern(WildcardPattern::new("f*", true));
        assert!(wildcard.matches(&EventValue::from(false), &m));
        assert!(!wildcard.matches(&EventValue::from(true), &m));
    }

    #[test]
    fn test_null() {
        let m = modifier(None);
        assert!(FieldValue::Null.matches(&EventValue::from(BaseValue::Null), &m));
        assert!(!FieldValue::Null.matches(&EventValue::from("null"), &m));
        assert!(!FieldValue::Null.matches(&EventValue::from(""), &m));
    }

    #[test]
    fn test_sequence_matches_any_element() {
        let m = modifier(None);
        let wildcard = FieldValue::WildcardPattern(WildcardPattern::new("admin*", true));
        assert!(wildcard.matches(&EventValue::list(["users", "Administrators"]), &m));
        assert!(!wildcard.matches(&EventValue::list(["users", "guests"]), &m));
        assert!(!wildcard.matches(&EventValue::Sequence(vec![]), &m));
    }

    #[test]
    fn test_regex() {
        let m = modifier(Some(MatchModifier::Re));
        let re = FieldValue::Regex(Regex::new("foo.*baz").unwrap());
        assert!(re.matches(&EventValue::from("foo-bar-baz"), &m));
        assert!(!re.matches(&EventValue::from("foo"), &m));
        assert!(!re.matches(&EventValue::from("FOO-BAR-BAZ"), &m));
    }

    #[test]
    fn test_cidr() {
        let m = modifier(Some(MatchModifier::Cidr));
        let cidr = FieldValue::Cidr("10.0.0.0/8".parse().unwrap());
        assert!(cidr.matches(&EventValue::from("10.1.2.3"), &m));
        assert!(!cidr.matches(&EventValue::from("11.1.2.3"), &m));
        assert!(!cidr.matches(&EventValue::from("not an ip"), &m));
        assert!(!cidr.matches(&EventValue::from(10), &m));

        let cidr = FieldValue::Cidr("2001:db8::/32".parse().unwrap());
        assert!(cidr.matches(&EventValue::from("2001:db8::1"), &m));
    }

    #[test]
    fn test_numeric() {
        let n = FieldValue::Number(10.0);
        assert!(n.matches(&EventValue::from(11), &modifier(Some(MatchModifier::Gt))));
        assert!(!n.matches(&EventValue::from(10), &modifier(Some(MatchModifier::Gt))));
        assert!(n.matches(&EventValue::from(10), &modifier(Some(MatchModifier::Gte))));
        assert!(n.matches(&EventValue::from("9.5"), &modifier(Some(MatchModifier::Lt))));
        assert!(n.matches(&EventValue::from(10u32), &modifier(Some(MatchModifier::Lte))));
        assert!(!n.matches(&EventValue::from("ten"), &modifier(Some(MatchModifier::Lt))));
    }

    #[test]
    fn test_fieldref() {
        let reference = EventValue::from("Alice");
        assert!(fieldref_matches(
            &EventValue::from("alice"),
            Some(&reference),
            &modifier(None)
        ));
        assert!(fieldref_matches(
            &EventValue::from("C:\\Users\\Alice\\run.exe"),
            Some(&reference),
            &modifier(Some(MatchModifier::Contains))
        ));
        assert!(!fieldref_matches(&EventValue::from("alice"), None, &modifier(None)));

        let cased = Modifier {
            cased: true,
            ..Default::default()
        };
        assert!(!fieldref_matches(&EventValue::from("alice"), Some(&reference), &cased));
    }
}
