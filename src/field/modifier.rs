use crate::error::BuildError;
use std::str::FromStr;
use strum::{Display, EnumString};

// https://sigmahq.io/docs/basics/modifiers.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum MatchModifier {
    Contains,
    StartsWith,
    EndsWith,
    Re,
    Cidr,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl MatchModifier {
    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Utf16Modifier {
    Utf16le,
    Utf16be,
    Utf16,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueTransformer {
    Base64(Option<Utf16Modifier>),
    Base64offset(Option<Utf16Modifier>),
    Windash,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RegexFlags {
    pub(crate) ignore_case: bool,
    pub(crate) multi_line: bool,
    pub(crate) dot_matches_new_line: bool,
}

/// The parsed modifier chain of one field matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Modifier {
    pub(crate) match_modifier: Option<MatchModifier>,
    pub(crate) value_transformer: Option<ValueTransformer>,
    pub(crate) regex_flags: RegexFlags,
    pub(crate) match_all: bool,
    pub(crate) cased: bool,
    pub(crate) exists: bool,
    pub(crate) fieldref: bool,
}

impl Modifier {
    pub(crate) fn parse<S: AsRef<str>>(field: &str, tags: &[S]) -> Result<Self, BuildError> {
        let mut result = Self::default();
        let mut utf16: Option<Utf16Modifier> = None;
        let mut pending_flags: Vec<String> = vec![];

        for tag in tags.iter().map(|t| t.as_ref()) {
            let lowered = tag.to_lowercase();
            let conflict = |a: &str, b: &str| {
                BuildError::ConflictingModifiers(field.to_string(), a.to_string(), b.to_string())
            };

            match lowered.as_str() {
                "all" => result.match_all = true,
                "cased" => result.cased = true,
                "exists" => result.exists = true,
                "fieldref" => result.fieldref = true,
                "windash" | "base64" | "base64offset" => {
                    if let Some(existing) = result.value_transformer {
                        return Err(conflict(transformer_name(&existing), tag));
                    }
                    result.value_transformer = Some(match lowered.as_str() {
                        "windash" => ValueTransformer::Windash,
                        "base64" => ValueTransformer::Base64(None),
                        _ => ValueTransformer::Base64offset(None),
                    });
                }
                flag @ ("i" | "m" | "s") => pending_flags.push(flag.to_string()),
                other => {
                    if let Ok(u) = Utf16Modifier::from_str(other) {
                        utf16 = Some(u);
                    } else if let Ok(m) = MatchModifier::from_str(other) {
                        if let Some(existing) = result.match_modifier {
                            return Err(conflict(&existing.to_string(), tag));
                        }
                        result.match_modifier = Some(m);
                    } else {
                        return Err(BuildError::UnknownModifier(
                            field.to_string(),
                            tag.to_string(),
                        ));
                    }
                }
            }
        }

        if let Some(u) = utf16 {
            result.value_transformer = match result.value_transformer {
                Some(ValueTransformer::Base64(_)) => Some(ValueTransformer::Base64(Some(u))),
                Some(ValueTransformer::Base64offset(_)) => {
                    Some(ValueTransformer::Base64offset(Some(u)))
                }
                _ => {
                    return Err(BuildError::MissingTransformer(
                        field.to_string(),
                        u.to_string(),
                    ))
                }
            };
        }

        for flag in pending_flags {
            if result.match_modifier != Some(MatchModifier::Re) {
                return Err(BuildError::UnknownModifier(field.to_string(), flag));
            }
            match flag.as_str() {
                "i" => result.regex_flags.ignore_case = true,
                "m" => result.regex_flags.multi_line = true,
                _ => result.regex_flags.dot_matches_new_line = true,
            }
        }

        Ok(result)
    }
}

fn transformer_name(transformer: &ValueTransformer) -> &'static str {
    match transformer {
        ValueTransformer::Base64(_) => "base64",
        ValueTransformer::Base64offset(_) => "base64offset",
        ValueTransformer::Windash => "windash",
    }
}
