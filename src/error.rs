use thiserror::Error;

/// Boxed error returned by placeholder expanders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while compiling a [`Detection`](crate::Detection) into a
/// [`RuleEvaluator`](crate::RuleEvaluator).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Unknown modifier '{1}' on field '{0}'")]
    UnknownModifier(String, String),

    #[error("Field '{0}' combines the modifiers '{1}' and '{2}'")]
    ConflictingModifiers(String, String, String),

    #[error("Modifier '{1}' on field '{0}' requires a base64 or base64offset modifier")]
    MissingTransformer(String, String),

    #[error("Invalid regular expression for field '{field}': {source}")]
    InvalidRegex {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Value '{1}' of field '{0}' is not a number")]
    InvalidNumber(String, String),

    #[error("The exists modifier on field '{0}' requires exactly one boolean value")]
    InvalidExistsValue(String),
}

/// Errors that abort a single [`matches`](crate::RuleEvaluator::matches) call.
///
/// Any error means the verdict is unknown, which is distinct from a successful
/// non-match.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Condition references unknown search '{0}'")]
    UnknownSearch(String),

    #[error("Failed to expand placeholder '{placeholder}' for field '{field}': {source}")]
    PlaceholderExpansionFailed {
        field: String,
        placeholder: String,
        #[source]
        source: BoxError,
    },

    #[error("Placeholder '{placeholder}' for field '{field}' expanded to an invalid pattern: {source}")]
    InvalidExpansion {
        field: String,
        placeholder: String,
        #[source]
        source: BuildError,
    },

    #[error("Evaluation was cancelled")]
    Cancelled,

    #[error("Evaluation deadline exceeded")]
    DeadlineExceeded,
}

#[cfg(feature = "serde_json")]
#[derive(Debug, Error)]
pub enum JSONError {
    #[error("Invalid field value: {0}")]
    InvalidFieldValue(String),

    #[error("An event must be a JSON object")]
    InvalidEvent(),
}
