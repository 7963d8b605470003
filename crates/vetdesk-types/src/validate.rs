use thiserror::Error;

/// A form guard tripped. The offending action is blocked locally and never
/// submitted; the message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("at least one {0} entry is required")]
    EmptyList(&'static str),
}
