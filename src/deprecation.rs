/// The deprecation status of a retrieval from a source.
///
/// Only a [`SourceLookup`](crate::supplier::SourceLookup) owns a deprecation.
/// Stages that transform or combine values pass it through to the lookup they
/// wrap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Deprecation {
    #[default]
    NotDeprecated,
    /// Warn once, then return the value.
    Soft(String),
    /// Discard the value and fail with `Deprecated`.
    Hard(String),
}

impl Deprecation {
    pub fn soft(msg: impl Into<String>) -> Self {
        Deprecation::Soft(msg.into())
    }

    pub fn hard(msg: impl Into<String>) -> Self {
        Deprecation::Hard(msg.into())
    }

    pub fn is_deprecated(&self) -> bool {
        !matches!(self, Deprecation::NotDeprecated)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Deprecation::NotDeprecated => None,
            Deprecation::Soft(msg) | Deprecation::Hard(msg) => Some(msg),
        }
    }
}
