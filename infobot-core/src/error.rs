use thiserror::Error;

/// A category string outside the closed taxonomy. Callers correct it with [`crate::Category::coerce`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid category: {0}")]
pub struct InvalidCategory(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid role: {0}")]
pub struct InvalidRole(pub String);
