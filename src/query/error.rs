use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid resource locator `{locator}`: {reason}")]
    InvalidResourceLocator { locator: String, reason: String },
}

impl QueryError {
    pub(crate) fn invalid_locator(locator: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidResourceLocator {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }
}
