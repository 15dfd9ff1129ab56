use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification shared by every component of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unknown,
    NotFound,
    UniqueConstraint,
    InvalidInput,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unknown => write!(f, "unknown"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::UniqueConstraint => write!(f, "unique constraint"),
            ErrorKind::InvalidInput => write!(f, "invalid input"),
        }
    }
}

/// Tagged error carrying a kind, a message and an optional underlying cause.
///
/// Renders as `"<message>: <cause>"` when a cause is attached, otherwise as
/// the bare message. The cause is reachable through
/// [`std::error::Error::source`].
#[derive(Error, Debug)]
#[error("{}", render(.message, .source))]
pub struct ShelfError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

fn render(message: &str, source: &Option<BoxError>) -> String {
    match source {
        Some(cause) => format!("{}: {}", message, cause),
        None => message.to_string(),
    }
}

impl ShelfError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps `cause` under a new kind and message.
    pub fn wrap<E>(kind: ErrorKind, cause: E, message: impl Into<String>) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            kind,
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Shorthand for the "<field> is required" validation failure.
    pub fn required(field: &str) -> Self {
        Self::invalid_input(format!("{} is required", field))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Takes the wrapped cause out of the error, if there is one.
    pub fn into_source(self) -> Option<BoxError> {
        self.source
    }
}

impl From<sqlx::Error> for ShelfError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::wrap(ErrorKind::NotFound, err, "record not found"),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::wrap(ErrorKind::UniqueConstraint, err, "record already exists")
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::wrap(ErrorKind::NotFound, err, "referenced record not found")
            }
            _ => Self::wrap(ErrorKind::Unknown, err, "database error"),
        }
    }
}

impl From<serde_json::Error> for ShelfError {
    fn from(err: serde_json::Error) -> Self {
        Self::wrap(ErrorKind::Unknown, err, "serialization error")
    }
}

impl From<url::ParseError> for ShelfError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_input(format!("invalid url: {}", err))
    }
}

impl From<std::io::Error> for ShelfError {
    fn from(err: std::io::Error) -> Self {
        Self::wrap(ErrorKind::Unknown, err, "io error")
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn renders_message_without_cause() {
        let err = ShelfError::new(ErrorKind::InvalidInput, "slug is required");
        assert_eq!(err.to_string(), "slug is required");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.source().is_none());
    }

    #[test]
    fn renders_message_with_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = ShelfError::wrap(ErrorKind::Unknown, cause, "failed to save series");
        assert_eq!(err.to_string(), "failed to save series: disk on fire");
        assert!(err.is(ErrorKind::Unknown));

        let source = err.source().expect("cause is kept");
        assert_eq!(source.to_string(), "disk on fire");
    }

    #[test]
    fn wrapping_changes_kind_but_keeps_cause_chain() {
        let inner = ShelfError::not_found("series not found");
        let outer = ShelfError::wrap(ErrorKind::Unknown, inner, "sync failed");
        assert_eq!(outer.kind(), ErrorKind::Unknown);
        assert_eq!(outer.to_string(), "sync failed: series not found");

        let cause = outer.into_source().expect("cause is kept");
        let inner = cause.downcast_ref::<ShelfError>().expect("cause is a ShelfError");
        assert_eq!(inner.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: ShelfError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn bad_url_is_local_invalid_input() {
        let err: ShelfError = url::Url::parse("https://exa mple.com").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().starts_with("invalid url: "));
        assert!(err.source().is_none());
    }

    #[test]
    fn required_uses_field_name() {
        let err = ShelfError::required("chapter");
        assert_eq!(err.to_string(), "chapter is required");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
