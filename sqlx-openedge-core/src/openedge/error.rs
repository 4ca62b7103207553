//! Error types for the OpenEdge dialects.

use sqlx_core::error::{BoxDynError, DatabaseError, ErrorKind};
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stable codes a native driver attaches to connection failures.
pub mod codes {
    pub const CONNECTION_REFUSED: &str = "ECONNREFUSED";
    pub const HOST_NOT_FOUND: &str = "ENOTFOUND";
    pub const HOST_UNREACHABLE: &str = "EHOSTUNREACH";
    pub const INVALID_PARAMETERS: &str = "EINVAL";
}

/// An error reported by the native driver.
///
/// `code` is the driver's stable classification code (see [`codes`]) and
/// `sqlstate` the ODBC/SQL diagnostic state, when the driver reported one.
#[derive(Debug)]
pub struct DriverError {
    pub(crate) message: String,
    pub(crate) code: Option<String>,
    pub(crate) sqlstate: Option<String>,
    pub(crate) source: Option<BoxDynError>,
}

impl DriverError {
    /// Create a new driver error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            sqlstate: None,
            source: None,
        }
    }

    /// Attach a stable classification code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach a SQLSTATE
    pub fn with_sqlstate(mut self, sqlstate: impl Into<String>) -> Self {
        self.sqlstate = Some(sqlstate.into());
        self
    }

    /// Attach the underlying error
    pub fn with_source(mut self, source: impl Into<BoxDynError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the stable classification code (`ECONNREFUSED`, ...) if available
    pub fn classification_code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Get the SQLSTATE code if available
    pub fn sqlstate(&self) -> Option<&str> {
        self.sqlstate.as_deref()
    }

    /// Whether the SQLSTATE reports a lost or unusable connection (class `08`).
    pub fn is_connection_exception(&self) -> bool {
        matches!(self.sqlstate.as_deref(), Some(s) if s.starts_with("08"))
    }

    fn is_transient(&self) -> bool {
        match self.sqlstate.as_deref() {
            Some(s) if s.starts_with("08") => true,
            Some("HYT00") | Some("HYT01") => true,
            _ => false,
        }
    }
}

impl Display for DriverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.message)
    }
}

impl StdError for DriverError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl DatabaseError for DriverError {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        self.sqlstate
            .as_deref()
            .or(self.code.as_deref())
            .map(Cow::Borrowed)
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> BoxDynError {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.sqlstate.as_deref() {
            Some("23505") => ErrorKind::UniqueViolation,
            Some("23503") => ErrorKind::ForeignKeyViolation,
            Some("23514") => ErrorKind::CheckViolation,
            Some("23502") => ErrorKind::NotNullViolation,
            _ => ErrorKind::Other,
        }
    }

    fn is_transient_in_connect_phase(&self) -> bool {
        self.is_transient()
    }
}

/// Errors surfaced by the dialect to its host.
///
/// Connection-establishment failures are classified into distinct variants
/// so a pool can retry or fail fast per kind; the driver's error is kept as
/// the source.
#[derive(Debug, thiserror::Error)]
pub enum OpenEdgeError {
    #[error("connection refused: {0}")]
    ConnectionRefused(#[source] DriverError),

    #[error("host not found: {0}")]
    HostNotFound(#[source] DriverError),

    #[error("host not reachable: {0}")]
    HostNotReachable(#[source] DriverError),

    #[error("invalid connection parameters: {0}")]
    InvalidConnection(#[source] DriverError),

    #[error("connection timed out: {0}")]
    ConnectionTimedOut(#[source] DriverError),

    #[error("connection error: {0}")]
    Connection(#[source] DriverError),

    /// The native driver (or the named ODBC driver) is not installed.
    #[error("Please install '{0}' module manually")]
    ModuleNotFound(String),

    #[error("query failed: {0}")]
    Query(#[source] DriverError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{key} is not supported by the {dialect} dialect")]
    UnsupportedType {
        key: &'static str,
        dialect: &'static str,
    },
}

impl OpenEdgeError {
    /// Classify a failed connection attempt by the driver's stable code.
    pub fn from_connect_failure(error: DriverError) -> Self {
        match error.classification_code() {
            Some(codes::CONNECTION_REFUSED) => Self::ConnectionRefused(error),
            Some(codes::HOST_NOT_FOUND) => Self::HostNotFound(error),
            Some(codes::HOST_UNREACHABLE) => Self::HostNotReachable(error),
            Some(codes::INVALID_PARAMETERS) => Self::InvalidConnection(error),
            _ => Self::Connection(error),
        }
    }

    /// The error a caller raises when it gives up waiting on a connect attempt.
    ///
    /// The connection manager never imposes a timeout itself.
    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::ConnectionTimedOut(DriverError::new(message))
    }

    /// The driver error behind this error, if any.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::ConnectionRefused(e)
            | Self::HostNotFound(e)
            | Self::HostNotReachable(e)
            | Self::InvalidConnection(e)
            | Self::ConnectionTimedOut(e)
            | Self::Connection(e)
            | Self::Query(e) => Some(e),
            Self::ModuleNotFound(_) | Self::Configuration(_) | Self::UnsupportedType { .. } => None,
        }
    }

    /// Whether this error came out of connection establishment.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused(_)
                | Self::HostNotFound(_)
                | Self::HostNotReachable(_)
                | Self::InvalidConnection(_)
                | Self::ConnectionTimedOut(_)
                | Self::Connection(_)
        )
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// Invalid parameters, a missing driver and configuration problems never
    /// fix themselves.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionRefused(_) | Self::HostNotReachable(_) | Self::ConnectionTimedOut(_) => {
                true
            }
            Self::Connection(e) | Self::Query(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl DatabaseError for OpenEdgeError {
    fn message(&self) -> &str {
        match self {
            Self::ModuleNotFound(name) => name,
            Self::Configuration(message) => message,
            Self::UnsupportedType { key, .. } => key,
            _ => self
                .driver_error()
                .map(|e| e.message.as_str())
                .unwrap_or_default(),
        }
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        self.driver_error().and_then(DatabaseError::code)
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> BoxDynError {
        self
    }

    fn kind(&self) -> ErrorKind {
        self.driver_error()
            .map(|e| e.kind())
            .unwrap_or(ErrorKind::Other)
    }

    fn is_transient_in_connect_phase(&self) -> bool {
        self.is_retryable()
    }
}
