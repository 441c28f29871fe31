//! Unified application error types for EventHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the `?` operator. Business-rule violations carry a
//! machine-stable [`Reason`]; everything else is an infrastructure fault.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// The caller does not have permission to perform the action.
    Authorization,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate entry, stale write, etc.).
    Conflict,
    /// An internal server error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// Some writes of a multi-write operation were applied, others were not.
    PartialWrite,
    /// The operation exceeded its deadline.
    Timeout,
    /// The caller cancelled the operation.
    Cancelled,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::PartialWrite => write!(f, "PARTIAL_WRITE"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// Machine-stable reason code for a rejected membership transition.
///
/// These are business-rule violations. The transport layer maps them to a
/// client error carrying [`Reason::code`]; they are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    UserNotFound,
    EventNotFound,
    Forbidden,
    AlreadyRegistered,
    NotRegistered,
    OrganizerCannotLeave,
    OrganizerCannotBeRemoved,
    InvalidRole,
    EventNotOpen,
    EventFinished,
    EventTitleReserved,
    DuplicateActivity,
    ActivityNotFound,
    InvalidEventWindow,
    UserBanned,
    EmailTaken,
}

impl Reason {
    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::NotRegistered => "NOT_REGISTERED",
            Self::OrganizerCannotLeave => "ORGANIZER_CANNOT_LEAVE",
            Self::OrganizerCannotBeRemoved => "ORGANIZER_CANNOT_BE_REMOVED",
            Self::InvalidRole => "INVALID_ROLE",
            Self::EventNotOpen => "EVENT_NOT_OPEN",
            Self::EventFinished => "EVENT_FINISHED",
            Self::EventTitleReserved => "EVENT_TITLE_RESERVED",
            Self::DuplicateActivity => "DUPLICATE_ACTIVITY",
            Self::ActivityNotFound => "ACTIVITY_NOT_FOUND",
            Self::InvalidEventWindow => "INVALID_EVENT_WINDOW",
            Self::UserBanned => "USER_BANNED",
            Self::EmailTaken => "EMAIL_TAKEN",
        }
    }

    /// Default human-readable message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::UserNotFound => "User not found",
            Self::EventNotFound => "Event not found",
            Self::Forbidden => "You are not allowed to perform this action on the event",
            Self::AlreadyRegistered => "User already holds a role on this event",
            Self::NotRegistered => "User is not registered on this event",
            Self::OrganizerCannotLeave => "The organizer cannot leave their own event",
            Self::OrganizerCannotBeRemoved => "The organizer cannot be removed from their event",
            Self::InvalidRole => "User does not hold the expected role on this event",
            Self::EventNotOpen => "Event is not open",
            Self::EventFinished => "Event has finished",
            Self::EventTitleReserved => "An event with this title already exists",
            Self::DuplicateActivity => "User already has an activity for this event",
            Self::ActivityNotFound => "User has no activity for this event",
            Self::InvalidEventWindow => "Event must end after it starts and not start in the past",
            Self::UserBanned => "User is banned from this event",
            Self::EmailTaken => "Email is already in use",
        }
    }

    /// Error kind the transport layer uses to pick a status code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound | Self::EventNotFound | Self::ActivityNotFound => {
                ErrorKind::NotFound
            }
            Self::Forbidden | Self::UserBanned => ErrorKind::Authorization,
            Self::AlreadyRegistered
            | Self::EventTitleReserved
            | Self::DuplicateActivity
            | Self::EmailTaken => ErrorKind::Conflict,
            Self::NotRegistered
            | Self::OrganizerCannotLeave
            | Self::OrganizerCannotBeRemoved
            | Self::InvalidRole
            | Self::EventNotOpen
            | Self::EventFinished
            | Self::InvalidEventWindow => ErrorKind::Validation,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Whether an error is a business-rule rejection or an infrastructure fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Rejected by a business rule; maps to a 4xx response, never retried.
    Business,
    /// Store or runtime fault; maps to a 5xx response, may be retried.
    Infrastructure,
}

/// The unified application error used throughout EventHub.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// Business reason code, present only for rule violations.
    pub reason: Option<Reason>,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            reason: None,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            reason: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a business-rule rejection with the reason's default message.
    pub fn rejected(reason: Reason) -> Self {
        Self::rejected_with(reason, reason.message())
    }

    /// Create a business-rule rejection with a custom message.
    pub fn rejected_with(reason: Reason, message: impl Into<String>) -> Self {
        Self {
            kind: reason.kind(),
            reason: Some(reason),
            message: message.into(),
            source: None,
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error (duplicate id, stale version).
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a partial-write error wrapping the failed write.
    pub fn partial_write(message: impl Into<String>, cause: AppError) -> Self {
        Self::with_source(ErrorKind::PartialWrite, message, cause)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Business or infrastructure.
    ///
    /// Rejected input and missing or forbidden resources are the caller's
    /// problem. A `Conflict` without a reason is a stale write and counts as
    /// infrastructure.
    pub fn category(&self) -> ErrorCategory {
        if self.reason.is_some() {
            return ErrorCategory::Business;
        }
        match self.kind {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Authorization => {
                ErrorCategory::Business
            }
            _ => ErrorCategory::Infrastructure,
        }
    }

    /// Whether the error carries the given business reason.
    pub fn is(&self, reason: Reason) -> bool {
        self.reason == Some(reason)
    }

    /// Whether a caller may retry the whole operation with backoff.
    pub fn is_retryable(&self) -> bool {
        self.reason.is_none()
            && matches!(
                self.kind,
                ErrorKind::Conflict
                    | ErrorKind::Database
                    | ErrorKind::Timeout
                    | ErrorKind::ServiceUnavailable
            )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            reason: self.reason,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<Reason> for AppError {
    fn from(reason: Reason) -> Self {
        Self::rejected(reason)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(ErrorKind::Validation, format!("Invalid input: {err}"), err)
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::with_source(ErrorKind::Database, format!("Database error: {err}"), err)
    }
}
