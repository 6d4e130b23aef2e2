use thiserror::Error;

use crate::forms::FieldErrors;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("ticket '{0}' not found")]
    TicketNotFound(String),

    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    #[error("category '{0}' not found")]
    CategoryNotFound(String),

    #[error("no user matches '{0}'")]
    UserNotFound(String),

    #[error("invalid status '{0}' (expected OPEN, IN_PROGRESS, RESOLVED or CLOSED)")]
    InvalidStatus(String),

    #[error("invalid severity '{0}' (expected Low, Medium, High or Critical)")]
    InvalidSeverity(String),

    #[error("invalid priority '{0}' (expected an integer from 0 to 10)")]
    InvalidPriority(String),

    #[error("invalid sort field '{0}'")]
    InvalidSortField(String),

    #[error("invalid sort direction '{0}' (expected asc or desc)")]
    InvalidSortDirection(String),

    #[error("invalid grouping '{0}' (expected status, project or category)")]
    InvalidGroupMode(String),

    #[error("invalid scope '{0}' (expected all or my)")]
    InvalidScope(String),

    #[error("invalid project status '{0}'")]
    InvalidProjectStatus(String),

    #[error("invalid user type '{0}' (expected employee or tenant)")]
    InvalidUserType(String),

    #[error("invalid date '{0}': {1}")]
    InvalidDate(String, String),

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("{0}")]
    Validation(FieldErrors),

    #[error("not signed in; run `ticketdesk login` first")]
    NotAuthenticated,

    #[error("session expired or was revoked; sign in again with `ticketdesk login`")]
    Unauthorized,

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("upload of '{file}' failed: {message}")]
    Upload { file: String, message: String },

    #[error("an attachment upload is still in progress")]
    UploadInProgress,

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("time error: {0}")]
    Time(#[from] jiff::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

impl DeskError {
    /// Whether this error should tear down the current session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, DeskError::Unauthorized)
    }

    /// Short message suitable for a store's error slot.
    pub fn store_message(&self) -> String {
        match self {
            DeskError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
