use serde_json::Value;
use std::env;
use std::fmt;
use thiserror::Error;

/// Custom error types for the [`SynoClient`](crate::client::SynoClient)
#[derive(Error, Debug)]
pub enum SynoError {
    #[error("Synology API error: code={code}, kind={kind}")]
    Api {
        code: i32,
        kind: ErrorKind,
        /// Payload of the failed response, kept for diagnostics
        payload: Value,
    },

    #[error("API discovery failed: {0}")]
    Discovery(String),

    #[error("HTTP request failed with status: {status}")]
    Transport { status: u16, body: String },

    #[error("Network request error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API is not available on this server: {0}")]
    UnknownApi(String),

    #[error("Invalid input parameter: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Environment variable error: {0}")]
    Environment(#[from] env::VarError),
}

impl SynoError {
    /// Error kind of an API error, `None` for every other variant
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// `true` when the server reported a timed out or interrupted session
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_session_error)
    }
}

/// Errors shared by every Synology API
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonError {
    #[error("Unknown error")]
    Unknown = 100,
    #[error("Invalid parameter")]
    InvalidParameter = 101,
    #[error("The requested API does not exist")]
    InvalidRequestApi = 102,
    #[error("The requested method does not exist")]
    MethodNotExists = 103,
    #[error("The requested version does not support the functionality")]
    NotSupportVersion = 104,
    #[error("The logged in session does not have permission")]
    ForbiddenRequest = 105,
    #[error("Session timeout")]
    SessionTimeout = 106,
    #[error("Session interrupted by duplicate login")]
    SessionInterrupted = 107,
}

impl CommonError {
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            100 => Self::Unknown,
            101 => Self::InvalidParameter,
            102 => Self::InvalidRequestApi,
            103 => Self::MethodNotExists,
            104 => Self::NotSupportVersion,
            105 => Self::ForbiddenRequest,
            106 => Self::SessionTimeout,
            107 => Self::SessionInterrupted,
            _ => return None,
        })
    }
}

/// Errors of `SYNO.API.Auth`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("No such account or incorrect password")]
    NoSuchAccountOrIncorrectPassword = 400,
    #[error("Account disabled")]
    AccountDisabled = 401,
    #[error("Permission denied")]
    PermissionDenied = 402,
    #[error("2-step verification code required")]
    TwoStepCodeRequired = 403,
    #[error("Failed to authenticate 2-step verification code")]
    TwoStepCodeFailed = 404,
}

impl AuthError {
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            400 => Self::NoSuchAccountOrIncorrectPassword,
            401 => Self::AccountDisabled,
            402 => Self::PermissionDenied,
            403 => Self::TwoStepCodeRequired,
            404 => Self::TwoStepCodeFailed,
            _ => return None,
        })
    }
}

/// Errors of the `SYNO.DownloadStation.*` APIs
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStationError {
    #[error("File upload failed")]
    FileUploadFailed = 400,
    #[error("Max number of tasks reached")]
    MaxNumberOfTasksReached = 401,
    #[error("Destination denied")]
    DestinationDenied = 402,
    #[error("Destination does not exist")]
    DestinationDoesNotExist = 403,
    #[error("Invalid task id")]
    TaskNotFound = 404,
    #[error("Invalid task action")]
    InvalidTaskAction = 405,
    #[error("No default destination")]
    NoDefaultDestination = 406,
    #[error("Set destination failed")]
    SetDestinationFailed = 407,
    #[error("File does not exist")]
    FileDoesNotExist = 408,
}

impl DownloadStationError {
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            400 => Self::FileUploadFailed,
            401 => Self::MaxNumberOfTasksReached,
            402 => Self::DestinationDenied,
            403 => Self::DestinationDoesNotExist,
            404 => Self::TaskNotFound,
            405 => Self::InvalidTaskAction,
            406 => Self::NoDefaultDestination,
            407 => Self::SetDestinationFailed,
            408 => Self::FileDoesNotExist,
            _ => return None,
        })
    }
}

/// Resolved meaning of an error code returned in a response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Common(CommonError),
    Auth(AuthError),
    DownloadStation(DownloadStationError),
    /// Code known to neither the subsystem nor the common tier
    Other(i32),
}

impl ErrorKind {
    #[must_use]
    pub fn is_session_error(self) -> bool {
        matches!(
            self,
            Self::Common(CommonError::SessionTimeout | CommonError::SessionInterrupted)
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common(error) => write!(f, "{error}"),
            Self::Auth(error) => write!(f, "{error}"),
            Self::DownloadStation(error) => write!(f, "{error}"),
            Self::Other(code) => write!(f, "Unrecognized error code {code}"),
        }
    }
}

/// A group of APIs sharing one name prefix and one error code table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// `SYNO.API.Info` and anything without its own error table
    Core,
    Auth,
    DownloadStation,
}

impl Subsystem {
    /// Declared API name, used as is or as the prefix of sub APIs
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Core => "SYNO.API.Info",
            Self::Auth => "SYNO.API.Auth",
            Self::DownloadStation => "SYNO.DownloadStation",
        }
    }

    /// Maps an error code to its kind: subsystem table first, then the common table
    #[must_use]
    pub fn resolve(self, code: i32) -> ErrorKind {
        let specific = match self {
            Self::Core => None,
            Self::Auth => AuthError::from_code(code).map(ErrorKind::Auth),
            Self::DownloadStation => {
                DownloadStationError::from_code(code).map(ErrorKind::DownloadStation)
            }
        };

        specific
            .or_else(|| CommonError::from_code(code).map(ErrorKind::Common))
            .unwrap_or(ErrorKind::Other(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_subsystem_tier_first() {
        assert_eq!(
            ErrorKind::DownloadStation(DownloadStationError::TaskNotFound),
            Subsystem::DownloadStation.resolve(404)
        );
        assert_eq!(
            ErrorKind::Auth(AuthError::TwoStepCodeRequired),
            Subsystem::Auth.resolve(403)
        );
    }

    #[test]
    fn test_resolve_falls_back_to_common_tier() {
        for subsystem in [Subsystem::Core, Subsystem::Auth, Subsystem::DownloadStation] {
            assert_eq!(
                ErrorKind::Common(CommonError::SessionTimeout),
                subsystem.resolve(106)
            );
            assert_eq!(
                ErrorKind::Common(CommonError::InvalidParameter),
                subsystem.resolve(101)
            );
        }
    }

    #[test]
    fn test_resolve_catch_all() {
        assert_eq!(ErrorKind::Other(404), Subsystem::Core.resolve(404));
        assert_eq!(ErrorKind::Other(409), Subsystem::DownloadStation.resolve(409));
        assert_eq!(ErrorKind::Other(-1), Subsystem::Auth.resolve(-1));
    }

    #[test]
    fn test_session_errors() {
        assert!(Subsystem::DownloadStation.resolve(106).is_session_error());
        assert!(Subsystem::DownloadStation.resolve(107).is_session_error());
        assert!(!Subsystem::DownloadStation.resolve(105).is_session_error());
        assert!(!Subsystem::DownloadStation.resolve(404).is_session_error());
    }

    #[test]
    fn test_api_error_display() {
        let error = SynoError::Api {
            code: 404,
            kind: Subsystem::DownloadStation.resolve(404),
            payload: Value::Bool(false),
        };
        assert_eq!(
            "Synology API error: code=404, kind=Invalid task id",
            error.to_string()
        );
        assert!(!error.is_session_error());
    }
}
