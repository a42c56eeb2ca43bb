#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

#[cfg(feature = "schemas")]
#[macro_use]
extern crate schemars;

use std::fmt;

/// Result type with custom Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "schemas", derive(JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Type of error and additional information
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub error_type: ErrorType,

    /// Where this error occurred
    pub location: String,
}

/// Possible error types
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
#[cfg_attr(feature = "schemas", derive(JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    /// This error was not labeled :(
    LabelMe,

    // ? Overview related errors
    CouldNotFetchOverview {
        cause: Box<ErrorType>,
    },
    InvalidSafeAddress,

    // ? Gateway errors
    GatewayError {
        status: u16,
    },
    GatewayUnavailable {
        error: String,
    },
    InvalidGatewayResponse {
        error: String,
    },

    // ? General errors
    InternalError,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::LabelMe => write!(f, "unlabeled error"),
            ErrorType::CouldNotFetchOverview { .. } => write!(f, "could not fetch overview"),
            ErrorType::InvalidSafeAddress => write!(f, "invalid safe address"),
            ErrorType::GatewayError { status } => {
                write!(f, "gateway responded with status {status}")
            }
            ErrorType::GatewayUnavailable { error } => write!(f, "gateway unavailable: {error}"),
            ErrorType::InvalidGatewayResponse { error } => {
                write!(f, "invalid gateway response: {error}")
            }
            ErrorType::InternalError => write!(f, "internal error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_type)
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Underlying cause carried by this error, if any
    pub fn cause(&self) -> Option<&ErrorType> {
        match &self.error_type {
            ErrorType::CouldNotFetchOverview { cause } => Some(cause),
            _ => None,
        }
    }
}

#[macro_export]
macro_rules! create_error {
    ( $error: ident $( $tt:tt )? ) => {
        $crate::Error {
            error_type: $crate::ErrorType::$error $( $tt )?,
            location: format!("{}:{}:{}", file!(), line!(), column!()),
        }
    };
}

#[macro_export]
macro_rules! create_overview_error {
    ( $cause: expr ) => {
        $crate::create_error!(CouldNotFetchOverview {
            cause: Box::new($cause)
        })
    };
}
