//! ## DLnSec Errors
//!
//! The errors used throughout the crate.
//!

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {field} `{value}`: valid values are {valid}")]
    InvalidParameter {
        field: &'static str,
        value: String,
        valid: String,
    },
    #[error("invalid resource address `{0}`: expected a serial port or an ASRL resource")]
    InvalidResource(String),
    #[error("no response to `{0}` before the timeout")]
    Timeout(String),
    #[error("transport closed while reading the response to `{0}`")]
    TransportClosed(String),
}

impl Error {
    /// ### Invalid Parameter
    ///
    /// Shorthand for an `InvalidParameter` error.
    ///
    pub(crate) fn invalid(field: &'static str, value: impl ToString, valid: impl ToString) -> Error {
        Error::InvalidParameter {
            field,
            value: value.to_string(),
            valid: valid.to_string(),
        }
    }
}
