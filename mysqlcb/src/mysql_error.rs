/* *********************************************************************
* Copyright (c) 2024 Mimer Information Technology
*
* Permission is hereby granted, free of charge, to any person obtaining a copy
* of this software and associated documentation files (the "Software"), to deal
* in the Software without restriction, including without limitation the rights
* to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
* copies of the Software, and to permit persons to whom the Software is
* furnished to do so, subject to the following conditions:
*
* The above copyright notice and this permission notice shall be included in all
* copies or substantial portions of the Software.
*
* THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
* IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
* FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
* AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
* LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
* OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
* SOFTWARE.
*
* See license for more details.
* *********************************************************************/

use std::ffi::NulError;
use std::fmt;
use thiserror::Error;

/// `CR_OUT_OF_MEMORY`, reported when the client library cannot allocate a handle.
pub(crate) const CR_OUT_OF_MEMORY: u32 = 2008;
/// `CR_PARAMS_NOT_BOUND`, used when the parameter list does not match the placeholders.
pub(crate) const CR_PARAMS_NOT_BOUND: u32 = 2031;
/// `CR_NO_RESULT_SET`, used when metadata is requested for a statement without results.
pub(crate) const CR_NO_RESULT_SET: u32 = 2053;

/// An error reported by the MySQL client library: the `errno` and the message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    error_code: u32,
    error_message: String,
}

impl ClientError {
    /// Creates a [ClientError] from a native error number and message.
    pub fn new(error_code: u32, error_message: impl Into<String>) -> ClientError {
        ClientError {
            error_code,
            error_message: error_message.into(),
        }
    }

    /// Gets the native error number, e.g. `1064` for a syntax error.
    ///
    /// # Examples
    /// ```
    /// # use mysqlcb::ClientError;
    /// let err = ClientError::new(1146, "Table 'test.nope' doesn't exist");
    /// assert_eq!(err.error_code(), 1146);
    /// ```
    pub fn error_code(&self) -> u32 {
        self.error_code
    }

    /// Gets the message the client library attached to the error.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (errno {})", self.error_message, self.error_code)
    }
}

impl std::error::Error for ClientError {}

/// Everything that can go wrong while connecting, binding or fetching.
#[derive(Debug, Error)]
pub enum Error {
    #[error("MySQL connection failed: {0}")]
    Connect(ClientError),
    #[error("Failed to prepare statement: {0}")]
    Prepare(ClientError),
    #[error("Failed to bind parameters: {0}")]
    BindParams(ClientError),
    #[error("Failed to execute statement: {0}")]
    Execute(ClientError),
    #[error("Error getting result metadata: {0}")]
    Metadata(ClientError),
    #[error("{column} unprepared field type ({type_code}).")]
    UnsupportedColumnType { column: String, type_code: u32 },
    #[error("Failed to fetch row: {0}")]
    Fetch(ClientError),
    #[error("Old query must run to completion before starting a new query.")]
    QueryInProgress,
    #[error("Invalid connection options: {0}")]
    BadConfig(String),
    #[error(transparent)]
    NulByte(#[from] NulError),
}

impl Error {
    /// The native error behind this one, if the client library reported it.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Error::Connect(e)
            | Error::Prepare(e)
            | Error::BindParams(e)
            | Error::Execute(e)
            | Error::Metadata(e)
            | Error::Fetch(e) => Some(e),
            Error::UnsupportedColumnType { .. }
            | Error::QueryInProgress
            | Error::BadConfig(_)
            | Error::NulByte(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn client_error_accessors() {
        let err = ClientError::new(1064, "You have an error in your SQL syntax");
        assert_eq!(err.error_code(), 1064);
        assert_eq!(err.error_message(), "You have an error in your SQL syntax");
        assert_eq!(
            err.to_string(),
            "You have an error in your SQL syntax (errno 1064)"
        );
    }

    #[test]
    fn unsupported_type_names_column() {
        let err = Error::UnsupportedColumnType {
            column: "shape".to_string(),
            type_code: 255,
        };
        assert!(err.to_string().contains("shape"));
        assert!(err.client_error().is_none());
    }

    #[test]
    fn wrapped_client_error() {
        let err = Error::Prepare(ClientError::new(1146, "no such table"));
        assert_eq!(err.client_error().map(ClientError::error_code), Some(1146));
        assert!(err.to_string().starts_with("Failed to prepare statement"));
    }

    #[test]
    fn nul_byte_converts() {
        let nul = std::ffi::CString::new("a\0b").unwrap_err();
        let err: Error = nul.into();
        assert!(matches!(err, Error::NulByte(_)));
    }
}
