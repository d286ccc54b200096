// Copyright 2022, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This module defines the error type and the result type for this library.

use crate::params::uci_packets::{SessionId, SessionState, UwbStatus};
use crate::params::uwb_configuration::ParameterTag;
use crate::tlv::TlvError;

/// The error type for the uwb_fira library.
#[non_exhaustive] // Adding new enum fields doesn't break the downstream build.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The provided parameters are invalid.
    #[error("Bad parameters")]
    BadParameters,
    /// The BER-TLV input could not be parsed or encoded.
    #[error("Malformed TLV: {0}")]
    Tlv(#[from] TlvError),
    /// The TLV is not the expected FiRa data object.
    #[error("Invalid data object: {0}")]
    InvalidDataObject(String),
    /// The value carried by a configuration parameter doesn't match its declared type.
    #[error("Invalid value for configuration parameter {0:?}")]
    InvalidParameterValue(ParameterTag),
    /// The transport completed the command with a non-Ok status.
    #[error("The command failed with status {0}")]
    Status(UwbStatus),
    /// The method is not allowed to be called in the current session state.
    #[error("The operation is not allowed in session state {0:?}")]
    WrongState(SessionState),
    /// A live session with the same id already exists.
    #[error("Duplicated SessionId: {0}")]
    DuplicatedSessionId(SessionId),
    /// The device owning the session has been released.
    #[error("The owning device is no longer available")]
    DeviceUnavailable,
    /// The response is not received in timeout.
    #[error("The response is not received in timeout")]
    Timeout,
    /// The channel to the transport or to an internal task is closed.
    #[error("The channel is closed")]
    ChannelClosed,

    /// The result of the mock method is not assigned
    #[cfg(any(test, feature = "mock-utils"))]
    #[error("The result of the mock method is not assigned")]
    MockUndefined,
}

impl Error {
    /// The UwbStatus this error is reported as. Channel errors are reported as
    /// `UwbStatus::Failed`, only protocol errors carry their own status.
    pub fn status(&self) -> Option<UwbStatus> {
        match self {
            Self::Status(status) => Some(*status),
            Self::Timeout | Self::ChannelClosed => Some(UwbStatus::Failed),
            _ => None,
        }
    }

    /// Whether the transport hinted that the command should be retried.
    pub fn need_retry(&self) -> bool {
        matches!(self, Self::Status(UwbStatus::CommandRetry))
    }
}

/// The result type for the uwb_fira library.
///
/// This type is broadly used by the methods in this library which may produce an error.
pub type Result<T> = std::result::Result<T, Error>;

/// Convert a transport status into a Result.
pub(crate) fn status_to_result(status: UwbStatus) -> Result<()> {
    match status {
        UwbStatus::Ok => Ok(()),
        _ => Err(Error::Status(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of_channel_errors() {
        assert_eq!(Error::Timeout.status(), Some(UwbStatus::Failed));
        assert_eq!(Error::ChannelClosed.status(), Some(UwbStatus::Failed));
        assert_eq!(Error::Status(UwbStatus::Rejected).status(), Some(UwbStatus::Rejected));
        assert_eq!(Error::BadParameters.status(), None);
    }

    #[test]
    fn test_need_retry() {
        assert!(Error::Status(UwbStatus::CommandRetry).need_retry());
        assert!(!Error::Status(UwbStatus::Failed).need_retry());
        assert!(!Error::Timeout.need_retry());
    }

    #[test]
    fn test_status_to_result() {
        assert_eq!(status_to_result(UwbStatus::Ok), Ok(()));
        assert_eq!(
            status_to_result(UwbStatus::SessionDuplicate),
            Err(Error::Status(UwbStatus::SessionDuplicate))
        );
    }
}
