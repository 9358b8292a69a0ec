//! Error types for the resumable upload protocol.

use salvo_core::http::StatusCode;

/// A specialized `Result` type for resumable upload operations.
pub type ResumableUploadResult<T> = Result<T, ResumableUploadError>;

/// Errors produced while classifying or validating an inbound request against
/// the resumable upload wire protocol.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// `Upload-Draft-Interop-Version` named a version this crate does not implement.
    #[error("unsupported upload draft interop version: {0}")]
    UnsupportedInteropVersion(u32),

    /// The method/path combination does not correspond to any recognized operation.
    #[error("unknown method for resumption path")]
    UnknownMethod,

    /// The resumption path does not name a valid token shape.
    #[error("invalid resumption path")]
    InvalidPath,

    /// A header required for this request variant was absent.
    #[error("missing required header: {0}")]
    MissingHeaderField(&'static str),

    /// A header was present that the request variant forbids.
    #[error("unexpected header present: {0}")]
    ExtraHeaderField(&'static str),

    /// A structured field value (RFC 8941) failed to parse.
    #[error("invalid structured field value for header: {0}")]
    InvalidStructuredValue(&'static str),

    /// An integer-valued header did not contain a valid non-negative integer.
    #[error("invalid integer value for header: {0}")]
    InvalidInteger(&'static str),
}

/// Errors that can occur while driving an upload session.
#[derive(Debug, thiserror::Error)]
pub enum ResumableUploadError {
    /// Wraps a request-classification/validation failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The client explicitly cancelled the upload (`DELETE`).
    #[error("upload was cancelled by the client")]
    UploadCancelled,

    /// The virtual channel attempted to write or flush with no adapter attached.
    #[error("no adapter is currently attached to this session")]
    ParentNotPresent,

    /// The session was detached long enough for its idle timer to fire.
    #[error("timed out waiting for the client to resume the upload")]
    TimeoutWaitingForResumption,

    /// An `Appending` request disagreed with the session's recorded offset or length.
    #[error("resumption request conflicts with session state (expected offset {expected}, got {got})")]
    BadResumption {
        /// The offset the session expected.
        expected: u64,
        /// The offset the client declared.
        got: u64,
    },

    /// No session exists for the given resumption path.
    #[error("no upload session found for this path")]
    NotFound,

    /// The session's actor task is no longer reachable (it has already ended).
    #[error("the upload session has already ended")]
    SessionGone,
}

impl ResumableUploadError {
    /// Maps this error onto the HTTP status code the client should observe.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        use ProtocolError::{
            ExtraHeaderField, InvalidInteger, InvalidPath, InvalidStructuredValue,
            MissingHeaderField, UnknownMethod, UnsupportedInteropVersion,
        };

        match self {
            Self::Protocol(
                UnsupportedInteropVersion(_)
                | UnknownMethod
                | InvalidPath
                | MissingHeaderField(_)
                | ExtraHeaderField(_)
                | InvalidStructuredValue(_)
                | InvalidInteger(_),
            ) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadResumption { .. } => StatusCode::CONFLICT,
            Self::UploadCancelled
            | Self::ParentNotPresent
            | Self::TimeoutWaitingForResumption
            | Self::SessionGone => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_map_to_400() {
        let err = ResumableUploadError::from(ProtocolError::UnknownMethod);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(ResumableUploadError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_resumption_maps_to_409() {
        let err = ResumableUploadError::BadResumption { expected: 3, got: 1 };
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn display_messages_are_stable() {
        assert_eq!(
            ProtocolError::UnsupportedInteropVersion(4).to_string(),
            "unsupported upload draft interop version: 4"
        );
        assert_eq!(
            ProtocolError::MissingHeaderField("Upload-Offset").to_string(),
            "missing required header: Upload-Offset"
        );
    }
}
