//! Result codes carried by every contract response
//!
//! The set mirrors the gRPC status codes so that codes reported by the CSP
//! provisioner can be forwarded to callers unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Response result code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    #[default]
    #[serde(alias = "OK_UNSPECIFIED")]
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Code {
    pub fn is_ok(&self) -> bool {
        matches!(self, Code::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Cancelled => "CANCELLED",
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Aborted => "ABORTED",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::DataLoss => "DATA_LOSS",
            Code::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_wire_format() {
        assert_eq!(serde_json::to_string(&Code::InvalidArgument).unwrap(), "\"INVALID_ARGUMENT\"");
        assert_eq!(serde_json::to_string(&Code::Ok).unwrap(), "\"OK\"");
    }

    #[test]
    fn test_code_accepts_ok_unspecified() {
        let code: Code = serde_json::from_str("\"OK_UNSPECIFIED\"").unwrap();
        assert!(code.is_ok());
    }

    #[test]
    fn test_display_matches_serde() {
        for code in [Code::NotFound, Code::ResourceExhausted, Code::Unauthenticated] {
            assert_eq!(serde_json::to_string(&code).unwrap(), format!("\"{}\"", code));
        }
    }
}
