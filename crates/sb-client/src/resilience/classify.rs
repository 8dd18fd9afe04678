//! Error classification for retry decisions
//!
//! Typed errors are classified by variant. Agent reasons are free text, so
//! they are matched against fixed substrings; keep these markers in sync with
//! the strings the agent emits.

use std::error::Error as StdError;

use sb_core::error::close_code;
use sb_core::{SignError, TransportError};

/// Close codes that mean "try again"
pub const TRANSIENT_CLOSE_CODES: [u16; 5] = [
    close_code::ABNORMAL,
    close_code::GOING_AWAY,
    close_code::SERVER_ERROR,
    close_code::SERVICE_RESTART,
    close_code::TRY_AGAIN_LATER,
];

/// Lower-case reason fragments of deterministic cryptographic/application failures
const APPLICATION_MARKERS: [&str; 4] = [
    "badpaddingexception",
    "bad padding",
    "invalid key",
    "certificate expired",
];

/// Lower-case reason fragments of connectivity failures
const CONNECTIVITY_MARKERS: [&str; 6] = [
    "network",
    "connection",
    "timeout",
    "refused",
    "reset",
    "websocket",
];

/// How a failure should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Connectivity or timing; safe to retry
    Transient,
    /// Semantics of the operation; never retried
    Application,
    /// Could not be identified
    Unknown,
}

/// Classify a driver error
pub fn classify_error(error: &SignError) -> ErrorClass {
    match error {
        SignError::Timeout { .. } => ErrorClass::Transient,
        SignError::Transport(transport) => classify_transport(transport),
        SignError::WrongPassword
        | SignError::VersionUndefined
        | SignError::UpdateRequired { .. }
        | SignError::UpgradeRequired { .. }
        | SignError::NotInstalled
        | SignError::NoKeyLoaded
        | SignError::Cancelled
        | SignError::Config(_) => ErrorClass::Application,
        SignError::RetryExhausted { last_error, .. } => classify_error(last_error),
        SignError::Agent { reason } => classify_message(reason),
        SignError::Protocol(e) => classify_message(&e.to_string()),
    }
}

/// Classify a single-call transport failure
pub fn classify_transport(error: &TransportError) -> ErrorClass {
    match error {
        TransportError::Closed { code, .. } if *code == close_code::NORMAL => {
            ErrorClass::Application
        }
        TransportError::Closed { code, .. } if TRANSIENT_CLOSE_CODES.contains(code) => {
            ErrorClass::Transient
        }
        TransportError::Closed { .. } => ErrorClass::Unknown,
        TransportError::Unavailable(_)
        | TransportError::OpenFailed { .. }
        | TransportError::Socket(_)
        | TransportError::Malformed(_)
        | TransportError::DeadlineElapsed(_) => ErrorClass::Transient,
    }
}

/// Classify free text by its markers
pub fn classify_message(message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    if APPLICATION_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorClass::Application
    } else if CONNECTIVITY_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorClass::Transient
    } else {
        ErrorClass::Unknown
    }
}

/// Classify any error value, looking through to driver errors where possible
pub fn classify_any(error: &(dyn StdError + 'static)) -> ErrorClass {
    if let Some(e) = error.downcast_ref::<SignError>() {
        classify_error(e)
    } else if let Some(e) = error.downcast_ref::<TransportError>() {
        classify_transport(e)
    } else {
        classify_message(&error.to_string())
    }
}

/// Default retry predicate: retry transient and unidentified failures
pub fn is_transient_error(error: &SignError) -> bool {
    classify_error(error) != ErrorClass::Application
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn closed(code: u16) -> SignError {
        SignError::Transport(TransportError::Closed {
            code,
            reason: String::new(),
        })
    }

    #[test]
    fn test_transient_close_codes() {
        for code in TRANSIENT_CLOSE_CODES {
            assert_eq!(classify_error(&closed(code)), ErrorClass::Transient, "code {}", code);
        }
    }

    #[test]
    fn test_normal_closure_is_application() {
        assert_eq!(classify_error(&closed(1000)), ErrorClass::Application);
    }

    #[test]
    fn test_other_close_codes_are_unknown() {
        assert_eq!(classify_error(&closed(1008)), ErrorClass::Unknown);
    }

    #[test]
    fn test_credential_marker_is_application() {
        let err = SignError::agent(Some(
            "javax.crypto.BadPaddingException: Given final block not properly padded".into(),
        ));
        assert_eq!(classify_error(&err), ErrorClass::Application);
        assert_eq!(classify_error(&SignError::WrongPassword), ErrorClass::Application);
        assert!(!is_transient_error(&SignError::WrongPassword));
    }

    #[test]
    fn test_application_markers() {
        assert_eq!(classify_message("Invalid key format"), ErrorClass::Application);
        assert_eq!(
            classify_message("Certificate expired on 2024-01-01"),
            ErrorClass::Application
        );
    }

    #[test]
    fn test_connectivity_markers() {
        for msg in [
            "Network unreachable",
            "connection lost",
            "read timeout",
            "Connection refused (os error 111)",
            "connection reset by peer",
            "WebSocket protocol error",
        ] {
            assert_eq!(classify_message(msg), ErrorClass::Transient, "{}", msg);
        }
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = SignError::Timeout {
            timeout: Duration::from_secs(1),
        };
        assert_eq!(classify_error(&err), ErrorClass::Transient);
        assert_eq!(
            classify_transport(&TransportError::DeadlineElapsed(Duration::from_secs(1))),
            ErrorClass::Transient
        );
    }

    #[test]
    fn test_unrecognized_is_unknown_and_retryable() {
        let err = SignError::agent(Some("Something odd happened".into()));
        assert_eq!(classify_error(&err), ErrorClass::Unknown);
        assert!(is_transient_error(&err));
    }

    #[test]
    fn test_version_errors_are_application() {
        assert_eq!(classify_error(&SignError::VersionUndefined), ErrorClass::Application);
        assert_eq!(
            classify_error(&SignError::UpgradeRequired { feature: "x" }),
            ErrorClass::Application
        );
    }

    #[test]
    fn test_classify_any_foreign_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert_eq!(classify_any(&io), ErrorClass::Unknown);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection aborted");
        assert_eq!(classify_any(&io), ErrorClass::Transient);
        let sign = SignError::WrongPassword;
        assert_eq!(classify_any(&sign), ErrorClass::Application);
    }
}
