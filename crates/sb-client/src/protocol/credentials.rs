//! Normalization of agent failure reasons

use sb_core::SignError;

/// Turn an unsuccessful result into an error, mapping rejected credentials
/// to the single [`SignError::WrongPassword`]
pub(crate) fn agent_failure(reason: Option<String>) -> SignError {
    normalize(SignError::agent(reason))
}

/// Map any credential failure to [`SignError::WrongPassword`]
pub(crate) fn normalize(error: SignError) -> SignError {
    if error.is_credential_failure() {
        SignError::WrongPassword
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_marker_becomes_wrong_password() {
        let err = agent_failure(Some(
            "Error: javax.crypto.BadPaddingException: pad block corrupted".into(),
        ));
        assert!(matches!(err, SignError::WrongPassword));
    }

    #[test]
    fn test_other_reason_kept() {
        let err = agent_failure(Some("Key not found".into()));
        assert!(matches!(err, SignError::Agent { ref reason } if reason == "Key not found"));
    }
}
