//! CLI command implementations

mod agent;
mod config;
mod keys;

pub use agent::{devices_command, install_command, version_command};
pub use config::{config_init, config_path, config_show, load_or_default};
pub use keys::{change_password_command, list_command, sign_command, HardwareKind, SignArgs};

use sb_core::SignError;

use crate::output::{print_error, print_info};

/// Report a failed agent operation with a hint on what to do next
pub(crate) fn report(context: &str, error: &SignError) {
    print_error(&format!("{}: {}", context, error));
    if let Some(hint) = hint(error) {
        print_info(hint);
    }
}

fn hint(error: &SignError) -> Option<&'static str> {
    match error {
        SignError::WrongPassword => Some("Run the command again and enter the correct password or PIN"),
        SignError::UpdateRequired { .. } | SignError::UpgradeRequired { .. } => {
            Some("Install the latest version of the signing agent")
        }
        SignError::Transport(_) | SignError::Timeout { .. } => {
            Some("Is the signing agent running? Try --insecure if it only listens on the plain port")
        }
        SignError::RetryExhausted { last_error, .. } => hint(last_error),
        _ => None,
    }
}
