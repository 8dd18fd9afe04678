//! Agent-level commands: version, install and device presence

use anyhow::Result;

use sb_client::SigningService;
use sb_core::SignError;

use super::report;
use crate::output::{format_features, print_success, print_warning};

/// Show the agent version and the capabilities it provides
pub async fn version_command(service: &mut SigningService) -> Result<()> {
    let version = match service.check_version().await {
        Ok(v) => v,
        Err(e) => {
            report("Failed to check signing agent version", &e);
            return Err(e.into());
        }
    };

    print!("{}", format_features(version, service.feature_tier()));
    Ok(())
}

/// Run the full bootstrap: version check and API key registration
pub async fn install_command(service: &mut SigningService) -> Result<()> {
    match service.install().await {
        Ok(version) => {
            print_success(&format!("Signing agent {} is ready", version));
            Ok(())
        }
        Err(e) => {
            report("Failed to install signing session", &e);
            Err(e.into())
        }
    }
}

/// Report which hardware signers are connected
pub async fn devices_command(service: &mut SigningService) -> Result<()> {
    if let Err(e) = service.install().await {
        report("Failed to install signing session", &e);
        return Err(e.into());
    }

    let checks = [
        ("Identity-card reader", service.id_card_plugged_in().await),
        ("USB signing token", service.baik_token_plugged_in().await),
        ("Cloud key container", service.ckc_plugged_in().await),
    ];

    for (label, result) in checks {
        match result {
            Ok(true) => println!("{:<24} connected", label),
            Ok(false) => println!("{:<24} not connected", label),
            Err(SignError::UpgradeRequired { .. }) => {
                println!("{:<24} not supported by this agent", label)
            }
            Err(e) => print_warning(&format!("{}: {}", label, e)),
        }
    }
    Ok(())
}
