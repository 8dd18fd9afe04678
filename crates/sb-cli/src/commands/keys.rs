//! Certificate listing, signing and password change

use std::path::PathBuf;

use anyhow::{Context, Result};

use sb_client::{Pkcs7Content, SigningService};
use sb_core::{CertificateIdentity, KeyDirectory, SignError};

use super::report;
use crate::output::{format_certificates, print_info, print_success};

/// Hardware signer that needs no key loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HardwareKind {
    /// Identity card in a connected reader
    IdCard,
    /// USB signing token
    BaikToken,
}

/// Options of the sign command
#[derive(Debug, Clone)]
pub struct SignArgs {
    pub file: PathBuf,
    pub id: Option<String>,
    pub output: Option<PathBuf>,
    pub detached: bool,
    pub verify_password: bool,
    /// The input file already holds base64 text
    pub base64_input: bool,
    pub hardware: Option<HardwareKind>,
}

/// Execute the list command
pub async fn list_command(service: &mut SigningService, long: bool, json: bool) -> Result<()> {
    let directory = installed_directory(service).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&directory)?);
    } else {
        let now = chrono::Local::now().naive_local();
        println!("{}", format_certificates(&directory, long, now));
    }
    Ok(())
}

/// Execute the sign command
pub async fn sign_command(service: &mut SigningService, args: &SignArgs) -> Result<()> {
    let data = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read input file: {:?}", args.file))?;
    let text;
    let content = if args.base64_input {
        text = String::from_utf8(data).context("Input file is not base64 text")?;
        Pkcs7Content::Base64(text.trim())
    } else {
        Pkcs7Content::Raw(&data)
    };

    let signature = match args.hardware {
        Some(HardwareKind::IdCard) => {
            install(service).await?;
            service.sign_with_id_card(content, args.detached).await
        }
        Some(HardwareKind::BaikToken) => {
            install(service).await?;
            service.sign_with_baik_token(content, args.detached).await
        }
        None => {
            let directory = installed_directory(service).await?;
            let identity = select(&directory, args.id.as_deref())?.clone();
            tracing::debug!(serial = %identity.serial_number, "Selected certificate");
            if let Err(e) = service.load_key(&identity, args.verify_password).await {
                report("Failed to load key", &e);
                return Err(e.into());
            }
            service.sign(content, args.detached).await
        }
    };

    let signature = match signature {
        Ok(s) => s,
        Err(e) => {
            report("Signing failed", &e);
            return Err(e.into());
        }
    };

    if let Some(serial) = signature.signer_serial_number() {
        print_info(&format!("Signed by certificate {}", serial));
    }
    match &args.output {
        Some(path) => {
            std::fs::write(path, signature.pkcs7_base64())
                .with_context(|| format!("Failed to write signature: {:?}", path))?;
            print_success(&format!("Signature written to {:?}", path));
        }
        None => println!("{}", signature.pkcs7_base64()),
    }
    Ok(())
}

/// Execute the change-password command
pub async fn change_password_command(service: &mut SigningService, id: Option<&str>) -> Result<()> {
    let directory = installed_directory(service).await?;
    let identity = select(&directory, id)?;

    match service.change_key_password(identity).await {
        Ok(()) => {
            print_success(&format!("Password changed for {}", identity.common_name));
            Ok(())
        }
        Err(e) => {
            report("Failed to change password", &e);
            Err(e.into())
        }
    }
}

async fn install(service: &mut SigningService) -> Result<(), SignError> {
    service.install().await.map(|_| ()).map_err(|e| {
        report("Failed to install signing session", &e);
        e
    })
}

async fn installed_directory(service: &mut SigningService) -> Result<KeyDirectory> {
    install(service).await?;
    service.list_all_user_keys().await.map_err(|e| {
        report("Failed to list certificates", &e);
        e.into()
    })
}

/// Pick the identity to use: the given id, or the only one there is
fn select<'a>(directory: &'a KeyDirectory, id: Option<&str>) -> Result<&'a CertificateIdentity> {
    match id {
        Some(id) => directory
            .get(id)
            .with_context(|| format!("No certificate with id '{}'; run 'signbridge list'", id)),
        None => {
            let only = directory.first_id.as_deref().with_context(|| {
                format!(
                    "{} certificates found; choose one with --id",
                    directory.len()
                )
            })?;
            directory
                .get(only)
                .context("Certificate directory is inconsistent")
        }
    }
}
