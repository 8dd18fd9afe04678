//! Raw listing records as the agent sends them

use serde::{Deserialize, Serialize};

/// One entry of `pfx.list_all_certificates`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PfxRecord {
    /// Storage volume the container lives on
    pub disk: String,
    /// Directory of the container
    pub path: String,
    /// Container file name
    pub name: String,
    /// Vendor distinguished-name blob describing the certificate
    pub alias: String,
}

/// One entry of `ftjc.list_all_keys`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Unique id of the card holding the key
    #[serde(rename = "cardUID")]
    pub card_uid: String,
    /// Card status text
    #[serde(rename = "statusInfo", default)]
    pub status_info: String,
    /// Card owner name
    #[serde(rename = "ownerName", default)]
    pub owner_name: String,
    /// Vendor distinguished-name blob describing the certificate
    pub info: String,
}
