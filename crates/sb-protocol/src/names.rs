//! Plugin and function names understood by the agent

/// Top-level (plugin-less) functions
pub mod service {
    /// Report the agent's major/minor version
    pub const VERSION: &str = "version";
    /// Register domain/key pairs that authorize the calling origin
    pub const APIKEY: &str = "apikey";
}

/// File-based key containers
pub mod pfx {
    pub const PLUGIN: &str = "pfx";
    pub const LIST_ALL_CERTIFICATES: &str = "list_all_certificates";
    pub const LOAD_KEY: &str = "load_key";
    pub const VERIFY_PASSWORD: &str = "verify_password";
    pub const CHANGE_PASSWORD: &str = "change_password";
}

/// Smart-card tokens
pub mod ftjc {
    pub const PLUGIN: &str = "ftjc";
    pub const LIST_ALL_KEYS: &str = "list_all_keys";
    pub const LOAD_KEY: &str = "load_key";
    pub const VERIFY_PIN: &str = "verify_pin";
    pub const CHANGE_PIN: &str = "change_pin";
    /// PIN slot passed alongside the key id for PIN operations
    pub const PIN_SLOT: &str = "1";
}

/// Identity-card readers
pub mod idcard {
    pub const PLUGIN: &str = "idcard";
    pub const LIST_READERS: &str = "list_readers";
}

/// USB signing tokens
pub mod baikey {
    pub const PLUGIN: &str = "baikey";
    pub const LIST_TOKENS: &str = "list_tokens";
}

/// Cloud key containers
pub mod ckc {
    pub const PLUGIN: &str = "ckc";
    pub const LIST_CKC: &str = "list_ckc";
}

/// Signature container creation
pub mod pkcs7 {
    pub const PLUGIN: &str = "pkcs7";
    pub const CREATE_PKCS7: &str = "create_pkcs7";
    pub const DETACHED: &str = "yes";
    pub const ATTACHED: &str = "no";
}
