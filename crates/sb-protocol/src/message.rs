//! Call and result envelopes exchanged with the agent

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Result field carrying the agent-side key handle after `load_key`
pub const FIELD_KEY_ID: &str = "keyId";
/// Result field carrying the base64 PKCS#7 container
pub const FIELD_PKCS7: &str = "pkcs7_64";
/// Result field carrying the raw signature as hex
pub const FIELD_SIGNATURE_HEX: &str = "signature_hex";
/// Result field carrying the signer certificate serial number
pub const FIELD_SIGNER_SERIAL: &str = "signer_serial_number";
/// File-based certificate listing
pub const FIELD_CERTIFICATES: &str = "certificates";
/// Token listing
pub const FIELD_TOKENS: &str = "tokens";
/// Card reader listing
pub const FIELD_READERS: &str = "readers";
/// Cloud container listing
pub const FIELD_DEVICES: &str = "devices";

/// A single positional argument of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    /// Plain string argument
    Text(String),
    /// Array-of-strings argument
    List(Vec<String>),
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Argument::Text(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Argument::Text(s)
    }
}

impl From<Vec<String>> for Argument {
    fn from(v: Vec<String>) -> Self {
        Argument::List(v)
    }
}

/// Outbound message: which function to run, in which plugin, with what arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// Target sub-plugin; absent for service-level calls such as `version`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Function name
    pub name: String,
    /// Ordered arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
}

impl CallEnvelope {
    /// A service-level call with no plugin
    pub fn service(name: &str) -> Self {
        Self {
            plugin: None,
            name: name.to_string(),
            arguments: Vec::new(),
        }
    }

    /// A call routed to a plugin
    pub fn plugin(plugin: &str, name: &str) -> Self {
        Self {
            plugin: Some(plugin.to_string()),
            name: name.to_string(),
            arguments: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, argument: impl Into<Argument>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Append several string arguments
    pub fn args<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments
            .extend(arguments.into_iter().map(|a| Argument::Text(a.into())));
        self
    }

    /// `plugin.name`, or just `name` for service calls (used in logs)
    pub fn operation(&self) -> String {
        match &self.plugin {
            Some(plugin) => format!("{}.{}", plugin, self.name),
            None => self.name.clone(),
        }
    }
}

/// Inbound message: success flag, optional reason and operation-specific fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Whether the agent completed the operation
    pub success: bool,
    /// Human-readable failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Everything else the agent sent back
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResultEnvelope {
    /// A successful result with no payload
    pub fn ok() -> Self {
        Self {
            success: true,
            reason: None,
            fields: Map::new(),
        }
    }

    /// A failed result with a reason
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            fields: Map::new(),
        }
    }

    /// Attach a payload field
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Major/minor version, if both are present and numeric.
    ///
    /// The agent reports them as strings (`"3"`, `"40"`); plain numbers are
    /// accepted as well.
    pub fn version(&self) -> Option<(u32, u32)> {
        let major = numeric_field(self.fields.get("major")?)?;
        let minor = numeric_field(self.fields.get("minor")?)?;
        Some((major, minor))
    }

    /// Key handle returned by `load_key`
    pub fn key_id(&self) -> Result<&str, ProtocolError> {
        self.fields
            .get(FIELD_KEY_ID)
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingField(FIELD_KEY_ID))
    }

    /// Array payload such as `certificates` or `readers`
    pub fn array(&self, field: &'static str) -> Result<&[Value], ProtocolError> {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or(ProtocolError::MissingField(field))
    }

    /// Signature payload of `create_pkcs7`.
    ///
    /// Newer agents add the hex signature and signer serial next to the
    /// container; older ones send only the container.
    pub fn signature(&self) -> Result<SignaturePayload, ProtocolError> {
        let pkcs7 = self
            .fields
            .get(FIELD_PKCS7)
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingField(FIELD_PKCS7))?
            .to_string();

        let hex = self.fields.get(FIELD_SIGNATURE_HEX).and_then(Value::as_str);
        let serial = self.fields.get(FIELD_SIGNER_SERIAL).and_then(Value::as_str);

        Ok(match (hex, serial) {
            (Some(hex), Some(serial)) => SignaturePayload::Detailed {
                pkcs7_64: pkcs7,
                signature_hex: hex.to_string(),
                signer_serial_number: serial.to_string(),
            },
            _ => SignaturePayload::Opaque(pkcs7),
        })
    }
}

fn numeric_field(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

/// What the agent returns for a signature request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignaturePayload {
    /// Base64 PKCS#7 container only
    Opaque(String),
    /// Container plus raw signature and signer serial
    Detailed {
        pkcs7_64: String,
        signature_hex: String,
        signer_serial_number: String,
    },
}

impl SignaturePayload {
    /// The base64 PKCS#7 container, whichever shape was returned
    pub fn pkcs7_base64(&self) -> &str {
        match self {
            SignaturePayload::Opaque(pkcs7) => pkcs7,
            SignaturePayload::Detailed { pkcs7_64, .. } => pkcs7_64,
        }
    }

    /// Signer serial number, when the agent provided one
    pub fn signer_serial_number(&self) -> Option<&str> {
        match self {
            SignaturePayload::Opaque(_) => None,
            SignaturePayload::Detailed {
                signer_serial_number,
                ..
            } => Some(signer_serial_number),
        }
    }
}
