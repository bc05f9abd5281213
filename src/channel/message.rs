//! Control message wire format.
//!
//! Messages are JSON objects discriminated by `type`. Binary payloads are
//! carried as standard base64 strings.

use serde::{Deserialize, Serialize};

use crate::themes::Category;

/// A request sent over the control channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    InstallExtension {
        #[serde(with = "base64_bytes")]
        file: Vec<u8>,
    },
    RemoveExtension {
        #[serde(rename = "extensionID")]
        extension_id: String,
    },
    ListExtensions,
    /// Categories stay raw strings so an unknown one can be ignored rather
    /// than rejected.
    Upload {
        category: String,
        file: UploadFile,
    },
    Remove {
        category: String,
        filename: String,
    },
    List {
        category: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// A reply to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Reply {
    InstallComplete {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    RemoveComplete {
        success: bool,
        #[serde(rename = "extensionID")]
        extension_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ListExtensions {
        files: Vec<String>,
    },
    Upload {
        category: Category,
        success: bool,
    },
    Remove {
        category: Category,
        success: bool,
    },
    List {
        category: Category,
        files: Vec<String>,
    },
}

impl Reply {
    /// Whether the reply reports success. Listings always do.
    pub fn is_success(&self) -> bool {
        match self {
            Reply::InstallComplete { success, .. }
            | Reply::RemoveComplete { success, .. }
            | Reply::Upload { success, .. }
            | Reply::Remove { success, .. } => *success,
            Reply::ListExtensions { .. } | Reply::List { .. } => true,
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
