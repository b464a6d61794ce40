//! Plugin manifest: the static list of action identifiers this plugin
//! declares.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// One action declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAction {
    /// Stable manifest identifier of the action
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The parts of the plugin manifest the runtime needs.
///
/// Unknown keys in the manifest document are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "Actions", default)]
    pub actions: Vec<ManifestAction>,
}

impl Manifest {
    /// Build a manifest from a list of action identifiers.
    pub fn from_action_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: ids
                .into_iter()
                .map(|uuid| ManifestAction {
                    uuid: uuid.into(),
                    name: None,
                })
                .collect(),
        }
    }

    /// Parse a manifest document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(ProtocolError::ManifestParse)
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProtocolError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Whether `id` is declared as an action identifier.
    pub fn contains_action(&self, id: &str) -> bool {
        self.actions.iter().any(|action| action.uuid == id)
    }
}
