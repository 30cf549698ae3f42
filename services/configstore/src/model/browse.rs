//! Entries produced by folder browsing.
use crate::document::ConfigFormat;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One child of a browsed prefix. A child name that is both a folder and a
/// config yields two entries.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BrowseEntry {
    Folder {
        name: String,
        /// Always ends with `/`.
        full_path: String,
    },
    Config {
        name: String,
        full_path: String,
        format: ConfigFormat,
        latest_version: u32,
    },
}

impl BrowseEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } | Self::Config { name, .. } => name,
        }
    }

    pub fn full_path(&self) -> &str {
        match self {
            Self::Folder { full_path, .. } | Self::Config { full_path, .. } => full_path,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }
}
