//! Data model shared by the stores and the HTTP API.
//!
//! # Purpose
//! Re-exports namespace, config, version, and browse-entry records. These are
//! the shapes persisted by the stores and serialized on the wire.
mod browse;
mod config;
mod namespace;

pub use crate::document::{ConfigFormat, Document};
pub use browse::BrowseEntry;
pub use config::{
    Config, ConfigKey, ConfigListItem, ConfigVersion, ConfigVersionMeta, ConfigWithVersion,
    RequestAudit,
};
pub use namespace::{Namespace, NamespaceWithCount};
