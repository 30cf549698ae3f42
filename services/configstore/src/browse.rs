//! Virtual folder view over a namespace's flat config paths.
//!
//! # Purpose
//! Configs are stored as flat `(namespace, path)` rows. Browsing a prefix
//! groups the paths under it by their next segment and reports each segment
//! as a folder, a config, or both. Both store backends feed their rows through
//! [`project`] so they agree on grouping and order.
//!
//! # Key invariants
//! - Entries are ordered by child name (byte order); a folder entry precedes
//!   the config entry of the same name.
//! - Paths that equal the prefix itself, or whose next segment is empty, add
//!   no entry.
//! - Pagination is applied to the emitted entry list, so a child that is both
//!   a folder and a config may straddle a page boundary.
use crate::document::ConfigFormat;
use crate::model::BrowseEntry;
use std::collections::BTreeMap;

/// What browsing needs to know about one config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRow {
    pub path: String,
    pub format: ConfigFormat,
    pub latest_version: u32,
}

#[derive(Default)]
struct Child {
    folder: bool,
    leaf: Option<(ConfigFormat, u32)>,
}

/// Group `rows` under the normalized `prefix` (empty, or ending with `/`).
pub fn project<I>(prefix: &str, rows: I) -> Vec<BrowseEntry>
where
    I: IntoIterator<Item = BrowseRow>,
{
    let mut children: BTreeMap<String, Child> = BTreeMap::new();
    for row in rows {
        let Some(rest) = row.path.strip_prefix(prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((child, _)) => {
                if !child.is_empty() {
                    children.entry(child.to_string()).or_default().folder = true;
                }
            }
            None => {
                if !rest.is_empty() {
                    children.entry(rest.to_string()).or_default().leaf =
                        Some((row.format, row.latest_version));
                }
            }
        }
    }

    let mut entries = Vec::with_capacity(children.len());
    for (name, child) in children {
        if child.folder {
            entries.push(BrowseEntry::Folder {
                full_path: format!("{prefix}{name}/"),
                name: name.clone(),
            });
        }
        if let Some((format, latest_version)) = child.leaf {
            entries.push(BrowseEntry::Config {
                full_path: format!("{prefix}{name}"),
                name,
                format,
                latest_version,
            });
        }
    }
    entries
}
