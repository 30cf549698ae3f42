//! Parsed configuration bodies.
//!
//! # Purpose
//! A config body is stored twice: verbatim as `body_raw`, and parsed into a
//! [`Document`] that is served as plain JSON. Parsing is also how a body is
//! validated against its config's format.
//!
//! # Key invariants
//! - Mapping entries keep the order in which they appear in the source text.
//! - Every mapping key is a string. YAML keys of other kinds are replaced by
//!   their JSON text, so `1` becomes `"1"` and `null` becomes `"null"`.
//! - Numbers are finite. Integers that fit in 64 bits are kept exactly.
//! - A repeated JSON key keeps its first position and its last value. YAML
//!   rejects repeated keys.
//! - YAML merge keys (`<<`) are expanded where they appear. Tags are dropped
//!   and the tagged value is kept.
use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Payload format of a config. Fixed when the config is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigFormat {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            other => Err(DocumentError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid json: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid yaml: {0}")]
    Yaml(#[source] serde_yaml::Error),
    #[error("unknown format: {0}")]
    UnknownFormat(String),
}

/// A JSON-compatible value with ordered mappings.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Document>),
    Mapping(IndexMap<String, Document>),
}

impl Document {
    /// Parse `raw` as a single document of the given format.
    pub fn parse(format: ConfigFormat, raw: &str) -> Result<Self, DocumentError> {
        match format {
            ConfigFormat::Json => serde_json::from_str(raw).map_err(DocumentError::Json),
            ConfigFormat::Yaml => {
                if is_blank_yaml(raw) {
                    return Ok(Self::Null);
                }
                let value: serde_yaml::Value =
                    serde_yaml::from_str(raw).map_err(DocumentError::Yaml)?;
                Self::from_yaml(value)
            }
        }
    }

    /// Look up a mapping entry by key.
    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Self::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }

    fn from_yaml(value: serde_yaml::Value) -> Result<Self, DocumentError> {
        use serde_yaml::Value;
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => Self::Number(yaml_number(&number)?),
            Value::String(text) => Self::String(text),
            Value::Sequence(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::from_yaml)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(mapping) => Self::Mapping(yaml_mapping(mapping)?),
            Value::Tagged(tagged) => Self::from_yaml(tagged.value)?,
        })
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        // Keys are strings and numbers are finite, so JSON encoding cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "null".to_string())
    }
}

fn yaml_number(number: &serde_yaml::Number) -> Result<serde_json::Number, DocumentError> {
    if let Some(value) = number.as_i64() {
        return Ok(value.into());
    }
    if let Some(value) = number.as_u64() {
        return Ok(value.into());
    }
    number
        .as_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| {
            DocumentError::Yaml(de::Error::custom("non-finite numbers are not supported"))
        })
}

const MERGE_KEY: &str = "<<";

enum YamlSlot {
    Entry(String, Document),
    Merge(Vec<IndexMap<String, Document>>),
}

/// Convert one YAML mapping, expanding merge keys in place.
///
/// Merged entries take the position of their `<<` key. Keys written in the
/// mapping itself win over merged ones, and earlier merge sources win over
/// later ones.
fn yaml_mapping(mapping: serde_yaml::Mapping) -> Result<IndexMap<String, Document>, DocumentError> {
    let mut slots = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        if key.as_str() == Some(MERGE_KEY) {
            slots.push(YamlSlot::Merge(merge_sources(value)?));
        } else {
            let key = key_text(Document::from_yaml(key)?).map_err(DocumentError::Json)?;
            slots.push(YamlSlot::Entry(key, Document::from_yaml(value)?));
        }
    }
    let explicit: HashSet<String> = slots
        .iter()
        .filter_map(|slot| match slot {
            YamlSlot::Entry(key, _) => Some(key.clone()),
            YamlSlot::Merge(_) => None,
        })
        .collect();

    let mut entries = IndexMap::with_capacity(slots.len());
    for slot in slots {
        match slot {
            YamlSlot::Entry(key, value) => {
                entries.insert(key, value);
            }
            YamlSlot::Merge(sources) => {
                for (key, value) in sources.into_iter().flatten() {
                    if !explicit.contains(&key) {
                        entries.entry(key).or_insert(value);
                    }
                }
            }
        }
    }
    Ok(entries)
}

fn merge_sources(value: serde_yaml::Value) -> Result<Vec<IndexMap<String, Document>>, DocumentError> {
    use serde_yaml::Value;
    let invalid =
        || DocumentError::Yaml(de::Error::custom("merge key expects a mapping or a list of mappings"));
    match value {
        Value::Mapping(mapping) => Ok(vec![yaml_mapping(mapping)?]),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Mapping(mapping) => yaml_mapping(mapping),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

fn is_blank_yaml(raw: &str) -> bool {
    raw.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Number(value) => value.serialize(serializer),
            Self::String(value) => serializer.serialize_str(value),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON-compatible value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Document, D::Error> {
        Document::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Document, E> {
        Ok(Document::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Document, E> {
        Ok(Document::Number(value.into()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Document, E> {
        Ok(Document::Number(value.into()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Document, E> {
        serde_json::Number::from_f64(value)
            .map(Document::Number)
            .ok_or_else(|| E::custom("non-finite numbers are not supported"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Document, E> {
        Ok(Document::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Document, E> {
        Ok(Document::String(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Document, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Document>()? {
            items.push(item);
        }
        Ok(Document::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<Document>()? {
            let key = key_text(key).map_err(de::Error::custom)?;
            let value = map.next_value::<Document>()?;
            // An existing key keeps its slot and takes the new value.
            entries.insert(key, value);
        }
        Ok(Document::Mapping(entries))
    }
}

fn key_text(key: Document) -> Result<String, serde_json::Error> {
    match key {
        Document::String(text) => Ok(text),
        other => serde_json::to_string(&other),
    }
}
