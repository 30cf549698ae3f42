//! Identifier, path, and prefix rules shared by the HTTP layer and the stores.
//!
//! # Purpose
//! Every value that names a namespace or config goes through these functions
//! before it reaches a store, so the stores only ever see canonical input.
//!
//! # Key invariants
//! - Namespace names match `^[a-zA-Z0-9_-]+$` after trimming.
//! - Config paths never start or end with `/`, never contain empty segments,
//!   `..`, or whitespace.
//! - Non-empty prefixes always end with `/` and never start with one.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be letters, digits, underscore, hyphen only")]
    InvalidName { field: &'static str },
    #[error("path must not contain empty segments")]
    EmptySegment,
    #[error("{field} must not contain '..'")]
    ParentTraversal { field: &'static str },
    #[error("path must not contain whitespace")]
    Whitespace,
    #[error("version must be a positive integer")]
    InvalidVersion,
    #[error("format must be one of: json, yaml")]
    InvalidFormat,
    #[error("limit must be an integer between 1 and 500")]
    InvalidLimit,
    #[error("{field} must be a boolean")]
    InvalidBool { field: &'static str },
}

impl ValidationError {
    /// Name of the offending input, reported back to clients in `details`.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::InvalidName { field }
            | Self::ParentTraversal { field }
            | Self::InvalidBool { field } => field,
            Self::EmptySegment | Self::Whitespace => "path",
            Self::InvalidVersion => "version",
            Self::InvalidFormat => "format",
            Self::InvalidLimit => "limit",
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn validate_identifier(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    if !trimmed.chars().all(is_name_char) {
        return Err(ValidationError::InvalidName { field });
    }
    Ok(trimmed.to_string())
}

/// Validate a namespace taken from a URL segment; returns the trimmed name.
pub fn validate_namespace(raw: &str) -> Result<String, ValidationError> {
    validate_identifier(raw, "namespace")
}

/// Validate the `name` field of a namespace creation body.
pub fn validate_namespace_name(raw: &str) -> Result<String, ValidationError> {
    validate_identifier(raw, "name")
}

/// Canonicalize a config path.
pub fn normalize_config_path(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let path = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        return Err(ValidationError::Required { field: "path" });
    }
    if path.contains("//") {
        return Err(ValidationError::EmptySegment);
    }
    if path.contains("..") {
        return Err(ValidationError::ParentTraversal { field: "path" });
    }
    if path.chars().any(char::is_whitespace) {
        return Err(ValidationError::Whitespace);
    }
    Ok(path.to_string())
}

/// Canonicalize a browse/list prefix. Empty input means "everything".
pub fn normalize_prefix(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let prefix = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if prefix.contains("..") {
        return Err(ValidationError::ParentTraversal { field: "prefix" });
    }
    if prefix.is_empty() || prefix.ends_with('/') {
        return Ok(prefix.to_string());
    }
    Ok(format!("{prefix}/"))
}

/// Parse a version number from a URL segment.
pub fn parse_version_number(raw: &str) -> Result<u32, ValidationError> {
    match raw.trim().parse::<u32>() {
        Ok(version) if version >= 1 => Ok(version),
        _ => Err(ValidationError::InvalidVersion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_names_follow_pattern() {
        assert_eq!(validate_namespace("team").unwrap(), "team");
        assert_eq!(validate_namespace("  Team_1-a ").unwrap(), "Team_1-a");
        assert_eq!(
            validate_namespace(""),
            Err(ValidationError::Required { field: "namespace" })
        );
        assert_eq!(
            validate_namespace("   "),
            Err(ValidationError::Required { field: "namespace" })
        );
        for bad in ["a b", "a/b", "a.b", "ünï", "x:y"] {
            assert_eq!(
                validate_namespace(bad),
                Err(ValidationError::InvalidName { field: "namespace" }),
                "{bad}"
            );
        }
        assert_eq!(
            validate_namespace_name("a.b").unwrap_err().field(),
            "name"
        );
    }

    #[test]
    fn config_paths_are_canonicalized() {
        assert_eq!(normalize_config_path("svc.yaml").unwrap(), "svc.yaml");
        assert_eq!(normalize_config_path(" /a/b/c.json/ ").unwrap(), "a/b/c.json");
        assert_eq!(
            normalize_config_path("/"),
            Err(ValidationError::Required { field: "path" })
        );
        assert_eq!(
            normalize_config_path("a//b"),
            Err(ValidationError::EmptySegment)
        );
        assert_eq!(
            normalize_config_path("a/../b"),
            Err(ValidationError::ParentTraversal { field: "path" })
        );
        assert_eq!(
            normalize_config_path("a/b c"),
            Err(ValidationError::Whitespace)
        );
        assert_eq!(
            normalize_config_path("a/\tb"),
            Err(ValidationError::Whitespace)
        );
    }

    #[test]
    fn only_one_leading_slash_is_stripped() {
        assert_eq!(
            normalize_config_path("//a"),
            Err(ValidationError::EmptySegment)
        );
    }

    #[test]
    fn prefixes_gain_trailing_slash() {
        assert_eq!(normalize_prefix("").unwrap(), "");
        assert_eq!(normalize_prefix("  ").unwrap(), "");
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert_eq!(normalize_prefix("a").unwrap(), "a/");
        assert_eq!(normalize_prefix("/a/b").unwrap(), "a/b/");
        assert_eq!(normalize_prefix("a/").unwrap(), "a/");
        assert_eq!(
            normalize_prefix("a/../b"),
            Err(ValidationError::ParentTraversal { field: "prefix" })
        );
    }

    #[test]
    fn version_numbers_must_be_positive() {
        assert_eq!(parse_version_number("1"), Ok(1));
        assert_eq!(parse_version_number("42"), Ok(42));
        for bad in ["0", "-1", "abc", "", "1.5"] {
            assert_eq!(parse_version_number(bad), Err(ValidationError::InvalidVersion));
        }
    }

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            ValidationError::Required { field: "body_raw" }.to_string(),
            "body_raw is required"
        );
        assert_eq!(ValidationError::InvalidFormat.field(), "format");
        assert_eq!(ValidationError::Whitespace.field(), "path");
    }
}
