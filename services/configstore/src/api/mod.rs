//! HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules and the helpers they share for query
//! parameters, JSON bodies, and request audit capture.
pub mod configs;
pub mod error;
pub mod namespaces;
pub mod openapi;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_invalid_input};
use crate::cursor::{MAX_PAGE_LIMIT, PageRequest, decode_cursor};
use crate::model::RequestAudit;
use crate::validate::ValidationError;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;

pub(crate) type QueryParams = HashMap<String, String>;

/// A request body as extracted, including a read failure such as the body
/// limit being exceeded.
pub(crate) type RawBody = Result<Bytes, BytesRejection>;

/// Value of `key`, or `None` when absent or blank.
fn param<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

pub(crate) fn parse_limit(params: &QueryParams, default: u32) -> Result<u32, ApiError> {
    let Some(raw) = param(params, "limit") else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(limit) if (1..=MAX_PAGE_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(ValidationError::InvalidLimit.into()),
    }
}

/// `limit` and `cursor` as a page window.
pub(crate) fn parse_page(params: &QueryParams, default_limit: u32) -> Result<PageRequest, ApiError> {
    let limit = parse_limit(params, default_limit)?;
    let offset = match param(params, "cursor") {
        Some(token) => decode_cursor(token)?,
        None => 0,
    };
    Ok(PageRequest::new(limit, offset))
}

/// Accepts `true/1/yes/y` and `false/0/no/n`, case-insensitively.
pub(crate) fn parse_optional_bool(
    params: &QueryParams,
    key: &'static str,
) -> Result<Option<bool>, ApiError> {
    let Some(raw) = param(params, key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "n" => Ok(Some(false)),
        _ => Err(ValidationError::InvalidBool { field: key }.into()),
    }
}

pub(crate) fn query_string<'a>(params: &'a QueryParams, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("")
}

/// Decode exactly one JSON value into `T`. A body that could not be read is
/// answered like a malformed one.
pub(crate) fn decode_json_body<T: DeserializeOwned>(body: RawBody) -> Result<T, ApiError> {
    let body = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, status = %rejection.status(), "request body not read");
        api_invalid_input("invalid json body", None)
    })?;
    serde_json::from_slice(&body).map_err(|err| {
        tracing::debug!(error = %err, "rejected request body");
        api_invalid_input("invalid json body", None)
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Audit fields for a write: request ID, user agent, and client address.
///
/// The client address is the first `x-forwarded-for` hop, then
/// `x-real-ip`, then the peer address.
pub(crate) fn request_audit(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestAudit {
    let forwarded = header_value(headers, "x-forwarded-for").and_then(|value| {
        value
            .split(',')
            .next()
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
            .map(str::to_string)
    });
    let source_ip = forwarded
        .or_else(|| header_value(headers, "x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()));
    RequestAudit {
        request_id: header_value(headers, "x-request-id"),
        user_agent: header_value(headers, "user-agent"),
        source_ip,
    }
}
