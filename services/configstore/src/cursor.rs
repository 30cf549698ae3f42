//! Opaque pagination cursors and page bookkeeping.
//!
//! # Purpose
//! List endpoints page with an offset, but callers only ever see an opaque
//! token. The token is standard base64 of `o:<offset>`; a bare decimal offset
//! is still accepted so older clients keep working.
//!
//! # Key invariants
//! - Offsets above [`MAX_CURSOR_OFFSET`] are rejected on decode and never
//!   handed out on encode.
//! - A page is final when it returned fewer items than the requested limit.
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest offset a cursor may carry.
pub const MAX_CURSOR_OFFSET: u64 = 100_000;
/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: u32 = 500;
/// Page size when the caller does not pass `limit`.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
/// Page size for folder browsing when the caller does not pass `limit`.
pub const DEFAULT_BROWSE_LIMIT: u32 = 200;

const CURSOR_TAG: &str = "o:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("invalid cursor")]
    Malformed,
    #[error("cursor offset exceeds maximum")]
    OutOfRange,
}

pub fn encode_cursor(offset: u64) -> String {
    STANDARD.encode(format!("{CURSOR_TAG}{offset}"))
}

pub fn decode_cursor(token: &str) -> Result<u64, CursorError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CursorError::Malformed);
    }
    // Legacy form: a bare decimal offset.
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return parse_offset(token);
    }
    let decoded = STANDARD
        .decode(token)
        .map_err(|_| CursorError::Malformed)?;
    let text = String::from_utf8(decoded).map_err(|_| CursorError::Malformed)?;
    let digits = text
        .strip_prefix(CURSOR_TAG)
        .ok_or(CursorError::Malformed)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CursorError::Malformed);
    }
    parse_offset(digits)
}

fn parse_offset(digits: &str) -> Result<u64, CursorError> {
    // All-digit input that overflows u64 is still just a too-large offset.
    let offset = digits.parse::<u64>().map_err(|_| CursorError::OutOfRange)?;
    if offset > MAX_CURSOR_OFFSET {
        return Err(CursorError::OutOfRange);
    }
    Ok(offset)
}

/// Window requested by a list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u64) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    /// Cursor for the following page, or `None` when `returned` shows this
    /// page was the last one.
    pub fn next_cursor(&self, returned: usize) -> Option<String> {
        if (returned as u64) < u64::from(self.limit) {
            return None;
        }
        let next = self.offset + u64::from(self.limit);
        (next <= MAX_CURSOR_OFFSET).then(|| encode_cursor(next))
    }

    /// Apply this window to an already ordered, fully materialized list.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let items: Vec<T> = items
            .into_iter()
            .skip(offset)
            .take(self.limit as usize)
            .collect();
        Page::new(items, self)
    }
}

/// One page of results plus the cursor for the next one.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest) -> Self {
        let next_cursor = request.next_cursor(items.len());
        Self { items, next_cursor }
    }
}
