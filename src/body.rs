//! Body classification and decoding utilities.
//!
//! This module decides whether a buffered body is safe to print, resolves the
//! charset a body declares, and transparently inflates gzip payloads so the
//! log shows readable text instead of compressed bytes.

use std::io::Read;

use flate2::read::GzDecoder;
use http::{header, HeaderMap};
use tracing::trace;

/// Error type for body decoding operations
#[derive(Debug, thiserror::Error)]
pub enum BodyDecodeError {
    #[error("gzip inflate failed: {0}")]
    Gzip(#[from] std::io::Error),
}

/// Returns true if the buffer probably contains human readable text.
///
/// Samples at most the first 64 bytes and decodes up to 16 code points from
/// them, looking for the control characters that binary file signatures
/// start with. A truncated or invalid UTF-8 sequence reached inside the
/// sample counts as binary. This is a heuristic, not a validation; exotic
/// encodings may be misclassified either way.
pub fn is_plaintext(data: &[u8]) -> bool {
    let prefix = &data[..data.len().min(64)];
    let (sample, truncated) = match std::str::from_utf8(prefix) {
        Ok(sample) => (sample, false),
        Err(err) => {
            let valid = std::str::from_utf8(&prefix[..err.valid_up_to()]).unwrap_or("");
            (valid, true)
        }
    };

    let mut decoded = 0;
    for ch in sample.chars().take(16) {
        if ch.is_control() && !ch.is_whitespace() {
            return false;
        }
        decoded += 1;
    }

    // A malformed sequence only matters if the scan reached it before the
    // 16 code point sample was complete.
    decoded == 16 || !truncated
}

/// Charset label declared by a content type's `charset=` parameter,
/// lowercased. Defaults to `utf-8` when the content type or the parameter
/// is absent.
pub fn declared_charset(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| {
            ct.split(';').skip(1).find_map(|param| {
                let (key, value) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("charset")
                    .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
            })
        })
        .unwrap_or_else(|| "utf-8".to_string())
}

/// Decode body bytes for display using the charset the content type declares.
///
/// Only the UTF-8 family has a native decoder here; any other label falls
/// back to lossy UTF-8, so undecodable bytes render as U+FFFD instead of
/// failing the call.
pub fn decode_text(data: &[u8], content_type: Option<&str>) -> String {
    let charset = declared_charset(content_type);
    if !matches!(charset.as_str(), "utf-8" | "utf8" | "us-ascii" | "ascii") {
        trace!(charset = %charset, "no native decoder for declared charset, decoding lossily");
    }
    String::from_utf8_lossy(data).into_owned()
}

/// Inflate a gzip stream into a fresh buffer.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>, BodyDecodeError> {
    let mut inflated = Vec::new();
    GzDecoder::new(data).read_to_end(&mut inflated)?;
    Ok(inflated)
}

/// Whether the headers declare a gzip Content-Encoding.
pub fn is_gzip(headers: &HeaderMap) -> bool {
    content_encoding(headers).is_some_and(|enc| enc.eq_ignore_ascii_case("gzip"))
}

/// Whether the headers declare a Content-Encoding this interceptor cannot
/// display. Absent, `identity` and `gzip` encodings are the supported set;
/// anything else (deflate, br, ...) makes the body opaque.
pub fn has_unknown_encoding(headers: &HeaderMap) -> bool {
    content_encoding(headers).is_some_and(|enc| {
        !enc.eq_ignore_ascii_case("identity") && !enc.eq_ignore_ascii_case("gzip")
    })
}

fn content_encoding(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
}
