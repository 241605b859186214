//! Post drafts and the inline image encoding they carry.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::error::DomainError;

const DATA_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";
const DEFAULT_DATA_MIME: &str = "text/plain";

/// Mime type recorded when an upload does not declare one and its name gives no hint.
pub const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// An image stored inline as a `data:` URI (RFC 2397).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataUri {
    raw: String,
    mime: String,
    byte_len: usize,
}

impl ImageDataUri {
    /// Check the shape of a client-supplied data URI and keep it verbatim.
    ///
    /// The scheme and the `;base64` marker match case-insensitively. Base64
    /// payloads may omit padding; other payloads are percent-encoded text.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let rest = value
            .get(..DATA_SCHEME.len())
            .filter(|scheme| scheme.eq_ignore_ascii_case(DATA_SCHEME))
            .map(|_| &value[DATA_SCHEME.len()..])
            .ok_or_else(|| DomainError::validation("image must be a data URI"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DomainError::validation("image data URI has no payload separator"))?;

        let (params, is_base64) = match header.len().checked_sub(BASE64_MARKER.len()) {
            Some(at)
                if header
                    .get(at..)
                    .is_some_and(|tail| tail.eq_ignore_ascii_case(BASE64_MARKER)) =>
            {
                (&header[..at], true)
            }
            _ => (header, false),
        };

        let mime = params.split(';').next().unwrap_or_default().trim();
        if !mime.is_empty() && !is_mime(mime) {
            return Err(DomainError::validation(format!(
                "image data URI has invalid mime type `{mime}`"
            )));
        }

        let byte_len = if is_base64 {
            base64_len(payload).ok_or_else(|| {
                DomainError::validation("image data URI payload is not base64")
            })?
        } else {
            percent_decoded_len(payload)
        };

        Ok(Self {
            raw: value.to_string(),
            mime: if mime.is_empty() {
                DEFAULT_DATA_MIME.to_string()
            } else {
                mime.to_ascii_lowercase()
            },
            byte_len,
        })
    }

    /// Encode raw uploaded bytes. Empty uploads are rejected.
    ///
    /// Parameters on `content_type` are dropped; an unusable type becomes JPEG.
    pub fn encode(content_type: &str, bytes: &[u8]) -> Result<Self, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::validation("image upload is empty"));
        }
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        let mime = if is_mime(essence) {
            essence.to_ascii_lowercase()
        } else {
            FALLBACK_IMAGE_MIME.to_string()
        };
        let raw = format!(
            "{DATA_SCHEME}{mime}{BASE64_MARKER},{}",
            STANDARD.encode(bytes)
        );
        Ok(Self {
            raw,
            mime,
            byte_len: bytes.len(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }

    /// Number of image bytes the payload stands for.
    pub fn decoded_len(&self) -> usize {
        self.byte_len
    }
}

impl fmt::Display for ImageDataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn is_mime(value: &str) -> bool {
    match value.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Decoded size of a standard or URL-safe base64 payload, padded or not.
/// `None` when the text cannot be base64.
fn base64_len(payload: &str) -> Option<usize> {
    let data = payload.trim_end_matches('=');
    if payload.len() - data.len() > 2 {
        return None;
    }
    let valid = data
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_'));
    if !valid || data.len() % 4 == 1 {
        return None;
    }
    Some(data.len() / 4 * 3 + (data.len() % 4).saturating_sub(1))
}

fn percent_decoded_len(payload: &str) -> usize {
    let escapes = payload.matches('%').count();
    payload.len().saturating_sub(escapes * 2)
}

/// A fully validated post body, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub description: String,
    pub image: ImageDataUri,
}
