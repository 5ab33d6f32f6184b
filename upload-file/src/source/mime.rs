//! MIME type detection and extension guessing
//!
//! Content is trusted over names: magic numbers are checked first (the
//! `infer` crate), then the file name (`mime_guess`), and finally a UTF-8
//! check decides between `text/plain` and `application/octet-stream`.

use crate::aggregate::normalize_mime;
use std::path::Path;

/// Fallback MIME type for binary content
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Number of leading bytes inspected when sniffing a file on disk
pub const SNIFF_LEN: usize = 8192;

/// Extensions preferred over `mime_guess`'s first (alphabetical) answer
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
    ("image/tiff", "tiff"),
    ("application/pdf", "pdf"),
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("audio/x-wav", "wav"),
    ("video/mp4", "mp4"),
    ("video/mpeg", "mpeg"),
    ("video/quicktime", "mov"),
    ("application/zip", "zip"),
    ("application/gzip", "gz"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    ("text/html", "html"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("text/xml", "xml"),
];

/// Detects a MIME type from magic numbers only
#[must_use]
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    infer::get(head).map(|kind| kind.mime_type())
}

/// Detects the MIME type of `head`, optionally helped by a file name
///
/// # Examples
///
/// ```rust
/// use upload_file::source::mime::detect;
///
/// assert_eq!(detect(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], None), "image/png");
/// assert_eq!(detect(b"a,b\n1,2\n", Some("table.csv")), "text/csv");
/// assert_eq!(detect(b"hello", None), "text/plain");
/// assert_eq!(detect(&[0x00, 0xFF, 0xFE], None), "application/octet-stream");
/// ```
#[must_use]
pub fn detect(head: &[u8], name: Option<&str>) -> String {
    if let Some(mime) = sniff(head) {
        return mime.to_string();
    }

    if let Some(guess) = name.and_then(|n| mime_guess::from_path(n).first()) {
        return normalize_mime(guess.essence_str());
    }

    if is_text(head) {
        "text/plain".to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}

/// Whether `head` looks like UTF-8 text
///
/// A multi-byte sequence cut off at the end of the buffer still counts.
fn is_text(head: &[u8]) -> bool {
    if head.is_empty() {
        return false;
    }
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            // Truncated at the buffer boundary
            return !head[..e.valid_up_to()].contains(&0);
        }
        Err(_) => return false,
    };
    !text.contains('\0')
}

/// Guesses the conventional extension for a MIME type
///
/// Returns an empty string when nothing is known.
///
/// # Examples
///
/// ```rust
/// use upload_file::source::mime::guess_extension;
///
/// assert_eq!(guess_extension("image/jpeg"), "jpg");
/// assert_eq!(guess_extension("IMAGE/PNG; charset=binary"), "png");
/// assert_eq!(guess_extension("application/x-nothing"), "");
/// ```
#[must_use]
pub fn guess_extension(mime_type: &str) -> String {
    let essence = essence(mime_type);
    if let Some((_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(m, _)| *m == essence) {
        return (*ext).to_string();
    }
    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| (*ext).to_string())
        .unwrap_or_default()
}

/// Strips parameters from a MIME type and lower-cases it
#[must_use]
pub fn essence(mime_type: &str) -> String {
    let bare = mime_type.split(';').next().unwrap_or_default();
    normalize_mime(bare)
}

/// A MIME type declared by a client, unless it is empty or the generic fallback
#[must_use]
pub fn declared_mime(mime_type: &str) -> Option<String> {
    let essence = essence(mime_type);
    (!essence.is_empty() && essence != OCTET_STREAM).then_some(essence)
}

/// Lower-cased extension of a file name, if any
#[must_use]
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

/// File name without directory or extension, if any
#[must_use]
pub fn stem_of(name: &str) -> Option<String> {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(ToString::to_string)
}
