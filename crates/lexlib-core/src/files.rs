//! File handling for uploaded documents: name sanitization, content type
//! detection, storage object paths and preview classification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest file name kept in a storage path.
const MAX_FILENAME_LEN: usize = 200;

/// Sanitize a client-supplied file name for use in a storage path.
///
/// Strips directory components, replaces reserved and control characters,
/// and truncates long names while keeping the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '#' | '%' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim().trim_start_matches('.');
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    if sanitized.chars().count() <= MAX_FILENAME_LEN {
        return sanitized.to_string();
    }

    // Keep the extension when truncating.
    let (stem, ext) = match sanitized.rfind('.') {
        Some(pos) if sanitized.len() - pos <= 10 => sanitized.split_at(pos),
        _ => (sanitized, ""),
    };
    let keep = MAX_FILENAME_LEN.saturating_sub(ext.chars().count());
    let stem: String = stem.chars().take(keep).collect();
    format!("{}{}", stem, ext)
}

/// Detect the MIME type of an uploaded file.
///
/// Magic bytes win; formats without a signature fall back to the extension;
/// anything else is `application/octet-stream`.
pub fn detect_content_type(filename: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    filename
        .rsplit_once('.')
        .and_then(|(_, ext)| mime_from_extension(ext))
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Extensions for text formats that carry no magic bytes.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "txt" | "text" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "html" | "htm" => Some("text/html"),
        "md" | "markdown" => Some("text/markdown"),
        "xml" => Some("application/xml"),
        "json" => Some("application/json"),
        "rtf" => Some("application/rtf"),
        _ => None,
    }
}

/// Build the storage object path `<category>/<subcategory>/<uuid>-<file>`.
///
/// The random prefix keeps re-uploads of the same file name from colliding.
pub fn object_path(category: &str, subcategory: &str, filename: &str) -> String {
    format!(
        "{}/{}/{}-{}",
        category,
        subcategory,
        Uuid::new_v4(),
        sanitize_filename(filename)
    )
}

/// How a document can be previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    /// Rendered in the viewer as-is.
    Inline,
    /// No viewer for this format; offer a download instead.
    DownloadInstead,
}

impl PreviewKind {
    /// Classify a MIME type.
    pub fn for_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let inline = essence == "application/pdf"
            || essence == "text/plain"
            || essence == "text/html"
            || (essence.starts_with("image/") && essence != "image/svg+xml");
        if inline {
            PreviewKind::Inline
        } else {
            PreviewKind::DownloadInstead
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, PreviewKind::Inline)
    }
}
