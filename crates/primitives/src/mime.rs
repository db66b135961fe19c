//! Media-type classification by filename extension

use std::path::Path;

/// Media type reported for unknown or missing extensions
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Classify a filename by its extension (case-insensitive).
///
/// The extension is whatever follows the last `.` of the final path
/// component, so a dotfile such as `.txt` counts as a `txt` file.
pub fn detect_mime_type(filename: impl AsRef<Path>) -> &'static str {
    let Some((_, ext)) = filename
        .as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
    else {
        return DEFAULT_MIME_TYPE;
    };

    match ext.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "zip" => "application/zip",
        "json" => "application/json",
        "xml" => "application/xml",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        _ => DEFAULT_MIME_TYPE,
    }
}
