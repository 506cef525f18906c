//! Content-Type selection from file extensions.

/// Used for unknown extensions and extensionless names.
pub const DEFAULT_MIME: &str = "text/html";

/// Maps a file extension (without the dot, any case) to a MIME type.
pub fn from_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        _ => DEFAULT_MIME,
    }
}

/// MIME type for a file name or path, judged by its last extension.
pub fn from_path(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => from_extension(ext),
        _ => DEFAULT_MIME,
    }
}
