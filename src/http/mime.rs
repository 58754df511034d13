use std::path::Path;

/// Content-Type used when the extension is unknown or missing.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

static MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("txt", "text/plain"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
];

/// Looks up the Content-Type for a file extension, ignoring case.
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    MIME_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map_or(DEFAULT_MIME_TYPE, |&(_, mime)| mime)
}

/// Content-Type for a path, derived from its extension only.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(DEFAULT_MIME_TYPE, mime_type_for_extension)
}
