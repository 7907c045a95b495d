//! Filename hygiene for names arriving from callers and for span attributes.
//!
//! Uploaded names are reduced to a single safe path component before they
//! touch the data directory; traces only ever see base names.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum length (in characters) of a sanitized filename.
pub const MAX_FILENAME_CHARS: usize = 200;

/// Name used when nothing usable survives sanitization.
pub const FALLBACK_FILENAME: &str = "upload";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex is valid"));

/// Reduces an arbitrary caller-supplied name to a filesystem-friendly base name.
///
/// - path components (both `/` and `\` separated) are discarded
/// - runs of characters outside `[A-Za-z0-9._-]` become a single `_`
/// - leading/trailing `.` and `_` are stripped
/// - the result is cut to [`MAX_FILENAME_CHARS`]
/// - an empty result becomes [`FALLBACK_FILENAME`]
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let replaced = UNSAFE_CHARS.replace_all(base, "_");
    let trimmed = replaced.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    trimmed.chars().take(MAX_FILENAME_CHARS).collect()
}

/// Returns true if `name` is a bare file name with no path components.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
