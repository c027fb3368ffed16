//! Filename sanitization for Content-Disposition headers.

/// Name substituted when sanitization leaves nothing usable.
pub const DEFAULT_DOWNLOAD_NAME: &str = "document.pdf";

/// Characters replaced with `_`: header-breaking quotes/backslashes plus the
/// usual filesystem-reserved set.
const REPLACED: &[char] = &['"', '\\', '/', ':', '*', '?', '<', '>', '|'];

/// Sanitize a filename for use inside a quoted Content-Disposition value.
///
/// Control characters are stripped, disallowed characters become `_`, and an
/// empty result is substituted with [`DEFAULT_DOWNLOAD_NAME`].
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if REPLACED.contains(&c) { '_' } else { c })
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
        DEFAULT_DOWNLOAD_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
