//! Event image uploads.

/// Image extensions accepted for event pictures, compared case-insensitively.
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Reduce a client-supplied filename to something safe to store on disk.
///
/// Non-ASCII characters are dropped, path separators and whitespace become
/// underscores, anything outside `[A-Za-z0-9_.-]` is removed, and leading or
/// trailing dots and underscores are stripped. The result may be empty.
#[must_use]
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    ascii
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_owned()
}

/// Sanitize an uploaded image's filename and check its extension.
///
/// # Errors
///
/// Fails when nothing usable is left of the name or the extension is not
/// PNG, JPG or JPEG.
pub fn image_filename(name: &str) -> Result<String, &'static str> {
    let safe = secure_filename(name);
    let allowed = safe
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| {
            !stem.is_empty() && ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        });
    if allowed {
        Ok(safe)
    } else {
        Err("Only supports png, jpg, JPG, PNG")
    }
}
