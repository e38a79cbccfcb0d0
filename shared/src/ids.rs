//! Helpers for validating asset names declared in a manifest.

/// Returns true if an asset name is usable as a manifest key.
///
/// Rules:
/// - Must be non-empty and at most 64 bytes
/// - Must start with an ASCII letter or '_'
/// - Remaining characters: ASCII alphanumerics, '_', '-', '.' or '/'
/// - Must not contain control characters or whitespace
pub fn is_valid_asset_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 64 {
        return false;
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
}
