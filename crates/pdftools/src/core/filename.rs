//! Upload name handling and human-readable sizes.

/// Remove NUL bytes and other control characters that break headers and JSON.
///
/// Tabs, newlines and carriage returns are kept.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\x00'..='\x08' | '\x0B' | '\x0C' | '\x0E'..='\x1F' | '\x7F'))
        .collect()
}

/// Reduce an uploaded file name to a safe ASCII basename.
///
/// Path components are dropped, whitespace becomes `_`, and anything outside
/// `[A-Za-z0-9._-]` is removed. A stem that ends up empty becomes `document`,
/// keeping the extension when one survives.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = sanitize_text(base)
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let (stem, ext) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => (stem, Some(ext)),
        _ => (cleaned.as_str(), None),
    };

    let stem = stem.trim_matches(|c| c == '.' || c == '_');
    let stem = if stem.is_empty() { "document" } else { stem };

    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

/// Lowercase extension after the last `.`, if the name has one.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Format a byte count the way the API reports it (`B`, `KB`, `MB`).
pub fn format_file_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if size_bytes < KB {
        format!("{} B", size_bytes)
    } else if size_bytes < MB {
        format!("{:.1} KB", size_bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", size_bytes as f64 / MB as f64)
    }
}
