use std::path::Path;

/// Sanitizes an uploaded filename down to a safe basename.
///
/// Any path component is stripped (both `/` and `\` separators), control and
/// filesystem-reserved characters are replaced with `_`, and names that reduce
/// to nothing fall back to `unnamed`. The result is safe to use in staging
/// paths and object-store keys.
pub fn sanitize_file_name(filename: &str) -> String {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    // Last segment across both separator conventions, then the final basename
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let base = Path::new(base)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.is_empty() {
        "unnamed".to_string()
    } else {
        sanitized
    }
}
