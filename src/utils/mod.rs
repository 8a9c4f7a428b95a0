/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Longest stem in bytes. Leaves room under the 255-byte name limit for a
/// ` (n)` suffix and `.mp3.part`.
pub const MAX_STEM_BYTES: usize = 200;

/// Cuts `s` to at most `max` bytes without splitting a character.
pub fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }

    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// File stem used for a downloaded title. Never empty.
pub fn file_stem_for(title: &str) -> String {
    let sanitized = sanitize_filename(title);
    let stem = truncate_on_char_boundary(&sanitized, MAX_STEM_BYTES)
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string();

    if stem.is_empty() {
        "audio".to_string()
    } else {
        stem
    }
}
