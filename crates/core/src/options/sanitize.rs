//! Title sanitization for file and directory names.

/// Replacement for titles that sanitize to nothing.
pub const UNTITLED: &str = "untitled";

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes a title safe to use as a single path component.
///
/// Strips `< > : " / \ | ? *`, collapses whitespace runs to one space and
/// trims. Returns [`UNTITLED`] when nothing is left.
pub fn sanitize_title(title: &str) -> String {
    let stripped: String = title.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        UNTITLED.to_string()
    } else {
        collapsed
    }
}
