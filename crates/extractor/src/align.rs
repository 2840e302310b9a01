//! Locating extracted excerpts in the narrative.

use std::ops::Range;

/// Finds the leftmost exact, case-sensitive occurrence of `needle` in
/// `haystack` and returns its char range. Empty needles are never found.
pub fn locate(haystack: &str, needle: &str) -> Option<Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    let byte_start = haystack.find(needle)?;
    let start = haystack[..byte_start].chars().count();
    Some(start..start + needle.chars().count())
}
