//! UTF-16 offset helpers.
//!
//! Both the DOM selection API and the editing channel count in UTF-16 code
//! units, while Rust strings index by byte.

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte index for a UTF-16 offset. Offsets past the end clamp to `s.len()`;
/// an offset inside a surrogate pair snaps back to the start of that char.
pub fn byte_index_for_utf16(s: &str, offset: usize) -> usize {
    let mut units = 0usize;
    for (i, ch) in s.char_indices() {
        let next = units + ch.len_utf16();
        if next > offset {
            return i;
        }
        units = next;
    }
    s.len()
}

/// Clamps a UTF-16 offset into `[0, utf16_len(s)]`.
pub fn clamp_utf16(s: &str, offset: usize) -> usize {
    offset.min(utf16_len(s))
}
