//! Bounds-clamped cursor index helpers.
//!
//! Lengths and indices are in UTF-16 code units, the unit editors on the
//! host side count in. Indices may arrive out of range (including negative)
//! and are clamped to `[0, len]` first.

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn clamp_index(len: usize, index: i64) -> usize {
    usize::try_from(index.max(0)).map_or(len, |i| i.min(len))
}

/// Index one step towards the start, never below 0.
pub fn back_index(len: usize, index: i64) -> usize {
    clamp_index(len, index).saturating_sub(1)
}

/// Index one step towards the end, never beyond `len`.
pub fn front_index(len: usize, index: i64) -> usize {
    (clamp_index(len, index) + 1).min(len)
}

/// How far back a backspace at `index` may reach.
pub fn backspace_allowance(len: usize, index: i64) -> usize {
    clamp_index(len, index)
}
