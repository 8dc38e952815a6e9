//! View — numbered rendering of buffer lines for the print commands.
//!
//! Every print command (`print`, `line N print`, `line N range M`) shows lines
//! the same way: a zero-padded line number, `": "`, then the text.
//!
//! ```text
//! 0001: fn main() {
//! 0002:     println!("hi");
//! 0003: }
//! ```
//!
//! The number column is at least [`MIN_GUTTER`] digits wide and grows with the
//! buffer, so a 12 000-line buffer prints `00001:` through `12000:` and the
//! text column stays aligned for the whole buffer, not only the printed slice.

use std::fmt::Display;
use std::ops::RangeInclusive;

use crate::buffer::Buffer;

/// Narrowest number column, in digits.
pub const MIN_GUTTER: usize = 4;

/// Digits needed to show every line number of a buffer with `line_count`
/// lines, never less than [`MIN_GUTTER`].
///
/// | Lines        | Gutter |
/// |--------------|--------|
/// | 0–9999       | 4      |
/// | 10000–99999  | 5      |
#[must_use]
pub fn gutter_width(line_count: usize) -> usize {
    // At least 1, so ilog10 doesn't panic on 0.
    let digits = line_count.max(1).ilog10() as usize + 1;
    digits.max(MIN_GUTTER)
}

/// Format one line as `NNNN: text`.
#[must_use]
pub fn numbered(line_nr: usize, text: impl Display, gutter: usize) -> String {
    format!("{line_nr:0gutter$}: {text}")
}

/// Render the lines in `range` (1-based, inclusive). Lines outside the buffer
/// are skipped; see [`Buffer::clamp_range`].
#[must_use]
pub fn render(buf: &Buffer, range: RangeInclusive<usize>) -> Vec<String> {
    let gutter = gutter_width(buf.line_count());
    let (start, end) = range.into_inner();
    let start = start.max(1);
    if start > end {
        return Vec::new();
    }
    buf.lines()
        .enumerate()
        .skip(start - 1)
        .take(end - start + 1)
        .map(|(idx, text)| numbered(idx + 1, text, gutter))
        .collect()
}

/// Render every line of the buffer.
#[must_use]
pub fn render_all(buf: &Buffer) -> Vec<String> {
    render(buf, buf.clamp_range(1, buf.line_count()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── gutter_width ──────────────────────────────────────────────────────

    #[test]
    fn gutter_width_minimum() {
        assert_eq!(gutter_width(0), 4);
        assert_eq!(gutter_width(9), 4);
        assert_eq!(gutter_width(9999), 4);
    }

    #[test]
    fn gutter_width_grows() {
        assert_eq!(gutter_width(10_000), 5);
        assert_eq!(gutter_width(123_456), 6);
    }

    // ── numbered ──────────────────────────────────────────────────────────

    #[test]
    fn numbered_pads_with_zeros() {
        assert_eq!(numbered(7, "foo", 4), "0007: foo");
        assert_eq!(numbered(1234, "", 4), "1234: ");
        assert_eq!(numbered(3, "x", 6), "000003: x");
    }

    // ── render ────────────────────────────────────────────────────────────

    #[test]
    fn render_all_lines() {
        let buf = Buffer::from_lines(["a", "b", "c"]).unwrap();
        assert_eq!(render_all(&buf), ["0001: a", "0002: b", "0003: c"]);
    }

    #[test]
    fn render_range_middle() {
        let buf = Buffer::from_lines(["a", "b", "c", "d"]).unwrap();
        assert_eq!(render(&buf, 2..=3), ["0002: b", "0003: c"]);
    }

    #[test]
    fn render_clamped_range() {
        let buf = Buffer::from_lines(["a", "b"]).unwrap();
        assert_eq!(
            render(&buf, buf.clamp_range(0, 50)),
            ["0001: a", "0002: b"]
        );
    }

    #[test]
    fn render_empty_range() {
        let buf = Buffer::from_lines(["a", "b"]).unwrap();
        assert!(render(&buf, buf.clamp_range(2, 1)).is_empty());
        assert!(render_all(&Buffer::new()).is_empty());
    }
}
