//! A single grid position: its content plus the pen it was drawn with
//! (§3 "Cell").
//!
//! The teacher's `Cell` stores `chars: [u8; 8]`, a fixed UTF-8 byte
//! buffer. libvterm's `ScreenCell` instead stores a `uint32_t chars[]`
//! codepoint array and reserves `(uint32_t)-1` as a `WIDE_CONT` sentinel
//! marking the second column of a double-width glyph
//! (`original_source/src/screen.c:119`, `putglyph`). Neither
//! representation survives into this crate unchanged: the sentinel in
//! particular is exactly the kind of "reserved value standing in for a
//! case" that doesn't belong in Rust when an enum can say it directly.
//! `CellContent` makes the three states - empty, wide-continuation,
//! actual text - into three variants no call site can confuse.

use smallvec::SmallVec;
use unicode_width::UnicodeWidthStr;

use crate::pen::Pen;

/// What occupies a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    /// Never written, or erased.
    Empty,
    /// The second (and following) column of a wide glyph. Carries no
    /// data of its own; the glyph lives in the `Chars` cell to its left.
    WideContinuation,
    /// A base character plus any combining marks that were merged into
    /// the same cell (`screen.c:putglyph`'s "combining char" path: a
    /// call with `width == 0` appends to the prior cell instead of
    /// advancing the cursor). Inline-stored up to 6 `char`s, matching
    /// a base codepoint plus a handful of combining marks before we'd
    /// spill to the heap.
    Chars(SmallVec<[char; 6]>),
}

impl CellContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    pub fn is_wide_continuation(&self) -> bool {
        matches!(self, CellContent::WideContinuation)
    }

    /// The characters held here, or an empty slice for `Empty` /
    /// `WideContinuation`.
    pub fn chars(&self) -> &[char] {
        match self {
            CellContent::Chars(cs) => cs.as_slice(),
            _ => &[],
        }
    }

    /// Append a combining mark to an existing base character.
    pub fn push_combining(&mut self, c: char) {
        if let CellContent::Chars(cs) = self {
            cs.push(c);
        }
    }
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Empty
    }
}

/// A single grid position: its content and the pen attributes it was
/// written with. Mirrors the teacher's `Cell { chars, attrs }` plus the
/// protected/double-width bits libvterm keeps on `ScreenPen` instead
/// (folded here into `Pen`, see `pen.rs`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub content: CellContent,
    pub pen: Pen,
}

impl Cell {
    pub fn blank() -> Self {
        Cell::default()
    }

    pub fn with_pen(pen: Pen) -> Self {
        Cell { content: CellContent::Empty, pen }
    }

    /// Display width in terminal columns: 0 for empty/continuation
    /// cells that carry no glyph of their own, otherwise the Unicode
    /// width of the accumulated base+combining sequence, floored at 1
    /// (a base character of width 0, e.g. a stray combining mark with
    /// no base, still occupies its cell).
    pub fn width(&self) -> usize {
        match &self.content {
            CellContent::Empty => 1,
            CellContent::WideContinuation => 0,
            CellContent::Chars(cs) => {
                let s: String = cs.iter().collect();
                UnicodeWidthStr::width(s.as_str()).max(1)
            }
        }
    }

    /// True if this cell is a wide glyph's leading column, i.e. the
    /// next cell over should be a `WideContinuation`.
    pub fn is_wide(&self) -> bool {
        matches!(&self.content, CellContent::Chars(cs) if {
            let s: String = cs.iter().collect();
            UnicodeWidthStr::width(s.as_str()) >= 2
        })
    }

    pub fn clear(&mut self, pen: Pen) {
        self.content = CellContent::Empty;
        self.pen = pen;
    }
}

/// The host-facing flattened view of a [`Cell`], used at the
/// [`crate::host::ScreenHost`] scrollback boundary where a cell is
/// exchanged as plain data rather than as crate-internal types.
/// Grounded in libvterm's `VTermScreenCell` (`screen.c`'s public struct,
/// distinct from the internal `ScreenCell`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScreenCell {
    pub chars: SmallVec<[char; 6]>,
    pub width: u8,
    pub pen: Pen,
}

impl From<&Cell> for ScreenCell {
    fn from(cell: &Cell) -> Self {
        ScreenCell {
            chars: SmallVec::from_slice(cell.content.chars()),
            width: cell.width() as u8,
            pen: cell.pen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cell_is_empty_and_width_one() {
        let cell = Cell::blank();
        assert!(cell.content.is_empty());
        assert_eq!(cell.width(), 1);
        assert!(!cell.is_wide());
    }

    #[test]
    fn wide_continuation_has_zero_width() {
        let cell = Cell { content: CellContent::WideContinuation, pen: Pen::default() };
        assert_eq!(cell.width(), 0);
        assert!(cell.content.is_wide_continuation());
    }

    #[test]
    fn cjk_glyph_is_wide() {
        let mut chars = SmallVec::new();
        chars.push('\u{4e2d}');
        let cell = Cell { content: CellContent::Chars(chars), pen: Pen::default() };
        assert!(cell.is_wide());
        assert_eq!(cell.width(), 2);
    }

    #[test]
    fn combining_mark_merges_into_base() {
        let mut chars = SmallVec::new();
        chars.push('e');
        let mut cell = Cell { content: CellContent::Chars(chars), pen: Pen::default() };
        cell.content.push_combining('\u{0301}');
        assert_eq!(cell.content.chars(), &['e', '\u{0301}']);
        assert_eq!(cell.width(), 1);
    }

    #[test]
    fn screen_cell_conversion_preserves_width() {
        let mut chars = SmallVec::new();
        chars.push('\u{4e2d}');
        let cell = Cell { content: CellContent::Chars(chars), pen: Pen::default() };
        let sc = ScreenCell::from(&cell);
        assert_eq!(sc.width, 2);
    }
}
