//! The cell grid: a flat, row-major buffer plus per-row [`LineInfo`].
//!
//! The teacher stores a screen as `Vec<Line>` where `Line` owns its own
//! `Vec<Cell>`. libvterm instead allocates one flat `ScreenCell*` and
//! indexes it `row * cols + col`
//! (`original_source/src/screen.c:alloc_buffer`). The reflow engine
//! (`reflow.rs`) walks cells across row boundaries constantly, so this
//! crate follows libvterm's flat layout - row-major indexing arithmetic
//! throughout the reflow port stays a direct transliteration instead of
//! needing a `Vec<Vec<Cell>>` double index at every step.

use crate::cell::Cell;
use crate::lineinfo::LineInfo;
use crate::pen::Pen;
use crate::rect::Rect;

/// A rectangular buffer of cells: either the primary screen or the
/// alternate screen (§3 "Grid").
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    lines: Vec<LineInfo>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid {
            rows,
            cols,
            cells: vec![Cell::blank(); rows * cols],
            lines: vec![LineInfo::default(); rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    pub fn get(&self, row: usize, col: usize) -> &Cell {
        &self.cells[self.index(row, col)]
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        let idx = self.index(row, col);
        &mut self.cells[idx]
    }

    pub fn line_info(&self, row: usize) -> &LineInfo {
        &self.lines[row]
    }

    pub fn line_info_mut(&mut self, row: usize) -> &mut LineInfo {
        &mut self.lines[row]
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [Cell] {
        let start = row * self.cols;
        &mut self.cells[start..start + self.cols]
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        let idx = self.index(row, col);
        self.cells[idx] = cell;
    }

    /// Reset every cell to blank with the given pen, and every row's
    /// `LineInfo` to default. Grounded in `screen.c:damagescreen`'s
    /// sibling `erase` path.
    pub fn clear(&mut self, pen: Pen) {
        for cell in &mut self.cells {
            *cell = Cell::with_pen(pen);
        }
        for line in &mut self.lines {
            *line = LineInfo::default();
        }
    }

    pub fn clear_rect(&mut self, rect: Rect, pen: Pen) {
        for row in rect.start_row..rect.end_row {
            for col in rect.start_col..rect.end_col {
                self.set(row, col, Cell::with_pen(pen));
            }
        }
    }

    /// Move the contents of `src` to `dest`, both same-sized rects,
    /// leaving `src`'s vacated cells untouched (the caller erases them
    /// separately, matching libvterm's `moverect_internal` which
    /// performs the move then a separate erase of the exposed region).
    ///
    /// `src` and `dest` may overlap (this is exactly what a scroll is:
    /// move rows 1..N to rows 0..N-1). C reaches for `memmove`, which
    /// picks a copy direction based on pointer order to stay correct
    /// under overlap. Cells here are not `Copy` in general layout terms
    /// (they own a `SmallVec`), so instead of unsafe overlapping
    /// pointer arithmetic this copies through an owned temporary
    /// buffer - still one pass, no direction juggling, and safe.
    pub fn move_rect(&mut self, dest: Rect, src: Rect) {
        debug_assert_eq!(dest.rows(), src.rows());
        debug_assert_eq!(dest.cols(), src.cols());
        let width = src.cols();
        let mut buf: Vec<Cell> = Vec::with_capacity(src.rows() * width);
        for row in src.start_row..src.end_row {
            buf.extend_from_slice(&self.row(row)[src.start_col..src.end_col]);
        }
        for (i, row) in (dest.start_row..dest.end_row).enumerate() {
            let slice = &buf[i * width..(i + 1) * width];
            self.row_mut(row)[dest.start_col..dest.end_col].clone_from_slice(slice);
        }
    }

    /// Scroll `rect` by `downward` rows (positive: content moves up,
    /// revealing blank rows at the bottom - i.e. "scroll up" in
    /// terminal terms shifts row N's content to row N-downward) and
    /// `rightward` columns, filling vacated cells with `pen`. Mirrors
    /// `screen.c:scrollrect`'s `moverect_internal` + erase-of-exposed
    /// pair, restricted to axis-aligned single-direction scroll as the
    /// component design assumes.
    pub fn scroll_rect(&mut self, rect: Rect, downward: isize, rightward: isize, pen: Pen) {
        if downward == 0 && rightward == 0 {
            return;
        }
        if downward.unsigned_abs() >= rect.rows() || rightward.unsigned_abs() >= rect.cols() {
            self.clear_rect(rect, pen);
            return;
        }

        // `src` is the slice of `rect` that survives the scroll; `dest`
        // is where it lands - a plain translate by (-downward, -rightward).
        let src = Rect::new(
            rect.start_row + downward.max(0) as usize,
            rect.end_row - (-downward).max(0) as usize,
            rect.start_col + rightward.max(0) as usize,
            rect.end_col - (-rightward).max(0) as usize,
        );
        let dest = Rect::new(
            (src.start_row as isize - downward) as usize,
            (src.end_row as isize - downward) as usize,
            (src.start_col as isize - rightward) as usize,
            (src.end_col as isize - rightward) as usize,
        );

        self.move_rect(dest, src);

        // Erase the region vacated by the move: whatever part of `rect`
        // is not covered by `dest`.
        for row in rect.start_row..rect.end_row {
            for col in rect.start_col..rect.end_col {
                if !dest.contains_point(row, col) {
                    self.set(row, col, Cell::with_pen(pen));
                }
            }
        }
    }
}
