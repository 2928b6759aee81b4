//! The resize-with-reflow engine (§4.4, C8): rewrapping paragraphs of
//! text across a width change instead of the "just truncate or pad
//! every row" shortcut. Ported from `original_source/src/screen.c`'s
//! `reflow_line`, `reflow_sb_line`, `combine_contination_lines`, and
//! `resize_buffer` - together the largest single piece of that file.
//!
//! The C function works in two passes over the same code path: a
//! "dry run" (`out_buffer == NULL`) that only measures how many rows a
//! paragraph will need at the new width, and a real pass that writes
//! the cells. This port keeps that shape as [`measure_paragraph_rows`]
//! (dry run) and [`wrap_paragraph`] (real), called from
//! [`resize_buffer`] in the same order the C function calls them:
//! measure everything first so placement can be decided, then wrap for
//! real once placement is known.

use log::{debug, trace, warn};

use crate::cell::{Cell, CellContent, ScreenCell};
use crate::config::ScreenConfig;
use crate::grid::Grid;
use crate::host::ScreenHost;
use crate::lineinfo::LineInfo;
use crate::screen::CursorPosition;

/// One logical line of text: a continuation run of grid rows flattened
/// into a single cell sequence with its `WideContinuation` placeholders
/// dropped (width is recomputed from each surviving cell, so the
/// placeholders carry no information reflow needs).
#[derive(Debug, Clone)]
struct Paragraph {
    cells: Vec<Cell>,
    line_info: LineInfo,
}

/// Where the cursor lands inside the flattened paragraph list, tracked
/// through reflow the way `screen.c:resize_buffer` tracks
/// `old_screen->state->pos` by paragraph/cell offset rather than by
/// row/col, since rows get renumbered as paragraphs are wrapped.
#[derive(Debug, Clone, Copy)]
struct CursorMark {
    paragraph: usize,
    cell: usize,
}

/// Flatten `grid`'s rows into paragraphs (continuation runs), tracking
/// where `cursor` falls in the result.
fn enumerate_paragraphs(grid: &Grid, cursor: CursorPosition) -> (Vec<Paragraph>, Option<CursorMark>) {
    let mut paragraphs = Vec::new();
    let mut mark = None;
    let mut row = 0;
    while row < grid.rows() {
        let start_row = row;
        let mut cells = Vec::new();
        loop {
            for (col, cell) in grid.row(row).iter().enumerate() {
                if cell.content.is_wide_continuation() {
                    continue;
                }
                if row == cursor.row && col == cursor.col {
                    mark = Some(CursorMark { paragraph: paragraphs.len(), cell: cells.len() });
                }
                cells.push(cell.clone());
            }
            row += 1;
            if row >= grid.rows() || !grid.line_info(row).continuation {
                break;
            }
        }

        // Unwritten trailing columns carry no content worth wrapping
        // around; trim them so a blank (or mostly blank) row collapses
        // to a single output row instead of mechanically wrapping empty
        // cells. Never trim past the cursor if it sits in the trimmed
        // range - `get_cell`/`get_chars` still need it to land somewhere.
        let mut trim_to = cells.len();
        while trim_to > 0 && cells[trim_to - 1].content.is_empty() {
            trim_to -= 1;
        }
        if let Some(m) = mark {
            if m.paragraph == paragraphs.len() && m.cell >= trim_to {
                trim_to = m.cell + 1;
            }
        }
        cells.truncate(trim_to);

        paragraphs.push(Paragraph { cells, line_info: *grid.line_info(start_row) });
    }
    (paragraphs, mark)
}

/// Number of display columns a run of cells occupies.
fn cells_width(cells: &[Cell]) -> usize {
    cells.iter().map(Cell::width).sum()
}

/// How many rows of `new_cols` width this paragraph needs. Dry-run
/// counterpart of [`wrap_paragraph`] - `screen.c:reflow_line` called
/// with `out_buffer == NULL`.
fn measure_paragraph_rows(para: &Paragraph, new_cols: usize) -> usize {
    if para.line_info.blocks_reflow() {
        return 1;
    }
    if para.cells.is_empty() {
        return 1;
    }
    let mut rows = 1;
    let mut col = 0;
    for cell in &para.cells {
        let w = cell.width().max(1);
        if col + w > new_cols {
            rows += 1;
            col = 0;
        }
        col += w;
    }
    rows
}

/// Wrap `para` into rows of exactly `new_cols` cells, inserting
/// `WideContinuation` placeholders after any cell whose width is 2,
/// matching `screen.c:reflow_line`'s real (non-dry-run) pass. Returns
/// one `Vec<Cell>` per produced row plus, if `cursor_cell` falls in
/// this paragraph, the `(row, col)` it lands at within the returned
/// rows.
fn wrap_paragraph(
    para: &Paragraph,
    new_cols: usize,
    cursor_cell: Option<usize>,
) -> (Vec<Vec<Cell>>, Option<(usize, usize)>) {
    if para.line_info.blocks_reflow() {
        let mut row = para.cells.clone();
        row.resize(new_cols, Cell::blank());
        row.truncate(new_cols);
        let cursor_pos = cursor_cell.map(|c| (0, c.min(new_cols.saturating_sub(1))));
        return (vec![row], cursor_pos);
    }

    let mut rows: Vec<Vec<Cell>> = vec![Vec::with_capacity(new_cols)];
    let mut col = 0;
    let mut cursor_pos = None;

    for (idx, cell) in para.cells.iter().enumerate() {
        let w = cell.width().max(1);
        if col + w > new_cols {
            rows.last_mut().unwrap().resize(new_cols, Cell::blank());
            rows.push(Vec::with_capacity(new_cols));
            col = 0;
        }
        if cursor_cell == Some(idx) {
            cursor_pos = Some((rows.len() - 1, col));
        }
        rows.last_mut().unwrap().push(cell.clone());
        col += 1;
        if w == 2 {
            rows.last_mut().unwrap().push(Cell { content: CellContent::WideContinuation, pen: cell.pen });
            col += 1;
        }
    }
    if para.cells.is_empty() && cursor_cell == Some(0) {
        cursor_pos = Some((0, 0));
    }
    rows.last_mut().unwrap().resize(new_cols, Cell::blank());

    (rows, cursor_pos)
}

/// Resize `grid` in place to `(new_rows, new_cols)`, reflowing its
/// content through paragraph rewrap, spilling overflow to scrollback
/// and refilling from scrollback as space allows. Returns the migrated
/// cursor position. Ported from `screen.c:resize_buffer`.
///
/// `is_primary` gates the scrollback bridge exactly as `premove` does
/// elsewhere: only the primary screen's overflow is pushed to, or
/// refilled from, scrollback.
pub fn resize_buffer(
    grid: &mut Grid,
    new_rows: usize,
    new_cols: usize,
    cursor: CursorPosition,
    config: &ScreenConfig,
    is_primary: bool,
    host: &mut impl ScreenHost,
) -> CursorPosition {
    debug!(
        "resize_buffer {}x{} -> {}x{} (primary={is_primary}, reflow={})",
        grid.rows(),
        grid.cols(),
        new_rows,
        new_cols,
        config.reflow
    );

    if !config.reflow || grid.cols() == new_cols {
        return resize_no_reflow(grid, new_rows, new_cols, cursor, is_primary, host);
    }

    let (paragraphs, cursor_mark) = enumerate_paragraphs(grid, cursor);

    // Wrap every paragraph and remember how many new-grid rows each
    // contributes, oldest paragraph first (matches row order: row 0 is
    // oldest on the primary screen's top-down layout).
    let mut wrapped: Vec<(Vec<Vec<Cell>>, Option<(usize, usize)>)> = Vec::with_capacity(paragraphs.len());
    for (idx, para) in paragraphs.iter().enumerate() {
        let cursor_cell = cursor_mark.filter(|m| m.paragraph == idx).map(|m| m.cell);
        wrapped.push(wrap_paragraph(para, new_cols, cursor_cell));
    }

    let total_rows: usize = wrapped.iter().map(|(rows, _)| rows.len()).sum();
    trace!("reflow produced {total_rows} rows for {new_rows} available");

    let mut new_grid = Grid::new(new_rows, new_cols);
    let mut new_cursor = CursorPosition::default();

    if total_rows <= new_rows {
        // Content fits (or the grid grew): place it flush to the
        // bottom and, if primary, try to refill the newly-available
        // top rows from scrollback before giving up and leaving them
        // blank.
        let mut fill_rows: Vec<Vec<Cell>> = Vec::with_capacity(new_rows);
        if is_primary {
            let mut wanted = new_rows - total_rows;
            while wanted > 0 {
                let Some((para, physical_rows)) = pop_merged_scrollback_paragraph(host) else { break };
                let rows_needed = measure_paragraph_rows(&para, new_cols);
                if rows_needed > wanted {
                    // Open question (screen.c:resize_buffer, popped-line
                    // refill path): a popped paragraph that doesn't fit in
                    // the remaining space is pushed back whole and
                    // refilling stops, rather than partially placing it.
                    warn!("popped scrollback paragraph needs {rows_needed} rows, only {wanted} available; pushing back");
                    restore_popped_rows(host, &physical_rows);
                    break;
                }
                let (rows, _) = wrap_paragraph(&para, new_cols, None);
                wanted -= rows.len();
                let mut prepend = rows;
                prepend.extend(fill_rows);
                fill_rows = prepend;
            }
        }

        let blank_rows = new_rows - total_rows - fill_rows.len();
        place_rows(&mut new_grid, blank_rows, &fill_rows);

        let mut offset = blank_rows + fill_rows.len();
        for (para_idx, (rows, cursor_hit)) in wrapped.into_iter().enumerate() {
            let n = rows.len();
            place_rows(&mut new_grid, offset, &rows);
            mark_continuations(&mut new_grid, offset, &paragraphs[para_idx].line_info, n);
            if let Some((r, c)) = cursor_hit {
                new_cursor = CursorPosition::new(offset + r, c);
            }
            offset += n;
        }
    } else {
        // More rows needed than available: spill the oldest paragraphs
        // to scrollback until the rest fit.
        let mut skip = 0usize;
        let mut remaining = total_rows;
        while remaining > new_rows && skip < wrapped.len() {
            let (rows, _) = &wrapped[skip];
            remaining -= rows.len();
            if is_primary {
                // Only the first emitted row of a wrapped paragraph carries
                // the paragraph's own continuation status; every later
                // soft-wrap row is itself a continuation, matching
                // `screen.c:1057`'s per-row `lineinfo[row].continuation`.
                let base_continuation = paragraphs[skip].line_info.continuation;
                for (i, row) in rows.iter().enumerate() {
                    let cells: Vec<ScreenCell> = row.iter().map(ScreenCell::from).collect();
                    let continuation = i > 0 || base_continuation;
                    host.sb_pushline(new_cols, &cells, continuation);
                }
            }
            skip += 1;
        }
        let mut offset = 0usize;
        for (para_idx, (rows, cursor_hit)) in wrapped.into_iter().enumerate().skip(skip) {
            if offset >= new_rows {
                break;
            }
            let n = rows.len().min(new_rows - offset);
            place_rows(&mut new_grid, offset, &rows[..n]);
            mark_continuations(&mut new_grid, offset, &paragraphs[para_idx].line_info, n);
            if let Some((r, c)) = cursor_hit {
                if r < n {
                    new_cursor = CursorPosition::new(offset + r, c);
                }
            }
            offset += n;
        }
        if cursor_mark.map(|m| m.paragraph < skip).unwrap_or(false) {
            // The cursor's paragraph was spilled entirely; clamp to top-left,
            // matching the conservative clamp `screen.c:resize_buffer` applies
            // when the cursor's original row no longer exists.
            new_cursor = CursorPosition::new(0, 0);
        }
    }

    *grid = new_grid;
    new_cursor
}

/// Pop one logical scrollback line, merging it back together if it was
/// originally wrapped across several physical rows before being spilled.
/// A wrapped paragraph's rows are pushed top-to-bottom (the paragraph's
/// first row pushed first, its last soft-wrap row pushed last), so they
/// pop in the reverse, bottom-to-top order; this keeps popping while the
/// just-popped row is itself a continuation, then reassembles the
/// original top-to-bottom cell order, matching
/// `screen.c:combine_contination_lines`'s merge-into-target-row pass
/// that runs before `reflow_sb_line` rewraps a popped line.
///
/// Returns the merged `Paragraph` plus the raw physical rows (in
/// original top-to-bottom order) so the caller can losslessly push them
/// back if the merged paragraph turns out not to fit. `None` if
/// scrollback was empty, or a continuation chain runs out before
/// reaching its non-continuation row (the rows popped so far are
/// restored before returning).
fn pop_merged_scrollback_paragraph(
    host: &mut impl ScreenHost,
) -> Option<(Paragraph, Vec<(Vec<ScreenCell>, bool)>)> {
    let mut popped: Vec<(Vec<ScreenCell>, bool)> = Vec::new();
    loop {
        let Some((cols, continuation)) = host.sb_peek() else {
            if popped.is_empty() {
                return None;
            }
            popped.reverse();
            restore_popped_rows(host, &popped);
            return None;
        };
        let mut buf = vec![ScreenCell::default(); cols];
        if !host.sb_popline(cols, &mut buf) {
            popped.reverse();
            restore_popped_rows(host, &popped);
            return None;
        }
        popped.push((buf, continuation));
        if !continuation {
            break;
        }
    }

    // `popped` is bottom-to-top (pop order); reverse for the original
    // top-to-bottom physical layout.
    popped.reverse();
    let paragraph_continuation = popped.first().map(|(_, c)| *c).unwrap_or(false);

    let mut cells = Vec::new();
    for (buf, _) in &popped {
        for sc in buf {
            if sc.width == 0 && sc.chars.is_empty() {
                // a wide glyph's continuation column, dropped the same
                // way `enumerate_paragraphs` drops `WideContinuation`.
                continue;
            }
            cells.push(Cell {
                content: if sc.chars.is_empty() { CellContent::Empty } else { CellContent::Chars(sc.chars.clone()) },
                pen: sc.pen,
            });
        }
    }
    let mut trim_to = cells.len();
    while trim_to > 0 && cells[trim_to - 1].content.is_empty() {
        trim_to -= 1;
    }
    cells.truncate(trim_to);

    let line_info = LineInfo { continuation: paragraph_continuation, ..LineInfo::default() };
    Some((Paragraph { cells, line_info }, popped))
}

/// Undo a [`pop_merged_scrollback_paragraph`] pop, restoring scrollback
/// to the state it was in before: `physical_rows` must be in
/// top-to-bottom order, so pushing it back in that same order puts the
/// bottom-most row on top of the stack again, exactly where it was.
fn restore_popped_rows(host: &mut impl ScreenHost, physical_rows: &[(Vec<ScreenCell>, bool)]) {
    for (buf, continuation) in physical_rows {
        host.sb_pushline(buf.len(), buf, *continuation);
    }
}

fn place_rows(grid: &mut Grid, start_row: usize, rows: &[Vec<Cell>]) {
    for (i, row) in rows.iter().enumerate() {
        grid.row_mut(start_row + i).clone_from_slice(row);
    }
}

fn mark_continuations(grid: &mut Grid, start_row: usize, base: &LineInfo, n: usize) {
    for i in 0..n {
        let mut info = *base;
        info.continuation = i > 0 || base.continuation;
        *grid.line_info_mut(start_row + i) = info;
    }
}

/// The `config.reflow == false` (or same-width) fallback: rows are
/// copied 1:1, truncated or blank-padded to the new column count, with
/// no wrapping at all.
fn resize_no_reflow(
    grid: &mut Grid,
    new_rows: usize,
    new_cols: usize,
    cursor: CursorPosition,
    is_primary: bool,
    host: &mut impl ScreenHost,
) -> CursorPosition {
    let old_rows = grid.rows();
    let mut new_grid = Grid::new(new_rows, new_cols);

    let copy_from = old_rows.saturating_sub(new_rows);
    if is_primary {
        for row in 0..copy_from {
            let cells: Vec<ScreenCell> = grid.row(row).iter().map(ScreenCell::from).collect();
            host.sb_pushline(grid.cols(), &cells, grid.line_info(row).continuation);
        }
    }

    for (dest, src) in (0..new_rows.min(old_rows - copy_from)).enumerate() {
        let src_row = copy_from + src;
        let width = new_cols.min(grid.cols());
        new_grid.row_mut(dest)[..width].clone_from_slice(&grid.row(src_row)[..width]);
        *new_grid.line_info_mut(dest) = *grid.line_info(src_row);
    }

    *grid = new_grid;
    let new_row = cursor.row.saturating_sub(copy_from);
    CursorPosition::new(new_row.min(new_rows.saturating_sub(1)), cursor.col.min(new_cols.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    fn write_row(grid: &mut Grid, row: usize, text: &str) {
        for (col, ch) in text.chars().enumerate() {
            grid.set(row, col, Cell { content: CellContent::Chars(smallvec::smallvec![ch]), pen: Default::default() });
        }
    }

    #[test]
    fn narrowing_wraps_a_long_row_into_two() {
        let mut grid = Grid::new(4, 10);
        write_row(&mut grid, 3, "abcdefghij");
        let cfg = ScreenConfig::builder(4, 10).build().unwrap();
        let mut host = NullHost;
        let cursor = resize_buffer(&mut grid, 4, 5, CursorPosition::new(3, 0), &cfg, true, &mut host);
        assert_eq!(grid.cols(), 5);
        let last_two: String = (grid.rows() - 2..grid.rows())
            .flat_map(|r| grid.row(r).iter().filter_map(|c| c.content.chars().first().copied()))
            .collect();
        assert_eq!(last_two, "abcdefghij");
        assert_eq!(cursor.row, grid.rows() - 2);
    }

    #[test]
    fn widening_merges_continuation_rows() {
        let mut grid = Grid::new(4, 5);
        write_row(&mut grid, 2, "abcde");
        write_row(&mut grid, 3, "fghij");
        grid.line_info_mut(3).continuation = true;
        let cfg = ScreenConfig::builder(4, 5).build().unwrap();
        let mut host = NullHost;
        resize_buffer(&mut grid, 4, 10, CursorPosition::new(3, 4), &cfg, true, &mut host);
        let merged: String = grid
            .row(grid.rows() - 1)
            .iter()
            .filter_map(|c| c.content.chars().first().copied())
            .collect();
        assert_eq!(merged, "abcdefghij");
    }

    #[test]
    fn reflow_disabled_truncates_instead_of_wrapping() {
        let mut grid = Grid::new(4, 10);
        write_row(&mut grid, 3, "abcdefghij");
        let cfg = ScreenConfig::builder(4, 10).reflow(false).build().unwrap();
        let mut host = NullHost;
        resize_buffer(&mut grid, 4, 5, CursorPosition::new(3, 0), &cfg, true, &mut host);
        let text: String =
            grid.row(3).iter().filter_map(|c| c.content.chars().first().copied()).collect();
        assert_eq!(text, "abcde");
    }

    #[test]
    fn shrinking_past_capacity_spills_to_scrollback() {
        struct CountHost(usize);
        impl ScreenHost for CountHost {
            fn damage(&mut self, _rect: crate::rect::Rect) {}
            fn sb_pushline(&mut self, _cols: usize, _cells: &[ScreenCell], _continuation: bool) {
                self.0 += 1;
            }
        }
        let mut grid = Grid::new(5, 10);
        for row in 0..5 {
            write_row(&mut grid, row, "xxxxxxxxxx");
        }
        let cfg = ScreenConfig::builder(5, 10).build().unwrap();
        let mut host = CountHost(0);
        resize_buffer(&mut grid, 2, 10, CursorPosition::new(4, 0), &cfg, true, &mut host);
        assert!(host.0 > 0);
    }

    #[test]
    fn measure_matches_wrap_row_count() {
        let para = Paragraph {
            cells: (0..23).map(|_| Cell { content: CellContent::Chars(smallvec::smallvec!['x']), pen: Default::default() }).collect(),
            line_info: LineInfo::default(),
        };
        let measured = measure_paragraph_rows(&para, 10);
        let (rows, _) = wrap_paragraph(&para, 10, None);
        assert_eq!(measured, rows.len());
    }
}
