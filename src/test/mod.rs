//! End-to-end test harness: a [`RecordingHost`] that logs every
//! callback plus a `TestScreen` wrapper with assertion helpers, in the
//! shape of the teacher's `TestHost`/`TestTerm` (`term/src/test/mod.rs`):
//! build a screen, drive it through a scenario, assert on what the host
//! recorded and what the grid looks like afterward.

use pretty_assertions::assert_eq;

use crate::cell::ScreenCell;
use crate::config::ScreenConfig;
use crate::host::{ScreenHost, TermProp};
use crate::rect::Rect;
use crate::screen::{CursorPosition, Screen};


/// Records every callback it receives, in order, plus a simple FIFO
/// scrollback so reflow/scroll tests have something real to pop.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub damages: Vec<Rect>,
    pub moverects: Vec<(Rect, Rect)>,
    pub cursor_moves: Vec<(CursorPosition, CursorPosition, bool)>,
    pub termprops: Vec<TermProp>,
    pub bells: usize,
    pub resizes: Vec<(usize, usize)>,
    scrollback: Vec<(Vec<ScreenCell>, bool)>,
}

impl ScreenHost for RecordingHost {
    fn damage(&mut self, rect: Rect) {
        self.damages.push(rect);
    }

    fn moverect(&mut self, dest: Rect, src: Rect) -> bool {
        self.moverects.push((dest, src));
        true
    }

    fn movecursor(&mut self, new: CursorPosition, old: CursorPosition, visible: bool) {
        self.cursor_moves.push((new, old, visible));
    }

    fn settermprop(&mut self, prop: TermProp) {
        self.termprops.push(prop);
    }

    fn bell(&mut self) {
        self.bells += 1;
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        self.resizes.push((rows, cols));
    }

    fn sb_pushline(&mut self, _cols: usize, cells: &[ScreenCell], continuation: bool) {
        self.scrollback.push((cells.to_vec(), continuation));
    }

    fn sb_popline(&mut self, cols: usize, out: &mut [ScreenCell]) -> bool {
        let Some((cells, _)) = self.scrollback.pop() else { return false };
        for (slot, cell) in out.iter_mut().zip(cells.into_iter()) {
            *slot = cell;
        }
        let _ = cols;
        true
    }

    fn sb_peek(&mut self) -> Option<(usize, bool)> {
        self.scrollback.last().map(|(cells, cont)| (cells.len(), *cont))
    }

    fn sb_clear(&mut self) -> bool {
        let had = !self.scrollback.is_empty();
        self.scrollback.clear();
        had
    }
}

impl RecordingHost {
    pub fn scrollback_len(&self) -> usize {
        self.scrollback.len()
    }
}

/// A `Screen<RecordingHost>` plus assertion helpers over its grid and
/// its host's recorded callbacks.
pub struct TestScreen {
    pub screen: Screen<RecordingHost>,
}

impl TestScreen {
    pub fn new(rows: usize, cols: usize) -> Self {
        let cfg = ScreenConfig::builder(rows, cols).build().unwrap();
        TestScreen { screen: Screen::new(cfg, RecordingHost::default()) }
    }

    pub fn with_config(cfg: ScreenConfig) -> Self {
        TestScreen { screen: Screen::new(cfg, RecordingHost::default()) }
    }

    /// Write `text` starting at `(row, col)`, one cell per `char`
    /// (no wide-glyph measurement - tests that need CJK width drive
    /// `put_glyph` directly with an explicit width).
    pub fn write(&mut self, row: usize, col: usize, text: &str) {
        for (i, ch) in text.chars().enumerate() {
            self.screen.put_glyph(row, col + i, ch, 1);
        }
    }

    pub fn assert_row_text(&self, row: usize, expected: &str) {
        let actual = self.screen.get_chars(Rect::new(row, row + 1, 0, self.screen.cols()));
        let trimmed = actual.trim_end();
        assert_eq!(trimmed, expected);
    }

    pub fn assert_damaged(&self, expected: Rect) {
        assert!(
            self.screen.host.damages.contains(&expected),
            "expected damage {expected:?}, got {:?}",
            self.screen.host.damages
        );
    }

    pub fn clear_recordings(&mut self) {
        self.screen.host.damages.clear();
        self.screen.host.moverects.clear();
        self.screen.host.cursor_moves.clear();
        self.screen.host.termprops.clear();
        self.screen.host.resizes.clear();
    }
}
