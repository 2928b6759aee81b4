//! Damage accumulation: batches cell-level writes into coarser
//! `Rect`s before they reach the host, the way
//! `original_source/src/screen.c`'s `damagerect`/`scrollrect` do.
//!
//! The C implementation tracks pending damage with a `VTermRect` whose
//! `start_row == -1` means "nothing pending" and a shadow
//! `pending_scrollrect` field that may or may not be meaningful
//! depending on the merge policy in effect. REDESIGN FLAGS item 2 asks
//! for that collapsed into one type that cannot be in an invalid
//! combination: [`DamageState`] is `Empty`, a plain pending `Rect`, or a
//! pending `Rect` together with the scroll that is still owed against
//! it. There is no state in which a "pending scroll" exists without a
//! rect to apply it to.

use crate::rect::Rect;

/// How aggressively to batch damage before calling the host back.
/// Mirrors `VTermDamageSize` (`screen.c`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageMergePolicy {
    /// No merging: every write is reported individually.
    Cell,
    /// Merge damage within a row, flush between non-adjacent rows.
    Row,
    /// Merge all damage for the whole screen into one flush.
    Screen,
    /// Like `Screen`, but additionally defers scroll regions so a
    /// scroll-then-repaint sequence can collapse into a single
    /// `moverect` + shrunk damage rect instead of damaging the region
    /// twice.
    Scroll,
}

/// A scroll not yet reconciled against the pending damage rect: the
/// region that scrolled, and by how many rows/cols (signed: negative is
/// up/left).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingScroll {
    pub rect: Rect,
    pub downward: isize,
    pub rightward: isize,
}

/// The accumulator's internal state. See the module doc for why this
/// replaces the C source's sentinel-plus-shadow-field pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageState {
    Empty,
    Rect(Rect),
    RectWithPendingScroll(Rect, PendingScroll),
}

impl Default for DamageState {
    fn default() -> Self {
        DamageState::Empty
    }
}

/// Accumulates damage under a [`DamageMergePolicy`] and flushes it to a
/// sink closure supplied at flush time (`Screen` owns the actual host
/// callback; this type only owns the merge bookkeeping).
#[derive(Debug, Clone)]
pub struct DamageAccumulator {
    policy: DamageMergePolicy,
    state: DamageState,
}

impl DamageAccumulator {
    pub fn new(policy: DamageMergePolicy) -> Self {
        DamageAccumulator { policy, state: DamageState::Empty }
    }

    pub fn policy(&self) -> DamageMergePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DamageMergePolicy) {
        self.policy = policy;
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self.state, DamageState::Empty)
    }

    /// Record new damage. Returns `Some(rect)` if the policy demands an
    /// immediate flush (policy `Cell`, or a non-contiguous region under
    /// `Row`), otherwise the rect is merged into pending state and
    /// `None` is returned: the caller should later call [`Self::take`].
    pub fn damage(&mut self, rect: Rect, cols: usize) -> Option<Rect> {
        if rect.is_empty() {
            return None;
        }
        match self.policy {
            DamageMergePolicy::Cell => Some(rect),
            DamageMergePolicy::Row => self.merge_row(rect, cols),
            DamageMergePolicy::Screen | DamageMergePolicy::Scroll => {
                self.merge_screen(rect);
                None
            }
        }
    }

    /// `screen.c:damagerect`'s `VTERM_DAMAGE_ROW` case only ever merges
    /// two rects that share the same single `start_row`, by taking the
    /// column min/max; a rect spanning more than one row, or landing on
    /// a different row than whatever is pending, flushes the old rect
    /// and replaces it rather than widening or unioning across rows.
    fn merge_row(&mut self, rect: Rect, cols: usize) -> Option<Rect> {
        let _ = cols;
        if rect.end_row - rect.start_row > 1 {
            let flushed = self.take();
            self.state = DamageState::Rect(rect);
            return flushed;
        }
        match self.state {
            DamageState::Empty => {
                self.state = DamageState::Rect(rect);
                None
            }
            DamageState::Rect(pending) if pending.start_row == rect.start_row && pending.end_row - pending.start_row == 1 => {
                let start_col = pending.start_col.min(rect.start_col);
                let end_col = pending.end_col.max(rect.end_col);
                self.state = DamageState::Rect(Rect::new(pending.start_row, pending.end_row, start_col, end_col));
                None
            }
            DamageState::Rect(pending) => {
                self.state = DamageState::Rect(rect);
                Some(pending)
            }
            DamageState::RectWithPendingScroll(..) => {
                let flushed = self.take();
                self.state = DamageState::Rect(rect);
                flushed
            }
        }
    }

    fn merge_screen(&mut self, rect: Rect) {
        self.state = match self.state {
            DamageState::Empty => DamageState::Rect(rect),
            DamageState::Rect(pending) => DamageState::Rect(pending.union(&rect)),
            DamageState::RectWithPendingScroll(pending, scroll) => {
                DamageState::RectWithPendingScroll(pending.union(&rect), scroll)
            }
        };
    }

    /// Record a scroll under `Scroll` policy. If the scrolled region is
    /// fully contained in pending damage, the pending rect is just
    /// translated/clipped in place (`screen.c:scrollrect`'s
    /// full-containment case). Otherwise the scroll is stashed so the
    /// eventual flush knows to emit a `moverect` before the damage rect.
    pub fn scroll(&mut self, scrolled: Rect, downward: isize, rightward: isize) {
        if !matches!(self.policy, DamageMergePolicy::Scroll) {
            return;
        }
        match self.state {
            DamageState::Empty => {
                self.state = DamageState::RectWithPendingScroll(
                    scrolled,
                    PendingScroll { rect: scrolled, downward, rightward },
                );
            }
            DamageState::Rect(pending) if scrolled.contains_rect(&pending) => {
                if let Some(shifted) = pending
                    .shifted_rows(downward)
                    .clip(&scrolled)
                {
                    self.state = DamageState::Rect(shifted);
                } else {
                    self.state = DamageState::Empty;
                }
            }
            DamageState::Rect(pending) => {
                self.state = DamageState::RectWithPendingScroll(
                    pending.union(&scrolled),
                    PendingScroll { rect: scrolled, downward, rightward },
                );
            }
            DamageState::RectWithPendingScroll(pending, _) => {
                self.state = DamageState::RectWithPendingScroll(
                    pending.union(&scrolled),
                    PendingScroll { rect: scrolled, downward, rightward },
                );
            }
        }
    }

    /// Take and clear whatever is pending, if anything. The caller is
    /// responsible for issuing a `moverect` first when the returned
    /// state carries a `PendingScroll`.
    pub fn take(&mut self) -> Option<Rect> {
        match std::mem::replace(&mut self.state, DamageState::Empty) {
            DamageState::Empty => None,
            DamageState::Rect(r) => Some(r),
            DamageState::RectWithPendingScroll(r, _) => Some(r),
        }
    }

    /// Like [`Self::take`] but also returns the scroll that must be
    /// replayed (as a `moverect`) before the rect is repainted.
    pub fn take_with_scroll(&mut self) -> Option<(Rect, Option<PendingScroll>)> {
        match std::mem::replace(&mut self.state, DamageState::Empty) {
            DamageState::Empty => None,
            DamageState::Rect(r) => Some((r, None)),
            DamageState::RectWithPendingScroll(r, s) => Some((r, Some(s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_policy_never_merges() {
        let mut acc = DamageAccumulator::new(DamageMergePolicy::Cell);
        let r = Rect::new(0, 1, 0, 1);
        assert_eq!(acc.damage(r, 80), Some(r));
        assert!(!acc.is_pending());
    }

    #[test]
    fn row_policy_merges_column_ranges_on_the_same_row() {
        let mut acc = DamageAccumulator::new(DamageMergePolicy::Row);
        assert_eq!(acc.damage(Rect::new(0, 1, 0, 20), 80), None);
        assert_eq!(acc.damage(Rect::new(0, 1, 40, 80), 80), None);
        assert_eq!(acc.take(), Some(Rect::new(0, 1, 0, 80)));
    }

    #[test]
    fn row_policy_flushes_on_a_different_row() {
        let mut acc = DamageAccumulator::new(DamageMergePolicy::Row);
        assert_eq!(acc.damage(Rect::new(0, 1, 0, 80), 80), None);
        let flushed = acc.damage(Rect::new(1, 2, 0, 80), 80);
        assert_eq!(flushed, Some(Rect::new(0, 1, 0, 80)));
        assert_eq!(acc.take(), Some(Rect::new(1, 2, 0, 80)));
    }

    #[test]
    fn row_policy_flushes_a_multi_row_rect_immediately() {
        let mut acc = DamageAccumulator::new(DamageMergePolicy::Row);
        assert_eq!(acc.damage(Rect::new(0, 1, 0, 80), 80), None);
        let flushed = acc.damage(Rect::new(2, 4, 0, 80), 80);
        assert_eq!(flushed, Some(Rect::new(0, 1, 0, 80)));
        assert_eq!(acc.take(), Some(Rect::new(2, 4, 0, 80)));
    }

    #[test]
    fn screen_policy_accumulates_until_take() {
        let mut acc = DamageAccumulator::new(DamageMergePolicy::Screen);
        assert_eq!(acc.damage(Rect::new(0, 1, 0, 5), 80), None);
        assert_eq!(acc.damage(Rect::new(20, 21, 0, 5), 80), None);
        assert_eq!(acc.take(), Some(Rect::new(0, 21, 0, 5)));
    }

    #[test]
    fn scroll_policy_translates_fully_contained_pending_rect() {
        let mut acc = DamageAccumulator::new(DamageMergePolicy::Scroll);
        acc.damage(Rect::new(5, 6, 0, 80), 80);
        acc.scroll(Rect::new(0, 24, 0, 80), -1, 0);
        let (rect, scroll) = acc.take_with_scroll().unwrap();
        assert_eq!(rect, Rect::new(4, 5, 0, 80));
        assert!(scroll.is_none());
    }
}
