//! Construction-time configuration for a [`crate::screen::Screen`]
//! (§6). Built with a `ScreenConfigBuilder`, the way the teacher's
//! heavier state-construction call sites thread a handful of optional
//! knobs through a builder rather than a constructor with a long
//! positional argument list.

use crate::color::RgbColor;
use crate::damage::DamageMergePolicy;
use crate::error::ScreenError;

/// Construction-time knobs for a [`crate::screen::Screen`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenConfig {
    pub rows: usize,
    pub cols: usize,
    pub damage_merge: DamageMergePolicy,
    /// Whether reflow runs on resize at all; `false` gives the
    /// "just truncate/pad" fallback behavior spec.md §4.4 allows for
    /// hosts that don't want paragraph-aware rewrapping.
    pub reflow: bool,
    /// ConPTY-compatibility mode: disables the "pull rows back from
    /// scrollback to refill a grown grid" half of resize, matching
    /// spec.md §9's note that some embedders (Windows ConPTY) require
    /// this.
    pub with_conpty: bool,
    pub default_fg: RgbColor,
    pub default_bg: RgbColor,
}

impl ScreenConfig {
    pub fn builder(rows: usize, cols: usize) -> ScreenConfigBuilder {
        ScreenConfigBuilder::new(rows, cols)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScreenConfigBuilder {
    rows: usize,
    cols: usize,
    damage_merge: DamageMergePolicy,
    reflow: bool,
    with_conpty: bool,
    default_fg: RgbColor,
    default_bg: RgbColor,
}

impl ScreenConfigBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        ScreenConfigBuilder {
            rows,
            cols,
            damage_merge: DamageMergePolicy::Row,
            reflow: true,
            with_conpty: false,
            default_fg: RgbColor::new(0xe5, 0xe5, 0xe5),
            default_bg: RgbColor::new(0x00, 0x00, 0x00),
        }
    }

    pub fn damage_merge(mut self, policy: DamageMergePolicy) -> Self {
        self.damage_merge = policy;
        self
    }

    pub fn reflow(mut self, enabled: bool) -> Self {
        self.reflow = enabled;
        self
    }

    pub fn with_conpty(mut self, enabled: bool) -> Self {
        self.with_conpty = enabled;
        self
    }

    pub fn default_fg(mut self, color: RgbColor) -> Self {
        self.default_fg = color;
        self
    }

    pub fn default_bg(mut self, color: RgbColor) -> Self {
        self.default_bg = color;
        self
    }

    pub fn build(self) -> Result<ScreenConfig, ScreenError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ScreenError::InvalidDimensions { rows: self.rows, cols: self.cols });
        }
        Ok(ScreenConfig {
            rows: self.rows,
            cols: self.cols,
            damage_merge: self.damage_merge,
            reflow: self.reflow,
            with_conpty: self.with_conpty,
            default_fg: self.default_fg,
            default_bg: self.default_bg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_are_rejected() {
        let err = ScreenConfig::builder(0, 80).build().unwrap_err();
        assert_eq!(err, ScreenError::InvalidDimensions { rows: 0, cols: 80 });
    }

    #[test]
    fn builder_defaults_are_sane() {
        let cfg = ScreenConfig::builder(24, 80).build().unwrap();
        assert_eq!(cfg.rows, 24);
        assert_eq!(cfg.cols, 80);
        assert!(cfg.reflow);
        assert!(!cfg.with_conpty);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = ScreenConfig::builder(24, 80)
            .damage_merge(DamageMergePolicy::Scroll)
            .reflow(false)
            .build()
            .unwrap();
        assert_eq!(cfg.damage_merge, DamageMergePolicy::Scroll);
        assert!(!cfg.reflow);
    }
}
