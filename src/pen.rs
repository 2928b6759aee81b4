//! The current drawing attributes (§3 "Pen").
//!
//! Packed into a single integer with typed getter/setter pairs, the way
//! the teacher's `CellAttributes` packs `bold`/`underline`/... into a
//! `u16`. We widen to `u32` because this pen additionally carries the
//! out-of-band `protected`/`dwl`/`dhl` fields spec.md §3 asks for.

use crate::color::ColorAttribute;

/// Define a getter/setter pair for a bitfield slot.
///
/// Mirrors the teacher's `bitfield!` macro (`term/src/lib.rs`), extended
/// with a third arm for small integer ranges backed by a plain `u8`
/// (underline level, font slot, baseline) rather than a transmuted enum,
/// since those values come from the state layer as already-validated
/// small integers.
macro_rules! bitfield {
    ($getter:ident, $setter:ident, $bitnum:expr) => {
        #[inline]
        pub fn $getter(&self) -> bool {
            (self.attributes & (1 << $bitnum)) != 0
        }

        #[inline]
        pub fn $setter(&mut self, value: bool) {
            if value {
                self.attributes |= 1 << $bitnum;
            } else {
                self.attributes &= !(1 << $bitnum);
            }
        }
    };

    ($getter:ident, $setter:ident, $bitmask:expr, $bitshift:expr) => {
        #[inline]
        pub fn $getter(&self) -> u8 {
            ((self.attributes >> $bitshift) & $bitmask) as u8
        }

        #[inline]
        pub fn $setter(&mut self, value: u8) {
            let clear = !($bitmask << $bitshift);
            let value = (value as u32 & $bitmask) << $bitshift;
            self.attributes = (self.attributes & clear) | value;
        }
    };
}

/// Underline style, spec.md §3: 0..3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Underline {
    None = 0,
    Single = 1,
    Double = 2,
    Curly = 3,
}

impl Underline {
    fn from_u8(v: u8) -> Self {
        match v & 0b11 {
            0 => Underline::None,
            1 => Underline::Single,
            2 => Underline::Double,
            _ => Underline::Curly,
        }
    }
}

/// Double-height role of the line this cell lives on, spec.md §3: 0..2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DoubleHeight {
    None = 0,
    Top = 1,
    Bottom = 2,
}

impl DoubleHeight {
    fn from_u8(v: u8) -> Self {
        match v & 0b11 {
            0 => DoubleHeight::None,
            1 => DoubleHeight::Top,
            _ => DoubleHeight::Bottom,
        }
    }
}

/// Drawing attributes in effect when a cell is written, plus the
/// out-of-band `protected`/`dwl`/`dhl` fields spec.md §3 bundles
/// alongside them "for convenience".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pen {
    attributes: u32,
    pub fg: ColorAttribute,
    pub bg: ColorAttribute,
}

const BOLD_BIT: u32 = 0;
const UNDERLINE_SHIFT: u32 = 1;
const UNDERLINE_MASK: u32 = 0b11;
const ITALIC_BIT: u32 = 3;
const BLINK_BIT: u32 = 4;
const REVERSE_BIT: u32 = 5;
const CONCEAL_BIT: u32 = 6;
const STRIKE_BIT: u32 = 7;
const FONT_SHIFT: u32 = 8;
const FONT_MASK: u32 = 0b1111;
const SMALL_BIT: u32 = 12;
const BASELINE_SHIFT: u32 = 13;
const BASELINE_MASK: u32 = 0b11;
const PROTECTED_BIT: u32 = 15;
const DWL_BIT: u32 = 16;
const DHL_SHIFT: u32 = 17;
const DHL_MASK: u32 = 0b11;

impl Pen {
    bitfield!(bold, set_bold, BOLD_BIT);
    bitfield!(underline_raw, set_underline_raw, UNDERLINE_MASK, UNDERLINE_SHIFT);
    bitfield!(italic, set_italic, ITALIC_BIT);
    bitfield!(blink, set_blink, BLINK_BIT);
    bitfield!(reverse, set_reverse, REVERSE_BIT);
    bitfield!(conceal, set_conceal, CONCEAL_BIT);
    bitfield!(strike, set_strike, STRIKE_BIT);
    bitfield!(font, set_font, FONT_MASK, FONT_SHIFT);
    bitfield!(small, set_small, SMALL_BIT);
    bitfield!(baseline_raw, set_baseline_raw, BASELINE_MASK, BASELINE_SHIFT);
    bitfield!(protected, set_protected, PROTECTED_BIT);
    bitfield!(dwl, set_dwl, DWL_BIT);
    bitfield!(dhl_raw, set_dhl_raw, DHL_MASK, DHL_SHIFT);

    pub fn underline(&self) -> Underline {
        Underline::from_u8(self.underline_raw())
    }

    pub fn set_underline(&mut self, value: Underline) {
        self.set_underline_raw(value as u8);
    }

    pub fn baseline(&self) -> u8 {
        self.baseline_raw()
    }

    pub fn set_baseline(&mut self, value: u8) {
        self.set_baseline_raw(value);
    }

    pub fn dhl(&self) -> DoubleHeight {
        DoubleHeight::from_u8(self.dhl_raw())
    }

    pub fn set_dhl(&mut self, value: DoubleHeight) {
        self.set_dhl_raw(value as u8);
    }

    /// A pen carrying only this pen's colors, everything else reset to
    /// default — used by `erase_internal` (spec.md §4.1 `erase`), which
    /// "resets the pen to a near-default (only fg and bg from the
    /// current pen survive)".
    pub fn colors_only(&self) -> Pen {
        Pen { attributes: 0, fg: self.fg, bg: self.bg }
    }
}

impl Default for Pen {
    fn default() -> Self {
        Pen { attributes: 0, fg: ColorAttribute::default(), bg: ColorAttribute::default() }
    }
}

bitflags::bitflags! {
    /// Mask selecting which pen fields `Screen::get_attrs_extent`
    /// (spec.md §4.5) should compare. Named and shaped after libvterm's
    /// `VTermAttrMask` (`original_source/src/screen.c` `attrs_differ`).
    pub struct AttrMask: u16 {
        const BOLD       = 0b0000_0000_0001;
        const UNDERLINE  = 0b0000_0000_0010;
        const ITALIC     = 0b0000_0000_0100;
        const BLINK      = 0b0000_0000_1000;
        const REVERSE    = 0b0000_0001_0000;
        const CONCEAL    = 0b0000_0010_0000;
        const STRIKE     = 0b0000_0100_0000;
        const FONT       = 0b0000_1000_0000;
        const FOREGROUND = 0b0001_0000_0000;
        const BACKGROUND = 0b0010_0000_0000;
        const SMALL      = 0b0100_0000_0000;
        const BASELINE   = 0b1000_0000_0000;
        const ALL        = 0b1111_1111_1111;
    }
}

/// True if `a` and `b` differ on any attribute selected by `mask`.
/// Grounded in `original_source/src/screen.c:attrs_differ`.
pub fn attrs_differ(mask: AttrMask, a: &Pen, b: &Pen) -> bool {
    (mask.contains(AttrMask::BOLD) && a.bold() != b.bold())
        || (mask.contains(AttrMask::UNDERLINE) && a.underline_raw() != b.underline_raw())
        || (mask.contains(AttrMask::ITALIC) && a.italic() != b.italic())
        || (mask.contains(AttrMask::BLINK) && a.blink() != b.blink())
        || (mask.contains(AttrMask::REVERSE) && a.reverse() != b.reverse())
        || (mask.contains(AttrMask::CONCEAL) && a.conceal() != b.conceal())
        || (mask.contains(AttrMask::STRIKE) && a.strike() != b.strike())
        || (mask.contains(AttrMask::FONT) && a.font() != b.font())
        || (mask.contains(AttrMask::FOREGROUND) && a.fg != b.fg)
        || (mask.contains(AttrMask::BACKGROUND) && a.bg != b.bg)
        || (mask.contains(AttrMask::SMALL) && a.small() != b.small())
        || (mask.contains(AttrMask::BASELINE) && a.baseline_raw() != b.baseline_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitfield_roundtrip() {
        let mut pen = Pen::default();
        assert!(!pen.bold());
        pen.set_bold(true);
        assert!(pen.bold());

        pen.set_underline(Underline::Double);
        assert_eq!(pen.underline(), Underline::Double);
        assert!(pen.bold(), "setting underline must not clobber bold");

        pen.set_font(7);
        assert_eq!(pen.font(), 7);
        pen.set_dhl(DoubleHeight::Bottom);
        assert_eq!(pen.dhl(), DoubleHeight::Bottom);
        assert_eq!(pen.font(), 7, "setting dhl must not clobber font");
    }

    #[test]
    fn colors_only_drops_boolean_attrs() {
        let mut pen = Pen::default();
        pen.set_bold(true);
        pen.set_italic(true);
        pen.fg = ColorAttribute::PaletteIndex(3);

        let reset = pen.colors_only();
        assert!(!reset.bold());
        assert!(!reset.italic());
        assert_eq!(reset.fg, ColorAttribute::PaletteIndex(3));
    }

    #[test]
    fn attrs_differ_respects_mask() {
        let mut a = Pen::default();
        let mut b = Pen::default();
        a.set_bold(true);
        b.set_italic(true);

        assert!(attrs_differ(AttrMask::BOLD, &a, &b));
        assert!(!attrs_differ(AttrMask::ITALIC, &a, &a));
        assert!(attrs_differ(AttrMask::ITALIC, &a, &b));
        assert!(!attrs_differ(AttrMask::BASELINE, &a, &b));
    }
}
