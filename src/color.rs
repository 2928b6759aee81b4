//! Colors attached to a [`crate::pen::Pen`].
//!
//! `ColorAttribute::Default` is a sentinel: "use whatever the host has
//! configured as the default foreground/background", resolved at render
//! time via [`crate::config::ScreenConfig`]. Two `Default` colors compare
//! equal regardless of the concrete RGB the host eventually substitutes,
//! which is exactly the "type-aware comparison" spec.md §4.5 asks for.

/// A concrete 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// The color slot carried by a cell's pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorAttribute {
    /// Inherit the host's configured default for this slot.
    Default,
    /// One of the 256 palette indices.
    PaletteIndex(u8),
    /// A directly specified RGB color.
    Rgb(RgbColor),
}

impl Default for ColorAttribute {
    fn default() -> Self {
        ColorAttribute::Default
    }
}

impl ColorAttribute {
    /// Resolve to a concrete color, substituting `default` for the
    /// `Default` sentinel.
    pub fn resolve(&self, default: RgbColor) -> RgbColor {
        match self {
            ColorAttribute::Default => default,
            ColorAttribute::PaletteIndex(idx) => palette_lookup(*idx),
            ColorAttribute::Rgb(rgb) => *rgb,
        }
    }
}

/// The standard 16-entry ANSI palette, extended with a flat 6x6x6 color
/// cube and grayscale ramp for indices 16..256, as xterm defines it.
fn palette_lookup(idx: u8) -> RgbColor {
    const ANSI: [RgbColor; 16] = [
        RgbColor::new(0x00, 0x00, 0x00),
        RgbColor::new(0xcd, 0x00, 0x00),
        RgbColor::new(0x00, 0xcd, 0x00),
        RgbColor::new(0xcd, 0xcd, 0x00),
        RgbColor::new(0x00, 0x00, 0xee),
        RgbColor::new(0xcd, 0x00, 0xcd),
        RgbColor::new(0x00, 0xcd, 0xcd),
        RgbColor::new(0xe5, 0xe5, 0xe5),
        RgbColor::new(0x7f, 0x7f, 0x7f),
        RgbColor::new(0xff, 0x00, 0x00),
        RgbColor::new(0x00, 0xff, 0x00),
        RgbColor::new(0xff, 0xff, 0x00),
        RgbColor::new(0x5c, 0x5c, 0xff),
        RgbColor::new(0xff, 0x00, 0xff),
        RgbColor::new(0x00, 0xff, 0xff),
        RgbColor::new(0xff, 0xff, 0xff),
    ];

    if (idx as usize) < ANSI.len() {
        return ANSI[idx as usize];
    }

    if idx >= 232 {
        let level = 8 + (idx - 232) * 10;
        return RgbColor::new(level, level, level);
    }

    let cube = idx - 16;
    let r = cube / 36;
    let g = (cube % 36) / 6;
    let b = cube % 6;
    let step = |n: u8| if n == 0 { 0 } else { 55 + n * 40 };
    RgbColor::new(step(r), step(g), step(b))
}
