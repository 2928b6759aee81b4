//! A terminal screen model: a cell grid, an alternate grid, damage
//! accumulation, and resize-with-reflow.
//!
//! This crate owns none of the surrounding terminal machinery -
//! escape-sequence parsing, pseudo-terminal plumbing, font rendering,
//! and keyboard input all live elsewhere. A driver (typically an
//! escape-sequence state machine) calls the [`screen::Screen`] methods
//! as it processes terminal output; `Screen` calls back into a
//! [`host::ScreenHost`] implementation to report damage, scrollback
//! traffic, and cursor movement.

pub mod cell;
pub mod color;
pub mod config;
pub mod damage;
pub mod error;
pub mod grid;
pub mod host;
pub mod lineinfo;
pub mod pen;
pub mod rect;
pub mod reflow;
pub mod screen;

pub use cell::{Cell, CellContent, ScreenCell};
pub use color::{ColorAttribute, RgbColor};
pub use config::{ScreenConfig, ScreenConfigBuilder};
pub use damage::{DamageMergePolicy, PendingScroll};
pub use error::ScreenError;
pub use grid::Grid;
pub use host::{ColorSlot, NullHost, ScreenHost, TermProp};
pub use lineinfo::LineInfo;
pub use pen::{AttrMask, DoubleHeight, Pen, Underline};
pub use rect::Rect;
pub use screen::{BufferId, CursorPosition, Screen};

#[cfg(test)]
mod test;
