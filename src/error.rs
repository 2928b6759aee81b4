//! The one fallible boundary in this crate: constructing a screen or
//! its configuration with degenerate dimensions. Everything past
//! construction stays a `bool`-returning steady-state operation
//! (§7 "errors do not propagate beyond the sink").

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScreenError {
    #[error("grid dimensions must be nonzero, got {rows} rows x {cols} cols")]
    InvalidDimensions { rows: usize, cols: usize },
}
