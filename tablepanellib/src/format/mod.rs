//! Cell value formatting: display text plus threshold colors.
//!
//! - **cell**: per-column formatters chosen from the resolved style
//! - **units**: unit-aware number rendering (`short`, `bytes`, `ms`, ...)
//! - **date**: moment-style date patterns over `chrono`
//! - **color**: threshold walks and the named color palette

pub mod cell;
pub mod color;
pub mod date;
pub mod units;

pub use cell::{
    default_format, html_escape, threshold_color, CellColor, CellFormatter, EscapeSanitizer,
    FormatContext, Formatted, Sanitizer, EMPTY_VALUE,
};
pub use color::{color_for_value, resolve_color};
pub use date::{format_date, format_moment, INVALID_DATE};
pub use units::{to_fixed, ValueFormat};
