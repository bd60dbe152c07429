//! Column styles: rule definitions, pattern compilation and resolution.
//!
//! Rules are compiled once when the configuration is loaded
//! ([`CompiledStyles::compile`]), so a bad pattern is reported up front and
//! the render path never fails on it.

pub mod options;
pub mod pattern;
pub mod resolver;

pub use options::{ColorMode, ColumnStyle, MappingType, RangeMap, StyleType, ValueMap};
pub use pattern::StylePattern;
pub use resolver::{
    resolve_column, resolve_columns, resolve_styles, CompiledStyle, CompiledStyles,
    ResolvedColumn,
};
