//! Glint Core - Foundational types for the Glint shader cross-compiler
//!
//! This crate provides the types that all other Glint crates depend on:
//! - `DataType`, `Precision`, `Interpolation`, `ArgumentQualifier`, `ShaderMode`
//! - `Operator` and its GLSL spelling
//! - std140-style size and alignment tables
//! - Identifier mangling and constant literal formatting
//! - Error types and Result alias

mod error;
mod ident;
mod layout;
mod literal;
mod types;

pub use error::{Result, ShaderError};
pub use ident::{mangle, unmangle};
pub use layout::{align_to, round_up_16};
pub use literal::{constant_text, format_float, ConstantValue};
pub use types::{ArgumentQualifier, DataType, Interpolation, Operator, Precision, ShaderMode};
