//! Glint Compiler - shading language to GLSL ES 3.0
//!
//! Turns a parsed shader into the code sections and metadata the
//! renderer splices into its GLSL templates:
//! - `ShaderCompiler` drives parsing and emission
//! - `ActionsAdapter` reports render modes, built-in usage and uniforms
//! - `GeneratedCode` holds the result, with JSON/TOML/text formatting
//! - `CompilerConfig` carries the layered shading options

pub mod actions;
pub mod compiler;
pub mod config;
pub mod context;
pub mod defaults;
pub mod deps;
pub mod emitter;
pub mod output;

pub use actions::{ActionsAdapter, IdentifierActions, NoActions};
pub use compiler::ShaderCompiler;
pub use config::CompilerConfig;
pub use context::EmissionContext;
pub use defaults::DefaultIdentifierActions;
pub use emitter::NodeEmitter;
pub use output::{format_json, format_text, format_toml, GeneratedCode};
