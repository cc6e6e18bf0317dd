//! CLI command implementations

pub mod check;
pub mod compile;
pub mod modes;

use anyhow::{Context, Result};
use glint_core::ShaderMode;
use glint_lang::ShaderLanguageParser;

/// Read a shader file
pub fn read_shader(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read shader: {}", path))
}

/// Use the explicit mode if given, otherwise the file's `shader_type`
pub fn resolve_mode(explicit: Option<&str>, code: &str) -> Result<ShaderMode> {
    let name = match explicit {
        Some(name) => name.to_string(),
        None => ShaderLanguageParser::shader_type(code).context(
            "Missing shader_type declaration; pass --mode canvas_item|spatial|particles",
        )?,
    };
    name.parse::<ShaderMode>().map_err(anyhow::Error::msg)
}
