//! Generated code and its formatting

use glint_core::{DataType, Result, ShaderError};
use glint_lang::ShaderHint;
use serde::Serialize;

/// GLSL sections and metadata produced by one compile
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedCode {
    pub vertex_global: String,
    pub vertex: String,
    pub fragment_global: String,
    pub fragment: String,
    pub light: String,
    /// `#define` lines in discovery order, without duplicates
    pub defines: Vec<String>,
    /// Non-sampler uniform declarations in buffer order
    pub uniforms: String,
    pub texture_uniforms: Vec<String>,
    pub texture_hints: Vec<ShaderHint>,
    pub texture_types: Vec<DataType>,
    pub uniform_offsets: Vec<u32>,
    pub uniform_total_size: u32,
    pub uses_vertex_time: bool,
    pub uses_fragment_time: bool,
}

impl GeneratedCode {
    pub fn is_empty(&self) -> bool {
        *self == GeneratedCode::default()
    }
}

/// Format generated code as JSON
pub fn format_json(code: &GeneratedCode) -> Result<String> {
    serde_json::to_string_pretty(code).map_err(|e| ShaderError::Serialize(e.to_string()))
}

/// Format generated code as TOML
pub fn format_toml(code: &GeneratedCode) -> Result<String> {
    Ok(toml::to_string_pretty(code)?)
}

/// Human readable dump, one section per heading
pub fn format_text(code: &GeneratedCode) -> String {
    let mut out = String::new();

    let sections = [
        ("defines", code.defines.concat()),
        ("uniforms", code.uniforms.clone()),
        ("vertex_global", code.vertex_global.clone()),
        ("vertex", code.vertex.clone()),
        ("fragment_global", code.fragment_global.clone()),
        ("fragment", code.fragment.clone()),
        ("light", code.light.clone()),
    ];
    for (name, text) in sections {
        if text.is_empty() {
            continue;
        }
        out.push_str(&format!("// ---- {} ----\n", name));
        out.push_str(&text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }

    if !code.texture_uniforms.is_empty() {
        out.push_str("// ---- textures ----\n");
        for ((name, hint), ty) in code
            .texture_uniforms
            .iter()
            .zip(&code.texture_hints)
            .zip(&code.texture_types)
        {
            out.push_str(&format!("// {} {} ({})\n", ty, name, hint));
        }
    }

    out.push_str(&format!(
        "// uniform offsets: {:?}, total size: {}\n",
        code.uniform_offsets, code.uniform_total_size
    ));
    out.push_str(&format!(
        "// uses time: vertex={}, fragment={}\n",
        code.uses_vertex_time, code.uses_fragment_time
    ));
    out
}
