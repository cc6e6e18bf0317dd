//! Check command

use super::{read_shader, resolve_mode};
use anyhow::{Context, Result};
use glint_compiler::ShaderCompiler;

pub fn run(file: &str, mode: Option<&str>) -> Result<()> {
    let code = read_shader(file)?;
    let mode = resolve_mode(mode, &code)?;

    let shader = ShaderCompiler::new()
        .parse(mode, &code, file)
        .context("Shader check failed")?;

    println!(
        "OK: {} ({}, {} function(s), {} uniform(s), {} varying(s))",
        file,
        mode,
        shader.functions.len(),
        shader.uniforms.len(),
        shader.varyings.len()
    );

    Ok(())
}
