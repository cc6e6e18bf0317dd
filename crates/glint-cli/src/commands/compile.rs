//! Compile command

use super::{read_shader, resolve_mode};
use anyhow::{Context, Result};
use glint_compiler::{
    format_json, format_text, format_toml, CompilerConfig, IdentifierActions, ShaderCompiler,
};
use std::path::Path;

pub struct CompileArgs {
    pub file: String,
    pub mode: Option<String>,
    pub format: String,
    pub config: Option<String>,
}

pub fn run(args: CompileArgs) -> Result<()> {
    let code = read_shader(&args.file)?;
    let mode = resolve_mode(args.mode.as_deref(), &code)?;

    let config = match &args.config {
        Some(path) => CompilerConfig::load_from_file(Path::new(path))
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => CompilerConfig::load().context("Failed to load config")?,
    };
    log::debug!("compiling {} as {} with {:?}", args.file, mode, config);

    let compiler = ShaderCompiler::with_config(config);
    let mut actions = IdentifierActions::new();
    let generated = compiler
        .compile(mode, &code, &mut actions, &args.file)
        .context("Shader compilation failed")?;

    let output = match args.format.as_str() {
        "text" => format_text(&generated),
        "json" => format_json(&generated)?,
        "toml" => format_toml(&generated)?,
        _ => anyhow::bail!("Unknown format: {}", args.format),
    };

    println!("{}", output);

    Ok(())
}
