//! Compile driver: parse, emit, pad

use crate::actions::ActionsAdapter;
use crate::config::CompilerConfig;
use crate::defaults::DefaultIdentifierActions;
use crate::emitter::NodeEmitter;
use crate::output::GeneratedCode;
use glint_core::{Result, ShaderError, ShaderMode};
use glint_lang::{ShaderLanguageParser, ShaderNode, ShaderParser, ShaderTypes};
use std::collections::{HashMap, HashSet};

/// Extra bytes reserved after the material uniforms when padding is on
const UNIFORM_BUFFER_PADDING: u32 = 16;

/// Shader cross-compiler.
///
/// The identifier tables are built once from the config; `compile` only
/// reads them, so one compiler can be shared between threads.
pub struct ShaderCompiler {
    config: CompilerConfig,
    types: ShaderTypes,
    parser: Box<dyn ShaderParser + Send + Sync>,
    defaults: HashMap<ShaderMode, DefaultIdentifierActions>,
    internal_functions: HashSet<String>,
}

impl ShaderCompiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        let types = ShaderTypes::new();
        let defaults = ShaderMode::ALL
            .iter()
            .map(|mode| (*mode, DefaultIdentifierActions::for_mode(*mode, &config)))
            .collect();
        let internal_functions = types
            .builtin_funcs()
            .iter()
            .map(|name| name.to_string())
            .collect();

        Self {
            config,
            types,
            parser: Box::new(ShaderLanguageParser::new()),
            defaults,
            internal_functions,
        }
    }

    /// Replace the front end
    pub fn with_parser(mut self, parser: Box<dyn ShaderParser + Send + Sync>) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn types(&self) -> &ShaderTypes {
        &self.types
    }

    pub fn defaults(&self, mode: ShaderMode) -> Result<&DefaultIdentifierActions> {
        self.defaults
            .get(&mode)
            .ok_or_else(|| ShaderError::UnsupportedType(format!("no tables for mode {}", mode)))
    }

    /// Parse `code` for `mode`. On failure the source is logged with the
    /// failing line marked.
    pub fn parse(&self, mode: ShaderMode, code: &str, path: &str) -> Result<ShaderNode> {
        self.parser
            .parse(
                code,
                self.types.functions(mode),
                self.types.modes(mode),
                self.types.types(),
            )
            .map_err(|err| {
                log_source(code, err.line);
                log::error!("{}:{} - {}", path, err.line, err.text);
                ShaderError::Parse {
                    path: path.to_string(),
                    line: err.line,
                    text: err.text,
                }
            })
    }

    /// Compile shader source into GLSL sections and metadata
    pub fn compile(
        &self,
        mode: ShaderMode,
        code: &str,
        actions: &mut dyn ActionsAdapter,
        path: &str,
    ) -> Result<GeneratedCode> {
        let shader = self.parse(mode, code, path)?;
        let mut generated = self.emit_shader(mode, &shader, actions)?;

        if self.config.pad_uniform_buffer && generated.uniform_total_size > 0 {
            generated.uniform_total_size += UNIFORM_BUFFER_PADDING;
        }

        log::debug!(
            "compiled {} ({}): {} defines, {} uniforms, {} textures, {} bytes",
            path,
            mode,
            generated.defines.len(),
            generated.uniform_offsets.len(),
            generated.texture_uniforms.len(),
            generated.uniform_total_size
        );
        Ok(generated)
    }

    /// Emit an already parsed shader
    pub fn emit_shader(
        &self,
        mode: ShaderMode,
        shader: &ShaderNode,
        actions: &mut dyn ActionsAdapter,
    ) -> Result<GeneratedCode> {
        let defaults = self.defaults(mode)?;
        let mut emitter = NodeEmitter::new(shader, defaults, &self.internal_functions, actions);
        emitter.emit_shader(1)?;
        Ok(emitter.finish())
    }
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn log_source(code: &str, error_line: usize) {
    for (i, line) in code.lines().enumerate() {
        let number = i + 1;
        if number == error_line {
            log::error!("E{:4}-> {}", number, line);
        } else {
            log::error!("{:5} | {}", number, line);
        }
    }
}
