//! Shader mode introspection command

use anyhow::Result;
use glint_compiler::ShaderCompiler;
use glint_core::ShaderMode;
use glint_lang::GLOBAL_FUNCTION;

pub fn run(mode: Option<&str>) -> Result<()> {
    let Some(name) = mode else {
        println!("Shader modes:");
        for mode in ShaderMode::ALL {
            println!("  {}", mode);
        }
        return Ok(());
    };

    let mode: ShaderMode = name.parse().map_err(anyhow::Error::msg)?;
    let compiler = ShaderCompiler::new();
    let types = compiler.types();
    let defaults = compiler.defaults(mode)?;

    println!("Mode: {}", mode);
    println!();
    println!("Render modes:");
    for render_mode in types.modes(mode) {
        match defaults.render_mode_defines.get(render_mode) {
            Some(define) => println!("  {}  ({})", render_mode, define.trim_end()),
            None => println!("  {}", render_mode),
        }
    }

    for (function, info) in types.functions(mode) {
        println!();
        if function == GLOBAL_FUNCTION {
            println!("Built-ins (everywhere):");
        } else if info.can_discard {
            println!("Built-ins in {}() (discard allowed):", function);
        } else {
            println!("Built-ins in {}():", function);
        }

        for (builtin, builtin_info) in &info.built_ins {
            let access = if builtin_info.constant { "in" } else { "inout" };
            let glsl = defaults
                .renames
                .get(builtin)
                .map(|r| format!(" -> {}", r))
                .unwrap_or_default();
            println!("  {:<24} {:<6} {}{}", builtin, access, builtin_info.datatype, glsl);
        }
    }

    Ok(())
}
