//! Glint CLI - Command-line interface for the Glint shader cross-compiler

mod commands;
mod logger;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, compile, modes};

#[derive(Parser)]
#[command(name = "glint")]
#[command(about = "Cross-compile engine shaders to GLSL ES 3.0", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a shader and print the generated code
    Compile {
        /// Path to shader file
        file: String,

        /// Shader mode (canvas_item, spatial or particles); defaults to the file's shader_type
        #[arg(long)]
        mode: Option<String>,

        /// Output format (text, json or toml)
        #[arg(long, default_value = "text")]
        format: String,

        /// Path to a config file, replacing the global and project configs
        #[arg(long)]
        config: Option<String>,
    },

    /// Parse a shader without generating code
    Check {
        /// Path to shader file
        file: String,

        /// Shader mode; defaults to the file's shader_type
        #[arg(long)]
        mode: Option<String>,
    },

    /// List shader modes, or the render modes and built-ins of one mode
    Modes {
        /// Mode to describe
        mode: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::initialize_logger(cli.verbose);

    match cli.command {
        Commands::Compile {
            file,
            mode,
            format,
            config,
        } => compile::run(compile::CompileArgs {
            file,
            mode,
            format,
            config,
        }),
        Commands::Check { file, mode } => check::run(&file, mode.as_deref()),
        Commands::Modes { mode } => modes::run(mode.as_deref()),
    }
}
