//! APIGen CLI
//!
//! Command-line interface for inspecting the IR built from an API header.

use anyhow::{bail, Result};
use apigen_core::{Config, Ir};
use apigen_parser::{HeaderParser, ParseResult, Parser as _};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apigen")]
#[command(author, version, about = "Binding generator IR builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the IR of a header
    Dump {
        /// Header file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Marker configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Report parse errors
    Check {
        /// Header file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Marker configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List types and the functions attached to them
    Types {
        /// Header file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Marker configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List enums with their resolved values
    Enums {
        /// Header file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Marker configuration (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
    Text,
}

fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for dumps
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dump {
            file,
            format,
            output,
            config,
        } => {
            cmd_dump(&file, format, output.as_deref(), config.as_deref())?;
        }
        Commands::Check { file, config } => {
            cmd_check(&file, config.as_deref())?;
        }
        Commands::Types { file, config } => {
            cmd_types(&file, config.as_deref())?;
        }
        Commands::Enums { file, config } => {
            cmd_enums(&file, config.as_deref())?;
        }
    }

    Ok(())
}

fn parse(file: &Path, config: Option<&Path>) -> Result<ParseResult> {
    let config = match config {
        Some(path) => {
            info!("Loading markers from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };
    Ok(HeaderParser::new(config).parse_file(file)?)
}

/// Parse and insist on an error-free result
fn parse_ir(file: &Path, config: Option<&Path>) -> Result<Ir> {
    Ok(parse(file, config)?.into_ir()?)
}

fn cmd_dump(file: &Path, format: Format, output: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let ir = parse_ir(file, config)?;

    let text = match format {
        Format::Json => serde_json::to_string_pretty(&ir)?,
        Format::Yaml => serde_yaml::to_string(&ir)?,
        Format::Text => render_text(&ir)?,
    };

    if let Some(out_path) = output {
        std::fs::write(out_path, &text)?;
        println!("Output written to: {}", out_path.display());
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn render_text(ir: &Ir) -> Result<String> {
    let mut out = String::new();
    for item in &ir.enums {
        write!(out, "{}", item)?;
    }
    for ty in &ir.types {
        write!(out, "{}", ty)?;
        for function in ir.functions_of(ty) {
            writeln!(out, "\t{}", function.source)?;
        }
    }
    Ok(out)
}

fn cmd_check(file: &Path, config: Option<&Path>) -> Result<()> {
    let result = parse(file, config)?;

    if result.is_ok() {
        println!(
            "✅ {}: {} functions, {} types, {} enums",
            file.display(),
            result.ir.functions.len(),
            result.ir.types.len(),
            result.ir.enums.len()
        );
        return Ok(());
    }

    for err in &result.errors {
        println!("❌ {}", err);
    }
    bail!("{} parse error(s) in {}", result.errors.len(), file.display())
}

fn cmd_types(file: &Path, config: Option<&Path>) -> Result<()> {
    let ir = parse_ir(file, config)?;

    println!("📦 Types in {}:", file.display());
    for ty in &ir.types {
        let kind = if ty.is_global {
            "global"
        } else if ty.is_opaque {
            "opaque"
        } else {
            "struct"
        };
        println!();
        println!("  {} ({}, {} fields)", ty.name, kind, ty.fields.len());
        for function in ir.functions_of(ty) {
            let binding = if function.is_instance_bound { "instance" } else { "static" };
            println!("     {:<8} {}", binding, function.name);
        }
    }

    Ok(())
}

fn cmd_enums(file: &Path, config: Option<&Path>) -> Result<()> {
    let ir = parse_ir(file, config)?;

    println!("🔢 Enums in {}:", file.display());
    for item in &ir.enums {
        println!();
        println!("  {}", item.name);
        for (constant, value) in item.constants.iter().zip(item.resolve()) {
            match value {
                Some(value) => println!("     {} = {}", constant.name, value),
                None => println!(
                    "     {} = ? ({})",
                    constant.name,
                    constant.expression().unwrap_or("implicit")
                ),
            }
        }
    }

    Ok(())
}
