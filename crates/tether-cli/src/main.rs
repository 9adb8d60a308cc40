use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::MarkerArgs;

/// Native library bindings from annotated headers.
///
/// tether reads `[export]` contract blocks out of native sources, generates
/// typed Rust stubs for them, and checks built libraries against the
/// declared contracts.
///
/// EXAMPLES:
///     tether extract include/vector.hpp      List declared functions
///     tether generate -o src/bindings.rs a.h Generate stubs
///     tether generate                        Generate from tether.toml
///     tether probe build/libvector a.h       Check a built library
///
/// ENVIRONMENT VARIABLES:
///     TETHER_OUTPUT        Override [bindings].output
///     TETHER_LIBRARY       Override [library].base
///     TETHER_RUNTIME_PATH  Override [bindings].runtime_path
///     RUST_LOG             Log filter (default: warn)
#[derive(Parser)]
#[command(name = "tether")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Log progress to stderr (-vv for debug output)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the contracts declared in native sources
    ///
    /// Skipped blocks are reported on stderr and do not fail the command.
    ///
    /// EXAMPLES:
    ///     tether extract add.h sub.h       Human-readable listing
    ///     tether extract add.h --json      Declarations and diagnostics as JSON
    #[command(visible_alias = "x")]
    Extract {
        /// Annotated sources (defaults to [bindings].sources)
        files: Vec<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        markers: MarkerArgs,
    },

    /// Generate a binding module
    ///
    /// Flags override tether.toml. The module is only rewritten when its
    /// contents change.
    ///
    /// EXAMPLES:
    ///     tether generate -o src/bindings.rs add.h sub.h
    ///     tether generate --struct-name Arithmetic
    #[command(visible_alias = "g")]
    Generate {
        /// Annotated sources (defaults to [bindings].sources)
        files: Vec<PathBuf>,
        /// Generated module path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Path the module uses to name the runtime crate
        #[arg(long)]
        runtime_path: Option<String>,
        /// Name of the generated binding set
        #[arg(long)]
        struct_name: Option<String>,
        #[command(flatten)]
        markers: MarkerArgs,
    },

    /// Open a built library and check every declared symbol resolves
    ///
    /// The base path has no extension; `<base>.so` then `<base>.dll` are tried.
    ///
    /// EXAMPLES:
    ///     tether probe build/libvector vector.hpp
    ///     tether probe                     Use [library].base and sources
    Probe {
        /// Library base path (defaults to [library].base)
        #[arg(long, short = 'l')]
        library: Option<PathBuf>,
        /// Annotated sources (defaults to [bindings].sources)
        files: Vec<PathBuf>,
        #[command(flatten)]
        markers: MarkerArgs,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     tether completions bash > ~/.bash_completions/tether.bash
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract {
            files,
            json,
            markers,
        } => {
            let config = commands::load_config()?;
            let args = commands::extract::ExtractArgs {
                files: commands::source_paths(files, &config)?,
                json,
                markers: markers.resolve(&config)?,
            };
            commands::extract::run(args)?;
        }
        Commands::Generate {
            files,
            output,
            runtime_path,
            struct_name,
            markers,
        } => {
            let config = commands::load_config()?;
            let args = commands::generate::GenerateArgs {
                files: commands::source_paths(files, &config)?,
                output,
                runtime_path,
                struct_name,
                markers: markers.resolve(&config)?,
            };
            commands::generate::run(args, &config)?;
        }
        Commands::Probe {
            library,
            files,
            markers,
        } => {
            let config = commands::load_config()?;
            let args = commands::probe::ProbeArgs {
                library: commands::library_base(library, &config)?,
                files: if files.is_empty() { config.sources() } else { files },
                markers: markers.resolve(&config)?,
            };
            commands::probe::run(args)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
