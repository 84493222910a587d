//! `loksc` — the command-line front end for LOKS.
//!
//! A `clap`-derived `Cli`/`Commands` pair, a `tracing-subscriber` filter
//! installed before any command runs, and `anyhow` for contextualized
//! top-level error reporting. Two subcommands: `run` (execute a source
//! file) and `dump-bytecode` (compile and print the compiled image
//! without running it).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loks_driver::DriverConfig;
use loks_runtime::StdIo;
use loks_util::diagnostic::Diagnostic;
use loks_util::span::SourceMap;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "loksc")]
#[command(author = "Loks Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run or inspect LOKS programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a LOKS source file (the default collaborator).
    Run(RunArgs),
    /// Compile a source file and print its constant/function pools without
    /// running it.
    DumpBytecode(DumpBytecodeArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to a `.loks` source file.
    path: PathBuf,

    /// Trace every VM opcode as it executes.
    #[arg(short, long)]
    debug: bool,

    /// Run the tree-walking interpreter instead of compiling to bytecode.
    #[arg(long)]
    tree_walk: bool,
}

#[derive(Parser, Debug)]
struct DumpBytecodeArgs {
    /// Path to a `.loks` source file.
    path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let debug = matches!(&cli.command, Commands::Run(args) if args.debug);
    init_logging(debug)?;

    match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::DumpBytecode(args) => dump_bytecode_command(args),
    }
}

fn init_logging(debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "trace" } else { "info" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .context("failed to initialize logging")?;

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn report(diagnostics: &[Diagnostic], source_map: &SourceMap) -> ! {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render(Some(source_map)));
    }
    std::process::exit(1);
}

fn run_command(args: RunArgs) -> Result<()> {
    let source = read_source(&args.path)?;
    let mut source_map = SourceMap::new();
    let file_id = source_map.add_file(args.path.display().to_string(), source.clone());

    let config = DriverConfig {
        tree_walk: args.tree_walk,
        debug: args.debug,
    };
    let mut io = StdIo;

    match loks_driver::run(&source, file_id, &config, &mut io) {
        Ok(()) => Ok(()),
        Err(diagnostics) => report(&diagnostics, &source_map),
    }
}

fn dump_bytecode_command(args: DumpBytecodeArgs) -> Result<()> {
    let source = read_source(&args.path)?;
    let mut source_map = SourceMap::new();
    let file_id = source_map.add_file(args.path.display().to_string(), source.clone());

    match loks_driver::compile(&source, file_id) {
        Ok(code) => {
            print!("{code}");
            Ok(())
        }
        Err(diagnostics) => report(&diagnostics, &source_map),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_debug_and_tree_walk() {
        let cli = Cli::parse_from(["loksc", "run", "prog.loks", "--debug", "--tree-walk"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected Run command");
        };
        assert_eq!(args.path, PathBuf::from("prog.loks"));
        assert!(args.debug);
        assert!(args.tree_walk);
    }

    #[test]
    fn parses_dump_bytecode() {
        let cli = Cli::parse_from(["loksc", "dump-bytecode", "prog.loks"]);
        let Commands::DumpBytecode(args) = cli.command else {
            panic!("expected DumpBytecode command");
        };
        assert_eq!(args.path, PathBuf::from("prog.loks"));
    }

    #[test]
    fn run_defaults_to_the_vm_with_no_debug_trace() {
        let cli = Cli::parse_from(["loksc", "run", "prog.loks"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected Run command");
        };
        assert!(!args.debug);
        assert!(!args.tree_walk);
    }
}
