//! Reference CLI host: reads a program from a file path and runs it
//! on either engine, printing any diagnostic through the formatter and
//! setting the process exit code accordingly (§6.4 — explicitly a
//! non-normative collaborator, not part of the language core).
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{debug, error};

use glint::diagnostics::DiagnosticFormatter;
use glint::Engine;

#[derive(Parser, Debug)]
#[command(name = "glint", version, about = "Runs a program written in the glint scripting language.")]
struct Cli {
    /// Path to the program to run.
    path: PathBuf,

    /// Which execution engine to run the program on.
    #[arg(long, value_enum, default_value_t = EngineArg::Interpreter)]
    engine: EngineArg,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Interpreter,
    Vm,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Interpreter => Engine::Interpreter,
            EngineArg::Vm => Engine::Vm,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    if let Err(err) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("warning: failed to initialize logger: {err}");
    }

    let source = match fs::read_to_string(&cli.path) {
        Ok(source) => source,
        Err(err) => {
            error!("couldn't read {}: {err}", cli.path.display());
            return ExitCode::FAILURE;
        }
    };

    debug!("running {} on the {:?} engine", cli.path.display(), cli.engine);

    let (result, cursor) = glint::run_source(&source, cli.engine.into());
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let formatter = DiagnosticFormatter::new(cursor);
            let rendered = formatter.format(&err);
            error!("{rendered}");
            eprintln!("{rendered}");
            ExitCode::FAILURE
        }
    }
}
