//! The `glas-rt` binary's command surface (§6.6, ambient addition): a
//! `clap`-derived subcommand parser replacing the teacher's hand-rolled
//! `env::args()` scan (see the original `main.rs`).

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use glas_rt::config::LoaderConfig;
use glas_rt::effects::NullHandler;
use glas_rt::eval::eval;
use glas_rt::loader::source::FsSource;
use glas_rt::loader::{CompileG0, Loader};
use glas_rt::program::Program;
use glas_rt::repl::Repl;
use glas_rt::{bootstrap, compile_g0_native};

#[derive(Parser)]
#[command(name = "glas-rt", about = "Evaluator and self-hosting module loader for a minimalist stack language")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load and evaluate a module as a (0,*) program against an empty stack.
    Run {
        path: PathBuf,
        #[arg(long = "glas-path", value_delimiter = ';')]
        glas_path: Vec<PathBuf>,
    },
    /// Resolve and load a module by name via the search algorithm.
    Load {
        module_name: String,
        #[arg(long = "glas-path", value_delimiter = ';')]
        glas_path: Vec<PathBuf>,
    },
    /// Run the bootstrap driver and report the fixed-point result. Uses a
    /// self-contained fixture for its own source, so `--glas-path` does not
    /// apply here.
    Bootstrap,
    /// Start an interactive session against a persistent stack.
    Repl {
        #[arg(long = "glas-path", value_delimiter = ';')]
        glas_path: Vec<PathBuf>,
    },
}

fn config_with(glas_path: Vec<PathBuf>) -> LoaderConfig {
    let config = LoaderConfig::from_env();
    if glas_path.is_empty() { config } else { config.with_search_path(glas_path) }
}

pub fn run(cli: Cli) {
    match cli.command {
        Command::Run { path, glas_path } => run_path(path, config_with(glas_path)),
        Command::Load { module_name, glas_path } => load_module(&module_name, config_with(glas_path)),
        Command::Bootstrap => run_bootstrap(),
        Command::Repl { glas_path } => {
            let mut repl = Repl::new(Rc::new(FsSource), config_with(glas_path));
            if let Err(e) = repl.run() {
                eprintln!("repl I/O error: {e}");
            }
        }
    }
}

fn run_path(path: PathBuf, config: LoaderConfig) {
    let mut loader = Loader::new(config, Rc::new(FsSource), CompileG0::Native(compile_g0_native));
    let Some(artifact) = loader.load_file(&path) else {
        eprintln!("failed to load {} (see log output)", path.display());
        std::process::exit(1);
    };
    let Some(program) = Program::from_value(&artifact) else {
        eprintln!("{} did not decode to a runnable Program", path.display());
        std::process::exit(1);
    };
    match eval(&program, &mut NullHandler, Vec::new()) {
        Some(stack) => {
            for v in &stack {
                println!("{v:?}");
            }
        }
        None => {
            eprintln!("evaluation failed");
            std::process::exit(1);
        }
    }
}

fn load_module(name: &str, config: LoaderConfig) {
    let mut loader = Loader::new(config, Rc::new(FsSource), CompileG0::Native(compile_g0_native));
    match loader.load_by_name(name) {
        Some(v) => println!("{v:?}"),
        None => {
            eprintln!("failed to load module `{name}` (see log output)");
            std::process::exit(1);
        }
    }
}

fn run_bootstrap() {
    let (source, config) = bootstrap::self_hosting_fixture();
    match bootstrap::bootstrap(source, config) {
        Some(outcome) if outcome.fixed_point => println!("bootstrap OK: fixed point reached"),
        Some(_) => {
            eprintln!("bootstrap FAILED: compiled program disagreed across stages");
            std::process::exit(1);
        }
        None => {
            eprintln!("bootstrap FAILED: could not complete (see log output)");
            std::process::exit(1);
        }
    }
}
