//! Self-hosting bootstrap (§2.1 component H, §4.6): proves the `g0`
//! compiler program decodes itself into a fixed point. `L₀` is the native
//! Rust decoder, producing `p₀`. `L₁` is a Loader running `p₀` itself as
//! its installed g0 compiler, producing `p₁` — the first *self-hosted*
//! compilation. `L₂` installs `p₁` in turn and compiles the same source a
//! second time, producing `p₂`. `p₁ == p₂` is the fixed-point check: two
//! successive self-hosted compilations agree, so self-hosting the compiler
//! changes nothing further.

pub mod codec;
pub mod g0_program;

use std::path::PathBuf;
use std::rc::Rc;

use log::{error, info};

use crate::config::LoaderConfig;
use crate::errors::HostError;
use crate::loader::source::{MemorySource, ModuleSource};
use crate::loader::{CompileG0, Loader};
use crate::program::Program;

pub use codec::{compile_g0_native, encode_program_to_bits};
pub use g0_program::g0_compiler_program;

/// The module name the search algorithm looks for a g0 compiler under
/// (§4.4 `GetCompiler`, §4.6 step 1).
pub const LANGUAGE_G0_MODULE: &str = "language-g0";

/// The `g0`-encoded bytes of `g0_compiler_program` itself — the one piece
/// of source text every stage of the bootstrap compiles.
pub fn self_hosting_source() -> Vec<u8> {
    encode_program_to_bits(&g0_compiler_program())
        .to_bytes()
        .expect("encode_program_to_bits always pads to a byte boundary")
}

/// The result of running the fixed-point check (§4.6).
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    /// `L₀` (native decoder) compiling its own source: the
    /// compiler-program-as-data the hand-written decoder recovers from the
    /// bitstream.
    pub p0: Program,
    /// `L₁`: `p₀`, running as a `Program` via `eval`, compiling the same
    /// source — the first self-hosted compilation.
    pub p1: Program,
    /// `L₂`: `p₁`, running as a `Program` via `eval`, compiling the same
    /// source again — the second self-hosted compilation.
    pub p2: Program,
    /// Whether `p1 == p2`: two successive self-hosted compilations agree,
    /// i.e. the self-hosted compiler is a fixed point of itself.
    pub fixed_point: bool,
}

/// Run the three-stage bootstrap check (§4.6): resolve `language-g0` on
/// `config`'s `GLAS_PATH` (never the local directory, per §4.6 step 1)
/// via the ordinary search algorithm, compile it with the native decoder
/// (`L₀` → `p0`), compile the same file again installing `p0` as the g0
/// compiler (`L₁` → `p1`), compile it a third time installing `p1` (`L₂` →
/// `p2`), and check `p1 == p2`.
pub fn bootstrap(source: Rc<dyn ModuleSource>, config: LoaderConfig) -> Option<BootstrapOutcome> {
    let mut l0 = Loader::new(config.clone(), Rc::clone(&source), CompileG0::Native(compile_g0_native));
    let artifact0 = l0.load_by_name_on_glas_path(LANGUAGE_G0_MODULE)?;
    let p0 = Program::from_value(&artifact0)?;
    info!("L0 (native) compiled its own source into a {}-node program", node_count(&p0));

    let mut l1 = Loader::new(config.clone(), Rc::clone(&source), CompileG0::Compiled(p0.clone()));
    let artifact1 = l1.load_by_name_on_glas_path(LANGUAGE_G0_MODULE)?;
    let p1 = Program::from_value(&artifact1)?;
    info!("L1 (self-hosted, pass 1) compiled its own source into a {}-node program", node_count(&p1));

    let mut l2 = Loader::new(config, source, CompileG0::Compiled(p1.clone()));
    let artifact2 = l2.load_by_name_on_glas_path(LANGUAGE_G0_MODULE)?;
    let p2 = Program::from_value(&artifact2)?;

    let fixed_point = p1 == p2;
    if fixed_point {
        info!("bootstrap fixed point reached: L1 and L2 agree");
    } else {
        error!("{}", HostError::BootstrapFixedPoint);
    }
    Some(BootstrapOutcome { p0, p1, p2, fixed_point })
}

fn node_count(p: &Program) -> usize {
    match p {
        Program::Op(_) | Program::Data(_) => 1,
        Program::Seq(items) => 1 + items.iter().map(node_count).sum::<usize>(),
        Program::Dip(p) | Program::Env(_, p) => 1 + node_count(p),
        Program::Cond(t, y, n) => 1 + node_count(t) + node_count(y) + node_count(n),
        Program::Loop(w, d) => 1 + node_count(w) + node_count(d),
        Program::Prog(_, body) => 1 + node_count(body),
    }
}

/// Build a self-contained `MemorySource`/`LoaderConfig` pair holding only
/// the bootstrap's own `language-g0.g0` file on its `GLAS_PATH`, ready for
/// [`bootstrap`]. Used by the CLI's `bootstrap` subcommand and by tests.
/// `working_dir` is left at its ordinary default: `bootstrap` only ever
/// resolves via `load_by_name_on_glas_path`, which never consults it.
pub fn self_hosting_fixture() -> (Rc<dyn ModuleSource>, LoaderConfig) {
    let dir = PathBuf::from("/bootstrap");
    let source: Rc<dyn ModuleSource> =
        Rc::new(MemorySource::new().with_file(dir.join("language-g0.g0"), self_hosting_source()));
    let config = LoaderConfig::default().with_search_path(vec![dir]);
    (source, config)
}
