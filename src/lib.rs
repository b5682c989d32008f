pub mod value;
pub mod program;
pub mod arity;
pub mod effects;
pub mod eval;
pub mod errors;
pub mod config;
pub mod handlers;
pub mod loader;
pub mod bootstrap;
pub mod repl;

pub use arity::{Arity, static_arity};
pub use bootstrap::{BootstrapOutcome, bootstrap, compile_g0_native, g0_compiler_program};
pub use config::LoaderConfig;
pub use effects::{EffectHandler, NullHandler};
pub use errors::{HostError, HostResult};
pub use eval::{Stack, eval};
pub use handlers::{LoaderHandler, LogCapture};
pub use loader::{CompileG0, Loader};
pub use loader::source::{FsSource, MemorySource, ModuleSource};
pub use program::{Op, Program};
pub use repl::Repl;
pub use value::{Bits, List, Record, Value};
