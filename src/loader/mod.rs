//! The module loader (§2 component G, §4.4): finds files on a search path,
//! composes `language-*` compiler pipelines by filename extension, caches
//! results, and detects import cycles.

pub mod search;
pub mod source;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{error, info};

use crate::arity::{is_valid_compiler, static_arity, Arity};
use crate::config::LoaderConfig;
use crate::effects::NullHandler;
use crate::errors::HostError;
use crate::eval::eval;
use crate::handlers::loader_handler::LoaderHandler;
use crate::loader::search::{build_search_path, search};
use crate::loader::source::ModuleSource;
use crate::program::Program;
use crate::value::{Bits, Value};

/// The currently installed g0 compiler (§3.4 `CompileG0`): either the
/// native, hand-written implementation (`L₀`), or a `Program` obtained by
/// running a previous stage's compiler over the g0 compiler's own source
/// (`L₁`/`L₂`, §4.6).
#[derive(Clone)]
pub enum CompileG0 {
    Native(fn(&Bits) -> Option<Program>),
    Compiled(Program),
}

pub struct Loader {
    config: LoaderConfig,
    source: Rc<dyn ModuleSource>,
    loading: Vec<PathBuf>,
    cache: HashMap<PathBuf, Option<Value>>,
    compiler_cache: HashMap<PathBuf, Option<Program>>,
    compile_g0: CompileG0,
    /// The most recent [`HostError`] raised by a loader-boundary failure
    /// (§7: logged at the site, and kept here so a caller can inspect the
    /// structured cause instead of only seeing the log line).
    last_error: Option<HostError>,
    /// Bumped every time `fail` runs; lets a caller tell whether a nested
    /// call already reported a more specific `HostError` before wrapping a
    /// `None` in a less specific one of its own.
    error_count: u64,
}

impl Loader {
    pub fn new(config: LoaderConfig, source: Rc<dyn ModuleSource>, compile_g0: CompileG0) -> Self {
        Loader {
            config,
            source,
            loading: Vec::new(),
            cache: HashMap::new(),
            compiler_cache: HashMap::new(),
            compile_g0,
            last_error: None,
            error_count: 0,
        }
    }

    /// The file currently being loaded, if any (used to stamp `log:`
    /// effects with their originating module, §4.5).
    pub fn current_file(&self) -> Option<&Path> {
        self.loading.last().map(PathBuf::as_path)
    }

    /// The [`HostError`] behind the most recent `None` this loader produced,
    /// if the failure originated at the loader boundary rather than as an
    /// ordinary program failure (§7).
    pub fn last_error(&self) -> Option<&HostError> {
        self.last_error.as_ref()
    }

    fn fail<T>(&mut self, err: HostError) -> Option<T> {
        error!("{err}");
        self.last_error = Some(err);
        self.error_count += 1;
        None
    }

    fn resolve(&mut self, name: &str) -> Option<PathBuf> {
        let dirs = build_search_path(&self.loading, &self.config.working_dir, &self.config.search_path);
        self.resolve_in(&dirs, name)
    }

    /// Resolve `name` against `GLAS_PATH` only, skipping the local directory
    /// (§4.6 step 1: "Search only `GLAS_PATH` (not local) for module
    /// `language-g0`"). Used by the bootstrap driver, which must not let a
    /// same-directory file shadow the installed g0 module.
    fn resolve_glas_path_only(&mut self, name: &str) -> Option<PathBuf> {
        let dirs = self.config.search_path.clone();
        self.resolve_in(&dirs, name)
    }

    fn resolve_in(&mut self, dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
        match search(self.source.as_ref(), dirs, name) {
            Ok(found) => found,
            Err(e) => self.fail(e),
        }
    }

    /// Resolve `name` on the search path and load it (§4.4 `load:<name>`).
    pub fn load_by_name(&mut self, name: &str) -> Option<Value> {
        let fp = self.resolve(name)?;
        self.load_file(&fp)
    }

    /// Resolve `name` on `GLAS_PATH` only (§4.6 step 1) and load it.
    pub fn load_by_name_on_glas_path(&mut self, name: &str) -> Option<Value> {
        let fp = self.resolve_glas_path_only(name)?;
        self.load_file(&fp)
    }

    /// Load a file by its already-resolved path (§4.4 "Loading a file `fp`").
    pub fn load_file(&mut self, fp: &Path) -> Option<Value> {
        let fp_buf = fp.to_path_buf();
        if let Some(cached) = self.cache.get(&fp_buf) {
            info!("cache hit for {}", fp.display());
            return cached.clone();
        }
        if let Some(idx) = self.loading.iter().position(|p| p == &fp_buf) {
            let mut chain: Vec<String> = self.loading[idx..].iter().map(|p| p.display().to_string()).collect();
            chain.push(fp.display().to_string());
            self.fail::<()>(HostError::Cycle { chain });
            self.cache.insert(fp_buf, None);
            return None;
        }

        self.loading.push(fp_buf.clone());
        let result = self.load_file_body(fp);
        self.loading.pop();

        self.cache.insert(fp_buf, result.clone());
        result
    }

    fn load_file_body(&mut self, fp: &Path) -> Option<Value> {
        let bytes = match self.source.read(fp) {
            Ok(bytes) => bytes,
            Err(e) => return self.fail(e),
        };
        let mut value = Value::Bits(Bits::from_bytes(&bytes));
        for suffix in Self::extension_chain(fp).iter().rev() {
            let errors_before = self.error_count;
            value = match self.compile_one(suffix, value) {
                Some(v) => v,
                None if self.error_count > errors_before => return None,
                None => {
                    return self.fail(HostError::CompileFailure {
                        module: fp.display().to_string(),
                        reason: format!("compiler for extension `{suffix}` rejected the input"),
                    });
                }
            };
        }
        Some(value)
    }

    /// Filename segments after the first `.` (§4.4 step 3b), e.g.
    /// `foo.x.g0` -> `["x", "g0"]`.
    fn extension_chain(fp: &Path) -> Vec<String> {
        let filename = fp.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let mut parts = filename.split('.');
        parts.next();
        parts.map(str::to_owned).collect()
    }

    fn compile_one(&mut self, suffix: &str, value: Value) -> Option<Value> {
        if suffix.is_empty() {
            return Some(value);
        }
        if suffix == "g0" {
            match self.compile_g0.clone() {
                CompileG0::Native(compile_fn) => {
                    let bits = value.as_bits()?.clone();
                    let program = compile_fn(&bits)?;
                    Some(program.to_value())
                }
                CompileG0::Compiled(program) => self.apply_compiler_program(&program, value),
            }
        } else {
            let program = self.get_language_compiler(suffix)?;
            self.apply_compiler_program(&program, value)
        }
    }

    /// `GetCompiler(suffix)` for a non-`g0` extension (§4.4).
    fn get_language_compiler(&mut self, suffix: &str) -> Option<Program> {
        let module_name = format!("language-{suffix}");
        let fp = self.resolve(&module_name)?;
        if let Some(cached) = self.compiler_cache.get(&fp) {
            return cached.clone();
        }

        // A module's cached artifact is a `Program`-as-`Value` (§4.4), the
        // same shape `run_path` (§6.6) evaluates for its own purposes; a
        // `language-*` module is no different, it just happens to evaluate
        // (against an empty stack, same as any other module) to a record
        // carrying a `compile` field rather than to arbitrary data.
        let artifact = self.load_file(&fp)?;
        let module_program = Program::from_value(&artifact)?;
        let module_value = self.run_module_program(&module_program)?;
        let program = module_value
            .as_record()
            .and_then(|r| r.get(&Bits::symbol("compile")))
            .and_then(Program::from_value);

        match program {
            Some(p) if is_valid_compiler(&p) => {
                self.compiler_cache.insert(fp, Some(p.clone()));
                Some(p)
            }
            Some(p) => {
                let actual = static_arity(&p).map(|a| format!("{a:?}")).unwrap_or_else(|| "unbounded".to_string());
                let result =
                    self.fail(HostError::ArityMismatch { expected: format!("{:?}", Arity::compiler()), actual });
                self.compiler_cache.insert(fp, None);
                result
            }
            None => {
                let result = self.fail(HostError::MalformedCompilerModule {
                    module: module_name.clone(),
                    reason: "module did not evaluate to a record with a `compile` field".to_string(),
                });
                self.compiler_cache.insert(fp, None);
                result
            }
        }
    }

    fn apply_compiler_program(&mut self, program: &Program, input: Value) -> Option<Value> {
        let mut downstream = NullHandler;
        let mut handler = LoaderHandler::new(self, &mut downstream);
        let result = eval(program, &mut handler, vec![input])?;
        result.into_iter().next()
    }

    /// Run a module's top-level program (arity `(0,*)`, same convention the
    /// `run` CLI subcommand uses) against an empty stack, with `load:`/`log:`
    /// effects routed back through this loader.
    fn run_module_program(&mut self, program: &Program) -> Option<Value> {
        let mut downstream = NullHandler;
        let mut handler = LoaderHandler::new(self, &mut downstream);
        let result = eval(program, &mut handler, Vec::new())?;
        result.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::source::MemorySource;
    use crate::program::Op;

    fn native_identity_g0(bits: &Bits) -> Option<Program> {
        Some(Program::Data(Value::Bits(bits.clone())))
    }

    fn loader_over(source: MemorySource) -> Loader {
        Loader::new(LoaderConfig::default(), Rc::new(source), CompileG0::Native(native_identity_g0))
    }

    #[test]
    fn loads_a_plain_g0_file() {
        let source = MemorySource::new().with_file("/mods/foo.g0", b"hi".to_vec());
        let mut loader = loader_over(source);
        let v = loader.load_file(Path::new("/mods/foo.g0")).unwrap();
        // native_identity_g0 wraps the raw bits in a Data(..) program value.
        assert_eq!(Program::from_value(&v), Some(Program::Data(Value::Bits(Bits::from_bytes(b"hi")))));
    }

    #[test]
    fn second_load_of_the_same_file_is_a_cache_hit() {
        let source = MemorySource::new().with_file("/mods/foo.g0", b"hi".to_vec());
        let mut loader = loader_over(source);
        let first = loader.load_file(Path::new("/mods/foo.g0"));
        let second = loader.load_file(Path::new("/mods/foo.g0"));
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_yields_none_without_panicking() {
        let mut loader = loader_over(MemorySource::new());
        assert_eq!(loader.load_file(Path::new("/mods/missing.g0")), None);
    }

    #[test]
    fn mutual_import_cycle_is_detected() {
        // A depends on B, B depends on A: we simulate this directly by
        // re-entering load_file for a path already on the Loading stack,
        // which is exactly what a `load:` effect inside a compiler would do.
        let source = MemorySource::new();
        let mut loader = loader_over(source);
        loader.loading.push(PathBuf::from("/mods/a.g0"));
        loader.loading.push(PathBuf::from("/mods/b.g0"));
        let result = loader.load_file(Path::new("/mods/a.g0"));
        assert_eq!(result, None);
        assert_eq!(loader.cache.get(&PathBuf::from("/mods/a.g0")), Some(&None));
    }

    #[test]
    fn extension_chain_splits_on_first_dot() {
        assert_eq!(Loader::extension_chain(Path::new("foo.x.g0")), vec!["x".to_string(), "g0".to_string()]);
        assert_eq!(Loader::extension_chain(Path::new("foo")), Vec::<String>::new());
    }

    #[test]
    fn language_module_compiler_drives_a_second_extension() {
        // `target.up.g0`'s inner g0 layer decodes to the Program-as-Value
        // encoding of `Data(41)`; the `up` layer then unwraps that tagged
        // record's `data` field and adds one. (A realistic `.up` module
        // whose g0 layer itself produces the compiler program is exercised
        // end-to-end against the real bootstrap codec in
        // tests/scenarios.rs.)
        let add_one = Program::Seq(vec![
            Program::Data(Value::symbol("data")),
            Program::Op(Op::Get),
            Program::Data(Value::nat(1)),
            Program::Op(Op::Add),
        ]);
        let source = MemorySource::new()
            .with_file("/mods/language-up.g0", b"unused".to_vec())
            .with_file("/mods/target.up.g0", b"unused".to_vec());
        let mut loader = loader_over(source);
        loader.compile_g0 = CompileG0::Native(|bits| {
            let text = bits.to_bytes()?;
            (text == b"unused").then(|| Program::Data(Value::nat(41)))
        });
        loader.compiler_cache.insert(PathBuf::from("/mods/language-up.g0"), Some(add_one));

        let out = loader.load_file(Path::new("/mods/target.up.g0")).unwrap();
        assert_eq!(out, Value::nat(42));
    }
}
