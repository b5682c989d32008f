//! The loader's effect handler (§4.5, §6.4): intercepts `load:<name>` and
//! `log:<record>`, forwards everything else downstream. `try/commit/abort`
//! pass straight through, since loader state (§3.4) is explicitly not
//! transactional.

use log::Level;

use crate::effects::EffectHandler;
use crate::loader::Loader;
use crate::value::{Bits, Record, Value};

pub struct LoaderHandler<'a> {
    loader: &'a mut Loader,
    downstream: &'a mut dyn EffectHandler,
}

impl<'a> LoaderHandler<'a> {
    pub fn new(loader: &'a mut Loader, downstream: &'a mut dyn EffectHandler) -> Self {
        LoaderHandler { loader, downstream }
    }

    fn augment_with_current_file(&self, record: &Record) -> Record {
        match self.loader.current_file() {
            Some(path) => record.put(Bits::symbol("file"), Value::symbol(&path.to_string_lossy())),
            None => record.clone(),
        }
    }

    fn emit_to_log_crate(&self, record: &Record) {
        let level = record
            .get(&Bits::symbol("level"))
            .and_then(Value::as_bits)
            .and_then(|b| b.to_bytes())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|s| match s.as_str() {
                "error" => Some(Level::Error),
                "warn" => Some(Level::Warn),
                _ => Some(Level::Info),
            })
            .unwrap_or(Level::Info);
        let message = record
            .get(&Bits::symbol("message"))
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|| format!("{record:?}"));
        log::log!(level, "{message}");
    }
}

impl<'a> EffectHandler for LoaderHandler<'a> {
    fn eff(&mut self, request: Value) -> Option<Value> {
        if let Some((tag, payload)) = request.as_variant() {
            if tag == &Bits::symbol("load") {
                let name = payload.as_bits()?.to_bytes().and_then(|b| String::from_utf8(b).ok())?;
                return self.loader.load_by_name(&name);
            }
            if tag == &Bits::symbol("log") {
                let record = payload.as_record()?;
                let augmented = self.augment_with_current_file(record);
                self.emit_to_log_crate(&augmented);
                return self.downstream.eff(Value::variant("log", Value::Record(augmented)));
            }
        }
        self.downstream.eff(request)
    }

    fn begin(&mut self) {
        self.downstream.begin();
    }

    fn commit(&mut self) {
        self.downstream.commit();
    }

    fn abort(&mut self) {
        self.downstream.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::effects::NullHandler;
    use crate::loader::CompileG0;
    use crate::loader::source::MemorySource;
    use std::rc::Rc;

    fn empty_loader() -> Loader {
        Loader::new(
            LoaderConfig::default(),
            Rc::new(MemorySource::new()),
            CompileG0::Native(crate::bootstrap::compile_g0_native),
        )
    }

    #[test]
    fn log_effect_is_augmented_and_forwarded() {
        let mut loader = empty_loader();
        let mut downstream = NullHandler;
        let mut h = LoaderHandler::new(&mut loader, &mut downstream);
        let req = Value::variant(
            "log",
            Value::Record(Record::empty().put(Bits::symbol("message"), Value::symbol("hi"))),
        );
        // NullHandler always fails eff, so forwarding should fail -- but the
        // augmentation/logging side effect still happens first.
        assert_eq!(h.eff(req), None);
    }

    #[test]
    fn load_effect_with_no_match_returns_none() {
        let mut loader = empty_loader();
        let mut downstream = NullHandler;
        let mut h = LoaderHandler::new(&mut loader, &mut downstream);
        let req = Value::variant("load", Value::symbol("nonexistent"));
        assert_eq!(h.eff(req), None);
    }
}
