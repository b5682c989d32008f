//! The log-capturing handler (§4.5) used by tests and by `tests/scenarios.rs`.
//!
//! Buffers `log:<value>` effect payloads in a per-frame queue so a test can
//! assert on exactly what was logged, and on the transactional discipline:
//! `commit` folds the top frame into its parent, `abort` discards it.

use crate::effects::EffectHandler;
use crate::value::{Bits, Value};

#[derive(Debug, Default)]
pub struct LogCapture {
    frames: Vec<Vec<Value>>,
}

impl LogCapture {
    pub fn new() -> Self {
        LogCapture { frames: vec![Vec::new()] }
    }

    /// The committed log, oldest first, after all frames have resolved.
    pub fn committed(&self) -> &[Value] {
        &self.frames[0]
    }
}

impl EffectHandler for LogCapture {
    fn eff(&mut self, request: Value) -> Option<Value> {
        if let Some((tag, payload)) = request.as_variant() {
            if tag == &Bits::symbol("log") {
                self.frames.last_mut().expect("at least one frame").push(payload.clone());
                return Some(Value::unit());
            }
        }
        None
    }

    fn begin(&mut self) {
        self.frames.push(Vec::new());
    }

    fn commit(&mut self) {
        let top = self.frames.pop().expect("commit without begin");
        self.frames.last_mut().expect("at least one frame").extend(top);
    }

    fn abort(&mut self) {
        self.frames.pop().expect("abort without begin");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval;
    use crate::program::{Op, Program};

    fn log_eff(tag: &str) -> Program {
        Program::Seq(vec![
            Program::Data(Value::variant("log", Value::symbol(tag))),
            Program::Op(Op::Eff),
        ])
    }

    #[test]
    fn committed_effects_survive_a_surrounding_successful_cond() {
        let mut h = LogCapture::new();
        let p = Program::cond(log_eff("a"), Program::nop(), Program::nop());
        eval(&p, &mut h, vec![]).unwrap();
        assert_eq!(h.committed(), &[Value::symbol("a")]);
    }

    #[test]
    fn aborted_effects_are_not_observed() {
        let mut h = LogCapture::new();
        let p = Program::cond(Program::Op(Op::Drop), log_eff("a"), Program::nop());
        // try = drop on empty stack fails -> abort -> else = nop, never logs.
        eval(&p, &mut h, vec![]).unwrap();
        assert!(h.committed().is_empty());
    }
}
