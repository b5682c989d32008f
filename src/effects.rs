//! Effect handlers (§4.3 `Eff`, §5 transactions).
//!
//! `eval` never talks to the outside world directly: every `Op::Eff` call
//! goes through an [`EffectHandler`], and every `Cond`/`Loop` attempt opens
//! a transaction frame so a failed branch can be rolled back as cleanly as
//! the stack itself is rolled back. This mirrors the teacher's separation of
//! the interpreter core from its host bindings (see `vm.rs`), generalized
//! from a single fixed binding table to an open trait object.

use crate::value::Value;

/// A host-provided effect handler. `eff` performs one request/response; the
/// transaction methods bracket an attempt so a handler with side effects
/// (logging, I/O, module loading) can undo anything it did if the attempt
/// ultimately fails.
///
/// Transactions nest: `begin` pushes a frame, and exactly one of `commit` or
/// `abort` pops it. A handler with no real side effects (pure computation,
/// or effects with no meaningful rollback) can implement all three as no-ops.
pub trait EffectHandler {
    /// Perform an effect, or fail (`None`) if the handler rejects the
    /// request. Failure here is ordinary program failure, not a Rust error.
    fn eff(&mut self, request: Value) -> Option<Value>;

    /// Open a new transaction frame.
    fn begin(&mut self);

    /// Discard the most recently opened frame's effects permanently by
    /// folding them into the enclosing frame (or, at the outermost level,
    /// committing them for good).
    fn commit(&mut self);

    /// Undo everything recorded since the matching `begin`.
    fn abort(&mut self);
}

/// A handler with no meaningful effects: `eff` always fails, transactions
/// are no-ops. Useful for evaluating pure arithmetic/data programs and in
/// tests that don't exercise `Op::Eff`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHandler;

impl EffectHandler for NullHandler {
    fn eff(&mut self, _request: Value) -> Option<Value> {
        None
    }

    fn begin(&mut self) {}
    fn commit(&mut self) {}
    fn abort(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handler_always_fails_eff() {
        let mut h = NullHandler;
        assert_eq!(h.eff(Value::nat(1)), None);
    }
}
