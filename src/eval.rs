//! The evaluator (§4.3): `eval(program, handler, stack) -> Option<Stack>`.
//!
//! `None` is ordinary program failure, not a Rust error — every combinator
//! and primitive operator can fail, and a failure anywhere must leave the
//! caller's stack exactly as it found it (the "stack purity on failure"
//! invariant). We get this for free from the signature itself: `eval` never
//! mutates a caller-owned stack in place, it consumes one `Stack` and
//! produces a fresh one, so a `None` return simply discards the attempt and
//! the caller's original `Stack` (which it still owns) is untouched. This is
//! the same non-corrupting-failure discipline the teacher's `vm.rs`
//! enforces by snapshotting the stack around every fallible instruction,
//! generalized here to the type level instead of a runtime checkpoint.

use crate::effects::EffectHandler;
use crate::program::{Op, Program};
use crate::value::{Bits, Value, bits};

/// The evaluator's working stack. The specification describes the top as
/// the front of the sequence; we keep the top at the *end* of the `Vec`
/// instead, since every operator here pushes/pops there in `O(1)` — purely
/// a representational choice, observably identical once a stack is printed
/// or serialized top-first.
pub type Stack = Vec<Value>;

/// Evaluate `program` against `stack`, using `handler` for `Op::Eff` and for
/// the transactional bracketing around `Cond`/`Loop` attempts.
pub fn eval(program: &Program, handler: &mut dyn EffectHandler, stack: Stack) -> Option<Stack> {
    match program {
        Program::Op(op) => eval_op(*op, handler, stack),
        Program::Data(v) => {
            let mut s = stack;
            s.push(v.clone());
            Some(s)
        }
        Program::Seq(items) => {
            let mut s = stack;
            for item in items {
                s = eval(item, handler, s)?;
            }
            Some(s)
        }
        Program::Dip(p) => {
            let mut s = stack;
            let top = s.pop()?;
            let mut s = eval(p, handler, s)?;
            s.push(top);
            Some(s)
        }
        Program::Cond(t, y, n) => eval_cond(t, y, n, handler, stack),
        Program::Loop(w, d) => eval_loop(w, d, handler, stack),
        Program::Env(h, p) => {
            let mut env_handler = ProgramHandler { handler_program: h, outer: handler };
            eval(p, &mut env_handler, stack)
        }
        Program::Prog(_meta, body) => eval(body, handler, stack),
    }
}

fn eval_cond(
    t: &Program,
    y: &Program,
    n: &Program,
    handler: &mut dyn EffectHandler,
    stack: Stack,
) -> Option<Stack> {
    handler.begin();
    match eval(t, handler, stack.clone()) {
        Some(after_try) => {
            handler.commit();
            eval(y, handler, after_try)
        }
        None => {
            handler.abort();
            eval(n, handler, stack)
        }
    }
}

fn eval_loop(w: &Program, d: &Program, handler: &mut dyn EffectHandler, mut stack: Stack) -> Option<Stack> {
    loop {
        handler.begin();
        match eval(w, handler, stack.clone()) {
            Some(after_w) => {
                handler.commit();
                stack = eval(d, handler, after_w)?;
            }
            None => {
                handler.abort();
                return Some(stack);
            }
        }
    }
}

/// Bridges `Op::Eff` inside an `Env(h, p)` body to the handler *program* `h`
/// rather than a fixed Rust handler: an effect request is evaluated as
/// `h` applied to a one-element stack `[request]`, and the top of the
/// resulting stack is the response. `h` may itself perform effects, which
/// are delegated to the enclosing handler, so effects nest the same way
/// `Env` programs can nest.
struct ProgramHandler<'a> {
    handler_program: &'a Program,
    outer: &'a mut dyn EffectHandler,
}

impl<'a> EffectHandler for ProgramHandler<'a> {
    fn eff(&mut self, request: Value) -> Option<Value> {
        let result = eval(self.handler_program, self.outer, vec![request])?;
        result.last().cloned()
    }

    fn begin(&mut self) {
        self.outer.begin();
    }

    fn commit(&mut self) {
        self.outer.commit();
    }

    fn abort(&mut self) {
        self.outer.abort();
    }
}

fn eval_op(op: Op, handler: &mut dyn EffectHandler, mut stack: Stack) -> Option<Stack> {
    match op {
        Op::Copy => {
            let a = stack.last()?.clone();
            stack.push(a);
            Some(stack)
        }
        Op::Drop => {
            stack.pop()?;
            Some(stack)
        }
        Op::Swap => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            stack.push(b);
            stack.push(a);
            Some(stack)
        }
        Op::Eq => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            if a == b { Some(stack) } else { None }
        }
        Op::Get => {
            let k = stack.pop()?;
            let r = stack.pop()?;
            let value = r.as_record()?.get(k.as_bits()?)?.clone();
            stack.push(value);
            Some(stack)
        }
        Op::Put => {
            let v = stack.pop()?;
            let k = stack.pop()?;
            let r = stack.pop()?;
            let updated = r.as_record()?.put(k.as_bits()?.clone(), v);
            stack.push(Value::Record(updated));
            Some(stack)
        }
        Op::Del => {
            let k = stack.pop()?;
            let r = stack.pop()?;
            let updated = r.as_record()?.del(k.as_bits()?);
            stack.push(Value::Record(updated));
            Some(stack)
        }
        Op::PushL => {
            let v = stack.pop()?;
            let l = stack.pop()?;
            stack.push(Value::List(l.as_list()?.pushl(v)));
            Some(stack)
        }
        Op::PushR => {
            let v = stack.pop()?;
            let l = stack.pop()?;
            stack.push(Value::List(l.as_list()?.pushr(v)));
            Some(stack)
        }
        Op::PopL => {
            let l = stack.pop()?;
            let (head, tail) = l.as_list()?.popl()?;
            stack.push(Value::List(tail));
            stack.push(head);
            Some(stack)
        }
        Op::PopR => {
            let l = stack.pop()?;
            let (init, last) = l.as_list()?.popr()?;
            stack.push(Value::List(init));
            stack.push(last);
            Some(stack)
        }
        Op::Len => {
            let l = stack.pop()?;
            stack.push(Value::nat(l.as_list()?.len() as u64));
            Some(stack)
        }
        Op::Split => {
            let n = stack.pop()?;
            let l = stack.pop()?;
            let n = n.to_nat()? as usize;
            let (a, b) = l.as_list()?.split(n)?;
            stack.push(Value::List(a));
            stack.push(Value::List(b));
            Some(stack)
        }
        Op::Join => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            stack.push(Value::List(a.as_list()?.join(b.as_list()?)));
            Some(stack)
        }
        Op::Add => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            stack.push(Value::Bits(bits::nat_add(a.as_bits()?, b.as_bits()?)));
            Some(stack)
        }
        Op::Sub => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            let r = bits::nat_sub(a.as_bits()?, b.as_bits()?)?;
            stack.push(Value::Bits(r));
            Some(stack)
        }
        Op::Mul => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            stack.push(Value::Bits(bits::nat_mul(a.as_bits()?, b.as_bits()?)));
            Some(stack)
        }
        Op::Div => {
            // §6.2: div "returns [remainder, quotient]" -- remainder deeper,
            // quotient on top.
            let b = stack.pop()?;
            let a = stack.pop()?;
            let (q, r) = bits::nat_divmod(a.as_bits()?, b.as_bits()?)?;
            stack.push(Value::Bits(r));
            stack.push(Value::Bits(q));
            Some(stack)
        }
        Op::BJoin => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            stack.push(Value::Bits(a.as_bits()?.concat(b.as_bits()?)));
            Some(stack)
        }
        Op::BSplit => {
            let n = stack.pop()?;
            let b = stack.pop()?;
            let n = n.to_nat()? as usize;
            let (l, r) = b.as_bits()?.split_at(n)?;
            stack.push(Value::Bits(l));
            stack.push(Value::Bits(r));
            Some(stack)
        }
        Op::BLen => {
            let b = stack.pop()?;
            stack.push(Value::nat(b.as_bits()?.len() as u64));
            Some(stack)
        }
        Op::Eff => {
            let req = stack.pop()?;
            let resp = handler.eff(req)?;
            stack.push(resp);
            Some(stack)
        }
    }
}

/// Constructs a fresh, trimmed natural-number `Bits` — exposed for modules
/// (e.g. the bootstrap codec) that build `Op::Data(Value::Bits(..))`
/// literals directly rather than going through `eval`.
pub fn nat_bits(n: u64) -> Bits {
    Bits::from_u64(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::NullHandler;
    use crate::value::{List, Record};

    fn run(p: &Program, stack: Vec<Value>) -> Option<Vec<Value>> {
        eval(p, &mut NullHandler, stack)
    }

    #[test]
    fn copy_duplicates_top() {
        let out = run(&Program::Op(Op::Copy), vec![Value::nat(5)]).unwrap();
        assert_eq!(out, vec![Value::nat(5), Value::nat(5)]);
    }

    #[test]
    fn drop_removes_top() {
        let out = run(&Program::Op(Op::Drop), vec![Value::nat(1), Value::nat(2)]).unwrap();
        assert_eq!(out, vec![Value::nat(1)]);
    }

    #[test]
    fn eq_fails_stack_unchanged_on_mismatch() {
        let stack = vec![Value::nat(1), Value::nat(2)];
        assert!(run(&Program::Op(Op::Eq), stack).is_none());
    }

    #[test]
    fn add_sub_mul_div_match_arithmetic() {
        assert_eq!(
            run(&Program::Op(Op::Add), vec![Value::nat(3), Value::nat(4)]).unwrap(),
            vec![Value::nat(7)]
        );
        assert_eq!(
            run(&Program::Op(Op::Sub), vec![Value::nat(10), Value::nat(3)]).unwrap(),
            vec![Value::nat(7)]
        );
        assert!(run(&Program::Op(Op::Sub), vec![Value::nat(3), Value::nat(10)]).is_none());
        assert_eq!(
            run(&Program::Op(Op::Mul), vec![Value::nat(6), Value::nat(7)]).unwrap(),
            vec![Value::nat(42)]
        );
        let out = run(&Program::Op(Op::Div), vec![Value::nat(17), Value::nat(5)]).unwrap();
        assert_eq!(out, vec![Value::nat(2), Value::nat(3)]);
    }

    #[test]
    fn dip_preserves_the_item_on_top() {
        let p = Program::dip(Program::Op(Op::Add));
        let out = run(&p, vec![Value::nat(3), Value::nat(4), Value::symbol("marker")]).unwrap();
        assert_eq!(out, vec![Value::nat(7), Value::symbol("marker")]);
    }

    #[test]
    fn cond_picks_try_branch_and_keeps_its_effects() {
        let p = Program::cond(
            Program::Op(Op::Sub), // 10 3 sub -> 7, succeeds
            Program::Op(Op::Copy),
            Program::Op(Op::Drop),
        );
        let out = run(&p, vec![Value::nat(10), Value::nat(3)]).unwrap();
        assert_eq!(out, vec![Value::nat(7), Value::nat(7)]);
    }

    #[test]
    fn cond_falls_back_to_else_on_try_failure_with_original_stack() {
        let p = Program::cond(
            Program::Op(Op::Sub), // 3 10 sub -> fails (3 < 10)
            Program::Op(Op::Copy),
            Program::Op(Op::Add),
        );
        let out = run(&p, vec![Value::nat(3), Value::nat(10)]).unwrap();
        assert_eq!(out, vec![Value::nat(13)]);
    }

    #[test]
    fn loop_counts_down_to_fixed_point() {
        // w: "n 1 sub" -- succeeds (and replaces n with n-1) while n >= 1,
        // fails once n == 0. d: nop. Net loop effect: count down to zero.
        let w = Program::Seq(vec![Program::Data(Value::nat(1)), Program::Op(Op::Sub)]);
        let d = Program::nop();
        let loop_prog = Program::loop_(w, d);
        let out = run(&loop_prog, vec![Value::nat(3)]).unwrap();
        assert_eq!(out, vec![Value::nat(0)]);
    }

    #[test]
    fn record_and_list_ops_round_trip() {
        let put = Program::Op(Op::Put);
        let out = run(
            &put,
            vec![
                Value::Record(Record::empty()),
                Value::symbol("x"),
                Value::nat(9),
            ],
        )
        .unwrap();
        assert_eq!(out, vec![Value::variant("x", Value::nat(9))]);

        let get = Program::Op(Op::Get);
        let out2 = run(&get, vec![out[0].clone(), Value::symbol("x")]).unwrap();
        assert_eq!(out2, vec![Value::nat(9)]);

        let pushl = Program::Op(Op::PushL);
        let out3 = run(&pushl, vec![Value::List(List::empty()), Value::nat(1)]).unwrap();
        assert_eq!(out3, vec![Value::List(List::from_vec(vec![Value::nat(1)]))]);
    }

    #[test]
    fn env_routes_eff_through_handler_program() {
        // handler program: drop the request, push a fixed response.
        let handler_prog = Program::Seq(vec![Program::Op(Op::Drop), Program::Data(Value::nat(42))]);
        let body = Program::Op(Op::Eff);
        let env = Program::env(handler_prog, body);
        let out = run(&env, vec![Value::symbol("anything")]).unwrap();
        assert_eq!(out, vec![Value::nat(42)]);
    }
}
