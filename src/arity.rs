//! Static arity computation (§4.2).
//!
//! Arity tracks `(inputs, outputs)`: the number of stack cells a program
//! consumes and the number it leaves, assuming the deepest consumer along
//! any branch. Composition follows the standard concatenative-language
//! stack-effect algebra: composing `(i1,o1)` then `(i2,o2)` may need to
//! "reach past" what the first leaves, in which case the composite's input
//! requirement grows to cover it.

use crate::program::{Op, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub inputs: usize,
    pub outputs: usize,
}

impl Arity {
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Arity { inputs, outputs }
    }

    /// The arity a `language-*` compiler module's `compile` program must
    /// have (§4.4 `GetCompiler`, §6.3).
    pub fn compiler() -> Self {
        Arity::new(1, 1)
    }

    fn compose(self, next: Arity) -> Arity {
        let extra_needed = next.inputs.saturating_sub(self.outputs);
        let total_in = self.inputs + extra_needed;
        let depth_after_self = self.outputs + extra_needed;
        let total_out = depth_after_self - next.inputs + next.outputs;
        Arity::new(total_in, total_out)
    }
}

fn op_arity(op: Op) -> Arity {
    match op {
        Op::Copy => Arity::new(1, 2),
        Op::Drop => Arity::new(1, 0),
        Op::Swap => Arity::new(2, 2),
        Op::Eq => Arity::new(2, 0),
        Op::Get => Arity::new(2, 1),
        Op::Put => Arity::new(3, 1),
        Op::Del => Arity::new(2, 1),
        Op::PushL => Arity::new(2, 1),
        Op::PushR => Arity::new(2, 1),
        Op::PopL => Arity::new(1, 2),
        Op::PopR => Arity::new(1, 2),
        Op::Len => Arity::new(1, 1),
        Op::Split => Arity::new(2, 2),
        Op::Join => Arity::new(2, 1),
        Op::Add => Arity::new(2, 1),
        Op::Sub => Arity::new(2, 1),
        Op::Mul => Arity::new(2, 1),
        Op::Div => Arity::new(2, 2),
        Op::BJoin => Arity::new(2, 1),
        Op::BSplit => Arity::new(2, 2),
        Op::BLen => Arity::new(1, 1),
        Op::Eff => Arity::new(1, 1),
    }
}

/// Compute the static arity of a program, or `None` if it is ill-formed
/// (mismatched `Cond` branches, an unbalanced `Loop` body, an explicit
/// `Prog` annotation that disagrees with its body once both are known —
/// the latter we do not re-derive, trusting the annotation per §4.2).
pub fn static_arity(program: &Program) -> Option<Arity> {
    match program {
        Program::Op(op) => Some(op_arity(*op)),
        Program::Data(_) => Some(Arity::new(0, 1)),
        Program::Seq(items) => {
            let mut acc = Arity::new(0, 0);
            for item in items {
                acc = acc.compose(static_arity(item)?);
            }
            Some(acc)
        }
        Program::Dip(p) => {
            let inner = static_arity(p)?;
            Some(Arity::new(inner.inputs + 1, inner.outputs + 1))
        }
        Program::Cond(t, y, n) => {
            let t_arity = static_arity(t)?;
            let y_arity = static_arity(y)?;
            let n_arity = static_arity(n)?;
            let ty = t_arity.compose(y_arity);
            if ty == n_arity { Some(ty) } else { None }
        }
        Program::Loop(w, d) => {
            let w_arity = static_arity(w)?;
            let d_arity = static_arity(d)?;
            let body = w_arity.compose(d_arity);
            // "w balanced to zero net effect composed with d" (§4.2): one
            // full iteration (a successful w followed by d) must return the
            // stack to the same depth it started at, whatever that depth
            // is -- that composed depth is the loop's own declared arity.
            if body.inputs == body.outputs { Some(body) } else { None }
        }
        Program::Env(_, p) => static_arity(p),
        Program::Prog(meta, body) => {
            if let Some(declared) = meta.get(&crate::value::Bits::symbol("arity")) {
                decode_declared_arity(declared)
            } else {
                static_arity(body)
            }
        }
    }
}

fn decode_declared_arity(v: &crate::value::Value) -> Option<Arity> {
    let list = v.as_list()?;
    if list.len() != 2 {
        return None;
    }
    let i = list.get(0)?.to_nat()? as usize;
    let o = list.get(1)?.to_nat()? as usize;
    Some(Arity::new(i, o))
}

/// Validate that `program` is a well-formed compiler module `compile`
/// program: static arity exactly `(1,1)` (§4.2, §6.3).
pub fn is_valid_compiler(program: &Program) -> bool {
    static_arity(program) == Some(Arity::compiler())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Record, Value};

    #[test]
    fn op_arities_match_spec_shapes() {
        assert_eq!(static_arity(&Program::Op(Op::Swap)), Some(Arity::new(2, 2)));
        assert_eq!(static_arity(&Program::Op(Op::Div)), Some(Arity::new(2, 2)));
    }

    #[test]
    fn seq_composes_reaching_past_shallow_output() {
        // drop (1,0) then copy (1,2): copy needs 1 but drop left 0, so we
        // must reach one deeper: composite is (2,2).
        let p = Program::Seq(vec![Program::Op(Op::Drop), Program::Op(Op::Copy)]);
        assert_eq!(static_arity(&p), Some(Arity::new(2, 2)));
    }

    #[test]
    fn dip_increments_both_sides() {
        let p = Program::dip(Program::Op(Op::Add));
        assert_eq!(static_arity(&p), Some(Arity::new(3, 2)));
    }

    #[test]
    fn cond_requires_matching_branches() {
        let ok = Program::cond(Program::Op(Op::Sub), Program::nop(), Program::Op(Op::Swap));
        // try: sub (2,1); then: nop (0,0) -> composed (2,1).
        // else: swap (2,2) -- mismatched outputs, should fail.
        assert_eq!(static_arity(&ok), None);

        let matched = Program::cond(Program::Op(Op::Sub), Program::nop(), Program::nop());
        assert_eq!(static_arity(&matched), Some(Arity::new(2, 1)));
    }

    #[test]
    fn loop_requires_balanced_body() {
        let unbalanced = Program::loop_(Program::Op(Op::Sub), Program::Op(Op::Copy));
        assert_eq!(static_arity(&unbalanced), None);

        // copy: (1,2); drop: (1,0) -> composed net (1,1), balanced.
        let balanced = Program::loop_(Program::Op(Op::Copy), Program::Op(Op::Drop));
        assert_eq!(static_arity(&balanced), Some(Arity::new(1, 1)));
    }

    #[test]
    fn prog_annotation_is_trusted_over_body() {
        let meta = Record::empty().put(
            crate::value::Bits::symbol("arity"),
            Value::List(crate::value::List::from_vec(vec![Value::nat(5), Value::nat(5)])),
        );
        let p = Program::prog(meta, Program::Op(Op::Swap));
        assert_eq!(static_arity(&p), Some(Arity::new(5, 5)));
    }

    #[test]
    fn compiler_contract_checks_one_one() {
        assert!(is_valid_compiler(&Program::Op(Op::Len)));
        assert!(!is_valid_compiler(&Program::Op(Op::Add)));
    }
}
