//! The self-hosted half of the `g0` codec: the same automaton as
//! `codec::compile_g0_native`, but built as a `Program` out of nothing but
//! the opset and the combinators, so it can be compiled *with itself*
//! (§4.6). Every helper below is total or fails only on malformed input, and
//! every branch of every dispatch was hand-checked to carry the same static
//! arity as its siblings — `static_arity` rejects the whole tree otherwise,
//! so there is no silent way for this file to drift out of sync with
//! `codec.rs`.
//!
//! The decode loop carries a three-cell frame `[acc, bits, count]`
//! (`count` on top): `acc` is the list of `Program`-as-`Value`s decoded so
//! far combined with the working operand stack (mixed as `g0` allows
//! `Data` literals to sit alongside already-reduced structures — see
//! `preamble`), `bits` is the remaining input, and `count` is the number of
//! instructions left to read. `count` sits on top because `Loop`'s
//! condition only ever needs to see and decrement it; keeping it shallow
//! keeps the condition's own arity at `(1,1)`, composing cleanly with the
//! body's `(3,3)` (§4.2).
//!
//! No instruction ever needs an always-fail node with a *trusted* arity
//! annotation (`Program::prog` with a declared `arity` meta field): the two
//! dispatch fallbacks below (`fail1`, `fail_outer`) are built to carry
//! their required arity *naturally*, by always failing on a `Get` against a
//! fixed empty record regardless of their real input.

use crate::program::{Op, Program};
use crate::value::{List, Record, Value};

fn lit_bits(width: usize, n: u64) -> Program {
    Program::Data(Value::Bits(crate::value::Bits::from_u64_width(n, width)))
}

/// Always fails, declared arity `(1,1)`: drop the one input, then try to
/// `get` an arbitrary key out of a freshly built empty record.
fn fail1() -> Program {
    Program::Seq(vec![
        Program::Op(Op::Drop),
        Program::Data(Value::Record(Record::empty())),
        Program::Data(Value::symbol("x")),
        Program::Op(Op::Get),
    ])
}

/// Always fails, declared arity `(3,2)`: drop the dispatch tag, then run
/// `fail1` underneath the remaining two items via `Dip` (which always fails
/// in turn, since the thing it dips into always fails).
fn fail_outer() -> Program {
    Program::Seq(vec![Program::Op(Op::Drop), Program::dip(fail1())])
}

/// Build an equality dispatch over an 8-bit tag already on top of the
/// stack: `branches` are `(value, logic)` pairs, each `logic` running with
/// the tag popped and the rest of the triggering frame untouched. Folds
/// from the last branch inward so every nested `Cond` sees the same
/// `(test, body)` composed arity, matching `fallback`'s declared arity.
fn eq_dispatch(width: usize, branches: Vec<(u64, Program)>, fallback: Program) -> Program {
    let mut result = fallback;
    for (k, logic) in branches.into_iter().rev() {
        let test = Program::Seq(vec![Program::Op(Op::Copy), lit_bits(width, k), Program::Op(Op::Eq)]);
        let body = Program::Seq(vec![Program::Op(Op::Drop), logic]);
        result = Program::cond(test, body, result);
    }
    result
}

/// Append `label`-wrapped `payload` to `acc`: `[acc, payload] -> [acc']`.
fn wrap_and_push(label: &str) -> Program {
    Program::Seq(vec![
        Program::dip(Program::Data(Value::Record(Record::empty()))),
        Program::dip(Program::Data(Value::symbol(label))),
        Program::Op(Op::Put),
        Program::Op(Op::PushR),
    ])
}

/// `[a, b] -> [[a, b]]`.
fn build_pair_list() -> Program {
    Program::Seq(vec![
        Program::dip(Program::dip(Program::Data(Value::List(List::empty())))),
        Program::dip(Program::Op(Op::PushR)),
        Program::Op(Op::PushR),
    ])
}

/// `[a, b, c] -> [[a, b, c]]`.
fn build_triple_list() -> Program {
    Program::Seq(vec![
        Program::dip(Program::dip(Program::dip(Program::Data(Value::List(List::empty()))))),
        Program::dip(Program::dip(Program::Op(Op::PushR))),
        Program::dip(Program::Op(Op::PushR)),
        Program::Op(Op::PushR),
    ])
}

/// Dispatch an 8-bit opcode index to its name symbol (`Op::ALL` order, one
/// branch per operator).
fn op_name_dispatch() -> Program {
    let branches = Op::ALL
        .iter()
        .enumerate()
        .map(|(idx, op)| (idx as u64, Program::Data(Value::symbol(op.name()))))
        .collect();
    eq_dispatch(8, branches, fail1())
}

/// `tag == op`: split off the 8-bit opcode index, look up its name, wrap as
/// `variant("op", name)`, push onto `acc`. `[acc, bits] -> [acc', bits']`.
fn decode_op_logic() -> Program {
    Program::Seq(vec![
        Program::Data(Value::nat(8)),
        Program::Op(Op::BSplit),
        Program::Op(Op::Swap),
        op_name_dispatch(),
        Program::Op(Op::Swap),
        Program::dip(Program::Op(Op::PushR)),
    ])
}

/// `tag == data`: split off a 32-bit bit-length, then that many payload
/// bits, wrap as `variant("data", Bits(payload))`, push onto `acc`.
fn decode_data_logic() -> Program {
    Program::Seq(vec![
        Program::Data(Value::nat(32)),
        Program::Op(Op::BSplit),
        Program::Op(Op::Swap),
        Program::Op(Op::BSplit),
        Program::Op(Op::Swap),
        Program::dip(wrap_and_push("data")),
    ])
}

/// Pop the two most recent decoded values off `acc` (in pop order: the
/// second pop is deeper), rebuild them as `[deep, shallow]`.
fn pop_two_from_acc() -> Program {
    Program::Seq(vec![Program::Op(Op::PopR), Program::dip(Program::Op(Op::PopR))])
}

/// Pop the three most recent decoded values off `acc`, deepest last.
fn pop_three_from_acc() -> Program {
    Program::Seq(vec![
        Program::Op(Op::PopR),
        Program::dip(Program::Op(Op::PopR)),
        Program::dip(Program::dip(Program::Op(Op::PopR))),
    ])
}

/// `tag == seq2`: pop `a, b` off `acc`, push `variant("seq", [a, b])`.
fn acc_only_seq2() -> Program {
    Program::Seq(vec![pop_two_from_acc(), build_pair_list(), wrap_and_push("seq")])
}

/// `tag == dip`: pop `p` off `acc`, push `variant("dip", p)`.
fn acc_only_dip() -> Program {
    Program::Seq(vec![Program::Op(Op::PopR), wrap_and_push("dip")])
}

/// `tag == cond`: pop `t, y, n` off `acc`, push `variant("cond", [t, y, n])`.
fn acc_only_cond() -> Program {
    Program::Seq(vec![pop_three_from_acc(), build_triple_list(), wrap_and_push("cond")])
}

/// `tag == loop`: pop `w, d` off `acc`, push `variant("loop", [w, d])`.
fn acc_only_loop() -> Program {
    Program::Seq(vec![pop_two_from_acc(), build_pair_list(), wrap_and_push("loop")])
}

/// `tag == env`: pop `h, p` off `acc`, push `variant("env", [h, p])`.
fn acc_only_env() -> Program {
    Program::Seq(vec![pop_two_from_acc(), build_pair_list(), wrap_and_push("env")])
}

/// The three fixed-shape branches (`nop`, an empty-record `Data`, an
/// empty-list `Data`) build their literal the same way every other branch
/// wraps a payload (`wrap_and_push`), rather than embedding a precomputed
/// `Value` directly: a `Program::Data` node can only carry a bitstring or
/// one of the two dedicated empty-collection literals in this instruction
/// set (`codec.rs`), and `variant("seq", ...)`/`variant("data", ...)` are
/// neither — they're one-field records. Building them from an empty-list
/// or empty-record literal plus `wrap_and_push` keeps every literal this
/// file ever constructs inside what the codec can actually encode.
fn acc_only_empty_seq() -> Program {
    Program::Seq(vec![Program::Data(Value::List(List::empty())), wrap_and_push("seq")])
}

fn acc_only_empty_record_data() -> Program {
    Program::Seq(vec![Program::Data(Value::Record(Record::empty())), wrap_and_push("data")])
}

fn acc_only_empty_list_data() -> Program {
    Program::Seq(vec![Program::Data(Value::List(List::empty())), wrap_and_push("data")])
}

/// The ten-way tag dispatch that makes up the loop body's logic, run under
/// a `Dip` so `count` stays untouched: `[acc, bits, tag] -> [acc', bits']`.
fn decode_body_logic() -> Program {
    let tags: Vec<(u64, Program)> = vec![
        (0, decode_op_logic()),
        (1, decode_data_logic()),
        (2, Program::dip(acc_only_seq2())),
        (3, Program::dip(acc_only_dip())),
        (4, Program::dip(acc_only_cond())),
        (5, Program::dip(acc_only_loop())),
        (6, Program::dip(acc_only_env())),
        (7, Program::dip(acc_only_empty_seq())),
        (8, Program::dip(acc_only_empty_record_data())),
        (9, Program::dip(acc_only_empty_list_data())),
    ];
    Program::Seq(vec![Program::Data(Value::nat(8)), Program::Op(Op::BSplit), Program::Op(Op::Swap), eq_dispatch(8, tags, fail_outer())])
}

/// `w`: the loop condition, `count != 0` expressed as "decrement, then
/// continue as long as the subtraction doesn't underflow" — `Sub` fails
/// (ending the loop) the instant `count` reaches zero and one more
/// iteration is attempted (§4.2, §4.3 `Loop`: `w` failing means stop).
fn w() -> Program {
    Program::Seq(vec![Program::Data(Value::nat(1)), Program::Op(Op::Sub)])
}

/// `d`: decode one instruction, under the `count` cell untouched on top.
fn d() -> Program {
    Program::dip(decode_body_logic())
}

/// Split the 32-bit instruction count off the front of the input bits,
/// start `acc` as an empty list. `[bits] -> [acc, bits, count]`.
fn preamble() -> Program {
    Program::Seq(vec![
        Program::Data(Value::nat(32)),
        Program::Op(Op::BSplit),
        Program::Op(Op::Swap),
        Program::dip(Program::dip(Program::Data(Value::List(List::empty())))),
    ])
}

/// Drop the (now zero) count and the leftover padding bits, pop the single
/// fully-decoded `Program` value off `acc`. `[acc, bits, 0] -> [program]`.
fn postamble() -> Program {
    Program::Seq(vec![Program::Op(Op::Drop), Program::Op(Op::Drop), Program::Op(Op::PopR), Program::dip(Program::Op(Op::Drop))])
}

/// The complete `g0` decoder, hand-built from the opset (§4.6). Declared
/// arity `(1,1)`: one `Bits` value in, one `Program`-as-`Value` out.
pub fn g0_compiler_program() -> Program {
    Program::Seq(vec![preamble(), Program::loop_(w(), d()), postamble()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arity::{Arity, static_arity};
    use crate::bootstrap::codec::{compile_g0_native, encode_program_to_bits};
    use crate::effects::NullHandler;
    use crate::eval::eval;

    #[test]
    fn has_compiler_arity() {
        assert_eq!(static_arity(&g0_compiler_program()), Some(Arity::new(1, 1)));
    }

    fn run_decoder(bits: &crate::value::Bits) -> Option<Program> {
        let mut handler = NullHandler;
        let result = eval(&g0_compiler_program(), &mut handler, vec![Value::Bits(bits.clone())])?;
        let v = result.into_iter().next()?;
        Program::from_value(&v)
    }

    #[test]
    fn decodes_a_plain_op_like_the_native_decoder() {
        let p = Program::Op(Op::Swap);
        let bits = encode_program_to_bits(&p);
        assert_eq!(run_decoder(&bits), compile_g0_native(&bits));
    }

    #[test]
    fn decodes_nested_combinators_like_the_native_decoder() {
        let p = Program::cond(
            Program::Op(Op::Eq),
            Program::Seq(vec![Program::Op(Op::Copy), Program::Data(Value::nat(7))]),
            Program::dip(Program::Op(Op::Drop)),
        );
        let bits = encode_program_to_bits(&p);
        assert_eq!(run_decoder(&bits), compile_g0_native(&bits));
    }

    #[test]
    fn decodes_a_loop_like_the_native_decoder() {
        let p = Program::loop_(Program::Op(Op::Eq), Program::Op(Op::Copy));
        let bits = encode_program_to_bits(&p);
        assert_eq!(run_decoder(&bits), compile_g0_native(&bits));
    }
}
