//! The `g0` instruction encoding (§4.6): a minimal, intentionally small
//! post-order bitstream for `Program` trees -- concrete enough to exercise
//! the loader/bootstrap machinery end to end, not a production source
//! grammar. A file is a 32-bit instruction count followed by that many
//! tagged instructions, each an 8-bit tag plus a tag-specific payload.
//!
//! General `Seq` nodes of any arity are folded to a chain of binary `seq2`
//! instructions on encode (and rebuilt the same way on decode) so every
//! instruction pops a fixed, known number of previously-built values off an
//! explicit stack -- no variable-length pop loop is needed. Two literal
//! shapes that recur constantly in the self-hosted decoder below (the empty
//! record, the empty list) get their own zero-payload tags rather than
//! going through the general bits-payload `data` tag, which only handles
//! bitstring-valued literals (naturals and symbols) -- see `g0_program.rs`
//! for why a `Data` node is never asked to carry anything else here.
//!
//! This is the *native* half of the codec (`compile_g0_native`, the decoder
//! run directly as Rust; `encode_program_to_bits`, used only to produce the
//! bootstrap's own `.g0` source). The in-language half -- the same
//! automaton, hand-built as a `Program` so the bootstrap driver can compile
//! it with itself -- is `g0_program.rs`.

use crate::program::{Op, Program};
use crate::value::{Bits, List, Record, Value};

const TAG_OP: u64 = 0;
const TAG_DATA: u64 = 1;
const TAG_SEQ2: u64 = 2;
const TAG_DIP: u64 = 3;
const TAG_COND: u64 = 4;
const TAG_LOOP: u64 = 5;
const TAG_ENV: u64 = 6;
const TAG_NOP: u64 = 7;
const TAG_EMPTY_RECORD: u64 = 8;
const TAG_EMPTY_LIST: u64 = 9;

fn take_uint(cursor: &mut &[bool], n: usize) -> Option<u64> {
    if cursor.len() < n {
        return None;
    }
    let (taken, rest) = cursor.split_at(n);
    *cursor = rest;
    Some(taken.iter().fold(0u64, |acc, b| (acc << 1) | (*b as u64)))
}

fn take_bits(cursor: &mut &[bool], n: usize) -> Option<Bits> {
    if cursor.len() < n {
        return None;
    }
    let (taken, rest) = cursor.split_at(n);
    *cursor = rest;
    Some(Bits::from_bools(taken.to_vec()))
}

/// Decode a `g0` bitstream into a `Program` (`L₀`, §4.6). The hand-written
/// reference implementation against which the self-hosted decoder in
/// `g0_program.rs` is checked.
pub fn compile_g0_native(bits: &Bits) -> Option<Program> {
    let mut cursor = bits.as_slice();
    let count = take_uint(&mut cursor, 32)?;
    let mut stack: Vec<Program> = Vec::new();
    for _ in 0..count {
        let tag = take_uint(&mut cursor, 8)?;
        match tag {
            TAG_OP => {
                let idx = take_uint(&mut cursor, 8)? as usize;
                let op = *Op::ALL.get(idx)?;
                stack.push(Program::Op(op));
            }
            TAG_DATA => {
                let len = take_uint(&mut cursor, 32)? as usize;
                let payload = take_bits(&mut cursor, len)?;
                stack.push(Program::Data(Value::Bits(payload)));
            }
            TAG_SEQ2 => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(Program::Seq(vec![a, b]));
            }
            TAG_DIP => {
                let p = stack.pop()?;
                stack.push(Program::dip(p));
            }
            TAG_COND => {
                let n = stack.pop()?;
                let y = stack.pop()?;
                let t = stack.pop()?;
                stack.push(Program::cond(t, y, n));
            }
            TAG_LOOP => {
                let d = stack.pop()?;
                let w = stack.pop()?;
                stack.push(Program::loop_(w, d));
            }
            TAG_ENV => {
                let p = stack.pop()?;
                let h = stack.pop()?;
                stack.push(Program::env(h, p));
            }
            TAG_NOP => stack.push(Program::nop()),
            TAG_EMPTY_RECORD => stack.push(Program::Data(Value::Record(Record::empty()))),
            TAG_EMPTY_LIST => stack.push(Program::Data(Value::List(List::empty()))),
            _ => return None,
        }
    }
    if stack.len() == 1 { stack.pop() } else { None }
}

fn push_uint(out: &mut Vec<bool>, n: u64, width: usize) {
    for i in (0..width).rev() {
        out.push((n >> i) & 1 == 1);
    }
}

fn encode_node(p: &Program, out: &mut Vec<bool>, count: &mut u64) {
    match p {
        Program::Op(op) => {
            let idx = Op::ALL.iter().position(|o| o == op).expect("Op::ALL is exhaustive");
            push_uint(out, TAG_OP, 8);
            push_uint(out, idx as u64, 8);
            *count += 1;
        }
        Program::Data(v) => {
            if let Value::Record(r) = v {
                if r.is_empty() {
                    push_uint(out, TAG_EMPTY_RECORD, 8);
                    *count += 1;
                    return;
                }
            }
            if let Value::List(l) = v {
                if l.is_empty() {
                    push_uint(out, TAG_EMPTY_LIST, 8);
                    *count += 1;
                    return;
                }
            }
            let bits = v.as_bits().expect("g0 Data literals are bitstrings, or the empty record/list");
            push_uint(out, TAG_DATA, 8);
            push_uint(out, bits.len() as u64, 32);
            out.extend_from_slice(bits.as_slice());
            *count += 1;
        }
        Program::Seq(items) => match items.as_slice() {
            [] => {
                push_uint(out, TAG_NOP, 8);
                *count += 1;
            }
            [only] => encode_node(only, out, count),
            [first, rest @ ..] => {
                encode_node(first, out, count);
                encode_node(&Program::Seq(rest.to_vec()), out, count);
                push_uint(out, TAG_SEQ2, 8);
                *count += 1;
            }
        },
        Program::Dip(inner) => {
            encode_node(inner, out, count);
            push_uint(out, TAG_DIP, 8);
            *count += 1;
        }
        Program::Cond(t, y, n) => {
            encode_node(t, out, count);
            encode_node(y, out, count);
            encode_node(n, out, count);
            push_uint(out, TAG_COND, 8);
            *count += 1;
        }
        Program::Loop(w, d) => {
            encode_node(w, out, count);
            encode_node(d, out, count);
            push_uint(out, TAG_LOOP, 8);
            *count += 1;
        }
        Program::Env(h, p) => {
            encode_node(h, out, count);
            encode_node(p, out, count);
            push_uint(out, TAG_ENV, 8);
            *count += 1;
        }
        // `Prog`'s meta annotation has no counterpart in this instruction
        // set; encoding falls through to the body. Harmless for the
        // self-hosting check, since `g0_compiler_program` never uses `Prog`.
        Program::Prog(_, body) => encode_node(body, out, count),
    }
}

/// Encode a `Program` to its `g0` bitstream (the inverse of
/// `compile_g0_native`, modulo `Prog` annotations). Pads the stream with
/// trailing zero bits to a byte boundary so the result can round-trip
/// through a byte-oriented `ModuleSource`; the decoder never reads past the
/// instructions it was told to expect, so the padding is inert.
pub fn encode_program_to_bits(program: &Program) -> Bits {
    let mut instrs = Vec::new();
    let mut count = 0u64;
    encode_node(program, &mut instrs, &mut count);
    let mut out = Vec::with_capacity(32 + instrs.len());
    push_uint(&mut out, count, 32);
    out.extend(instrs);
    while out.len() % 8 != 0 {
        out.push(false);
    }
    Bits::from_bools(out)
}
