//! Program representation: the algebraic form the evaluator interprets.
//!
//! A `Program` is conceptually a `Value` in one of eight tagged shapes
//! (§3.2); we keep it as its own typed enum rather than literally nesting it
//! inside [`crate::value::Value`] — idiomatic for a tree-walking
//! interpreter, and exactly how the teacher crate keeps its `Expr`/`Stmt`
//! tree separate from its runtime value type. The bootstrap codec
//! (`src/bootstrap`) is the one place that needs a `Program <-> Value`
//! bridge, and it owns that translation directly.

use crate::value::{Bits, Record, Value};

/// The primitive operator set (§6.2). Twenty-two named operators; the
/// specification's "27-symbol opset, plus six reserved for data/meta" count
/// does not square with its own enumeration (22 names listed) — we
/// implement exactly the named operators and do not invent the remainder
/// (see DESIGN.md, "Open Question: opset symbol count").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Copy,
    Drop,
    Swap,
    Eq,
    Get,
    Put,
    Del,
    PushL,
    PushR,
    PopL,
    PopR,
    Len,
    Split,
    Join,
    Add,
    Sub,
    Mul,
    Div,
    BJoin,
    BSplit,
    BLen,
    Eff,
}

impl Op {
    pub const ALL: [Op; 22] = [
        Op::Copy,
        Op::Drop,
        Op::Swap,
        Op::Eq,
        Op::Get,
        Op::Put,
        Op::Del,
        Op::PushL,
        Op::PushR,
        Op::PopL,
        Op::PopR,
        Op::Len,
        Op::Split,
        Op::Join,
        Op::Add,
        Op::Sub,
        Op::Mul,
        Op::Div,
        Op::BJoin,
        Op::BSplit,
        Op::BLen,
        Op::Eff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Op::Copy => "copy",
            Op::Drop => "drop",
            Op::Swap => "swap",
            Op::Eq => "eq",
            Op::Get => "get",
            Op::Put => "put",
            Op::Del => "del",
            Op::PushL => "pushl",
            Op::PushR => "pushr",
            Op::PopL => "popl",
            Op::PopR => "popr",
            Op::Len => "len",
            Op::Split => "split",
            Op::Join => "join",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::BJoin => "bjoin",
            Op::BSplit => "bsplit",
            Op::BLen => "blen",
            Op::Eff => "eff",
        }
    }

    pub fn from_name(name: &str) -> Option<Op> {
        Op::ALL.iter().copied().find(|op| op.name() == name)
    }
}

/// A program in the combinator calculus (§3.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    Op(Op),
    Data(Value),
    Seq(Vec<Program>),
    Dip(Box<Program>),
    Cond(Box<Program>, Box<Program>, Box<Program>),
    Loop(Box<Program>, Box<Program>),
    Env(Box<Program>, Box<Program>),
    Prog(Record, Box<Program>),
}

impl Program {
    /// The empty sequence: consumes nothing, produces nothing, never fails.
    pub fn nop() -> Program {
        Program::Seq(Vec::new())
    }

    pub fn dip(p: Program) -> Program {
        Program::Dip(Box::new(p))
    }

    pub fn cond(t: Program, y: Program, n: Program) -> Program {
        Program::Cond(Box::new(t), Box::new(y), Box::new(n))
    }

    pub fn loop_(w: Program, d: Program) -> Program {
        Program::Loop(Box::new(w), Box::new(d))
    }

    pub fn env(h: Program, p: Program) -> Program {
        Program::Env(Box::new(h), Box::new(p))
    }

    pub fn prog(meta: Record, body: Program) -> Program {
        Program::Prog(meta, Box::new(body))
    }
}

// ================================================================================================
// Program <-> Value bridge.
//
// A compiled module's artifact is a plain Value (§4.4 `GetCompiler`); when
// that artifact is meant to be run (a `language-*` module's `compile`
// field, or a module loaded for the `run` CLI subcommand), it has to decode
// into an actual `Program`. This tagged-variant encoding is the general
// bridge for that — distinct from the g0-specific raw instruction bitstream
// in `src/bootstrap`, which encodes *source text* for the one language that
// bypasses this encoding (see `src/bootstrap/codec.rs`).
// ================================================================================================

impl Program {
    pub fn to_value(&self) -> Value {
        match self {
            Program::Op(op) => Value::variant("op", Value::symbol(op.name())),
            Program::Data(v) => Value::variant("data", v.clone()),
            Program::Seq(items) => {
                Value::variant("seq", Value::List(items.iter().map(Program::to_value).collect()))
            }
            Program::Dip(p) => Value::variant("dip", p.to_value()),
            Program::Cond(t, y, n) => Value::variant(
                "cond",
                Value::List([t, y, n].into_iter().map(|p| p.to_value()).collect()),
            ),
            Program::Loop(w, d) => {
                Value::variant("loop", Value::List([w, d].into_iter().map(|p| p.to_value()).collect()))
            }
            Program::Env(h, p) => {
                Value::variant("env", Value::List([h, p].into_iter().map(|p| p.to_value()).collect()))
            }
            Program::Prog(meta, body) => Value::variant(
                "prog",
                Value::Record(meta.put(Bits::symbol("body"), body.to_value())),
            ),
        }
    }

    pub fn from_value(v: &Value) -> Option<Program> {
        let (tag, payload) = v.as_variant()?;
        let tag = tag.to_bytes().and_then(|b| String::from_utf8(b).ok())?;
        match tag.as_str() {
            "op" => {
                let bytes = payload.as_bits()?.to_bytes()?;
                let name = String::from_utf8(bytes).ok()?;
                Op::from_name(&name).map(Program::Op)
            }
            "data" => Some(Program::Data(payload.clone())),
            "seq" => {
                let items = payload.as_list()?;
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(Program::from_value(item)?);
                }
                Some(Program::Seq(out))
            }
            "dip" => Some(Program::dip(Program::from_value(payload)?)),
            "cond" => {
                let items = payload.as_list()?;
                if items.len() != 3 {
                    return None;
                }
                Some(Program::cond(
                    Program::from_value(items.get(0)?)?,
                    Program::from_value(items.get(1)?)?,
                    Program::from_value(items.get(2)?)?,
                ))
            }
            "loop" => {
                let items = payload.as_list()?;
                if items.len() != 2 {
                    return None;
                }
                Some(Program::loop_(Program::from_value(items.get(0)?)?, Program::from_value(items.get(1)?)?))
            }
            "env" => {
                let items = payload.as_list()?;
                if items.len() != 2 {
                    return None;
                }
                Some(Program::env(Program::from_value(items.get(0)?)?, Program::from_value(items.get(1)?)?))
            }
            "prog" => {
                let rec = payload.as_record()?;
                let body_value = rec.get(&Bits::symbol("body"))?;
                let body = Program::from_value(body_value)?;
                let meta = rec.del(&Bits::symbol("body"));
                Some(Program::prog(meta, body))
            }
            _ => None,
        }
    }
}
