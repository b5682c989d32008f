//! The universal [`Value`] type: bitstrings, labeled records, and lists.
//!
//! No primitive operator in the opset (§6.2) exposes a raw pair constructor
//! or destructor — records and lists are the only structured shapes
//! programs ever build or inspect — so `Value` is modeled directly as three
//! variants rather than the abstract bits-or-pair core the specification
//! describes; see DESIGN.md for the grounding of this simplification.

pub mod bits;
pub mod record;
pub mod list;

pub use bits::Bits;
pub use list::List;
pub use record::Record;

use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub enum Value {
    Bits(Bits),
    Record(Record),
    List(List),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bits(b) => write!(f, "{:?}", b),
            Value::Record(r) => write!(f, "{:?}", r),
            Value::List(l) => write!(f, "{:?}", l),
        }
    }
}

impl Value {
    /// `Unit` — the empty record, the canonical "no value" value.
    pub fn unit() -> Value {
        Value::Record(Record::empty())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Record(r) if r.is_empty())
    }

    pub fn nat(n: u64) -> Value {
        Value::Bits(Bits::from_u64(n))
    }

    pub fn symbol(name: &str) -> Value {
        Value::Bits(Bits::symbol(name))
    }

    pub fn as_bits(&self) -> Option<&Bits> {
        match self {
            Value::Bits(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn to_nat(&self) -> Option<u64> {
        self.as_bits()?.to_u64()
    }

    /// A single-field `label:V` record.
    pub fn variant(label: &str, value: Value) -> Value {
        Value::Record(Record::variant(label, value))
    }

    /// Destructure a single-field record into `(label, value)`.
    pub fn as_variant(&self) -> Option<(&Bits, &Value)> {
        self.as_record()?.as_single()
    }

    // ============================================================================================
    // Canonical bit serialization (§3.1 ambient addition).
    //
    // Tag-prefixed self-describing encoding: not part of the external ABI,
    // used only by the bootstrap codec (see src/bootstrap/codec.rs) and by
    // tests that want a byte-exact round trip.
    // ============================================================================================

    pub fn to_bits(&self) -> Bits {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        Bits::from_bools(out)
    }

    fn encode_into(&self, out: &mut Vec<bool>) {
        match self {
            Value::Bits(b) => {
                out.push(false); // tag 0: bits
                push_len_prefixed(out, b.len());
                out.extend_from_slice(b.as_slice());
            }
            Value::Record(r) => {
                out.push(true);
                out.push(false); // tag 10: record
                push_len_prefixed(out, r.len());
                for (k, v) in r.iter() {
                    push_len_prefixed(out, k.len());
                    out.extend_from_slice(k.as_slice());
                    v.encode_into(out);
                }
            }
            Value::List(l) => {
                out.push(true);
                out.push(true); // tag 11: list
                push_len_prefixed(out, l.len());
                for v in l.iter() {
                    v.encode_into(out);
                }
            }
        }
    }

    pub fn from_bits(bits: &Bits) -> Option<Value> {
        let mut cursor = bits.as_slice();
        let v = Value::decode_from(&mut cursor)?;
        if cursor.is_empty() { Some(v) } else { None }
    }

    fn decode_from(cursor: &mut &[bool]) -> Option<Value> {
        let tag0 = take_bit(cursor)?;
        if !tag0 {
            let len = take_len_prefixed(cursor)?;
            let bits = take_n(cursor, len)?;
            return Some(Value::Bits(Bits::from_bools(bits)));
        }
        let tag1 = take_bit(cursor)?;
        if !tag1 {
            let count = take_len_prefixed(cursor)?;
            let mut rec = Record::empty();
            for _ in 0..count {
                let klen = take_len_prefixed(cursor)?;
                let kbits = take_n(cursor, klen)?;
                let value = Value::decode_from(cursor)?;
                rec = rec.put(Bits::from_bools(kbits), value);
            }
            Some(Value::Record(rec))
        } else {
            let count = take_len_prefixed(cursor)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(Value::decode_from(cursor)?);
            }
            Some(Value::List(List::from_vec(items)))
        }
    }
}

/// Lengths are encoded as a 32-bit field; ample for this runtime's domain
/// (record arity, list length, bitstring width all fit comfortably).
const LEN_WIDTH: usize = 32;

fn push_len_prefixed(out: &mut Vec<bool>, len: usize) {
    for i in (0..LEN_WIDTH).rev() {
        out.push((len >> i) & 1 == 1);
    }
}

fn take_bit(cursor: &mut &[bool]) -> Option<bool> {
    let (first, rest) = cursor.split_first()?;
    *cursor = rest;
    Some(*first)
}

fn take_n(cursor: &mut &[bool], n: usize) -> Option<Vec<bool>> {
    if cursor.len() < n {
        return None;
    }
    let (taken, rest) = cursor.split_at(n);
    *cursor = rest;
    Some(taken.to_vec())
}

fn take_len_prefixed(cursor: &mut &[bool]) -> Option<usize> {
    let bits = take_n(cursor, LEN_WIDTH)?;
    Some(bits.iter().fold(0usize, |acc, b| (acc << 1) | (*b as usize)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_is_empty_record() {
        assert!(Value::unit().is_unit());
    }

    #[test]
    fn variant_round_trips() {
        let v = Value::variant("tag", Value::nat(7));
        let (label, inner) = v.as_variant().unwrap();
        assert_eq!(label, &Bits::symbol("tag"));
        assert_eq!(inner, &Value::nat(7));
    }

    #[test]
    fn bits_round_trip_through_canonical_encoding() {
        let v = Value::nat(12345);
        assert_eq!(Value::from_bits(&v.to_bits()), Some(v));
    }

    #[test]
    fn nested_structure_round_trips() {
        let v = Value::Record(
            Record::empty()
                .put(Bits::symbol("x"), Value::nat(1))
                .put(
                    Bits::symbol("ys"),
                    Value::List(List::from_vec(vec![Value::nat(2), Value::nat(3), Value::unit()])),
                ),
        );
        assert_eq!(Value::from_bits(&v.to_bits()), Some(v));
    }
}
