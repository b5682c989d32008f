//! Labeled records: a radix tree keyed by bitstring labels ("symbols").
//!
//! Keys are unique; iteration order is label-bit-lexicographic. We back
//! this with `im::OrdMap`, a persistent balanced tree — `Bits`'s `Ord` impl
//! compares most-significant-bit-first, which already gives the
//! label-bit-lexicographic order the spec requires, so no bespoke trie
//! node type is needed to get the right iteration order or structural
//! sharing (see DESIGN.md).

use std::fmt;

use im::OrdMap;

use super::Value;
use super::bits::Bits;

#[derive(Clone, PartialEq, Eq, Default)]
pub struct Record(OrdMap<Bits, Value>);

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl Record {
    /// The empty record — also `Value`'s canonical `Unit`.
    pub fn empty() -> Self {
        Record(OrdMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `get` — fails (returns `None`) on a missing key.
    pub fn get(&self, key: &Bits) -> Option<&Value> {
        self.0.get(key)
    }

    /// `put` — total; overwrites any existing value at `key`.
    pub fn put(&self, key: Bits, value: Value) -> Record {
        Record(self.0.update(key, value))
    }

    /// `del` — total; removing a missing key is a no-op.
    pub fn del(&self, key: &Bits) -> Record {
        Record(self.0.without(key))
    }

    pub fn contains(&self, key: &Bits) -> bool {
        self.0.contains_key(key)
    }

    /// A single-field record — the `label:V` variant shape.
    pub fn variant(label: &str, value: Value) -> Record {
        Record::empty().put(Bits::symbol(label), value)
    }

    /// If this record has exactly one field, return it (used to destructure
    /// variant-shaped records such as tagged program nodes).
    pub fn as_single(&self) -> Option<(&Bits, &Value)> {
        if self.0.len() == 1 { self.0.iter().next() } else { None }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bits, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Bits> {
        self.0.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn put_then_get_round_trips() {
        let r = Record::empty().put(Bits::symbol("x"), Value::nat(42));
        assert_eq!(r.get(&Bits::symbol("x")), Some(&Value::nat(42)));
    }

    #[test]
    fn get_after_del_fails() {
        let r = Record::empty().put(Bits::symbol("x"), Value::nat(1));
        let r = r.del(&Bits::symbol("x"));
        assert_eq!(r.get(&Bits::symbol("x")), None);
    }

    #[test]
    fn put_after_del_matches_plain_put() {
        let base = Record::empty().put(Bits::symbol("a"), Value::nat(1));
        let via_del = base.del(&Bits::symbol("a")).put(Bits::symbol("a"), Value::nat(2));
        let direct = base.put(Bits::symbol("a"), Value::nat(2));
        assert_eq!(via_del, direct);
    }

    #[test]
    fn iteration_is_label_lexicographic() {
        let r = Record::empty()
            .put(Bits::symbol("b"), Value::nat(2))
            .put(Bits::symbol("a"), Value::nat(1))
            .put(Bits::symbol("ab"), Value::nat(3));
        let keys: Vec<_> = r.keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
