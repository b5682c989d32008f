//! Bitstrings and natural-number arithmetic over them.
//!
//! A [`Bits`] is the leaf shape of [`super::Value`]: a finite, ordered,
//! most-significant-bit-first sequence of bits. Interpreted as an unsigned
//! natural number it carries no leading-zero padding except where an
//! explicit width operator re-pads it.

use std::fmt;
use std::rc::Rc;

/// An immutable, persistent bitstring.
///
/// Cloning is cheap (`Rc` sharing); the bits themselves are never mutated
/// in place once constructed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bits(Rc<Vec<bool>>);

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b")?;
        if self.0.is_empty() {
            write!(f, "ε")?;
        }
        for b in self.0.iter() {
            write!(f, "{}", if *b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl Bits {
    /// The empty bitstring (also `nat` zero, also the unit symbol `""`).
    pub fn empty() -> Self {
        Bits(Rc::new(Vec::new()))
    }

    pub fn from_bools(bits: Vec<bool>) -> Self {
        Bits(Rc::new(bits))
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// View this bitstring as an ASCII byte sequence (used by the loader to
    /// treat record labels as printable symbols, and by the bootstrap codec
    /// to read fixed-width fields). Fails if the length isn't a multiple of 8.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        if self.0.len() % 8 != 0 {
            return None;
        }
        Some(
            self.0
                .chunks(8)
                .map(|chunk| chunk.iter().fold(0u8, |acc, b| (acc << 1) | (*b as u8)))
                .collect(),
        )
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(bytes.len() * 8);
        for byte in bytes {
            for i in (0..8).rev() {
                bits.push((byte >> i) & 1 == 1);
            }
        }
        Bits(Rc::new(bits))
    }

    /// Interpret this bitstring as a record label / symbol rendered from an
    /// ASCII-ish name, for constructing well-known keys like `"compile"`.
    pub fn symbol(name: &str) -> Self {
        Self::from_bytes(name.as_bytes())
    }

    /// Concatenation (used by `bjoin` and internally by the radix trie).
    pub fn concat(&self, other: &Bits) -> Bits {
        let mut v = (*self.0).clone();
        v.extend_from_slice(&other.0);
        Bits(Rc::new(v))
    }

    /// Split at `at` bits from the front: `(prefix, suffix)`. Fails if
    /// `at > len()`.
    pub fn split_at(&self, at: usize) -> Option<(Bits, Bits)> {
        if at > self.0.len() {
            return None;
        }
        let (l, r) = self.0.split_at(at);
        Some((Bits(Rc::new(l.to_vec())), Bits(Rc::new(r.to_vec()))))
    }

    /// Strip leading-zero bits, per the natural-number trimming invariant.
    pub fn trim(&self) -> Bits {
        match self.0.iter().position(|b| *b) {
            Some(idx) => Bits(Rc::new(self.0[idx..].to_vec())),
            None => Bits::empty(),
        }
    }

    /// Re-pad to at least `width` bits with leading zeros.
    pub fn pad_to(&self, width: usize) -> Bits {
        if self.0.len() >= width {
            return self.clone();
        }
        let mut v = vec![false; width - self.0.len()];
        v.extend_from_slice(&self.0);
        Bits(Rc::new(v))
    }

    /// Convert to a `u64`, for small fixed-width fields (bootstrap codec,
    /// loop counters). Fails if the value doesn't fit.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0.len() > 64 {
            return None;
        }
        Some(self.0.iter().fold(0u64, |acc, b| (acc << 1) | (*b as u64)))
    }

    /// Build a trimmed natural-number bitstring from a `u64`.
    pub fn from_u64(n: u64) -> Bits {
        if n == 0 {
            return Bits::empty();
        }
        let mut bits = Vec::new();
        let mut started = false;
        for i in (0..64).rev() {
            let bit = (n >> i) & 1 == 1;
            if bit {
                started = true;
            }
            if started {
                bits.push(bit);
            }
        }
        Bits(Rc::new(bits))
    }

    /// Build a bitstring of exactly `width` bits from a `u64` (for
    /// fixed-width codec fields). Truncates silently if `n` doesn't fit —
    /// callers are expected to size `width` generously for their domain.
    pub fn from_u64_width(n: u64, width: usize) -> Bits {
        let mut bits = Vec::with_capacity(width);
        for i in (0..width).rev() {
            bits.push(i < 64 && (n >> i) & 1 == 1);
        }
        Bits(Rc::new(bits))
    }
}

// ================================================================================================
// Natural-number arithmetic
// ================================================================================================

fn to_bools_msb(a: &Bits) -> &[bool] {
    a.as_slice()
}

fn from_bools_trimmed(bits: Vec<bool>) -> Bits {
    Bits(Rc::new(bits)).trim()
}

/// `a + b`, trimmed. Never fails.
pub fn nat_add(a: &Bits, b: &Bits) -> Bits {
    let x = to_bools_msb(a);
    let y = to_bools_msb(b);
    let mut out = Vec::with_capacity(x.len().max(y.len()) + 1);
    let mut carry = false;
    let mut xi = x.len();
    let mut yi = y.len();
    loop {
        if xi == 0 && yi == 0 && !carry {
            break;
        }
        let xb = if xi > 0 {
            xi -= 1;
            x[xi]
        } else {
            false
        };
        let yb = if yi > 0 {
            yi -= 1;
            y[yi]
        } else {
            false
        };
        let sum = (xb as u8) + (yb as u8) + (carry as u8);
        out.push(sum & 1 == 1);
        carry = sum > 1;
    }
    out.reverse();
    from_bools_trimmed(out)
}

/// `a - b`. Fails (returns `None`) if `a < b`.
pub fn nat_sub(a: &Bits, b: &Bits) -> Option<Bits> {
    if nat_cmp(a, b) == std::cmp::Ordering::Less {
        return None;
    }
    let x = to_bools_msb(a);
    let y = to_bools_msb(b);
    let mut out = vec![false; x.len()];
    let mut borrow = false;
    for i in 0..x.len() {
        let xi = x[x.len() - 1 - i];
        let yi = if i < y.len() { y[y.len() - 1 - i] } else { false };
        let (bit, new_borrow) = sub_bit(xi, yi, borrow);
        out[x.len() - 1 - i] = bit;
        borrow = new_borrow;
    }
    Some(from_bools_trimmed(out))
}

fn sub_bit(x: bool, y: bool, borrow: bool) -> (bool, bool) {
    let xi = x as i8;
    let yi = y as i8;
    let bi = borrow as i8;
    let mut diff = xi - yi - bi;
    let new_borrow = diff < 0;
    if new_borrow {
        diff += 2;
    }
    (diff == 1, new_borrow)
}

/// `a * b`, trimmed. Never fails. Implemented as repeated shift-add, which
/// is adequate for the natural sizes this runtime deals in (stack depths,
/// loop counters, small encoded literals) — see §4.1's contract note.
pub fn nat_mul(a: &Bits, b: &Bits) -> Bits {
    let y = to_bools_msb(b);
    let mut acc = Bits::empty();
    for &bit in y {
        acc = nat_add(&acc, &acc); // acc *= 2
        if bit {
            acc = nat_add(&acc, a);
        }
    }
    acc
}

/// `(q, r)` with `a = q*b + r`, `0 <= r < b`. Fails if `b == 0`.
pub fn nat_divmod(a: &Bits, b: &Bits) -> Option<(Bits, Bits)> {
    if b.is_empty() {
        return None;
    }
    let x = to_bools_msb(a);
    let mut rem = Bits::empty();
    let mut quot_bits = Vec::with_capacity(x.len());
    for &bit in x {
        rem = nat_add(&nat_add(&rem, &rem), &Bits::empty());
        if bit {
            rem = nat_add(&rem, &Bits::from_u64(1));
        }
        if nat_cmp(&rem, b) != std::cmp::Ordering::Less {
            rem = nat_sub(&rem, b).expect("rem >= b just checked");
            quot_bits.push(true);
        } else {
            quot_bits.push(false);
        }
    }
    Some((from_bools_trimmed(quot_bits), rem.trim()))
}

/// Re-pad `a` to at least `width` bits.
pub fn nat_width(width: usize, a: &Bits) -> Bits {
    a.pad_to(width)
}

fn nat_cmp(a: &Bits, b: &Bits) -> std::cmp::Ordering {
    let x = a.trim();
    let y = b.trim();
    x.len().cmp(&y.len()).then_with(|| x.as_slice().cmp(y.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_matches_u64() {
        let a = Bits::from_u64(123);
        let b = Bits::from_u64(45);
        assert_eq!(nat_add(&a, &b).to_u64(), Some(168));
    }

    #[test]
    fn sub_fails_when_negative() {
        let a = Bits::from_u64(3);
        let b = Bits::from_u64(10);
        assert!(nat_sub(&a, &b).is_none());
        assert_eq!(nat_sub(&b, &a).unwrap().to_u64(), Some(7));
    }

    #[test]
    fn div_by_zero_fails() {
        let a = Bits::from_u64(10);
        let zero = Bits::empty();
        assert!(nat_divmod(&a, &zero).is_none());
    }

    #[test]
    fn width_pads_not_truncates() {
        let a = Bits::from_u64(3); // 0b11
        let padded = nat_width(8, &a);
        assert_eq!(padded.len(), 8);
        assert_eq!(padded.to_u64(), Some(3));
        let wide = Bits::from_u64(1000);
        let still_wide = nat_width(2, &wide);
        assert_eq!(still_wide.len(), wide.len());
    }

    #[test]
    fn trim_removes_leading_zeros_only() {
        let padded = Bits::from_u64_width(5, 16);
        assert_eq!(padded.len(), 16);
        assert_eq!(padded.trim().to_u64(), Some(5));
    }

    proptest! {
        #[test]
        fn add_commutative(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let x = Bits::from_u64(a);
            let y = Bits::from_u64(b);
            prop_assert_eq!(nat_add(&x, &y).to_u64(), Some(a + b));
            prop_assert_eq!(nat_add(&y, &x).to_u64(), Some(a + b));
        }

        #[test]
        fn divmod_round_trips(a in 0u64..1_000_000, b in 1u64..1_000) {
            let x = Bits::from_u64(a);
            let y = Bits::from_u64(b);
            let (q, r) = nat_divmod(&x, &y).unwrap();
            let q = q.to_u64().unwrap();
            let r = r.to_u64().unwrap();
            prop_assert_eq!(a, q * b + r);
            prop_assert!(r < b);
        }

        #[test]
        fn mul_matches_u64(a in 0u64..10_000, b in 0u64..10_000) {
            let x = Bits::from_u64(a);
            let y = Bits::from_u64(b);
            prop_assert_eq!(nat_mul(&x, &y).to_u64(), Some(a * b));
        }
    }
}
