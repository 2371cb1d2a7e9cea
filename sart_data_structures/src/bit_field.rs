use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitFieldError {
    #[error("bit field of width 0 is meaningless")]
    ZeroWidth,
    #[error("bit field can address max position {max}, attempting {pos}")]
    PosOutOfRange { pos: usize, max: usize },
    #[error("cannot merge bit fields of {left} and {right} bytes")]
    WidthMismatch { left: usize, right: usize },
    #[error("invalid bit field '{0}'")]
    InvalidHex(String),
}

/// Fixed-size, byte-packed set of marker positions.
///
/// Bit `i` lives in byte `i >> 3` at bit `i & 7`. The byte length is fixed at
/// creation. The canonical form is the lowercase hex of the bytes in order, and
/// two fields are equal iff their canonical forms are equal.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BitField {
    fields: SmallVec<[u8; 8]>,
}

impl BitField {
    pub fn new(size: usize) -> Result<Self, BitFieldError> {
        if size == 0 {
            return Err(BitFieldError::ZeroWidth);
        }

        Ok(Self {
            fields: SmallVec::from_elem(0, Self::byte_len(size)),
        })
    }

    /// Number of bytes needed to hold `size` bits.
    #[inline]
    pub fn byte_len(size: usize) -> usize {
        (size + 7) / 8
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Number of addressable positions.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.fields.len() * 8
    }

    #[inline]
    fn locate(pos: usize) -> (usize, u8) {
        (pos >> 3, (pos & 0x7) as u8)
    }

    fn checked_locate(&self, pos: usize) -> Result<(usize, u8), BitFieldError> {
        let (byt, bit) = Self::locate(pos);
        if byt >= self.fields.len() {
            return Err(BitFieldError::PosOutOfRange {
                pos,
                max: self.capacity() - 1,
            });
        }
        Ok((byt, bit))
    }

    pub fn set(
        &mut self,
        positions: impl IntoIterator<Item = usize>,
    ) -> Result<(), BitFieldError> {
        for pos in positions {
            let (byt, bit) = self.checked_locate(pos)?;
            self.fields[byt] |= 1 << bit;
        }
        Ok(())
    }

    pub fn unset(
        &mut self,
        positions: impl IntoIterator<Item = usize>,
    ) -> Result<(), BitFieldError> {
        for pos in positions {
            let (byt, bit) = self.checked_locate(pos)?;
            self.fields[byt] &= !(1 << bit);
        }
        Ok(())
    }

    /// Set positions in ascending order.
    pub fn test(&self) -> Vec<usize> {
        self.iter_set().collect()
    }

    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields.iter().enumerate().flat_map(|(byt, &byte)| {
            (0 .. 8usize)
                .filter(move |bit| byte & (1u8 << *bit) != 0)
                .map(move |bit| (byt << 3) | bit)
        })
    }

    /// ORs `other` into `self`. Returns `true` if any bit of `self` changed.
    pub fn set_bits_of(&mut self, other: &BitField) -> Result<bool, BitFieldError> {
        if self.fields.len() != other.fields.len() {
            return Err(BitFieldError::WidthMismatch {
                left: self.fields.len(),
                right: other.fields.len(),
            });
        }

        let mut changed = false;
        for (dst, src) in self.fields.iter_mut().zip(other.fields.iter()) {
            let merged = *dst | *src;
            changed |= merged != *dst;
            *dst = merged;
        }
        Ok(changed)
    }

    pub fn all_unset(&self) -> bool {
        self.fields.iter().fold(0, |acc, byte| acc | byte) == 0
    }

    pub fn count(&self) -> usize {
        self.fields.iter().map(|byte| byte.count_ones() as usize).sum()
    }
}

impl Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.fields {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Debug for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitField({self})")
    }
}

impl FromStr for BitField {
    type Err = BitFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BitFieldError::InvalidHex(s.to_string());

        if s.is_empty() || s.len() % 2 != 0 || !s.is_ascii() {
            return Err(invalid());
        }

        let fields = (0 .. s.len())
            .step_by(2)
            .map(|idx| u8::from_str_radix(&s[idx .. idx + 2], 16).map_err(|_| invalid()))
            .collect::<Result<SmallVec<_>, _>>()?;

        Ok(Self { fields })
    }
}

impl From<BitField> for String {
    fn from(field: BitField) -> Self {
        field.to_string()
    }
}

impl TryFrom<String> for BitField {
    type Error = BitFieldError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width() {
        assert_eq!(BitField::new(0), Err(BitFieldError::ZeroWidth));
    }

    #[test]
    fn byte_length() {
        for (size, len) in [(1, 1), (2, 1), (7, 1), (8, 1), (9, 2), (15, 2), (16, 2), (17, 3)]
        {
            assert_eq!(BitField::new(size).unwrap().len(), len, "size {size}");
        }
    }

    #[test]
    fn locate() {
        assert_eq!(BitField::locate(0), (0, 0));
        assert_eq!(BitField::locate(7), (0, 7));
        assert_eq!(BitField::locate(8), (1, 0));
        assert_eq!(BitField::locate(100), (12, 4));
    }

    #[test]
    fn set_single() {
        let mut f = BitField::new(16).unwrap();
        f.set([9]).unwrap();

        assert_eq!(f.fields[1], 0x2);
        assert_eq!(f.to_string(), "0002");
    }

    #[test]
    fn set_then_test() {
        let mut f = BitField::new(16).unwrap();
        f.set([15, 0, 8, 2, 1]).unwrap();

        assert_eq!(f.test(), vec![0, 1, 2, 8, 15]);
        assert_eq!(f.to_string(), "0781");
        assert_eq!(f.count(), 5);
    }

    #[test]
    fn unset_restores() {
        let mut f = BitField::new(3).unwrap();
        f.set([2]).unwrap();
        assert!(!f.all_unset());

        f.unset([2]).unwrap();
        assert!(f.all_unset());
    }

    #[test]
    fn out_of_range() {
        let mut f = BitField::new(3).unwrap();

        // positions up to the byte boundary are addressable
        assert!(f.set([7]).is_ok());
        assert_eq!(
            f.set([8]),
            Err(BitFieldError::PosOutOfRange { pos: 8, max: 7 })
        );
        assert!(f.unset([64]).is_err());
    }

    #[test]
    fn merge() {
        let mut a = BitField::new(10).unwrap();
        let mut b = BitField::new(10).unwrap();
        a.set([1]).unwrap();
        b.set([9]).unwrap();

        assert_eq!(a.set_bits_of(&b), Ok(true));
        assert_eq!(a.test(), vec![1, 9]);
        // idempotent
        assert_eq!(a.set_bits_of(&b), Ok(false));
        assert_eq!(a.test(), vec![1, 9]);
    }

    #[test]
    fn merge_is_commutative_and_associative() {
        let field = |positions: &[usize]| {
            let mut f = BitField::new(20).unwrap();
            f.set(positions.iter().copied()).unwrap();
            f
        };
        let (a, b, c) = (field(&[0, 3]), field(&[3, 12]), field(&[19]));

        let mut ab = a.clone();
        ab.set_bits_of(&b).unwrap();
        let mut ba = b.clone();
        ba.set_bits_of(&a).unwrap();
        assert_eq!(ab, ba);

        let mut ab_c = ab.clone();
        ab_c.set_bits_of(&c).unwrap();
        let mut bc = b.clone();
        bc.set_bits_of(&c).unwrap();
        let mut a_bc = a.clone();
        a_bc.set_bits_of(&bc).unwrap();
        assert_eq!(ab_c, a_bc);
    }

    #[test]
    fn merge_width_mismatch() {
        let mut a = BitField::new(8).unwrap();
        let b = BitField::new(9).unwrap();

        assert_eq!(
            a.set_bits_of(&b),
            Err(BitFieldError::WidthMismatch { left: 1, right: 2 })
        );
    }

    #[test]
    fn canonical_form() {
        let mut f = BitField::new(24).unwrap();
        f.set([0, 23]).unwrap();

        let s = f.to_string();
        assert_eq!(s, "010080");
        assert_eq!(s.parse::<BitField>().unwrap(), f);
        assert!("0g".parse::<BitField>().is_err());
        assert!("abc".parse::<BitField>().is_err());
        assert!("".parse::<BitField>().is_err());
    }

    #[test]
    fn serde_as_hex() {
        let mut f = BitField::new(4).unwrap();
        f.set([3]).unwrap();

        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, "\"08\"");
        assert_eq!(serde_json::from_str::<BitField>(&json).unwrap(), f);
    }
}
