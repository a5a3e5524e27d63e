//! Membership vector of a skip graph member.
use std::fmt;

use rand::Rng;

use crate::error::Error;
use crate::error::Result;

/// A fixed-length random bit sequence, immutable once created.
///
/// Two members sharing a prefix of length `l` may be linked at every level up to `l`.
/// Bits are packed LSB-first, bit `i` lives in byte `i / 8` at position `i % 8`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct MembershipVector {
    len: usize,
    packed: Vec<u8>,
}

impl MembershipVector {
    /// A uniformly random vector of `len` bits.
    pub fn random(len: usize) -> Self {
        Self::random_with_rng(&mut rand::thread_rng(), len)
    }

    /// A random vector drawn from `rng`, for reproducible populations.
    pub fn random_with_rng<R: Rng>(rng: &mut R, len: usize) -> Self {
        let mut packed = vec![0u8; packed_len(len)];
        rng.fill(&mut packed[..]);
        Self::from_packed(len, packed)
    }

    /// Take the `len` lowest bits of `value`, bit 0 of `value` being bit 0 of the vector.
    /// Bits past 64 are zero.
    pub fn from_int(value: u64, len: usize) -> Self {
        let bits: Vec<u8> = (0..len)
            .map(|i| if i < 64 { ((value >> i) & 1) as u8 } else { 0 })
            .collect();
        Self::from_bits(&bits)
    }

    /// Build from a list of 0/1 digits, any non zero digit counts as 1.
    pub fn from_bits(bits: &[u8]) -> Self {
        let mut packed = vec![0u8; packed_len(bits.len())];
        for (i, b) in bits.iter().enumerate() {
            if *b != 0 {
                packed[i / 8] |= 1 << (i % 8);
            }
        }
        Self {
            len: bits.len(),
            packed,
        }
    }

    fn from_packed(len: usize, mut packed: Vec<u8>) -> Self {
        // clear the padding so equal vectors compare equal
        if len % 8 != 0 {
            if let Some(last) = packed.last_mut() {
                *last &= (1u8 << (len % 8)) - 1;
            }
        }
        Self { len, packed }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at `index` as 0 or 1, 0 past the end.
    pub fn bit(&self, index: usize) -> u8 {
        if index >= self.len {
            return 0;
        }
        (self.packed[index / 8] >> (index % 8)) & 1
    }

    /// Count of equal leading bits, at most the shorter length.
    pub fn common_prefix_length(&self, other: &Self) -> usize {
        let max = self.len.min(other.len);
        (0..max)
            .position(|i| self.bit(i) != other.bit(i))
            .unwrap_or(max)
    }

    /// Compact form: two bytes of big-endian length then the packed bits.
    /// Members refuse vectors longer than `u16::MAX` bits, see
    /// [crate::consts::MAX_MEMBERSHIP_VECTOR_LENGTH].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.packed.len());
        out.extend_from_slice(&(self.len as u16).to_be_bytes());
        out.extend_from_slice(&self.packed);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(Error::InvalidMembershipVector(format!(
                "expect at least 2 bytes, got {}",
                bytes.len()
            )));
        }
        let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let packed = &bytes[2..];
        if packed.len() != packed_len(len) {
            return Err(Error::InvalidMembershipVector(format!(
                "length {} needs {} bytes, got {}",
                len,
                packed_len(len),
                packed.len()
            )));
        }
        Ok(Self::from_packed(len, packed.to_vec()))
    }
}

fn packed_len(len: usize) -> usize {
    (len + 7) / 8
}

impl fmt::Display for MembershipVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            write!(f, "{}", self.bit(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for MembershipVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MembershipVector({})", self)
    }
}
