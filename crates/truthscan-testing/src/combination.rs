//! Input-space arithmetic
//!
//! A combination is one unsigned integer covering every input bit. The first
//! input pin takes the most significant bit block and the last input pin the
//! least significant one:
//!
//! ```text
//!   inputs A (3 bits), B (1 bit), C (4 bits)
//!   combination bits:  7 6 5 | 4 | 3 2 1 0
//!                        A     B     C
//! ```
//!
//! Input widths sum past 64 bits in legal circuits, so combinations and
//! chunk ranges are arbitrary-precision integers.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// A contiguous slice `[start, start + count)` of the input space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: BigUint,
    pub count: BigUint,
}

impl ChunkRange {
    pub fn new(start: BigUint, count: BigUint) -> Self {
        Self { start, count }
    }

    /// One past the last combination in the range
    pub fn end(&self) -> BigUint {
        &self.start + &self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_zero()
    }
}

/// Total input bits of a set of pin widths
pub fn input_bit_count(widths: &[u8]) -> u32 {
    widths.iter().map(|w| *w as u32).sum()
}

/// `2^bits`
pub fn total_combinations(bits: u32) -> BigUint {
    BigUint::one() << bits as usize
}

/// Split `[0, total)` into `chunks` contiguous near-equal ranges
///
/// Every range gets `total / chunks` combinations; the last one also takes
/// the remainder.
pub fn partition_range(total: &BigUint, chunks: usize) -> Vec<ChunkRange> {
    let chunks = chunks.max(1);
    let n = BigUint::from(chunks);
    let count = total / &n;
    let remainder = total % &n;
    (0..chunks)
        .map(|i| {
            let start = &count * BigUint::from(i);
            let size = if i + 1 == chunks {
                &count + &remainder
            } else {
                count.clone()
            };
            ChunkRange::new(start, size)
        })
        .collect()
}

/// Slice a combination into one field per input pin
pub fn split_combination(value: &BigUint, widths: &[u8]) -> Vec<u32> {
    let mut fields = vec![0u32; widths.len()];
    let mut offset = 0u64;
    for (field, width) in fields.iter_mut().zip(widths).rev() {
        for bit in 0..(*width).min(32) {
            if value.bit(offset + bit as u64) {
                *field |= 1 << bit;
            }
        }
        offset += *width as u64;
    }
    fields
}

/// Inverse of [`split_combination`]
pub fn join_combination(fields: &[u32], widths: &[u8]) -> BigUint {
    let mut value = BigUint::zero();
    for (field, width) in fields.iter().zip(widths) {
        value <<= *width as usize;
        value |= BigUint::from(*field & truthscan_netlist::width_mask(*width));
    }
    value
}
