use serde::{Deserialize, Serialize};

use crate::succinct::rank::{Rank9, BLOCK_BITS, BLOCK_WORDS};
use crate::succinct::select::Select1;
use crate::util::bits::{bit_get, bit_set, low_mask, select_in_word, words_for_bits};

/// 各种位向量共同遵守的 rank/select 约定。
///
/// - `rank1(i, inclusive)`：`[0, i]`（或 `[0, i)`）内 1 的个数；`i` 越界时
///   返回 1 的总数。
/// - `select1(k)`：第 k 个（1 起）1 的位置，`rank1(select1(k), true) == k`。
pub trait RankSelect {
    fn len(&self) -> usize;

    fn count_ones(&self) -> usize;

    fn access(&self, i: usize) -> bool;

    fn rank1(&self, i: usize, inclusive: bool) -> usize;

    fn select1(&self, k: usize) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn count_zeros(&self) -> usize {
        self.len() - self.count_ones()
    }

    fn rank0(&self, i: usize, inclusive: bool) -> usize {
        if i >= self.len() {
            return self.count_zeros();
        }
        let upto = if inclusive { i + 1 } else { i };
        upto - self.rank1(i, inclusive)
    }
}

/// 可增量填充的位缓冲，构建完成后冻结为 [`Bitvector`]
#[derive(Debug, Clone, Default)]
pub struct BitBuffer {
    words: Vec<u64>,
    len: usize,
}

impl BitBuffer {
    pub fn zeroed(len: usize) -> Self {
        Self {
            words: vec![0; words_for_bits(len)],
            len,
        }
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % 64 == 0 {
            self.words.push(0);
        }
        if bit {
            bit_set(&mut self.words, self.len);
        }
        self.len += 1;
    }

    pub fn set(&mut self, i: usize) {
        assert!(i < self.len, "bit {} out of bounds ({})", i, self.len);
        bit_set(&mut self.words, i);
    }

    pub fn get(&self, i: usize) -> bool {
        bit_get(&self.words, i)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn freeze(self) -> Bitvector {
        Bitvector::new(self.words, self.len)
    }
}

/// 未压缩位向量 + Rank9 目录 + 两级采样 select。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitvector {
    len: usize,
    words: Vec<u64>,
    rank: Rank9,
    select: Select1,
}

impl Bitvector {
    /// 接管原始字缓冲；超出 `len` 的比特被清零
    pub fn new(mut words: Vec<u64>, len: usize) -> Self {
        words.resize(words_for_bits(len), 0);
        if len % 64 != 0 {
            if let Some(last) = words.last_mut() {
                *last &= low_mask(len % 64);
            }
        }
        let rank = Rank9::new(&words);
        let select = Select1::new(&words, len);
        Self {
            len,
            words,
            rank,
            select,
        }
    }

    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut buf = BitBuffer::default();
        for b in bits {
            buf.push(b);
        }
        buf.freeze()
    }

    /// 按位置列表置位
    pub fn from_positions(positions: &[usize], len: usize) -> Self {
        let mut buf = BitBuffer::zeroed(len);
        for &p in positions {
            buf.set(p);
        }
        buf.freeze()
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// 第 k 个（1 起）0 的位置。在超级块上二分，再在块内逐字定位。
    pub fn select0(&self, k: usize) -> Option<usize> {
        if k == 0 || k > self.count_zeros() {
            return None;
        }
        let zeros_before_block = |b: usize| b * BLOCK_BITS - self.rank.ones_before_block(b) as usize;
        let mut lo = 0;
        let mut hi = self.rank.block_count() - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if zeros_before_block(mid) < k {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let mut wi = lo * BLOCK_WORDS;
        let end = ((lo + 1) * BLOCK_WORDS).min(self.words.len());
        while wi + 1 < end {
            let zeros_next = (wi + 1) * 64 - self.rank.ones_before_word(wi + 1) as usize;
            if zeros_next >= k {
                break;
            }
            wi += 1;
        }
        let zeros_before = wi * 64 - self.rank.ones_before_word(wi) as usize;
        let in_word = (k - 1 - zeros_before) as u32;
        Some(wi * 64 + select_in_word(!self.words[wi], in_word) as usize)
    }

    pub fn space_bytes(&self) -> usize {
        self.words.len() * 8 + self.rank.space_bytes() + self.select.space_bytes()
    }
}

impl RankSelect for Bitvector {
    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn count_ones(&self) -> usize {
        self.select.ones()
    }

    #[inline]
    fn access(&self, i: usize) -> bool {
        assert!(i < self.len, "bit {} out of bounds ({})", i, self.len);
        bit_get(&self.words, i)
    }

    #[inline]
    fn rank1(&self, i: usize, inclusive: bool) -> usize {
        if i >= self.len {
            return self.count_ones();
        }
        if inclusive {
            self.rank.rank_inclusive(&self.words, i) as usize
        } else {
            self.rank.rank_exclusive(&self.words, i) as usize
        }
    }

    #[inline]
    fn select1(&self, k: usize) -> Option<usize> {
        self.select.select(&self.words, &self.rank, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bits(len: usize) -> Vec<bool> {
        let mut x: u32 = 7;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (x >> 16) % 5 < 2
            })
            .collect()
    }

    #[test]
    fn rank_select_inverse_law() {
        let bits = sample_bits(10_000);
        let bv = Bitvector::from_bits(bits.iter().copied());
        let mut prev = None;
        for (i, &b) in bits.iter().enumerate() {
            let r = bv.rank1(i, true);
            if b {
                assert_eq!(bv.select1(r), Some(i));
                assert_eq!(bv.rank1(bv.select1(r).unwrap(), true), r);
            }
            assert_eq!(bv.access(i), b);
        }
        for k in 1..=bv.count_ones() {
            let p = bv.select1(k).unwrap();
            if let Some(q) = prev {
                assert!(p > q);
            }
            prev = Some(p);
        }
    }

    #[test]
    fn rank_clamps_past_end() {
        let bv = Bitvector::from_bits([true, false, true, true]);
        assert_eq!(bv.rank1(3, false), 2);
        assert_eq!(bv.rank1(3, true), 3);
        assert_eq!(bv.rank1(4, false), 3);
        assert_eq!(bv.rank1(100, true), 3);
        assert_eq!(bv.rank0(1, true), 1);
        assert_eq!(bv.rank0(10, false), 1);
        assert_eq!(bv.select1(0), None);
        assert_eq!(bv.select1(4), None);
    }

    #[test]
    fn select0_matches_scan() {
        let bits = sample_bits(3_000);
        let bv = Bitvector::from_bits(bits.iter().copied());
        let zeros: Vec<usize> = (0..bits.len()).filter(|&i| !bits[i]).collect();
        for (k, &p) in zeros.iter().enumerate() {
            assert_eq!(bv.select0(k + 1), Some(p));
        }
        assert_eq!(bv.select0(zeros.len() + 1), None);
    }

    #[test]
    fn trailing_bits_are_masked() {
        let bv = Bitvector::new(vec![!0u64], 10);
        assert_eq!(bv.count_ones(), 10);
        assert_eq!(bv.count_zeros(), 0);
        assert_eq!(bv.select1(10), Some(9));
    }

    #[test]
    fn empty_vector() {
        let bv = Bitvector::from_bits(std::iter::empty());
        assert!(bv.is_empty());
        assert_eq!(bv.rank1(0, true), 0);
        assert_eq!(bv.select1(1), None);
        assert_eq!(bv.select0(1), None);
    }
}
