use serde::{Deserialize, Serialize};

use crate::util::bits::div_ceil;

/// 每个超级块包含的字数
pub const BLOCK_WORDS: usize = 8;
pub const BLOCK_BITS: usize = BLOCK_WORDS * 64;
/// 子块宽度（比特），即一个字
pub const SUB_BLOCK_BITS: usize = 64;

/// Rank9 目录：每 8 个字一个超级块计数（u64），外加一个字内联存放
/// 7 个 9 位的子块前缀计数。任一字之前的 1 的个数 = 一次超级块读 +
/// 一次子块字段提取，再加一次字内 popcount 即得 rank。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank9 {
    /// 超级块与子块宽度（比特），随目录一同序列化
    block_width: usize,
    sub_block_width: usize,
    word_count: usize,
    /// 第 b 个超级块之前的 1 的个数；末尾多一项为总数
    super_counts: Vec<u64>,
    /// 字段 t (1..=7) 位于比特 `9*(t-1)`：超级块内前 t 个字的 1 的个数
    sub_counts: Vec<u64>,
}

impl Rank9 {
    pub fn new(words: &[u64]) -> Self {
        let word_count = words.len();
        let blocks = div_ceil(word_count, BLOCK_WORDS);
        let mut super_counts = Vec::with_capacity(blocks + 1);
        let mut sub_counts = Vec::with_capacity(blocks);
        let mut total = 0u64;
        for b in 0..blocks {
            super_counts.push(total);
            let mut local = 0u64;
            let mut packed = 0u64;
            for t in 0..BLOCK_WORDS {
                if t > 0 {
                    packed |= local << ((t - 1) * 9);
                }
                if let Some(w) = words.get(b * BLOCK_WORDS + t) {
                    local += w.count_ones() as u64;
                }
            }
            // 末尾不足 8 个字时，缺失字段被填成块内总数，select 的 lane 比较依赖这一点
            sub_counts.push(packed);
            total += local;
        }
        super_counts.push(total);
        Self {
            block_width: BLOCK_BITS,
            sub_block_width: SUB_BLOCK_BITS,
            word_count,
            super_counts,
            sub_counts,
        }
    }

    pub fn block_width(&self) -> usize {
        self.block_width
    }

    pub fn sub_block_width(&self) -> usize {
        self.sub_block_width
    }

    #[inline]
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.sub_counts.len()
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.super_counts[self.super_counts.len() - 1]
    }

    /// 第 `b` 个超级块之前的 1 的个数
    #[inline]
    pub fn ones_before_block(&self, b: usize) -> u64 {
        self.super_counts[b]
    }

    #[inline]
    pub fn sub_word(&self, b: usize) -> u64 {
        self.sub_counts[b]
    }

    /// 第 `wi` 个字之前的 1 的个数
    #[inline]
    pub fn ones_before_word(&self, wi: usize) -> u64 {
        let b = wi / BLOCK_WORDS;
        let t = wi % BLOCK_WORDS;
        let base = self.super_counts[b];
        if t == 0 {
            base
        } else {
            base + ((self.sub_counts[b] >> ((t - 1) * 9)) & 0x1FF)
        }
    }

    /// `[0, i)` 中 1 的个数，要求 `i < word_count * 64`
    #[inline]
    pub fn rank_exclusive(&self, words: &[u64], i: usize) -> u64 {
        let wi = i / 64;
        let off = i % 64;
        let partial = if off == 0 {
            0
        } else {
            (words[wi] & ((1u64 << off) - 1)).count_ones() as u64
        };
        self.ones_before_word(wi) + partial
    }

    /// `[0, i]` 中 1 的个数
    #[inline]
    pub fn rank_inclusive(&self, words: &[u64], i: usize) -> u64 {
        let wi = i / 64;
        let off = i % 64;
        let mask = if off == 63 { !0 } else { (1u64 << (off + 1)) - 1 };
        self.ones_before_word(wi) + (words[wi] & mask).count_ones() as u64
    }

    pub fn space_bytes(&self) -> usize {
        (self.super_counts.len() + self.sub_counts.len()) * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_rank(words: &[u64], i: usize) -> u64 {
        (0..i).filter(|&p| (words[p / 64] >> (p % 64)) & 1 == 1).count() as u64
    }

    #[test]
    fn rank_matches_naive_across_blocks() {
        let mut x: u64 = 0x9E37_79B9_7F4A_7C15;
        let words: Vec<u64> = (0..21)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                x
            })
            .collect();
        let r = Rank9::new(&words);
        assert_eq!(r.block_count(), 3);
        for i in 0..words.len() * 64 {
            assert_eq!(r.rank_exclusive(&words, i), naive_rank(&words, i), "pos {i}");
            assert_eq!(r.rank_inclusive(&words, i), naive_rank(&words, i + 1), "pos {i}");
        }
        assert_eq!(r.total(), naive_rank(&words, words.len() * 64));
    }

    #[test]
    fn partial_block_fields_hold_block_total() {
        let words = vec![!0u64, 1, 0];
        let r = Rank9::new(&words);
        let sub = r.sub_word(0);
        assert_eq!(sub & 0x1FF, 64);
        assert_eq!((sub >> 9) & 0x1FF, 65);
        for t in 3..8 {
            assert_eq!((sub >> ((t - 1) * 9)) & 0x1FF, 65);
        }
    }

    #[test]
    fn serialized_layout_leads_with_widths() {
        let r = Rank9::new(&[!0u64, 1, 0, 7]);
        assert_eq!((r.block_width(), r.sub_block_width()), (BLOCK_BITS, SUB_BLOCK_BITS));
        let bytes = bincode::serialize(&r).unwrap();
        let field = |i: usize| u64::from_le_bytes(bytes[i * 8..i * 8 + 8].try_into().unwrap());
        assert_eq!(field(0), 512);
        assert_eq!(field(1), 64);
        assert_eq!(field(2), 4);
        let back: Rank9 = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, r);
        assert_eq!(back.total(), 64 + 1 + 3);
    }
}
