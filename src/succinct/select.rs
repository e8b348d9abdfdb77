use serde::{Deserialize, Serialize};

use crate::succinct::rank::{Rank9, BLOCK_BITS, BLOCK_WORDS};
use crate::util::bits::{lanes9_le, log2_ceil, select_in_word, L9};

/// 每隔多少个 1 采样一次位置
const SAMPLE_ONES: usize = 4096;
/// 短块内每隔多少个 1 记一次相对偏移
const MINI_ONES: usize = 256;

/// 一个采样块的编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum BlockSlot {
    /// 跨度大、1 稀疏：块内其余 1 的位置全部显式存储，起点为 `explicit` 下标
    Sparse(usize),
    /// 跨度小：只存 mini 块偏移，查询时借助 Rank9 二分 + 字内 select
    Dense(usize),
}

/// 两级采样的 select1 支持结构，依附于同一份位数据与 Rank9 目录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Select1 {
    sample_ones: usize,
    mini_ones: usize,
    ones: usize,
    /// 第 j*sample_ones 个（0 起）1 的位置；末尾为位长度
    samples: Vec<usize>,
    slots: Vec<BlockSlot>,
    explicit: Vec<usize>,
    mini: Vec<u32>,
}

impl Select1 {
    pub fn new(words: &[u64], len: usize) -> Self {
        let l = log2_ceil(len) as usize;
        let long_span = (l * l * l * l).max(SAMPLE_ONES);
        Self::with_sampling(words, len, SAMPLE_ONES, MINI_ONES, long_span)
    }

    pub(crate) fn with_sampling(
        words: &[u64],
        len: usize,
        sample_ones: usize,
        mini_ones: usize,
        long_span: usize,
    ) -> Self {
        debug_assert!(sample_ones % mini_ones == 0);
        let mut s = Self {
            sample_ones,
            mini_ones,
            ones: 0,
            samples: Vec::new(),
            slots: Vec::new(),
            explicit: Vec::new(),
            mini: Vec::new(),
        };
        let mut block: Vec<usize> = Vec::with_capacity(sample_ones);
        for (wi, &w) in words.iter().enumerate() {
            let mut x = w;
            while x != 0 {
                let pos = wi * 64 + x.trailing_zeros() as usize;
                if pos >= len {
                    break;
                }
                x &= x - 1;
                if block.len() == sample_ones {
                    s.flush_block(&block, pos, long_span);
                    block.clear();
                }
                block.push(pos);
                s.ones += 1;
            }
        }
        if !block.is_empty() {
            s.flush_block(&block, len, long_span);
        }
        s.samples.push(len);
        s
    }

    fn flush_block(&mut self, block: &[usize], next: usize, long_span: usize) {
        let start = block[0];
        self.samples.push(start);
        if next - start >= long_span {
            self.slots.push(BlockSlot::Sparse(self.explicit.len()));
            self.explicit.extend_from_slice(&block[1..]);
        } else {
            self.slots.push(BlockSlot::Dense(self.mini.len()));
            for p in block.iter().step_by(self.mini_ones) {
                self.mini.push((p - start) as u32);
            }
        }
    }

    #[inline]
    pub fn ones(&self) -> usize {
        self.ones
    }

    /// 第 k 个（1 起）1 的位置；k 为 0 或超过 1 的总数时为 `None`
    pub fn select(&self, words: &[u64], rank: &Rank9, k: usize) -> Option<usize> {
        if k == 0 || k > self.ones {
            return None;
        }
        let r = k - 1;
        let j = r / self.sample_ones;
        let within = r % self.sample_ones;
        let start = self.samples[j];
        if within == 0 {
            return Some(start);
        }
        let at = match self.slots[j] {
            BlockSlot::Sparse(at) => return Some(self.explicit[at + within - 1]),
            BlockSlot::Dense(at) => at,
        };
        let mi = within / self.mini_ones;
        let lo = start + self.mini[at + mi] as usize;
        if within % self.mini_ones == 0 {
            return Some(lo);
        }
        let block_ones = (self.ones - j * self.sample_ones).min(self.sample_ones);
        let hi = if (mi + 1) * self.mini_ones < block_ones {
            start + self.mini[at + mi + 1] as usize
        } else {
            self.samples[j + 1]
        };

        // 目标位于 [lo, hi)：在超级块上二分，找最后一个之前 1 数 < k 的块
        let mut bl = lo / BLOCK_BITS;
        let mut bh = (hi - 1) / BLOCK_BITS;
        while bl < bh {
            let mid = (bl + bh + 1) / 2;
            if (rank.ones_before_block(mid) as usize) < k {
                bl = mid;
            } else {
                bh = mid - 1;
            }
        }
        let rest = (r - rank.ones_before_block(bl) as usize) as u64;
        let flags = lanes9_le(rank.sub_word(bl), rest * L9);
        let place = (((flags >> 8).wrapping_mul(L9) >> 54) & 7) as usize;
        let wi = bl * BLOCK_WORDS + place;
        let in_word = r - rank.ones_before_word(wi) as usize;
        Some(wi * 64 + select_in_word(words[wi], in_word as u32) as usize)
    }

    pub fn space_bytes(&self) -> usize {
        (self.samples.len() + self.explicit.len()) * 8
            + self.slots.len() * 16
            + self.mini.len() * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::bits::{bit_set, words_for_bits};

    fn build(positions: &[usize], len: usize) -> Vec<u64> {
        let mut words = vec![0u64; words_for_bits(len)];
        for &p in positions {
            bit_set(&mut words, p);
        }
        words
    }

    fn check_all(words: &[u64], positions: &[usize], sel: &Select1) {
        let rank = Rank9::new(words);
        for (i, &p) in positions.iter().enumerate() {
            assert_eq!(sel.select(words, &rank, i + 1), Some(p), "k = {}", i + 1);
        }
        assert_eq!(sel.select(words, &rank, 0), None);
        assert_eq!(sel.select(words, &rank, positions.len() + 1), None);
    }

    #[test]
    fn dense_blocks_use_broadword_search() {
        let len = 50_000;
        let positions: Vec<usize> = (0..len).filter(|i| i % 3 == 0 || i % 7 == 1).collect();
        let words = build(&positions, len);
        let sel = Select1::with_sampling(&words, len, 64, 8, usize::MAX);
        check_all(&words, &positions, &sel);
        let default = Select1::new(&words, len);
        check_all(&words, &positions, &default);
    }

    #[test]
    fn sparse_blocks_store_positions() {
        let len = 200_000;
        let positions: Vec<usize> = (0..len).filter(|i| i % 997 == 5).collect();
        let words = build(&positions, len);
        let sel = Select1::with_sampling(&words, len, 16, 4, 1000);
        assert!(sel.slots.iter().any(|s| matches!(s, BlockSlot::Sparse(_))));
        check_all(&words, &positions, &sel);
    }

    #[test]
    fn full_block_of_ones() {
        let len = 4096;
        let positions: Vec<usize> = (0..len).collect();
        let words = build(&positions, len);
        let sel = Select1::with_sampling(&words, len, 1024, 512, usize::MAX);
        check_all(&words, &positions, &sel);
    }

    #[test]
    fn empty_bitvector() {
        let words = vec![0u64; 4];
        let sel = Select1::new(&words, 256);
        let rank = Rank9::new(&words);
        assert_eq!(sel.ones(), 0);
        assert_eq!(sel.select(&words, &rank, 1), None);
    }
}
