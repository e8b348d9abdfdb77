use serde::{Deserialize, Serialize};

use crate::succinct::bitvector::RankSelect;
use crate::succinct::sparse::SparseBitvector;

/// 游程编码位向量：记录每段 1 的起点（稀疏位向量）与 1 的累计个数
/// （同样用稀疏位向量存前缀和），适合 1 成片出现的情形。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLengthBitvector {
    len: usize,
    ones: usize,
    /// 每段 1 的起始位置
    run_starts: SparseBitvector,
    /// 第 t 段结束时的累计 1 个数减一（在 `[0, ones)` 上置位）
    run_ends: SparseBitvector,
}

impl RunLengthBitvector {
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut starts = Vec::new();
        let mut ends = Vec::new();
        let mut ones = 0usize;
        let mut len = 0usize;
        let mut prev = false;
        for b in bits {
            if b {
                if !prev {
                    starts.push(len);
                }
                ones += 1;
            } else if prev {
                ends.push(ones - 1);
            }
            prev = b;
            len += 1;
        }
        if prev {
            ends.push(ones - 1);
        }
        Self {
            len,
            ones,
            run_starts: SparseBitvector::from_sorted(&starts, len),
            run_ends: SparseBitvector::from_sorted(&ends, ones),
        }
    }

    pub fn run_count(&self) -> usize {
        self.run_starts.count_ones()
    }

    /// 第 t 段（0 起）之前的 1 的个数
    fn ones_before_run(&self, t: usize) -> usize {
        if t == 0 {
            0
        } else {
            self.run_ends.select1(t).map_or(self.ones, |e| e + 1)
        }
    }

    fn rank_before(&self, p: usize) -> usize {
        let t = self.run_starts.rank1(p, false);
        if t == 0 {
            return 0;
        }
        let start = self.run_starts.select1(t).unwrap_or(0);
        let before = self.ones_before_run(t - 1);
        let run_len = self.ones_before_run(t) - before;
        before + (p - start).min(run_len)
    }

    pub fn space_bytes(&self) -> usize {
        self.run_starts.space_bytes() + self.run_ends.space_bytes()
    }
}

impl RankSelect for RunLengthBitvector {
    fn len(&self) -> usize {
        self.len
    }

    fn count_ones(&self) -> usize {
        self.ones
    }

    fn access(&self, i: usize) -> bool {
        assert!(i < self.len, "bit {} out of bounds ({})", i, self.len);
        self.rank_before(i + 1) > self.rank_before(i)
    }

    fn rank1(&self, i: usize, inclusive: bool) -> usize {
        if i >= self.len {
            return self.ones;
        }
        self.rank_before(if inclusive { i + 1 } else { i })
    }

    fn select1(&self, k: usize) -> Option<usize> {
        if k == 0 || k > self.ones {
            return None;
        }
        // 包含第 k 个 1 的段 = 结束于 k-1 之前的段数
        let t = self.run_ends.rank1(k - 1, false);
        let start = self.run_starts.select1(t + 1)?;
        Some(start + (k - 1 - self.ones_before_run(t)))
    }
}
