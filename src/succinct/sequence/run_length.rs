use serde::{Deserialize, Serialize};

use crate::succinct::bitvector::{BitBuffer, Bitvector, RankSelect};
use crate::succinct::sequence::{SymbolSequence, WaveletMatrix};
use crate::succinct::sparse::SparseBitvector;
use crate::util::bits::log2_ceil;

/// 游程编码序列：游程起点位向量 + 游程符号（小波矩阵）+ 每个符号的
/// 游程长度前缀和（稀疏位向量）。BWT 重复度高时空间随游程数而非长度增长。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLengthSequence {
    len: usize,
    run_heads: Bitvector,
    run_symbols: WaveletMatrix,
    /// `run_sums[c]` 在 "第 t 个 c 游程结束时 c 的累计个数 - 1" 处置位
    run_sums: Vec<SparseBitvector>,
}

impl RunLengthSequence {
    pub fn new(symbols: &[u8], alphabet_size: usize) -> Self {
        let mut heads = BitBuffer::zeroed(symbols.len());
        let mut run_symbols = Vec::new();
        let mut ends: Vec<Vec<usize>> = vec![Vec::new(); alphabet_size];
        let mut totals = vec![0usize; alphabet_size];
        let mut i = 0;
        while i < symbols.len() {
            let c = symbols[i];
            let mut j = i + 1;
            while j < symbols.len() && symbols[j] == c {
                j += 1;
            }
            heads.set(i);
            run_symbols.push(c);
            totals[c as usize] += j - i;
            ends[c as usize].push(totals[c as usize] - 1);
            i = j;
        }
        let run_sums = ends
            .iter()
            .zip(&totals)
            .map(|(e, &t)| SparseBitvector::from_sorted(e, t))
            .collect();
        Self {
            len: symbols.len(),
            run_heads: heads.freeze(),
            run_symbols: WaveletMatrix::new(&run_symbols, log2_ceil(alphabet_size).max(1)),
            run_sums,
        }
    }

    pub fn run_count(&self) -> usize {
        self.run_symbols.len()
    }

    /// 符号 c 在前 `k` 个 c 游程中出现的总次数
    fn run_total(&self, c: usize, k: usize) -> usize {
        if k == 0 {
            0
        } else {
            self.run_sums[c].select1(k).map_or(0, |e| e + 1)
        }
    }
}

impl SymbolSequence for RunLengthSequence {
    fn len(&self) -> usize {
        self.len
    }

    fn access(&self, i: usize) -> u8 {
        let r = self.run_heads.rank1(i, true) - 1;
        self.run_symbols.access(r)
    }

    fn rank(&self, c: u8, i: usize) -> usize {
        if i == 0 || c as usize >= self.run_sums.len() {
            return 0;
        }
        let i = i.min(self.len);
        // 包含位置 i-1 的游程
        let r = self.run_heads.rank1(i - 1, true) - 1;
        let start = self.run_heads.select1(r + 1).unwrap_or(0);
        let before = self.run_symbols.rank(c, r);
        let base = self.run_total(c as usize, before);
        if self.run_symbols.access(r) == c {
            base + (i - start)
        } else {
            base
        }
    }

    fn space_bytes(&self) -> usize {
        self.run_heads.space_bytes()
            + self.run_symbols.space_bytes()
            + self.run_sums.iter().map(SparseBitvector::space_bytes).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::succinct::sequence::count_runs;
    use crate::succinct::sequence::test_support::*;

    #[test]
    fn run_length_matches_naive() {
        let symbols = runny_symbols(2_500, 4, 5);
        let seq = RunLengthSequence::new(&symbols, 4);
        assert_eq!(seq.run_count(), count_runs(&symbols));
        check_against_naive(&seq, &symbols, 4);
    }

    #[test]
    fn unused_symbol_has_empty_sums() {
        let symbols = [0u8, 0, 2, 2, 2, 0];
        let seq = RunLengthSequence::new(&symbols, 4);
        assert_eq!(seq.rank(1, 6), 0);
        assert_eq!(seq.rank(2, 4), 2);
        assert_eq!(seq.rank(0, 6), 3);
        assert_eq!(seq.access(5), 0);
    }
}
