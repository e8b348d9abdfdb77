use serde::{Deserialize, Serialize};

use crate::succinct::bitvector::{Bitvector, RankSelect};
use crate::succinct::sequence::SymbolSequence;

/// 小波矩阵：每层按当前比特稳定划分（0 在前），每层一条位向量加该层 0 的个数。
/// access / rank 都是 `bits` 次位向量 rank。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveletMatrix {
    len: usize,
    bits: u32,
    levels: Vec<Bitvector>,
    zeros: Vec<usize>,
}

impl WaveletMatrix {
    pub fn new(symbols: &[u8], bits: u32) -> Self {
        let mut cur = symbols.to_vec();
        let mut levels = Vec::with_capacity(bits as usize);
        let mut zeros = Vec::with_capacity(bits as usize);
        for l in 0..bits {
            let shift = bits - 1 - l;
            let bv = Bitvector::from_bits(cur.iter().map(|&c| (c >> shift) & 1 == 1));
            zeros.push(bv.count_zeros());
            levels.push(bv);
            let (mut lo, hi): (Vec<u8>, Vec<u8>) =
                cur.iter().partition(|&&c| (c >> shift) & 1 == 0);
            lo.extend(hi);
            cur = lo;
        }
        Self {
            len: symbols.len(),
            bits,
            levels,
            zeros,
        }
    }
}

impl SymbolSequence for WaveletMatrix {
    fn len(&self) -> usize {
        self.len
    }

    fn access(&self, mut i: usize) -> u8 {
        let mut c = 0u8;
        for (bv, &z) in self.levels.iter().zip(&self.zeros) {
            if bv.access(i) {
                c = (c << 1) | 1;
                i = z + bv.rank1(i, false);
            } else {
                c <<= 1;
                i = bv.rank0(i, false);
            }
        }
        c
    }

    fn rank(&self, c: u8, i: usize) -> usize {
        if self.bits < 8 && c >> self.bits != 0 {
            return 0;
        }
        let mut start = 0;
        let mut end = i.min(self.len);
        for (l, (bv, &z)) in self.levels.iter().zip(&self.zeros).enumerate() {
            let shift = self.bits - 1 - l as u32;
            if (c >> shift) & 1 == 1 {
                start = z + bv.rank1(start, false);
                end = z + bv.rank1(end, false);
            } else {
                start = bv.rank0(start, false);
                end = bv.rank0(end, false);
            }
        }
        end - start
    }

    fn space_bytes(&self) -> usize {
        self.levels.iter().map(Bitvector::space_bytes).sum::<usize>() + self.zeros.len() * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::succinct::sequence::test_support::*;

    #[test]
    fn wavelet_matches_naive() {
        let symbols = runny_symbols(2_000, 20, 11);
        let wm = WaveletMatrix::new(&symbols, 5);
        check_against_naive(&wm, &symbols, 20);
        // 编码范围内但未出现的符号
        assert_eq!(wm.rank(31, 2_000), 0);
    }

    #[test]
    fn single_level() {
        let symbols = [1u8, 0, 1, 1, 0];
        let wm = WaveletMatrix::new(&symbols, 1);
        assert_eq!(wm.rank(1, 4), 3);
        assert_eq!(wm.rank(0, 5), 2);
        assert_eq!(wm.access(4), 0);
        assert_eq!(wm.rank(2, 5), 0);
    }
}
