use serde::{Deserialize, Serialize};

use crate::succinct::bitvector::{Bitvector, RankSelect};
use crate::succinct::sequence::{SymbolSequence, WaveletMatrix};
use crate::util::bits::{div_ceil, log2_ceil};

const CANDIDATE_BLOCKS: [usize; 5] = [4, 8, 16, 32, 64];

/// 定长分块序列：整块都是同一符号的 "游程块" 折叠成一个符号，其余块
/// 依次拼接进小波矩阵。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBlockSequence {
    len: usize,
    block: usize,
    is_run: Bitvector,
    run_symbols: WaveletMatrix,
    rest: WaveletMatrix,
}

fn is_run_block(chunk: &[u8]) -> bool {
    chunk.iter().all(|&c| c == chunk[0])
}

/// 在候选块长中选估算空间（比特）最小的一个
fn choose_block_size(symbols: &[u8], bits: usize) -> usize {
    let mut best = (usize::MAX, CANDIDATE_BLOCKS[0]);
    for &b in &CANDIDATE_BLOCKS {
        let (mut runs, mut run_len) = (0, 0);
        for chunk in symbols.chunks(b).filter(|c| is_run_block(c)) {
            runs += 1;
            run_len += chunk.len();
        }
        let space = div_ceil(symbols.len(), b) + (runs + symbols.len() - run_len) * bits;
        if space < best.0 {
            best = (space, b);
        }
    }
    best.1
}

impl RunBlockSequence {
    pub fn new(symbols: &[u8], alphabet_size: usize) -> Self {
        let bits = log2_ceil(alphabet_size).max(1);
        let block = choose_block_size(symbols, bits as usize);
        Self::with_block_size(symbols, alphabet_size, block)
    }

    pub fn with_block_size(symbols: &[u8], alphabet_size: usize, block: usize) -> Self {
        let bits = log2_ceil(alphabet_size).max(1);
        let mut flags = Vec::with_capacity(div_ceil(symbols.len(), block));
        let mut run_symbols = Vec::new();
        let mut rest = Vec::new();
        for chunk in symbols.chunks(block) {
            let run = is_run_block(chunk);
            flags.push(run);
            if run {
                run_symbols.push(chunk[0]);
            } else {
                rest.extend_from_slice(chunk);
            }
        }
        Self {
            len: symbols.len(),
            block,
            is_run: Bitvector::from_bits(flags),
            run_symbols: WaveletMatrix::new(&run_symbols, bits),
            rest: WaveletMatrix::new(&rest, bits),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block
    }

    pub fn run_block_count(&self) -> usize {
        self.is_run.count_ones()
    }
}

impl SymbolSequence for RunBlockSequence {
    fn len(&self) -> usize {
        self.len
    }

    fn access(&self, i: usize) -> u8 {
        let bi = i / self.block;
        let runs_before = self.is_run.rank1(bi, false);
        if self.is_run.access(bi) {
            self.run_symbols.access(runs_before)
        } else {
            self.rest.access((bi - runs_before) * self.block + i % self.block)
        }
    }

    fn rank(&self, c: u8, i: usize) -> usize {
        let i = i.min(self.len);
        let bi = i / self.block;
        let rem = i % self.block;
        let runs_before = self.is_run.rank1(bi, false);
        let rest_before = (bi - runs_before) * self.block;
        let mut count = self.run_symbols.rank(c, runs_before) * self.block;
        if rem > 0 && self.is_run.access(bi) {
            if self.run_symbols.access(runs_before) == c {
                count += rem;
            }
            count + self.rest.rank(c, rest_before)
        } else {
            count + self.rest.rank(c, rest_before + rem)
        }
    }

    fn space_bytes(&self) -> usize {
        self.is_run.space_bytes() + self.run_symbols.space_bytes() + self.rest.space_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::succinct::sequence::test_support::*;

    #[test]
    fn run_block_matches_naive() {
        let symbols = runny_symbols(2_000, 4, 17);
        for b in [4, 7, 16] {
            let seq = RunBlockSequence::with_block_size(&symbols, 4, b);
            check_against_naive(&seq, &symbols, 4);
        }
        let auto = RunBlockSequence::new(&symbols, 4);
        assert!(CANDIDATE_BLOCKS.contains(&auto.block_size()));
        check_against_naive(&auto, &symbols, 4);
    }

    #[test]
    fn collapses_uniform_blocks() {
        let symbols = [1u8, 1, 1, 1, 0, 2, 0, 2, 3, 3];
        let seq = RunBlockSequence::with_block_size(&symbols, 4, 4);
        // 末尾的 [3, 3] 也是游程块
        assert_eq!(seq.run_block_count(), 2);
        assert_eq!(seq.rank(3, 10), 2);
        assert_eq!(seq.rank(1, 3), 3);
        assert_eq!(seq.access(9), 3);
    }
}
