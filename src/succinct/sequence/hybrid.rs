use serde::{Deserialize, Serialize};

use crate::succinct::bitvector::{Bitvector, RankSelect};
use crate::succinct::sequence::{count_runs, RunLengthSequence, SymbolSequence, WaveletMatrix};
use crate::util::bits::{div_ceil, log2_ceil};

/// 游程块的最小平均游程长度
const MIN_AVG_RUN: usize = 6;
/// 只用前这么多个符号估计块长
const INFER_PREFIX: usize = 1 << 20;

/// 混合序列：按块统计游程数，平均游程足够长的块进入游程编码部分，
/// 其余块进入小波矩阵部分。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSequence {
    len: usize,
    block: usize,
    use_runs: Bitvector,
    plain: WaveletMatrix,
    runs: RunLengthSequence,
}

fn prefers_runs(chunk: &[u8]) -> bool {
    chunk.len() / count_runs(chunk) >= MIN_AVG_RUN
}

/// 估算以块长 b 编码的比特数
fn estimate_space(symbols: &[u8], b: usize, bits: usize) -> usize {
    let n = symbols.len();
    let mut run_len = 0;
    let mut run_cnt = 0;
    let mut last: Option<u8> = None;
    for chunk in symbols.chunks(b) {
        if prefers_runs(chunk) {
            // 与上一游程块首尾相接时合并
            let merged = usize::from(last == Some(chunk[0]));
            run_cnt += count_runs(chunk) - merged;
            run_len += chunk.len();
            last = chunk.last().copied();
        }
    }
    let mut space = div_ceil(n, b) + bits * (n - run_len);
    if run_cnt > 0 {
        space += run_cnt * log2_ceil(n / run_cnt) as usize
            + bits * run_cnt
            + run_cnt * log2_ceil(n * 4 / run_cnt) as usize;
    }
    space
}

fn choose_block_size(symbols: &[u8], bits: usize) -> usize {
    let prefix = &symbols[..symbols.len().min(INFER_PREFIX)];
    let m = prefix.len();
    let mut best = (usize::MAX, 4);
    let mut b = 4;
    while b <= m {
        let s = estimate_space(prefix, b, bits);
        if s < best.0 {
            best = (s, b);
        }
        b *= 2;
    }
    let mid = best.1 / 2 * 3;
    if mid <= m && estimate_space(prefix, mid, bits) < best.0 {
        best.1 = mid;
    }
    best.1
}

impl HybridSequence {
    pub fn new(symbols: &[u8], alphabet_size: usize) -> Self {
        let bits = log2_ceil(alphabet_size).max(1) as usize;
        let block = choose_block_size(symbols, bits);
        Self::with_block_size(symbols, alphabet_size, block)
    }

    pub fn with_block_size(symbols: &[u8], alphabet_size: usize, block: usize) -> Self {
        let bits = log2_ceil(alphabet_size).max(1);
        let mut flags = Vec::with_capacity(div_ceil(symbols.len(), block));
        let mut plain = Vec::new();
        let mut runs = Vec::new();
        for chunk in symbols.chunks(block) {
            let rl = prefers_runs(chunk);
            flags.push(rl);
            if rl {
                runs.extend_from_slice(chunk);
            } else {
                plain.extend_from_slice(chunk);
            }
        }
        Self {
            len: symbols.len(),
            block,
            use_runs: Bitvector::from_bits(flags),
            plain: WaveletMatrix::new(&plain, bits),
            runs: RunLengthSequence::new(&runs, alphabet_size),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block
    }
}

impl SymbolSequence for HybridSequence {
    fn len(&self) -> usize {
        self.len
    }

    fn access(&self, i: usize) -> u8 {
        let bi = i / self.block;
        let rl_before = self.use_runs.rank1(bi, false);
        let off = i % self.block;
        if self.use_runs.access(bi) {
            self.runs.access(rl_before * self.block + off)
        } else {
            self.plain.access((bi - rl_before) * self.block + off)
        }
    }

    fn rank(&self, c: u8, i: usize) -> usize {
        let i = i.min(self.len);
        let bi = i / self.block;
        let rem = i % self.block;
        let rl_before = self.use_runs.rank1(bi, false);
        let mut rl_end = rl_before * self.block;
        let mut plain_end = (bi - rl_before) * self.block;
        if rem > 0 {
            if self.use_runs.access(bi) {
                rl_end += rem;
            } else {
                plain_end += rem;
            }
        }
        self.plain.rank(c, plain_end) + self.runs.rank(c, rl_end)
    }

    fn space_bytes(&self) -> usize {
        self.use_runs.space_bytes() + self.plain.space_bytes() + self.runs.space_bytes()
    }
}
