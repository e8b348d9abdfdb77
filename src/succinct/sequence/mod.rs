//! BWT 序列的几种编码。所有编码都实现 [`SymbolSequence`]，查询层只依赖
//! 这一约定；具体编码在构建时选定一次，以 [`BwtSequence`] 枚举保存。

pub mod hybrid;
pub mod plain;
pub mod run_block;
pub mod run_length;
pub mod wavelet;

use serde::{Deserialize, Serialize};

use crate::succinct::packed::PackedSymbolArray;

pub use hybrid::HybridSequence;
pub use plain::PlainSequence;
pub use run_block::RunBlockSequence;
pub use run_length::RunLengthSequence;
pub use wavelet::WaveletMatrix;

/// 支持 access / rank 的符号序列。符号为 `[0, alphabet_size)` 内的编码。
pub trait SymbolSequence {
    fn len(&self) -> usize;

    fn access(&self, i: usize) -> u8;

    /// `[0, i)` 中符号 `c` 的个数；`i` 可以等于 `len()`
    fn rank(&self, c: u8, i: usize) -> usize;

    fn space_bytes(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// BWT 的存储方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum BwtEncoding {
    /// 每个符号一条位向量
    Plain,
    /// 小波矩阵
    Wavelet,
    /// 整体游程编码
    RunLength,
    /// 定长分块，单一符号块折叠
    #[default]
    RunBlock,
    /// 分块，按游程密度在游程编码与小波矩阵之间切换
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BwtSequence {
    Plain(PlainSequence),
    Wavelet(WaveletMatrix),
    RunLength(Box<RunLengthSequence>),
    RunBlock(Box<RunBlockSequence>),
    Hybrid(Box<HybridSequence>),
}

impl BwtSequence {
    pub fn build(encoding: BwtEncoding, bwt: &PackedSymbolArray, alphabet_size: usize) -> Self {
        let symbols = bwt.to_codes();
        match encoding {
            BwtEncoding::Plain => Self::Plain(PlainSequence::new(&symbols, alphabet_size)),
            BwtEncoding::Wavelet => Self::Wavelet(WaveletMatrix::new(&symbols, bwt.width())),
            BwtEncoding::RunLength => {
                Self::RunLength(Box::new(RunLengthSequence::new(&symbols, alphabet_size)))
            }
            BwtEncoding::RunBlock => {
                Self::RunBlock(Box::new(RunBlockSequence::new(&symbols, alphabet_size)))
            }
            BwtEncoding::Hybrid => {
                Self::Hybrid(Box::new(HybridSequence::new(&symbols, alphabet_size)))
            }
        }
    }

    pub fn encoding(&self) -> BwtEncoding {
        match self {
            Self::Plain(_) => BwtEncoding::Plain,
            Self::Wavelet(_) => BwtEncoding::Wavelet,
            Self::RunLength(_) => BwtEncoding::RunLength,
            Self::RunBlock(_) => BwtEncoding::RunBlock,
            Self::Hybrid(_) => BwtEncoding::Hybrid,
        }
    }

    fn inner(&self) -> &dyn SymbolSequence {
        match self {
            Self::Plain(s) => s,
            Self::Wavelet(s) => s,
            Self::RunLength(s) => s.as_ref(),
            Self::RunBlock(s) => s.as_ref(),
            Self::Hybrid(s) => s.as_ref(),
        }
    }
}

impl SymbolSequence for BwtSequence {
    #[inline]
    fn len(&self) -> usize {
        self.inner().len()
    }

    #[inline]
    fn access(&self, i: usize) -> u8 {
        self.inner().access(i)
    }

    #[inline]
    fn rank(&self, c: u8, i: usize) -> usize {
        self.inner().rank(c, i)
    }

    fn space_bytes(&self) -> usize {
        self.inner().space_bytes()
    }
}

/// 相邻符号不同的次数 + 1，即游程个数
pub(crate) fn count_runs(symbols: &[u8]) -> usize {
    if symbols.is_empty() {
        return 0;
    }
    1 + symbols.windows(2).filter(|w| w[0] != w[1]).count()
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn every_encoding_agrees() {
        let symbols = runny_symbols(3_000, 4, 99);
        let packed = PackedSymbolArray::from_codes(2, &symbols);
        for enc in [
            BwtEncoding::Plain,
            BwtEncoding::Wavelet,
            BwtEncoding::RunLength,
            BwtEncoding::RunBlock,
            BwtEncoding::Hybrid,
        ] {
            let seq = BwtSequence::build(enc, &packed, 4);
            assert_eq!(seq.encoding(), enc);
            check_against_naive(&seq, &symbols, 4);
        }
    }

    #[test]
    fn run_counting() {
        assert_eq!(count_runs(&[]), 0);
        assert_eq!(count_runs(&[1, 1, 2, 2, 2, 1]), 3);
    }
}
