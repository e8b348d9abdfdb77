use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, BuildResult};
use crate::index::dc::DifferenceCover;
use crate::succinct::sequence::BwtEncoding;
use crate::util::bits::{div_ceil, log2_ceil};
use crate::util::size::format_size;

/// 前缀区间表最多占用的编码位数（表项数 = 2^bits）
pub const MAX_PRECOMPUTE_BITS: usize = 24;

/// 采样 SA 的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum SampleStrategy {
    /// 每隔 r 个 BWT 行采样一次
    #[default]
    Row,
    /// 每隔 r 个文本位置采样一次（LF 步数严格小于 r）
    Text,
}

/// 构建参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParams {
    pub threads: usize,
    /// 每个后缀块的目标大小（后缀个数）
    pub sa_block_size: usize,
    /// 差分覆盖周期
    pub dc_period: usize,
    pub sample_rate: usize,
    pub sample_strategy: SampleStrategy,
    /// 前缀区间表的前缀长度，0 表示不建表
    pub precompute_width: usize,
    /// 大于 0 时记录相邻行 LCP 与该阈值的关系
    pub max_lcp: usize,
    /// selected SA 过滤位图的行间隔
    pub selected_filter_rate: usize,
    /// 设置后按内存上限推断块大小与覆盖周期
    pub memory_limit: Option<usize>,
    pub encoding: BwtEncoding,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            threads: 1,
            sa_block_size: 1 << 24,
            dc_period: 4096,
            sample_rate: 32,
            sample_strategy: SampleStrategy::Row,
            precompute_width: 10,
            max_lcp: 0,
            selected_filter_rate: 1024,
            memory_limit: None,
            encoding: BwtEncoding::RunBlock,
        }
    }
}

fn positive(name: &'static str, value: usize) -> BuildResult<()> {
    if value == 0 {
        Err(BuildError::InvalidParameter {
            name,
            reason: "must be greater than 0".to_string(),
        })
    } else {
        Ok(())
    }
}

impl BuildParams {
    pub fn validate(&self) -> BuildResult<()> {
        positive("threads", self.threads)?;
        positive("sa_block_size", self.sa_block_size)?;
        positive("sample_rate", self.sample_rate)?;
        positive("selected_filter_rate", self.selected_filter_rate)?;
        positive("dc_period", self.dc_period)?;
        Ok(())
    }

    /// 受表大小上限约束后实际使用的前缀长度
    pub fn effective_precompute_width(&self, alphabet_bits: u32) -> usize {
        let cap = MAX_PRECOMPUTE_BITS / alphabet_bits.max(1) as usize;
        if self.precompute_width > cap {
            warn!(
                "precompute width {} exceeds the table limit for {}-bit symbols, using {}",
                self.precompute_width, alphabet_bits, cap
            );
            cap
        } else {
            self.precompute_width
        }
    }

    /// 在内存上限内搜索（覆盖周期, 块大小），使估算构建时间最小。
    ///
    /// 文本与 BWT 本身放不下、或任何组合都超限时返回 `MemoryBudget`。
    pub fn infer_for_memory(&mut self, n: usize, alphabet_size: usize, memory: usize) -> BuildResult<()> {
        let bits = log2_ceil(alphabet_size).max(1) as usize;
        let base = div_ceil(2 * n * bits, 8);
        if base > memory {
            return Err(BuildError::MemoryBudget {
                required: base,
                available: memory,
            });
        }
        let avail = memory - base;
        let width = self.effective_precompute_width(bits as u32);
        let table = if width > 0 { 1usize << (bits * width) } else { 0 };
        let log_n = log2_ceil(n).max(1) as f64;

        let mut best: Option<(f64, usize, usize)> = None;
        let mut smallest = usize::MAX;
        let mut dcv = 512;
        while dcv <= 8192 {
            let dc_size = DifferenceCover::new(dcv).size_for(n);
            for log_block in 10..=50 {
                let block = 1usize << log_block;
                let chunks = div_ceil(n, block);
                let words = 2 * self.threads * block
                    + dc_size
                    + chunks * dcv
                    + div_ceil(n, self.sample_rate)
                    + table * 2;
                let space = words * 8;
                smallest = smallest.min(space);
                if space > avail {
                    // 仅块缓冲就已超限
                    if 16 * self.threads * block > avail {
                        break;
                    }
                    continue;
                }
                let iters = div_ceil(n, self.threads * block) as f64;
                let b = block.min(n.max(1)) as f64;
                let time = dc_size as f64 * log_n
                    + iters * n as f64 * dcv as f64
                    + iters * (b * b.log2().max(1.0) + dcv as f64 * b);
                if best.map_or(true, |(t, _, _)| time < t) {
                    best = Some((time, dcv, block));
                }
                if block >= n {
                    break;
                }
            }
            dcv *= 2;
        }

        match best {
            Some((_, dcv, block)) => {
                info!(
                    "memory limit {}: using dc period {} and SA block size {}",
                    format_size(memory),
                    dcv,
                    block
                );
                self.dc_period = dcv;
                self.sa_block_size = block;
                Ok(())
            }
            None => Err(BuildError::MemoryBudget {
                required: base + smallest,
                available: memory,
            }),
        }
    }
}
