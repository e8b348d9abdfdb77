//! # compact-fm
//!
//! 面向 DNA / 蛋白质文本的压缩 FM 索引。
//!
//! - **紧凑结构**：定宽打包数组、Rank9 + 两级采样 select 位向量、稀疏与游程位向量
//! - **后缀排序**：差分覆盖采样 + 多键快排，按块并行生成后缀数组，不整体驻留内存
//! - **BWT 编码**：plain / 小波矩阵 / 游程 / 分块游程 / 混合，构建时选定
//! - **查询**：LF 映射、反向搜索（前缀表加速）、采样 SA 定位、文本还原
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use compact_fm::index::{BuildParams, FMIndex};
//! use compact_fm::succinct::PackedSymbolArray;
//! use compact_fm::util::alphabet::Alphabet;
//!
//! let alphabet = Alphabet::dna();
//! let codes = alphabet.encode_all(b"ACGTACGTACGT").unwrap();
//! let text = PackedSymbolArray::from_codes(alphabet.bits(), &codes);
//! let fm = FMIndex::build(&text, &alphabet, BuildParams::default(), &[]).unwrap();
//!
//! let hit = fm.backward_search(b"ACGT");
//! println!("{} occurrences at {:?}", hit.range.len(), fm.locate_range(hit.range.clone()));
//! ```
//!
//! ## 模块说明
//!
//! - [`succinct`] — 打包数组、位向量、BWT 序列编码
//! - [`index`] — 差分覆盖、后缀数组生成、构建器、FM 索引、落盘格式
//! - [`io`] — FASTA 解析与文本拼接
//! - [`util`] — 字母表、位运算、大小解析

pub mod error;
pub mod index;
pub mod io;
pub mod succinct;
pub mod util;

pub use error::{BuildError, BuildResult};
