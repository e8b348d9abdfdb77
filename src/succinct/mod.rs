//! 紧凑数据结构：定宽打包数组、rank/select 位向量族、BWT 序列编码。

pub mod bitvector;
pub mod packed;
pub mod rank;
pub mod run_length;
pub mod select;
pub mod sequence;
pub mod sparse;

pub use bitvector::{BitBuffer, Bitvector, RankSelect};
pub use packed::PackedSymbolArray;
pub use run_length::RunLengthBitvector;
pub use sequence::{BwtEncoding, BwtSequence, SymbolSequence};
pub use sparse::SparseBitvector;
