//! FM 索引：差分覆盖、分块后缀排序、构建器与查询层。

pub mod aux;
pub mod builder;
pub mod dc;
pub mod fm;
pub mod params;
pub mod reference;
pub mod sa;

pub use aux::{AuxData, LcpFlag};
pub use builder::{BuildOutput, FMBuilder};
pub use dc::DifferenceCover;
pub use fm::{FMIndex, SearchResult, SpaceReport};
pub use params::{BuildParams, SampleStrategy};
pub use reference::{Contig, IndexMeta, ReferenceIndex};
pub use sa::{validate_suffix_array, SuffixArrayGenerator};
