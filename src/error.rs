/// 索引构建阶段的致命错误；任何一种都会中止整个构建，不会留下半成品索引。
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no symbols left in the text after alphabet filtering")]
    EmptyText,

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("construction needs about {required} bytes but the memory limit is {available} bytes")]
    MemoryBudget { required: usize, available: usize },

    #[error("alphabet has {0} symbols, more than supported")]
    AlphabetTooLarge(usize),

    #[error("text symbol {symbol} at offset {offset} is outside the alphabet")]
    SymbolOutOfRange { offset: usize, symbol: u64 },

    #[error("selected offset {0} is beyond the end of the text")]
    SelectedOffsetOutOfRange(usize),

    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
