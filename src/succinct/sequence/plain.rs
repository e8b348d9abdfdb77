use serde::{Deserialize, Serialize};

use crate::succinct::bitvector::{BitBuffer, Bitvector, RankSelect};
use crate::succinct::sequence::SymbolSequence;

/// 每个符号一条位向量：rank 为一次位向量 rank，access 需要逐符号探测。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlainSequence {
    len: usize,
    per_symbol: Vec<Bitvector>,
}

impl PlainSequence {
    pub fn new(symbols: &[u8], alphabet_size: usize) -> Self {
        let mut bufs: Vec<BitBuffer> = (0..alphabet_size)
            .map(|_| BitBuffer::zeroed(symbols.len()))
            .collect();
        for (i, &s) in symbols.iter().enumerate() {
            bufs[s as usize].set(i);
        }
        Self {
            len: symbols.len(),
            per_symbol: bufs.into_iter().map(BitBuffer::freeze).collect(),
        }
    }
}

impl SymbolSequence for PlainSequence {
    fn len(&self) -> usize {
        self.len
    }

    fn access(&self, i: usize) -> u8 {
        self.per_symbol
            .iter()
            .position(|bv| bv.access(i))
            .unwrap_or(0) as u8
    }

    fn rank(&self, c: u8, i: usize) -> usize {
        match self.per_symbol.get(c as usize) {
            Some(bv) => bv.rank1(i, false),
            None => 0,
        }
    }

    fn space_bytes(&self) -> usize {
        self.per_symbol.iter().map(Bitvector::space_bytes).sum()
    }
}
