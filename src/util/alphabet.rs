use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::util::bits::log2_ceil;

pub const DNA: &str = "ACGT";
pub const PROTEIN: &str = "ACDEFGHIKLMNPQRSTVWY";

/// 超出该大小的字母表不在支持范围内
pub const MAX_ALPHABET_SIZE: usize = 64;

const UNMAPPED: u8 = u8::MAX;

/// 有序字母表：编码顺序即字典序。
///
/// 编码为 `[0, size)`，`encode` 对大小写不敏感；不在字母表中的符号返回 `None`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alphabet {
    symbols: Vec<u8>,
    #[serde(with = "code_table")]
    codes: [u8; 256],
}

impl Alphabet {
    pub fn new(list: &str) -> Result<Self, BuildError> {
        let mut symbols: Vec<u8> = Vec::new();
        for b in list.bytes().map(|b| b.to_ascii_uppercase()) {
            if !symbols.contains(&b) {
                symbols.push(b);
            }
        }
        if symbols.is_empty() {
            return Err(BuildError::InvalidParameter {
                name: "alphabet",
                reason: "alphabet list is empty".to_string(),
            });
        }
        if symbols.len() > MAX_ALPHABET_SIZE {
            return Err(BuildError::AlphabetTooLarge(symbols.len()));
        }
        let mut codes = [UNMAPPED; 256];
        for (i, &s) in symbols.iter().enumerate() {
            codes[s as usize] = i as u8;
            codes[s.to_ascii_lowercase() as usize] = i as u8;
        }
        Ok(Self { symbols, codes })
    }

    pub fn dna() -> Self {
        Self::new(DNA).unwrap_or_else(|_| unreachable!("built-in alphabet is valid"))
    }

    pub fn protein() -> Self {
        Self::new(PROTEIN).unwrap_or_else(|_| unreachable!("built-in alphabet is valid"))
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// 打包存储时每个符号的位宽（至少 1 位）
    #[inline]
    pub fn bits(&self) -> u32 {
        log2_ceil(self.size()).max(1)
    }

    #[inline]
    pub fn encode(&self, symbol: u8) -> Option<u8> {
        match self.codes[symbol as usize] {
            UNMAPPED => None,
            c => Some(c),
        }
    }

    #[inline]
    pub fn decode(&self, code: u8) -> u8 {
        self.symbols[code as usize]
    }

    #[inline]
    pub fn contains(&self, symbol: u8) -> bool {
        self.encode(symbol).is_some()
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// 将整条序列编码；遇到字母表外的符号返回 `None`
    pub fn encode_all(&self, seq: &[u8]) -> Option<Vec<u8>> {
        seq.iter().map(|&b| self.encode(b)).collect()
    }
}

mod code_table {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(codes: &[u8; 256], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(codes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 256], D::Error> {
        let v: Vec<u8> = Deserialize::deserialize(d)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("alphabet code table must have 256 entries"))
    }
}
