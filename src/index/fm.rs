use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::BuildResult;
use crate::index::aux::{AuxData, LcpFlag};
use crate::index::builder::{BuildOutput, FMBuilder};
use crate::index::params::BuildParams;
use crate::succinct::packed::PackedSymbolArray;
use crate::succinct::sequence::{BwtEncoding, BwtSequence, SymbolSequence};
use crate::util::alphabet::Alphabet;

/// 模式串中不属于字母表的符号编码
const FOREIGN: u8 = u8::MAX;

/// 反向搜索结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// 从右往左成功匹配的符号数
    pub matched_len: usize,
    /// 整个模式串的匹配行区间；未完全匹配时为空区间
    pub range: Range<usize>,
    /// 最后一个非空区间（对应长度为 `matched_len` 的后缀）
    pub matched_range: Range<usize>,
}

impl SearchResult {
    pub fn is_full_match(&self, pattern_len: usize) -> bool {
        self.matched_len == pattern_len && !self.range.is_empty()
    }
}

/// 各部分占用的字节数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceReport {
    pub bwt: usize,
    pub aux: usize,
    pub partial_sum: usize,
}

impl SpaceReport {
    pub fn total(&self) -> usize {
        self.bwt + self.aux + self.partial_sum
    }
}

/// 压缩 FM 索引。
///
/// BWT 不含终止符：后缀 0 所在行（`first_isa`）存放 T[n-1]。查询时把它看作
/// 带终止符的 T$ 的 BWT，`$` 行与 `$` 符号都是虚拟的，rank 在此做一次修正。
/// 行区间一律左闭右开。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FMIndex {
    pub n: usize,
    pub alphabet_bits: u32,
    pub first_isa: usize,
    pub last_symbol: u8,
    pub bwt: BwtSequence,
    pub alphabet: Alphabet,
    /// C 表：`partial_sum[c]` = 文本中编码小于 c 的符号个数
    pub partial_sum: Vec<usize>,
    pub aux: AuxData,
}

impl FMIndex {
    pub fn build(
        text: &PackedSymbolArray,
        alphabet: &Alphabet,
        params: BuildParams,
        selected: &[usize],
    ) -> BuildResult<Self> {
        let encoding = params.encoding;
        let out = FMBuilder::new(text, alphabet.size(), params)
            .select_offsets(selected.iter().copied())
            .build()?;
        Ok(Self::from_build(out, alphabet.clone(), encoding))
    }

    pub fn from_build(out: BuildOutput, alphabet: Alphabet, encoding: BwtEncoding) -> Self {
        let bwt = BwtSequence::build(encoding, &out.bwt, out.alphabet_size);
        Self {
            n: out.n,
            alphabet_bits: out.bwt.width(),
            first_isa: out.first_isa,
            last_symbol: out.last_symbol,
            bwt,
            alphabet,
            partial_sum: out.partial_sum,
            aux: out.aux,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn sigma(&self) -> usize {
        self.partial_sum.len() - 1
    }

    /// 文本中符号 `c` 的出现次数
    pub fn count(&self, c: u8) -> usize {
        let c = c as usize;
        if c >= self.sigma() {
            return 0;
        }
        self.partial_sum[c + 1] - self.partial_sum[c]
    }

    /// BWT 第 `row` 行存放的符号编码
    #[inline]
    pub fn access(&self, row: usize) -> u8 {
        self.bwt.access(row)
    }

    /// 虚拟 T$ 的 BWT 中，第 `p` 行之前（不含 `$` 行）符号 `c` 的个数
    #[inline]
    fn occ(&self, c: u8, p: usize) -> usize {
        let base = self.bwt.rank(c, p);
        if c == self.last_symbol && p <= self.first_isa {
            base + 1
        } else {
            base
        }
    }

    /// `[0, i)`（`inclusive` 时为 `[0, i]`）中符号 `c` 的个数。
    /// `first_isa` 行视为终止符，不计入 `last_symbol`；越界的 `i` 截断到末尾。
    pub fn rank(&self, c: u8, i: usize, inclusive: bool) -> usize {
        let p = if inclusive { i + 1 } else { i }.min(self.n);
        let base = self.bwt.rank(c, p);
        if c == self.last_symbol && p > self.first_isa {
            base - 1
        } else {
            base
        }
    }

    /// 以 `c` 向左扩展一个符号；`c` 不出现于该上下文时返回空区间
    pub fn backward_extend(&self, c: u8, range: Range<usize>) -> Range<usize> {
        if c as usize >= self.sigma() {
            return range.start..range.start;
        }
        let base = self.partial_sum[c as usize];
        base + self.occ(c, range.start)..base + self.occ(c, range.end)
    }

    /// LF 映射：第 `row` 行的后缀向左延长一个符号后所在的行。
    ///
    /// `first_isa` 行是后缀 0，左侧只有虚拟终止符，返回 `None`；`row` 越界同样返回 `None`。
    pub fn lf(&self, row: usize) -> Option<usize> {
        (row < self.n && row != self.first_isa).then(|| self.lf_step(row))
    }

    #[inline]
    fn lf_step(&self, row: usize) -> usize {
        let c = self.bwt.access(row);
        self.partial_sum[c as usize] + self.occ(c, row)
    }

    /// 后缀 n-1（仅含最后一个符号）所在的行
    pub fn last_isa(&self) -> usize {
        self.partial_sum[self.last_symbol as usize]
    }

    /// 按字母表编码模式串后反向搜索；大小写不敏感
    pub fn backward_search(&self, pattern: &[u8]) -> SearchResult {
        let codes: Vec<u8> = pattern
            .iter()
            .map(|&b| self.alphabet.encode(b).unwrap_or(FOREIGN))
            .collect();
        self.backward_search_codes(&codes)
    }

    /// 对已编码的模式串反向搜索。
    ///
    /// 模式够长且前缀表可用时，先用表定位最右 w 个符号；表中没有时退回逐个扩展，
    /// 以得到准确的匹配长度。遇到字母表外的符号即停止。
    pub fn backward_search_codes(&self, pattern: &[u8]) -> SearchResult {
        let m = pattern.len();
        let sigma = self.sigma();
        let w = self.aux.precompute_width;

        if w > 0 && m >= w && self.aux.precompute_size > 0 {
            let tail = &pattern[m - w..];
            if tail.iter().all(|&c| (c as usize) < sigma) {
                let key = tail
                    .iter()
                    .enumerate()
                    .fold(0usize, |k, (j, &c)| k | ((c as usize) << (j * self.alphabet_bits as usize)));
                if let Some((start, len)) = self.aux.prefix_range(key) {
                    return self.extend_from(pattern, m - w, start..start + len);
                }
            }
        }

        if m == 0 {
            return SearchResult {
                matched_len: 0,
                range: 0..self.n,
                matched_range: 0..self.n,
            };
        }
        let c = pattern[m - 1];
        if c as usize >= sigma || self.count(c) == 0 {
            return SearchResult {
                matched_len: 0,
                range: 0..0,
                matched_range: 0..self.n,
            };
        }
        let seed = self.partial_sum[c as usize]..self.partial_sum[c as usize + 1];
        self.extend_from(pattern, m - 1, seed)
    }

    /// `pattern[rest..]` 已匹配到 `range`，继续向左扩展 `pattern[..rest]`
    fn extend_from(&self, pattern: &[u8], rest: usize, mut range: Range<usize>) -> SearchResult {
        let m = pattern.len();
        for i in (0..rest).rev() {
            let next = self.backward_extend(pattern[i], range.clone());
            if next.is_empty() {
                return SearchResult {
                    matched_len: m - i - 1,
                    range: next.start..next.start,
                    matched_range: range,
                };
            }
            range = next;
        }
        SearchResult {
            matched_len: m,
            range: range.clone(),
            matched_range: range,
        }
    }

    /// 从 `row` 沿 LF 回退，直到落在采样或选中的行，返回 (该行的文本位置, 步数)。
    /// 真实位置为两者之和。
    pub fn backward_to_sampled_sa(&self, mut row: usize) -> (usize, usize) {
        let mut steps = 0;
        loop {
            if row == self.first_isa {
                return (0, steps);
            }
            if let Some(offset) = self.aux.lookup(row) {
                return (offset, steps);
            }
            row = self.lf_step(row);
            steps += 1;
        }
    }

    /// 第 `row` 行后缀的起始位置
    pub fn locate(&self, row: usize) -> usize {
        let (offset, steps) = self.backward_to_sampled_sa(row);
        offset + steps
    }

    /// 区间内每一行的起始位置，按行序
    pub fn locate_range(&self, range: Range<usize>) -> Vec<usize> {
        range.map(|row| self.locate(row)).collect()
    }

    /// 第 `row` 行与上一行的 LCP 和阈值的关系；构建时未开启则为 `None`
    pub fn lcp_flag(&self, row: usize) -> Option<LcpFlag> {
        self.aux.lcp_flag(row)
    }

    /// 用 LF 映射从 BWT 还原原文本（编码形式）
    pub fn extract_text(&self) -> Vec<u8> {
        let n = self.n;
        let mut text = vec![0u8; n];
        if n == 0 {
            return text;
        }
        text[n - 1] = self.last_symbol;
        let mut row = self.last_isa();
        for k in (0..n - 1).rev() {
            text[k] = self.bwt.access(row);
            row = self.lf_step(row);
        }
        text
    }

    pub fn encoding(&self) -> BwtEncoding {
        self.bwt.encoding()
    }

    pub fn space(&self) -> SpaceReport {
        SpaceReport {
            bwt: self.bwt.space_bytes(),
            aux: self.aux.space_bytes(),
            partial_sum: self.partial_sum.len() * std::mem::size_of::<usize>(),
        }
    }
}
