use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::index::params::SampleStrategy;
use crate::succinct::bitvector::{BitBuffer, Bitvector, RankSelect};
use crate::succinct::packed::PackedSymbolArray;
use crate::util::bits::{div_ceil, log2_ceil};

/// 相邻两行（按 SA 序）的 LCP 与阈值 `max_lcp` 的关系
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcpFlag {
    Greater,
    Equal,
    Below,
}

/// locate 所需的辅助数据，构建时生成，查询时只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuxData {
    pub n: usize,
    pub sample_strategy: SampleStrategy,
    pub sample_rate: usize,
    pub sample_size: usize,
    /// 采样的 SA 值（Row 策略按 row / rate 存放，Text 策略按行序存放）
    pub sampled_sa: PackedSymbolArray,
    /// Text 策略下标记被采样的行
    pub sampled_rows: Option<Bitvector>,
    pub precompute_width: usize,
    pub precompute_size: usize,
    /// 编码后的定长前缀 -> (起始行, 行数)
    pub precomputed_range: Vec<(usize, usize)>,
    pub max_lcp: usize,
    pub lcp_greater: Option<Bitvector>,
    pub lcp_equal: Option<Bitvector>,
    pub selected_filter_rate: usize,
    /// 第 b 位表示行区间 `[b*rate, (b+1)*rate)` 中含有 selected 行
    pub selected_filter: Bitvector,
    /// 行 -> 文本位置
    pub selected_sa: BTreeMap<usize, usize>,
}

impl AuxData {
    /// 行 `row` 的 SA 值（若被采样或被选中）
    pub fn lookup(&self, row: usize) -> Option<usize> {
        let sampled = match (&self.sample_strategy, &self.sampled_rows) {
            (SampleStrategy::Text, Some(rows)) => rows
                .access(row)
                .then(|| self.sampled_sa.read(rows.rank1(row, false)) as usize),
            _ => (row % self.sample_rate == 0)
                .then(|| self.sampled_sa.read(row / self.sample_rate) as usize),
        };
        sampled.or_else(|| self.lookup_selected(row))
    }

    fn lookup_selected(&self, row: usize) -> Option<usize> {
        if self.selected_sa.is_empty() || !self.selected_filter.access(row / self.selected_filter_rate) {
            return None;
        }
        self.selected_sa.get(&row).copied()
    }

    /// 前缀编码 `key` 对应的行区间（空区间为 `None`）
    pub fn prefix_range(&self, key: usize) -> Option<(usize, usize)> {
        match self.precomputed_range.get(key) {
            Some(&(start, len)) if len > 0 => Some((start, len)),
            _ => None,
        }
    }

    pub fn lcp_flag(&self, row: usize) -> Option<LcpFlag> {
        let (greater, equal) = (self.lcp_greater.as_ref()?, self.lcp_equal.as_ref()?);
        Some(if greater.access(row) {
            LcpFlag::Greater
        } else if equal.access(row) {
            LcpFlag::Equal
        } else {
            LcpFlag::Below
        })
    }

    pub fn space_bytes(&self) -> usize {
        self.sampled_sa.space_bytes()
            + self.sampled_rows.as_ref().map_or(0, Bitvector::space_bytes)
            + self.precomputed_range.len() * 16
            + self.lcp_greater.as_ref().map_or(0, Bitvector::space_bytes)
            + self.lcp_equal.as_ref().map_or(0, Bitvector::space_bytes)
            + self.selected_filter.space_bytes()
            + self.selected_sa.len() * 16
    }
}

/// 随 SA 行序逐个接收 (row, sa) 并累积辅助数据
pub(crate) struct AuxBuilder<'a> {
    text: &'a PackedSymbolArray,
    n: usize,
    strategy: SampleStrategy,
    rate: usize,
    sampled: PackedSymbolArray,
    sampled_rows: Option<BitBuffer>,
    width: usize,
    table: Vec<(usize, usize)>,
    max_lcp: usize,
    greater: Option<BitBuffer>,
    equal: Option<BitBuffer>,
    filter_rate: usize,
    registered: &'a BTreeSet<usize>,
    selected: BTreeMap<usize, usize>,
    prev_sa: Option<usize>,
}

impl<'a> AuxBuilder<'a> {
    pub(crate) fn new(
        text: &'a PackedSymbolArray,
        strategy: SampleStrategy,
        rate: usize,
        precompute_width: usize,
        max_lcp: usize,
        filter_rate: usize,
        registered: &'a BTreeSet<usize>,
    ) -> Self {
        let n = text.len();
        let sa_bits = log2_ceil(n).max(1);
        let sample_size = div_ceil(n, rate);
        let (sampled, sampled_rows) = match strategy {
            SampleStrategy::Row => (PackedSymbolArray::zeroed(sa_bits, sample_size), None),
            SampleStrategy::Text => (
                PackedSymbolArray::with_capacity(sa_bits, sample_size),
                Some(BitBuffer::zeroed(n)),
            ),
        };
        let table_size = if precompute_width > 0 {
            1usize << (text.width() as usize * precompute_width)
        } else {
            0
        };
        let lcp_bits = || (max_lcp > 0).then(|| BitBuffer::zeroed(n));
        Self {
            text,
            n,
            strategy,
            rate,
            sampled,
            sampled_rows,
            width: precompute_width,
            table: vec![(0, 0); table_size],
            max_lcp,
            greater: lcp_bits(),
            equal: lcp_bits(),
            filter_rate,
            registered,
            selected: BTreeMap::new(),
            prev_sa: None,
        }
    }

    pub(crate) fn observe(&mut self, row: usize, sa: usize) {
        match self.strategy {
            SampleStrategy::Row => {
                if row % self.rate == 0 {
                    self.sampled.write(row / self.rate, sa as u64);
                }
            }
            SampleStrategy::Text => {
                if sa % self.rate == 0 {
                    self.sampled.push(sa as u64);
                    if let Some(rows) = self.sampled_rows.as_mut() {
                        rows.set(row);
                    }
                }
            }
        }

        if self.width > 0 && sa + self.width <= self.n {
            let key = self.text.pack_read(sa, self.width) as usize;
            let entry = &mut self.table[key];
            if entry.1 == 0 {
                entry.0 = row;
            }
            entry.1 += 1;
        }

        if self.registered.contains(&sa) {
            self.selected.insert(row, sa);
        }

        if let (Some(prev), Some(greater), Some(equal)) =
            (self.prev_sa, self.greater.as_mut(), self.equal.as_mut())
        {
            let l = self.text.lcp(prev, sa, self.max_lcp + 1);
            if l > self.max_lcp {
                greater.set(row);
            } else if l == self.max_lcp {
                equal.set(row);
            }
        }
        self.prev_sa = Some(sa);
    }

    pub(crate) fn finish(self) -> AuxData {
        let mut filter = BitBuffer::zeroed(div_ceil(self.n, self.filter_rate));
        for &row in self.selected.keys() {
            filter.set(row / self.filter_rate);
        }
        AuxData {
            n: self.n,
            sample_strategy: self.strategy,
            sample_rate: self.rate,
            sample_size: self.sampled.len(),
            sampled_sa: self.sampled,
            sampled_rows: self.sampled_rows.map(BitBuffer::freeze),
            precompute_width: self.width,
            precompute_size: self.table.len(),
            precomputed_range: self.table,
            max_lcp: self.max_lcp,
            lcp_greater: self.greater.map(BitBuffer::freeze),
            lcp_equal: self.equal.map(BitBuffer::freeze),
            selected_filter_rate: self.filter_rate,
            selected_filter: filter.freeze(),
            selected_sa: self.selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "ACGTAC" 的后缀数组（无终止符）：AC, ACGTAC, C, CGTAC, GTAC, TAC
    fn fixture() -> (PackedSymbolArray, Vec<usize>) {
        let text = PackedSymbolArray::from_codes(2, &[0, 1, 2, 3, 0, 1]);
        (text, vec![4, 0, 5, 1, 2, 3])
    }

    #[test]
    fn row_sampling_and_prefix_table() {
        let (text, sa) = fixture();
        let registered = BTreeSet::from([2usize]);
        let mut b = AuxBuilder::new(&text, SampleStrategy::Row, 2, 1, 0, 4, &registered);
        for (row, &s) in sa.iter().enumerate() {
            b.observe(row, s);
        }
        let aux = b.finish();
        assert_eq!(aux.sample_size, 3);
        assert_eq!(aux.lookup(0), Some(4));
        assert_eq!(aux.lookup(2), Some(5));
        assert_eq!(aux.lookup(1), None);
        // 选中的位置 2 落在第 4 行
        assert_eq!(aux.lookup(4), Some(2));
        // A 开头的两行、C 开头的两行
        assert_eq!(aux.prefix_range(0), Some((0, 2)));
        assert_eq!(aux.prefix_range(1), Some((2, 2)));
        assert_eq!(aux.prefix_range(3), Some((5, 1)));
        assert!(aux.lcp_flag(1).is_none());
    }

    #[test]
    fn text_sampling_marks_rows() {
        let (text, sa) = fixture();
        let registered = BTreeSet::new();
        let mut b = AuxBuilder::new(&text, SampleStrategy::Text, 3, 0, 0, 4, &registered);
        for (row, &s) in sa.iter().enumerate() {
            b.observe(row, s);
        }
        let aux = b.finish();
        // 文本位置 0 和 3 被采样，分别在第 1 行和第 5 行
        assert_eq!(aux.sample_size, 2);
        assert_eq!(aux.lookup(1), Some(0));
        assert_eq!(aux.lookup(5), Some(3));
        assert_eq!(aux.lookup(0), None);
        assert_eq!(aux.precompute_size, 0);
    }

    #[test]
    fn lcp_flags_against_threshold() {
        let (text, sa) = fixture();
        let registered = BTreeSet::new();
        let mut b = AuxBuilder::new(&text, SampleStrategy::Row, 4, 0, 2, 4, &registered);
        for (row, &s) in sa.iter().enumerate() {
            b.observe(row, s);
        }
        let aux = b.finish();
        // 行 1: LCP(AC, ACGTAC) = 2；行 3: LCP(C, CGTAC) = 1
        assert_eq!(aux.lcp_flag(1), Some(LcpFlag::Equal));
        assert_eq!(aux.lcp_flag(3), Some(LcpFlag::Below));
        assert_eq!(aux.lcp_flag(2), Some(LcpFlag::Below));
    }
}
