use std::collections::BTreeSet;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{BuildError, BuildResult};
use crate::index::aux::{AuxBuilder, AuxData};
use crate::index::params::BuildParams;
use crate::index::sa::SuffixArrayGenerator;
use crate::succinct::packed::PackedSymbolArray;
use crate::util::alphabet::MAX_ALPHABET_SIZE;
use crate::util::bits::div_ceil;

/// 工作线程栈的下限；多键快排按深度递归
const MIN_STACK_BYTES: usize = 4 << 20;

/// 构建产物：未压缩的 BWT 与查询所需的全部元数据
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub n: usize,
    pub alphabet_size: usize,
    /// 存放 T[n-1] 的行，即后缀 0 所在的行
    pub first_isa: usize,
    pub last_symbol: u8,
    pub bwt: PackedSymbolArray,
    /// `partial_sum[c]` = 文本中编码小于 c 的符号个数，长度 alphabet_size + 1
    pub partial_sum: Vec<usize>,
    pub aux: AuxData,
    /// 实际使用的参数（含内存推断与截断后的结果）
    pub params: BuildParams,
}

/// FM 索引构建器。
///
/// 驱动 [`SuffixArrayGenerator`]：每批 `threads` 个块先并行分类、再并行排序，
/// 然后单线程按行序写入 BWT 与辅助数据。完整后缀数组从不同时驻留内存，
/// 结果与线程数无关。
pub struct FMBuilder<'a> {
    text: &'a PackedSymbolArray,
    alphabet_size: usize,
    params: BuildParams,
    selected: BTreeSet<usize>,
}

impl<'a> FMBuilder<'a> {
    pub fn new(text: &'a PackedSymbolArray, alphabet_size: usize, params: BuildParams) -> Self {
        Self {
            text,
            alphabet_size,
            params,
            selected: BTreeSet::new(),
        }
    }

    /// 登记需要精确记录 SA 的文本位置（如各条序列的起点）
    pub fn select_offsets<I: IntoIterator<Item = usize>>(mut self, offsets: I) -> Self {
        self.selected.extend(offsets);
        self
    }

    pub fn build(self) -> BuildResult<BuildOutput> {
        self.build_with(|_, _| {})
    }

    /// 构建，并在每个块排好序后以 (起始行, 块内 SA) 回调
    pub fn build_with<F>(mut self, mut on_chunk: F) -> BuildResult<BuildOutput>
    where
        F: FnMut(usize, &[usize]) + Send,
    {
        self.params.validate()?;
        let n = self.text.len();
        if n == 0 {
            return Err(BuildError::EmptyText);
        }
        if self.alphabet_size > MAX_ALPHABET_SIZE {
            return Err(BuildError::AlphabetTooLarge(self.alphabet_size));
        }
        if let Some(&offset) = self.selected.range(n..).next() {
            return Err(BuildError::SelectedOffsetOutOfRange(offset));
        }
        let mut counts = vec![0usize; self.alphabet_size];
        for (offset, symbol) in self.text.iter().enumerate() {
            match counts.get_mut(symbol as usize) {
                Some(slot) => *slot += 1,
                None => return Err(BuildError::SymbolOutOfRange { offset, symbol }),
            }
        }
        if let Some(memory) = self.params.memory_limit {
            self.params.infer_for_memory(n, self.alphabet_size, memory)?;
        }
        self.params.precompute_width = self.params.effective_precompute_width(self.text.width());

        let params = &self.params;
        let threads = params.threads;
        info!(
            "building FM-index: {} symbols, alphabet {}, {} threads, block {}, dc period {}",
            n, self.alphabet_size, threads, params.sa_block_size, params.dc_period
        );
        let t0 = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .stack_size(MIN_STACK_BYTES.max(params.dc_period * 512))
            .build()?;

        let text = self.text;
        let alphabet_size = self.alphabet_size;
        let selected = &self.selected;
        let (bwt, first_isa, aux) = pool.install(|| {
            let generator =
                SuffixArrayGenerator::new(text, alphabet_size, params.sa_block_size, params.dc_period);
            let mut bwt = PackedSymbolArray::zeroed(text.width(), n);
            let mut aux = AuxBuilder::new(
                text,
                params.sample_strategy,
                params.sample_rate,
                params.precompute_width,
                params.max_lcp,
                params.selected_filter_rate,
                selected,
            );
            let last = text.read(n - 1);
            let mut first_isa = 0;
            let mut row = 0;

            let chunk_count = generator.chunk_count();
            let segment = div_ceil(n, threads);
            let mut from = 0;
            while from < chunk_count {
                let to = (from + threads).min(chunk_count) - 1;

                // 按文本区段并行分类，每段产出一组按块分好的位置
                let per_segment: Vec<Vec<Vec<usize>>> = (0..threads)
                    .into_par_iter()
                    .map(|s| {
                        let start = (s * segment).min(n);
                        let end = ((s + 1) * segment).min(n);
                        generator.chunk_positions(from, to, start, end)
                    })
                    .collect();
                let mut chunks: Vec<Vec<usize>> = vec![Vec::new(); to - from + 1];
                for segment_chunks in per_segment {
                    for (chunk, part) in chunks.iter_mut().zip(segment_chunks) {
                        chunk.extend(part);
                    }
                }

                chunks.par_iter_mut().for_each(|chunk| generator.sort_suffixes(chunk));

                for chunk in &chunks {
                    on_chunk(row, chunk);
                    for &sa in chunk {
                        let symbol = if sa == 0 {
                            first_isa = row;
                            last
                        } else {
                            text.read(sa - 1)
                        };
                        bwt.write(row, symbol);
                        aux.observe(row, sa);
                        row += 1;
                    }
                }
                debug!(
                    "chunks {}..={} of {} merged, {} / {} rows",
                    from, to, chunk_count, row, n
                );
                from = to + 1;
            }
            debug_assert_eq!(row, n);
            (bwt, first_isa, aux.finish())
        });

        let mut partial_sum = Vec::with_capacity(self.alphabet_size + 1);
        let mut acc = 0;
        partial_sum.push(0);
        for &c in &counts {
            acc += c;
            partial_sum.push(acc);
        }

        info!("FM-index built in {:.2?}", t0.elapsed());
        Ok(BuildOutput {
            n,
            alphabet_size: self.alphabet_size,
            first_isa,
            last_symbol: self.text.read(n - 1) as u8,
            bwt,
            partial_sum,
            aux,
            params: self.params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::params::SampleStrategy;
    use crate::index::sa::validate_suffix_array;

    fn lcg_text(len: usize, sigma: u64, seed: u64) -> PackedSymbolArray {
        let mut x = seed;
        let codes: Vec<u8> = (0..len)
            .map(|_| {
                x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((x >> 33) % sigma) as u8
            })
            .collect();
        PackedSymbolArray::from_codes(2, &codes)
    }

    fn small_params() -> BuildParams {
        BuildParams {
            sa_block_size: 64,
            dc_period: 16,
            sample_rate: 4,
            precompute_width: 3,
            ..BuildParams::default()
        }
    }

    #[test]
    fn bwt_matches_naive_suffix_array() {
        let text = lcg_text(500, 4, 7);
        let mut collected = Vec::new();
        let out = FMBuilder::new(&text, 4, small_params())
            .build_with(|row, chunk| {
                assert_eq!(row, collected.len());
                collected.extend_from_slice(chunk);
            })
            .unwrap();
        assert!(validate_suffix_array(&text, &collected));
        let n = text.len();
        for (row, &sa) in collected.iter().enumerate() {
            let expect = text.read(if sa == 0 { n - 1 } else { sa - 1 });
            assert_eq!(out.bwt.read(row), expect);
        }
        assert_eq!(collected[out.first_isa], 0);
        assert_eq!(*out.partial_sum.last().unwrap(), n);
    }

    #[test]
    fn thread_count_does_not_change_result() {
        let text = lcg_text(1000, 4, 11);
        let one = FMBuilder::new(&text, 4, small_params()).build().unwrap();
        let four = FMBuilder::new(
            &text,
            4,
            BuildParams {
                threads: 4,
                ..small_params()
            },
        )
        .build()
        .unwrap();
        assert_eq!(one.bwt, four.bwt);
        assert_eq!(one.aux.sampled_sa, four.aux.sampled_sa);
        assert_eq!(one.first_isa, four.first_isa);
    }

    #[test]
    fn periodic_text_across_many_chunks() {
        use crate::index::aux::LcpFlag;

        let max_lcp = 5;
        for period in [&[0u8, 1, 2, 3][..], &[0, 1, 2, 3, 3, 1, 0][..]] {
            let codes: Vec<u8> = period.iter().copied().cycle().take(480).collect();
            let text = PackedSymbolArray::from_codes(2, &codes);
            let params = BuildParams {
                threads: 3,
                sa_block_size: 32,
                max_lcp,
                ..small_params()
            };
            let mut collected = Vec::new();
            let out = FMBuilder::new(&text, 4, params)
                .build_with(|_, chunk| collected.extend_from_slice(chunk))
                .unwrap();
            assert!(validate_suffix_array(&text, &collected));

            let n = codes.len();
            assert_eq!(out.aux.lcp_flag(0), Some(LcpFlag::Below));
            for row in 1..n {
                let (a, b) = (collected[row - 1], collected[row]);
                let mut l = 0;
                while a + l < n && b + l < n && codes[a + l] == codes[b + l] {
                    l += 1;
                }
                let expect = match l.cmp(&max_lcp) {
                    std::cmp::Ordering::Greater => LcpFlag::Greater,
                    std::cmp::Ordering::Equal => LcpFlag::Equal,
                    std::cmp::Ordering::Less => LcpFlag::Below,
                };
                assert_eq!(out.aux.lcp_flag(row), Some(expect), "row {row}");
            }
        }
    }

    #[test]
    fn selected_offsets_are_recorded() {
        let text = lcg_text(300, 4, 3);
        let out = FMBuilder::new(
            &text,
            4,
            BuildParams {
                sample_strategy: SampleStrategy::Text,
                ..small_params()
            },
        )
        .select_offsets([0, 101, 257])
        .build()
        .unwrap();
        let mut offsets: Vec<usize> = out.aux.selected_sa.values().copied().collect();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![0, 101, 257]);
    }

    #[test]
    fn rejects_bad_input() {
        let empty = PackedSymbolArray::new(2);
        assert!(matches!(
            FMBuilder::new(&empty, 4, small_params()).build(),
            Err(BuildError::EmptyText)
        ));
        let text = PackedSymbolArray::from_codes(2, &[0, 3, 1]);
        assert!(matches!(
            FMBuilder::new(&text, 3, small_params()).build(),
            Err(BuildError::SymbolOutOfRange { offset: 1, symbol: 3 })
        ));
        assert!(matches!(
            FMBuilder::new(&text, 4, small_params()).select_offsets([3]).build(),
            Err(BuildError::SelectedOffsetOutOfRange(3))
        ));
    }
}
