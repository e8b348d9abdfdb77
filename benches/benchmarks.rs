use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use compact_fm::index::{BuildParams, FMIndex, SuffixArrayGenerator};
use compact_fm::succinct::{Bitvector, BwtEncoding, PackedSymbolArray, RankSelect};
use compact_fm::util::alphabet::Alphabet;

fn make_reference(len: usize) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    let mut seq = Vec::with_capacity(len);
    let mut x: u32 = 42;
    for _ in 0..len {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seq.push(bases[(x >> 16) as usize % 4]);
    }
    seq
}

fn pack(seq: &[u8]) -> PackedSymbolArray {
    let alphabet = Alphabet::dna();
    let codes = alphabet.encode_all(seq).unwrap();
    PackedSymbolArray::from_codes(alphabet.bits(), &codes)
}

fn bench_params(encoding: BwtEncoding) -> BuildParams {
    BuildParams {
        sa_block_size: 1 << 14,
        dc_period: 256,
        sample_rate: 16,
        precompute_width: 8,
        encoding,
        ..BuildParams::default()
    }
}

fn bench_build(c: &mut Criterion) {
    let text = pack(&make_reference(100_000));
    let alphabet = Alphabet::dna();
    let mut group = c.benchmark_group("build_100k");
    group.sample_size(10);
    for threads in [1, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &t| {
            b.iter(|| {
                let params = BuildParams {
                    threads: t,
                    ..bench_params(BwtEncoding::RunBlock)
                };
                black_box(FMIndex::build(&text, &alphabet, params, &[]).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_suffix_sort(c: &mut Criterion) {
    let text = pack(&make_reference(20_000));
    c.bench_function("suffix_array_20k", |b| {
        b.iter(|| {
            let g = SuffixArrayGenerator::new(&text, 4, 1 << 12, 128);
            black_box(g.collect_suffix_array())
        })
    });
}

fn bench_backward_search(c: &mut Criterion) {
    let reference = make_reference(100_000);
    let text = pack(&reference);
    let alphabet = Alphabet::dna();
    let pattern = &reference[1000..1020];
    let mut group = c.benchmark_group("backward_search_20bp");
    for encoding in [BwtEncoding::Wavelet, BwtEncoding::RunBlock, BwtEncoding::Hybrid] {
        let fm = FMIndex::build(&text, &alphabet, bench_params(encoding), &[]).unwrap();
        group.bench_function(format!("{encoding:?}"), |b| {
            b.iter(|| black_box(fm.backward_search(black_box(pattern))))
        });
    }
    group.finish();
}

fn bench_locate(c: &mut Criterion) {
    let reference = make_reference(100_000);
    let fm = FMIndex::build(
        &pack(&reference),
        &Alphabet::dna(),
        bench_params(BwtEncoding::RunBlock),
        &[],
    )
    .unwrap();
    let hit = fm.backward_search(&reference[5000..5008]);
    c.bench_function("locate_8bp", |b| {
        b.iter(|| black_box(fm.locate_range(hit.range.clone())))
    });
}

fn bench_rank_select(c: &mut Criterion) {
    let n = 1 << 20;
    let bits: Vec<bool> = make_reference(n).iter().map(|&b| b == b'A').collect();
    let bv = Bitvector::from_bits(bits);
    let ones = bv.count_ones();

    c.bench_function("rank1_1M", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 7919) % n;
            black_box(bv.rank1(black_box(i), false))
        })
    });
    c.bench_function("select1_1M", |b| {
        let mut k = 0usize;
        b.iter(|| {
            k = k % ones + 1;
            black_box(bv.select1(black_box(k)))
        })
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_suffix_sort,
    bench_backward_search,
    bench_locate,
    bench_rank_select
);
criterion_main!(benches);
