//! 演示如何在 library 模式下构建 FM 索引并查询。
//!
//! 运行方式：
//! ```bash
//! cargo run --example simple_search
//! ```

use std::io::Cursor;

use compact_fm::index::{BuildParams, FMIndex, ReferenceIndex};
use compact_fm::io::fasta::assemble_text;
use compact_fm::util::alphabet::Alphabet;

fn main() -> anyhow::Result<()> {
    // 1. 拼接参考序列，N 会被过滤掉
    let fasta = b">chr1\nACGTACGTAGCTGATCGTAGCTAGCTAG\n>chr2\nCTGATCGTANNGCTAGCTAGCTGAT\n";
    let alphabet = Alphabet::dna();
    let asm = assemble_text(Cursor::new(&fasta[..]), &alphabet)?;
    println!("文本长度: {}，过滤符号: {}", asm.text.len(), asm.dropped);

    // 2. 构建索引，序列起点登记为 selected 位置
    let params = BuildParams {
        sample_rate: 8,
        precompute_width: 4,
        dc_period: 64,
        sa_block_size: 16,
        threads: 2,
        ..BuildParams::default()
    };
    let fm = FMIndex::build(&asm.text, &alphabet, params, &asm.contig_starts())?;
    let space = fm.space();
    println!("FM 索引构建完成：{} 行，共 {} 字节", fm.len(), space.total());
    let idx = ReferenceIndex::new(fm, asm.contigs);

    // 3. 精确匹配与定位
    for pattern in [&b"GCTAGCTAG"[..], b"CGTAG", b"TTTTT"] {
        let hit = idx.fm.backward_search(pattern);
        let name = String::from_utf8_lossy(pattern);
        if !hit.is_full_match(pattern.len()) {
            println!("{name}: 仅匹配末尾 {} 个符号", hit.matched_len);
            continue;
        }
        let mut positions = idx.fm.locate_range(hit.range);
        positions.sort_unstable();
        for pos in positions {
            if let Some((ci, off)) = idx.map_text_pos(pos) {
                println!("{name}: {}:{}", idx.contigs[ci].name, off + 1);
            }
        }
    }
    Ok(())
}
