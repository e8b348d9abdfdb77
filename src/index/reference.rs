use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::index::fm::FMIndex;
use crate::index::params::BuildParams;

/// 参考序列在拼接文本中的位置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub len: usize,
    pub offset: usize,
}

/// 构建元信息
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IndexMeta {
    pub reference_file: Option<String>,
    pub build_args: Option<String>,
    /// RFC 3339 时间戳
    pub build_timestamp: Option<String>,
    pub params: Option<BuildParams>,
}

/// 落盘的参考索引：FM 索引 + 序列表 + 元信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ReferenceIndex {
    pub fm: FMIndex,
    pub contigs: Vec<Contig>,
    pub meta: IndexMeta,
}

impl ReferenceIndex {
    pub fn new(fm: FMIndex, contigs: Vec<Contig>) -> Self {
        Self {
            fm,
            contigs,
            meta: IndexMeta::default(),
        }
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).with_context(|| format!("cannot create '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        bincode::serialize_into(&mut w, self)
            .with_context(|| format!("cannot write index to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("cannot open '{}'", path.display()))?;
        let idx: Self = bincode::deserialize_from(BufReader::new(f))
            .with_context(|| format!("'{}' is not a valid index file", path.display()))?;
        Ok(idx)
    }

    /// 将文本位置映射到 (contig 下标, contig 内偏移)
    pub fn map_text_pos(&self, pos: usize) -> Option<(usize, usize)> {
        let mut lo = 0usize;
        let mut hi = self.contigs.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let c = &self.contigs[mid];
            if pos < c.offset {
                hi = mid;
            } else if pos >= c.offset + c.len {
                lo = mid + 1;
            } else {
                return Some((mid, pos - c.offset));
            }
        }
        None
    }

    /// 命中是否跨越了两条序列的边界
    pub fn spans_boundary(&self, pos: usize, len: usize) -> bool {
        match self.map_text_pos(pos) {
            Some((i, off)) => off + len > self.contigs[i].len,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::fasta::assemble_text;
    use crate::util::alphabet::Alphabet;
    use std::io::Cursor;

    fn sample_index() -> ReferenceIndex {
        let data = b">chr1\nACGTACGT\n>chr2 second\nNNGGCCA\n";
        let alphabet = Alphabet::dna();
        let asm = assemble_text(Cursor::new(&data[..]), &alphabet).unwrap();
        let params = BuildParams {
            sample_rate: 4,
            precompute_width: 2,
            dc_period: 16,
            sa_block_size: 8,
            ..BuildParams::default()
        };
        let fm = FMIndex::build(&asm.text, &alphabet, params, &asm.contig_starts()).unwrap();
        ReferenceIndex::new(fm, asm.contigs)
    }

    #[test]
    fn maps_positions_to_contigs() {
        let idx = sample_index();
        assert_eq!(idx.map_text_pos(0), Some((0, 0)));
        assert_eq!(idx.map_text_pos(7), Some((0, 7)));
        assert_eq!(idx.map_text_pos(8), Some((1, 0)));
        assert_eq!(idx.map_text_pos(12), Some((1, 4)));
        assert_eq!(idx.map_text_pos(13), None);
        assert!(idx.spans_boundary(6, 3));
        assert!(!idx.spans_boundary(8, 5));
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut idx = sample_index();
        idx.set_meta(IndexMeta {
            reference_file: Some("test.fa".to_string()),
            build_args: None,
            build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
            params: Some(BuildParams::default()),
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.cfm");
        idx.save_to_file(&path).unwrap();

        let loaded = ReferenceIndex::load_from_file(&path).unwrap();
        assert_eq!(loaded.contigs, idx.contigs);
        assert_eq!(loaded.meta.reference_file.as_deref(), Some("test.fa"));
        assert_eq!(loaded.fm.extract_text(), idx.fm.extract_text());

        let r = loaded.fm.backward_search(b"GGCC");
        let hits = loaded.fm.locate_range(r.range);
        assert_eq!(hits, vec![8]);
        assert_eq!(loaded.map_text_pos(hits[0]), Some((1, 0)));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cfm");
        std::fs::write(&path, b"not an index").unwrap();
        assert!(ReferenceIndex::load_from_file(&path).is_err());
        assert!(ReferenceIndex::load_from_file(dir.path().join("missing")).is_err());
    }
}
