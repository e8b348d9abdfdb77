use anyhow::Result;
use log::{info, warn};
use std::io::BufRead;

use crate::index::reference::Contig;
use crate::succinct::packed::PackedSymbolArray;
use crate::util::alphabet::Alphabet;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

/// 逐条读取 FASTA 记录。序列行去掉空白并转为大写，`;` 开头的行视为注释。
pub struct FastaReader<R: BufRead> {
    reader: R,
    line: String,
    pending_header: Option<String>,
    eof: bool,
}

fn split_header(header: &str) -> (String, Option<String>) {
    let mut parts = header.splitn(2, char::is_whitespace);
    let id = parts.next().unwrap_or("").to_string();
    let desc = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    (id, desc)
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            pending_header: None,
            eof: false,
        }
    }

    /// 读下一行到 `self.line`；到达末尾返回 false
    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            self.eof = true;
            return Ok(false);
        }
        Ok(true)
    }

    fn header_of_line(&self) -> Option<String> {
        self.line.strip_prefix('>').map(|h| h.trim().to_string())
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                if self.eof || !self.read_line()? {
                    return Ok(None);
                }
                if let Some(h) = self.header_of_line() {
                    break h;
                }
            },
        };
        let (id, desc) = split_header(&header);

        let mut seq = Vec::new();
        while !self.eof && self.read_line()? {
            if let Some(h) = self.header_of_line() {
                self.pending_header = Some(h);
                break;
            }
            if self.line.starts_with(';') {
                continue;
            }
            seq.extend(
                self.line
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase()),
            );
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// 多条序列按字母表编码后首尾相接得到的文本
#[derive(Debug, Clone)]
pub struct AssembledText {
    pub text: PackedSymbolArray,
    pub contigs: Vec<Contig>,
    /// 被过滤掉的字母表外符号个数（如 N）
    pub dropped: usize,
}

impl AssembledText {
    /// 每条序列在文本中的起点，作为构建时登记的 selected 位置
    pub fn contig_starts(&self) -> Vec<usize> {
        self.contigs.iter().map(|c| c.offset).collect()
    }
}

/// 读入全部记录，丢弃字母表外的符号后编码拼接。
///
/// 过滤后为空的记录不进入序列表。
pub fn assemble_text<R: BufRead>(reader: R, alphabet: &Alphabet) -> Result<AssembledText> {
    let mut text = PackedSymbolArray::new(alphabet.bits());
    let mut contigs = Vec::new();
    let mut dropped = 0usize;
    let mut n_seqs = 0usize;

    for rec in FastaReader::new(reader) {
        let rec = rec?;
        n_seqs += 1;
        let offset = text.len();
        for &b in &rec.seq {
            match alphabet.encode(b) {
                Some(code) => text.push(code as u64),
                None => dropped += 1,
            }
        }
        let len = text.len() - offset;
        if len == 0 {
            warn!("sequence '{}' has no symbols in the alphabet, skipped", rec.id);
            continue;
        }
        contigs.push(Contig {
            name: rec.id,
            len,
            offset,
        });
    }

    if n_seqs == 0 {
        anyhow::bail!("input contains no FASTA records");
    }
    info!(
        "assembled {} sequences, {} symbols kept, {} dropped",
        contigs.len(),
        text.len(),
        dropped
    );
    Ok(AssembledText {
        text,
        contigs,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(data: &[u8]) -> Vec<FastaRecord> {
        FastaReader::new(Cursor::new(data))
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn reads_headers_and_sequences() {
        let recs = read_all(b"\n>chr1 first contig\nACgTNN\n>chr2\nAAA\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "chr1");
        assert_eq!(recs[0].desc.as_deref(), Some("first contig"));
        assert_eq!(recs[0].seq, b"ACGTNN");
        assert_eq!(recs[1].id, "chr2");
        assert_eq!(recs[1].desc, None);
        assert_eq!(recs[1].seq, b"AAA");
    }

    #[test]
    fn strips_crlf_whitespace_and_comments() {
        let recs = read_all(b">p1 desc\r\nMK v\r\n; a comment\r\n lw\r\n>p2 \r\n");
        assert_eq!(recs[0].seq, b"MKVLW");
        assert_eq!(recs[1].id, "p2");
        assert!(recs[1].seq.is_empty());
    }

    #[test]
    fn assemble_filters_foreign_symbols() {
        let data = b">a\nACGTACGTNACGT\n>empty\nNNNN\n>b\nttga\n";
        let asm = assemble_text(Cursor::new(&data[..]), &Alphabet::dna()).unwrap();
        assert_eq!(asm.text.len(), 16);
        assert_eq!(asm.dropped, 5);
        assert_eq!(asm.contigs.len(), 2);
        assert_eq!(asm.contigs[1].name, "b");
        assert_eq!(asm.contigs[1].offset, 12);
        assert_eq!(asm.contig_starts(), vec![0, 12]);
        let decoded: Vec<u8> = asm
            .text
            .iter()
            .map(|c| Alphabet::dna().decode(c as u8))
            .collect();
        assert_eq!(&decoded[..], b"ACGTACGTACGTTTGA");
    }

    #[test]
    fn assemble_requires_records() {
        assert!(assemble_text(Cursor::new(&b"ACGT\n"[..]), &Alphabet::dna()).is_err());
    }
}
