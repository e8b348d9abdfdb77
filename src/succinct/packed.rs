use serde::{Deserialize, Serialize};

use crate::util::bits::{low_mask, words_for_bits, WORD_BITS};

/// 定宽位打包的符号序列。
///
/// 第 i 个元素占据比特 `[i*width, (i+1)*width)`，低位在前，元素可以跨越
/// 字边界。文本、BWT 与采样 SA 都以此为底层存储。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedSymbolArray {
    width: u32,
    len: usize,
    words: Vec<u64>,
}

impl PackedSymbolArray {
    pub fn new(width: u32) -> Self {
        Self::with_capacity(width, 0)
    }

    pub fn with_capacity(width: u32, capacity: usize) -> Self {
        assert!((1..=64).contains(&width), "element width must be in 1..=64");
        Self {
            width,
            len: 0,
            words: Vec::with_capacity(words_for_bits(capacity * width as usize)),
        }
    }

    /// 长度为 `len` 的全零数组
    pub fn zeroed(width: u32, len: usize) -> Self {
        let mut a = Self::with_capacity(width, len);
        a.words.resize(words_for_bits(len * width as usize), 0);
        a.len = len;
        a
    }

    pub fn from_codes(width: u32, codes: &[u8]) -> Self {
        let mut a = Self::with_capacity(width, codes.len());
        for &c in codes {
            a.push(c as u64);
        }
        a
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// 占用的字节数
    pub fn space_bytes(&self) -> usize {
        self.words.len() * 8
    }

    #[inline]
    fn read_bits(&self, bit: usize, nbits: usize) -> u64 {
        let wi = bit / WORD_BITS;
        let off = bit % WORD_BITS;
        let mut v = self.words[wi] >> off;
        if off + nbits > WORD_BITS {
            v |= self.words[wi + 1] << (WORD_BITS - off);
        }
        v & low_mask(nbits)
    }

    #[inline]
    pub fn read(&self, i: usize) -> u64 {
        assert!(i < self.len, "index {} out of bounds ({})", i, self.len);
        let w = self.width as usize;
        self.read_bits(i * w, w)
    }

    #[inline]
    pub fn write(&mut self, i: usize, value: u64) {
        assert!(i < self.len, "index {} out of bounds ({})", i, self.len);
        let w = self.width as usize;
        let mask = low_mask(w);
        let value = value & mask;
        let bit = i * w;
        let wi = bit / WORD_BITS;
        let off = bit % WORD_BITS;
        self.words[wi] = (self.words[wi] & !(mask << off)) | (value << off);
        if off + w > WORD_BITS {
            let spill = off + w - WORD_BITS;
            let hi_mask = low_mask(spill);
            self.words[wi + 1] = (self.words[wi + 1] & !hi_mask) | (value >> (WORD_BITS - off));
        }
    }

    pub fn push(&mut self, value: u64) {
        let need = words_for_bits((self.len + 1) * self.width as usize);
        if need > self.words.len() {
            self.words.push(0);
        }
        self.len += 1;
        self.write(self.len - 1, value);
    }

    /// 将 `[i, i+num)` 的元素打包成一个字返回（第 i 个元素在最低位）。
    /// 要求 `num * width <= 64` 且不越界。
    #[inline]
    pub fn pack_read(&self, i: usize, num: usize) -> u64 {
        let w = self.width as usize;
        debug_assert!(num * w <= WORD_BITS);
        assert!(i + num <= self.len, "packed read past the end");
        if num == 0 {
            return 0;
        }
        self.read_bits(i * w, num * w)
    }

    /// 一个字中能容纳的元素个数
    #[inline]
    pub fn elems_per_word(&self) -> usize {
        WORD_BITS / self.width as usize
    }

    /// 从 `a` 与 `b` 开始的两个后缀的最长公共前缀长度，最多比较 `limit` 个元素；
    /// 任一后缀到达末尾即停止。
    pub fn lcp(&self, a: usize, b: usize, limit: usize) -> usize {
        if a == b {
            return limit.min(self.len - a);
        }
        let w = self.width as usize;
        let step = self.elems_per_word();
        let mut m = 0;
        loop {
            let remaining = (limit - m)
                .min(self.len.saturating_sub(a + m))
                .min(self.len.saturating_sub(b + m));
            if remaining == 0 {
                return m;
            }
            let t = step.min(remaining);
            let xa = self.pack_read(a + m, t);
            let xb = self.pack_read(b + m, t);
            if xa == xb {
                m += t;
            } else {
                return m + (xa ^ xb).trailing_zeros() as usize / w;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(move |i| self.read(i))
    }

    pub fn to_codes(&self) -> Vec<u8> {
        self.iter().map(|v| v as u8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_straddles_words() {
        let mut a = PackedSymbolArray::zeroed(5, 40);
        for i in 0..40 {
            a.write(i, (i as u64 * 7) % 32);
        }
        for i in 0..40 {
            assert_eq!(a.read(i), (i as u64 * 7) % 32);
        }
        // 覆盖写不影响邻居
        a.write(12, 31);
        assert_eq!(a.read(11), (11 * 7) % 32);
        assert_eq!(a.read(12), 31);
        assert_eq!(a.read(13), (13 * 7) % 32);
    }

    #[test]
    fn push_grows() {
        let mut a = PackedSymbolArray::new(3);
        for i in 0..100u64 {
            a.push(i % 8);
        }
        assert_eq!(a.len(), 100);
        assert_eq!(a.read(99), 3);
        assert_eq!(a.iter().filter(|&v| v == 0).count(), 13);
    }

    #[test]
    fn pack_read_low_first() {
        let a = PackedSymbolArray::from_codes(2, &[0, 1, 2, 3, 3, 2]);
        assert_eq!(a.pack_read(1, 3), 1 | (2 << 2) | (3 << 4));
        assert_eq!(a.pack_read(0, 0), 0);
        // 63 个 1 位元素 + 越过字边界
        let b = PackedSymbolArray::from_codes(1, &[1; 70]);
        assert_eq!(b.pack_read(5, 64), !0);
    }

    #[test]
    fn lcp_word_parallel() {
        let codes: Vec<u8> = b"ACGTACGTACGAACGT"
            .iter()
            .map(|&c| match c {
                b'A' => 0,
                b'C' => 1,
                b'G' => 2,
                _ => 3,
            })
            .collect();
        let a = PackedSymbolArray::from_codes(2, &codes);
        assert_eq!(a.lcp(0, 4, 100), 7);
        assert_eq!(a.lcp(0, 12, 100), 4);
        assert_eq!(a.lcp(0, 4, 3), 3);
        assert_eq!(a.lcp(3, 3, 100), 13);

        let long: Vec<u8> = (0..200).map(|i| (i % 4) as u8).collect();
        let l = PackedSymbolArray::from_codes(2, &long);
        assert_eq!(l.lcp(0, 4, usize::MAX), 196);
    }

    #[test]
    fn lcp_stops_at_limit_across_words() {
        let periodic: Vec<u8> = (0..300).map(|i| (i % 4) as u8).collect();
        let p = PackedSymbolArray::from_codes(2, &periodic);
        for limit in [1, 3, 31, 32, 33, 64, 70, 150] {
            assert_eq!(p.lcp(0, 4, limit), limit, "limit {limit}");
            assert_eq!(p.lcp(8, 100, limit), limit, "limit {limit}");
        }
        assert_eq!(p.lcp(0, 4, 1000), 296);
    }
}
