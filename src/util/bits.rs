//! 字级位运算工具：popcount、字内 select、以及 rank/select 目录使用的
//! 9 位 / 8 位 lane 并行比较。

pub const WORD_BITS: usize = 64;

/// 每个 9 位 lane 的最低位（7 个 lane）
pub const L9: u64 = 0x0040_2010_0804_0201;
/// 每个 9 位 lane 的最高位
pub const H9: u64 = L9 << 8;
/// 每个字节的最低位
pub const L8: u64 = 0x0101_0101_0101_0101;
/// 每个字节的最高位
pub const H8: u64 = L8 << 7;

/// ceil(log2(x))，x <= 1 时为 0
#[inline]
pub fn log2_ceil(x: usize) -> u32 {
    if x <= 1 {
        0
    } else {
        usize::BITS - (x - 1).leading_zeros()
    }
}

#[inline]
pub fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

#[inline]
pub fn words_for_bits(bits: usize) -> usize {
    div_ceil(bits, WORD_BITS)
}

#[inline]
pub fn bit_get(words: &[u64], i: usize) -> bool {
    (words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
}

#[inline]
pub fn bit_set(words: &mut [u64], i: usize) {
    words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
}

/// 低 `k` 位全 1 的掩码，k 可为 64
#[inline]
pub fn low_mask(k: usize) -> u64 {
    if k >= WORD_BITS {
        !0
    } else {
        (1u64 << k) - 1
    }
}

/// 逐 lane 判断 x <= y（9 位 lane，结果落在每个 lane 的最高位）
#[inline]
pub fn lanes9_le(x: u64, y: u64) -> u64 {
    ((((y | H9).wrapping_sub(x & !H9)) | (x ^ y)) ^ (x & !y)) & H9
}

/// 逐字节判断 x <= y
#[inline]
pub fn lanes8_le(x: u64, y: u64) -> u64 {
    ((((y | H8).wrapping_sub(x & !H8)) | (x ^ y)) ^ (x & !y)) & H8
}

/// 字内第 k 个（0 起）置位比特的位置，要求 k < popcount(x)。
///
/// 先求字节前缀和，再用字节 lane 比较定位字节，最后在字节内扫描。
#[inline]
pub fn select_in_word(x: u64, k: u32) -> u32 {
    debug_assert!(k < x.count_ones());
    let mut sums = x - ((x & 0xAAAA_AAAA_AAAA_AAAA) >> 1);
    sums = (sums & 0x3333_3333_3333_3333) + ((sums >> 2) & 0x3333_3333_3333_3333);
    sums = (sums + (sums >> 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    sums = sums.wrapping_mul(L8);

    let kk = k as u64 * L8;
    // 前缀和 <= k 的字节个数即目标字节下标
    let place = (((lanes8_le(sums, kk) >> 7).wrapping_mul(L8) >> 53) & !0x7) as u32;
    let before = ((sums << 8) >> place) & 0xFF;
    let mut byte = (x >> place) & 0xFF;
    let mut rest = k as u64 - before;
    while rest > 0 {
        byte &= byte - 1;
        rest -= 1;
    }
    place + byte.trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_select(x: u64, k: u32) -> u32 {
        let mut seen = 0;
        for i in 0..64 {
            if (x >> i) & 1 == 1 {
                if seen == k {
                    return i;
                }
                seen += 1;
            }
        }
        unreachable!()
    }

    #[test]
    fn log2_ceil_small_values() {
        assert_eq!(log2_ceil(0), 0);
        assert_eq!(log2_ceil(1), 0);
        assert_eq!(log2_ceil(2), 1);
        assert_eq!(log2_ceil(3), 2);
        assert_eq!(log2_ceil(4), 2);
        assert_eq!(log2_ceil(5), 3);
        assert_eq!(log2_ceil(1 << 20), 20);
    }

    #[test]
    fn select_in_word_matches_scan() {
        let words = [
            1u64,
            !0u64,
            0x8000_0000_0000_0000,
            0xF0F0_0000_0F00_00F1,
            0x0123_4567_89AB_CDEF,
            0xAAAA_AAAA_AAAA_AAAA,
        ];
        for &w in &words {
            for k in 0..w.count_ones() {
                assert_eq!(select_in_word(w, k), naive_select(w, k), "word {w:#x} k {k}");
            }
        }
    }

    #[test]
    fn lanes9_compare() {
        let x = 3 | (300 << 9) | (7 << 18);
        let y = 5 * L9;
        let r = lanes9_le(x, y);
        assert_eq!((r >> 8) & 1, 1);
        assert_eq!((r >> 17) & 1, 0);
        assert_eq!((r >> 26) & 1, 0);
        // 空 lane 的 0 <= 5
        assert_eq!((r >> 35) & 1, 1);
    }
}
