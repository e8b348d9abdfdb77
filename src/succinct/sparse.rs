use serde::{Deserialize, Serialize};

use crate::succinct::bitvector::{BitBuffer, Bitvector, RankSelect};
use crate::succinct::packed::PackedSymbolArray;
use crate::util::bits::low_mask;

/// 稀疏位向量（高低位拆分 / Elias–Fano）。
///
/// 每个置位位置拆成低 `low_bits` 位（定宽数组）和高位部分（一元编码到
/// 一个带 rank/select 的位向量中），空间约 `m * (2 + log(n/m))` 比特。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseBitvector {
    len: usize,
    ones: usize,
    low_bits: u32,
    lows: Option<PackedSymbolArray>,
    highs: Bitvector,
}

impl SparseBitvector {
    /// `positions` 必须严格递增且小于 `len`
    pub fn from_sorted(positions: &[usize], len: usize) -> Self {
        let m = positions.len();
        let low_bits = if m == 0 || len <= m {
            0
        } else {
            (usize::BITS - 1 - (len / m).leading_zeros()) as u32
        };
        let mut lows = (low_bits > 0).then(|| PackedSymbolArray::with_capacity(low_bits, m));
        let mut highs = BitBuffer::zeroed(m + (len >> low_bits) + 1);
        let mut prev = None;
        for (i, &p) in positions.iter().enumerate() {
            assert!(p < len, "position {} out of range ({})", p, len);
            assert!(prev.map_or(true, |q| p > q), "positions must be strictly increasing");
            prev = Some(p);
            if let Some(l) = lows.as_mut() {
                l.push((p as u64) & low_mask(low_bits as usize));
            }
            highs.set((p >> low_bits) + i);
        }
        Self {
            len,
            ones: m,
            low_bits,
            lows,
            highs: highs.freeze(),
        }
    }

    #[inline]
    fn low(&self, i: usize) -> usize {
        self.lows.as_ref().map_or(0, |l| l.read(i) as usize)
    }

    pub fn space_bytes(&self) -> usize {
        self.lows.as_ref().map_or(0, PackedSymbolArray::space_bytes) + self.highs.space_bytes()
    }

    /// `[0, p)` 中 1 的个数
    fn rank_before(&self, p: usize) -> usize {
        if p == 0 {
            return 0;
        }
        if p >= self.len {
            return self.ones;
        }
        let hb = p >> self.low_bits;
        let target_low = p & low_mask(self.low_bits as usize) as usize;
        // 高位 < hb 的元素个数，以及高位 == hb 的元素在 highs 中的起点
        let (mut k, mut q) = if hb == 0 {
            (0, 0)
        } else {
            match self.highs.select0(hb) {
                Some(z) => (z + 1 - hb, z + 1),
                None => return self.ones,
            }
        };
        while q < self.highs.len() && self.highs.access(q) && self.low(k) < target_low {
            k += 1;
            q += 1;
        }
        k
    }
}

impl RankSelect for SparseBitvector {
    fn len(&self) -> usize {
        self.len
    }

    fn count_ones(&self) -> usize {
        self.ones
    }

    fn access(&self, i: usize) -> bool {
        assert!(i < self.len, "bit {} out of bounds ({})", i, self.len);
        self.rank_before(i + 1) > self.rank_before(i)
    }

    fn rank1(&self, i: usize, inclusive: bool) -> usize {
        if i >= self.len {
            return self.ones;
        }
        self.rank_before(if inclusive { i + 1 } else { i })
    }

    fn select1(&self, k: usize) -> Option<usize> {
        if k == 0 || k > self.ones {
            return None;
        }
        let h = self.highs.select1(k)? - (k - 1);
        Some((h << self.low_bits) | self.low(k - 1))
    }
}
