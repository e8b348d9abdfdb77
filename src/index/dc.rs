/// 周期的下限：更小的周期没有可用的构造
pub const MIN_PERIOD: usize = 14;

const NOT_IN_COVER: u32 = u32::MAX;

/// 周期为 v 的差分覆盖 D ⊂ [0, v)：任一余数 r 都能写成 D 中两元素之差 (mod v)。
///
/// 用 Wichmann 标尺（Colbourn–Ling 构造）生成，|D| = 6r + 4 = Θ(√v)。
/// 两个前 v 个符号相同的后缀，可以各自平移 `delta` 落到 D 中的位置，
/// 再比较这两个位置上已排好的秩。
#[derive(Debug, Clone)]
pub struct DifferenceCover {
    v: usize,
    cover: Vec<usize>,
    /// 余数 -> cover 中的下标，不在 cover 中为 NOT_IN_COVER
    slot: Vec<u32>,
    /// `anchor[r]` 为某个 d ∈ D，且 (d + r) mod v 也在 D 中
    anchor: Vec<usize>,
}

/// 满足 24r² + 36r + 13 >= v 的最小 r
fn ruler_order(v: usize) -> usize {
    let disc = 1296.0 - 96.0 * (13.0 - v as f64);
    ((-36.0 + disc.sqrt()) / 48.0).ceil().max(0.0) as usize
}

/// Wichmann 标尺第 i 段的长度
fn ruler_step(i: usize, r: usize) -> usize {
    if i < r {
        1
    } else if i < r + 1 {
        r + 1
    } else if i < 2 * r + 1 {
        2 * r + 1
    } else if i < 4 * r + 2 {
        4 * r + 3
    } else if i < 5 * r + 3 {
        2 * r + 2
    } else {
        1
    }
}

impl DifferenceCover {
    pub fn new(period: usize) -> Self {
        let v = period.max(MIN_PERIOD);
        let r = ruler_order(v);

        let mut raw = Vec::with_capacity(6 * r + 4);
        raw.push(0usize);
        for i in 1..=6 * r + 3 {
            let prev = raw[i - 1];
            raw.push(prev + ruler_step(i - 1, r));
        }
        let mut cover: Vec<usize> = raw.into_iter().map(|x| x % v).collect();
        cover.sort_unstable();
        cover.dedup();

        let mut slot = vec![NOT_IN_COVER; v];
        for (i, &d) in cover.iter().enumerate() {
            slot[d] = i as u32;
        }
        let mut anchor = vec![usize::MAX; v];
        for &di in &cover {
            for &dj in &cover {
                anchor[(dj + v - di) % v] = di;
            }
        }
        anchor[0] = 0;

        Self {
            v,
            cover,
            slot,
            anchor,
        }
    }

    /// 周期 v 对应的覆盖大小估计；v 过小时为 `None`
    pub fn estimate_size(period: usize) -> Option<usize> {
        if period < MIN_PERIOD {
            None
        } else {
            Some(6 * ruler_order(period) + 4)
        }
    }

    #[inline]
    pub fn period(&self) -> usize {
        self.v
    }

    pub fn cover(&self) -> &[usize] {
        &self.cover
    }

    #[inline]
    pub fn is_in_cover(&self, i: usize) -> bool {
        self.slot[i % self.v] != NOT_IN_COVER
    }

    /// 长度为 n 的文本中属于覆盖的位置个数
    pub fn size_for(&self, n: usize) -> usize {
        let tail = n % self.v;
        n / self.v * self.cover.len() + self.cover.iter().take_while(|&&d| d < tail).count()
    }

    /// 将覆盖位置映射到 `[0, size_for(n))` 的紧凑下标（保持文本顺序）
    #[inline]
    pub fn compact_index(&self, i: usize) -> usize {
        i / self.v * self.cover.len() + self.slot[i % self.v] as usize
    }

    /// 文本 `[0, n)` 中全部覆盖位置，升序
    pub fn positions(&self, n: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.size_for(n));
        let mut base = 0;
        while base < n {
            for &d in &self.cover {
                if base + d >= n {
                    break;
                }
                out.push(base + d);
            }
            base += self.v;
        }
        out
    }

    /// 最小的 δ >= 0，使 i+δ 与 j+δ 都落在覆盖中
    #[inline]
    pub fn delta(&self, i: usize, j: usize) -> usize {
        let v = self.v;
        let ri = i % v;
        let rj = j % v;
        let d1 = (self.anchor[(rj + v - ri) % v] + v - ri) % v;
        let d2 = (self.anchor[(ri + v - rj) % v] + v - rj) % v;
        d1.min(d2)
    }

    /// 任意两个位置的 delta 上界
    pub fn max_delta(&self, positions: &[usize]) -> usize {
        let mut m = 0;
        for (a, &i) in positions.iter().enumerate() {
            for &j in &positions[a + 1..] {
                m = m.max(self.delta(i, j));
            }
        }
        m
    }
}
