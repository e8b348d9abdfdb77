use std::cmp::Ordering;

use log::{debug, info};

use crate::index::dc::DifferenceCover;
use crate::succinct::packed::PackedSymbolArray;
use crate::util::bits::div_ceil;

/// 不超过这么多个后缀的区间，在公共前缀够长后直接用覆盖比较做插入排序
const SMALL_RANGE: usize = 4;

/// 多键快排到达周期深度 v 时的处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DepthLimit {
    /// 只排前 v 个符号（覆盖后缀的初始排序）
    Stop,
    /// 借助覆盖秩完成比较（完整排序）
    UseCover,
}

/// 某个切分点上一次比较留下的匹配区间：`T[start..=end]` 与切分后缀前缀相同
type CutCursor = Option<(usize, usize)>;

/// 分块后缀数组生成器。
///
/// 构造时先对差分覆盖位置上的后缀排序（多键快排 + 倍增），得到覆盖秩；
/// 再按覆盖后缀数组等间隔取切分点，把全部后缀划分成若干块。之后每个块
/// 可以独立收集、独立排序，调用方逐块消费，完整 SA 从不同时驻留内存。
///
/// 后缀序不带终止符：若一个后缀是另一个的真前缀，则它更小。
pub struct SuffixArrayGenerator<'a> {
    text: &'a PackedSymbolArray,
    n: usize,
    alphabet_size: usize,
    dc: DifferenceCover,
    /// 覆盖后缀的秩，按紧凑下标存放
    dc_rank: Vec<usize>,
    /// 切分后缀位置；`cuts[0]` 与最后一项是哨兵（负 / 正无穷）
    cuts: Vec<usize>,
    /// `cut_lcp[k][j]` = LCP(cut_k, cut_k + j)，j < min(n - cut_k, v)
    cut_lcp: Vec<Vec<usize>>,
}

impl<'a> SuffixArrayGenerator<'a> {
    pub fn new(
        text: &'a PackedSymbolArray,
        alphabet_size: usize,
        block_size: usize,
        period: usize,
    ) -> Self {
        let mut g = Self {
            text,
            n: text.len(),
            alphabet_size,
            dc: DifferenceCover::new(period),
            dc_rank: Vec::new(),
            cuts: Vec::new(),
            cut_lcp: Vec::new(),
        };
        let dc_sa = g.sort_cover_suffixes();
        g.make_cuts(&dc_sa, block_size.max(1));
        info!(
            "difference cover: period {}, {} sampled suffixes, {} chunks",
            g.dc.period(),
            dc_sa.len(),
            g.chunk_count()
        );
        g
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn period(&self) -> usize {
        self.dc.period()
    }

    /// 划分出的块数
    pub fn chunk_count(&self) -> usize {
        self.cuts.len() - 1
    }

    #[inline]
    fn sym(&self, i: usize) -> u64 {
        self.text.read(i)
    }

    /// 第一阶段：覆盖后缀先按前 v 个符号排序，再倍增细化，返回排好的覆盖后缀
    fn sort_cover_suffixes(&mut self) -> Vec<usize> {
        let n = self.n;
        let v = self.dc.period();
        let mut sa = self.dc.positions(n);
        self.multikey_qsort(&mut sa, 0, DepthLimit::Stop);

        let m = sa.len();
        let mut rank = vec![0usize; self.dc.size_for(n)];
        let mut groups: Vec<(usize, usize)> = Vec::new();
        let mut s = 0;
        for i in 1..=m {
            if i == m || self.text.lcp(sa[i - 1], sa[i], v) < v {
                for &p in &sa[s..i] {
                    rank[self.dc.compact_index(p)] = i - 1;
                }
                if i - s > 1 {
                    groups.push((s, i));
                }
                s = i;
            }
        }

        // Larsson–Sadakane 倍增：只重排尚未区分开的组；
        // 本轮新秩先缓存，整轮结束后统一写回
        let mut h = v;
        while !groups.is_empty() && h < n {
            debug!("doubling step h={}, {} unsorted groups", h, groups.len());
            let mut updates: Vec<(usize, usize)> = Vec::new();
            let mut next_groups = Vec::new();
            for &(s, e) in &groups {
                let mut keyed: Vec<((usize, usize), usize)> = sa[s..e]
                    .iter()
                    .map(|&p| (self.doubling_key(&rank, p, h), p))
                    .collect();
                keyed.sort_unstable_by_key(|&(k, _)| k);
                let mut gs = s;
                for t in s + 1..=e {
                    if t == e || keyed[t - s].0 != keyed[t - 1 - s].0 {
                        for &(_, p) in &keyed[gs - s..t - s] {
                            updates.push((self.dc.compact_index(p), t - 1));
                        }
                        if t - gs > 1 {
                            next_groups.push((gs, t));
                        }
                        gs = t;
                    }
                }
                for (t, &(_, p)) in keyed.iter().enumerate() {
                    sa[s + t] = p;
                }
            }
            for (c, r) in updates {
                rank[c] = r;
            }
            groups = next_groups;
            h *= 2;
        }
        self.dc_rank = rank;
        sa
    }

    /// 倍增排序键：越过文本末尾的后缀最小，其中更短者更小
    #[inline]
    fn doubling_key(&self, rank: &[usize], p: usize, h: usize) -> (usize, usize) {
        if p + h >= self.n {
            (0, self.n - p)
        } else {
            (1, rank[self.dc.compact_index(p + h)])
        }
    }

    fn make_cuts(&mut self, dc_sa: &[usize], block_size: usize) {
        let n = self.n;
        let v = self.dc.period();
        let m = dc_sa.len();
        let stride = div_ceil(m, div_ceil(n, block_size).max(1)).max(1);
        let blocks = div_ceil(m, stride).max(1);
        let mut cuts = vec![n; blocks + 1];
        for (k, i) in (stride..m).step_by(stride).enumerate() {
            cuts[k + 1] = dc_sa[i];
        }
        let mut cut_lcp = vec![Vec::new(); blocks + 1];
        for k in 1..blocks {
            let c = cuts[k];
            let len = (n - c).min(v);
            cut_lcp[k] = (0..len).map(|j| self.text.lcp(c, c + j, len - j)).collect();
        }
        self.cuts = cuts;
        self.cut_lcp = cut_lcp;
    }

    /// 比较两个至少共享 `delta(a, b)` 个前缀符号的后缀
    #[inline]
    fn compare_by_cover(&self, a: usize, b: usize) -> Ordering {
        let d = self.dc.delta(a, b);
        if a + d >= self.n {
            Ordering::Less
        } else if b + d >= self.n {
            Ordering::Greater
        } else {
            self.dc_rank[self.dc.compact_index(a + d)]
                .cmp(&self.dc_rank[self.dc.compact_index(b + d)])
        }
    }

    /// 后缀 i 与第 k 个切分后缀比较。同一切分点上 i 必须递增调用，
    /// 以复用上一次的匹配区间与切分点自身的 LCP 表。
    fn compare_with_cut(&self, i: usize, k: usize, cursor: &mut CutCursor) -> Ordering {
        let n = self.n;
        let c = self.cuts[k];
        if i == c {
            return Ordering::Equal;
        }
        let cut_len = (n - c).min(self.dc.period());
        let (end, matched) = match *cursor {
            Some((start, end)) if i <= end => {
                let overlap = self.cut_lcp[k][i - start];
                if i + overlap <= end {
                    // 失配点落在已知区间内，无需读切分后缀以外的符号
                    return self.sym(i + overlap).cmp(&self.sym(c + overlap));
                }
                let from = end + 1 - i;
                let ext = self.text.lcp(end + 1, c + from, cut_len - from);
                *cursor = Some((i, end + ext));
                (end + ext, end + ext - i)
            }
            _ => {
                let m = self.text.lcp(i, c, cut_len);
                if m == 0 {
                    return self.sym(i).cmp(&self.sym(c));
                }
                *cursor = Some((i, i + m - 1));
                (i + m - 1, m - 1)
            }
        };

        let text_done = end == n - 1;
        let cut_done = matched == n - c - 1;
        match (text_done, cut_done) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => match self.sym(end + 1).cmp(&self.sym(c + matched + 1)) {
                Ordering::Equal => self.compare_by_cover(i, c),
                o => o,
            },
        }
    }

    /// 把文本位置 `[start, end)` 分到块 `from..=to` 中，返回每块的位置列表。
    /// 不属于这些块的位置被丢弃。
    pub fn chunk_positions(&self, from: usize, to: usize, start: usize, end: usize) -> Vec<Vec<usize>> {
        let last = self.chunk_count() - 1;
        let mut buckets = vec![Vec::new(); to - from + 1];
        let mut cursors: Vec<CutCursor> = vec![None; to - from + 2];
        for i in start..end {
            if from > 0 && self.compare_with_cut(i, from, &mut cursors[0]) == Ordering::Less {
                continue;
            }
            if to < last
                && self.compare_with_cut(i, to + 1, &mut cursors[to + 1 - from]) != Ordering::Less
            {
                continue;
            }
            // 第一个严格大于后缀 i 的切分点
            let (mut lo, mut hi) = (from + 1, to + 1);
            while lo < hi {
                let mid = (lo + hi) / 2;
                if self.compare_with_cut(i, mid, &mut cursors[mid - from]) == Ordering::Less {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            buckets[lo - 1 - from].push(i);
        }
        buckets
    }

    /// 对一个块内的后缀完整排序
    pub fn sort_suffixes(&self, sa: &mut [usize]) {
        self.multikey_qsort(sa, 0, DepthLimit::UseCover);
    }

    /// 顺序生成完整后缀数组（测试与小文本用）
    pub fn collect_suffix_array(&self) -> Vec<usize> {
        let mut sa = Vec::with_capacity(self.n);
        for k in 0..self.chunk_count() {
            let mut chunk = self.chunk_positions(k, k, 0, self.n).pop().unwrap_or_default();
            self.sort_suffixes(&mut chunk);
            sa.extend(chunk);
        }
        sa
    }

    fn multikey_qsort(&self, sa: &mut [usize], depth: usize, limit: DepthLimit) {
        let mut counts = vec![0usize; self.alphabet_size + 1];
        self.mkqs(sa, depth, limit, &mut counts);
    }

    #[inline]
    fn bucket(&self, p: usize, depth: usize) -> usize {
        if p + depth >= self.n {
            0
        } else {
            self.sym(p + depth) as usize + 1
        }
    }

    /// 三路多键快排。区间内后缀共享前 `depth` 个符号；越过末尾的后缀归入
    /// 最小的桶 0。对小于区间递归、等于区间深度加一递归、大于区间原地循环。
    fn mkqs(&self, mut sa: &mut [usize], mut depth: usize, limit: DepthLimit, counts: &mut [usize]) {
        let v = self.dc.period();
        loop {
            if sa.len() <= 1 {
                return;
            }
            if depth >= v {
                if limit == DepthLimit::UseCover {
                    sa.sort_unstable_by(|&a, &b| self.compare_by_cover(a, b));
                }
                return;
            }
            let small = limit == DepthLimit::UseCover && sa.len() <= SMALL_RANGE;
            let target = if small { self.dc.max_delta(sa).min(v) } else { v };
            depth = self.skip_common_prefix(sa, depth, target);
            if small && depth >= target {
                self.insertion_sort_by_cover(sa);
                return;
            }
            if depth >= v {
                continue;
            }

            counts.fill(0);
            for &p in sa.iter() {
                counts[self.bucket(p, depth)] += 1;
            }
            if counts.iter().filter(|&&c| c > 0).count() == 1 {
                if counts[0] > 0 {
                    return;
                }
                depth += 1;
                continue;
            }
            let mut acc = 0;
            let mut pivot = 0;
            for (b, &c) in counts.iter().enumerate() {
                acc += c;
                if acc * 2 >= sa.len() {
                    pivot = b;
                    break;
                }
            }

            let (mut lt, mut i, mut gt) = (0, 0, sa.len());
            while i < gt {
                match self.bucket(sa[i], depth).cmp(&pivot) {
                    Ordering::Less => {
                        sa.swap(lt, i);
                        lt += 1;
                        i += 1;
                    }
                    Ordering::Greater => {
                        gt -= 1;
                        sa.swap(i, gt);
                    }
                    Ordering::Equal => i += 1,
                }
            }
            let (left, rest) = std::mem::take(&mut sa).split_at_mut(lt);
            let (mid, right) = rest.split_at_mut(gt - lt);
            self.mkqs(left, depth, limit, counts);
            // 桶 0（已到末尾）至多一个后缀
            if pivot != 0 {
                self.mkqs(mid, depth + 1, limit, counts);
            }
            sa = right;
        }
    }

    /// 按字并行跳过区间内所有后缀的公共前缀，不超过 `stop`
    fn skip_common_prefix(&self, sa: &[usize], mut depth: usize, stop: usize) -> usize {
        let width = self.text.width() as usize;
        let step = self.text.elems_per_word();
        while depth < stop {
            let t = step.min(stop - depth);
            let first = sa[0];
            if first + depth + t > self.n {
                return depth;
            }
            let w0 = self.text.pack_read(first + depth, t);
            let mut common = t;
            for &p in &sa[1..] {
                if p + depth + t > self.n {
                    return depth;
                }
                let w = self.text.pack_read(p + depth, t);
                if w != w0 {
                    common = common.min((w ^ w0).trailing_zeros() as usize / width);
                }
            }
            depth += common;
            if common < t {
                return depth;
            }
        }
        depth
    }

    fn insertion_sort_by_cover(&self, sa: &mut [usize]) {
        for i in 1..sa.len() {
            let mut j = i;
            while j > 0 && self.compare_by_cover(sa[j - 1], sa[j]) == Ordering::Greater {
                sa.swap(j - 1, j);
                j -= 1;
            }
        }
    }
}

/// O(n) 检查 `sa` 是否为 `text` 的后缀数组（无终止符，真前缀更小）
pub fn validate_suffix_array(text: &PackedSymbolArray, sa: &[usize]) -> bool {
    let n = text.len();
    if sa.len() != n {
        return false;
    }
    let mut isa = vec![usize::MAX; n];
    for (r, &p) in sa.iter().enumerate() {
        if p >= n || isa[p] != usize::MAX {
            return false;
        }
        isa[p] = r;
    }
    for r in 1..n {
        let (a, b) = (sa[r - 1], sa[r]);
        match text.read(a).cmp(&text.read(b)) {
            Ordering::Greater => return false,
            Ordering::Less => {}
            Ordering::Equal => {
                if b + 1 == n {
                    return false;
                }
                if a + 1 < n && isa[a + 1] > isa[b + 1] {
                    return false;
                }
            }
        }
    }
    true
}
