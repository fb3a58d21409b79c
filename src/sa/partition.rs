//! Selected/unselected index bookkeeping.

/// A cardinality-preserving move: `removed` leaves the portfolio and
/// `added` enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swap {
    /// Currently selected index, set to 0 by the move.
    pub removed: usize,
    /// Currently unselected index, set to 1 by the move.
    pub added: usize,
}

/// Partition of `0..N` into a selected set of size K and an unselected set
/// of size N − K.
///
/// Stored as a single arena: `order[..k]` holds the selected indices and
/// `order[k..]` the unselected ones, with `slot` as the inverse map. A swap
/// exchanges two arena entries, so committing a move is O(1).
#[derive(Debug, Clone)]
pub struct IndexPartition {
    order: Vec<usize>,
    slot: Vec<usize>,
    k: usize,
}

impl IndexPartition {
    /// Builds a partition whose selected set is `order[..k]`.
    ///
    /// Returns `None` unless `order` is a permutation of `0..order.len()`
    /// and `k <= order.len()`.
    pub fn from_order(order: Vec<usize>, k: usize) -> Option<Self> {
        let n = order.len();
        if k > n {
            return None;
        }
        let mut slot = vec![usize::MAX; n];
        for (pos, &i) in order.iter().enumerate() {
            if i >= n || slot[i] != usize::MAX {
                return None;
            }
            slot[i] = pos;
        }
        Some(Self { order, slot, k })
    }

    /// Builds a partition from a shuffled `0..n`.
    pub(crate) fn from_permutation(order: Vec<usize>, k: usize) -> Self {
        debug_assert!(k <= order.len());
        let mut slot = vec![0; order.len()];
        for (pos, &i) in order.iter().enumerate() {
            slot[i] = pos;
        }
        Self { order, slot, k }
    }

    /// Builds a partition from selected indices (ascending arena order).
    ///
    /// Returns `None` if an index is `>= n` or repeated.
    pub fn from_selected(n: usize, selected: &[usize]) -> Option<Self> {
        let mut is_selected = vec![false; n];
        for &i in selected {
            if i >= n || is_selected[i] {
                return None;
            }
            is_selected[i] = true;
        }
        let mut order: Vec<usize> = selected.to_vec();
        order.extend((0..n).filter(|&i| !is_selected[i]));
        Some(Self::from_permutation(order, selected.len()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Size of the selected set.
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn selected(&self) -> &[usize] {
        &self.order[..self.k]
    }

    pub fn unselected(&self) -> &[usize] {
        &self.order[self.k..]
    }

    pub fn is_selected(&self, i: usize) -> bool {
        self.slot[i] < self.k
    }

    /// Number of distinct swaps available, `K * (N - K)`.
    pub fn neighborhood_size(&self) -> usize {
        self.k * (self.order.len() - self.k)
    }

    /// Commits `swap`: `removed` moves to the unselected region and `added`
    /// takes its place in the selected region.
    pub fn commit(&mut self, swap: Swap) {
        let out_pos = self.slot[swap.removed];
        let in_pos = self.slot[swap.added];
        debug_assert!(out_pos < self.k, "index {} is not selected", swap.removed);
        debug_assert!(in_pos >= self.k, "index {} is already selected", swap.added);

        self.order.swap(out_pos, in_pos);
        self.slot[swap.removed] = in_pos;
        self.slot[swap.added] = out_pos;
    }

    /// Whether the selected region is exactly the set of ones in `x`.
    pub fn matches(&self, x: &[u8]) -> bool {
        x.len() == self.order.len()
            && x.iter()
                .enumerate()
                .all(|(i, &b)| (b == 1) == self.is_selected(i))
    }
}
