//! Feasible start states and the swap neighborhood.

use super::partition::{IndexPartition, Swap};
use crate::selection::Selection;
use rand::seq::SliceRandom;
use rand::Rng;

/// Draws a uniformly random selection with exactly `k` ones.
///
/// Shuffles `0..n` with `rng` and selects the first `k` positions; the
/// shuffled permutation becomes the partition arena. Same RNG state, same
/// result.
///
/// # Panics
///
/// Panics if `k > n`.
pub fn initial_state<R: Rng>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> (Selection, IndexPartition) {
    debug_assert!(k <= n);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let x = Selection::from_indices(n, &order[..k]);
    (x, IndexPartition::from_permutation(order, k))
}

/// Proposes a swap: `removed` uniform over the selected set, then `added`
/// uniform over the unselected set.
///
/// Returns `None` if either set is empty (K = 0 or K = N), in which case no
/// move exists.
pub fn propose_swap<R: Rng>(partition: &IndexPartition, rng: &mut R) -> Option<Swap> {
    let selected = partition.selected();
    let unselected = partition.unselected();
    if selected.is_empty() || unselected.is_empty() {
        return None;
    }
    let removed = selected[rng.random_range(0..selected.len())];
    let added = unselected[rng.random_range(0..unselected.len())];
    Some(Swap { removed, added })
}
