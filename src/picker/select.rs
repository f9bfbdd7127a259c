use crate::picker::state::PersistedState;
use rand::Rng;
use rand::RngExt;

/// Indices of the items eligible for the next pick.
///
/// With avoid-repeats on, items matching the most recent winner's text sit
/// out one round; the match is by text, so duplicate-text entries sit out as
/// a group. When filtering would leave nothing to pick from, the full list
/// is used instead.
pub fn eligible_pool(state: &PersistedState) -> Vec<usize> {
    let all = || (0..state.items.len()).collect::<Vec<_>>();
    if !state.avoid_repeats {
        return all();
    }
    let Some(last) = state.history.first() else {
        return all();
    };
    let filtered: Vec<usize> = state
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.text != *last)
        .map(|(i, _)| i)
        .collect();
    if filtered.is_empty() { all() } else { filtered }
}

/// Weighted draw: walk the cumulative weights and take the first slot the
/// uniform draw lands in. Zero weights count as 1. Never call this with an
/// empty slice.
pub fn pick_weighted<R: Rng>(rng: &mut R, weights: &[u32]) -> usize {
    debug_assert!(!weights.is_empty());
    let total: u64 = weights.iter().map(|&w| u64::from(w.max(1))).sum();
    let r = rng.random_range(0.0..total as f64);
    let mut acc = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        acc += f64::from(w.max(1));
        if r <= acc {
            return i;
        }
    }
    weights.len() - 1
}
