//! The roulette spin, as an explicit state machine.
//!
//! `Idle -> Spinning -> Settling -> Idle`, advanced by a dt-driven
//! [`update`]. While spinning, an ease-out-cubic curve walks a virtual
//! cursor across the pool, fast at first and slowing toward the end; at
//! full progress the winner comes from an independent weighted draw, and a
//! short settle lockout absorbs trailing input before the next pick.

use crate::config;
use crate::picker::select;
use crate::picker::state::Item;
use log::debug;
use rand::RngExt;
use rand::Rng;

// Virtual cursor steps per spin: max(MIN_STEPS, floor(STEP_BASE + n * STEP_FACTOR)).
const MIN_STEPS: u32 = 10;
const STEP_BASE: f32 = 14.0;
const STEP_FACTOR: f32 = 1.6;

/// One entry of the pool snapshot taken when a spin starts. List edits made
/// mid-spin cannot affect an outcome in flight.
#[derive(Debug, Clone)]
struct Candidate {
    /// Absolute position in the item list, for cursor display.
    index: usize,
    text: String,
    weight: u32,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Spinning { elapsed: f32, total: f32 },
    Settling { remaining: f32 },
}

pub struct State {
    phase: Phase,
    candidates: Vec<Candidate>,
    steps: u32,
    cursor: Option<usize>,
}

/// What a frame tick produced. `Cursor` doubles as the scroll-into-view
/// request for the highlighted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinAction {
    None,
    Cursor(usize),
    Winner { index: usize, text: String },
    /// The settle lockout expired; picks are accepted again.
    Unlocked,
}

pub fn init() -> State {
    State {
        phase: Phase::Idle,
        candidates: Vec::new(),
        steps: 0,
        cursor: None,
    }
}

#[inline(always)]
pub const fn is_busy(state: &State) -> bool {
    !matches!(state.phase, Phase::Idle)
}

#[inline(always)]
pub const fn cursor(state: &State) -> Option<usize> {
    state.cursor
}

/// Drops the highlight without touching an in-flight spin.
pub fn clear_cursor(state: &mut State) {
    state.cursor = None;
}

/// Starts a spin over `pool` (absolute indices into `items`). A no-op while
/// a spin is in flight or when the pool is empty.
pub fn start<R: Rng>(state: &mut State, items: &[Item], pool: &[usize], rng: &mut R) -> bool {
    if is_busy(state) || pool.is_empty() {
        return false;
    }
    state.candidates = pool
        .iter()
        .map(|&index| Candidate {
            index,
            text: items[index].text.clone(),
            weight: items[index].weight,
        })
        .collect();

    // Total duration is drawn fresh for every spin.
    let cfg = config::get();
    let total = rng.random_range(cfg.spin_min_ms as f32..cfg.spin_max_ms as f32) / 1000.0;
    state.steps = steps_for(state.candidates.len());
    state.phase = Phase::Spinning {
        elapsed: 0.0,
        total,
    };
    debug!(
        "spin started: {} candidates, {:.0}ms, {} steps",
        state.candidates.len(),
        total * 1000.0,
        state.steps
    );
    true
}

fn steps_for(pool_len: usize) -> u32 {
    let scaled = (STEP_BASE + pool_len as f32 * STEP_FACTOR).floor() as u32;
    scaled.max(MIN_STEPS)
}

#[inline(always)]
fn ease_out_cubic(p: f32) -> f32 {
    1.0 - (1.0 - p).powi(3)
}

/// Advances the machine by `dt` seconds.
pub fn update<R: Rng>(state: &mut State, dt: f32, rng: &mut R) -> SpinAction {
    match state.phase {
        Phase::Idle => SpinAction::None,
        Phase::Spinning { elapsed, total } => {
            let elapsed = elapsed + dt.max(0.0);
            let p = (elapsed / total).min(1.0);
            if p < 1.0 {
                state.phase = Phase::Spinning { elapsed, total };
                let pos = (ease_out_cubic(p) * state.steps as f32).floor() as usize
                    % state.candidates.len();
                let index = state.candidates[pos].index;
                state.cursor = Some(index);
                SpinAction::Cursor(index)
            } else {
                // The cursor walk is presentation only; the winner is an
                // independent weighted draw over the snapshot.
                let weights: Vec<u32> = state.candidates.iter().map(|c| c.weight).collect();
                let winner = &state.candidates[select::pick_weighted(rng, &weights)];
                let (index, text) = (winner.index, winner.text.clone());
                state.cursor = Some(index);
                state.phase = Phase::Settling {
                    remaining: config::get().settle_delay_ms as f32 / 1000.0,
                };
                debug!("spin settled on '{text}' (item {index})");
                SpinAction::Winner { index, text }
            }
        }
        Phase::Settling { remaining } => {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                state.phase = Phase::Idle;
                state.candidates.clear();
                SpinAction::Unlocked
            } else {
                state.phase = Phase::Settling { remaining };
                SpinAction::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SpinAction, cursor, init, is_busy, start, update};
    use crate::picker::state::Item;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FRAME: f32 = 1.0 / 60.0;

    fn items(texts: &[&str]) -> Vec<Item> {
        texts
            .iter()
            .map(|t| Item {
                id: t.to_lowercase(),
                text: t.to_string(),
                weight: 5,
            })
            .collect()
    }

    /// Ticks until the winner lands; panics if the spin never settles.
    fn run_to_winner(state: &mut super::State, rng: &mut StdRng) -> (usize, String) {
        for _ in 0..1_000 {
            match update(state, FRAME, rng) {
                SpinAction::Winner { index, text } => return (index, text),
                SpinAction::Cursor(_) | SpinAction::None => {}
                SpinAction::Unlocked => panic!("unlocked before a winner"),
            }
        }
        panic!("spin did not settle within 1000 frames");
    }

    fn run_to_idle(state: &mut super::State, rng: &mut StdRng) {
        for _ in 0..1_000 {
            if update(state, FRAME, rng) == SpinAction::Unlocked {
                return;
            }
        }
        panic!("spin did not unlock within 1000 frames");
    }

    #[test]
    fn start_refuses_an_empty_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = init();
        assert!(!start(&mut state, &[], &[], &mut rng));
        assert!(!is_busy(&state));
    }

    #[test]
    fn start_is_a_noop_while_busy() {
        let mut rng = StdRng::seed_from_u64(4);
        let all = items(&["A", "B"]);
        let mut state = init();
        assert!(start(&mut state, &all, &[0, 1], &mut rng));
        assert!(!start(&mut state, &all, &[0, 1], &mut rng));

        // Still locked during the settle delay.
        run_to_winner(&mut state, &mut rng);
        assert!(is_busy(&state));
        assert!(!start(&mut state, &all, &[0, 1], &mut rng));

        run_to_idle(&mut state, &mut rng);
        assert!(start(&mut state, &all, &[0, 1], &mut rng));
    }

    #[test]
    fn spin_settles_on_a_pool_member_and_returns_to_idle() {
        let mut rng = StdRng::seed_from_u64(5);
        let all = items(&["A", "B", "C"]);
        let mut state = init();
        // Pool excludes item 0; the winner must come from the pool.
        assert!(start(&mut state, &all, &[1, 2], &mut rng));

        let (index, text) = run_to_winner(&mut state, &mut rng);
        assert!(index == 1 || index == 2);
        assert_eq!(text, all[index].text);
        assert_eq!(cursor(&state), Some(index));

        run_to_idle(&mut state, &mut rng);
        assert!(!is_busy(&state));
        // The final cursor stays on the winner after the machine idles.
        assert_eq!(cursor(&state), Some(index));
    }

    #[test]
    fn cursor_walk_stays_inside_the_pool() {
        let mut rng = StdRng::seed_from_u64(6);
        let all = items(&["A", "B", "C", "D"]);
        let mut state = init();
        assert!(start(&mut state, &all, &[0, 2, 3], &mut rng));

        loop {
            match update(&mut state, FRAME, &mut rng) {
                SpinAction::Cursor(index) => assert!([0, 2, 3].contains(&index)),
                SpinAction::Winner { index, .. } => {
                    assert!([0, 2, 3].contains(&index));
                    break;
                }
                SpinAction::None => {}
                SpinAction::Unlocked => panic!("unlocked before a winner"),
            }
        }
    }

    #[test]
    fn snapshot_isolates_the_spin_from_list_edits() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut all = items(&["A", "B"]);
        let mut state = init();
        assert!(start(&mut state, &all, &[0, 1], &mut rng));

        // A rename mid-spin does not change the committed winner text.
        all[0].text = "Changed".to_string();
        all[1].text = "Changed".to_string();
        let (_, text) = run_to_winner(&mut state, &mut rng);
        assert!(text == "A" || text == "B");
    }
}
