//! The widget facade: one persisted list, one spin machine, one rng.
//!
//! Every mutation goes through best-effort persistence in the same tick it
//! happens; the spin outcome is applied here (selected value + history) so
//! callers only route actions to their presentation layer.

use crate::picker::select;
use crate::picker::spin::{self, SpinAction};
use crate::picker::state::PersistedState;
use crate::picker::storage::{self, KvStore};
use crate::picker::transfer;
use rand::rngs::StdRng;

pub struct Session<S: KvStore> {
    store: S,
    state: PersistedState,
    spin: spin::State,
    rng: StdRng,
    selected: Option<String>,
}

impl<S: KvStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self::with_rng(store, rand::make_rng::<StdRng>())
    }

    /// Seeded constructor, for deterministic drives.
    pub fn with_rng(store: S, mut rng: StdRng) -> Self {
        let state = storage::load_initial(&store, &mut rng);
        Self {
            store,
            state,
            spin: spin::init(),
            rng,
            selected: None,
        }
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    /// The committed winner of the last completed spin, if still present.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn cursor(&self) -> Option<usize> {
        spin::cursor(&self.spin)
    }

    pub fn is_spinning(&self) -> bool {
        spin::is_busy(&self.spin)
    }

    fn save(&mut self) {
        storage::safe_save(&mut self.store, storage::PRIMARY_KEY, &self.state);
    }

    pub fn add_item(&mut self, text: &str) -> bool {
        let added = self.state.add_item(&mut self.rng, text);
        if added {
            self.save();
        }
        added
    }

    pub fn add_bulk(&mut self, text: &str) -> usize {
        let added = self.state.add_bulk(&mut self.rng, text);
        if added > 0 {
            self.save();
        }
        added
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let Some(removed) = self.state.remove_item(id) else {
            return false;
        };
        // Removing the current winner also clears the result display.
        if self.selected.as_deref() == Some(removed.text.as_str()) {
            self.selected = None;
        }
        self.save();
        true
    }

    pub fn clear_items(&mut self) {
        self.state.clear_items();
        self.selected = None;
        spin::clear_cursor(&mut self.spin);
        self.save();
    }

    pub fn set_weight(&mut self, id: &str, weight: u32) -> bool {
        let changed = self.state.set_weight(id, weight);
        if changed {
            self.save();
        }
        changed
    }

    pub fn set_avoid_repeats(&mut self, avoid: bool) {
        if self.state.avoid_repeats != avoid {
            self.state.avoid_repeats = avoid;
            self.save();
        }
    }

    /// Starts a spin over the eligible pool. A no-op while one is in flight
    /// or when there is nothing to pick from.
    pub fn pick_random(&mut self) -> bool {
        let pool = select::eligible_pool(&self.state);
        let started = spin::start(&mut self.spin, &self.state.items, &pool, &mut self.rng);
        if started {
            self.selected = None;
        }
        started
    }

    /// Advances the animation by `dt` seconds and applies the outcome.
    pub fn tick(&mut self, dt: f32) -> SpinAction {
        let action = spin::update(&mut self.spin, dt, &mut self.rng);
        if let SpinAction::Winner { text, .. } = &action {
            self.selected = Some(text.clone());
            self.state.push_winner(text);
            self.save();
        }
        action
    }

    /// Replaces the whole state from imported JSON text. On error the
    /// current state is untouched.
    pub fn import_text(&mut self, text: &str) -> Result<(), transfer::ImportError> {
        self.state = transfer::import_state(text, &mut self.rng)?;
        self.selected = None;
        spin::clear_cursor(&mut self.spin);
        self.save();
        Ok(())
    }

    pub fn export_state_json(&self) -> String {
        transfer::export_state(&self.state)
    }

    pub fn export_items_json(&self) -> String {
        transfer::export_items(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::picker::spin::SpinAction;
    use crate::picker::storage::{KvStore, MemStore, PRIMARY_KEY};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FRAME: f32 = 1.0 / 60.0;

    fn session(seed: u64) -> Session<MemStore> {
        Session::with_rng(MemStore::new(), StdRng::seed_from_u64(seed))
    }

    /// Drives a started spin all the way back to idle, returning the winner.
    fn finish_spin(session: &mut Session<MemStore>) -> String {
        let mut winner = None;
        for _ in 0..1_000 {
            match session.tick(FRAME) {
                SpinAction::Winner { text, .. } => winner = Some(text),
                SpinAction::Unlocked => return winner.expect("unlocked without a winner"),
                SpinAction::Cursor(_) | SpinAction::None => {}
            }
        }
        panic!("spin did not finish within 1000 frames");
    }

    #[test]
    fn pick_end_to_end_from_an_empty_start() {
        let mut s = session(11);
        assert!(!s.pick_random(), "empty list must not spin");

        assert!(s.add_item("Pizza"));
        assert!(s.add_item("Sushi"));
        assert!(s.pick_random());
        assert!(s.is_spinning());
        assert!(!s.pick_random(), "re-entry during a spin must be refused");

        let winner = finish_spin(&mut s);
        assert!(winner == "Pizza" || winner == "Sushi");
        assert_eq!(s.selected(), Some(winner.as_str()));
        assert_eq!(s.state().history[0], winner);
        assert!(!s.is_spinning(), "widget must return to an invocable idle");
        assert!(s.pick_random());
    }

    #[test]
    fn avoid_repeats_skips_the_previous_winner() {
        let mut s = session(12);
        s.add_item("Pizza");
        s.add_item("Sushi");

        for _ in 0..5 {
            assert!(s.pick_random());
            let winner = finish_spin(&mut s);
            let previous = s.state().history.get(1).cloned();
            if let Some(previous) = previous {
                assert_ne!(winner, previous, "avoid-repeats must exclude the last winner");
            }
        }
    }

    #[test]
    fn every_mutation_is_persisted_to_the_primary_key() {
        let mut s = session(13);
        s.add_item("Pizza");
        let id = s.state().items[0].id.clone();
        s.set_weight(&id, 9);
        s.set_avoid_repeats(false);

        let stored = s.store.get(PRIMARY_KEY).expect("state must be persisted");
        let reloaded: crate::picker::state::PersistedState =
            serde_json::from_str(&stored).unwrap();
        assert_eq!(&reloaded, s.state());
        assert_eq!(reloaded.items[0].weight, 9);
        assert!(!reloaded.avoid_repeats);
    }

    #[test]
    fn removing_the_winner_clears_the_selection() {
        let mut s = session(14);
        s.add_item("Pizza");
        s.pick_random();
        let winner = finish_spin(&mut s);
        assert_eq!(winner, "Pizza");

        let id = s.state().items[0].id.clone();
        assert!(s.remove_item(&id));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn import_replaces_state_and_bad_import_leaves_it_alone() {
        let mut s = session(15);
        s.add_item("Old");

        assert!(s.import_text(r#"["Pizza","Sushi"]"#).is_ok());
        let texts: Vec<&str> = s.state().items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["Pizza", "Sushi"]);

        assert!(s.import_text("[1,2]").is_err());
        let texts: Vec<&str> = s.state().items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["Pizza", "Sushi"], "failed import must not touch state");
    }

    #[test]
    fn clear_keeps_history_but_drops_cursor_and_selection() {
        let mut s = session(16);
        s.add_item("Pizza");
        s.pick_random();
        finish_spin(&mut s);
        assert!(s.cursor().is_some());

        s.clear_items();
        assert!(s.state().items.is_empty());
        assert_eq!(s.state().history.len(), 1);
        assert_eq!(s.selected(), None);
        assert_eq!(s.cursor(), None);
    }
}
