use rand::Rng;
use rand::RngExt;
use serde::{Deserialize, Serialize};

// Weights are exposed to the user as a 1..=10 slider.
pub const WEIGHT_MIN: u32 = 1;
pub const WEIGHT_MAX: u32 = 10;
pub const DEFAULT_WEIGHT: u32 = 5;

/// Winners kept in the log, most-recent-first.
pub const HISTORY_CAP: usize = 20;

const ID_LEN: usize = 8;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// One pickable entry. `id` is the identity; duplicate texts are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub text: String,
    pub weight: u32,
}

/// The full widget state as it goes to and comes from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub items: Vec<Item>,
    pub history: Vec<String>,
    #[serde(rename = "avoidRepeats")]
    pub avoid_repeats: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            history: Vec::new(),
            avoid_repeats: true,
        }
    }
}

/// Opaque 8-character identifier, stable across renames and reweights.
pub fn new_id<R: Rng>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[inline(always)]
pub const fn clamp_weight(weight: u32) -> u32 {
    if weight < WEIGHT_MIN {
        WEIGHT_MIN
    } else if weight > WEIGHT_MAX {
        WEIGHT_MAX
    } else {
        weight
    }
}

impl PersistedState {
    /// Appends a new item with the default weight. Empty input is rejected.
    pub fn add_item<R: Rng>(&mut self, rng: &mut R, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.items.push(Item {
            id: new_id(rng),
            text: text.to_string(),
            weight: DEFAULT_WEIGHT,
        });
        true
    }

    /// One item per non-empty line. Returns how many were added.
    pub fn add_bulk<R: Rng>(&mut self, rng: &mut R, text: &str) -> usize {
        let mut added = 0;
        for line in text.lines() {
            if self.add_item(rng, line) {
                added += 1;
            }
        }
        added
    }

    pub fn remove_item(&mut self, id: &str) -> Option<Item> {
        let idx = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Empties the item list. History is intentionally left alone.
    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    pub fn set_weight(&mut self, id: &str, weight: u32) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.weight = clamp_weight(weight);
                true
            }
            None => false,
        }
    }

    /// Records a winner at the front of the history, dropping anything past
    /// the cap.
    pub fn push_winner(&mut self, text: &str) {
        self.history.insert(0, text.to_string());
        self.history.truncate(HISTORY_CAP);
    }
}
