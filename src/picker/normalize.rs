//! Schema normalization for raw stored values.
//!
//! The store has held three shapes over time: a bare array of labels, an
//! object with an `items` array (fields of mixed vintage), and the current
//! schema. Everything funnels through [`normalize_state`], which never fails;
//! the worst case is the empty default state.

use crate::picker::state::{self, DEFAULT_WEIGHT, HISTORY_CAP, Item, PersistedState, WEIGHT_MAX, WEIGHT_MIN};
use rand::Rng;
use rustc_hash::FxHashSet;
use serde_json::Value;

/// Coerces a raw JSON scalar to display text. Strings, numbers and bools
/// carry over; null and nested structures do not. Whitespace-only text
/// counts as absent.
fn coerce_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Weights survive only as finite JSON numbers, clamped and rounded into the
/// 1..=10 range. Anything else gets the default.
fn coerce_weight(v: Option<&Value>) -> u32 {
    match v.and_then(Value::as_f64) {
        Some(w) if w.is_finite() => {
            w.clamp(f64::from(WEIGHT_MIN), f64::from(WEIGHT_MAX)).round() as u32
        }
        _ => DEFAULT_WEIGHT,
    }
}

/// Keeps a stored id only when it is a non-empty string not used by an
/// earlier element; blank, missing and duplicate ids are regenerated.
fn coerce_id<R: Rng>(v: Option<&Value>, seen: &mut FxHashSet<String>, rng: &mut R) -> String {
    if let Some(Value::String(id)) = v
        && !id.is_empty()
        && !seen.contains(id.as_str())
    {
        seen.insert(id.clone());
        return id.clone();
    }
    loop {
        let id = state::new_id(rng);
        if seen.insert(id.clone()) {
            return id;
        }
    }
}

/// Maps any raw stored value onto the current schema.
///
/// Total and idempotent: any input yields a structurally valid state, and a
/// state that is already valid round-trips unchanged (modulo fresh ids for
/// entries that never had one).
pub fn normalize_state<R: Rng>(raw: &Value, rng: &mut R) -> PersistedState {
    match raw {
        // Oldest format: a bare array of labels.
        Value::Array(texts) => {
            let mut seen = FxHashSet::default();
            let items = texts
                .iter()
                .filter_map(coerce_text)
                .map(|text| Item {
                    id: coerce_id(None, &mut seen, rng),
                    text,
                    weight: DEFAULT_WEIGHT,
                })
                .collect();
            PersistedState {
                items,
                ..PersistedState::default()
            }
        }
        // Object with `items`, possibly a mix of old and new field shapes.
        Value::Object(map) => {
            let mut seen = FxHashSet::default();
            let items_src = map
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let items = items_src
                .iter()
                .filter_map(|x| {
                    let text = coerce_text(x.get("text")?)?;
                    Some(Item {
                        id: coerce_id(x.get("id"), &mut seen, rng),
                        text,
                        weight: coerce_weight(x.get("weight")),
                    })
                })
                .collect();

            let mut history: Vec<String> = map
                .get("history")
                .and_then(Value::as_array)
                .map(|h| h.iter().filter_map(coerce_text).collect())
                .unwrap_or_default();
            history.truncate(HISTORY_CAP);

            let avoid_repeats = match map.get("avoidRepeats") {
                Some(Value::Bool(b)) => *b,
                _ => true,
            };

            PersistedState {
                items,
                history,
                avoid_repeats,
            }
        }
        // Null, scalars, parse wreckage: start fresh.
        _ => PersistedState::default(),
    }
}
