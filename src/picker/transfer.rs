//! Import and export of the item list as JSON documents.

use crate::picker::normalize;
use crate::picker::state::PersistedState;
use chrono::Local;
use rand::Rng;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const EXPORT_DIR: &str = "export";

/// Why an import was refused. Shown to the user verbatim; the current state
/// is left untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportError {
    InvalidJson,
    UnsupportedShape,
}

impl core::fmt::Display for ImportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "the file is not valid JSON"),
            Self::UnsupportedShape => write!(
                f,
                "expected a JSON array of strings or an object with an \"items\" array"
            ),
        }
    }
}

impl std::error::Error for ImportError {}

/// Full-state export, pretty-printed like the original download.
pub fn export_state(state: &PersistedState) -> String {
    serde_json::to_string_pretty(state).unwrap_or_default()
}

/// Bare text-list export, the simple widget's format.
pub fn export_items(state: &PersistedState) -> String {
    let texts: Vec<&str> = state.items.iter().map(|i| i.text.as_str()).collect();
    serde_json::to_string_pretty(&texts).unwrap_or_default()
}

/// Accepts exactly the shapes the widget ever wrote: a bare array of strings,
/// or an object carrying an `items` array. Accepted documents run through
/// the normalizer so legacy item fields coerce the same way stored state
/// does.
pub fn import_state<R: Rng>(text: &str, rng: &mut R) -> Result<PersistedState, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ImportError::InvalidJson)?;
    let accepted = match &value {
        Value::Array(entries) => entries.iter().all(Value::is_string),
        Value::Object(map) => map.get("items").is_some_and(Value::is_array),
        _ => false,
    };
    if !accepted {
        return Err(ImportError::UnsupportedShape);
    }
    Ok(normalize::normalize_state(&value, rng))
}

/// Where an export lands when the user gives no path.
pub fn default_export_path() -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    Path::new(EXPORT_DIR).join(format!("random-picker-pro-{stamp}.json"))
}

pub fn export_file(path: &Path, payload: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, payload)
}

#[cfg(test)]
mod tests {
    use super::{ImportError, export_items, export_state, import_state};
    use crate::picker::state::PersistedState;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0xbeef)
    }

    fn sample_state(rng: &mut StdRng) -> PersistedState {
        let mut state = PersistedState::default();
        state.add_item(rng, "Pizza");
        state.add_item(rng, "Sushi");
        let id = state.items[1].id.clone();
        state.set_weight(&id, 8);
        state.push_winner("Sushi");
        state.avoid_repeats = false;
        state
    }

    #[test]
    fn import_rejects_invalid_json() {
        assert_eq!(
            import_state("{not json", &mut rng()),
            Err(ImportError::InvalidJson)
        );
    }

    #[test]
    fn import_rejects_arrays_of_non_strings() {
        let mut r = rng();
        assert_eq!(
            import_state("[1, 2, 3]", &mut r),
            Err(ImportError::UnsupportedShape)
        );
        assert_eq!(
            import_state(r#"["ok", 2]"#, &mut r),
            Err(ImportError::UnsupportedShape)
        );
    }

    #[test]
    fn import_rejects_objects_without_an_items_array() {
        let mut r = rng();
        assert_eq!(
            import_state("{}", &mut r),
            Err(ImportError::UnsupportedShape)
        );
        assert_eq!(
            import_state(r#"{"items": "nope"}"#, &mut r),
            Err(ImportError::UnsupportedShape)
        );
        assert_eq!(
            import_state("42", &mut r),
            Err(ImportError::UnsupportedShape)
        );
    }

    #[test]
    fn import_accepts_a_bare_string_array() {
        let state = import_state(r#"["Pizza", "Sushi"]"#, &mut rng()).unwrap();
        let texts: Vec<&str> = state.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["Pizza", "Sushi"]);
        assert!(state.items.iter().all(|i| i.weight == 5));
        assert!(state.history.is_empty());
        assert!(state.avoid_repeats);
    }

    #[test]
    fn import_accepts_an_object_with_items_and_coerces_fields() {
        let state = import_state(
            r#"{"items":[{"id":"aa","text":"Pizza","weight":12},{"text":"Sushi"}],
                "history":["Pizza"],"avoidRepeats":false}"#,
            &mut rng(),
        )
        .unwrap();
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items[0].weight, 10);
        assert_eq!(state.items[1].weight, 5);
        assert_eq!(state.history, ["Pizza"]);
        assert!(!state.avoid_repeats);
    }

    #[test]
    fn full_export_reimports_to_the_same_state() {
        let mut r = rng();
        let state = sample_state(&mut r);
        let restored = import_state(&export_state(&state), &mut r).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn items_export_is_a_bare_text_array() {
        let mut r = rng();
        let state = sample_state(&mut r);
        let payload = export_items(&state);
        let texts: Vec<String> = serde_json::from_str(&payload).unwrap();
        assert_eq!(texts, ["Pizza", "Sushi"]);

        // The simple format round-trips as fresh default-weight items.
        let restored = import_state(&payload, &mut r).unwrap();
        assert_eq!(restored.items.len(), 2);
        assert!(restored.items.iter().all(|i| i.weight == 5));
    }
}
