use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, Mutex};

const CONFIG_PATH: &str = "spinpick.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LogLevel,
    /// Root directory for the key-value store files.
    pub save_dir: PathBuf,
    /// 0 = keep state in memory only (nothing written to disk).
    pub persist: bool,
    // Spin duration is drawn uniformly from [SpinMinMs, SpinMaxMs) per spin.
    pub spin_min_ms: u32,
    pub spin_max_ms: u32,
    /// Post-settle lockout before the next pick is accepted.
    pub settle_delay_ms: u32,
    /// Terminal front-end frame cadence.
    pub frame_delay_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            save_dir: PathBuf::from("save"),
            persist: true,
            spin_min_ms: 1000,
            spin_max_ms: 1600,
            settle_delay_ms: 120,
            frame_delay_ms: 16,
        }
    }
}

// Global, mutable configuration instance.
static CONFIG: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

fn create_default_config_file() -> Result<(), std::io::Error> {
    info!("'{CONFIG_PATH}' not found, creating with default values.");
    let default = Config::default();

    // [Options] section - keys in alphabetical order
    let mut content = String::new();
    content.push_str("[Options]\n");
    content.push_str(&format!("FrameDelayMs={}\n", default.frame_delay_ms));
    content.push_str(&format!("LogLevel={}\n", default.log_level.as_str()));
    content.push_str(&format!(
        "Persist={}\n",
        if default.persist { "1" } else { "0" }
    ));
    content.push_str(&format!("SaveDir={}\n", default.save_dir.display()));
    content.push_str(&format!("SettleDelayMs={}\n", default.settle_delay_ms));
    content.push_str(&format!("SpinMaxMs={}\n", default.spin_max_ms));
    content.push_str(&format!("SpinMinMs={}\n", default.spin_min_ms));

    std::fs::write(CONFIG_PATH, content)
}

/// Minimal ini reader: `[Options]` keys only, comments and blanks skipped.
fn read_options(path: &Path) -> Result<HashMap<String, String>, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut values = HashMap::new();
    let mut in_options = true;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
            in_options = line[1..line.len() - 1].trim() == "Options";
            continue;
        }
        if !in_options {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                values.insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    Ok(values)
}

pub fn load() {
    if !Path::new(CONFIG_PATH).exists()
        && let Err(e) = create_default_config_file()
    {
        warn!("Failed to create default config file: {e}");
    }

    let opts = match read_options(Path::new(CONFIG_PATH)) {
        Ok(opts) => opts,
        Err(e) => {
            warn!("Failed to load '{CONFIG_PATH}', using defaults: {e}");
            return;
        }
    };

    let mut cfg = CONFIG.lock().unwrap();
    let default = Config::default();

    cfg.log_level = opts
        .get("LogLevel")
        .and_then(|v| v.parse().ok())
        .unwrap_or(default.log_level);
    cfg.save_dir = opts
        .get("SaveDir")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default.save_dir);
    cfg.persist = opts
        .get("Persist")
        .and_then(|v| v.parse::<u8>().ok())
        .map_or(default.persist, |v| v != 0);
    cfg.spin_min_ms = opts
        .get("SpinMinMs")
        .and_then(|v| v.parse().ok())
        .unwrap_or(default.spin_min_ms);
    cfg.spin_max_ms = opts
        .get("SpinMaxMs")
        .and_then(|v| v.parse().ok())
        .unwrap_or(default.spin_max_ms);
    cfg.settle_delay_ms = opts
        .get("SettleDelayMs")
        .and_then(|v| v.parse().ok())
        .unwrap_or(default.settle_delay_ms);
    cfg.frame_delay_ms = opts
        .get("FrameDelayMs")
        .and_then(|v| v.parse::<u32>().ok())
        .map(|v| v.clamp(1, 100))
        .unwrap_or(default.frame_delay_ms);

    // A degenerate spin window would make the duration draw panic.
    if cfg.spin_min_ms == 0 || cfg.spin_max_ms <= cfg.spin_min_ms {
        warn!(
            "Invalid spin window {}..{}ms, using defaults",
            cfg.spin_min_ms, cfg.spin_max_ms
        );
        cfg.spin_min_ms = default.spin_min_ms;
        cfg.spin_max_ms = default.spin_max_ms;
    }
}

pub fn get() -> Config {
    CONFIG.lock().unwrap().clone()
}
