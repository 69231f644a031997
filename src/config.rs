/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use log::warn;
use serde::Deserialize;
use std::path::PathBuf;

const APP_DIR: &str = "slidepath";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub sound: bool,
    pub levels_dir: PathBuf,
}

/// How long the host waits for each visual phase, in ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub slide_ticks: u32,     // continuous slide of a run
    pub teleport_ticks: u32,  // cross-fade when a tile wraps
    pub step_ticks: u32,      // player walk
    pub death_ticks: u32,     // before the automatic restart
    pub win_ticks: u32,       // before the next level loads
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_slide")]
    slide_ticks: u32,
    #[serde(default = "default_teleport")]
    teleport_ticks: u32,
    #[serde(default = "default_step")]
    step_ticks: u32,
    #[serde(default = "default_death")]
    death_ticks: u32,
    #[serde(default = "default_win")]
    win_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_sound")]
    sound: bool,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 30 }
fn default_slide() -> u32 { 5 }
fn default_teleport() -> u32 { 9 }    // fade out + fade in
fn default_step() -> u32 { 5 }
fn default_death() -> u32 { 30 }
fn default_win() -> u32 { 40 }
fn default_levels_dir() -> String { "levels".into() }
fn default_sound() -> bool { true }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            slide_ticks: default_slide(),
            teleport_ticks: default_teleport(),
            step_ticks: default_step(),
            death_ticks: default_death(),
            win_ticks: default_win(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            sound: default_sound(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, CWD, `~/.local/share/slidepath`,
    /// `/usr/share/slidepath`. Missing file or keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse a config document; relative paths resolve against the CWD.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let t = toml_cfg.timing;
        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: t.tick_rate_ms.max(1),
                slide_ticks: t.slide_ticks,
                teleport_ticks: t.teleport_ticks,
                step_ticks: t.step_ticks,
                death_ticks: t.death_ticks,
                win_ticks: t.win_ticks,
            },
            sound: toml_cfg.general.sound,
            levels_dir,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default(), &[])
    }
}

/// Per-user data directory, where the log file goes.
pub fn data_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/share").join(APP_DIR),
        Err(_) => PathBuf::from("."),
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home
    let xdg = data_dir();
    if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
        dirs.push(xdg);
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share").join(APP_DIR);
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!("{}: parse error, using defaults: {e}", path.display());
                    return TomlConfig::default();
                }
            },
            Err(e) => warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.timing, GameConfig::default().timing);
        assert_eq!(cfg.timing.tick_rate_ms, 30);
        assert_eq!(cfg.timing.teleport_ticks, 9);
        assert!(cfg.sound);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[timing]\nslide_ticks = 2\n\n[general]\nsound = false\n",
        ).unwrap();
        assert_eq!(cfg.timing.slide_ticks, 2);
        assert_eq!(cfg.timing.step_ticks, 5);
        assert!(!cfg.sound);
    }

    #[test]
    fn absolute_levels_dir_is_kept() {
        let cfg = GameConfig::from_toml_str("[general]\nlevels_dir = \"/opt/puzzles\"\n").unwrap();
        assert_eq!(cfg.levels_dir, PathBuf::from("/opt/puzzles"));
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let cfg = GameConfig::from_toml_str("[timing]\ntick_rate_ms = 0\n").unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::from_toml_str("[timing]\nslide_ticks = \"fast\"\n").is_err());
    }
}
