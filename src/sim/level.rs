/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   Line 1: `# Level Name`
///   Lines: grid rows of whitespace-separated tokens
///
/// ## Tokens:
///   Type char, then an optional clockwise rotation digit `0..3`, then an
///   optional attribute suffix.
///
///   'S' = Start          'E' = End            'I' = Straight
///   'L' = Curve          'T' = T-crossing     'P' = Pathless
///   '#' = Border         'O' = Empty tile     '.' = vacancy
///
///   '!' = Immobile       '~' = Reverse
///
///   `L3~` is a curve turned three times clockwise that reverses the walk.

use std::path::Path;

use log::{info, warn};

use crate::config::GameConfig;
use crate::domain::direction::Pos;
use crate::domain::grid::Grid;
use crate::domain::tile::{Attribute, Tile, TileType};
use crate::error::LevelError;
use crate::sim::board::Board;

/// A parsed level, ready to be turned into a fresh board any number of times.
#[derive(Clone, Debug)]
pub struct LevelDef {
    /// Identifier reported in win/death events (file stem for files).
    pub id: String,
    pub name: String,
    pub grid: Grid,
}

impl LevelDef {
    pub fn board(&self) -> Board {
        Board::new(self.grid.clone(), self.id.clone())
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Parse level text straight into a playable board.
pub fn load_level_str(text: &str, level_id: &str) -> Result<Board, LevelError> {
    Ok(parse_level_file(text, level_id)?.board())
}

/// Levels from the configured directory, or the built-in set if the
/// directory is missing or holds nothing usable.
pub fn load_levels(config: &GameConfig) -> Vec<LevelDef> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels = load_from_directory(dir);
        if !levels.is_empty() {
            info!("{} levels from {}", levels.len(), dir.display());
            return levels;
        }
        warn!("{}: no usable levels, using built-in set", dir.display());
    }
    embedded_levels()
}

// ══════════════════════════════════════════════════════════════
// Single-level parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level_file(content: &str, level_id: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<(usize, Vec<&str>)> = vec![];

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if rows.is_empty() && name.is_empty() && is_name_line(trimmed) {
            name = trimmed[1..].trim().to_string();
            continue;
        }
        rows.push((i + 1, trimmed.split_whitespace().collect()));
    }

    let (first_line, first_row) = rows.first().ok_or(LevelError::Empty)?;
    let width = first_row.len();
    for (line, row) in &rows {
        if row.len() != width {
            return Err(LevelError::Parse {
                line: *line,
                message: format!("row has {} tiles, expected {width} (line {first_line} sets the width)", row.len()),
            });
        }
    }

    let mut grid = Grid::new(width, rows.len())?;
    for (y, (line, row)) in rows.iter().enumerate() {
        for (x, token) in row.iter().enumerate() {
            let pos = Pos::new(x, y);
            if let Some(tile) = parse_token(token, pos).map_err(|message| LevelError::Parse { line: *line, message })? {
                grid.place(pos, tile)?;
            }
        }
    }

    if name.is_empty() {
        name = level_id.to_string();
    }
    Ok(LevelDef { id: level_id.to_string(), name, grid })
}

/// `#Name` is a title, `#` or `#1!` is a border tile.
/// A name line starts with `#` and contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line.starts_with('#') && line[1..].chars().any(|c| c.is_alphabetic())
}

fn parse_token(token: &str, home: Pos) -> Result<Option<Tile>, String> {
    let mut chars = token.chars();
    let kind = match chars.next() {
        Some('.') if token.len() == 1 => return Ok(None),
        Some('S') => TileType::Start,
        Some('E') => TileType::End,
        Some('I') => TileType::Straight,
        Some('L') => TileType::Curve,
        Some('T') => TileType::TCrossing,
        Some('P') => TileType::Pathless,
        Some('#') => TileType::Border,
        Some('O') => TileType::Empty,
        _ => return Err(format!("unknown tile '{token}'")),
    };

    let mut rest = chars.peekable();
    let mut turns = 0;
    if let Some(d) = rest.peek().and_then(|c| c.to_digit(10)) {
        if d > 3 {
            return Err(format!("rotation {d} in '{token}' is not 0..3"));
        }
        turns = d as u8;
        rest.next();
    }

    let attribute = match rest.next() {
        None => Attribute::None,
        Some('!') => Attribute::Immobile,
        Some('~') => Attribute::Reverse,
        Some(c) => return Err(format!("unknown suffix '{c}' in '{token}'")),
    };
    if rest.next().is_some() {
        return Err(format!("trailing characters in '{token}'"));
    }

    Ok(Some(Tile::new(kind, home).rotated(turns).with_attribute(attribute)))
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut results: Vec<(String, LevelDef)> = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("could not read {}: {e}", dir.display());
            return vec![];
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map_or(false, |e| e == "txt") {
            continue;
        }
        let filename = path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let id = path.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let parsed = std::fs::read_to_string(&path)
            .map_err(LevelError::from)
            .and_then(|content| parse_level_file(&content, &id));
        match parsed {
            Ok(def) => results.push((filename, def)),
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    [
        make_embedded("builtin-1", "First Slide", &[
            "S2 .  .",
            "I0 I0 .",
            "E0 .  .",
        ]),
        make_embedded("builtin-2", "The Bend", &[
            "S1 L3 .",
            ".  I0 .",
            "P  E0 .",
        ]),
        make_embedded("builtin-3", "Backwards", &[
            "E0  . .",
            "I0~ . P",
            "S0  . .",
        ]),
        make_embedded("builtin-4", "Carousel", &[
            "S1 P  I1 E3",
            "I1 I1 I1 I1",
            ".  .  .  .",
        ]),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn make_embedded(id: &str, name: &str, map: &[&str]) -> Option<LevelDef> {
    let text = format!("# {name}\n{}", map.join("\n"));
    match parse_level_file(&text, id) {
        Ok(def) => Some(def),
        Err(e) => {
            warn!("built-in level '{name}' is broken: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::direction::Direction;

    #[test]
    fn parses_name_and_tokens() {
        let def = parse_level_file("# Test Run\nS1 L3~ .\n#  E0  I1!\n", "t").unwrap();
        assert_eq!(def.name, "Test Run");
        assert_eq!(def.id, "t");
        assert_eq!((def.grid.width(), def.grid.height()), (3, 2));

        let curve = def.grid.tile_at(Pos::new(1, 0)).unwrap().unwrap();
        assert_eq!(curve.kind, TileType::Curve);
        assert_eq!(curve.rotation, 3);
        assert_eq!(curve.attribute, Attribute::Reverse);
        assert!(curve.mask.is_open(Direction::South));
        assert!(curve.mask.is_open(Direction::West));

        assert!(def.grid.tile_at(Pos::new(2, 0)).unwrap().is_none());
        assert_eq!(def.grid.tile_at(Pos::new(0, 1)).unwrap().unwrap().kind, TileType::Border);
        let wall = def.grid.tile_at(Pos::new(2, 1)).unwrap().unwrap();
        assert_eq!(wall.attribute, Attribute::Immobile);
        assert_eq!(wall.home, Pos::new(2, 1));
    }

    #[test]
    fn border_row_is_not_a_name() {
        let def = parse_level_file("# # #\nS E .\n", "walls").unwrap();
        assert_eq!(def.name, "walls");
        assert_eq!(def.grid.height(), 2);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let def = parse_level_file("# Gaps\n\nS E\n\n. I\n\n", "g").unwrap();
        assert_eq!(def.grid.height(), 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        match parse_level_file("# Ragged\nS E .\nI I\n", "r") {
            Err(LevelError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn bad_tokens_are_rejected() {
        assert!(matches!(parse_level_file("S X", "x"), Err(LevelError::Parse { line: 1, .. })));
        assert!(matches!(parse_level_file("S I5", "x"), Err(LevelError::Parse { .. })));
        assert!(matches!(parse_level_file("S I1?", "x"), Err(LevelError::Parse { .. })));
        assert!(matches!(parse_level_file("S I1~!", "x"), Err(LevelError::Parse { .. })));
    }

    #[test]
    fn empty_level_is_rejected() {
        assert!(matches!(parse_level_file("# Nothing\n\n", "e"), Err(LevelError::Empty)));
    }

    #[test]
    fn missing_end_still_loads() {
        let board = load_level_str("# Open\nS I .\n", "open").unwrap();
        assert_eq!(board.player().pos, Pos::new(0, 0));
        assert_eq!(board.level_name(), "open");
    }

    #[test]
    fn embedded_levels_all_parse() {
        let levels = embedded_levels();
        assert_eq!(levels.len(), 4);
        for def in &levels {
            assert_eq!(def.grid.count(TileType::Start), 1, "{}", def.name);
            assert_eq!(def.grid.count(TileType::End), 1, "{}", def.name);
        }
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let mut config = GameConfig::default();
        config.levels_dir = std::path::PathBuf::from("/nonexistent/slidepath-levels");
        assert_eq!(load_levels(&config).len(), embedded_levels().len());
    }
}
