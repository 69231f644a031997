/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Every grid slot is drawn as a 5x3 (TILE_W x TILE_H) block whose arms show
/// the open edges of the tile's direction mask.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use slidepath::domain::direction::Direction;
use slidepath::domain::player::PlayerState;
use slidepath::domain::tile::{Attribute, Tile, TileType};

use super::session::{Phase, Session};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, also used for
    /// the initial clear so row gaps match the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Layout ──

const TILE_W: usize = 5;
const TILE_H: usize = 3;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

// ── Palette ──

const TILE_BG: Color = Color::Rgb { r: 48, g: 52, b: 70 };
const LOWERED_BG: Color = Color::Rgb { r: 32, g: 32, b: 44 };
const CURSOR_BG: Color = Color::Rgb { r: 90, g: 80, b: 30 };
const SLIDE_BG: Color = Color::Rgb { r: 40, g: 70, b: 90 };
const WARP_BG: Color = Color::Rgb { r: 70, g: 40, b: 90 };
const PATH_FG: Color = Color::Rgb { r: 200, g: 200, b: 215 };
const DIM_FG: Color = Color::Rgb { r: 90, g: 90, b: 110 };

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_level: Option<usize>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_level: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, s: &Session) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        let level_changed = self.last_level != Some(s.level_index());
        if resized || level_changed {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_level = Some(s.level_index());
        }

        self.front.clear();
        self.compose_hud(s);
        self.compose_board(s);
        self.compose_footer(s);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, s: &Session) {
        let state = match (s.phase, s.board.player().state) {
            (Phase::Complete, _) => "COMPLETE",
            (_, PlayerState::Won) => "CLEARED",
            (_, PlayerState::Dead) => "FELL",
            (Phase::Sliding, _) => "sliding",
            (Phase::Walking, _) => "walking",
            _ => "",
        };
        let hud = format!(
            " Level {}/{}  {:<20}  Moves:{:<4} {} ",
            s.level_index() + 1,
            s.level_count(),
            s.level_title(),
            s.board.moves(),
            state,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::Black, Color::Rgb { r: 150, g: 170, b: 210 });
    }

    fn compose_footer(&mut self, s: &Session) {
        let row = MAP_ROW + s.board.grid().height() * TILE_H + 1;
        self.front.put_str(MAP_COL, row, &s.message, Color::Yellow, Cell::BASE_BG);
        self.front.put_str(
            MAP_COL,
            row + 1,
            "arrows: cursor  WASD: drag  R: restart  N/P: level  Q: quit",
            DIM_FG,
            Cell::BASE_BG,
        );
    }

    fn compose_board(&mut self, s: &Session) {
        let grid = s.board.grid();
        let player = s.board.player();
        // The player only shows up on its new slot once the walk is drawn.
        let show_player = !matches!(player.state, PlayerState::Dead) || s.progress() < 0.5;

        for pos in grid.positions() {
            let col = MAP_COL + pos.x * TILE_W;
            let row = MAP_ROW + pos.y * TILE_H;

            let slide = s.sliding.iter().find(|r| r.to == pos);
            let bg = if pos == s.cursor {
                CURSOR_BG
            } else if let Some(r) = slide {
                if r.teleport { WARP_BG } else { SLIDE_BG }
            } else {
                match grid.tile_at(pos).ok().flatten() {
                    Some(t) if !t.raised => LOWERED_BG,
                    Some(_) => TILE_BG,
                    None => Cell::BASE_BG,
                }
            };

            match grid.tile_at(pos).ok().flatten() {
                Some(tile) => self.compose_tile(tile, col, row, bg),
                None => self.compose_vacancy(col, row, bg),
            }

            if show_player && pos == player.pos {
                let fg = match player.state {
                    PlayerState::Dead => Color::Red,
                    PlayerState::Won => Color::Green,
                    PlayerState::Alive => Color::White,
                };
                self.front.set(col + TILE_W / 2, row + 1, Cell::new('@', fg, bg));
            }
        }
    }

    fn compose_vacancy(&mut self, col: usize, row: usize, bg: Color) {
        for dy in 0..TILE_H {
            for dx in 0..TILE_W {
                self.front.set(col + dx, row + dy, Cell::new(' ', DIM_FG, bg));
            }
        }
        self.front.set(col + TILE_W / 2, row + 1, Cell::new('·', DIM_FG, bg));
    }

    fn compose_tile(&mut self, tile: &Tile, col: usize, row: usize, bg: Color) {
        if tile.kind == TileType::Border {
            for dy in 0..TILE_H {
                for dx in 0..TILE_W {
                    self.front.set(col + dx, row + dy, Cell::new('▓', DIM_FG, bg));
                }
            }
            return;
        }

        let fg = if tile.raised { PATH_FG } else { DIM_FG };
        for dy in 0..TILE_H {
            for dx in 0..TILE_W {
                self.front.set(col + dx, row + dy, Cell::new(' ', fg, bg));
            }
        }

        let cx = col + TILE_W / 2;
        let cy = row + 1;
        let open = |d: Direction| tile.mask.is_open(d);
        if open(Direction::North) {
            self.front.set(cx, row, Cell::new('║', fg, bg));
        }
        if open(Direction::South) {
            self.front.set(cx, row + 2, Cell::new('║', fg, bg));
        }
        if open(Direction::West) {
            self.front.put_str(col, cy, "══", fg, bg);
        }
        if open(Direction::East) {
            self.front.put_str(cx + 1, cy, "══", fg, bg);
        }

        let (glyph, glyph_fg) = match tile.kind {
            TileType::Start => ('S', Color::Cyan),
            TileType::End => ('E', Color::Green),
            TileType::Pathless => ('░', DIM_FG),
            TileType::Empty => (' ', fg),
            TileType::Straight | TileType::Curve | TileType::TCrossing | TileType::Border => ('●', fg),
        };
        self.front.set(cx, cy, Cell::new(glyph, glyph_fg, bg));

        // Attribute marker in the top-left corner
        let marker = match tile.attribute {
            Attribute::Immobile => Some(('!', Color::Red)),
            Attribute::Reverse => Some(('↺', Color::Magenta)),
            Attribute::None => None,
        };
        if let Some((ch, c)) = marker {
            self.front.set(col, row, Cell::new(ch, c, bg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidepath::domain::direction::Pos;

    /// The middle row of a tile block, as text.
    fn tile_row(tile: &Tile) -> String {
        let mut r = Renderer::new();
        r.front.resize(TILE_W, TILE_H);
        r.compose_tile(tile, 0, 0, TILE_BG);
        (0..TILE_W).map(|x| r.front.get(x, 1).ch).collect()
    }

    #[test]
    fn straight_tiles_show_their_arms() {
        let horizontal = Tile::new(TileType::Straight, Pos::default()).rotated(1);
        assert_eq!(tile_row(&horizontal), "══●══");
        let vertical = Tile::new(TileType::Straight, Pos::default());
        assert_eq!(tile_row(&vertical), "  ●  ");
    }

    #[test]
    fn start_facing_east() {
        let start = Tile::new(TileType::Start, Pos::default()).rotated(1);
        assert_eq!(tile_row(&start), "  S══");
    }

    #[test]
    fn frame_buffer_clips_writes() {
        let mut fb = FrameBuffer::new(3, 1);
        fb.put_str(1, 0, "abcdef", Color::White, Cell::BASE_BG);
        assert_eq!(fb.get(2, 0).ch, 'b');
        assert!(fb.get(5, 0) == Cell::BLANK);
    }
}
