/// The player: a position on the grid and a three-state life cycle.
///
/// Alive  → Alive   (walk resolved onto a normal tile)
/// Alive  → Dead    (terminal until restart)
/// Alive  → Won     (terminal until the level is reloaded)

use super::direction::{Direction, Pos};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerState {
    Alive,
    Dead,
    Won,
}

/// A walk the player will take once the current tile move settles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PendingWalk {
    pub direction: Direction,
    pub wins: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Pos,
    pub spawn: Pos,
    /// Where the player last stood still. Informational: restarts go
    /// back to `spawn`, a failed step never moves the player.
    pub last_stable: Pos,
    pub state: PlayerState,
    /// Walk decided when the move started, taken when it ends.
    pub pending: Option<PendingWalk>,
    /// True between the walk being committed and its end.
    pub walking: bool,
    pub has_stepped: bool,
}

impl Player {
    pub fn new(spawn: Pos) -> Self {
        Player {
            pos: spawn,
            spawn,
            last_stable: spawn,
            state: PlayerState::Alive,
            pending: None,
            walking: false,
            has_stepped: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == PlayerState::Alive
    }

    /// Can the player take part in a new move?
    pub fn accepts_input(&self) -> bool {
        self.is_alive() && !self.walking
    }

    pub fn will_win(&self) -> bool {
        self.pending.map_or(false, |w| w.wins)
    }

    /// Back to the spawn index, alive.
    pub fn reset(&mut self) {
        *self = Player::new(self.spawn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_player_accepts_input() {
        let p = Player::new(Pos::new(2, 1));
        assert!(p.accepts_input());
        assert_eq!(p.last_stable, Pos::new(2, 1));
        assert!(!p.will_win());
    }

    #[test]
    fn terminal_states_block_input() {
        let mut p = Player::new(Pos::new(0, 0));
        p.state = PlayerState::Dead;
        assert!(!p.accepts_input());
        p.state = PlayerState::Won;
        assert!(!p.accepts_input());
    }

    #[test]
    fn walking_blocks_input() {
        let mut p = Player::new(Pos::new(0, 0));
        p.walking = true;
        assert!(!p.accepts_input());
    }

    #[test]
    fn reset_restores_spawn() {
        let mut p = Player::new(Pos::new(1, 1));
        p.pos = Pos::new(3, 0);
        p.state = PlayerState::Dead;
        p.has_stepped = true;
        p.pending = Some(PendingWalk { direction: Direction::East, wins: true });
        p.reset();
        assert_eq!(p.pos, Pos::new(1, 1));
        assert_eq!(p.state, PlayerState::Alive);
        assert!(!p.has_stepped);
        assert!(p.pending.is_none());
    }
}
