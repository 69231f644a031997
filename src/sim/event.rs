/// Events emitted while a move plays out.
/// The presentation layer consumes these for animation/sound.
///
/// Observers register on the board's `EventBus` and see each event as it
/// is raised. They only get a shared reference to the event, never to the
/// board, so they cannot feed back into the simulation mid-move.

use crate::domain::direction::{Direction, Pos};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A run began sliding; `origin` is its trailing edge.
    MoveStarted { origin: Pos, direction: Direction },
    /// One tile changed slot. `teleport` marks a wrap across the edge.
    TileRelocated { from: Pos, to: Pos, teleport: bool },
    /// The move settled. `direction` is what the player will walk.
    MoveEnded { direction: Direction },
    PlayerRodeTile { from: Pos, to: Pos },
    PlayerStepped { from: Pos, to: Pos },
    PlayerWillWin,
    PlayerWon { level: String },
    PlayerDied { level: String },
    StartTileLowered { at: Pos },
    LevelRestarted { moves: u32 },
}

/// Something that wants to hear about game events as they happen.
pub trait Subscriber {
    fn notify(&mut self, event: &GameEvent);
}

/// Publishes events to subscribers and queues them for the host to drain.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Box<dyn Subscriber>>,
    queue: Vec<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: GameEvent) {
        for sub in self.subscribers.iter_mut() {
            sub.notify(&event);
        }
        self.queue.push(event);
    }

    /// Take everything raised since the last drain.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> &[GameEvent] {
        &self.queue
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("queue", &self.queue)
            .finish()
    }
}
